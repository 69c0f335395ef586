//! Maps user phrases like "priority level" onto row columns.

use crate::row::{EntityType, Row};

/// Target of a phrase in the lookup table.
#[derive(Clone, Copy)]
enum Target {
    Field(&'static str),
    /// Field depends on the entity type: (client, worker, task)
    PerEntity(&'static str, &'static str, &'static str),
}

impl Target {
    fn resolve(self, entity: EntityType) -> &'static str {
        match self {
            Target::Field(name) => name,
            Target::PerEntity(client, worker, task) => match entity {
                EntityType::Client => client,
                EntityType::Worker => worker,
                EntityType::Task => task,
            },
        }
    }
}

const PHRASES: &[(&str, Target)] = &[
    ("priority level", Target::Field("PriorityLevel")),
    ("priority", Target::Field("PriorityLevel")),
    ("client name", Target::Field("ClientName")),
    ("client id", Target::Field("ClientID")),
    ("name", Target::PerEntity("ClientName", "WorkerName", "TaskName")),
    ("id", Target::PerEntity("ClientID", "WorkerID", "TaskID")),
    ("group tag", Target::Field("GroupTag")),
    ("group", Target::PerEntity("GroupTag", "WorkerGroup", "WorkerGroup")),
    ("requested tasks", Target::Field("RequestedTaskIDs")),
    ("requested task ids", Target::Field("RequestedTaskIDs")),
    ("task ids", Target::Field("RequestedTaskIDs")),
    ("attributes", Target::Field("AttributesJSON")),
    ("qualification level", Target::Field("QualificationLevel")),
    ("qualification", Target::Field("QualificationLevel")),
    ("worker group", Target::Field("WorkerGroup")),
    ("worker name", Target::Field("WorkerName")),
    ("worker id", Target::Field("WorkerID")),
    ("max load per phase", Target::Field("MaxLoadPerPhase")),
    ("max load", Target::Field("MaxLoadPerPhase")),
    ("load", Target::Field("MaxLoadPerPhase")),
    ("task name", Target::Field("TaskName")),
    ("task id", Target::Field("TaskID")),
    ("duration", Target::Field("Duration")),
    ("category", Target::Field("Category")),
    ("skills", Target::PerEntity("RequiredSkills", "Skills", "RequiredSkills")),
    ("skill", Target::PerEntity("RequiredSkills", "Skills", "RequiredSkills")),
    ("required skills", Target::Field("RequiredSkills")),
    ("preferred phases", Target::Field("PreferredPhases")),
    ("phases", Target::Field("PreferredPhases")),
    ("available slots", Target::Field("AvailableSlots")),
    ("slots", Target::Field("AvailableSlots")),
    ("max concurrent", Target::Field("MaxConcurrent")),
    ("concurrency", Target::Field("MaxConcurrent")),
    ("concurrent", Target::Field("MaxConcurrent")),
];

/// Resolves `phrase` to a column of `row`.
///
/// The phrase table is consulted first and its answer is used only if the row
/// actually has that column. Otherwise the first row key that contains the
/// phrase, or is contained in it, wins (case-insensitive, and again with
/// whitespace and underscores removed).
pub fn find_matching_field(phrase: &str, row: &Row, entity: EntityType) -> Option<String> {
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() {
        return None;
    }

    if let Some((_, target)) = PHRASES.iter().find(|(p, _)| *p == phrase) {
        let field = target.resolve(entity);
        if row.has_key(field) {
            return Some(field.to_string());
        }
    }

    let compact_phrase = compact(&phrase);
    row.keys()
        .find(|key| {
            let lower = key.to_lowercase();
            if lower.trim().is_empty() {
                return false;
            }
            let compact_key = compact(&lower);
            lower.contains(&phrase)
                || phrase.contains(&lower)
                || (!compact_key.is_empty()
                    && (compact_key.contains(&compact_phrase)
                        || compact_phrase.contains(&compact_key)))
        })
        .cloned()
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker_row() -> Row {
        Row::from_pairs([("WorkerID", "W1"), ("WorkerGroup", "GroupB"), ("Skills", "coding")])
    }

    #[test]
    fn test_group_by_entity() {
        let worker = worker_row();
        assert_eq!(
            find_matching_field("group", &worker, EntityType::Worker).as_deref(),
            Some("WorkerGroup")
        );
        let client = Row::from_pairs([("ClientID", "C1"), ("GroupTag", "GroupA")]);
        assert_eq!(
            find_matching_field("group", &client, EntityType::Client).as_deref(),
            Some("GroupTag")
        );
    }

    #[test]
    fn test_table_entry_requires_column() {
        // "skills" maps to Skills for workers; a task row only has RequiredSkills
        let task = Row::from_pairs([("TaskID", "T1"), ("RequiredSkills", "sql")]);
        assert_eq!(
            find_matching_field("skills", &task, EntityType::Worker).as_deref(),
            Some("RequiredSkills")
        );
    }

    #[test]
    fn test_substring_fallback() {
        let row = Row::from_pairs([("ClientID", "C1"), ("Budget_Total", "100")]);
        assert_eq!(
            find_matching_field("budget", &row, EntityType::Client).as_deref(),
            Some("Budget_Total")
        );
        let row = Row::from_pairs([("PriorityLevel", 3)]);
        assert_eq!(
            find_matching_field("Priority Level", &row, EntityType::Client).as_deref(),
            Some("PriorityLevel")
        );
    }

    #[test]
    fn test_no_match() {
        let row = worker_row();
        assert!(find_matching_field("location", &row, EntityType::Worker).is_none());
        assert!(find_matching_field("   ", &row, EntityType::Worker).is_none());
    }
}
