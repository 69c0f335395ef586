use serde::Serialize;

use crate::row::EntityType;

/// A canned query offered as a one-click filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickFilter {
    pub label: &'static str,
    pub query: &'static str,
}

const fn preset(label: &'static str, query: &'static str) -> QuickFilter {
    QuickFilter { label, query }
}

const CLIENT_PRESETS: &[QuickFilter] = &[
    preset("Contains \"Corp\"", "client name contains Corp"),
    preset("Group A Clients", "group tag equals GroupA"),
    preset("VIP Clients", "vip client"),
    preset("Location: New York", "location is New York"),
    preset("Budget > 100k", "budget greater than 100000"),
    preset("Has Task TX", "includes TX"),
];

const WORKER_PRESETS: &[QuickFilter] = &[
    preset("Qualification 5", "qualification level is 5"),
    preset("Has Coding Skills", "skills include coding"),
    preset("Data & ML Skills", "skills contain data and ml"),
    preset("Group B Workers", "group is GroupB"),
    preset("Available Slot 2", "available slots include 2"),
    preset("Max Load 3", "max load per phase equals 3"),
    preset("UI/UX Skills", "skills include ui/ux"),
    preset("Testing Skills", "skills include testing"),
];

const TASK_PRESETS: &[QuickFilter] = &[
    preset("Duration > 3", "duration greater than 3"),
    preset("ETL Category", "category equals ETL"),
    preset("Analytics Tasks", "category is Analytics"),
    preset("Requires Coding", "required skills include coding"),
    preset("Phase 2-4", "preferred phases include 2"),
    preset("ML Category", "category equals ML"),
    preset("Max Concurrent 1", "max concurrent equals 1"),
    preset("Design Tasks", "category is Design"),
];

/// Quick filters for an entity type. They run through the text filter like
/// any typed query.
pub fn presets(entity: EntityType) -> &'static [QuickFilter] {
    match entity {
        EntityType::Client => CLIENT_PRESETS,
        EntityType::Worker => WORKER_PRESETS,
        EntityType::Task => TASK_PRESETS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply_text_filter;
    use crate::row::Row;
    use serde_json::json;

    #[test]
    fn test_every_entity_has_presets() {
        for entity in EntityType::ALL {
            assert!(!presets(entity).is_empty());
        }
    }

    #[test]
    fn test_worker_presets_filter() {
        let rows = vec![
            Row::from_pairs([
                ("WorkerID", json!("W1")),
                ("WorkerGroup", json!("GroupB")),
                ("AvailableSlots", json!("[1,2,3]")),
                ("MaxLoadPerPhase", json!(3)),
            ]),
            Row::from_pairs([
                ("WorkerID", json!("W2")),
                ("WorkerGroup", json!("GroupA")),
                ("AvailableSlots", json!("[4,12]")),
                ("MaxLoadPerPhase", json!(1)),
            ]),
        ];
        for label in ["Group B Workers", "Available Slot 2", "Max Load 3"] {
            let preset = presets(EntityType::Worker)
                .iter()
                .find(|p| p.label == label)
                .unwrap();
            let kept = apply_text_filter(preset.query, &rows, EntityType::Worker);
            assert_eq!(kept.len(), 1, "{label}");
            assert_eq!(kept[0].text("WorkerID").as_deref(), Some("W1"));
        }
    }
}
