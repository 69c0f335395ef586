//! Canonical schema for each entity type.

use serde::Serialize;

use crate::row::EntityType;

/// Semantic kind of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// Unique identifier
    Identifier,
    /// Free text
    Text,
    /// Whole number with optional bounds
    Integer,
    /// One of a configured set of strings
    Enum,
    /// Comma-separated list of strings
    List,
    /// JSON array of positive integers
    IntArray,
    /// Range, JSON array or comma list of phase numbers
    PhaseSet,
    /// JSON object or free text
    Attributes,
}

/// A canonical field definition.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const CLIENT_FIELDS: &[FieldSpec] = &[
    field("ClientID", FieldKind::Identifier, true),
    field("ClientName", FieldKind::Text, true),
    field("PriorityLevel", FieldKind::Integer, false),
    field("RequestedTaskIDs", FieldKind::List, false),
    field("GroupTag", FieldKind::Enum, false),
    field("AttributesJSON", FieldKind::Attributes, false),
];

const WORKER_FIELDS: &[FieldSpec] = &[
    field("WorkerID", FieldKind::Identifier, true),
    field("WorkerName", FieldKind::Text, true),
    field("Skills", FieldKind::List, false),
    field("AvailableSlots", FieldKind::IntArray, false),
    field("MaxLoadPerPhase", FieldKind::Integer, false),
    field("WorkerGroup", FieldKind::Text, false),
    field("QualificationLevel", FieldKind::Integer, false),
];

const TASK_FIELDS: &[FieldSpec] = &[
    field("TaskID", FieldKind::Identifier, true),
    field("TaskName", FieldKind::Text, true),
    field("Category", FieldKind::Enum, true),
    field("Duration", FieldKind::Integer, false),
    field("RequiredSkills", FieldKind::List, false),
    field("PreferredPhases", FieldKind::PhaseSet, false),
    field("MaxConcurrent", FieldKind::Integer, false),
];

/// Returns the canonical fields of an entity type, in schema order.
pub fn fields(entity: EntityType) -> &'static [FieldSpec] {
    match entity {
        EntityType::Client => CLIENT_FIELDS,
        EntityType::Worker => WORKER_FIELDS,
        EntityType::Task => TASK_FIELDS,
    }
}

/// Looks up a canonical field by exact name.
pub fn field_spec(entity: EntityType, name: &str) -> Option<&'static FieldSpec> {
    fields(entity).iter().find(|f| f.name == name)
}

/// Returns the identifier field of an entity type.
pub fn id_field(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Client => "ClientID",
        EntityType::Worker => "WorkerID",
        EntityType::Task => "TaskID",
    }
}

/// Returns true if `name` is a canonical field of any entity type.
pub fn is_canonical(name: &str) -> bool {
    EntityType::ALL
        .iter()
        .any(|e| field_spec(*e, name).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let required: Vec<&str> = fields(EntityType::Task)
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, ["TaskID", "TaskName", "Category"]);
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(
            field_spec(EntityType::Task, "PreferredPhases").map(|f| f.kind),
            Some(FieldKind::PhaseSet)
        );
        assert!(field_spec(EntityType::Client, "PreferredPhases").is_none());
        assert!(is_canonical("AvailableSlots"));
        assert!(!is_canonical("Budget"));
    }
}
