//! Engine-wide properties: validators and the text filter are total, and the
//! parsers agree across encodings.

use ntest::timeout;
use proptest::prelude::*;
use serde_json::{json, Number, Value};

use sheet_clean_core::filter::{apply_text_filter, find_matching_field};
use sheet_clean_core::parsers::parse_phases;
use sheet_clean_core::row::{EntityType, Row};
use sheet_clean_core::validation::{run_validations, validate_clients, validate_single_field};

use super::helpers::{client, row};

const FIELDS: &[&str] = &[
    "ClientID",
    "ClientName",
    "PriorityLevel",
    "RequestedTaskIDs",
    "GroupTag",
    "AttributesJSON",
    "WorkerID",
    "Skills",
    "AvailableSlots",
    "MaxLoadPerPhase",
    "WorkerGroup",
    "QualificationLevel",
    "TaskID",
    "Category",
    "Duration",
    "RequiredSkills",
    "PreferredPhases",
    "MaxConcurrent",
    "Notes",
];

fn cell() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        ".{0,24}".prop_map(Value::String),
        prop::sample::select(vec!["[2-4]", "1 - 3", "[]", "[0]", "3,,4", "{\"a\":1}", "T1,x", " "])
            .prop_map(|s| Value::String(s.to_string())),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..3)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
        ]
    })
}

fn sheet() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        prop::collection::vec((prop::sample::select(FIELDS), cell()), 0..8)
            .prop_map(|pairs| Row::from_pairs(pairs)),
        0..6,
    )
}

proptest! {
    #[test]
    fn validators_are_total(rows in sheet()) {
        for entity in EntityType::ALL {
            let diagnostics = run_validations(entity, &rows);
            for d in &diagnostics {
                prop_assert!(d.row_index < rows.len());
                prop_assert!(!d.message.is_empty());
            }
        }
    }

    #[test]
    fn single_field_is_total(field in prop::sample::select(FIELDS), value in cell()) {
        for entity in EntityType::ALL {
            let _ = validate_single_field(entity, field, &value, &Row::new());
        }
    }

    #[test]
    fn text_filter_returns_subset(query in ".{0,64}", rows in sheet()) {
        for entity in EntityType::ALL {
            let kept = apply_text_filter(&query, &rows, entity);
            prop_assert!(kept.len() <= rows.len());
            for r in &kept {
                prop_assert!(rows.contains(r));
            }
        }
    }
}

#[test]
#[timeout(1000)]
fn test_injection_queries_are_subsets() {
    let rows = vec![client("C1", "Acme", json!(3)), client("C2", "Beta", json!(1))];
    for query in [
        "\"); DROP TABLE",
        "'; DELETE FROM clients; --",
        "<script>alert(1)</script>",
        "${process.exit()}",
        "priority > ",
        "((((",
        "",
    ] {
        let kept = apply_text_filter(query, &rows, EntityType::Client);
        assert!(kept.iter().all(|r| rows.contains(r)), "{query}");
    }
}

#[test]
fn test_duplicate_attributed_to_second_row() {
    let rows = vec![
        client("C1", "Acme", json!(1)),
        client("C1", "Acme Again", json!(2)),
    ];
    let duplicates: Vec<_> = validate_clients(&rows)
        .into_iter()
        .filter(|d| d.message == "Duplicate ClientID")
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].row_index, 1);
    assert_eq!(duplicates[0].column, "ClientID");
}

#[test]
fn test_phase_encodings_agree() {
    for encoding in ["1 - 3", "[1,2,3]", "1,2,3"] {
        let parsed = parse_phases(&json!(encoding)).unwrap();
        assert!(parsed.set.contains(2), "{encoding}");
        assert!(!parsed.set.contains(5), "{encoding}");
    }
}

#[test]
fn test_priority_boundaries() {
    for bad in [json!(0), json!(6), json!(2.5), json!("abc")] {
        let diagnostics = run_validations(
            EntityType::Client,
            &[client("C1", "Acme", bad.clone())],
        );
        assert!(
            diagnostics.iter().any(|d| d.column == "PriorityLevel"),
            "{bad}"
        );
    }
    for good in [json!(1), json!(5), json!("5")] {
        let diagnostics = run_validations(EntityType::Client, &[client("C1", "Acme", good)]);
        assert!(diagnostics.is_empty());
    }
}

#[test]
fn test_structured_match_wins() {
    let rows = vec![
        row(&[("TaskID", json!("T1")), ("Duration", json!(2))]),
        row(&[("TaskID", json!("T2")), ("Duration", json!(5))]),
    ];
    let kept = apply_text_filter("duration greater than 3", &rows, EntityType::Task);
    assert_eq!(kept, vec![rows[1].clone()]);
}

#[test]
fn test_group_resolves_per_entity() {
    let worker = row(&[("WorkerID", json!("W1")), ("WorkerGroup", json!("GroupA"))]);
    let client = row(&[("ClientID", json!("C1")), ("GroupTag", json!("GroupA"))]);
    assert_eq!(
        find_matching_field("group", &worker, EntityType::Worker).as_deref(),
        Some("WorkerGroup")
    );
    assert_eq!(
        find_matching_field("group", &client, EntityType::Client).as_deref(),
        Some("GroupTag")
    );
}
