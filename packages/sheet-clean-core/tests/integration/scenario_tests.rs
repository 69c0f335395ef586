//! End-to-end scenarios: validate, group, filter and replay chips.

use serde_json::json;

use sheet_clean_core::expression::safe_evaluate;
use sheet_clean_core::filter::{apply_chips, apply_text_filter, presets, remove_chip, FilterChip};
use sheet_clean_core::parsers::parse_phases;
use sheet_clean_core::row::{rows_from_json, EntityType};
use sheet_clean_core::validation::{
    group_by_row, run_validations, validate_field_in_context, ValidationDiagnostic,
};

use super::helpers::{client, ids, row, task, worker};

#[test]
fn test_out_of_range_priority() {
    let rows = vec![client("C1", "Acme", json!("7"))];
    assert_eq!(
        run_validations(EntityType::Client, &rows),
        vec![ValidationDiagnostic::new(
            0,
            "PriorityLevel",
            "PriorityLevel must be integer 1–5"
        )]
    );
}

#[test]
fn test_malformed_phase_array_still_matches() {
    let row = task("T1", json!(1), json!("[2-4]"));
    let parsed = parse_phases(row.get("PreferredPhases").unwrap()).unwrap();
    assert!(parsed.set.contains(3));
    assert!(parsed.recovered);

    let kept = apply_text_filter("in phase 3", &[row.clone()], EntityType::Task);
    assert_eq!(kept.len(), 1);

    let diagnostics = run_validations(EntityType::Task, &[row]);
    assert!(diagnostics
        .iter()
        .any(|d| d.message == "PreferredPhases has malformed JSON array"));
}

#[test]
fn test_skills_include() {
    let rows = vec![
        worker("W1", "coding,ml", "GroupA"),
        worker("W2", "design,testing", "GroupB"),
    ];
    let kept = apply_text_filter("skills include coding", &rows, EntityType::Worker);
    assert_eq!(ids(&kept, "WorkerID"), ["W1"]);
}

#[test]
fn test_missing_field_expression_is_false() {
    for row in [
        client("C1", "Acme", json!(3)),
        worker("W1", "coding", "GroupA"),
        task("T1", json!(2), json!("1-2")),
    ] {
        assert!(!safe_evaluate("row.NonExistentField.includes('x')", &row));
    }
}

#[test]
fn test_uploaded_sheet_round() {
    let rows = rows_from_json(
        r#"[
            {"TaskID": "T1", "TaskName": "Load", "Category": "ETL", "Duration": 2, "PreferredPhases": "1 - 3", "MaxConcurrent": 2},
            {"TaskID": "T1", "TaskName": "", "Category": "ETL", "Duration": 0, "PreferredPhases": "[2-4]"},
            {"TaskID": "T3", "TaskName": "Train", "Category": "ML", "Duration": "4", "PreferredPhases": [3, 4], "MaxConcurrent": 1}
        ]"#,
    )
    .unwrap();

    let diagnostics = run_validations(EntityType::Task, &rows);
    let grouped = group_by_row(&diagnostics);
    assert!(!grouped.contains_key(&0));
    assert!(!grouped.contains_key(&2));
    let second = &grouped[&1];
    assert_eq!(second["TaskName"], "Missing TaskName");
    assert_eq!(second["TaskID"], "Duplicate TaskID");
    assert_eq!(second["Duration"], "Duration must be integer ≥ 1");
    assert_eq!(
        second["PreferredPhases"],
        "PreferredPhases has malformed JSON array"
    );

    // A live edit is checked against the earlier rows.
    assert_eq!(
        validate_field_in_context(EntityType::Task, &rows, 2, "TaskID", &json!("T1")).as_deref(),
        Some("Duplicate TaskID")
    );
    assert_eq!(
        validate_field_in_context(EntityType::Task, &rows, 2, "TaskID", &json!("T2")),
        None
    );
    assert_eq!(
        validate_field_in_context(EntityType::Task, &rows, 9, "TaskID", &json!("T2")),
        None
    );
}

#[test]
fn test_chip_stack_replay() {
    let rows = vec![
        task("T1", json!(1), json!("1-2")),
        task("T2", json!(4), json!("[2,3]")),
        task("T3", json!(6), json!("5")),
    ];
    let mut chips = vec![
        FilterChip::manual("duration > 2"),
        FilterChip::ai("early", "row.PreferredPhases.includes('2')"),
    ];
    assert_eq!(ids(&apply_chips(&chips, &rows, EntityType::Task), "TaskID"), ["T2"]);

    let first = chips[0].id.clone();
    assert!(remove_chip(&mut chips, &first));
    assert_eq!(
        ids(&apply_chips(&chips, &rows, EntityType::Task), "TaskID"),
        ["T1", "T2"]
    );
    assert!(!remove_chip(&mut chips, &first));
}

#[test]
fn test_presets_run_cleanly() {
    let rows = vec![
        task("T1", json!(1), json!("1-2")),
        task("T2", json!(4), json!("[2,3]")),
    ];
    for entity in EntityType::ALL {
        for preset in presets(entity) {
            let kept = apply_text_filter(preset.query, &rows, entity);
            assert!(kept.len() <= rows.len(), "{}", preset.label);
        }
    }
}

#[test]
fn test_composite_query_needs_every_field() {
    let rows = vec![
        task("T1", json!(2), json!("1-3")),
        row(&[("TaskID", json!("T2")), ("PreferredPhases", json!("1-3"))]),
        task("T3", json!(2), json!("[4,5]")),
    ];
    let kept = apply_text_filter(
        "tasks that last 2 phases and run in phase 3",
        &rows,
        EntityType::Task,
    );
    assert_eq!(ids(&kept, "TaskID"), ["T1"]);

    let clients = vec![client("C1", "Acme", json!(5)), row(&[("ClientID", json!("C2"))])];
    let kept = apply_text_filter("priority level greater than 3", &clients, EntityType::Client);
    assert_eq!(ids(&kept, "ClientID"), ["C1"]);
}
