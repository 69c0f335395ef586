//! Row builders shared by the integration tests.

use serde_json::{json, Value};
use sheet_clean_core::row::Row;

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().cloned())
}

pub fn client(id: &str, name: &str, priority: Value) -> Row {
    row(&[
        ("ClientID", json!(id)),
        ("ClientName", json!(name)),
        ("PriorityLevel", priority),
    ])
}

pub fn worker(id: &str, skills: &str, group: &str) -> Row {
    row(&[
        ("WorkerID", json!(id)),
        ("WorkerName", json!(format!("Worker {id}"))),
        ("Skills", json!(skills)),
        ("AvailableSlots", json!("[1,2]")),
        ("MaxLoadPerPhase", json!(2)),
        ("WorkerGroup", json!(group)),
        ("QualificationLevel", json!(5)),
    ])
}

pub fn task(id: &str, duration: Value, phases: Value) -> Row {
    row(&[
        ("TaskID", json!(id)),
        ("TaskName", json!(format!("Task {id}"))),
        ("Category", json!("ETL")),
        ("Duration", duration),
        ("PreferredPhases", phases),
    ])
}

pub fn ids(rows: &[Row], field: &str) -> Vec<String> {
    rows.iter().filter_map(|r| r.text(field)).collect()
}
