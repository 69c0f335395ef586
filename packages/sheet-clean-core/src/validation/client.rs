use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::CleanConfig;
use crate::row::Row;

use super::checks::{RowCheck, DEFAULT_CONFIG};
use super::ValidationDiagnostic;

static TASK_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^T\d+$").expect("valid regex"));

/// Validates client rows with the default configuration.
pub fn validate_clients(rows: &[Row]) -> Vec<ValidationDiagnostic> {
    validate_clients_with(rows, &DEFAULT_CONFIG)
}

/// Validates client rows.
pub fn validate_clients_with(rows: &[Row], config: &CleanConfig) -> Vec<ValidationDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();

    for (i, row) in rows.iter().enumerate() {
        let mut check = RowCheck::new(i, row, &mut diagnostics);
        check.required("ClientID");
        check.required("ClientName");
        check.unique("ClientID", &mut seen);

        check.integer("PriorityLevel", 1, Some(5), "PriorityLevel must be integer 1–5");

        if let Some(ids) = check.list("RequestedTaskIDs") {
            for id in ids.iter().filter(|id| !TASK_ID.is_match(id)) {
                check.push(
                    "RequestedTaskIDs",
                    format!("RequestedTaskIDs has invalid task ID '{}'", id),
                );
            }
        }

        if let Some(tag) = row.get("GroupTag") {
            let tag = crate::row::value_text(tag);
            if !config.is_group_tag(tag.trim()) {
                check.push(
                    "GroupTag",
                    format!("GroupTag must be one of {}", config.group_tags.join(", ")),
                );
            }
        }
        // AttributesJSON accepts JSON objects and free text alike
    }

    diagnostics
}
