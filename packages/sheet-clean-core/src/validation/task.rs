use std::collections::HashSet;

use crate::config::CleanConfig;
use crate::parsers::parse_phases;
use crate::row::{value_text, Row};

use super::checks::{RowCheck, DEFAULT_CONFIG};
use super::ValidationDiagnostic;

const PHASES_INVALID: &str =
    "PreferredPhases must be a range, JSON array, or comma list of positive integers";
const PHASES_MALFORMED: &str = "PreferredPhases has malformed JSON array";

/// Validates task rows with the default configuration.
pub fn validate_tasks(rows: &[Row]) -> Vec<ValidationDiagnostic> {
    validate_tasks_with(rows, &DEFAULT_CONFIG)
}

/// Validates task rows.
pub fn validate_tasks_with(rows: &[Row], config: &CleanConfig) -> Vec<ValidationDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();

    for (i, row) in rows.iter().enumerate() {
        let mut check = RowCheck::new(i, row, &mut diagnostics);
        check.required("TaskID");
        check.required("TaskName");
        check.required("Category");
        check.unique("TaskID", &mut seen);

        if let Some(category) = row.non_blank("Category") {
            if !config.is_task_category(&category) {
                check.push(
                    "Category",
                    format!("Category '{}' is not a recognized category", category),
                );
            }
        }

        check.integer("Duration", 1, None, "Duration must be integer ≥ 1");
        check.list("RequiredSkills");

        if let Some(phases) = row.get("PreferredPhases") {
            match parse_phases(phases) {
                Ok(parsed) if !parsed.recovered => {}
                // a salvaged bracket value is usable for filtering but still flagged
                Ok(_) if value_text(phases).trim_start().starts_with('[') => {
                    check.push("PreferredPhases", PHASES_MALFORMED)
                }
                _ => check.push("PreferredPhases", PHASES_INVALID),
            }
        }

        check.integer(
            "MaxConcurrent",
            1,
            None,
            "MaxConcurrent must be a positive integer",
        );
    }

    diagnostics
}
