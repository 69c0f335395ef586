use std::collections::HashSet;

use crate::parsers::{parse_slot_array, SlotError};
use crate::row::Row;

use super::checks::RowCheck;
use super::ValidationDiagnostic;

/// Validates worker rows. Worker rules do not depend on [`CleanConfig`](crate::config::CleanConfig).
pub fn validate_workers(rows: &[Row]) -> Vec<ValidationDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();

    for (i, row) in rows.iter().enumerate() {
        let mut check = RowCheck::new(i, row, &mut diagnostics);
        check.required("WorkerID");
        check.required("WorkerName");
        check.unique("WorkerID", &mut seen);

        check.list("Skills");

        if let Some(slots) = row.get("AvailableSlots") {
            match parse_slot_array(slots) {
                Ok(_) => {}
                Err(SlotError::NotJsonArray) => {
                    check.push("AvailableSlots", "AvailableSlots must be valid JSON array")
                }
                Err(SlotError::NonPositive) => check.push(
                    "AvailableSlots",
                    "AvailableSlots must contain positive integers",
                ),
            }
        }

        check.integer(
            "MaxLoadPerPhase",
            1,
            None,
            "MaxLoadPerPhase must be a positive integer",
        );

        if row.get("WorkerGroup").is_some() && row.non_blank("WorkerGroup").is_none() {
            check.push("WorkerGroup", "WorkerGroup cannot be empty");
        }

        check.integer(
            "QualificationLevel",
            1,
            Some(10),
            "QualificationLevel must be integer 1–10",
        );
    }

    diagnostics
}
