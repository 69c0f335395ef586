//! Rule-based validators for uploaded rows.
//!
//! Each validator takes the full row set of one entity type (duplicate
//! detection needs the whole set) and returns diagnostics in row-major,
//! field-discovery order. Validators never fail: unparseable values become
//! diagnostics for that field only.

mod checks;
mod client;
mod dispatcher;
mod task;
mod worker;

use serde::{Deserialize, Serialize};

pub use client::{validate_clients, validate_clients_with};
pub use dispatcher::{
    group_by_row, run_validations, run_validations_named, run_validations_with,
    validate_field_in_context, validate_field_in_context_with, validate_single_field,
    validate_single_field_with, RowMessages,
};
pub use task::{validate_tasks, validate_tasks_with};
pub use worker::validate_workers;

/// A validation finding tied to one row and one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDiagnostic {
    pub row_index: usize,
    pub column: String,
    pub message: String,
}

impl ValidationDiagnostic {
    pub fn new(row_index: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row_index,
            column: column.into(),
            message: message.into(),
        }
    }
}
