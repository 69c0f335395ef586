//! Routing to the entity validators and single-field live checks.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CleanConfig;
use crate::row::{EntityType, Row};

use super::checks::DEFAULT_CONFIG;
use super::{validate_clients_with, validate_tasks_with, validate_workers, ValidationDiagnostic};

/// Per-row `{column: message}` map handed to display code.
pub type RowMessages = BTreeMap<usize, BTreeMap<String, String>>;

/// Validates `rows` as `entity` with the default configuration.
pub fn run_validations(entity: EntityType, rows: &[Row]) -> Vec<ValidationDiagnostic> {
    run_validations_with(entity, rows, &DEFAULT_CONFIG)
}

/// Validates `rows` as `entity`.
pub fn run_validations_with(
    entity: EntityType,
    rows: &[Row],
    config: &CleanConfig,
) -> Vec<ValidationDiagnostic> {
    let diagnostics = match entity {
        EntityType::Client => validate_clients_with(rows, config),
        EntityType::Worker => validate_workers(rows),
        EntityType::Task => validate_tasks_with(rows, config),
    };
    debug!(
        entity = %entity,
        rows = rows.len(),
        diagnostics = diagnostics.len(),
        "Validation run"
    );
    diagnostics
}

/// Validates rows for an entity given by name. Unknown names yield no diagnostics.
pub fn run_validations_named(entity: &str, rows: &[Row]) -> Vec<ValidationDiagnostic> {
    match entity.parse::<EntityType>() {
        Ok(entity) => run_validations(entity, rows),
        Err(err) => {
            warn!("Skipping validation: {}", err);
            Vec::new()
        }
    }
}

/// Validates a candidate cell value in isolation.
///
/// Builds a copy of `current_row` with `field` set to `candidate`, runs the
/// full validator on that single row, and returns the first message for
/// `field`. Duplicate identifiers cannot be detected this way; see
/// [`validate_field_in_context`].
pub fn validate_single_field(
    entity: EntityType,
    field: &str,
    candidate: &Value,
    current_row: &Row,
) -> Option<String> {
    validate_single_field_with(entity, field, candidate, current_row, &DEFAULT_CONFIG)
}

pub fn validate_single_field_with(
    entity: EntityType,
    field: &str,
    candidate: &Value,
    current_row: &Row,
    config: &CleanConfig,
) -> Option<String> {
    let mut row = current_row.clone();
    row.set(field, candidate.clone());
    first_message(
        run_validations_with(entity, std::slice::from_ref(&row), config),
        0,
        field,
    )
}

/// Validates a candidate cell value inside the full row set, so duplicate
/// identifiers are reported. Returns `None` when `row_index` is out of range.
pub fn validate_field_in_context(
    entity: EntityType,
    rows: &[Row],
    row_index: usize,
    field: &str,
    candidate: &Value,
) -> Option<String> {
    validate_field_in_context_with(entity, rows, row_index, field, candidate, &DEFAULT_CONFIG)
}

pub fn validate_field_in_context_with(
    entity: EntityType,
    rows: &[Row],
    row_index: usize,
    field: &str,
    candidate: &Value,
    config: &CleanConfig,
) -> Option<String> {
    let mut rows = rows.to_vec();
    rows.get_mut(row_index)?.set(field, candidate.clone());
    first_message(run_validations_with(entity, &rows, config), row_index, field)
}

fn first_message(
    diagnostics: Vec<ValidationDiagnostic>,
    row_index: usize,
    field: &str,
) -> Option<String> {
    diagnostics
        .into_iter()
        .find(|d| d.row_index == row_index && d.column == field)
        .map(|d| d.message)
}

/// Groups diagnostics by row, keeping the first message per column.
pub fn group_by_row(diagnostics: &[ValidationDiagnostic]) -> RowMessages {
    let mut grouped = RowMessages::new();
    for d in diagnostics {
        grouped
            .entry(d.row_index)
            .or_default()
            .entry(d.column.clone())
            .or_insert_with(|| d.message.clone());
    }
    grouped
}
