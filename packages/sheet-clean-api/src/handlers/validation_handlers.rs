//! Validation endpoints.

use hyper::{body::Bytes, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use sheet_clean_core::row::{EntityType, Row};
use sheet_clean_core::validation::{
    group_by_row, run_validations_with, validate_field_in_context_with,
    validate_single_field_with, RowMessages, ValidationDiagnostic,
};

use crate::router::{AppState, RouterError};

use super::request_utils::{json_ok, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct ValidateRowsRequest {
    pub rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRowsResponse {
    pub diagnostics: Vec<ValidationDiagnostic>,
    pub by_row: RowMessages,
    pub error_count: usize,
}

/// Validates a full row set.
///
/// # Endpoint
/// `POST /entities/{entity}/validate`
///
/// # Request Body
/// ```json
/// { "rows": [{"ClientID": "C1", "ClientName": "Acme", "PriorityLevel": "7"}] }
/// ```
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "diagnostics": [{"rowIndex": 0, "column": "PriorityLevel", "message": "PriorityLevel must be integer 1–5"}],
///     "byRow": {"0": {"PriorityLevel": "PriorityLevel must be integer 1–5"}},
///     "errorCount": 1
///   }
/// }
/// ```
pub fn validate_rows(
    body: &Bytes,
    entity: EntityType,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let request: ValidateRowsRequest = parse_json_body(body)?;
    let diagnostics = run_validations_with(entity, &request.rows, &state.config);
    json_ok(ValidateRowsResponse {
        by_row: group_by_row(&diagnostics),
        error_count: diagnostics.len(),
        diagnostics,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateFieldRequest {
    pub field: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub row: Row,
    /// Full row set, for duplicate detection
    #[serde(default)]
    pub rows: Option<Vec<Row>>,
    #[serde(default)]
    pub row_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ValidateFieldResponse {
    pub message: Option<String>,
}

/// Validates one candidate cell value.
///
/// # Endpoint
/// `POST /entities/{entity}/validate/field`
///
/// When `rows` and `rowIndex` are given the value is checked inside the full
/// row set; otherwise against `row` alone.
pub fn validate_field(
    body: &Bytes,
    entity: EntityType,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let request: ValidateFieldRequest = parse_json_body(body)?;
    let message = match (&request.rows, request.row_index) {
        (Some(rows), Some(index)) => {
            if index >= rows.len() {
                return Err(RouterError::BadRequest(format!(
                    "rowIndex {} is out of range for {} rows",
                    index,
                    rows.len()
                )));
            }
            validate_field_in_context_with(
                entity,
                rows,
                index,
                &request.field,
                &request.value,
                &state.config,
            )
        }
        _ => validate_single_field_with(
            entity,
            &request.field,
            &request.value,
            &request.row,
            &state.config,
        ),
    };
    debug!(entity = %entity, field = %request.field, invalid = message.is_some(), "Field validated");
    json_ok(ValidateFieldResponse { message })
}
