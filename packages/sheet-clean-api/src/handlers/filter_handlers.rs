//! Filtering and header-mapping endpoints.

use std::collections::HashMap;

use hyper::{body::Bytes, Response};
use serde::{Deserialize, Serialize};

use sheet_clean_core::collaborator::{validate_query, HeaderMapping};
use sheet_clean_core::expression::{clean_generated_expression, test_expression};
use sheet_clean_core::filter::{apply_chips, apply_text_filter, FilterChip};
use sheet_clean_core::row::{EntityType, Row};

use crate::router::{AppState, RouterError};

use super::request_utils::{json_ok, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct TextFilterRequest {
    pub query: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub rows: Vec<Row>,
    pub kept: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<FilterChip>,
}

impl FilterResponse {
    fn new(rows: Vec<Row>, total: usize, chip: Option<FilterChip>) -> Self {
        Self {
            kept: rows.len(),
            rows,
            total,
            chip,
        }
    }
}

/// Filters rows with a natural-language query.
///
/// # Endpoint
/// `POST /entities/{entity}/filter`
///
/// # Request Body
/// ```json
/// { "query": "duration greater than 3", "rows": [{"TaskID": "T1", "Duration": 5}] }
/// ```
///
/// # Errors
/// - **422 Unprocessable Entity**: empty or overlong query
pub fn text_filter(
    body: &Bytes,
    entity: EntityType,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let request: TextFilterRequest = parse_json_body(body)?;
    let query = validate_query(&request.query, &state.config)?;
    let kept = apply_text_filter(&query, &request.rows, entity);
    json_ok(FilterResponse::new(
        kept,
        request.rows.len(),
        Some(FilterChip::manual(query)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ChipReplayRequest {
    pub chips: Vec<FilterChip>,
    pub rows: Vec<Row>,
}

/// Replays a chip stack over the original rows.
///
/// # Endpoint
/// `POST /entities/{entity}/filter/chips`
pub fn replay_chips(body: &Bytes, entity: EntityType) -> Result<Response<Bytes>, RouterError> {
    let request: ChipReplayRequest = parse_json_body(body)?;
    let kept = apply_chips(&request.chips, &request.rows, entity);
    json_ok(FilterResponse::new(kept, request.rows.len(), None))
}

#[derive(Debug, Deserialize)]
pub struct ExpressionFilterRequest {
    pub expression: String,
    #[serde(default)]
    pub query: Option<String>,
    pub rows: Vec<Row>,
}

/// Filters rows with a generated boolean expression.
///
/// The expression is cleaned, compiled and tried on the first rows before the
/// full set is filtered. Nothing is filtered when any step fails.
///
/// # Endpoint
/// `POST /entities/{entity}/filter/expression`
///
/// # Request Body
/// ```json
/// { "expression": "row.Duration > 3", "rows": [{"TaskID": "T1", "Duration": 5}] }
/// ```
///
/// # Errors
/// - **422 Unprocessable Entity**: typed filter error (`type` is `expression` or `api`)
pub fn expression_filter(
    body: &Bytes,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let request: ExpressionFilterRequest = parse_json_body(body)?;
    let cleaned = clean_generated_expression(&request.expression, &state.config)
        .map_err(sheet_clean_core::FilterError::from)?;
    let compiled = test_expression(&cleaned, &request.rows, &state.config)
        .map_err(sheet_clean_core::FilterError::from)?;
    let kept = compiled.filter(&request.rows);
    let label = request
        .query
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| compiled.source().to_string());
    json_ok(FilterResponse::new(
        kept,
        request.rows.len(),
        Some(FilterChip::ai(label, compiled.source())),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HeaderMappingRequest {
    pub rows: Vec<Row>,
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct HeaderMappingResponse {
    pub rows: Vec<Row>,
}

/// Renames row keys with a header mapping. Unmapped headers are kept.
///
/// # Endpoint
/// `POST /entities/{entity}/headers`
pub fn map_headers(body: &Bytes) -> Result<Response<Bytes>, RouterError> {
    let request: HeaderMappingRequest = parse_json_body(body)?;
    let mapping = HeaderMapping::from_map(request.mapping);
    json_ok(HeaderMappingResponse {
        rows: mapping.apply(&request.rows),
    })
}
