//! Business-rule endpoints.

use hyper::{body::Bytes, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use sheet_clean_core::rules::{build_rule, validate_rule_structure, EntityCounts, Rule, RulesExport};

use crate::router::RouterError;

use super::request_utils::{json_ok, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct ValidateRuleRequest {
    pub rule: Rule,
}

/// Checks the structure of one rule.
///
/// # Endpoint
/// `POST /rules/validate`
///
/// # Response
/// ```json
/// { "success": true, "data": { "isValid": false, "errors": ["Co-run rules must have a tasks array"] } }
/// ```
pub fn validate_rule(body: &Bytes) -> Result<Response<Bytes>, RouterError> {
    let request: ValidateRuleRequest = parse_json_body(body)?;
    json_ok(validate_rule_structure(&request.rule))
}

#[derive(Debug, Deserialize)]
pub struct BuildRuleRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Builds a rule from form options, assigning an id and timestamps.
///
/// # Endpoint
/// `POST /rules/build`
pub fn create_rule(body: &Bytes) -> Result<Response<Bytes>, RouterError> {
    let request: BuildRuleRequest = parse_json_body(body)?;
    if request.kind.trim().is_empty() {
        return Err(RouterError::BadRequest("Rule type is required".to_string()));
    }
    json_ok(build_rule(&request.kind, &request.description, &request.options))
}

#[derive(Debug, Deserialize)]
pub struct ExportRulesRequest {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub counts: Option<EntityCounts>,
}

/// Bundles rules for download.
///
/// # Endpoint
/// `POST /rules/export`
pub fn export_rules(body: &Bytes) -> Result<Response<Bytes>, RouterError> {
    let request: ExportRulesRequest = parse_json_body(body)?;
    json_ok(RulesExport::new(&request.rules, request.counts))
}
