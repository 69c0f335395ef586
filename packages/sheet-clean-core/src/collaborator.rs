//! Seams to the external services used during cleaning.
//!
//! Header mapping and filter-expression generation are delegated to a
//! language model in production. The core only sees these traits, so the
//! engine stays testable with in-process doubles.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CleanConfig;
use crate::error::{CollaboratorError, FilterError};
use crate::expression::{clean_generated_expression, test_expression};
use crate::filter::FilterChip;
use crate::row::{EntityType, Row};

/// Maps uploaded column headers to canonical field names.
#[async_trait]
pub trait HeaderMapper: Send + Sync {
    /// Returns `uploaded header -> canonical field`. Headers left out of the
    /// result keep their uploaded name.
    async fn map_headers(
        &self,
        headers: &[String],
        entity: EntityType,
    ) -> Result<HashMap<String, String>, CollaboratorError>;
}

/// Raw answer from an expression generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedExpression {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GeneratedExpression {
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            expression: None,
            error: Some(error.into()),
        }
    }
}

/// Turns a natural-language query into a candidate boolean expression over `row`.
#[async_trait]
pub trait ExpressionGenerator: Send + Sync {
    async fn generate(
        &self,
        query: &str,
        entity: EntityType,
        sample: &[Row],
    ) -> Result<GeneratedExpression, CollaboratorError>;
}

/// Header rename table. Unknown headers map to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMapping(HashMap<String, String>);

impl HeaderMapping {
    /// Maps every header to itself.
    pub fn identity(headers: &[String]) -> Self {
        Self(headers.iter().map(|h| (h.clone(), h.clone())).collect())
    }

    /// Builds a mapping from a mapper answer. Blank targets are ignored.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self(
            map.into_iter()
                .filter_map(|(from, to)| {
                    let to = to.trim().to_string();
                    (!to.is_empty()).then_some((from, to))
                })
                .collect(),
        )
    }

    /// The field name `header` is renamed to.
    pub fn target<'a>(&'a self, header: &'a str) -> &'a str {
        self.0.get(header).map(String::as_str).unwrap_or(header)
    }

    /// Returns `rows` with keys renamed, keeping column order. When two
    /// columns map to the same name, the later column's value wins.
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter()
            .map(|row| Row::from_pairs(row.iter().map(|(k, v)| (self.target(k), v.clone()))))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Column headers across `rows`, in order of first appearance.
pub fn headers_of(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !headers.contains(key) {
            headers.push(key.clone());
        }
    }
    headers
}

/// Asks `mapper` for a mapping and falls back to identity when it fails.
pub async fn map_headers_or_identity(
    mapper: &dyn HeaderMapper,
    headers: &[String],
    entity: EntityType,
) -> HeaderMapping {
    match mapper.map_headers(headers, entity).await {
        Ok(map) => HeaderMapping::from_map(map),
        Err(err) => {
            warn!(entity = %entity, "Header mapping failed, keeping uploaded headers: {}", err);
            HeaderMapping::identity(headers)
        }
    }
}

/// Checks a filter query before any collaborator is called. Returns the
/// trimmed query.
pub fn validate_query(query: &str, config: &CleanConfig) -> Result<String, FilterError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(FilterError::validation("Please enter a filter query"));
    }
    if trimmed.chars().count() > config.max_query_length {
        return Err(FilterError::validation(format!(
            "Query is too long. Please keep it under {} characters.",
            config.max_query_length
        )));
    }
    Ok(trimmed.to_string())
}

/// Result of a successful AI filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct AiFilterOutcome {
    pub rows: Vec<Row>,
    pub chip: FilterChip,
}

/// Filters `rows` with an expression produced by `generator`.
///
/// The generator sees at most `config.ai_sample_rows` rows. Its answer is
/// cleaned, compiled and tried on the sample before any row is filtered, so a
/// failure leaves the caller's rows untouched.
pub async fn apply_ai_filter(
    generator: &dyn ExpressionGenerator,
    query: &str,
    rows: &[Row],
    entity: EntityType,
    config: &CleanConfig,
) -> Result<AiFilterOutcome, FilterError> {
    let query = validate_query(query, config)?;
    let sample = &rows[..rows.len().min(config.ai_sample_rows)];

    let generated = generator
        .generate(&query, entity, sample)
        .await
        .inspect_err(|err| warn!(query = %query, "Expression generator failed: {}", err))?;

    if let Some(message) = generated.error {
        warn!(query = %query, "Expression generator returned an error: {}", message);
        return Err(CollaboratorError::Api(message).into());
    }
    let raw = generated
        .expression
        .filter(|e| !e.trim().is_empty())
        .ok_or(CollaboratorError::EmptyResponse)?;

    let compiled = clean_generated_expression(&raw, config)
        .and_then(|cleaned| test_expression(&cleaned, sample, config))
        .inspect_err(|err| warn!(query = %query, raw = %raw, "Rejected generated expression: {}", err))?;

    let kept = compiled.filter(rows);
    debug!(
        entity = %entity,
        query = %query,
        expression = compiled.source(),
        kept = kept.len(),
        total = rows.len(),
        "AI filter applied"
    );
    Ok(AiFilterOutcome {
        rows: kept,
        chip: FilterChip::ai(query, compiled.source()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedGenerator {
        answer: Result<GeneratedExpression, CollaboratorError>,
        seen: Mutex<Vec<usize>>,
    }

    impl FixedGenerator {
        fn new(answer: Result<GeneratedExpression, CollaboratorError>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExpressionGenerator for FixedGenerator {
        async fn generate(
            &self,
            _query: &str,
            _entity: EntityType,
            sample: &[Row],
        ) -> Result<GeneratedExpression, CollaboratorError> {
            self.seen.lock().unwrap().push(sample.len());
            self.answer.clone()
        }
    }

    struct FailingMapper;

    #[async_trait]
    impl HeaderMapper for FailingMapper {
        async fn map_headers(
            &self,
            _headers: &[String],
            _entity: EntityType,
        ) -> Result<HashMap<String, String>, CollaboratorError> {
            Err(CollaboratorError::Network("connection refused".into()))
        }
    }

    fn tasks(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| Row::from_pairs([("TaskID", json!(format!("T{i}"))), ("Duration", json!(i))]))
            .collect()
    }

    #[tokio::test]
    async fn test_ai_filter_success() {
        let generator = FixedGenerator::new(Ok(GeneratedExpression::expression(
            "```js\nrow.Duration > 6;\n```",
        )));
        let rows = tasks(8);
        let outcome = apply_ai_filter(
            &generator,
            "  long tasks ",
            &rows,
            EntityType::Task,
            &CleanConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.chip.query, "long tasks");
        assert_eq!(outcome.chip.expression.as_deref(), Some("row.Duration > 6"));
        assert_eq!(*generator.seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_ai_filter_rejects_before_calling() {
        let generator = FixedGenerator::new(Ok(GeneratedExpression::default()));
        let config = CleanConfig::default();

        let err = apply_ai_filter(&generator, "   ", &tasks(2), EntityType::Task, &config)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Please enter a filter query");

        let long = "x".repeat(config.max_query_length + 1);
        let err = apply_ai_filter(&generator, &long, &tasks(2), EntityType::Task, &config)
            .await
            .unwrap_err();
        assert_eq!(
            err.message,
            "Query is too long. Please keep it under 1000 characters."
        );
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ai_filter_error_kinds() {
        let config = CleanConfig::default();
        let cases = [
            (
                Err(CollaboratorError::Network("timeout".into())),
                crate::error::FilterErrorKind::Network,
            ),
            (
                Ok(GeneratedExpression::error("model overloaded")),
                crate::error::FilterErrorKind::Api,
            ),
            (
                Ok(GeneratedExpression::default()),
                crate::error::FilterErrorKind::Api,
            ),
            (
                Ok(GeneratedExpression::expression("eval('row.Duration')")),
                crate::error::FilterErrorKind::Expression,
            ),
            (
                Ok(GeneratedExpression::expression("row.Nope.trim() === 'x'")),
                crate::error::FilterErrorKind::Expression,
            ),
        ];
        for (answer, kind) in cases {
            let generator = FixedGenerator::new(answer);
            let err = apply_ai_filter(&generator, "anything", &tasks(3), EntityType::Task, &config)
                .await
                .unwrap_err();
            assert_eq!(err.kind, kind);
        }
    }

    #[tokio::test]
    async fn test_mapping_falls_back_to_identity() {
        let headers = vec!["Task Id".to_string(), "Len".to_string()];
        let mapping = map_headers_or_identity(&FailingMapper, &headers, EntityType::Task).await;
        assert_eq!(mapping.target("Task Id"), "Task Id");
        assert_eq!(mapping.target("Len"), "Len");
    }

    #[test]
    fn test_mapping_apply_keeps_order() {
        let mapping = HeaderMapping::from_map(HashMap::from([
            ("Task Id".to_string(), "TaskID".to_string()),
            ("Len".to_string(), " ".to_string()),
        ]));
        let rows = vec![Row::from_pairs([
            ("Task Id", json!("T1")),
            ("Len", json!(3)),
            ("Extra", json!("x")),
        ])];
        let renamed = mapping.apply(&rows);
        let keys: Vec<&String> = renamed[0].keys().collect();
        assert_eq!(keys, ["TaskID", "Len", "Extra"]);
        assert_eq!(renamed[0].text("TaskID").as_deref(), Some("T1"));
    }

    #[test]
    fn test_headers_of_first_appearance() {
        let rows = vec![
            Row::from_pairs([("A", json!(1)), ("B", json!(2))]),
            Row::from_pairs([("C", json!(1)), ("A", json!(2))]),
        ];
        assert_eq!(headers_of(&rows), ["A", "B", "C"]);
    }
}
