//! Header mapping and AI filtering against in-process collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use sheet_clean_core::collaborator::{
    apply_ai_filter, headers_of, map_headers_or_identity, ExpressionGenerator,
    GeneratedExpression, HeaderMapper,
};
use sheet_clean_core::config::CleanConfig;
use sheet_clean_core::error::{CollaboratorError, FilterErrorKind};
use sheet_clean_core::row::{EntityType, Row};
use sheet_clean_core::validation::run_validations;

use super::helpers::{ids, row};

/// Maps headers by stripping spaces, the way a model usually answers.
struct CompactingMapper;

#[async_trait]
impl HeaderMapper for CompactingMapper {
    async fn map_headers(
        &self,
        headers: &[String],
        _entity: EntityType,
    ) -> Result<HashMap<String, String>, CollaboratorError> {
        Ok(headers
            .iter()
            .filter(|h| h.contains(' '))
            .map(|h| (h.clone(), h.replace(' ', "")))
            .collect())
    }
}

struct KeywordGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ExpressionGenerator for KeywordGenerator {
    async fn generate(
        &self,
        query: &str,
        _entity: EntityType,
        _sample: &[Row],
    ) -> Result<GeneratedExpression, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.contains("senior") {
            Ok(GeneratedExpression::expression(
                "Expression: QualificationLevel >= 7",
            ))
        } else {
            Ok(GeneratedExpression::error("I could not understand that"))
        }
    }
}

fn uploaded_workers() -> Vec<Row> {
    vec![
        row(&[
            ("Worker ID", json!("W1")),
            ("Worker Name", json!("Ana")),
            ("Qualification Level", json!(8)),
        ]),
        row(&[
            ("Worker ID", json!("W2")),
            ("Worker Name", json!("Ben")),
            ("Qualification Level", json!(3)),
        ]),
    ]
}

#[tokio::test]
async fn test_mapped_headers_then_validated() {
    let rows = uploaded_workers();
    let headers = headers_of(&rows);
    let mapping = map_headers_or_identity(&CompactingMapper, &headers, EntityType::Worker).await;
    let mapped = mapping.apply(&rows);

    assert_eq!(ids(&mapped, "WorkerID"), ["W1", "W2"]);
    let diagnostics = run_validations(EntityType::Worker, &mapped);
    assert!(diagnostics.iter().all(|d| d.column != "WorkerID"));
}

#[tokio::test]
async fn test_ai_filter_end_to_end() {
    let generator = KeywordGenerator {
        calls: AtomicUsize::new(0),
    };
    let config = CleanConfig::default();
    let rows = vec![
        row(&[("WorkerID", json!("W1")), ("QualificationLevel", json!(8))]),
        row(&[("WorkerID", json!("W2")), ("QualificationLevel", json!("3"))]),
        row(&[("WorkerID", json!("W3")), ("QualificationLevel", json!(7))]),
    ];

    let outcome = apply_ai_filter(&generator, "senior workers", &rows, EntityType::Worker, &config)
        .await
        .unwrap();
    assert_eq!(ids(&outcome.rows, "WorkerID"), ["W1", "W3"]);
    assert_eq!(
        outcome.chip.expression.as_deref(),
        Some("row.QualificationLevel >= 7")
    );

    let err = apply_ai_filter(&generator, "whatever", &rows, EntityType::Worker, &config)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FilterErrorKind::Api);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(rows.len(), 3);
}
