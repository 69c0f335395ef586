//! Active filter chips and re-application of a chip stack.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::expression::CompiledExpression;
use crate::row::{EntityType, Row};

use super::text_filter::TextQuery;

static NEXT_CHIP: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipKind {
    Manual,
    Ai,
}

/// One applied filter. AI chips keep their generated expression so the stack
/// can be replayed without calling the generator again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChip {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ChipKind,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl FilterChip {
    pub fn manual(query: impl Into<String>) -> Self {
        Self::new(ChipKind::Manual, query.into(), None)
    }

    pub fn ai(query: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ChipKind::Ai, query.into(), Some(expression.into()))
    }

    fn new(kind: ChipKind, query: String, expression: Option<String>) -> Self {
        let seq = NEXT_CHIP.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{}-{}", chrono::Utc::now().timestamp_millis(), seq),
            label: query.clone(),
            kind,
            query,
            expression,
        }
    }

    /// Applies this chip alone to `rows`.
    pub fn apply(&self, rows: &[Row], entity: EntityType) -> Vec<Row> {
        match (self.kind, &self.expression) {
            (ChipKind::Manual, _) => TextQuery::parse(&self.query).filter(rows, entity),
            (ChipKind::Ai, Some(expression)) => match CompiledExpression::compile(expression) {
                Ok(compiled) => compiled.filter(rows),
                Err(err) => {
                    warn!(chip = %self.id, "Skipping AI chip: {}", err);
                    rows.to_vec()
                }
            },
            (ChipKind::Ai, None) => {
                warn!(chip = %self.id, "Skipping AI chip without expression");
                rows.to_vec()
            }
        }
    }
}

/// Replays a chip stack over the original rows, in order.
pub fn apply_chips(chips: &[FilterChip], rows: &[Row], entity: EntityType) -> Vec<Row> {
    chips
        .iter()
        .fold(rows.to_vec(), |current, chip| chip.apply(&current, entity))
}

/// Removes the chip with `id`. Returns false if there was none.
pub fn remove_chip(chips: &mut Vec<FilterChip>, id: &str) -> bool {
    let before = chips.len();
    chips.retain(|c| c.id != id);
    chips.len() != before
}
