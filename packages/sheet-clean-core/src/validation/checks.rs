//! Field checks shared by the entity validators.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::config::CleanConfig;
use crate::parsers::{parse_integer, parse_list};
use crate::row::Row;

use super::ValidationDiagnostic;

pub(super) static DEFAULT_CONFIG: LazyLock<CleanConfig> = LazyLock::new(CleanConfig::default);

/// Collects diagnostics for one row.
pub(super) struct RowCheck<'a> {
    pub row_index: usize,
    pub row: &'a Row,
    out: &'a mut Vec<ValidationDiagnostic>,
}

impl<'a> RowCheck<'a> {
    pub fn new(row_index: usize, row: &'a Row, out: &'a mut Vec<ValidationDiagnostic>) -> Self {
        Self {
            row_index,
            row,
            out,
        }
    }

    pub fn push(&mut self, column: &str, message: impl Into<String>) {
        self.out
            .push(ValidationDiagnostic::new(self.row_index, column, message));
    }

    /// Emits "Missing X" when the field is absent or blank.
    pub fn required(&mut self, field: &str) {
        if self.row.non_blank(field).is_none() {
            self.push(field, format!("Missing {}", field));
        }
    }

    /// Emits "Duplicate X" when the trimmed identifier was already seen.
    pub fn unique(&mut self, field: &str, seen: &mut HashSet<String>) {
        if let Some(id) = self.row.non_blank(field) {
            if !seen.insert(id) {
                self.push(field, format!("Duplicate {}", field));
            }
        }
    }

    /// Checks an optional integer field against inclusive bounds.
    pub fn integer(&mut self, field: &str, min: i64, max: Option<i64>, message: &str) {
        let Some(value) = self.row.get(field) else {
            return;
        };
        let ok = parse_integer(value).is_some_and(|n| n >= min && max.is_none_or(|m| n <= m));
        if !ok {
            self.push(field, message);
        }
    }

    /// Checks an optional list field for empty tokens. Returns the parsed
    /// tokens when the field is present.
    pub fn list(&mut self, field: &str) -> Option<Vec<String>> {
        let value = self.row.get(field)?;
        let list = parse_list(value);
        if list.has_empty() {
            self.push(field, format!("{} contains an empty entry", field));
        }
        Some(list.values().map(str::to_string).collect())
    }
}
