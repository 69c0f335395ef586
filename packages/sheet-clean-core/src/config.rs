//! Engine configuration.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CleanError;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Longest accepted filter query in characters
    pub max_query_length: usize,
    /// Shortest accepted generated expression after cleanup
    pub min_expression_length: usize,
    /// Longest accepted generated expression
    pub max_expression_length: usize,
    /// Maximum parenthesis/unary nesting in an expression
    pub max_expression_depth: usize,
    /// Rows an expression is test-evaluated against before a full run
    pub expression_sample_rows: usize,
    /// Rows sent to the expression generator as context
    pub ai_sample_rows: usize,
    /// Accepted GroupTag values
    pub group_tags: Vec<String>,
    /// Accepted task categories (empty = any non-empty value)
    pub task_categories: Vec<String>,
    /// Request body read timeout in milliseconds (API server)
    pub request_timeout_ms: u64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            max_query_length: 1000,
            min_expression_length: 5,
            max_expression_length: 2000,
            max_expression_depth: 64,
            expression_sample_rows: 3,
            ai_sample_rows: 5,
            group_tags: ["GroupA", "GroupB", "GroupC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            task_categories: [
                "ETL",
                "Analytics",
                "ML",
                "Design",
                "QA",
                "Security",
                "Infrastructure",
                "Writing",
                "DevOps",
                "Research",
                "Marketing",
                "Sales",
                "Compliance",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            request_timeout_ms: 5000, // 5 seconds default
        }
    }
}

impl CleanConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CleanError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CleanError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string. Missing keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, CleanError> {
        toml::from_str(toml_str).map_err(|e| CleanError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Saves the configuration to a TOML file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CleanError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| CleanError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), toml)
            .map_err(|e| CleanError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Applies environment variable overrides.
    /// Environment variables are prefixed with `SHEETCLEAN_`.
    /// Example: `SHEETCLEAN_MAX_QUERY_LENGTH=500` overrides `max_query_length`.
    /// List values are comma-separated.
    pub fn apply_env_overrides(&mut self) -> Result<(), CleanError> {
        override_number("SHEETCLEAN_MAX_QUERY_LENGTH", &mut self.max_query_length)?;
        override_number(
            "SHEETCLEAN_MIN_EXPRESSION_LENGTH",
            &mut self.min_expression_length,
        )?;
        override_number(
            "SHEETCLEAN_MAX_EXPRESSION_LENGTH",
            &mut self.max_expression_length,
        )?;
        override_number(
            "SHEETCLEAN_MAX_EXPRESSION_DEPTH",
            &mut self.max_expression_depth,
        )?;
        override_number(
            "SHEETCLEAN_EXPRESSION_SAMPLE_ROWS",
            &mut self.expression_sample_rows,
        )?;
        override_number("SHEETCLEAN_AI_SAMPLE_ROWS", &mut self.ai_sample_rows)?;
        override_number("SHEETCLEAN_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms)?;
        if let Ok(val) = env::var("SHEETCLEAN_GROUP_TAGS") {
            self.group_tags = split_list(&val);
        }
        if let Ok(val) = env::var("SHEETCLEAN_TASK_CATEGORIES") {
            self.task_categories = split_list(&val);
        }
        Ok(())
    }

    /// Returns true if `tag` is an accepted GroupTag value.
    pub fn is_group_tag(&self, tag: &str) -> bool {
        self.group_tags.iter().any(|t| t == tag)
    }

    /// Returns true if `category` is accepted (case-insensitive).
    pub fn is_task_category(&self, category: &str) -> bool {
        self.task_categories.is_empty()
            || self
                .task_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
    }
}

fn override_number<T: std::str::FromStr>(key: &str, target: &mut T) -> Result<(), CleanError> {
    if let Ok(val) = env::var(key) {
        *target = val
            .trim()
            .parse()
            .map_err(|_| CleanError::Config(format!("Invalid {}: {}", key, val)))?;
    }
    Ok(())
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
