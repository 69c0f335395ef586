//! Safe evaluation of generated filter expressions.
//!
//! Expressions are never executed as code. They are cleaned, normalized,
//! tokenized and parsed into a small AST that only supports comparisons,
//! boolean logic, literals, field access and a fixed set of functions and
//! methods. Evaluation is a pure interpretation over one row.

mod clean;
mod eval;
mod lexer;
mod normalize;
mod parser;

use tracing::warn;

use crate::config::CleanConfig;
use crate::error::ExpressionError;
use crate::row::Row;

pub use clean::clean_generated_expression;
pub use eval::EvalError;
pub use normalize::normalize_expression;

use eval::Evaluator;
use parser::Expr;

/// A parsed filter expression, ready to evaluate against rows.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    ast: Expr,
}

impl CompiledExpression {
    /// Normalizes and parses `source` with the default limits.
    pub fn compile(source: &str) -> Result<Self, ExpressionError> {
        Self::compile_with(source, &CleanConfig::default())
    }

    /// Normalizes and parses `source`, enforcing the configured length and
    /// nesting limits.
    pub fn compile_with(source: &str, config: &CleanConfig) -> Result<Self, ExpressionError> {
        let normalized = normalize_expression(source);
        if normalized.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let len = normalized.chars().count();
        if len > config.max_expression_length {
            return Err(ExpressionError::TooLong {
                len,
                limit: config.max_expression_length,
            });
        }
        let tokens = lexer::tokenize(&normalized)?;
        let ast = parser::parse(&tokens, config.max_expression_depth)?;
        Ok(Self {
            source: normalized,
            ast,
        })
    }

    /// The normalized source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates against one row, reporting runtime failures.
    pub fn try_evaluate(&self, row: &Row) -> Result<bool, EvalError> {
        Evaluator::new(row).eval(&self.ast).map(|v| v.truthy())
    }

    /// Evaluates against one row. Runtime failures count as `false`.
    pub fn evaluate(&self, row: &Row) -> bool {
        self.try_evaluate(row).unwrap_or_else(|err| {
            warn!(expression = %self.source, "Filter expression error: {}", err);
            false
        })
    }

    /// Returns the rows for which the expression holds, in input order.
    pub fn filter(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().filter(|r| self.evaluate(r)).cloned().collect()
    }
}

/// Compiles and evaluates `expression` against `row`; any failure is `false`.
pub fn safe_evaluate(expression: &str, row: &Row) -> bool {
    match CompiledExpression::compile(expression) {
        Ok(compiled) => compiled.evaluate(row),
        Err(err) => {
            warn!(expression, "Filter expression rejected: {}", err);
            false
        }
    }
}

/// Checks an expression before it is run over a full data set.
///
/// The expression must compile, and at least one of the first
/// `config.expression_sample_rows` sample rows must evaluate without a
/// runtime error. An empty sample only requires compilation.
pub fn test_expression(
    expression: &str,
    sample: &[Row],
    config: &CleanConfig,
) -> Result<CompiledExpression, ExpressionError> {
    let compiled = CompiledExpression::compile_with(expression, config)?;
    let mut last_error = None;
    for row in sample.iter().take(config.expression_sample_rows) {
        match compiled.try_evaluate(row) {
            Ok(_) => return Ok(compiled),
            Err(err) => last_error = Some(err),
        }
    }
    match last_error {
        Some(err) => Err(ExpressionError::Evaluation(err.to_string())),
        None => Ok(compiled),
    }
}
