//! Cleaning engine for client, worker and task spreadsheets.
//!
//! Provides lenient field parsers, rule-based row validators, a deterministic
//! natural-language row filter, and safe evaluation of generated filter
//! expressions.

pub mod collaborator;
pub mod config;
pub mod error;
pub mod expression;
pub mod filter;
pub mod parsers;
pub mod row;
pub mod rules;
pub mod schema;
pub mod validation;

pub use config::CleanConfig;
pub use error::{CleanError, CollaboratorError, ExpressionError, FilterError, FilterErrorKind};
pub use expression::{safe_evaluate, test_expression, CompiledExpression};
pub use filter::{apply_text_filter, find_matching_field, FilterChip};
pub use row::{EntityType, Row};
pub use validation::{run_validations, validate_single_field, ValidationDiagnostic};
