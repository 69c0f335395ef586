//! HTTP endpoint implementations.
//!
//! Handlers receive the already-read request body and the parsed entity type
//! and answer synchronously from the core.

pub mod entity_handlers;
pub mod filter_handlers;
pub mod request_utils;
pub mod response;
pub mod rule_handlers;
pub mod validation_handlers;

pub use entity_handlers::{get_presets, get_schema};
pub use filter_handlers::{expression_filter, map_headers, replay_chips, text_filter};
pub use response::{error_response, filter_error_response, success_response, ApiResponse, ErrorResponse};
pub use rule_handlers::{create_rule, export_rules, validate_rule};
pub use validation_handlers::{validate_field, validate_rows};
