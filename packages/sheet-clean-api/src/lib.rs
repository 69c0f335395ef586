//! HTTP API for sheet validation and filtering.
//!
//! Stateless JSON endpoints over the cleaning engine: rows travel in the
//! request body and every call is answered from the core directly.

pub mod handlers;
pub mod router;
pub mod server;
