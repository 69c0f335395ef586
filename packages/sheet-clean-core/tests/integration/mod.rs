//! Integration suite for the cleaning engine.
//!
//! Sections:
//! 1. Engine properties (totality, duplicates, phase encodings, boundaries)
//! 2. End-to-end scenarios over small sheets
//! 3. Collaborator flows with in-process doubles
//! 4. Configuration loading

pub mod collaborator_tests;
pub mod config_tests;
pub mod helpers;
pub mod property_tests;
pub mod scenario_tests;
