//! Core types for the sibyl intent classification engine.
//!
//! This crate provides the shared error type, engine configuration,
//! classification and validation result types, and lock helpers used
//! across the sibyl workspace.

/// Engine configuration sections and TOML persistence.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Lock-poisoning recovery helpers.
pub mod sync;
/// Classification decision and validation report types.
pub mod types;

pub use config::{DecisionConfig, EngineConfig, IngestConfig, ScoringConfig, ValidationConfig};
pub use error::{Error, Result};
pub use sync::{IgnoreLock, IgnoreRwLock};
pub use types::{Candidate, ClassificationDecision, ValidationIssue, ValidationReport};
