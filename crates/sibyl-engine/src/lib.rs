//! Intent registry and classification engine.
//!
//! Intents are configured at runtime, in bulk from tabular uploads or one
//! record at a time, then validated as a whole set and published as
//! immutable, versioned snapshots that classification reads without ever
//! blocking on an update in progress.

/// Deterministic rule-based classification.
pub mod classifier;
/// High-level facade exposing the boundary operations.
pub mod engine;
/// Engine error types.
pub mod error;
/// Normalization of tabular input into candidate records.
pub mod ingest;
/// The intent record model and its well-formedness rules.
pub mod record;
/// Immutable snapshots and the hot-reload manager.
pub mod registry;
/// Text normalization and similarity metrics.
pub mod similarity;
/// The injected persistence backend.
pub mod store;
/// Whole-set validation of candidate records.
pub mod validate;

pub use classifier::Classifier;
pub use engine::{Activation, ApplyOutcome, EngineStats, IntentCatalog, IntentEngine, IntentSummary};
pub use error::{EngineError, Result};
pub use ingest::{Cell, Normalizer, Row, columns};
pub use record::{FieldError, IntentRecord};
pub use registry::{RegistryManager, Snapshot};
pub use store::{RegistryStore, TomlFileStore, starter_records};
pub use validate::ValidationEngine;
