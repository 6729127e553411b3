//! High-level facade wiring ingestion, validation, the registry, and the
//! classifier into the boundary operations the transport layer calls.

use crate::classifier::Classifier;
use crate::error::{EngineError, Result};
use crate::ingest::{Normalizer, Row};
use crate::record::IntentRecord;
use crate::registry::{RegistryManager, Snapshot};
use crate::store::RegistryStore;
use crate::validate::ValidationEngine;
use serde::{Deserialize, Serialize};
use sibyl_core::{ClassificationDecision, EngineConfig, Error as CoreError, ValidationReport};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of activating a staged configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activation {
    /// Version of the newly active snapshot
    pub version: u64,
    /// The validation report produced when the set was staged
    pub report: ValidationReport,
}

/// Result of a single-record add/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Whether the merge was published
    pub success: bool,
    /// Active version after the call (unchanged on failure)
    pub version: u64,
    /// Full validation report for the merge
    pub report: ValidationReport,
}

/// Metadata for one configured intent, as listed to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSummary {
    /// Unique identifier
    pub intent_id: String,
    /// Human-readable name
    pub intent_name: String,
    /// Routing category
    pub category: String,
    /// Downstream handler
    pub agent_routing: String,
}

/// The catalog of configured intents with per-category counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentCatalog {
    /// All configured intents, ordered by id
    pub intents: Vec<IntentSummary>,
    /// Total number of intents
    pub count: usize,
    /// Number of intents per category
    pub categories: BTreeMap<String, usize>,
}

/// Health surface for the running engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    /// Active snapshot version
    pub version: u64,
    /// Number of configured intents
    pub intent_count: usize,
    /// Total training utterances across all intents
    pub utterance_count: usize,
}

/// The intent registry and classification engine.
///
/// Configuration updates and classification calls share nothing but the
/// atomically-swapped snapshot, so updates never block or tear an
/// in-flight classification.
pub struct IntentEngine {
    config: EngineConfig,
    validator: ValidationEngine,
    normalizer: Normalizer,
    classifier: Classifier,
    registry: RegistryManager,
    store: Option<Box<dyn RegistryStore>>,
}

impl IntentEngine {
    /// Creates an engine from a checked configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is internally inconsistent.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.check().map_err(EngineError::Core)?;

        let validator = ValidationEngine::new(config.validation.clone());
        let normalizer = Normalizer::new(config.ingest.clone());
        let classifier = Classifier::new(config.scoring.clone(), config.decision.clone());
        let registry = RegistryManager::new(
            validator.clone(),
            config.decision.default_confidence_threshold,
        );

        Ok(Self {
            config,
            validator,
            normalizer,
            classifier,
            registry,
            store: None,
        })
    }

    /// Attaches a persistence backend for bootstrap and [`Self::persist`].
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn RegistryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Loads the persisted registry and publishes it as the first snapshot.
    ///
    /// # Errors
    /// Returns an error when no store is attached, the store is
    /// unreachable, or the persisted records fail validation. All are
    /// fatal at startup, since there is no safe default registry to
    /// serve from.
    pub fn bootstrap(&self) -> Result<u64> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CoreError::Store("no registry store attached".to_owned()))?;
        let records = store.load().map_err(EngineError::Core)?;

        let report = self.registry.stage(records);
        if !report.valid {
            return Err(EngineError::Core(CoreError::Store(format!(
                "persisted registry failed validation with {} errors",
                report.errors.len()
            ))));
        }
        let (version, _report) = self.registry.activate_staged()?;
        Ok(version)
    }

    /// Normalizes and validates a bulk replacement upload, staging it for
    /// explicit activation on success.
    ///
    /// Staging never touches the active registry; an operator inspects the
    /// returned report and then calls [`Self::activate_staged`] to commit.
    pub fn stage_bulk(&self, rows: &[Row]) -> ValidationReport {
        let (records, report) = self.normalizer.normalize_rows(rows);
        if !report.valid {
            tracing::warn!(
                "bulk upload rejected: {} structural errors",
                report.errors.len()
            );
            return report;
        }
        let report = self.registry.stage(records);
        if !report.warnings.is_empty() {
            tracing::warn!("bulk upload staged with {} warnings", report.warnings.len());
        }
        report
    }

    /// Validates an already-typed record set as a full replacement and
    /// stages it, mirroring [`Self::stage_bulk`] for sources that bypass
    /// the tabular ingestion path.
    pub fn stage_records(&self, records: Vec<IntentRecord>) -> ValidationReport {
        self.registry.stage(records)
    }

    /// Atomically activates the staged configuration.
    ///
    /// # Errors
    /// Returns [`EngineError::NothingStaged`] or [`EngineError::StaleStage`]
    /// when there is nothing valid to activate; the transport layer renders
    /// these as `success = false`.
    pub fn activate_staged(&self) -> Result<Activation> {
        let (version, report) = self.registry.activate_staged()?;
        Ok(Activation { version, report })
    }

    /// Validates a single-record add/update as a merge against the active
    /// snapshot and publishes it atomically on success.
    pub fn apply_single(&self, record: IntentRecord) -> ApplyOutcome {
        let (report, version) = self.registry.apply_merge(record);
        ApplyOutcome {
            success: version.is_some(),
            version: version.unwrap_or_else(|| self.registry.current().version()),
            report,
        }
    }

    /// Classifies an utterance against the currently active snapshot.
    pub fn classify(&self, utterance: &str) -> ClassificationDecision {
        self.classifier.classify(utterance, &self.registry.current())
    }

    /// Dry-run validation: checks a candidate set, or the active snapshot
    /// when `candidates` is `None`, without staging or publishing anything.
    pub fn validate_only(&self, candidates: Option<&[IntentRecord]>) -> ValidationReport {
        candidates.map_or_else(
            || {
                self.validator
                    .validate(self.registry.current().records(), None)
            },
            |records| self.validator.validate(records, None),
        )
    }

    /// Lists the configured intents with per-category counts.
    pub fn list_intents(&self) -> IntentCatalog {
        let snapshot = self.registry.current();
        let mut categories = BTreeMap::new();
        let intents: Vec<IntentSummary> = snapshot
            .records()
            .iter()
            .map(|record| {
                *categories.entry(record.category.clone()).or_insert(0) += 1;
                IntentSummary {
                    intent_id: record.intent_id.clone(),
                    intent_name: record.intent_name.clone(),
                    category: record.category.clone(),
                    agent_routing: record.agent_routing.clone(),
                }
            })
            .collect();
        IntentCatalog {
            count: intents.len(),
            intents,
            categories,
        }
    }

    /// Reports the active version and record counts.
    pub fn stats(&self) -> EngineStats {
        let snapshot = self.registry.current();
        EngineStats {
            version: snapshot.version(),
            intent_count: snapshot.len(),
            utterance_count: snapshot.utterance_count(),
        }
    }

    /// Saves the active snapshot's records to the attached store.
    ///
    /// # Errors
    /// Returns an error when no store is attached or the write fails.
    pub fn persist(&self) -> Result<()> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CoreError::Store("no registry store attached".to_owned()))?;
        store
            .save(self.registry.current().records())
            .map_err(EngineError::Core)
    }

    /// The currently active snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.registry.current()
    }

    /// Version of the currently active snapshot.
    pub fn current_version(&self) -> u64 {
        self.registry.current().version()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
