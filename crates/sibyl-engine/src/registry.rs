//! The active intent registry: immutable snapshots and the hot-reload
//! manager that swaps them atomically.

use crate::error::{EngineError, Result};
use crate::record::IntentRecord;
use crate::validate::ValidationEngine;
use sibyl_core::{IgnoreLock as _, IgnoreRwLock as _, ValidationReport};
use std::collections::HashMap;
use std::result::Result as StdResult;
use std::sync::{Arc, Mutex, RwLock};

/// An immutable, versioned, fully-validated set of intent records.
///
/// Snapshots are shared via `Arc` and never mutated after creation; a
/// classification call holding a reference to a superseded snapshot
/// completes against that snapshot.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    records: Vec<IntentRecord>,
    by_id: HashMap<String, usize>,
    default_threshold: f64,
}

impl Snapshot {
    fn new(version: u64, mut records: Vec<IntentRecord>, default_threshold: f64) -> Self {
        records.sort_by(|left, right| left.intent_id.cmp(&right.intent_id));
        let by_id = records
            .iter()
            .enumerate()
            .map(|(index, record)| (record.intent_id.clone(), index))
            .collect();
        Self {
            version,
            records,
            by_id,
            default_threshold,
        }
    }

    /// The pre-publication snapshot a fresh manager starts from.
    #[must_use]
    pub fn empty(default_threshold: f64) -> Self {
        Self::new(0, Vec::new(), default_threshold)
    }

    /// Monotonically increasing publication version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// All records, ordered by `intent_id` for deterministic iteration.
    #[must_use]
    pub fn records(&self) -> &[IntentRecord] {
        &self.records
    }

    /// Looks up one record by its identifier.
    #[must_use]
    pub fn get(&self, intent_id: &str) -> Option<&IntentRecord> {
        self.by_id.get(intent_id).map(|index| &self.records[*index])
    }

    /// Number of records in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registry-wide default confidence threshold in force at this version.
    #[must_use]
    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    /// Total training utterances across all records.
    #[must_use]
    pub fn utterance_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.training_utterances.len())
            .sum()
    }
}

/// A validated candidate set awaiting explicit activation.
#[derive(Debug)]
struct StagedSet {
    records: Vec<IntentRecord>,
    based_on: u64,
    report: ValidationReport,
}

/// Holds the active configuration and publishes validated replacements.
///
/// Validation and ingestion always run against private candidate data;
/// the locks here guard nothing but the pointer read and the pointer swap,
/// so readers are never blocked behind an update in progress.
pub struct RegistryManager {
    active: RwLock<Arc<Snapshot>>,
    staged: Mutex<Option<StagedSet>>,
    validator: ValidationEngine,
    default_threshold: f64,
}

impl RegistryManager {
    /// Creates a manager with an empty version-0 snapshot.
    #[must_use]
    pub fn new(validator: ValidationEngine, default_threshold: f64) -> Self {
        Self {
            active: RwLock::new(Arc::new(Snapshot::empty(default_threshold))),
            staged: Mutex::new(None),
            validator,
            default_threshold,
        }
    }

    /// Returns the active snapshot.
    ///
    /// Cheap (`Arc` clone), never blocks behind validation work, and never
    /// observes a half-built snapshot: publication is a single pointer swap.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.active.read_ignore_poison())
    }

    /// Validates a full replacement set and holds it as staged on success.
    ///
    /// Staging never touches the active snapshot; a previously staged set
    /// is discarded either way, since the operator's latest upload is the
    /// one awaiting review.
    pub fn stage(&self, candidates: Vec<IntentRecord>) -> ValidationReport {
        let report = self.validator.validate(&candidates, None);
        let mut staged = self.staged.lock_ignore_poison();
        if report.valid {
            *staged = Some(StagedSet {
                records: candidates,
                based_on: self.current().version(),
                report: report.clone(),
            });
        } else {
            *staged = None;
        }
        report
    }

    /// Atomically publishes the staged set as the new active snapshot.
    ///
    /// # Errors
    /// Returns [`EngineError::NothingStaged`] when no validated set is
    /// staged, or [`EngineError::StaleStage`] when the active registry
    /// changed after staging; the caller must re-stage in both cases.
    pub fn activate_staged(&self) -> Result<(u64, ValidationReport)> {
        let staged = self
            .staged
            .lock_ignore_poison()
            .take()
            .ok_or(EngineError::NothingStaged)?;

        match self.try_publish(staged.records, staged.based_on) {
            Ok(version) => Ok((version, staged.report)),
            Err(active) => Err(EngineError::StaleStage {
                staged_against: staged.based_on,
                active,
            }),
        }
    }

    /// Validates a single-record merge and publishes it in one step.
    ///
    /// On a validation failure the active snapshot is untouched and the
    /// report carries every problem found. A writer that loses a publish
    /// race re-validates against the fresh snapshot and tries again;
    /// last-writer-wins is acceptable because records are full-record
    /// replacements keyed by `intent_id`.
    pub fn apply_merge(&self, candidate: IntentRecord) -> (ValidationReport, Option<u64>) {
        loop {
            let current = self.current();
            let report = self
                .validator
                .validate(std::slice::from_ref(&candidate), Some(&current));
            if !report.valid {
                return (report, None);
            }

            let merged = Self::merged_records(&current, candidate.clone());
            match self.try_publish(merged, current.version()) {
                Ok(version) => return (report, Some(version)),
                Err(_) => continue,
            }
        }
    }

    fn merged_records(current: &Snapshot, candidate: IntentRecord) -> Vec<IntentRecord> {
        let mut merged: Vec<IntentRecord> = current
            .records()
            .iter()
            .filter(|record| record.intent_id != candidate.intent_id)
            .cloned()
            .collect();
        merged.push(candidate);
        merged
    }

    /// Swaps in a new snapshot if the active version is still `expected`.
    ///
    /// The snapshot is fully built before the write lock is taken; the
    /// lock covers only the version comparison and the pointer assignment.
    /// On failure the observed active version is returned.
    fn try_publish(&self, records: Vec<IntentRecord>, expected: u64) -> StdResult<u64, u64> {
        let snapshot = Arc::new(Snapshot::new(
            expected + 1,
            records,
            self.default_threshold,
        ));
        let version = snapshot.version();
        let count = snapshot.len();

        {
            let mut active = self.active.write_ignore_poison();
            if active.version() != expected {
                return Err(active.version());
            }
            *active = snapshot;
        }

        tracing::info!("published intent registry v{version} ({count} intents)");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sibyl_core::config::ValidationConfig;

    fn record(id: &str, name: &str) -> IntentRecord {
        IntentRecord::new(id, name, "healthcare", "TestAgent", "test intent")
            .with_utterances(vec!["alpha", "beta", "gamma", "delta", "epsilon"])
    }

    fn manager() -> RegistryManager {
        RegistryManager::new(ValidationEngine::new(ValidationConfig::default()), 0.75)
    }

    #[test]
    fn test_starts_empty_at_version_zero() {
        let manager = manager();
        let snapshot = manager.current();
        assert_eq!(snapshot.version(), 0);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_stage_then_activate_publishes() {
        let manager = manager();
        let report = manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        assert!(report.valid);
        assert_eq!(
            manager.current().version(),
            0,
            "staging must not publish anything"
        );

        let (version, _report) = match manager.activate_staged() {
            Ok(outcome) => outcome,
            Err(error) => panic!("activation failed: {error}"),
        };
        assert_eq!(version, 1);
        assert_eq!(manager.current().len(), 1);
    }

    #[test]
    fn test_invalid_stage_holds_nothing() {
        let manager = manager();
        let report = manager.stage(Vec::new());
        assert!(!report.valid);

        match manager.activate_staged() {
            Err(EngineError::NothingStaged) => {}
            other => panic!("expected NothingStaged, got {other:?}"),
        }
        assert_eq!(manager.current().version(), 0);
    }

    #[test]
    fn test_stale_staging_is_refused() {
        let manager = manager();
        let report = manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        assert!(report.valid);

        // A merge lands between staging and activation.
        let (report, version) = manager.apply_merge(record("INT-CLM-0035", "claims"));
        assert!(report.valid);
        assert_eq!(version, Some(1));

        match manager.activate_staged() {
            Err(EngineError::StaleStage {
                staged_against,
                active,
            }) => {
                assert_eq!(staged_against, 0);
                assert_eq!(active, 1);
            }
            other => panic!("expected StaleStage, got {other:?}"),
        }
        assert_eq!(manager.current().version(), 1, "publish must be refused");
    }

    #[test]
    fn test_merge_replaces_by_id() {
        let manager = manager();
        manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        if let Err(error) = manager.activate_staged() {
            panic!("activation failed: {error}");
        }

        let mut updated = record("INT-PHR-0001", "pharmacy");
        updated.agent_routing = "PharmacyAgentV2".to_owned();
        let (report, version) = manager.apply_merge(updated);
        assert!(report.valid);
        assert_eq!(version, Some(2));

        let snapshot = manager.current();
        assert_eq!(snapshot.len(), 1, "same id must update in place");
        let agent = snapshot
            .get("INT-PHR-0001")
            .map(|found| found.agent_routing.clone());
        assert_eq!(agent.as_deref(), Some("PharmacyAgentV2"));
    }

    #[test]
    fn test_invalid_merge_leaves_version_untouched() {
        let manager = manager();
        manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        if let Err(error) = manager.activate_staged() {
            panic!("activation failed: {error}");
        }

        let mut bad = record("INT-XXX-0002", "other");
        bad.agent_routing = String::new();
        let (report, version) = manager.apply_merge(bad);
        assert!(!report.valid);
        assert_eq!(version, None);
        assert_eq!(manager.current().version(), 1);
    }

    #[test]
    fn test_reader_keeps_superseded_snapshot() {
        let manager = manager();
        manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        if let Err(error) = manager.activate_staged() {
            panic!("activation failed: {error}");
        }

        let held = manager.current();
        let (_, version) = manager.apply_merge(record("INT-CLM-0035", "claims"));
        assert_eq!(version, Some(2));

        assert_eq!(held.version(), 1, "held reference must not change");
        assert_eq!(held.len(), 1);
        assert_eq!(manager.current().len(), 2);
    }

    #[test]
    fn test_concurrent_merges_serialize() {
        let manager = Arc::new(manager());
        manager.stage(vec![record("INT-PHR-0001", "pharmacy")]);
        if let Err(error) = manager.activate_staged() {
            panic!("activation failed: {error}");
        }

        let ids = ["INT-AAA-0001", "INT-BBB-0002", "INT-CCC-0003", "INT-DDD-0004"];
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let manager = Arc::clone(&manager);
                let candidate = record(id, &format!("intent-{id}"));
                std::thread::spawn(move || manager.apply_merge(candidate))
            })
            .collect();
        for handle in handles {
            let (report, version) = match handle.join() {
                Ok(outcome) => outcome,
                Err(_) => panic!("writer thread panicked"),
            };
            assert!(report.valid);
            assert!(version.is_some());
        }

        let snapshot = manager.current();
        assert_eq!(snapshot.version(), 5, "each merge bumps the version once");
        assert_eq!(snapshot.len(), 5);
    }
}
