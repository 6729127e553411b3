//! Whole-set validation of candidate intent records.

use crate::record::IntentRecord;
use crate::registry::Snapshot;
use crate::similarity;
use sibyl_core::config::ValidationConfig;
use sibyl_core::{ValidationIssue, ValidationReport};
use std::collections::HashMap;

/// Checks a candidate record set (and, for merges, the resulting merged
/// set) for structural and semantic correctness.
///
/// Every applicable rule is evaluated; the report carries the complete
/// list of problems rather than the first one found, so an operator can
/// fix a whole upload in one pass.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Creates a validation engine with the given rule tuning.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validates `candidates` as a replacement set, or as a merge against
    /// the active snapshot when `existing` is supplied (existing records
    /// with a matching `intent_id` are replaced, the rest kept).
    ///
    /// Warnings are reported for the submitted records; untouched existing
    /// records were already warned about when they were submitted.
    #[must_use]
    pub fn validate(
        &self,
        candidates: &[IntentRecord],
        existing: Option<&Snapshot>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        // Rule 1: per-record well-formedness.
        for candidate in candidates {
            for field_error in candidate.well_formedness_errors() {
                report.push_error(ValidationIssue::for_field(
                    candidate.intent_id.clone(),
                    field_error.field,
                    field_error.message,
                ));
            }
        }

        // Rule 2: no duplicate intent_id among candidates.
        let mut id_counts: Vec<(&str, usize)> = Vec::new();
        for candidate in candidates {
            if let Some(entry) = id_counts
                .iter_mut()
                .find(|(id, _)| *id == candidate.intent_id)
            {
                entry.1 += 1;
            } else {
                id_counts.push((&candidate.intent_id, 1));
            }
        }
        for (intent_id, count) in &id_counts {
            if *count > 1 {
                report.push_error(ValidationIssue::for_field(
                    *intent_id,
                    "intent_id",
                    format!("intent_id '{intent_id}' appears {count} times"),
                ));
            }
        }

        // Rule 3: no duplicate (category, intent_name) among candidates.
        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(earlier) = candidates[..index].iter().find(|other| {
                other.category == candidate.category && other.intent_name == candidate.intent_name
            }) {
                report.push_error(ValidationIssue::for_field(
                    candidate.intent_id.clone(),
                    "intent_name",
                    format!(
                        "intent_name '{}' in category '{}' is already used by {}",
                        candidate.intent_name, candidate.category, earlier.intent_id
                    ),
                ));
            }
        }

        // Rule 4: for merges, the merged set must also be free of
        // (category, intent_name) collisions with kept existing records.
        if let Some(snapshot) = existing {
            let candidate_ids: Vec<&str> = candidates
                .iter()
                .map(|candidate| candidate.intent_id.as_str())
                .collect();
            for candidate in candidates {
                if let Some(kept) = snapshot.records().iter().find(|record| {
                    !candidate_ids.contains(&record.intent_id.as_str())
                        && record.category == candidate.category
                        && record.intent_name == candidate.intent_name
                }) {
                    report.push_error(ValidationIssue::for_field(
                        candidate.intent_id.clone(),
                        "intent_name",
                        format!(
                            "intent_name '{}' in category '{}' is already used by {}",
                            candidate.intent_name, candidate.category, kept.intent_id
                        ),
                    ));
                }
            }
        }

        // Rule 5: the resulting registry must not be empty.
        let resulting_len = existing.map_or(candidates.len(), |snapshot| {
            let replaced = snapshot
                .records()
                .iter()
                .filter(|record| {
                    candidates
                        .iter()
                        .any(|candidate| candidate.intent_id == record.intent_id)
                })
                .count();
            snapshot.len() - replaced + candidates.len()
        });
        if resulting_len == 0 {
            report.push_error(ValidationIssue::for_set(
                "registry must contain at least one intent",
            ));
        }

        // Rule 6: thin training data warning.
        for candidate in candidates {
            let count = candidate.training_utterances.len();
            if count < self.config.min_training_utterances {
                report.push_warning(ValidationIssue::for_field(
                    candidate.intent_id.clone(),
                    "training_utterances",
                    format!(
                        "only {count} training utterances (recommended minimum {})",
                        self.config.min_training_utterances
                    ),
                ));
            }
        }

        // Rule 7: overlapping training data without a disambiguation prompt.
        self.warn_on_overlap(candidates, existing, &mut report);

        report
    }

    fn warn_on_overlap(
        &self,
        candidates: &[IntentRecord],
        existing: Option<&Snapshot>,
        report: &mut ValidationReport,
    ) {
        let mut resulting: Vec<&IntentRecord> = candidates.iter().collect();
        if let Some(snapshot) = existing {
            resulting.extend(snapshot.records().iter().filter(|record| {
                !candidates
                    .iter()
                    .any(|candidate| candidate.intent_id == record.intent_id)
            }));
        }

        let normalized: HashMap<&str, Vec<String>> = resulting
            .iter()
            .map(|record| {
                let phrases = record
                    .training_utterances
                    .iter()
                    .map(|utterance| similarity::normalize(utterance))
                    .collect();
                (record.intent_id.as_str(), phrases)
            })
            .collect();

        for candidate in candidates {
            if candidate.disambiguation_prompt.is_some() {
                continue;
            }
            let Some(own_phrases) = normalized.get(candidate.intent_id.as_str()) else {
                continue;
            };
            for other in &resulting {
                if other.intent_id == candidate.intent_id {
                    continue;
                }
                let Some(other_phrases) = normalized.get(other.intent_id.as_str()) else {
                    continue;
                };
                let best = own_phrases
                    .iter()
                    .map(|phrase| similarity::best_similarity(phrase, other_phrases))
                    .fold(0.0, f64::max);
                if best >= self.config.similarity_floor {
                    report.push_warning(ValidationIssue::for_field(
                        candidate.intent_id.clone(),
                        "disambiguation_prompt",
                        format!(
                            "training utterances overlap with intent '{}' \
                             ({best:.2} similarity) and no disambiguation_prompt is configured",
                            other.intent_id
                        ),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, category: &str) -> IntentRecord {
        IntentRecord::new(id, name, category, "TestAgent", "test intent").with_utterances(vec![
            "first phrase",
            "second phrase",
            "third phrase",
            "fourth phrase",
            "fifth phrase",
        ])
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(ValidationConfig::default())
    }

    #[test]
    fn test_unique_valid_set_passes() {
        let candidates = vec![
            record("INT-PHR-0001", "pharmacy", "healthcare"),
            record("INT-CLM-0035", "claims", "claims"),
        ];
        let report = engine().validate(&candidates, None);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_duplicate_id_named_in_error() {
        let candidates = vec![
            record("INT-WEL-0047", "wellness", "wellness"),
            record("INT-WEL-0047", "fitness", "wellness"),
        ];
        let report = engine().validate(&candidates, None);
        assert!(!report.valid);
        assert!(
            report
                .errors
                .iter()
                .any(|issue| issue.intent_id.as_deref() == Some("INT-WEL-0047")
                    && issue.message.contains("appears 2 times"))
        );
    }

    #[test]
    fn test_duplicate_name_within_category() {
        let candidates = vec![
            record("INT-PHR-0001", "pharmacy", "healthcare"),
            record("INT-PHX-0002", "pharmacy", "healthcare"),
        ];
        let report = engine().validate(&candidates, None);
        assert!(!report.valid);
        assert!(
            report
                .errors
                .iter()
                .any(|issue| issue.field.as_deref() == Some("intent_name")
                    && issue.message.contains("INT-PHR-0001"))
        );
    }

    #[test]
    fn test_same_name_in_different_categories_is_fine() {
        let candidates = vec![
            record("INT-PHR-0001", "support", "healthcare"),
            record("INT-FIN-0002", "support", "financial"),
        ];
        assert!(engine().validate(&candidates, None).valid);
    }

    #[test]
    fn test_empty_set_is_an_error() {
        let report = engine().validate(&[], None);
        assert!(!report.valid);
        assert!(
            report
                .errors
                .iter()
                .any(|issue| issue.message.contains("at least one intent"))
        );
    }

    #[test]
    fn test_merge_conflict_with_kept_record() {
        let snapshot_records = vec![
            record("INT-PHR-0001", "pharmacy", "healthcare"),
            record("INT-CLM-0035", "claims", "claims"),
        ];
        let manager = crate::registry::RegistryManager::new(engine(), 0.75);
        manager.stage(snapshot_records);
        if let Err(error) = manager.activate_staged() {
            panic!("activation failed: {error}");
        }
        let snapshot = manager.current();

        // New id, but collides on (category, name) with a kept record.
        let candidate = record("INT-PHX-0009", "pharmacy", "healthcare");
        let report = engine().validate(std::slice::from_ref(&candidate), Some(&snapshot));
        assert!(!report.valid);

        // Same id means in-place update, so no collision with itself.
        let update = record("INT-PHR-0001", "pharmacy", "healthcare");
        let report = engine().validate(std::slice::from_ref(&update), Some(&snapshot));
        assert!(report.valid);
    }

    #[test]
    fn test_all_problems_reported_at_once() {
        let mut first = record("INT-WEL-0047", "wellness", "wellness");
        first.agent_routing = String::new();
        let second = record("INT-WEL-0047", "wellness", "wellness");
        let report = engine().validate(&[first, second], None);

        let fields: Vec<_> = report
            .errors
            .iter()
            .filter_map(|issue| issue.field.as_deref())
            .collect();
        assert!(fields.contains(&"agent_routing"), "rule 1 must run");
        assert!(fields.contains(&"intent_id"), "rule 2 must run");
        assert!(fields.contains(&"intent_name"), "rule 3 must run");
    }

    #[test]
    fn test_thin_training_data_warns() {
        let mut candidate = record("INT-PHR-0001", "pharmacy", "healthcare");
        candidate.training_utterances.truncate(2);
        let report = engine().validate(std::slice::from_ref(&candidate), None);
        assert!(report.valid, "warnings must not block");
        assert!(
            report
                .warnings
                .iter()
                .any(|issue| issue.message.contains("only 2 training utterances"))
        );
    }

    #[test]
    fn test_overlap_without_prompt_warns_and_names_conflict() {
        let first = record("INT-CLM-0035", "claims", "claims")
            .with_utterances(vec!["check my claim status", "submit a claim", "claim denied"]);
        let second = record("INT-APL-0037", "appeals", "claims")
            .with_utterances(vec!["check my claims status", "appeal a denial", "file appeal"]);
        let report = engine().validate(&[first, second], None);
        assert!(report.valid);
        assert!(
            report
                .warnings
                .iter()
                .any(|issue| issue.intent_id.as_deref() == Some("INT-CLM-0035")
                    && issue.message.contains("INT-APL-0037")),
            "overlap warning must name the conflicting intent"
        );

        // A configured prompt silences the warning for that record.
        let first = record("INT-CLM-0035", "claims", "claims")
            .with_utterances(vec!["check my claim status"])
            .with_prompt("Are you asking about a claim or an appeal?");
        let second = record("INT-APL-0037", "appeals", "claims")
            .with_utterances(vec!["check my claims status"])
            .with_prompt("Are you asking about an appeal?");
        let report = engine().validate(&[first, second], None);
        assert!(
            !report
                .warnings
                .iter()
                .any(|issue| issue.field.as_deref() == Some("disambiguation_prompt"))
        );
    }
}
