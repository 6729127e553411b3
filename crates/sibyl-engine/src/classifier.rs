//! Deterministic rule-based classification of utterances against a snapshot.

use crate::record::IntentRecord;
use crate::registry::Snapshot;
use crate::similarity;
use sibyl_core::config::{DecisionConfig, ScoringConfig};
use sibyl_core::{Candidate, ClassificationDecision};
use std::time::Instant;

/// Wording used when near-tied candidates have no configured prompt.
const GENERIC_CLARIFICATION_LEAD: &str = "I want to make sure I help you correctly.";

/// One intent's sub-scores against a single utterance.
#[derive(Debug)]
struct ScoredIntent<'snapshot> {
    record: &'snapshot IntentRecord,
    confidence: f64,
}

/// Computes per-intent scores and turns them into a decision.
///
/// Classification is pure computation over an immutable snapshot: no locks,
/// no I/O, no internal state. Identical `(utterance, snapshot)` inputs
/// always produce the same decision, which keeps routing auditable.
#[derive(Debug, Clone)]
pub struct Classifier {
    scoring: ScoringConfig,
    decision: DecisionConfig,
}

impl Classifier {
    /// Creates a classifier with the given scoring and decision tuning.
    #[must_use]
    pub fn new(scoring: ScoringConfig, decision: DecisionConfig) -> Self {
        Self { scoring, decision }
    }

    /// Classifies an utterance against a snapshot.
    ///
    /// A blank utterance and an utterance matching nothing both yield the
    /// no-match decision; neither is an error.
    #[must_use]
    pub fn classify(&self, utterance: &str, snapshot: &Snapshot) -> ClassificationDecision {
        let started = Instant::now();
        let normalized = similarity::normalize(utterance);
        if normalized.is_empty() || snapshot.is_empty() {
            return Self::finish(
                ClassificationDecision::no_match(0.0, Vec::new()),
                started,
            );
        }

        let mut scored: Vec<ScoredIntent<'_>> = snapshot
            .records()
            .iter()
            .map(|record| self.score(&normalized, record))
            .collect();
        scored.sort_by(|left, right| {
            right
                .confidence
                .total_cmp(&left.confidence)
                .then_with(|| right.record.priority.cmp(&left.record.priority))
                .then_with(|| left.record.intent_id.cmp(&right.record.intent_id))
        });

        let candidates: Vec<Candidate> = scored
            .iter()
            .take(self.decision.max_candidates)
            .filter(|entry| entry.confidence > 0.0)
            .map(|entry| Candidate {
                intent_name: entry.record.intent_name.clone(),
                intent_id: entry.record.intent_id.clone(),
                agent: entry.record.agent_routing.clone(),
                category: entry.record.category.clone(),
                score: entry.confidence,
            })
            .collect();

        let top = &scored[0];
        let second = scored.get(1);
        let effective_threshold = top
            .record
            .effective_threshold(snapshot.default_threshold());
        let leads_by_margin = second.is_none_or(|entry| {
            top.confidence - entry.confidence >= self.decision.ambiguity_margin
        });

        let decision = if top.confidence >= effective_threshold && leads_by_margin {
            tracing::debug!(
                "firm match: {} (confidence {:.3})",
                top.record.intent_id,
                top.confidence
            );
            ClassificationDecision {
                intent_name: Some(top.record.intent_name.clone()),
                agent: Some(top.record.agent_routing.clone()),
                intent_id: Some(top.record.intent_id.clone()),
                category: Some(top.record.category.clone()),
                confidence: top.confidence,
                needs_clarification: false,
                disambiguation_prompt: None,
                candidates,
                processing_time_ms: 0.0,
            }
        } else if second.is_some_and(|entry| {
            top.confidence - entry.confidence < self.decision.ambiguity_margin
                && top.confidence >= self.decision.consideration_floor
                && entry.confidence >= self.decision.consideration_floor
        }) {
            let prompt = top
                .record
                .disambiguation_prompt
                .clone()
                .unwrap_or_else(|| self.generic_prompt(&scored));
            tracing::debug!(
                "ambiguous between {} and {} (confidence {:.3})",
                top.record.intent_id,
                second.map_or("?", |entry| entry.record.intent_id.as_str()),
                top.confidence
            );
            ClassificationDecision {
                intent_name: None,
                agent: None,
                intent_id: None,
                category: None,
                confidence: top.confidence,
                needs_clarification: true,
                disambiguation_prompt: Some(prompt),
                candidates,
                processing_time_ms: 0.0,
            }
        } else {
            ClassificationDecision::no_match(top.confidence, candidates)
        };

        Self::finish(decision, started)
    }

    /// Combines the three sub-scores with the configured weights, clipped
    /// to [0, 1].
    fn score<'snapshot>(
        &self,
        normalized_utterance: &str,
        record: &'snapshot IntentRecord,
    ) -> ScoredIntent<'snapshot> {
        let phrases: Vec<String> = record
            .training_utterances
            .iter()
            .map(|phrase| similarity::normalize(phrase))
            .collect();

        let exact = if phrases.iter().any(|phrase| {
            similarity::is_near_exact(
                normalized_utterance,
                phrase,
                self.scoring.near_exact_max_edits,
            )
        }) {
            1.0
        } else {
            0.0
        };

        let keywords = record.normalized_keywords();
        let keyword = if keywords.is_empty() {
            0.0
        } else {
            let matched = keywords
                .iter()
                .filter(|keyword| similarity::contains_phrase(normalized_utterance, keyword))
                .count();
            matched as f64 / keywords.len() as f64
        };

        let fuzzy = similarity::best_similarity(normalized_utterance, &phrases);

        let confidence = (self.scoring.exact_weight * exact
            + self.scoring.keyword_weight * keyword
            + self.scoring.fuzzy_weight * fuzzy)
            .clamp(0.0, 1.0);

        ScoredIntent { record, confidence }
    }

    /// Builds a clarifying question from the descriptions of the
    /// candidates near-tied with the leader.
    fn generic_prompt(&self, scored: &[ScoredIntent<'_>]) -> String {
        let top_confidence = scored[0].confidence;
        let descriptions: Vec<&str> = scored
            .iter()
            .take(self.decision.max_candidates)
            .filter(|entry| top_confidence - entry.confidence < self.decision.ambiguity_margin)
            .map(|entry| entry.record.description_short.as_str())
            .collect();

        match descriptions.as_slice() {
            [first, second] => format!(
                "{GENERIC_CLARIFICATION_LEAD} Are you asking about {first} or {second}?"
            ),
            [first, second, third, ..] => format!(
                "{GENERIC_CLARIFICATION_LEAD} Are you asking about {first}, {second}, or {third}?"
            ),
            _ => {
                format!("{GENERIC_CLARIFICATION_LEAD} Could you tell me more about what you need?")
            }
        }
    }

    fn finish(mut decision: ClassificationDecision, started: Instant) -> ClassificationDecision {
        decision.processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        decision
    }
}
