//! The canonical shape of one configured intent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Intent identifier format: `INT-<CATEGORY-CODE>-<4-digit-sequence>`.
static INTENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used, reason = "Regex pattern is known to be valid")]
    Regex::new(r"^INT-[A-Z]{2,5}-[0-9]{4}$").expect("Valid regex")
});

fn default_priority() -> u8 {
    3
}

/// One configured intent: training exemplars, keywords, routing target,
/// and optional per-intent decision tuning.
///
/// `intent_id` is the immutable key; re-submitting a record with the same
/// id updates it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    /// Globally unique identifier, `INT-<CODE>-<NNNN>`
    pub intent_id: String,
    /// Human-readable name, unique within its category
    pub intent_name: String,
    /// Routing category the intent belongs to
    pub category: String,
    /// Downstream handler receiving utterances matched to this intent
    pub agent_routing: String,
    /// Tie-break weight in ambiguous matches, 1-5, higher wins
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Short operator-facing description
    pub description_short: String,
    /// Positive exemplar phrases used for matching
    pub training_utterances: Vec<String>,
    /// Case-insensitive keywords contributing to the score
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Clarifying question offered when this intent is a near-tied candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation_prompt: Option<String>,
    /// Per-intent override of the registry-wide confidence threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
}

/// A single well-formedness violation on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl IntentRecord {
    /// Creates a record with the required fields and defaults elsewhere.
    #[must_use]
    pub fn new(
        intent_id: impl Into<String>,
        intent_name: impl Into<String>,
        category: impl Into<String>,
        agent_routing: impl Into<String>,
        description_short: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            intent_name: intent_name.into(),
            category: category.into(),
            agent_routing: agent_routing.into(),
            priority: default_priority(),
            description_short: description_short.into(),
            training_utterances: Vec::new(),
            keywords: Vec::new(),
            disambiguation_prompt: None,
            confidence_threshold: None,
        }
    }

    /// Sets the training utterances.
    #[must_use]
    pub fn with_utterances<S: Into<String>>(mut self, utterances: Vec<S>) -> Self {
        self.training_utterances = utterances.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keywords.
    #[must_use]
    pub fn with_keywords<S: Into<String>>(mut self, keywords: Vec<S>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the tie-break priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the disambiguation prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.disambiguation_prompt = Some(prompt.into());
        self
    }

    /// Sets the per-intent confidence threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    /// The threshold this record must clear, given the registry default.
    #[must_use]
    pub fn effective_threshold(&self, registry_default: f64) -> f64 {
        self.confidence_threshold.unwrap_or(registry_default)
    }

    /// Keywords lowercased, trimmed, and deduplicated, preserving first
    /// occurrence order.
    #[must_use]
    pub fn normalized_keywords(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for keyword in &self.keywords {
            let normalized = crate::similarity::normalize(keyword);
            if !normalized.is_empty() && !seen.contains(&normalized) {
                seen.push(normalized);
            }
        }
        seen
    }

    /// Pure per-record well-formedness check.
    ///
    /// Covers type/format/range/presence rules only; cross-record
    /// uniqueness needs the whole candidate set and belongs to the
    /// validation engine.
    #[must_use]
    pub fn well_formedness_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if !INTENT_ID_PATTERN.is_match(&self.intent_id) {
            errors.push(FieldError::new(
                "intent_id",
                format!(
                    "'{}' does not match INT-<CATEGORY-CODE>-<4-digit-sequence>",
                    self.intent_id
                ),
            ));
        }
        if self.intent_name.trim().is_empty() {
            errors.push(FieldError::new("intent_name", "must be non-empty"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "must be non-empty"));
        }
        if self.agent_routing.trim().is_empty() {
            errors.push(FieldError::new("agent_routing", "must be non-empty"));
        }
        if !(1..=5).contains(&self.priority) {
            errors.push(FieldError::new(
                "priority",
                format!("must be between 1 and 5, got {}", self.priority),
            ));
        }
        if self.description_short.trim().is_empty() {
            errors.push(FieldError::new("description_short", "must be non-empty"));
        }
        if self.training_utterances.is_empty() {
            errors.push(FieldError::new(
                "training_utterances",
                "at least one training utterance is required",
            ));
        } else if self
            .training_utterances
            .iter()
            .any(|utterance| utterance.trim().is_empty())
        {
            errors.push(FieldError::new(
                "training_utterances",
                "contains a blank utterance",
            ));
        }
        if let Some(threshold) = self.confidence_threshold
            && !(threshold > 0.0 && threshold <= 1.0)
        {
            errors.push(FieldError::new(
                "confidence_threshold",
                format!("must be in (0, 1], got {threshold}"),
            ));
        }

        errors
    }
}
