//! Classification decision and validation report types.
//!
//! These are the wire-facing shapes: the serde field names match the
//! payloads the surrounding transport layer exposes verbatim.

use serde::{Deserialize, Serialize};

/// One problem found while validating a candidate record set.
///
/// `intent_id` and `field` are populated when the problem can be pinned to
/// a specific record or field; set-level problems leave them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Identifier of the offending record, when attributable
    pub intent_id: Option<String>,
    /// Offending field, when attributable
    pub field: Option<String>,
    /// Human-readable description of the problem
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue attributed to a specific record and field.
    pub fn for_field(
        intent_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: Some(intent_id.into()),
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates an issue attributed to a record as a whole.
    pub fn for_record(intent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            intent_id: Some(intent_id.into()),
            field: None,
            message: message.into(),
        }
    }

    /// Creates an issue about the candidate set as a whole.
    pub fn for_set(message: impl Into<String>) -> Self {
        Self {
            intent_id: None,
            field: None,
            message: message.into(),
        }
    }
}

/// Ephemeral result of validating a candidate record set.
///
/// Errors block publication; warnings do not. The report always carries
/// every problem found, never just the first one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the candidate set may be published
    pub valid: bool,
    /// Blocking problems, in rule order then record order
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking problems, in rule order then record order
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Creates an empty, valid report.
    #[must_use]
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records a blocking problem and marks the report invalid.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    /// Records a non-blocking problem.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Absorbs all issues from another report.
    pub fn merge(&mut self, other: Self) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// One ranked intent considered during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Human-readable intent name
    pub intent_name: String,
    /// Unique intent identifier
    pub intent_id: String,
    /// Downstream handler this intent routes to
    pub agent: String,
    /// Routing category
    pub category: String,
    /// Combined confidence for this intent
    pub score: f64,
}

/// Output of one classification call.
///
/// Identical `(utterance, snapshot)` inputs always produce an identical
/// decision, except for `processing_time_ms` which is measured wall time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    /// Matched intent name, or `None` for no-match and clarification outcomes
    pub intent_name: Option<String>,
    /// Downstream agent for the matched intent
    pub agent: Option<String>,
    /// Identifier of the matched intent
    pub intent_id: Option<String>,
    /// Category of the matched intent
    pub category: Option<String>,
    /// Confidence of the top candidate, in [0, 1]
    pub confidence: f64,
    /// Whether the caller should ask the user to disambiguate
    pub needs_clarification: bool,
    /// Clarifying question to surface when disambiguation is needed
    pub disambiguation_prompt: Option<String>,
    /// Top-ranked intents considered, for explainability
    pub candidates: Vec<Candidate>,
    /// Wall-clock time spent classifying
    pub processing_time_ms: f64,
}

impl ClassificationDecision {
    /// Creates the no-match decision.
    ///
    /// Absence of any matching intent is a decision, not an error; the
    /// considered candidates are still surfaced for explainability.
    #[must_use]
    pub fn no_match(confidence: f64, candidates: Vec<Candidate>) -> Self {
        Self {
            intent_name: None,
            agent: None,
            intent_id: None,
            category: None,
            confidence,
            needs_clarification: false,
            disambiguation_prompt: None,
            candidates,
            processing_time_ms: 0.0,
        }
    }
}
