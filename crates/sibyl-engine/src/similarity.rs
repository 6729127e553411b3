//! Text normalization and similarity metrics shared by the classifier and
//! the validation engine.
//!
//! All metrics are deterministic functions of their inputs; nothing here
//! depends on ambient state.

use std::collections::HashSet;
use strsim::{levenshtein, normalized_levenshtein};

/// Normalizes free text for matching: lowercase, trim, collapse whitespace,
/// and strip punctuation other than intra-word apostrophes.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|character| {
            if character.is_alphanumeric() || character == '\'' || character.is_whitespace() {
                character
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether two normalized strings are equal or within `max_edits` of each
/// other; the high-score "exact" signal of the classifier.
#[must_use]
pub fn is_near_exact(left: &str, right: &str, max_edits: usize) -> bool {
    left == right || levenshtein(left, right) <= max_edits
}

/// Token-overlap (Jaccard) similarity between two normalized strings.
#[must_use]
pub fn token_overlap(left: &str, right: &str) -> f64 {
    let left_tokens: HashSet<&str> = left.split_whitespace().collect();
    let right_tokens: HashSet<&str> = right.split_whitespace().collect();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }
    let intersection = left_tokens.intersection(&right_tokens).count();
    let union = left_tokens.union(&right_tokens).count();
    intersection as f64 / union as f64
}

/// Fuzzy similarity in [0, 1] between two normalized strings: the better of
/// token overlap and edit-distance-derived similarity, so short phrasing
/// variants and word-order changes both register.
#[must_use]
pub fn fuzzy_similarity(left: &str, right: &str) -> f64 {
    token_overlap(left, right).max(normalized_levenshtein(left, right))
}

/// Whether a normalized keyword (possibly multi-word) occurs in a
/// normalized utterance on word boundaries, so "er" never matches "cover".
#[must_use]
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    format!(" {text} ").contains(&format!(" {phrase} "))
}

/// Best fuzzy similarity between an utterance and any phrase in a set.
#[must_use]
pub fn best_similarity(utterance: &str, phrases: &[String]) -> f64 {
    phrases
        .iter()
        .map(|phrase| fuzzy_similarity(utterance, phrase))
        .fold(0.0, f64::max)
}
