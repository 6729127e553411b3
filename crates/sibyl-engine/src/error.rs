use sibyl_core::Error as CoreError;
use std::result::Result as StdResult;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = StdResult<T, EngineError>;

/// Errors produced by the registry and classification engine.
///
/// Problems an operator can fix by editing records never appear here; they
/// travel inside a [`sibyl_core::ValidationReport`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Core error: configuration, persistence, serialization.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// `activate_staged` was called with no successfully staged set.
    #[error("Nothing staged for activation")]
    NothingStaged,

    /// The staged set was validated against a registry version that has
    /// since been superseded; the caller must re-stage.
    #[error("Staged set is stale: staged against v{staged_against}, active is v{active}")]
    StaleStage {
        /// Version the staged set was validated against
        staged_against: u64,
        /// Version currently active
        active: u64,
    },
}

impl EngineError {
    /// Whether re-staging the same candidate set may succeed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleStage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_display_names_versions() {
        let error = EngineError::StaleStage {
            staged_against: 3,
            active: 5,
        };
        assert_eq!(
            error.to_string(),
            "Staged set is stale: staged against v3, active is v5"
        );
        assert!(error.is_stale());
    }

    #[test]
    fn test_nothing_staged_is_not_stale() {
        assert!(!EngineError::NothingStaged.is_stale());
    }
}
