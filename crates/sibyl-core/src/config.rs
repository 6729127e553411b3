//! Configuration types for scoring, decision policy, validation, and ingestion.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete engine configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sub-score weighting for the classifier
    pub scoring: ScoringConfig,
    /// Decision policy thresholds and margins
    pub decision: DecisionConfig,
    /// Validation rule tuning
    pub validation: ValidationConfig,
    /// Bulk ingestion settings
    pub ingest: IngestConfig,
}

/// Weights combining the classifier sub-scores into one confidence.
///
/// The weights are an engine-wide constant, not a property of individual
/// intents, so two intents scoring identically on the sub-scores always
/// receive the same confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the exact/near-exact training utterance match signal
    pub exact_weight: f64,
    /// Weight of the keyword overlap ratio signal
    pub keyword_weight: f64,
    /// Weight of the fuzzy textual similarity signal
    pub fuzzy_weight: f64,
    /// Maximum edit distance still counted as a near-exact match
    pub near_exact_max_edits: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exact_weight: 0.45,
            keyword_weight: 0.15,
            fuzzy_weight: 0.40,
            near_exact_max_edits: 2,
        }
    }
}

/// Decision policy applied to the ranked per-intent confidences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Confidence a top candidate must reach when the intent carries no
    /// per-record threshold
    pub default_confidence_threshold: f64,
    /// Maximum confidence gap within which two candidates count as ambiguous
    pub ambiguity_margin: f64,
    /// Minimum confidence for a candidate to be considered at all
    pub consideration_floor: f64,
    /// Number of ranked candidates surfaced for explainability
    pub max_candidates: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            default_confidence_threshold: 0.75,
            ambiguity_margin: 0.10,
            consideration_floor: 0.25,
            max_candidates: 3,
        }
    }
}

/// Validation rule tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Records with fewer training utterances than this produce a warning
    pub min_training_utterances: usize,
    /// Cross-intent training utterance similarity at or above this floor
    /// warns when the affected record has no disambiguation prompt
    pub similarity_floor: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_training_utterances: 5,
            similarity_floor: 0.80,
        }
    }
}

/// Bulk ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Delimiter splitting list-valued spreadsheet columns
    pub list_delimiter: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            list_delimiter: "|".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Get the default config directory path (`~/.sibyl`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        use dirs::home_dir;
        let home = home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".sibyl"))
    }

    /// Get the default config file path (`~/.sibyl/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location (`~/.sibyl/config.toml`)
    /// If the config doesn't exist, creates it with default values
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        use toml::from_str;
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        from_str(&contents)
            .map_err(|error| Error::Config(format!("Failed to parse config: {error}")))
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        use toml::to_string_pretty;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Sibyl Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Check the configuration for internally inconsistent values
    ///
    /// # Errors
    /// Returns an error naming the offending setting
    pub fn check(&self) -> Result<()> {
        let weight_sum = self.scoring.exact_weight
            + self.scoring.keyword_weight
            + self.scoring.fuzzy_weight;
        if !(0.99..=1.01).contains(&weight_sum) {
            return Err(Error::Config(format!(
                "scoring weights must sum to 1.0, got {weight_sum}"
            )));
        }
        if self.decision.default_confidence_threshold <= 0.0
            || self.decision.default_confidence_threshold > 1.0
        {
            return Err(Error::Config(
                "default_confidence_threshold must be in (0, 1]".to_owned(),
            ));
        }
        if self.decision.consideration_floor >= self.decision.default_confidence_threshold {
            return Err(Error::Config(
                "consideration_floor must be below default_confidence_threshold".to_owned(),
            ));
        }
        if self.ingest.list_delimiter.is_empty() {
            return Err(Error::Config("list_delimiter must be non-empty".to_owned()));
        }
        Ok(())
    }
}
