//! The injected persistence backend for the intent registry.

use crate::record::IntentRecord;
use serde::{Deserialize, Serialize};
use sibyl_core::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read/write backend the engine bootstraps from and persists to.
///
/// The engine treats this as an opaque collaborator; durability, file
/// formats, and remote storage all live behind this seam.
pub trait RegistryStore: Send + Sync {
    /// Loads the persisted records.
    ///
    /// # Errors
    /// Returns an error when the backing storage is unreachable or the
    /// payload cannot be decoded.
    fn load(&self) -> Result<Vec<IntentRecord>>;

    /// Persists the given records, replacing the previous contents.
    ///
    /// # Errors
    /// Returns an error when the backing storage cannot be written.
    fn save(&self, records: &[IntentRecord]) -> Result<()>;
}

/// On-disk TOML document shape: a list of `[[intents]]` tables.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    intents: Vec<IntentRecord>,
}

/// File-backed store holding the registry as a TOML document.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    /// Creates a store reading and writing the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default registry file location (`~/.sibyl/intents.toml`).
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        use dirs::home_dir;
        let home = home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".sibyl").join("intents.toml"))
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for TomlFileStore {
    fn load(&self) -> Result<Vec<IntentRecord>> {
        let contents = fs::read_to_string(&self.path).map_err(|error| {
            Error::Store(format!(
                "Failed to read {}: {error}",
                self.path.display()
            ))
        })?;
        let file: RegistryFile = toml::from_str(&contents).map_err(|error| {
            Error::Store(format!(
                "Failed to parse {}: {error}",
                self.path.display()
            ))
        })?;
        Ok(file.intents)
    }

    fn save(&self, records: &[IntentRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Store(format!("Failed to create registry directory: {error}"))
            })?;
        }

        let file = RegistryFile {
            intents: records.to_vec(),
        };
        let contents = toml::to_string_pretty(&file)
            .map_err(|error| Error::Store(format!("Failed to serialize registry: {error}")))?;

        let header = "# Sibyl Intent Registry\n\
                      # Each [[intents]] table is one classification target\n\n";

        fs::write(&self.path, format!("{header}{contents}"))
            .map_err(|error| Error::Store(format!("Failed to write registry: {error}")))?;

        Ok(())
    }
}

/// A small ready-to-use intent set seeding a fresh installation.
#[must_use]
pub fn starter_records() -> Vec<IntentRecord> {
    vec![
        IntentRecord::new(
            "INT-PHR-0001",
            "pharmacy",
            "healthcare",
            "PharmacyAgent",
            "prescription or medication refills",
        )
        .with_utterances(vec![
            "I need to refill my prescription",
            "Where can I get my medications",
            "What pharmacies are in network",
            "How much does my prescription cost",
            "Is my drug covered",
            "I need to find a pharmacy",
        ])
        .with_keywords(vec!["pharmacy", "prescription", "medication", "drug", "refill"])
        .with_priority(2)
        .with_prompt("Are you asking about a prescription refill or finding a pharmacy?"),
        IntentRecord::new(
            "INT-ELG-0013",
            "eligibility",
            "benefits",
            "EligibilityAgent",
            "enrollment or coverage status",
        )
        .with_utterances(vec![
            "Am I covered",
            "Check my eligibility",
            "When does my coverage start",
            "Is my plan active",
            "Verify my insurance",
        ])
        .with_keywords(vec!["eligibility", "coverage", "active", "enrolled", "verify"])
        .with_priority(1)
        .with_prompt("Do you want to check whether your coverage is active?"),
        IntentRecord::new(
            "INT-BEN-0014",
            "benefits",
            "benefits",
            "BenefitsAgent",
            "coverage and benefit information",
        )
        .with_utterances(vec![
            "What are my benefits",
            "Benefits summary",
            "What does my plan cover",
            "Benefit details",
            "Coverage information",
        ])
        .with_keywords(vec!["benefits", "coverage", "covered", "plan", "summary"])
        .with_priority(1)
        .with_prompt("Are you asking what your plan covers?"),
        IntentRecord::new(
            "INT-DED-0015",
            "deductible",
            "benefits",
            "DeductibleAgent",
            "deductible amount or status",
        )
        .with_utterances(vec![
            "What is my deductible",
            "How much deductible have I met",
            "Deductible status",
            "Annual deductible amount",
            "Family deductible",
        ])
        .with_keywords(vec!["deductible", "met", "remaining", "annual"])
        .with_priority(1)
        .with_prompt("Do you want your deductible amount or how much you have met?"),
        IntentRecord::new(
            "INT-CLM-0035",
            "claims",
            "claims",
            "ClaimsAgent",
            "claim status or submission",
        )
        .with_utterances(vec![
            "Check my claim status",
            "Submit a claim",
            "Claim denied",
            "How much do I owe",
            "Claims history",
        ])
        .with_keywords(vec!["claim", "claims", "denied", "status", "submit"])
        .with_priority(1)
        .with_prompt("Are you asking about an existing claim or submitting a new one?"),
        IntentRecord::new(
            "INT-IDC-0036",
            "idCard",
            "claims",
            "IDCardAgent",
            "insurance ID card",
        )
        .with_utterances(vec![
            "I need a new ID card",
            "Order replacement card",
            "Where is my insurance card",
            "Digital ID card",
            "Print my ID card",
        ])
        .with_keywords(vec!["id card", "member card", "insurance card", "replacement"])
        .with_priority(1)
        .with_prompt("Do you need a replacement card or a digital copy?"),
    ]
}
