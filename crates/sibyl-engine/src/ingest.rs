//! Normalization of externally-parsed tabular input into candidate records.
//!
//! The spreadsheet parser itself is an external collaborator; by the time
//! rows arrive here they are already reduced to typed cells. This module
//! owns the coercion of those cells into strictly-typed [`IntentRecord`]s,
//! with per-row, per-field structural errors for anything that does not fit.

use crate::record::IntentRecord;
use sibyl_core::config::IngestConfig;
use sibyl_core::{ValidationIssue, ValidationReport};
use std::collections::HashMap;

/// Column names recognized in bulk uploads.
pub mod columns {
    /// Unique identifier column.
    pub const INTENT_ID: &str = "intent_id";
    /// Human-readable name column.
    pub const INTENT_NAME: &str = "intent_name";
    /// Routing category column.
    pub const CATEGORY: &str = "category";
    /// Downstream handler column.
    pub const AGENT_ROUTING: &str = "agent_routing";
    /// Tie-break priority column.
    pub const PRIORITY: &str = "priority";
    /// Operator-facing description column.
    pub const DESCRIPTION_SHORT: &str = "description_short";
    /// Delimited list of training utterances.
    pub const TRAINING_UTTERANCES: &str = "training_utterances";
    /// Delimited list of keywords.
    pub const KEYWORDS: &str = "keywords";
    /// Clarifying question column.
    pub const DISAMBIGUATION_PROMPT: &str = "disambiguation_prompt";
    /// Per-intent threshold column.
    pub const CONFIDENCE_THRESHOLD: &str = "confidence_threshold";
}

/// One typed spreadsheet cell, as produced by the external parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A textual cell.
    Text(String),
    /// An integer cell.
    Int(i64),
    /// A floating-point cell.
    Float(f64),
    /// An empty cell.
    Empty,
}

impl Cell {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Empty => "empty",
        }
    }
}

/// One row of typed cells, keyed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    /// Zero-based position of the row in the uploaded sheet, used to
    /// attribute structural errors.
    pub index: usize,
    cells: HashMap<String, Cell>,
}

impl Row {
    /// Creates an empty row at the given sheet position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            cells: HashMap::new(),
        }
    }

    /// Adds a cell under a column name.
    #[must_use]
    pub fn with_cell(mut self, column: impl Into<String>, cell: Cell) -> Self {
        self.cells.insert(column.into(), cell);
        self
    }

    /// Convenience for text cells.
    #[must_use]
    pub fn with_text(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_cell(column, Cell::Text(value.into()))
    }

    fn cell(&self, column: &str) -> Option<&Cell> {
        let cell = self.cells.get(column)?;
        if matches!(cell, Cell::Empty) {
            None
        } else {
            Some(cell)
        }
    }
}

/// Turns rows of typed cells into candidate intent records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: IngestConfig,
}

impl Normalizer {
    /// Creates a normalizer with the given ingestion settings.
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Normalizes a full bulk upload.
    ///
    /// Any structural error on any row fails the whole call: the returned
    /// record list is empty and the report carries every per-row problem,
    /// so nothing half-coerced can reach validation or staging.
    #[must_use]
    pub fn normalize_rows(&self, rows: &[Row]) -> (Vec<IntentRecord>, ValidationReport) {
        let mut report = ValidationReport::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            match self.normalize_row(row) {
                Ok(record) => records.push(record),
                Err(issues) => {
                    for issue in issues {
                        report.push_error(issue);
                    }
                }
            }
        }

        if report.valid {
            (records, report)
        } else {
            (Vec::new(), report)
        }
    }

    fn normalize_row(&self, row: &Row) -> Result<IntentRecord, Vec<ValidationIssue>> {
        let mut errors = Vec::new();
        let row_id = match row.cell(columns::INTENT_ID) {
            Some(Cell::Text(value)) => Some(value.trim().to_owned()),
            _ => None,
        };

        let mut text_field = |column: &'static str, required: bool| -> Option<String> {
            match row.cell(column) {
                Some(Cell::Text(value)) => Some(value.trim().to_owned()),
                Some(other) => {
                    errors.push(Self::row_issue(
                        row,
                        row_id.clone(),
                        column,
                        format!("expected text, got {}", other.type_name()),
                    ));
                    None
                }
                None => {
                    if required {
                        errors.push(Self::row_issue(
                            row,
                            row_id.clone(),
                            column,
                            "missing required column",
                        ));
                    }
                    None
                }
            }
        };

        let intent_id = text_field(columns::INTENT_ID, true);
        let intent_name = text_field(columns::INTENT_NAME, true);
        let category = text_field(columns::CATEGORY, true);
        let agent_routing = text_field(columns::AGENT_ROUTING, true);
        let description_short = text_field(columns::DESCRIPTION_SHORT, true);
        let utterances_raw = text_field(columns::TRAINING_UTTERANCES, true);
        let keywords_raw = text_field(columns::KEYWORDS, false);
        let prompt = text_field(columns::DISAMBIGUATION_PROMPT, false)
            .filter(|value| !value.is_empty());

        let priority = Self::coerce_priority(row, &row_id, &mut errors);
        let threshold = Self::coerce_threshold(row, &row_id, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let (
            Some(intent_id),
            Some(intent_name),
            Some(category),
            Some(agent_routing),
            Some(description_short),
            Some(utterances_raw),
        ) = (
            intent_id,
            intent_name,
            category,
            agent_routing,
            description_short,
            utterances_raw,
        ) else {
            return Err(errors);
        };

        let mut record = IntentRecord::new(
            intent_id,
            intent_name,
            category,
            agent_routing,
            description_short,
        )
        .with_utterances(self.split_list(&utterances_raw));
        record.keywords = keywords_raw
            .map(|raw| self.split_list(&raw))
            .unwrap_or_default();
        record.disambiguation_prompt = prompt;
        record.confidence_threshold = threshold;
        if let Some(priority) = priority {
            record.priority = priority;
        }
        Ok(record)
    }

    fn coerce_priority(
        row: &Row,
        row_id: &Option<String>,
        errors: &mut Vec<ValidationIssue>,
    ) -> Option<u8> {
        match row.cell(columns::PRIORITY) {
            Some(Cell::Int(value)) => u8::try_from(*value).ok().or_else(|| {
                errors.push(Self::row_issue(
                    row,
                    row_id.clone(),
                    columns::PRIORITY,
                    format!("value {value} is out of range"),
                ));
                None
            }),
            Some(Cell::Text(value)) => match value.trim().parse::<u8>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    errors.push(Self::row_issue(
                        row,
                        row_id.clone(),
                        columns::PRIORITY,
                        format!("'{value}' is not an integer"),
                    ));
                    None
                }
            },
            Some(other) => {
                errors.push(Self::row_issue(
                    row,
                    row_id.clone(),
                    columns::PRIORITY,
                    format!("expected an integer, got {}", other.type_name()),
                ));
                None
            }
            None => None,
        }
    }

    fn coerce_threshold(
        row: &Row,
        row_id: &Option<String>,
        errors: &mut Vec<ValidationIssue>,
    ) -> Option<f64> {
        match row.cell(columns::CONFIDENCE_THRESHOLD) {
            Some(Cell::Float(value)) => Some(*value),
            Some(Cell::Int(value)) => Some(*value as f64),
            Some(Cell::Text(value)) => match value.trim().parse::<f64>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    errors.push(Self::row_issue(
                        row,
                        row_id.clone(),
                        columns::CONFIDENCE_THRESHOLD,
                        format!("'{value}' is not a number"),
                    ));
                    None
                }
            },
            Some(other) => {
                errors.push(Self::row_issue(
                    row,
                    row_id.clone(),
                    columns::CONFIDENCE_THRESHOLD,
                    format!("expected a number, got {}", other.type_name()),
                ));
                None
            }
            None => None,
        }
    }

    fn split_list(&self, raw: &str) -> Vec<String> {
        raw.split(self.config.list_delimiter.as_str())
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    fn row_issue(
        row: &Row,
        row_id: Option<String>,
        column: &'static str,
        message: impl Into<String>,
    ) -> ValidationIssue {
        ValidationIssue {
            intent_id: row_id,
            field: Some(column.to_owned()),
            message: format!("row {}: {}", row.index, message.into()),
        }
    }
}
