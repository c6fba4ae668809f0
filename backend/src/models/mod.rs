//! Domain models for the layoffs cleaning pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Row`] - One layoff event (the fixed nine-field tuple)
//! - [`LayoffDate`] - Raw date text or a structured date
//! - [`TextField`] / [`MeasureField`] - Field names usable in configuration
//! - [`RawSource`] - The immutable ingested rows (audit trail)
//! - [`RowCollection`] - The owned working set mutated by each stage

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the nine-field schema, in canonical order.
pub const COLUMNS: [&str; 9] = [
    "company",
    "location",
    "industry",
    "total_laid_off",
    "percentage_laid_off",
    "date",
    "stage",
    "country",
    "funds_raised_millions",
];

// =============================================================================
// Layoff Date
// =============================================================================

/// The `date` column: free text as ingested, or a structured date once coerced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum LayoffDate {
    /// Parsed calendar date.
    Date(NaiveDate),
    /// Text as found in the raw source.
    Text(String),
}

impl LayoffDate {
    /// Get the structured date if coerced.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            LayoffDate::Date(d) => Some(*d),
            LayoffDate::Text(_) => None,
        }
    }
}

impl fmt::Display for LayoffDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoffDate::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            LayoffDate::Text(t) => f.write_str(t),
        }
    }
}

// =============================================================================
// Field names
// =============================================================================

/// Textual columns that normalization and backfill rules can target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Company,
    Location,
    Industry,
    Stage,
    Country,
}

impl TextField {
    pub fn name(self) -> &'static str {
        match self {
            TextField::Company => "company",
            TextField::Location => "location",
            TextField::Industry => "industry",
            TextField::Stage => "stage",
            TextField::Country => "country",
        }
    }

    /// Whether the column admits null.
    pub fn is_nullable(self) -> bool {
        matches!(self, TextField::Industry)
    }
}

/// Numeric columns whose presence decides whether a row is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MeasureField {
    TotalLaidOff,
    PercentageLaidOff,
    FundsRaisedMillions,
}

impl MeasureField {
    pub fn name(self) -> &'static str {
        match self {
            MeasureField::TotalLaidOff => "total_laid_off",
            MeasureField::PercentageLaidOff => "percentage_laid_off",
            MeasureField::FundsRaisedMillions => "funds_raised_millions",
        }
    }
}

// =============================================================================
// Row
// =============================================================================

/// One layoff event. Rows carry no identity key: two rows are the same row
/// when all nine fields are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_laid_off: Option<f64>,
    #[serde(rename = "date")]
    pub layoff_date: Option<LayoffDate>,
    pub stage: String,
    pub country: String,
    pub funds_raised_millions: Option<f64>,
}

/// Hashable view of a [`Row`] covering all nine fields.
///
/// Floats are keyed by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RowKey<'a> {
    company: &'a str,
    location: &'a str,
    industry: Option<&'a str>,
    total_laid_off: Option<i64>,
    percentage_laid_off: Option<u64>,
    layoff_date: Option<&'a LayoffDate>,
    stage: &'a str,
    country: &'a str,
    funds_raised_millions: Option<u64>,
}

fn float_key(value: Option<f64>) -> Option<u64> {
    value.map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
}

impl Row {
    /// Key covering the full value tuple, with null-equals-null semantics.
    pub fn key(&self) -> RowKey<'_> {
        RowKey {
            company: &self.company,
            location: &self.location,
            industry: self.industry.as_deref(),
            total_laid_off: self.total_laid_off,
            percentage_laid_off: float_key(self.percentage_laid_off),
            layoff_date: self.layoff_date.as_ref(),
            stage: &self.stage,
            country: &self.country,
            funds_raised_millions: float_key(self.funds_raised_millions),
        }
    }

    /// Read a textual field; `None` only for a null nullable field.
    pub fn text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Company => Some(&self.company),
            TextField::Location => Some(&self.location),
            TextField::Industry => self.industry.as_deref(),
            TextField::Stage => Some(&self.stage),
            TextField::Country => Some(&self.country),
        }
    }

    /// Overwrite a textual field.
    pub fn set_text(&mut self, field: TextField, value: String) {
        match field {
            TextField::Company => self.company = value,
            TextField::Location => self.location = value,
            TextField::Industry => self.industry = Some(value),
            TextField::Stage => self.stage = value,
            TextField::Country => self.country = value,
        }
    }

    /// Set a nullable textual field to null. Returns `false` (and changes
    /// nothing) when the field is not nullable.
    pub fn clear_text(&mut self, field: TextField) -> bool {
        match field {
            TextField::Industry => {
                self.industry = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a measure field is present.
    pub fn has_measure(&self, field: MeasureField) -> bool {
        match field {
            MeasureField::TotalLaidOff => self.total_laid_off.is_some(),
            MeasureField::PercentageLaidOff => self.percentage_laid_off.is_some(),
            MeasureField::FundsRaisedMillions => self.funds_raised_millions.is_some(),
        }
    }

    /// Structured layoff date, if the row has been coerced.
    pub fn date(&self) -> Option<NaiveDate> {
        self.layoff_date.as_ref().and_then(LayoffDate::as_date)
    }
}

// =============================================================================
// Raw source and working collection
// =============================================================================

/// Metadata about where a raw source came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceInfo {
    /// File name or upload name, when known.
    pub name: Option<String>,
    pub encoding: String,
    pub delimiter: char,
    /// Header cells in file order.
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Rows exactly as ingested. Never mutated; cleaning works on a
/// [`RowCollection`] copied from it.
#[derive(Debug, Clone)]
pub struct RawSource {
    rows: Vec<Row>,
    info: SourceInfo,
}

impl RawSource {
    pub fn new(rows: Vec<Row>, info: SourceInfo) -> Self {
        Self { rows, info }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bulk-copy the raw rows into a fresh working collection.
    pub fn staging(&self) -> RowCollection {
        RowCollection::from(self.rows.clone())
    }
}

/// The working set of rows being cleaned. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowCollection {
    rows: Vec<Row>,
}

impl RowCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Replace the whole content in one step.
    pub(crate) fn commit(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }
}

impl From<Vec<Row>> for RowCollection {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl<'a> IntoIterator for &'a RowCollection {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Row with every optional field empty; tests fill in what they need.
    pub fn row(company: &str) -> Row {
        Row {
            company: company.to_string(),
            location: "SF Bay Area".to_string(),
            industry: None,
            total_laid_off: None,
            percentage_laid_off: None,
            layoff_date: None,
            stage: "Unknown".to_string(),
            country: "United States".to_string(),
            funds_raised_millions: None,
        }
    }

    pub fn with_industry(mut row: Row, industry: &str) -> Row {
        row.industry = Some(industry.to_string());
        row
    }

    pub fn with_total(mut row: Row, total: i64) -> Row {
        row.total_laid_off = Some(total);
        row
    }

    pub fn with_date(mut row: Row, text: &str) -> Row {
        row.layoff_date = Some(LayoffDate::Text(text.to_string()));
        row
    }
}
