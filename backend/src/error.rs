//! Error types for the layoffs cleaning pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`IngestError`] - Raw CSV loading errors (including [`SchemaMismatch`])
//! - [`StageError`] - Failures raised by a cleaning stage
//! - [`ConfigError`] - Invalid or unreadable cleaning configuration
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;
use thiserror::Error;

// =============================================================================
// Ingest Errors
// =============================================================================

/// A raw input row (or the header) does not conform to the nine-field schema.
///
/// Carries as much location context as is known: the 1-based line number,
/// and optionally the offending column and cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMismatch {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl SchemaMismatch {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for SchemaMismatch {}

/// Errors while loading the raw row source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Empty input (not even a header line).
    #[error("CSV input is empty")]
    EmptyFile,

    /// Input does not match the expected schema.
    #[error("Schema mismatch: {0}")]
    Schema(#[from] SchemaMismatch),
}

// =============================================================================
// Stage Errors
// =============================================================================

/// A single date cell that could not be parsed under the configured format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Index of the row in the collection at the time of coercion.
    pub row: usize,
    pub company: String,
    pub value: String,
    pub format: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ({}): '{}' does not match date format '{}'",
            self.row, self.company, self.value, self.format
        )
    }
}

impl std::error::Error for ParseError {}

/// Errors raised by a cleaning stage. A failed stage leaves the collection
/// untouched.
#[derive(Debug, Error)]
pub enum StageError {
    /// One or more date cells failed to parse.
    #[error("{} date value(s) failed to parse; first: {}", .0.len(), first_failure(.0))]
    Parse(Vec<ParseError>),

    /// Strict backfill found conflicting candidate values for one key.
    #[error("Ambiguous backfill for '{key}': candidates {candidates:?}")]
    AmbiguousBackfill { key: String, candidates: Vec<String> },
}

fn first_failure(failures: &[ParseError]) -> String {
    failures
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string())
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or checking a cleaning configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document violates the configuration JSON schema.
    #[error("Config schema violations: {errors:?}")]
    Schema { errors: Vec<String> },

    /// A rule is not applicable to the field it names.
    #[error("Invalid rule for field '{field}': {message}")]
    InvalidRule { field: String, message: String },

    /// An override pattern is not a valid regular expression.
    #[error("Invalid override pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A required setting is empty.
    #[error("Missing setting: {0}")]
    Missing(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::clean::pipeline::clean_file`]
/// and friends.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingest error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A stage failed; the collection was left in its pre-stage state.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: StageError,
    },

    /// IO error while writing results.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export error.
    #[error("Export error: {0}")]
    Export(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // IngestError -> PipelineError
        let ingest_err = IngestError::EmptyFile;
        let pipeline_err: PipelineError = ingest_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SchemaMismatch -> IngestError -> PipelineError
        let schema: IngestError = SchemaMismatch::new(3, "bad cell").into();
        let pipeline_err: PipelineError = schema.into();
        assert!(pipeline_err.to_string().contains("Line 3"));
    }

    #[test]
    fn test_schema_mismatch_format() {
        let err = SchemaMismatch::new(5, "not an integer")
            .with_column("total_laid_off")
            .with_value("abc");

        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'total_laid_off'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_parse_error_summary() {
        let err = StageError::Parse(vec![
            ParseError {
                row: 2,
                company: "Acme".into(),
                value: "2023-03-15".into(),
                format: "%m/%d/%Y".into(),
            },
            ParseError {
                row: 7,
                company: "Beta".into(),
                value: "soon".into(),
                format: "%m/%d/%Y".into(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 date value(s)"));
        assert!(msg.contains("2023-03-15"));
    }

    #[test]
    fn test_stage_error_wrapped_with_stage_name() {
        let err = PipelineError::Stage {
            stage: "backfill",
            source: StageError::AmbiguousBackfill {
                key: "Acme".into(),
                candidates: vec!["Retail".into(), "Tech".into()],
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("backfill"));
        assert!(msg.contains("Acme"));
    }
}
