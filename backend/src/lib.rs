//! # Layoffs - cleaning pipeline for raw layoff CSV exports
//!
//! Takes a raw layoffs export (company, location, industry, headcount,
//! percentage, date, stage, country, funding) and produces a clean,
//! deduplicated, normalized and typed collection ready for reporting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Clean pipeline  │────▶│ CSV / JSON  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ dedup..coerce    │     │  + reports  │
//! └─────────────┘     └─────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use layoffs::{clean_file, CleaningConfig, Report};
//! use std::path::Path;
//!
//! let result = clean_file(Path::new("layoffs.csv"), None, &CleaningConfig::default())?;
//! let report = Report::build(&result.rows, 5);
//! println!("{} rows, {} laid off", result.rows.len(), report.summary.total_laid_off);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Row, LayoffDate, RowCollection)
//! - [`parser`] - CSV ingest with auto-detection
//! - [`config`] - Cleaning configuration
//! - [`validation`] - JSON schema validation of configuration documents
//! - [`clean`] - Cleaning stages and pipeline
//! - [`export`] - CSV / JSON output
//! - [`report`] - Aggregate reports
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Ingest
pub mod parser;

// Configuration
pub mod config;
pub mod validation;

// Cleaning
pub mod clean;

// Output
pub mod export;
pub mod report;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, IngestError, ParseError, PipelineError, SchemaMismatch, ServerError, StageError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{LayoffDate, MeasureField, RawSource, Row, RowCollection, SourceInfo, TextField};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{
    BackfillConfig, CleaningConfig, CoerceConfig, NormalizeRule, OverrideRule, PruneConfig,
    TiePolicy,
};

pub use validation::{is_valid_cleaning_config, validate_cleaning_config};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use clean::{
    clean_bytes, clean_file, clean_source, Backfiller, CleanResult, DateCoercer, Deduplicator,
    Normalizer, Pipeline, Pruner, Stage, StageReport,
};

// =============================================================================
// Re-exports - Export and reports
// =============================================================================

pub use export::{export, ExportFormat};
pub use report::{Dimension, Report};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CleanResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
