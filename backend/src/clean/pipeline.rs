//! High-level cleaning API.
//!
//! Combines ingest and the five stages:
//! raw CSV → [`RawSource`] → staging copy → dedup → normalize → backfill →
//! prune → coerce → cleaned [`RowCollection`].
//!
//! # Example
//!
//! ```rust,ignore
//! use layoffs::{clean_file, CleaningConfig};
//! use std::path::Path;
//!
//! let result = clean_file(Path::new("layoffs.csv"), None, &CleaningConfig::default())?;
//! println!("{} rows after cleaning", result.rows.len());
//! ```

use serde::Serialize;
use std::path::Path;

use super::{Backfiller, DateCoercer, Deduplicator, Normalizer, Pruner, Stage, StageReport};
use crate::api::logs::{log_info, log_stage, log_success, log_warning, LogEntry};
use crate::config::CleaningConfig;
use crate::error::{ConfigResult, PipelineError, PipelineResult};
use crate::models::{RawSource, RowCollection, SourceInfo};
use crate::parser::{parse_bytes, parse_file};

/// The ordered stage list built from one configuration.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

/// Result of a complete cleaning run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    /// Cleaned rows
    pub rows: RowCollection,

    /// One report per stage, in execution order
    pub stages: Vec<StageReport>,

    /// Where the raw rows came from
    pub source: SourceInfo,
}

impl CleanResult {
    /// Rows in the untouched raw source.
    pub fn raw_count(&self) -> usize {
        self.source.row_count
    }

    /// All warnings raised by any stage.
    pub fn warnings(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|s| s.warnings.iter().map(move |w| format!("{}: {}", s.stage, w)))
            .collect()
    }
}

impl Pipeline {
    pub fn from_config(config: &CleaningConfig) -> ConfigResult<Self> {
        config.check()?;
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Deduplicator),
            Box::new(Normalizer::new(config.normalize.clone())),
            Box::new(Backfiller::from_config(&config.backfill)?),
            Box::new(Pruner::new(config.prune.measures.clone())),
            Box::new(DateCoercer::new(&config.coerce)?),
        ];
        Ok(Self { stages })
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order over `rows`.
    ///
    /// Stops at the first failing stage; that stage has left `rows` as it
    /// found them, earlier stages stay applied.
    pub fn run(&self, rows: &mut RowCollection) -> PipelineResult<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.name();
            let report = stage.apply(rows).map_err(|source| {
                log_stage(LogEntry::error(source.to_string()), name);
                PipelineError::Stage { stage: name, source }
            })?;

            log_stage(LogEntry::success(report.summary()), name);
            for warning in &report.warnings {
                log_stage(LogEntry::warning(warning.clone()), name);
            }
            reports.push(report);
        }

        Ok(reports)
    }

    /// Clean a copy of `raw`; the raw source itself is not modified.
    pub fn clean(&self, raw: &RawSource) -> PipelineResult<CleanResult> {
        let mut rows = raw.staging();
        let stages = self.run(&mut rows)?;
        log_success(format!("{} → {} rows", raw.len(), rows.len()));
        if rows.is_empty() && !raw.is_empty() {
            log_warning("No rows left after cleaning");
        }

        Ok(CleanResult {
            rows,
            stages,
            source: raw.info().clone(),
        })
    }
}

/// Parse and clean a CSV file.
pub fn clean_file(
    path: &Path,
    delimiter: Option<char>,
    config: &CleaningConfig,
) -> PipelineResult<CleanResult> {
    log_info(format!("📖 Reading {}", path.display()));
    let raw = parse_file(path, delimiter, config)?;
    clean_source(&raw, config)
}

/// Parse and clean CSV bytes (e.g. an upload).
pub fn clean_bytes(
    bytes: &[u8],
    name: Option<String>,
    config: &CleaningConfig,
) -> PipelineResult<CleanResult> {
    log_info(format!("📖 Reading {} bytes", bytes.len()));
    let raw = parse_bytes(bytes, None, config, name)?;
    clean_source(&raw, config)
}

/// Clean an already-ingested raw source.
pub fn clean_source(raw: &RawSource, config: &CleaningConfig) -> PipelineResult<CleanResult> {
    let info = raw.info();
    log_success(format!(
        "Detected encoding {}, separator '{}'",
        info.encoding,
        format_delimiter(info.delimiter)
    ));
    log_success(format!("Read {} raw rows", raw.len()));

    let pipeline = Pipeline::from_config(config)?;
    pipeline.clean(raw)
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
