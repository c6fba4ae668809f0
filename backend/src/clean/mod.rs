//! Cleaning stages.
//!
//! Each stage takes the owned [`RowCollection`] by `&mut` and either commits
//! its whole effect or fails leaving the collection untouched:
//!
//! ```text
//! ┌────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌────────┐   ┌────────┐
//! │ Ingest │──▶│   Dedup   │──▶│ Normalize │──▶│ Backfill │──▶│ Prune  │──▶│ Coerce │
//! │ (copy) │   │ (9-tuple) │   │ (rules)   │   │ (lookup) │   │(measur)│   │ (date) │
//! └────────┘   └───────────┘   └───────────┘   └──────────┘   └────────┘   └────────┘
//! ```
//!
//! - `dedup`: one representative per identical nine-field tuple
//! - `normalize`: trim / canonical-prefix / trailing-char rules
//! - `backfill`: fill null categorical values from rows sharing a key
//! - `prune`: drop rows with every measure null
//! - `coerce`: parse date text into structured dates
//! - `pipeline`: runs the stages in order

pub mod backfill;
pub mod coerce;
pub mod dedup;
pub mod normalize;
pub mod pipeline;
pub mod prune;

use serde::Serialize;

use crate::error::StageResult;
use crate::models::RowCollection;

pub use backfill::Backfiller;
pub use coerce::DateCoercer;
pub use dedup::Deduplicator;
pub use normalize::Normalizer;
pub use pipeline::*;
pub use prune::Pruner;

/// What a stage did to the collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: &'static str,
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows modified in place (removed rows are not counted here)
    pub rows_changed: usize,
    pub warnings: Vec<String>,
}

impl StageReport {
    pub fn new(stage: &'static str, rows_before: usize) -> Self {
        Self {
            stage,
            rows_before,
            rows_after: rows_before,
            rows_changed: 0,
            warnings: Vec::new(),
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} → {} rows ({} removed, {} changed)",
            self.stage,
            self.rows_before,
            self.rows_after,
            self.rows_removed(),
            self.rows_changed
        )
    }
}

/// One step of the cleaning pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply the stage. On error the collection must be unchanged.
    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport>;
}
