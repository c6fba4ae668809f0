//! Exact-duplicate removal keyed on the full nine-field tuple.

use std::collections::HashSet;

use super::{Stage, StageReport};
use crate::error::StageResult;
use crate::models::RowCollection;

/// Keeps the first row of every group of identical rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub const NAME: &'static str = "dedup";
}

/// Remove duplicate rows in place, returning how many were dropped.
///
/// Survivors keep their relative order. Nulls compare equal to nulls.
pub fn dedup(rows: &mut RowCollection) -> usize {
    let before = rows.len();
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(before);
        rows.iter().map(|row| seen.insert(row.key())).collect()
    };

    let mut flags = keep.into_iter();
    rows.rows_mut().retain(|_| flags.next().unwrap_or(true));
    before - rows.len()
}

impl Stage for Deduplicator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport> {
        let mut report = StageReport::new(Self::NAME, rows.len());
        dedup(rows);
        report.rows_after = rows.len();
        Ok(report)
    }
}
