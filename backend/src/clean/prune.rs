//! Removal of rows that carry no measure at all.

use super::{Stage, StageReport};
use crate::error::StageResult;
use crate::models::{MeasureField, RowCollection};

/// Drops every row whose configured measures are all null.
#[derive(Debug, Clone)]
pub struct Pruner {
    measures: Vec<MeasureField>,
}

impl Pruner {
    pub const NAME: &'static str = "prune";

    pub fn new(measures: Vec<MeasureField>) -> Self {
        Self { measures }
    }
}

impl Stage for Pruner {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport> {
        let mut report = StageReport::new(Self::NAME, rows.len());
        let measures = &self.measures;
        rows.rows_mut()
            .retain(|row| measures.iter().any(|m| row.has_measure(*m)));
        report.rows_after = rows.len();
        Ok(report)
    }
}
