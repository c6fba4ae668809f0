//! Export of a cleaned collection.
//!
//! CSV output keeps the nine input headers in canonical order, writes null
//! as an empty cell and structured dates as ISO `YYYY-MM-DD`. An exported
//! file can be ingested again, but cleaning it a second time needs
//! `coerce.format` set to `YYYY-MM-DD`; the default `MM/DD/YYYY` rejects
//! every ISO date with a parse error.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Row, RowCollection, COLUMNS};

/// Output format for cleaned rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Render rows in the given format.
pub fn export(rows: &RowCollection, format: ExportFormat) -> PipelineResult<String> {
    match format {
        ExportFormat::Csv => to_csv(rows),
        ExportFormat::Json => to_json(rows),
    }
}

/// Render rows as CSV text.
pub fn to_csv(rows: &RowCollection) -> PipelineResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(csv_error)?;
    for row in rows {
        writer.write_record(record(row)).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Export(e.to_string()))
}

/// Render rows as a pretty JSON array.
pub fn to_json(rows: &RowCollection) -> PipelineResult<String> {
    serde_json::to_string_pretty(rows).map_err(|e| PipelineError::Export(e.to_string()))
}

fn csv_error(err: csv::Error) -> PipelineError {
    PipelineError::Export(err.to_string())
}

/// Cells in [`COLUMNS`] order.
fn record(row: &Row) -> [String; 9] {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    [
        row.company.clone(),
        row.location.clone(),
        opt(&row.industry),
        opt(&row.total_laid_off),
        opt(&row.percentage_laid_off),
        opt(&row.layoff_date),
        row.stage.clone(),
        row.country.clone(),
        opt(&row.funds_raised_millions),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_bytes;
    use crate::config::CleaningConfig;
    use crate::error::StageError;
    use crate::models::fixtures::*;
    use crate::models::LayoffDate;
    use crate::parser::parse_bytes;
    use chrono::NaiveDate;

    fn cleaned_row() -> Row {
        let mut r = with_industry(with_total(row("Acme, Inc."), 120), "Retail");
        r.percentage_laid_off = Some(0.25);
        r.layoff_date = NaiveDate::from_ymd_opt(2023, 3, 15).map(LayoffDate::Date);
        r
    }

    #[test]
    fn test_csv_layout() {
        let rows = RowCollection::from(vec![cleaned_row(), with_total(row("Beta"), 3)]);
        let csv = to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "\"Acme, Inc.\",SF Bay Area,Retail,120,0.25,2023-03-15,Unknown,United States,"
        );
        assert_eq!(lines[2], "Beta,SF Bay Area,,3,,,Unknown,United States,");
    }

    #[test]
    fn test_exported_csv_can_be_ingested_again() {
        let rows = RowCollection::from(vec![cleaned_row()]);
        let csv = to_csv(&rows).unwrap();

        let source = parse_bytes(csv.as_bytes(), None, &CleaningConfig::default(), None).unwrap();

        let back = &source.rows()[0];
        assert_eq!(back.company, "Acme, Inc.");
        assert_eq!(back.industry.as_deref(), Some("Retail"));
        assert_eq!(back.total_laid_off, Some(120));
        assert_eq!(back.percentage_laid_off, Some(0.25));
        assert_eq!(back.layoff_date, Some(LayoffDate::Text("2023-03-15".into())));
        assert_eq!(back.funds_raised_millions, None);
    }

    #[test]
    fn test_cleaning_an_export_again_needs_iso_format() {
        let rows = RowCollection::from(vec![cleaned_row()]);
        let csv = to_csv(&rows).unwrap();

        let err = clean_bytes(csv.as_bytes(), None, &CleaningConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Stage { stage: "coerce", source: StageError::Parse(_) }
        ));

        let mut config = CleaningConfig::default();
        config.coerce.format = "YYYY-MM-DD".to_string();
        let result = clean_bytes(csv.as_bytes(), None, &config).unwrap();
        assert_eq!(result.rows.rows(), rows.rows());
    }

    #[test]
    fn test_json_export() {
        let rows = RowCollection::from(vec![cleaned_row()]);
        let json = export(&rows, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["company"], "Acme, Inc.");
        assert_eq!(value[0]["date"], "2023-03-15");
        assert!(value[0]["funds_raised_millions"].is_null());
    }

    #[test]
    fn test_empty_collection_has_header_only() {
        let csv = to_csv(&RowCollection::new()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
