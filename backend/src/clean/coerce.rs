//! Date coercion: textual `date` cells become structured dates.

use chrono::NaiveDate;
use regex::Regex;

use super::{Stage, StageReport};
use crate::config::CoerceConfig;
use crate::error::{ConfigResult, ParseError, StageError, StageResult};
use crate::models::{LayoffDate, RowCollection};

/// Parses every textual date under one fixed input format.
///
/// All-or-nothing: if any row fails, every failure is returned and no row
/// is converted.
#[derive(Debug, Clone)]
pub struct DateCoercer {
    /// chrono pattern used for parsing
    format: String,
    /// digit widths chrono does not enforce
    shape: Option<Regex>,
    /// format as configured, for error messages
    display_format: String,
}

impl DateCoercer {
    pub const NAME: &'static str = "coerce";

    pub fn new(config: &CoerceConfig) -> ConfigResult<Self> {
        let shape = config
            .shape_pattern()
            .map(|p| Regex::new(&p))
            .transpose()?;
        Ok(Self {
            format: config.chrono_format(),
            shape,
            display_format: config.format.clone(),
        })
    }

    /// Parse one date cell.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if let Some(shape) = &self.shape {
            if !shape.is_match(text) {
                return None;
            }
        }
        NaiveDate::parse_from_str(text, &self.format).ok()
    }
}

impl Stage for DateCoercer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport> {
        let mut report = StageReport::new(Self::NAME, rows.len());

        let mut parsed: Vec<(usize, NaiveDate)> = Vec::new();
        let mut failures: Vec<ParseError> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let Some(LayoffDate::Text(text)) = &row.layoff_date else {
                continue;
            };
            match self.parse(text) {
                Some(date) => parsed.push((idx, date)),
                None => failures.push(ParseError {
                    row: idx,
                    company: row.company.clone(),
                    value: text.clone(),
                    format: self.display_format.clone(),
                }),
            }
        }

        if !failures.is_empty() {
            return Err(StageError::Parse(failures));
        }

        report.rows_changed = parsed.len();
        let slots = rows.rows_mut();
        for (idx, date) in parsed {
            slots[idx].layoff_date = Some(LayoffDate::Date(date));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;

    fn coercer() -> DateCoercer {
        DateCoercer::new(&CoerceConfig::default()).unwrap()
    }

    #[test]
    fn test_parses_month_day_year() {
        let date = coercer().parse("03/15/2023");
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 3, 15));
    }

    #[test]
    fn test_accepts_unpadded_values() {
        assert_eq!(coercer().parse("3/6/2023"), NaiveDate::from_ymd_opt(2023, 3, 6));
    }

    #[test]
    fn test_year_width_enforced() {
        assert_eq!(coercer().parse("03/15/23"), None);
        assert_eq!(coercer().parse("03/15/-2023"), None);
        assert_eq!(coercer().parse("03/15/20231"), None);
        assert_eq!(coercer().parse("003/15/2023"), None);
    }

    #[test]
    fn test_short_and_signed_years_are_parse_errors() {
        let original = RowCollection::from(vec![
            with_date(row("Short"), "03/15/23"),
            with_date(row("Signed"), "03/15/-2023"),
        ]);
        let mut rows = original.clone();

        match coercer().apply(&mut rows) {
            Err(StageError::Parse(failures)) => {
                let values: Vec<&str> = failures.iter().map(|f| f.value.as_str()).collect();
                assert_eq!(values, vec!["03/15/23", "03/15/-2023"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(rows, original);
    }

    #[test]
    fn test_two_digit_year_token() {
        let coercer = DateCoercer::new(&CoerceConfig { format: "MM/DD/YY".into() }).unwrap();
        assert_eq!(coercer.parse("03/15/23"), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(coercer.parse("03/15/2023"), None);
    }

    #[test]
    fn test_wrong_format_is_parse_error() {
        let mut rows = RowCollection::from(vec![with_date(row("Acme"), "2023-03-15")]);
        let err = coercer().apply(&mut rows).unwrap_err();

        match err {
            StageError::Parse(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].value, "2023-03-15");
                assert_eq!(failures[0].format, "MM/DD/YYYY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failure_leaves_collection_untouched() {
        let original = RowCollection::from(vec![
            with_date(row("Good"), "01/02/2022"),
            with_date(row("Bad"), "yesterday"),
            with_date(row("Also bad"), "13/40/2022"),
        ]);
        let mut rows = original.clone();

        match coercer().apply(&mut rows) {
            Err(StageError::Parse(failures)) => {
                let bad: Vec<&str> = failures.iter().map(|f| f.company.as_str()).collect();
                assert_eq!(bad, vec!["Bad", "Also bad"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(rows, original);
    }

    #[test]
    fn test_nulls_and_dates_untouched() {
        let done = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();
        let mut coerced = row("Done");
        coerced.layoff_date = Some(LayoffDate::Date(done));

        let mut rows = RowCollection::from(vec![
            row("Null"),
            coerced,
            with_date(row("Text"), "12/31/2022"),
        ]);
        let report = coercer().apply(&mut rows).unwrap();

        assert_eq!(report.rows_changed, 1);
        assert_eq!(rows.rows()[0].layoff_date, None);
        assert_eq!(rows.rows()[1].date(), Some(done));
        assert_eq!(rows.rows()[2].date(), NaiveDate::from_ymd_opt(2022, 12, 31));
    }

    #[test]
    fn test_idempotent() {
        let mut rows = RowCollection::from(vec![with_date(row("Acme"), "12/31/2022")]);
        coercer().apply(&mut rows).unwrap();
        let snapshot = rows.clone();
        let report = coercer().apply(&mut rows).unwrap();
        assert_eq!(report.rows_changed, 0);
        assert_eq!(rows, snapshot);
    }

    #[test]
    fn test_chrono_pattern_config() {
        let coercer = DateCoercer::new(&CoerceConfig { format: "%Y-%m-%d".into() }).unwrap();
        assert_eq!(coercer.parse("2023-03-15"), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(coercer.parse("03/15/2023"), None);
    }
}
