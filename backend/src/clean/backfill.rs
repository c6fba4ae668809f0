//! Null back-fill of a categorical field from rows sharing a key.
//!
//! Works as a lookup-table pass: first collect, per key, the distinct
//! non-blank values present before the stage, then fill every null or blank
//! target from that table. Values filled in this pass are never used as
//! candidates, so nothing propagates transitively.

use regex::Regex;
use std::collections::HashMap;

use super::{Stage, StageReport};
use crate::config::{BackfillConfig, TiePolicy};
use crate::error::{ConfigError, ConfigResult, StageError, StageResult};
use crate::models::{RowCollection, TextField};

#[derive(Debug, Clone)]
pub struct Backfiller {
    target: TextField,
    key: TextField,
    policy: TiePolicy,
    overrides: Vec<Regex>,
}

impl Backfiller {
    pub const NAME: &'static str = "backfill";

    pub fn from_config(config: &BackfillConfig) -> ConfigResult<Self> {
        if !config.target.is_nullable() {
            return Err(ConfigError::InvalidRule {
                field: config.target.name().to_string(),
                message: "backfill target must be a nullable column".to_string(),
            });
        }
        let overrides = config
            .overrides
            .iter()
            .map(|o| Regex::new(&o.pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target: config.target,
            key: config.key,
            policy: config.policy,
            overrides,
        })
    }

    /// Distinct non-blank target values per key, in first-seen order.
    fn candidates(&self, rows: &RowCollection) -> HashMap<String, Vec<String>> {
        let mut table: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (Some(key), Some(value)) = (row.text(self.key), row.text(self.target)) else {
                continue;
            };
            if is_blank(Some(value)) {
                continue;
            }
            let values = table.entry(key.to_string()).or_default();
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
        table
    }

    fn is_overridden(&self, company: &str) -> bool {
        self.overrides.iter().any(|re| re.is_match(company))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl Stage for Backfiller {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport> {
        let mut report = StageReport::new(Self::NAME, rows.len());
        let table = self.candidates(rows);

        // Decide every change before touching the collection
        let mut updates: Vec<(usize, Option<String>)> = Vec::new();
        let mut conflicted: Vec<&str> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let current = row.text(self.target);
            let key = row.text(self.key).unwrap_or_default();

            let mut value = current.map(String::from);
            if is_blank(current) {
                match table.get(key) {
                    Some(values) if values.len() > 1 && self.policy == TiePolicy::Strict => {
                        return Err(StageError::AmbiguousBackfill {
                            key: key.to_string(),
                            candidates: values.clone(),
                        });
                    }
                    Some(values) => {
                        if values.len() > 1 && !conflicted.contains(&key) {
                            conflicted.push(key);
                        }
                        value = values.first().cloned();
                    }
                    None => value = None,
                }
            }
            if self.is_overridden(&row.company) {
                value = None;
            }

            if value.as_deref() != current {
                updates.push((idx, value));
            }
        }

        for key in conflicted {
            if let Some(values) = table.get(key) {
                report.warnings.push(format!(
                    "'{}' has conflicting {} values {:?}; used '{}'",
                    key,
                    self.target.name(),
                    values,
                    values[0]
                ));
            }
        }

        report.rows_changed = updates.len();
        let target = self.target;
        let slots = rows.rows_mut();
        for (idx, value) in updates {
            let row = &mut slots[idx];
            match value {
                Some(v) => row.set_text(target, v),
                None => {
                    row.clear_text(target);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverrideRule;
    use crate::models::fixtures::*;

    fn backfiller(policy: TiePolicy, overrides: &[&str]) -> Backfiller {
        Backfiller::from_config(&BackfillConfig {
            policy,
            overrides: overrides
                .iter()
                .map(|p| OverrideRule { pattern: p.to_string() })
                .collect(),
            ..BackfillConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fills_from_sibling_row() {
        let mut rows = RowCollection::from(vec![
            row("Acme"),
            with_industry(row("Acme"), "Tech"),
            row("Other"),
        ]);
        let report = backfiller(TiePolicy::FirstSeen, &[]).apply(&mut rows).unwrap();

        assert_eq!(rows.rows()[0].industry.as_deref(), Some("Tech"));
        assert_eq!(rows.rows()[2].industry, None);
        assert_eq!(report.rows_changed, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_blank_is_treated_as_null() {
        let mut rows = RowCollection::from(vec![
            with_industry(row("Airbnb"), ""),
            with_industry(row("Airbnb"), "Travel"),
            with_industry(row("Lonely"), "  "),
        ]);
        backfiller(TiePolicy::FirstSeen, &[]).apply(&mut rows).unwrap();

        assert_eq!(rows.rows()[0].industry.as_deref(), Some("Travel"));
        // Blank without candidate becomes null
        assert_eq!(rows.rows()[2].industry, None);
    }

    #[test]
    fn test_first_seen_conflict_is_reported() {
        let mut rows = RowCollection::from(vec![
            with_industry(row("Acme"), "Retail"),
            row("Acme"),
            with_industry(row("Acme"), "Tech"),
        ]);
        let report = backfiller(TiePolicy::FirstSeen, &[]).apply(&mut rows).unwrap();

        assert_eq!(rows.rows()[1].industry.as_deref(), Some("Retail"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Acme"));
    }

    #[test]
    fn test_strict_conflict_fails_without_changes() {
        let original = RowCollection::from(vec![
            with_industry(row("Acme"), "Retail"),
            row("Acme"),
            with_industry(row("Acme"), "Tech"),
            row("Beta"),
            with_industry(row("Beta"), "Food"),
        ]);
        let mut rows = original.clone();
        let err = backfiller(TiePolicy::Strict, &[]).apply(&mut rows).unwrap_err();

        match err {
            StageError::AmbiguousBackfill { key, candidates } => {
                assert_eq!(key, "Acme");
                assert_eq!(candidates, vec!["Retail".to_string(), "Tech".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(rows, original);
    }

    #[test]
    fn test_strict_ignores_conflicts_nobody_needs() {
        let mut rows = RowCollection::from(vec![
            with_industry(row("Acme"), "Retail"),
            with_industry(row("Acme"), "Tech"),
        ]);
        assert!(backfiller(TiePolicy::Strict, &[]).apply(&mut rows).is_ok());
    }

    #[test]
    fn test_single_pass_no_propagation() {
        // Filled values never become candidates within the same pass
        let mut rows = RowCollection::from(vec![row("Acme"), row("Acme")]);
        let report = backfiller(TiePolicy::FirstSeen, &[]).apply(&mut rows).unwrap();
        assert_eq!(report.rows_changed, 0);
        assert!(rows.iter().all(|r| r.industry.is_none()));
    }

    #[test]
    fn test_override_forces_null() {
        let mut rows = RowCollection::from(vec![
            row("Bally's Interactive"),
            with_industry(row("Bally's Interactive"), "Gaming"),
            with_industry(row("Acme"), "Tech"),
        ]);
        let report = backfiller(TiePolicy::FirstSeen, &["^Bally"])
            .apply(&mut rows)
            .unwrap();

        assert_eq!(rows.rows()[0].industry, None);
        assert_eq!(rows.rows()[1].industry, None);
        assert_eq!(rows.rows()[2].industry.as_deref(), Some("Tech"));
        assert_eq!(report.rows_changed, 1);
    }

    #[test]
    fn test_override_matches_company_whatever_the_key() {
        let by_location = Backfiller::from_config(&BackfillConfig {
            key: TextField::Location,
            overrides: vec![OverrideRule { pattern: "^Bally".into() }],
            ..BackfillConfig::default()
        })
        .unwrap();

        let mut bally = with_industry(row("Bally's Interactive"), "Gaming");
        bally.location = "Providence".into();
        let mut neighbour = with_industry(row("Acme"), "Tech");
        neighbour.location = "Bally Town".into();

        let mut rows = RowCollection::from(vec![bally, neighbour]);
        let report = by_location.apply(&mut rows).unwrap();

        assert_eq!(rows.rows()[0].industry, None);
        assert_eq!(rows.rows()[1].industry.as_deref(), Some("Tech"));
        assert_eq!(report.rows_changed, 1);
    }

    #[test]
    fn test_non_nullable_target_rejected() {
        let config = BackfillConfig {
            target: TextField::Country,
            ..BackfillConfig::default()
        };
        assert!(Backfiller::from_config(&config).is_err());
    }
}
