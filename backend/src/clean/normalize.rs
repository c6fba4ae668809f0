//! Free-text normalization rules.
//!
//! Rules are applied in configuration order, each one idempotent. Null
//! values are left alone.

use super::{Stage, StageReport};
use crate::config::NormalizeRule;
use crate::error::StageResult;
use crate::models::{Row, RowCollection};

impl NormalizeRule {
    /// Apply this rule to a row. Returns `true` when the value changed.
    pub fn apply(&self, row: &mut Row) -> bool {
        let field = self.field();
        let Some(current) = row.text(field) else {
            return false;
        };

        let replacement = match self {
            NormalizeRule::Trim { .. } => {
                let trimmed = current.trim();
                (trimmed.len() != current.len()).then(|| trimmed.to_string())
            }
            NormalizeRule::CanonicalPrefix { prefix, canonical, .. } => {
                (current.starts_with(prefix.as_str()) && current != canonical.as_str())
                    .then(|| canonical.clone())
            }
            NormalizeRule::TrimTrailing { chars, .. } => {
                let trimmed = current.trim_end_matches(|c: char| chars.contains(c));
                (trimmed.len() != current.len()).then(|| trimmed.to_string())
            }
        };

        match replacement {
            Some(value) => {
                row.set_text(field, value);
                true
            }
            None => false,
        }
    }
}

/// Applies an ordered list of [`NormalizeRule`]s to every row.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<NormalizeRule>,
}

impl Normalizer {
    pub const NAME: &'static str = "normalize";

    pub fn new(rules: Vec<NormalizeRule>) -> Self {
        Self { rules }
    }

    /// Normalize one row; `true` when any rule changed it.
    pub fn normalize_row(&self, row: &mut Row) -> bool {
        self.rules
            .iter()
            .fold(false, |changed, rule| rule.apply(row) | changed)
    }
}

impl Stage for Normalizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, rows: &mut RowCollection) -> StageResult<StageReport> {
        let mut report = StageReport::new(Self::NAME, rows.len());
        report.rows_changed = rows
            .rows_mut()
            .iter_mut()
            .map(|row| self.normalize_row(row))
            .filter(|changed| *changed)
            .count();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use crate::models::fixtures::*;
    use crate::models::TextField;

    fn default_normalizer() -> Normalizer {
        Normalizer::new(CleaningConfig::default().normalize)
    }

    #[test]
    fn test_trim_keeps_internal_whitespace() {
        let mut r = row("  E Inc.  ");
        let rule = NormalizeRule::Trim { field: TextField::Company };
        assert!(rule.apply(&mut r));
        assert_eq!(r.company, "E Inc.");
        assert!(!rule.apply(&mut r));
    }

    #[test]
    fn test_canonical_prefix() {
        let rule = NormalizeRule::CanonicalPrefix {
            field: TextField::Industry,
            prefix: "Crypto".into(),
            canonical: "Crypto".into(),
        };

        let mut r = with_industry(row("Acme"), "Crypto Currency");
        assert!(rule.apply(&mut r));
        assert_eq!(r.industry.as_deref(), Some("Crypto"));

        let mut other = with_industry(row("Acme"), "Fintech");
        assert!(!rule.apply(&mut other));
        assert_eq!(other.industry.as_deref(), Some("Fintech"));

        let mut null = row("Acme");
        assert!(!rule.apply(&mut null));
        assert_eq!(null.industry, None);
    }

    #[test]
    fn test_country_suffixes_collapse() {
        let normalizer = default_normalizer();
        let mut a = row("Acme");
        a.country = "United States.".into();
        let mut b = row("Acme");
        b.country = "United States of America".into();

        normalizer.normalize_row(&mut a);
        normalizer.normalize_row(&mut b);
        assert_eq!(a.country, "United States");
        assert_eq!(b.country, "United States");
    }

    #[test]
    fn test_trim_trailing() {
        let rule = NormalizeRule::TrimTrailing {
            field: TextField::Country,
            chars: ".".into(),
        };
        let mut r = row("Acme");
        r.country = "Germany..".into();
        assert!(rule.apply(&mut r));
        assert_eq!(r.country, "Germany");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = default_normalizer();
        let mut once = RowCollection::from(vec![
            with_industry(row(" Acme "), "CryptoCurrency"),
            with_industry(row("Beta\t"), "Retail"),
            row("Gamma"),
        ]);
        let first = normalizer.apply(&mut once).unwrap();
        assert_eq!(first.rows_changed, 2);

        let mut twice = once.clone();
        let second = normalizer.apply(&mut twice).unwrap();
        assert_eq!(second.rows_changed, 0);
        assert_eq!(once, twice);
    }
}
