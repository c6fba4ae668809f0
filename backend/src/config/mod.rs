//! Cleaning configuration.
//!
//! Every constant the pipeline relies on (canonicalization rules, backfill
//! target and overrides, measure fields, date format, null markers) lives in
//! a [`CleaningConfig`]. The `Default` value reproduces the built-in rules for
//! the layoffs dataset; a JSON document can override any section.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "normalize": [
//!     { "type": "trim", "field": "company" },
//!     { "type": "canonical_prefix", "field": "industry", "prefix": "Crypto", "canonical": "Crypto" }
//!   ],
//!   "backfill": { "target": "industry", "key": "company", "policy": "first_seen" },
//!   "prune": { "measures": ["total_laid_off", "percentage_laid_off"] },
//!   "coerce": { "format": "MM/DD/YYYY" }
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{MeasureField, TextField};
use crate::validation::validate_cleaning_config;

/// Environment variable naming the default configuration file.
pub const CONFIG_ENV: &str = "LAYOFFS_CONFIG";

/// Complete configuration of one cleaning run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleaningConfig {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Cell values read as null in nullable columns (trimmed, case-insensitive)
    #[serde(default = "default_null_markers")]
    pub null_markers: Vec<String>,

    /// Ordered normalization rules
    #[serde(default = "default_normalize")]
    pub normalize: Vec<NormalizeRule>,

    #[serde(default)]
    pub backfill: BackfillConfig,

    #[serde(default)]
    pub prune: PruneConfig,

    #[serde(default)]
    pub coerce: CoerceConfig,
}

/// A single normalization rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizeRule {
    /// Remove leading and trailing whitespace
    Trim { field: TextField },

    /// Replace the whole value with `canonical` when it starts with `prefix`
    CanonicalPrefix {
        field: TextField,
        prefix: String,
        canonical: String,
    },

    /// Remove a trailing run of any of `chars`
    TrimTrailing { field: TextField, chars: String },
}

impl NormalizeRule {
    pub fn field(&self) -> TextField {
        match self {
            NormalizeRule::Trim { field }
            | NormalizeRule::CanonicalPrefix { field, .. }
            | NormalizeRule::TrimTrailing { field, .. } => *field,
        }
    }
}

/// How to resolve several distinct candidate values for one key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// First non-blank value in collection order wins; conflicts are reported.
    #[default]
    FirstSeen,
    /// Conflicts fail the stage.
    Strict,
}

/// Forces the backfill target to null for matching companies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideRule {
    /// Regular expression matched against the company name
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackfillConfig {
    /// Field to fill when null or blank
    #[serde(default = "default_backfill_target")]
    pub target: TextField,

    /// Field shared by sibling rows
    #[serde(default = "default_backfill_key")]
    pub key: TextField,

    #[serde(default)]
    pub policy: TiePolicy,

    /// Applied after backfill, in order
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            target: default_backfill_target(),
            key: default_backfill_key(),
            policy: TiePolicy::default(),
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneConfig {
    /// A row is dropped when all of these are null
    #[serde(default = "default_measures")]
    pub measures: Vec<MeasureField>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            measures: default_measures(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoerceConfig {
    /// Input date format: chrono pattern (`%m/%d/%Y`) or tokens (`MM/DD/YYYY`)
    #[serde(default = "default_date_format")]
    pub format: String,
}

impl Default for CoerceConfig {
    fn default() -> Self {
        Self {
            format: default_date_format(),
        }
    }
}

impl CoerceConfig {
    /// The configured format as a chrono pattern.
    ///
    /// Patterns containing `%` pass through untouched; otherwise the tokens
    /// `YYYY`, `YY`, `MM` and `DD` are translated.
    pub fn chrono_format(&self) -> String {
        if self.format.contains('%') {
            return self.format.clone();
        }
        self.format
            .replace("YYYY", "%Y")
            .replace("YY", "%y")
            .replace("MM", "%m")
            .replace("DD", "%d")
    }

    /// Anchored regular expression every accepted cell must match: `%Y` is
    /// exactly four digits, `%y` two, `%m`/`%d` one or two. `None` when the
    /// format uses other directives.
    pub fn shape_pattern(&self) -> Option<String> {
        let format = self.chrono_format();
        let mut pattern = String::from("^");
        let mut chars = format.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                continue;
            }
            let piece = match chars.next()? {
                'Y' => r"\d{4}",
                'y' => r"\d{2}",
                'm' | 'd' => r"\d{1,2}",
                _ => return None,
            };
            pattern.push_str(piece);
        }
        pattern.push('$');
        Some(pattern)
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_null_markers() -> Vec<String> {
    vec![String::new(), "NULL".to_string()]
}

fn default_normalize() -> Vec<NormalizeRule> {
    vec![
        NormalizeRule::Trim {
            field: TextField::Company,
        },
        NormalizeRule::CanonicalPrefix {
            field: TextField::Industry,
            prefix: "Crypto".to_string(),
            canonical: "Crypto".to_string(),
        },
        NormalizeRule::CanonicalPrefix {
            field: TextField::Country,
            prefix: "United States".to_string(),
            canonical: "United States".to_string(),
        },
    ]
}

fn default_backfill_target() -> TextField {
    TextField::Industry
}

fn default_backfill_key() -> TextField {
    TextField::Company
}

fn default_measures() -> Vec<MeasureField> {
    vec![MeasureField::TotalLaidOff, MeasureField::PercentageLaidOff]
}

fn default_date_format() -> String {
    "MM/DD/YYYY".to_string()
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            description: "Built-in cleaning rules for the layoffs dataset".to_string(),
            null_markers: default_null_markers(),
            normalize: default_normalize(),
            backfill: BackfillConfig::default(),
            prune: PruneConfig::default(),
            coerce: CoerceConfig::default(),
        }
    }
}

impl CleaningConfig {
    /// Parse a configuration from JSON string, validating it fully
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse a configuration from JSON value, validating it fully
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        validate_cleaning_config(value).map_err(|errors| ConfigError::Schema { errors })?;
        let config: Self = serde_json::from_value(value.clone())?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load from an explicit path, else from `$LAYOFFS_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> ConfigResult<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Semantic checks the JSON schema cannot express.
    pub fn check(&self) -> ConfigResult<()> {
        for rule in &self.normalize {
            match rule {
                NormalizeRule::Trim { .. } => {}
                NormalizeRule::CanonicalPrefix { field, prefix, canonical } => {
                    if prefix.is_empty() || canonical.is_empty() {
                        return Err(ConfigError::InvalidRule {
                            field: field.name().to_string(),
                            message: "prefix and canonical value must not be empty".to_string(),
                        });
                    }
                }
                NormalizeRule::TrimTrailing { field, chars } => {
                    if chars.is_empty() {
                        return Err(ConfigError::InvalidRule {
                            field: field.name().to_string(),
                            message: "chars must not be empty".to_string(),
                        });
                    }
                }
            }
        }

        let backfill = &self.backfill;
        if !backfill.target.is_nullable() {
            return Err(ConfigError::InvalidRule {
                field: backfill.target.name().to_string(),
                message: "backfill target must be a nullable column".to_string(),
            });
        }
        if backfill.key == backfill.target {
            return Err(ConfigError::InvalidRule {
                field: backfill.key.name().to_string(),
                message: "backfill key and target must differ".to_string(),
            });
        }
        for rule in &backfill.overrides {
            Regex::new(&rule.pattern)?;
        }

        if self.prune.measures.is_empty() {
            return Err(ConfigError::Missing("prune.measures".to_string()));
        }
        if self.coerce.format.trim().is_empty() {
            return Err(ConfigError::Missing("coerce.format".to_string()));
        }
        Ok(())
    }

    /// Whether a raw cell counts as null.
    pub fn is_null_marker(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.null_markers
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(cell))
    }
}
