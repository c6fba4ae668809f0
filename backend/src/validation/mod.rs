//! JSON Schema validation for cleaning configuration documents.
//!
//! The schema is embedded at compile time from
//! `schemas/cleaning-config.json` and checked with JSON Schema Draft 7.
//! It catches structural mistakes (unknown rule types, misspelled fields,
//! wrong value types) before the document is deserialized; semantic checks
//! live in [`crate::config::CleaningConfig::check`].
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use layoffs::validation::validate_cleaning_config;
//!
//! let config = json!({ "prune": { "measures": ["total_laid_off"] } });
//! assert!(validate_cleaning_config(&config).is_ok());
//!
//! let bad = json!({ "prune": { "measures": ["headcount"] } });
//! assert!(validate_cleaning_config(&bad).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static CONFIG_SCHEMA: Lazy<Result<Value, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/cleaning-config.json"))
        .map_err(|e| format!("Invalid embedded schema: {}", e))
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Simple true/false variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a cleaning configuration document.
pub fn validate_cleaning_config(data: &Value) -> Result<(), Vec<String>> {
    match CONFIG_SCHEMA.as_ref() {
        Ok(schema) => validate(schema, data),
        Err(e) => Err(vec![e.clone()]),
    }
}

/// Quick check against the configuration schema.
pub fn is_valid_cleaning_config(data: &Value) -> bool {
    validate_cleaning_config(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use serde_json::json;

    #[test]
    fn test_default_config_matches_schema() {
        let value = serde_json::to_value(CleaningConfig::default()).unwrap();
        assert!(is_valid_cleaning_config(&value));
    }

    #[test]
    fn test_empty_document_is_valid() {
        assert!(is_valid_cleaning_config(&json!({})));
    }

    #[test]
    fn test_unknown_top_level_key() {
        let result = validate_cleaning_config(&json!({ "dedupe": true }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_measure() {
        let config = json!({ "prune": { "measures": ["headcount"] } });
        assert!(!is_valid_cleaning_config(&config));
    }

    #[test]
    fn test_prefix_rule_requires_canonical() {
        let config = json!({
            "normalize": [
                { "type": "canonical_prefix", "field": "country", "prefix": "United States" }
            ]
        });
        let errors = validate_cleaning_config(&config).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_trim_trailing_rule_accepted() {
        let config = json!({
            "normalize": [
                { "type": "trim_trailing", "field": "country", "chars": "." }
            ]
        });
        assert!(is_valid_cleaning_config(&config));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(!is_valid(&schema, &json!({ "age": 42 })));
    }
}
