//! REST API types for the cleaning endpoint.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::clean::{CleanResult, StageReport};
use crate::models::Row;
use crate::report::Report;

/// Response sent after a CSV upload has been cleaned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    /// Cleaned rows
    pub rows: Vec<Row>,

    /// Stage-by-stage reports
    pub stages: Vec<StageReport>,

    /// Aggregates over the cleaned rows
    pub report: Report,

    /// Metadata about the upload
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub file_name: Option<String>,
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub csv_info: CsvMetadata,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub columns: Vec<String>,
}

impl CleanResponse {
    pub fn new(result: CleanResult, top_n: usize) -> Self {
        let report = Report::build(&result.rows, top_n);
        let has_warnings = result.stages.iter().any(|s| !s.warnings.is_empty());
        let source = result.source;

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if has_warnings { "warning" } else { "ready" }.to_string(),
            metadata: ResponseMetadata {
                file_name: source.name,
                raw_rows: source.row_count,
                clean_rows: result.rows.len(),
                csv_info: CsvMetadata {
                    encoding: source.encoding,
                    delimiter: source.delimiter.to_string(),
                    columns: source.headers,
                },
            },
            rows: result.rows.into_rows(),
            stages: result.stages,
            report,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
        "stages": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_bytes;
    use crate::config::CleaningConfig;

    const CSV: &str = "company,location,industry,total_laid_off,percentage_laid_off,date,stage,country,funds_raised_millions\n\
        Acme,Paris,Retail,10,,01/05/2023,Seed,France,\n\
        Acme,Paris,,5,,02/05/2023,Seed,France,";

    #[test]
    fn test_response_from_result() {
        let result = clean_bytes(CSV.as_bytes(), Some("up.csv".into()), &CleaningConfig::default()).unwrap();
        let response = CleanResponse::new(result, 3);

        assert_eq!(response.status, "ready");
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.stages.len(), 5);
        assert_eq!(response.metadata.raw_rows, 2);
        assert_eq!(response.metadata.file_name.as_deref(), Some("up.csv"));
        assert_eq!(response.report.summary.total_laid_off, 15);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["metadata"]["csvInfo"]["delimiter"], ",");
        assert_eq!(json["rows"][1]["industry"], "Retail");
        assert_eq!(json["stages"][0]["stage"], "dedup");
    }

    #[test]
    fn test_error_response() {
        let value = error_response("boom");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
        assert!(value["jobId"].as_str().is_some());
    }
}
