//! Raw CSV ingest with encoding and delimiter auto-detection.
//!
//! Turns a layoffs CSV export into a [`RawSource`]. The header must name
//! exactly the nine schema columns (any order, case-insensitive); every cell
//! must parse into its column type. Anything else is a [`SchemaMismatch`]
//! and aborts the ingest.

use std::path::Path;

use crate::config::CleaningConfig;
use crate::error::{IngestError, IngestResult, SchemaMismatch};
use crate::models::{LayoffDate, RawSource, Row, SourceInfo, COLUMNS};

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    };

    // A UTF-8 byte order mark would otherwise end up in the first header
    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse a CSV file with auto-detection of encoding and (unless given) delimiter.
///
/// # Example
/// ```ignore
/// let source = parse_file("layoffs.csv", None, &CleaningConfig::default())?;
/// println!("{} raw rows, encoding {}", source.len(), source.info().encoding);
/// ```
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
    config: &CleaningConfig,
) -> IngestResult<RawSource> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(String::from);
    parse_bytes(&bytes, delimiter, config, name)
}

/// Parse CSV bytes with auto-detection of encoding and (unless given) delimiter.
pub fn parse_bytes(
    bytes: &[u8],
    delimiter: Option<char>,
    config: &CleaningConfig,
    name: Option<String>,
) -> IngestResult<RawSource> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    parse_str(&content, delimiter, encoding, config, name)
}

/// Parse already-decoded CSV text with an explicit delimiter.
pub fn parse_str(
    content: &str,
    delimiter: char,
    encoding: String,
    config: &CleaningConfig,
    name: Option<String>,
) -> IngestResult<RawSource> {
    if content.trim().is_empty() {
        return Err(IngestError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(SchemaMismatch::new(1, format!("delimiter '{}' is not ASCII", delimiter)).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_mismatch(&e, 1))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let layout = ColumnLayout::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +1 for 0-index, +1 for header
        let fallback_line = idx + 2;
        let record = result.map_err(|e| csv_mismatch(&e, fallback_line))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);
        rows.push(layout.build_row(&record, line, config)?);
    }

    let info = SourceInfo {
        name,
        encoding,
        delimiter,
        row_count: rows.len(),
        headers,
    };
    Ok(RawSource::new(rows, info))
}

fn csv_mismatch(err: &csv::Error, fallback_line: usize) -> SchemaMismatch {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("expected {} cells, found {}", expected_len, len)
        }
        _ => err.to_string(),
    };
    SchemaMismatch::new(line, message)
}

/// Position of each schema column within the file's header.
struct ColumnLayout {
    /// Indexed like [`COLUMNS`].
    positions: [usize; 9],
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Result<Self, SchemaMismatch> {
        let mut positions: [Option<usize>; 9] = [None; 9];

        for (i, header) in headers.iter().enumerate() {
            let normalized = header.trim_matches('"').trim().to_lowercase();
            let slot = COLUMNS
                .iter()
                .position(|c| *c == normalized)
                .ok_or_else(|| {
                    SchemaMismatch::new(1, "unknown column").with_column(header.clone())
                })?;
            if positions[slot].is_some() {
                return Err(SchemaMismatch::new(1, "duplicate column").with_column(header.clone()));
            }
            positions[slot] = Some(i);
        }

        let missing: Vec<&str> = COLUMNS
            .iter()
            .zip(positions.iter())
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| *c)
            .collect();
        if !missing.is_empty() {
            return Err(SchemaMismatch::new(
                1,
                format!("missing column(s): {}", missing.join(", ")),
            ));
        }

        let mut resolved = [0usize; 9];
        for (slot, pos) in positions.iter().enumerate() {
            resolved[slot] = pos.unwrap_or_default();
        }
        Ok(Self { positions: resolved })
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord, column: usize) -> &'r str {
        record.get(self.positions[column]).unwrap_or("")
    }

    fn nullable<'r>(
        &self,
        record: &'r csv::StringRecord,
        column: usize,
        config: &CleaningConfig,
    ) -> Option<&'r str> {
        let cell = self.cell(record, column);
        if config.is_null_marker(cell) {
            None
        } else {
            Some(cell)
        }
    }

    fn build_row(
        &self,
        record: &csv::StringRecord,
        line: usize,
        config: &CleaningConfig,
    ) -> Result<Row, SchemaMismatch> {
        let nullable = |column: usize| self.nullable(record, column, config);

        let total_laid_off = match nullable(3) {
            None => None,
            Some(cell) => Some(cell.trim().parse::<i64>().map_err(|_| {
                SchemaMismatch::new(line, "expected an integer")
                    .with_column(COLUMNS[3])
                    .with_value(cell)
            })?),
        };

        Ok(Row {
            company: self.cell(record, 0).to_string(),
            location: self.cell(record, 1).to_string(),
            industry: nullable(2).map(String::from),
            total_laid_off,
            percentage_laid_off: parse_float(nullable(4), line, 4)?,
            layoff_date: nullable(5).map(|d| LayoffDate::Text(d.trim().to_string())),
            stage: self.cell(record, 6).to_string(),
            country: self.cell(record, 7).to_string(),
            funds_raised_millions: parse_float(nullable(8), line, 8)?,
        })
    }
}

fn parse_float(cell: Option<&str>, line: usize, column: usize) -> Result<Option<f64>, SchemaMismatch> {
    let Some(cell) = cell else {
        return Ok(None);
    };
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(SchemaMismatch::new(line, "expected a finite number")
            .with_column(COLUMNS[column])
            .with_value(cell)),
    }
}
