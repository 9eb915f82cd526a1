//! Parsing of uploaded CSV and JSON files into a series
//!
//! The value column is `sales_value` when present, otherwise the second
//! column (CSV) or the second key of each record (JSON).

use crate::error::{ForecastError, Result};
use crate::series::Series;
use serde_json::{Map, Value};
use std::path::Path;

const VALUE_COLUMN: &str = "sales_value";

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Json,
}

impl UploadFormat {
    /// Detect the format from a file name extension
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(UploadFormat::Csv),
            Some("json") => Ok(UploadFormat::Json),
            _ => Err(ForecastError::DataError(format!(
                "Unsupported file format for {}. Use CSV or JSON.",
                name
            ))),
        }
    }
}

/// Parse uploaded bytes in the given format
pub fn parse_upload(bytes: &[u8], format: UploadFormat) -> Result<Series> {
    match format {
        UploadFormat::Csv => parse_csv(bytes),
        UploadFormat::Json => parse_json(bytes),
    }
}

/// Read a CSV or JSON file from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Series> {
    let path = path.as_ref();
    let format = UploadFormat::from_file_name(&path.to_string_lossy())?;
    let bytes = std::fs::read(path)?;
    parse_upload(&bytes, format)
}

pub fn parse_csv(bytes: &[u8]) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let column = match headers.iter().position(|h| h == VALUE_COLUMN) {
        Some(index) => index,
        None if headers.len() > 1 => 1,
        None => {
            return Err(ForecastError::DataError(
                "Could not find sales data column".to_string(),
            ))
        }
    };

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = record.get(column).unwrap_or("");
        let value = field.parse::<f64>().map_err(|_| {
            ForecastError::DataError(format!(
                "Row {}: '{}' in column '{}' is not a number",
                row + 1,
                field,
                &headers[column]
            ))
        })?;
        values.push(value);
    }

    Series::new(values)
}

/// Parse a JSON upload.
///
/// Accepted shapes: an array of numbers, an array of records, or an object
/// of column arrays.
pub fn parse_json(bytes: &[u8]) -> Result<Series> {
    let document: Value = serde_json::from_slice(bytes)?;

    let values = match &document {
        Value::Array(items) if items.iter().all(|v| !v.is_object()) => items
            .iter()
            .enumerate()
            .map(|(i, v)| number(v, i))
            .collect::<Result<Vec<f64>>>()?,
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => number(value_field(record)?, i),
                _ => Err(ForecastError::DataError(format!(
                    "Record {} is not an object",
                    i + 1
                ))),
            })
            .collect::<Result<Vec<f64>>>()?,
        Value::Object(columns) => match value_field(columns)? {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| number(v, i))
                .collect::<Result<Vec<f64>>>()?,
            _ => {
                return Err(ForecastError::DataError(
                    "Column data must be an array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ForecastError::DataError(
                "Expected a JSON array or object".to_string(),
            ))
        }
    };

    Series::new(values)
}

fn value_field(record: &Map<String, Value>) -> Result<&Value> {
    record
        .get(VALUE_COLUMN)
        .or_else(|| record.values().nth(1))
        .ok_or_else(|| ForecastError::DataError("Could not find sales data column".to_string()))
}

fn number(value: &Value, index: usize) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ForecastError::DataError(format!("Value {} is not a number: {}", index + 1, value))
    })
}
