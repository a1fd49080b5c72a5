//! Decoder implementations
//!
//! Each decoder handles a specific file format.

use super::types::{DecodeOptions, RowDecoder, RowIter};
use crate::config::TableSpec;
use crate::error::{Error, Result};
use crate::storage::ByteStream;
use crate::types::{JsonObject, JsonValue, SDC_EXTRA_COLUMN};
use std::io::{BufRead, BufReader};

// ============================================================================
// CSV Decoder
// ============================================================================

/// Delimited-text decoder; the first row is the header
///
/// Rows shorter than the header get nulls for the missing columns; values
/// past the header's width are collected into `_sdc_extra`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRowDecoder;

impl CsvRowDecoder {
    /// Registry name
    pub const NAME: &'static str = "csv";

    /// Create a new CSV decoder
    pub fn new() -> Self {
        Self
    }
}

impl RowDecoder for CsvRowDecoder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn rows(
        &self,
        stream: ByteStream,
        table: &TableSpec,
        key: &str,
        options: &DecodeOptions,
    ) -> Result<RowIter> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(table.delimiter_byte()?)
            .has_headers(false) // We handle headers ourselves
            .flexible(true) // Allow variable field counts
            .from_reader(stream);

        let mut header = csv::StringRecord::new();
        let has_header = reader
            .read_record(&mut header)
            .map_err(|e| csv_error(key, "CSV parse error in header", e))?;
        if !has_header {
            return Ok(Box::new(std::iter::empty()));
        }

        let headers: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if i == 0 { name.trim_start_matches('\u{feff}') } else { name };
                name.to_string()
            })
            .collect();

        check_required_headers(&headers, &table.key_properties, key, "required")?;
        check_required_headers(&headers, &table.date_overrides, key, "date_overrides")?;

        Ok(Box::new(CsvRows {
            records: reader.into_records(),
            headers,
            key: key.to_string(),
            max_field_size: options.max_field_size,
        }))
    }
}

fn check_required_headers(headers: &[String], required: &[String], key: &str, what: &str) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|column| !headers.contains(column))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::decode(
            key,
            format!("CSV file missing {what} headers: {}", missing.join(", ")),
        ))
    }
}

struct CsvRows {
    records: csv::StringRecordsIntoIter<ByteStream>,
    headers: Vec<String>,
    key: String,
    max_field_size: Option<usize>,
}

impl CsvRows {
    fn to_row(&self, record: &csv::StringRecord) -> Result<JsonObject> {
        if let Some(limit) = self.max_field_size {
            if let Some(field) = record.iter().find(|field| field.len() > limit) {
                return Err(Error::decode(
                    &self.key,
                    format!(
                        "field of {} bytes exceeds the field size limit ({limit})",
                        field.len()
                    ),
                ));
            }
        }

        let mut row = JsonObject::new();
        for (i, name) in self.headers.iter().enumerate() {
            let value = record
                .get(i)
                .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string()));
            row.insert(name.clone(), value);
        }

        if record.len() > self.headers.len() {
            let extra = record
                .iter()
                .skip(self.headers.len())
                .map(|v| JsonValue::String(v.to_string()))
                .collect();
            row.insert(SDC_EXTRA_COLUMN.to_string(), JsonValue::Array(extra));
        }

        Ok(row)
    }
}

/// A failed read of the object body is a storage fault, anything else a decode fault
fn csv_error(key: &str, context: &str, e: csv::Error) -> Error {
    match e.kind() {
        csv::ErrorKind::Io(_) => Error::storage(format!("reading {key}: {e}")),
        _ => Error::decode(key, format!("{context}: {e}")),
    }
}

impl Iterator for CsvRows {
    type Item = Result<JsonObject>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(csv_error(&self.key, "CSV parse error", e))),
        };
        Some(self.to_row(&record))
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
///
/// Blank lines are skipped. Only lines longer than `max_field_size` are
/// rejected, since JSON values have no field boundary at the byte level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlRowDecoder;

impl JsonlRowDecoder {
    /// Registry name
    pub const NAME: &'static str = "jsonl";

    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RowDecoder for JsonlRowDecoder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn rows(
        &self,
        stream: ByteStream,
        _table: &TableSpec,
        key: &str,
        options: &DecodeOptions,
    ) -> Result<RowIter> {
        let key = key.to_string();
        let limit = options.max_field_size;

        let rows = BufReader::new(stream)
            .lines()
            .enumerate()
            .filter_map(move |(line_num, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                        return Some(Err(Error::decode(&key, format!("read error: {e}"))));
                    }
                    Err(e) => return Some(Err(Error::storage(format!("reading {key}: {e}")))),
                };
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                if limit.is_some_and(|limit| line.len() > limit) {
                    return Some(Err(Error::decode(
                        &key,
                        format!("line {} exceeds the field size limit", line_num + 1),
                    )));
                }
                Some(parse_jsonl_line(line, &key, line_num + 1))
            });

        Ok(Box::new(rows))
    }
}

fn parse_jsonl_line(line: &str, key: &str, line_num: usize) -> Result<JsonObject> {
    match serde_json::from_str::<JsonValue>(line) {
        Ok(JsonValue::Object(object)) => Ok(object),
        Ok(other) => Err(Error::decode(
            key,
            format!("line {line_num} is not a JSON object: {other}"),
        )),
        Err(e) => Err(Error::decode(
            key,
            format!("Failed to parse JSONL at line {line_num}: {e}"),
        )),
    }
}
