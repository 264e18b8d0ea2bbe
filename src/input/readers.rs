//! Reader implementations

use super::types::RecordReader;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::types::{JsonObject, JsonValue};
use jsonpath_rust::JsonPath;
use serde::Deserialize;

/// Spread a value into records: arrays become their items, null becomes nothing
fn spread(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

fn into_rows(values: Vec<JsonValue>) -> Result<Vec<Row>> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            JsonValue::Object(map) => Ok(Row::from(map)),
            other => Err(Error::decode(format!(
                "record {} is not an object: {other}",
                i + 1
            ))),
        })
        .collect()
}

/// Optional JSONPath applied to a whole document
struct RecordPath(Option<JsonPath>);

impl RecordPath {
    fn compile(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self(None));
        };
        let compiled = JsonPath::try_from(path)
            .map_err(|e| Error::query(path, format!("Invalid JSONPath: {e}")))?;
        Ok(Self(Some(compiled)))
    }

    fn select(&self, document: JsonValue) -> Vec<JsonValue> {
        match &self.0 {
            None => spread(document),
            Some(path) => spread(path.find(&document))
                .into_iter()
                .flat_map(spread)
                .collect(),
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON document reader
pub struct JsonReader {
    path: RecordPath,
}

impl JsonReader {
    pub fn new(record_path: Option<&str>) -> Result<Self> {
        Ok(Self {
            path: RecordPath::compile(record_path)?,
        })
    }
}

impl RecordReader for JsonReader {
    fn read(&self, body: &str) -> Result<Vec<Row>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document: JsonValue = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;
        into_rows(self.path.select(document))
    }
}

// ============================================================================
// JSON Lines
// ============================================================================

/// JSON Lines reader (one object per line, blank lines ignored)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlReader;

impl JsonlReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for JsonlReader {
    fn read(&self, body: &str) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: JsonValue = serde_json::from_str(line).map_err(|e| {
                Error::decode(format!("Failed to parse JSONL at line {}: {e}", line_num + 1))
            })?;
            let JsonValue::Object(map) = value else {
                return Err(Error::decode(format!(
                    "line {} is not a JSON object",
                    line_num + 1
                )));
            };
            rows.push(Row::from(map));
        }
        Ok(rows)
    }
}

// ============================================================================
// YAML
// ============================================================================

/// YAML reader; every document contributes records
pub struct YamlReader {
    path: RecordPath,
}

impl YamlReader {
    pub fn new(record_path: Option<&str>) -> Result<Self> {
        Ok(Self {
            path: RecordPath::compile(record_path)?,
        })
    }
}

impl RecordReader for YamlReader {
    fn read(&self, body: &str) -> Result<Vec<Row>> {
        let mut records = Vec::new();
        for document in serde_yaml::Deserializer::from_str(body) {
            let value = JsonValue::deserialize(document)
                .map_err(|e| Error::decode(format!("Failed to parse YAML: {e}")))?;
            records.extend(self.path.select(value));
        }
        into_rows(records)
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Delimited text reader; the first line names the columns
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl CsvReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl RecordReader for CsvReader {
    fn read(&self, body: &str) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: JsonObject = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = record.get(i).unwrap_or_default();
                    (header.to_string(), parse_cell(cell))
                })
                .collect();
            rows.push(Row::from(row));
        }
        Ok(rows)
    }
}

/// Type a CSV cell: integers, floats, booleans, empty as null, else string
pub fn parse_cell(value: &str) -> JsonValue {
    if value.is_empty() {
        return JsonValue::Null;
    }
    if let Ok(n) = value.parse::<i64>() {
        return JsonValue::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return JsonValue::Number(num);
        }
    }
    match value {
        "true" | "TRUE" | "True" => JsonValue::Bool(true),
        "false" | "FALSE" | "False" => JsonValue::Bool(false),
        _ => JsonValue::String(value.to_string()),
    }
}
