//! Input reader types and traits

use super::readers::{CsvReader, JsonReader, JsonlReader, YamlReader};
use crate::error::Result;
use crate::model::Row;
use serde::{Deserialize, Serialize};

/// Format of an input document
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// JSON document (default)
    #[default]
    Json,
    /// JSON Lines (one object per line)
    Jsonl,
    /// YAML, possibly several documents
    Yaml,
    /// Comma separated values with a header row
    Csv,
    /// Tab separated values with a header row
    Tsv,
}

/// How to read an input document
#[derive(Debug, Clone, Default)]
pub struct InputConfig {
    /// Document format
    pub format: InputFormat,
    /// JSONPath selecting the records (JSON and YAML)
    pub record_path: Option<String>,
    /// Override the CSV delimiter
    pub delimiter: Option<u8>,
}

impl InputConfig {
    /// Config for `format` with defaults
    pub fn new(format: InputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Select records with a JSONPath
    #[must_use]
    pub fn with_record_path(mut self, path: impl Into<String>) -> Self {
        self.record_path = Some(path.into());
        self
    }

    /// Build the matching reader; a bad record path fails here
    pub fn reader(&self) -> Result<Box<dyn RecordReader>> {
        let path = self.record_path.as_deref();
        Ok(match self.format {
            InputFormat::Json => Box::new(JsonReader::new(path)?),
            InputFormat::Jsonl => Box::new(JsonlReader::new()),
            InputFormat::Yaml => Box::new(YamlReader::new(path)?),
            InputFormat::Csv => Box::new(CsvReader::new(self.delimiter.unwrap_or(b','))),
            InputFormat::Tsv => Box::new(CsvReader::new(self.delimiter.unwrap_or(b'\t'))),
        })
    }
}

/// Turns a document body into rows
pub trait RecordReader: Send {
    /// Decode `body` into rows; every record must be an object
    fn read(&self, body: &str) -> Result<Vec<Row>>;
}
