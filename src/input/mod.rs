//! Input module
//!
//! Readers that turn documents into rows for the command line driver.
//!
//! # Overview
//!
//! - `JsonReader` - a JSON document; arrays are spread, an optional JSONPath
//!   selects the records
//! - `JsonlReader` - one JSON object per line
//! - `YamlReader` - one or more YAML documents
//! - `CsvReader` - CSV/TSV with a header row and typed cells

mod readers;
mod types;

pub use readers::{parse_cell, CsvReader, JsonReader, JsonlReader, YamlReader};
pub use types::{InputConfig, InputFormat, RecordReader};

#[cfg(test)]
mod tests;
