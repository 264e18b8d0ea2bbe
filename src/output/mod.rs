//! Output module
//!
//! Formatters that turn rows or finalized tables into bytes.
//!
//! # Overview
//!
//! Batch formatters ([`TableFormatter`]) take the finalized table:
//! - `TableOutputFormatter` - boxed ASCII (style aware), markdown or HTML
//! - `CsvFormatter` - CSV / TSV with optional header row
//! - `JsonFormatter` - JSON array or JSON lines
//! - `YamlFormatter` - sequence of mappings
//! - `SqlFormatter` - `INSERT INTO` statements, optional upsert and splitting
//! - `TemplateFormatter` - one template over `{rows, data}`
//! - `SingleColumnFormatter` - one field per row
//! - `FileOutputFormatter` - redirects any of the above to one or many files
//!
//! Streaming formatters ([`RowFormatter`]) are driven by the output
//! middleware: `JsonRowFormatter`, `SqlFormatter`, `SingleColumnFormatter`.

mod csv;
mod files;
mod json;
mod single;
mod sql;
mod style;
mod table;
mod template;
mod types;
mod yaml;

pub use self::csv::CsvFormatter;
pub use files::{compute_output_filename, FileOutputFormatter};
pub use json::{JsonFormatter, JsonRowFormatter};
pub use single::SingleColumnFormatter;
pub use sql::{value_to_sql, SqlFormatter, DEFAULT_SQL_TABLE};
pub use style::{
    BoxStyle, ColorOptions, ColorToken, FormatOptions, StyleConfig, StyleOptions, TableStyle,
    TextCase, TitleOptions,
};
pub use table::TableOutputFormatter;
pub use template::TemplateFormatter;
pub use types::{JsonMode, OutputFormat, RowFormatter, TableFormat, TableFormatter};
pub use yaml::YamlFormatter;
