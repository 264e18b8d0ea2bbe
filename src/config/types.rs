//! Configuration types
//!
//! Every field has a default, so an empty document is a valid pass-through
//! pipeline with table output.

use crate::output::{JsonMode, OutputFormat, TableFormat, DEFAULT_SQL_TABLE};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// Pipeline
// ============================================================================

/// Middleware options for one pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fields to keep (exact names, or prefixes ending in `.`)
    pub fields: Vec<String>,
    /// Fields to drop (exact names, or prefixes ending in `.`)
    pub filter: Vec<String>,
    /// Regexes of fields to keep
    pub regex_fields: Vec<String>,
    /// Regexes of fields to drop
    pub regex_filter: Vec<String>,

    /// Flatten nested records into dotted fields
    pub flatten: bool,
    /// Sort each row's fields by name
    pub sort_columns: bool,
    /// Leading field order; defaults to `fields` when empty
    pub reorder: Vec<String>,
    /// Leading table columns, applied after all row processing
    pub columns: Vec<String>,
    /// Row sort keys; a leading `-` sorts descending
    pub sort_by: Vec<String>,

    /// Rows to skip
    pub skip: i64,
    /// Maximum rows to emit (0 = unlimited)
    pub limit: i64,
    /// Drop consecutive rows equal on these fields
    pub remove_duplicates: Vec<String>,
    /// Drop null-valued fields
    pub remove_nulls: bool,

    /// Exact renames as `from:to`
    pub rename: Vec<String>,
    /// Regex renames as `pattern:replacement`
    pub rename_regex: Vec<String>,
    /// YAML file with `renames` and `regexpRenames`
    pub rename_file: Option<PathBuf>,
    /// YAML file with per-field replace and skip rules
    pub replace_file: Option<PathBuf>,

    /// Templated fields as `name:template`, or `@file` naming a YAML mapping
    pub template_fields: Vec<String>,
    /// Replacement for `.` in field names inside template contexts
    pub template_rename_separator: Option<String>,
    /// Constant fields appended to every row
    pub add_fields: JsonObject,

    /// jq-style query applied to the whole row; every output object becomes a row
    pub query: Option<String>,
    /// Per-field jq-style queries; the first output replaces the value
    pub field_queries: HashMap<String, String>,

    /// Output options
    pub output: OutputConfig,
}

// ============================================================================
// Output
// ============================================================================

/// Formatter selection and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub table_format: TableFormat,
    /// Built-in table style name
    pub table_style: Option<String>,
    /// YAML table style file; wins over `table_style`
    pub table_style_file: Option<PathBuf>,

    /// Emit a CSV/TSV header row
    pub with_headers: bool,
    /// CSV separator, a single ASCII character
    pub csv_separator: Option<String>,

    /// Template source for template output
    pub template: Option<String>,
    /// Template file for template output; wins over `template`
    pub template_file: Option<PathBuf>,
    /// Value exposed to output templates as `.data`
    pub template_data: Option<JsonValue>,

    /// Write to this file instead of standard output
    pub output_file: Option<String>,
    /// Template for per-row file names (fields plus `rowIndex`)
    pub output_file_template: Option<String>,
    /// Write each row to its own file
    pub output_multiple_files: bool,

    pub sql_table_name: String,
    pub sql_upsert: bool,
    /// Start a new statement every N rows (0 = never)
    pub sql_split_by_rows: usize,

    /// Field printed by single output
    pub select_field: Option<String>,
    /// Template printed by single output; wins over `select_field`
    pub select_template: Option<String>,
    /// Separator between single output values (default newline)
    pub select_separator: Option<String>,

    pub json_mode: JsonMode,

    /// Write rows as they arrive instead of after finalize (json, sql, single)
    pub stream: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            table_format: TableFormat::default(),
            table_style: None,
            table_style_file: None,
            with_headers: true,
            csv_separator: None,
            template: None,
            template_file: None,
            template_data: None,
            output_file: None,
            output_file_template: None,
            output_multiple_files: false,
            sql_table_name: DEFAULT_SQL_TABLE.to_string(),
            sql_upsert: false,
            sql_split_by_rows: 0,
            select_field: None,
            select_template: None,
            select_separator: None,
            json_mode: JsonMode::default(),
            stream: false,
        }
    }
}
