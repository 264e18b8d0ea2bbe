//! CLI commands and argument parsing

use crate::output::{JsonMode, OutputFormat, TableFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Shape streams of records into tables, CSV, JSON, YAML, SQL or text
#[derive(Parser, Debug)]
#[command(name = "rowsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML or JSON); flags override it
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read JSON documents (arrays are spread into rows)
    Json {
        /// Input files (standard input when empty)
        files: Vec<PathBuf>,

        /// JSONPath selecting the records inside each document
        #[arg(long)]
        record_path: Option<String>,

        /// Treat input as JSON lines
        #[arg(long)]
        lines: bool,
    },

    /// Read YAML documents
    Yaml {
        /// Input files (standard input when empty)
        files: Vec<PathBuf>,

        /// JSONPath selecting the records inside each document
        #[arg(long)]
        record_path: Option<String>,
    },

    /// Read CSV or TSV files with a header row
    Csv {
        /// Input files (standard input when empty)
        files: Vec<PathBuf>,

        /// Input delimiter (defaults to ',' or tab with --tsv)
        #[arg(long)]
        delimiter: Option<char>,

        /// Tab separated input
        #[arg(long)]
        tsv: bool,
    },
}

/// Pipeline flags shared by every subcommand
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Fields to keep (comma separated; `name.` keeps a prefix)
    #[arg(long, global = true)]
    pub fields: Vec<String>,

    /// Fields to drop (comma separated; `name.` drops a prefix)
    #[arg(long, global = true)]
    pub filter: Vec<String>,

    /// Regexes of fields to keep
    #[arg(long, global = true)]
    pub regex_fields: Vec<String>,

    /// Regexes of fields to drop
    #[arg(long, global = true)]
    pub regex_filter: Vec<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub output: Option<OutputFormat>,

    /// Table flavor for table output
    #[arg(long, global = true)]
    pub table_format: Option<TableFormat>,

    /// Built-in table style
    #[arg(long, global = true)]
    pub table_style: Option<String>,

    /// YAML table style file
    #[arg(long, global = true)]
    pub table_style_file: Option<PathBuf>,

    /// Emit a header row for CSV/TSV
    #[arg(long, global = true)]
    pub with_headers: Option<bool>,

    /// CSV separator
    #[arg(long, global = true)]
    pub csv_separator: Option<String>,

    /// JSON layout
    #[arg(long, global = true)]
    pub json_mode: Option<JsonMode>,

    /// Template source for template output
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Template file for template output
    #[arg(long, global = true)]
    pub template_file: Option<PathBuf>,

    /// Extra data exposed to output templates as `.data` (JSON)
    #[arg(long, global = true)]
    pub template_data: Option<String>,

    /// Templated field as `name:template`, or `@file` with a YAML mapping
    #[arg(long = "template-field", global = true)]
    pub template_fields: Vec<String>,

    /// Replacement for `.` in field names inside field templates
    #[arg(long, global = true)]
    pub template_rename_separator: Option<String>,

    /// Write output to a file
    #[arg(long, global = true)]
    pub output_file: Option<String>,

    /// Template for per-row file names
    #[arg(long, global = true)]
    pub output_file_template: Option<String>,

    /// Write each row to its own file
    #[arg(long, global = true)]
    pub output_multiple_files: bool,

    /// Table name for SQL output
    #[arg(long, global = true)]
    pub sql_table_name: Option<String>,

    /// Emit an upsert clause in SQL output
    #[arg(long, global = true)]
    pub sql_upsert: bool,

    /// Start a new SQL statement every N rows
    #[arg(long, global = true)]
    pub sql_split_by_rows: Option<usize>,

    /// Field printed by single output
    #[arg(long, global = true)]
    pub select: Option<String>,

    /// Template printed by single output
    #[arg(long, global = true)]
    pub select_template: Option<String>,

    /// Separator between single output values
    #[arg(long, global = true)]
    pub select_separator: Option<String>,

    /// Write rows as they arrive (json, sql, single)
    #[arg(long, global = true)]
    pub stream: bool,

    /// Sort each row's fields by name
    #[arg(long, global = true)]
    pub sort_columns: bool,

    /// Sort rows (comma separated; a leading `-` sorts descending)
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub sort_by: Vec<String>,

    /// Leading output columns (comma separated)
    #[arg(long, global = true)]
    pub columns: Vec<String>,

    /// Rows to skip
    #[arg(long, global = true)]
    pub skip: Option<i64>,

    /// Maximum rows to emit
    #[arg(long, global = true)]
    pub limit: Option<i64>,

    /// Drop consecutive rows equal on these fields (comma separated)
    #[arg(long, global = true)]
    pub remove_duplicates: Vec<String>,

    /// Drop null-valued fields
    #[arg(long, global = true)]
    pub remove_nulls: bool,

    /// Flatten nested records into dotted fields
    #[arg(long, global = true)]
    pub flatten: bool,

    /// Rename a field as `from:to`
    #[arg(long = "rename-column", global = true)]
    pub rename: Vec<String>,

    /// Rename fields matching a regex as `pattern:replacement`
    #[arg(long, global = true)]
    pub rename_regex: Vec<String>,

    /// YAML rename file
    #[arg(long, global = true)]
    pub rename_file: Option<PathBuf>,

    /// YAML replace file
    #[arg(long, global = true)]
    pub replace_file: Option<PathBuf>,

    /// Constant field as `name:value` (value parsed as JSON, else a string)
    #[arg(long = "add-field", global = true)]
    pub add_fields: Vec<String>,

    /// jq-style query applied to each row; every output object becomes a row
    #[arg(long, global = true)]
    pub query: Option<String>,

    /// Per-field jq-style query as `field:query`; the first output replaces the value
    #[arg(long = "field-query", global = true)]
    pub field_queries: Vec<String>,
}
