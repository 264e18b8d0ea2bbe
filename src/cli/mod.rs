//! CLI module
//!
//! Command-line driver that reads records from files or stdin and runs them
//! through a pipeline built from flags and an optional config file.
//!
//! # Commands
//!
//! - `json` - JSON documents, or JSON lines with `--lines`
//! - `yaml` - YAML documents
//! - `csv` - CSV/TSV with a header row

mod commands;
mod runner;

pub use commands::{Cli, Commands, PipelineArgs};
pub use runner::{apply_args, Runner};
