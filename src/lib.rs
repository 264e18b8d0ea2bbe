//! # rowsmith
//!
//! Turns streams of nested records into tables, CSV, JSON, YAML, SQL and
//! templated text.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowsmith::config::load_config_from_str;
//! use rowsmith::model::Row;
//!
//! let config = load_config_from_str("filter: [b.c]\noutput:\n  table_format: markdown\n")?;
//! let mut pipeline = config.build()?;
//! pipeline.add_row(Row::from_value(serde_json::json!({"a": 1, "b": {"c": 2, "d": 3}}))?)?;
//! pipeline.finish(&mut std::io::stdout())?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────────────┐   ┌──────────────────┐
//! │  input   │ → │          Processor          │ → │      output      │
//! ├──────────┤   ├──────────────┬──────────────┤   ├──────────────────┤
//! │ JSON     │   │ row chain    │ table chain  │   │ table / csv      │
//! │ JSONL    │   │ flatten      │ sort-by      │   │ json / yaml      │
//! │ YAML     │   │ filter       │ column order │   │ sql / template   │
//! │ CSV/TSV  │   │ rename ...   │              │   │ single / files   │
//! └──────────┘   └──────────────┴──────────────┘   └──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Rows, tables and cell stringification
pub mod model;

/// Row and table middlewares
pub mod middleware;

/// Middleware chains and the accumulated table
pub mod processor;

/// Text templates
pub mod template;

/// jq-style queries
pub mod query;

/// Batch and streaming formatters
pub mod output;

/// Record readers
pub mod input;

/// Pipeline configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{load_config, load_config_from_str, Pipeline, PipelineConfig};
pub use model::{Row, Table};
pub use processor::Processor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
