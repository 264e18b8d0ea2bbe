//! Pipeline configuration module
//!
//! Declarative description of a pipeline, loadable from YAML or JSON, that
//! builds a processor plus the formatter that renders its table.
//!
//! # Overview
//!
//! - `PipelineConfig` - middleware options mirroring the command line flags
//! - `OutputConfig` - formatter selection and options
//! - `Pipeline` - the built processor and formatter, driven row by row
//!
//! Row middlewares are chained in a fixed order: object query, flatten,
//! template fields, add fields, rename, replace, fields filter, remove
//! nulls, reorder/sort columns, field queries, skip/limit, remove
//! duplicates. Table middlewares: sort-by, then column order.

mod builder;
mod pipeline;
mod types;

pub use builder::{load_config, load_config_from_str};
pub use pipeline::Pipeline;
pub use types::{OutputConfig, PipelineConfig};

#[cfg(test)]
mod tests;
