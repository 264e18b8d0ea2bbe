//! Middleware module
//!
//! Row-level and table-level transformers that the processor chains together.
//!
//! # Overview
//!
//! Row middlewares map one row to zero or more rows:
//! - `FlattenMiddleware` - nested records to dotted leaves
//! - `FieldsFilterMiddleware` - keep/drop by exact name, prefix or regex
//! - `RenameColumnsMiddleware` - exact and regex renames with a cache
//! - `ReplaceMiddleware` - per-field literal/regex replacement and skip rules
//! - `ReorderColumnsMiddleware`, `SortColumnsMiddleware`
//! - `AddFieldsMiddleware`, `RemoveNullsMiddleware`
//! - `SkipLimitMiddleware`, `RemoveDuplicatesMiddleware`
//! - `TemplateFieldsMiddleware` - fields rendered from templates
//! - `ObjectQueryMiddleware`, `FieldQueryMiddleware` - jq-style extraction
//! - `OutputMiddleware` - streams rows to a row formatter as they pass
//!
//! Table middlewares map the finalized table to a table:
//! - `SortByMiddleware` - stable multi-key row sort
//! - `ColumnOrderMiddleware` - forces leading columns

mod fields;
mod output;
mod query;
mod rename;
mod replace;
mod stream;
mod table;
mod template;
mod types;

pub use fields::{
    AddFieldsMiddleware, FieldsFilterMiddleware, FlattenMiddleware, RemoveNullsMiddleware,
    ReorderColumnsMiddleware, SortColumnsMiddleware,
};
pub use output::OutputMiddleware;
pub use query::{FieldQueryMiddleware, ObjectQueryMiddleware};
pub use rename::{RegexRename, RenameColumnsMiddleware};
pub use replace::{FieldReplacements, ReplaceMiddleware};
pub use stream::{RemoveDuplicatesMiddleware, SkipLimitMiddleware};
pub use table::{compare_values, ColumnOrderMiddleware, SortByMiddleware, SortKey};
pub use template::TemplateFieldsMiddleware;
pub use types::{RowMiddleware, TableMiddleware};

#[cfg(test)]
mod tests;
