//! Record and table model
//!
//! # Overview
//!
//! A [`Row`] is an insertion-ordered mapping from field name to cell value.
//! A [`Table`] is an ordered sequence of rows plus an explicit column list
//! that is derived from the rows on [`Table::finalize`].
//!
//! Cell values are plain `serde_json::Value`s; the crate enables serde_json's
//! `preserve_order` feature so nested objects keep their insertion order too.

mod row;
mod table;

pub(crate) use row::type_name;
pub use row::{value_to_string, Row};
pub use table::Table;

#[cfg(test)]
mod tests;
