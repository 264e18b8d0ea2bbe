//! Middleware traits
//!
//! Defines the row-level (one-to-many) and table-level (whole table)
//! transformer abstractions the processor chains together.

use crate::error::Result;
use crate::model::{Row, Table};
use crate::types::CancelToken;

/// A transformer mapping one row to zero or more rows
///
/// Returning an empty vector drops the row; returning several fans it out.
/// Implementations may keep state between calls and are not shared across
/// processors.
pub trait RowMiddleware: Send {
    /// Short name used to attribute errors
    fn name(&self) -> &'static str;

    /// Transform a single row
    fn process(&mut self, ctx: &CancelToken, row: Row) -> Result<Vec<Row>>;

    /// Release resources once the processor is finalized
    fn close(&mut self, _ctx: &CancelToken) -> Result<()> {
        Ok(())
    }
}

/// A transformer mapping a whole table to a table
pub trait TableMiddleware: Send {
    /// Short name used to attribute errors
    fn name(&self) -> &'static str;

    /// Transform the finalized table; the returned table is authoritative
    fn process(&mut self, ctx: &CancelToken, table: Table) -> Result<Table>;

    /// Release resources once the processor is finalized
    fn close(&mut self, _ctx: &CancelToken) -> Result<()> {
        Ok(())
    }
}

impl<M: RowMiddleware + ?Sized> RowMiddleware for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process(&mut self, ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        (**self).process(ctx, row)
    }

    fn close(&mut self, ctx: &CancelToken) -> Result<()> {
        (**self).close(ctx)
    }
}

impl<M: TableMiddleware + ?Sized> TableMiddleware for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process(&mut self, ctx: &CancelToken, table: Table) -> Result<Table> {
        (**self).process(ctx, table)
    }

    fn close(&mut self, ctx: &CancelToken) -> Result<()> {
        (**self).close(ctx)
    }
}
