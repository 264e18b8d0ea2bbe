//! Processor module
//!
//! Pushes rows through the row middleware chain into a table, then runs the
//! table middleware chain on finalize.
//!
//! # Overview
//!
//! ```text
//! add_row(row) ──► [row mw 1] ──► [row mw 2] ──► ... ──► table accumulator
//!                   1 → 0..N        1 → 0..N
//!
//! finalize() ──► table.finalize() ──► [table mw 1] ──► ... ──► close (reverse)
//! ```
//!
//! The processor is single threaded and not reentrant. Cancellation is
//! checked before every middleware step.

mod types;

pub use types::ProcessorStats;

use crate::error::{Error, Result};
use crate::middleware::{RowMiddleware, TableMiddleware};
use crate::model::{Row, Table};
use crate::types::CancelToken;
use std::time::Instant;
use tracing::{debug, warn};

/// Row and table middleware chains plus the accumulated table
pub struct Processor {
    row_middlewares: Vec<Box<dyn RowMiddleware>>,
    table_middlewares: Vec<Box<dyn TableMiddleware>>,
    table: Table,
    ctx: CancelToken,
    finalized: bool,
    stats: ProcessorStats,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Create an empty processor
    pub fn new() -> Self {
        Self {
            row_middlewares: Vec::new(),
            table_middlewares: Vec::new(),
            table: Table::new(),
            ctx: CancelToken::new(),
            finalized: false,
            stats: ProcessorStats::new(),
        }
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, ctx: CancelToken) -> Self {
        self.ctx = ctx;
        self
    }

    /// The cancellation token checked between middleware steps
    pub fn cancel_token(&self) -> &CancelToken {
        &self.ctx
    }

    /// Get statistics
    pub fn stats(&self) -> &ProcessorStats {
        &self.stats
    }

    // ========================================================================
    // Chain management
    // ========================================================================

    /// Append a row middleware to the end of the chain
    pub fn append_row_middleware(&mut self, mw: impl RowMiddleware + 'static) {
        self.row_middlewares.push(Box::new(mw));
    }

    /// Put a row middleware at the front of the chain
    pub fn prepend_row_middleware(&mut self, mw: impl RowMiddleware + 'static) {
        self.row_middlewares.insert(0, Box::new(mw));
    }

    /// Insert a row middleware at `index`, clamped to the chain length
    pub fn insert_row_middleware(&mut self, index: usize, mw: impl RowMiddleware + 'static) {
        let index = index.min(self.row_middlewares.len());
        self.row_middlewares.insert(index, Box::new(mw));
    }

    /// Append a table middleware to the end of the chain
    pub fn append_table_middleware(&mut self, mw: impl TableMiddleware + 'static) {
        self.table_middlewares.push(Box::new(mw));
    }

    /// Put a table middleware at the front of the chain
    pub fn prepend_table_middleware(&mut self, mw: impl TableMiddleware + 'static) {
        self.table_middlewares.insert(0, Box::new(mw));
    }

    /// Insert a table middleware at `index`, clamped to the chain length
    pub fn insert_table_middleware(&mut self, index: usize, mw: impl TableMiddleware + 'static) {
        let index = index.min(self.table_middlewares.len());
        self.table_middlewares.insert(index, Box::new(mw));
    }

    /// Names of the row middlewares in chain order
    pub fn row_middleware_names(&self) -> Vec<&'static str> {
        self.row_middlewares.iter().map(|m| m.name()).collect()
    }

    /// Names of the table middlewares in chain order
    pub fn table_middleware_names(&self) -> Vec<&'static str> {
        self.table_middlewares.iter().map(|m| m.name()).collect()
    }

    // ========================================================================
    // Row flow
    // ========================================================================

    /// Push one row through the row middlewares into the table
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized);
        }
        self.ctx.check()?;

        let mut rows = vec![row];
        for mw in &mut self.row_middlewares {
            self.ctx.check()?;
            let mut next = Vec::with_capacity(rows.len());
            for row in rows {
                let out = mw
                    .process(&self.ctx, row)
                    .map_err(|e| e.in_stage(format!("row middleware '{}'", mw.name())))?;
                next.extend(out);
            }
            rows = next;
            if rows.is_empty() {
                break;
            }
        }

        self.stats.record_row(rows.len());
        self.table.add_rows(rows);
        Ok(())
    }

    /// Push several rows, stopping at the first error
    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    /// Finalize the table, run the table middlewares, then close every middleware
    ///
    /// Table middlewares close before row middlewares, each chain in reverse
    /// order. Closing runs even when a table middleware failed; the first
    /// error wins.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized);
        }
        if self.ctx.is_cancelled() {
            debug!("Finalize cancelled");
            return Err(Error::Cancelled);
        }
        self.finalized = true;
        let start = Instant::now();

        let mut table = std::mem::take(&mut self.table);
        table.finalize();
        debug!(
            rows = table.len(),
            columns = table.columns().len(),
            "Finalizing table"
        );

        let result = self.run_table_middlewares(table);
        let closed = self.close_all();
        self.stats.finalize_ms = start.elapsed().as_millis() as u64;

        self.table = result?;
        self.stats.rows_final = self.table.len();
        closed
    }

    fn run_table_middlewares(&mut self, mut table: Table) -> Result<Table> {
        for mw in &mut self.table_middlewares {
            self.ctx.check()?;
            table = mw
                .process(&self.ctx, table)
                .map_err(|e| e.in_stage(format!("table middleware '{}'", mw.name())))?;
        }
        Ok(table)
    }

    fn close_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for mw in self.table_middlewares.iter_mut().rev() {
            if let Err(e) = mw.close(&self.ctx) {
                warn!(middleware = mw.name(), error = %e, "Failed to close table middleware");
                first_error.get_or_insert(e.in_stage(format!("table middleware '{}'", mw.name())));
            }
        }
        for mw in self.row_middlewares.iter_mut().rev() {
            if let Err(e) = mw.close(&self.ctx) {
                warn!(middleware = mw.name(), error = %e, "Failed to close row middleware");
                first_error.get_or_insert(e.in_stage(format!("row middleware '{}'", mw.name())));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether `finalize` has run
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The accumulated table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Consume the processor, returning the table
    pub fn into_table(self) -> Table {
        self.table
    }
}
