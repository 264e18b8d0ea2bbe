//! A built pipeline: processor plus formatter

use crate::error::Result;
use crate::model::{Row, Table};
use crate::output::TableFormatter;
use crate::processor::{Processor, ProcessorStats};
use crate::types::CancelToken;
use std::io::Write;
use tracing::debug;

/// Drives rows through a processor and renders the final table
///
/// In streaming mode rows are written by the output middleware as they pass
/// and there is no batch formatter.
pub struct Pipeline {
    processor: Processor,
    formatter: Option<Box<dyn TableFormatter>>,
}

impl Pipeline {
    pub fn new(processor: Processor, formatter: Option<Box<dyn TableFormatter>>) -> Self {
        Self {
            processor,
            formatter,
        }
    }

    /// Cancellation handle shared with the processor
    pub fn cancel_token(&self) -> &CancelToken {
        self.processor.cancel_token()
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }

    /// Whether rows are written as they arrive
    pub fn is_streaming(&self) -> bool {
        self.formatter.is_none()
    }

    pub fn add_row(&mut self, row: Row) -> Result<()> {
        self.processor.add_row(row)
    }

    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        self.processor.add_rows(rows)
    }

    /// Finalize the processor and write the table with the batch formatter
    pub fn finish(&mut self, w: &mut dyn Write) -> Result<()> {
        self.processor.finalize()?;
        let stats = self.processor.stats();
        debug!(
            rows_added = stats.rows_added,
            rows_final = stats.rows_final,
            finalize_ms = stats.finalize_ms,
            "Pipeline finished"
        );

        if let Some(formatter) = self.formatter.as_mut() {
            let ctx = self.processor.cancel_token().clone();
            let name = formatter.name();
            formatter
                .output(&ctx, self.processor.table(), w)
                .map_err(|e| e.in_stage(format!("formatter '{name}'")))?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn stats(&self) -> &ProcessorStats {
        self.processor.stats()
    }

    /// The final table once `finish` ran
    pub fn table(&self) -> &Table {
        self.processor.table()
    }
}
