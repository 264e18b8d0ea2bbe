//! Streaming output middleware

use super::types::RowMiddleware;
use crate::error::Result;
use crate::model::Row;
use crate::output::RowFormatter;
use crate::types::CancelToken;
use std::io::Write;

/// Writes every row to a row formatter as it passes, then forwards it
///
/// `close` lets the formatter write its trailer and flushes the writer.
pub struct OutputMiddleware {
    formatter: Box<dyn RowFormatter>,
    writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for OutputMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputMiddleware")
            .field("formatter", &self.formatter.name())
            .finish_non_exhaustive()
    }
}

impl OutputMiddleware {
    pub fn new(formatter: impl RowFormatter + 'static, writer: impl Write + Send + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
            writer: Box::new(writer),
        }
    }
}

impl RowMiddleware for OutputMiddleware {
    fn name(&self) -> &'static str {
        "output"
    }

    fn process(&mut self, ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        self.formatter.output_row(ctx, &row, &mut self.writer)?;
        Ok(vec![row])
    }

    fn close(&mut self, ctx: &CancelToken) -> Result<()> {
        self.formatter.close(ctx, &mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
