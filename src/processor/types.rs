//! Processor statistics

use serde::Serialize;

/// Counters collected while rows flow through a processor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    /// Rows handed to `add_row`
    pub rows_added: usize,
    /// Rows that reached the table after the row middlewares
    pub rows_accumulated: usize,
    /// Rows dropped by row middlewares
    pub rows_dropped: usize,
    /// Rows in the table after the table middlewares
    pub rows_final: usize,
    /// Duration of `finalize` in milliseconds
    pub finalize_ms: u64,
}

impl ProcessorStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one `add_row` call
    pub fn record_row(&mut self, emitted: usize) {
        self.rows_added += 1;
        self.rows_accumulated += emitted;
        if emitted == 0 {
            self.rows_dropped += 1;
        }
    }
}
