//! Common types used throughout rowsmith
//!
//! This module contains shared type definitions, type aliases,
//! and the cancellation handle threaded through every pipeline call.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json); this is the cell value
pub type JsonValue = serde_json::Value;

/// Insertion-ordered JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Field (column) name
pub type FieldName = String;

// ============================================================================
// Cancellation
// ============================================================================

/// Ambient cancellation handle
///
/// Cloning shares the underlying flag, so a driver can keep one clone and
/// hand another to the processor. Checking is a relaxed atomic load.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, non-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Return `Error::Cancelled` if cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Split a comma separated list, trimming entries and dropping empty ones
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
