//! Formatter traits and output option enums

use crate::error::{Error, Result};
use crate::model::{Row, Table};
use crate::processor::Processor;
use crate::types::CancelToken;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

// ============================================================================
// Formatter traits
// ============================================================================

/// Serializes a finalized table
pub trait TableFormatter: Send {
    /// Short name used to attribute errors
    fn name(&self) -> &'static str;

    /// Add the middlewares this formatter relies on (for example flatten)
    ///
    /// Formatters only push middlewares; they never read processor state.
    fn register_middlewares(&self, _processor: &mut Processor) -> Result<()> {
        Ok(())
    }

    /// Write the whole table
    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()>;
}

/// Serializes rows one at a time as they arrive
pub trait RowFormatter: Send {
    /// Short name used to attribute errors
    fn name(&self) -> &'static str;

    /// Add the middlewares this formatter relies on
    fn register_middlewares(&self, _processor: &mut Processor) -> Result<()> {
        Ok(())
    }

    /// Write a single row
    fn output_row(&mut self, ctx: &CancelToken, row: &Row, w: &mut dyn Write) -> Result<()>;

    /// Write any trailer once the stream ends
    fn close(&mut self, _ctx: &CancelToken, _w: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}

impl<F: TableFormatter + ?Sized> TableFormatter for Box<F> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        (**self).register_middlewares(processor)
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        (**self).output(ctx, table, w)
    }
}

impl<F: RowFormatter + ?Sized> RowFormatter for Box<F> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        (**self).register_middlewares(processor)
    }

    fn output_row(&mut self, ctx: &CancelToken, row: &Row, w: &mut dyn Write) -> Result<()> {
        (**self).output_row(ctx, row, w)
    }

    fn close(&mut self, ctx: &CancelToken, w: &mut dyn Write) -> Result<()> {
        (**self).close(ctx, w)
    }
}

// ============================================================================
// Options
// ============================================================================

/// Output format
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Boxed, markdown or HTML table
    #[default]
    Table,
    /// JSON array or JSON lines
    Json,
    /// Comma separated values
    Csv,
    /// Tab separated values
    Tsv,
    /// YAML sequence of mappings
    Yaml,
    /// SQL INSERT statements
    Sql,
    /// Free-form text template
    Template,
    /// One field per row
    Single,
}

/// Table rendering flavor
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Ascii,
    Markdown,
    Html,
}

/// JSON output layout
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum JsonMode {
    /// One array holding every row
    #[default]
    Array,
    /// One compact object per line
    Lines,
}

macro_rules! impl_str_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The option name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(Error::invalid_value(
                        stringify!($ty),
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

impl_str_enum!(OutputFormat {
    Table => "table",
    Json => "json",
    Csv => "csv",
    Tsv => "tsv",
    Yaml => "yaml",
    Sql => "sql",
    Template => "template",
    Single => "single",
});

impl_str_enum!(TableFormat {
    Ascii => "ascii",
    Markdown => "markdown",
    Html => "html",
});

impl_str_enum!(JsonMode {
    Array => "array",
    Lines => "lines",
});
