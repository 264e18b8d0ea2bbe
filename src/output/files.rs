//! Writing formatter output to files
//!
//! A [`FileOutputFormatter`] wraps any batch formatter. With a single output
//! file the whole table goes there; in multi-file mode every row is rendered
//! as a one-row table into its own file. Either way the wrapped writer only
//! receives `Wrote output to <file>` lines.

use super::types::TableFormatter;
use crate::error::{Error, Result};
use crate::model::{Row, Table};
use crate::processor::Processor;
use crate::template::Template;
use crate::types::{CancelToken, JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// File name for row `index`
///
/// With a template, it is rendered against the row fields plus `rowIndex`.
/// Otherwise the index is spliced in before the extension of `output_file`:
/// `out.csv` becomes `out-3.csv`.
pub fn compute_output_filename(
    output_file: Option<&str>,
    template: Option<&Template>,
    row: &Row,
    index: usize,
) -> Result<String> {
    if let Some(template) = template {
        let mut data = row.as_map().clone();
        data.insert("rowIndex".to_string(), JsonValue::from(index));
        return template.render(&JsonValue::Object(data));
    }

    let output_file = output_file.unwrap_or_default();
    let ext = Path::new(output_file)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let base = output_file.strip_suffix(&ext).unwrap_or(output_file);
    Ok(format!("{base}-{index}{ext}"))
}

/// Redirects a batch formatter into one file, or one file per row
pub struct FileOutputFormatter {
    inner: Box<dyn TableFormatter>,
    output_file: Option<String>,
    file_template: Option<Template>,
    multiple_files: bool,
}

impl std::fmt::Debug for FileOutputFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileOutputFormatter")
            .field("inner", &self.inner.name())
            .field("output_file", &self.output_file)
            .field("multiple_files", &self.multiple_files)
            .finish_non_exhaustive()
    }
}

impl FileOutputFormatter {
    pub fn new(inner: impl TableFormatter + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            output_file: None,
            file_template: None,
            multiple_files: false,
        }
    }

    pub fn from_boxed(inner: Box<dyn TableFormatter>) -> Self {
        Self {
            inner,
            output_file: None,
            file_template: None,
            multiple_files: false,
        }
    }

    #[must_use]
    pub fn with_output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Template for per-row file names
    pub fn with_file_template(mut self, source: &str) -> Result<Self> {
        self.file_template = Some(Template::parse(source)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_multiple_files(mut self, multiple: bool) -> Self {
        self.multiple_files = multiple;
        self
    }

    fn write_file(&mut self, ctx: &CancelToken, path: &str, table: &Table) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.inner.output(ctx, table, &mut file)?;
        file.flush()?;
        info!(path, formatter = self.inner.name(), "wrote output file");
        Ok(())
    }

    fn output_multiple(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        if self.output_file.is_none() && self.file_template.is_none() {
            return Err(Error::output(
                "neither output file or output file template is set",
            ));
        }
        for (index, row) in table.rows().iter().enumerate() {
            ctx.check()?;
            let path = compute_output_filename(
                self.output_file.as_deref(),
                self.file_template.as_ref(),
                row,
                index,
            )?;
            let mut single = Table::from_rows(vec![row.clone()]);
            single.set_columns(table.columns().to_vec());
            single.finalize();
            self.write_file(ctx, &path, &single)?;
            writeln!(w, "Wrote output to {path}")?;
        }
        Ok(())
    }
}

impl TableFormatter for FileOutputFormatter {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        self.inner.register_middlewares(processor)
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        if self.multiple_files {
            return self.output_multiple(ctx, table, w);
        }
        match self.output_file.clone() {
            Some(path) => {
                self.write_file(ctx, &path, table)?;
                writeln!(w, "Wrote output to {path}")?;
                Ok(())
            }
            None => self.inner.output(ctx, table, w),
        }
    }
}
