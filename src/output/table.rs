//! Table formatter: boxed ASCII, markdown and HTML

use super::style::TableStyle;
use super::types::{TableFormat, TableFormatter};
use crate::error::Result;
use crate::middleware::FlattenMiddleware;
use crate::model::{value_to_string, Table};
use crate::processor::Processor;
use crate::types::CancelToken;
use std::io::Write;

/// Renders the table with its column list as headers
///
/// Missing cells render empty; sequences are joined with `, `.
#[derive(Debug, Clone, Default)]
pub struct TableOutputFormatter {
    format: TableFormat,
    style: TableStyle,
}

impl TableOutputFormatter {
    pub fn new(format: TableFormat) -> Self {
        Self {
            format,
            style: TableStyle::default(),
        }
    }

    /// Style used by the ASCII flavor
    #[must_use]
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    fn cells(table: &Table) -> Vec<Vec<String>> {
        table
            .rows()
            .iter()
            .map(|row| {
                table
                    .columns()
                    .iter()
                    .map(|c| row.get(c).map(value_to_string).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn render_ascii(&self, table: &Table) -> String {
        let mut out = comfy_table::Table::new();
        self.style.apply(&mut out);
        out.set_header(table.columns().iter().map(|c| self.style.header_cell(c)));
        for (i, row) in Self::cells(table).iter().enumerate() {
            out.add_row(
                row.iter()
                    .enumerate()
                    .map(|(j, text)| self.style.row_cell(text, i, j)),
            );
        }
        format!("{out}\n")
    }

    fn render_markdown(table: &Table) -> String {
        let escape = |s: &str| s.replace('|', "\\|").replace('\n', " ");
        let headers: Vec<String> = table.columns().iter().map(|c| escape(c)).collect();
        let rows: Vec<Vec<String>> = Self::cells(table)
            .into_iter()
            .map(|r| r.iter().map(|c| escape(c)).collect())
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();

        let line = |cells: &[String]| {
            let mut s = String::new();
            for (cell, width) in cells.iter().zip(&widths) {
                let pad = width.saturating_sub(cell.chars().count());
                s.push_str(&format!("| {cell}{} ", " ".repeat(pad)));
            }
            s.push_str("|\n");
            s
        };

        let mut out = line(&headers);
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&line(&dashes));
        for row in &rows {
            out.push_str(&line(row));
        }
        out
    }

    fn render_html(table: &Table) -> String {
        let mut out = String::from("<table>\n  <thead>\n  <tr>\n");
        for column in table.columns() {
            out.push_str(&format!("    <th>{}</th>\n", html_escape(column)));
        }
        out.push_str("  </tr>\n  </thead>\n  <tbody>\n");
        for row in Self::cells(table) {
            out.push_str("  <tr>\n");
            for cell in row {
                out.push_str(&format!("    <td>{}</td>\n", html_escape(&cell)));
            }
            out.push_str("  </tr>\n");
        }
        out.push_str("  </tbody>\n</table>\n");
        out
    }
}

pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

impl TableFormatter for TableOutputFormatter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        if !processor.row_middleware_names().contains(&"flatten") {
            processor.prepend_row_middleware(FlattenMiddleware::new());
        }
        Ok(())
    }

    fn output(&mut self, _ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        let rendered = match self.format {
            TableFormat::Ascii => self.render_ascii(table),
            TableFormat::Markdown => Self::render_markdown(table),
            TableFormat::Html => Self::render_html(table),
        };
        w.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
