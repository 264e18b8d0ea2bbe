//! Text templates
//!
//! A Go `text/template` flavoured engine used by templated fields, template
//! output and output filename templates.
//!
//! # Syntax
//!
//! ```text
//! {{ .field }}                     field of the current value
//! {{ .a.b | upper }}               pipelines; the piped value is the last argument
//! {{ $x := .a }}{{ $x }}           variables; `$` is the root value
//! {{ if .a }}..{{ else if .b }}..{{ else }}..{{ end }}
//! {{ range $i, $e := .list }}..{{ else }}..{{ end }}
//! {{ with .a }}{{ . }}{{ end }}
//! {{- trimmed -}}  {{/* comment */}}
//! ```
//!
//! Templates are parsed once and rendered many times. A missing key renders
//! as empty unless the template is strict.

mod exec;
mod funcs;
mod lexer;
mod parse;

use crate::error::Result;
use crate::types::JsonValue;
pub(crate) use funcs::title_case;
use parse::Node;

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
    strict: bool,
}

impl Template {
    /// Parse a template; syntax errors and unknown functions fail here
    pub fn parse(source: &str) -> Result<Self> {
        let nodes = parse::parse(lexer::lex(source)?)?;
        Ok(Self {
            source: source.to_string(),
            nodes,
            strict: false,
        })
    }

    /// Raise `UndefinedVariable` for missing keys instead of rendering empty
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against a data value
    pub fn render(&self, data: &JsonValue) -> Result<String> {
        exec::execute(&self.nodes, data, self.strict)
    }
}

/// Parse and render in one step
pub fn render(source: &str, data: &JsonValue) -> Result<String> {
    Template::parse(source)?.render(data)
}

#[cfg(test)]
mod tests;
