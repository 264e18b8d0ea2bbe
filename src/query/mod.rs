//! jq-style queries
//!
//! A compiled subset of the jq language, used by the object query and the
//! per-field query middlewares.
//!
//! # Syntax
//!
//! ```text
//! .  .a  ."a b"  .[0]  .[-1]  .[2:4]  .[]  .a[]?  ..   indexing
//! a | b    a, b    a // b    a as $x | b               composition
//! {id, name: .user.name, (.k): .v}    [.items[] | .id] construction
//! == != < <= > >=  and or  + - * / %                   operators
//! .a = 1   .a |= f   .a += 1   .a //= "x"              updates
//! if c then a elif d then b else e end   try a catch b   reduce .[] as $x (0; . + $x)
//! "id-\(.id)"                                          interpolation
//! select(f) map(f) length keys has(k) del(.a) to_entries ...
//! ```
//!
//! Parse errors and unknown functions fail at compile time. Runtime errors,
//! such as iterating over a number, fail the run.

mod exec;
mod lexer;
mod parse;

use crate::error::{Error, Result};
use crate::types::JsonValue;
use exec::Env;
use parse::Ast;

/// A compiled query
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    ast: Ast,
}

impl Query {
    /// Compile a query; an empty query is the identity
    pub fn compile(source: &str) -> Result<Self> {
        let ast = parse::parse(source, lexer::lex(source)?)?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    /// The query source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every output of the query for `input`, in order
    pub fn run(&self, input: &JsonValue) -> Result<Vec<JsonValue>> {
        exec::eval(&self.ast, input, &Env::Root)
            .map_err(|fault| Error::query(&self.source, fault.message()))
    }

    /// The first output, if any
    pub fn first(&self, input: &JsonValue) -> Result<Option<JsonValue>> {
        Ok(self.run(input)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests;
