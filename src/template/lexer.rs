//! Template lexer
//!
//! Splits source into text and action items. Actions are tokenized; comments
//! are dropped and `{{-` / `-}}` trim the adjacent text.

use crate::error::{Error, Result};
use crate::types::JsonValue;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.`
    Dot,
    /// `.a.b`
    Field(Vec<String>),
    /// `$name.a.b`; the bare `$` has an empty name
    Variable(String, Vec<String>),
    /// `.a.b` immediately after a closing paren
    Chain(Vec<String>),
    Ident(String),
    Literal(JsonValue),
    Pipe,
    LParen,
    RParen,
    Declare,
    Assign,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Text(String),
    Action { offset: usize, tokens: Vec<Token> },
}

pub(crate) fn lex(src: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while pos < src.len() {
        let rest = &src[pos..];
        let Some(open) = rest.find("{{") else {
            push_text(&mut items, rest, trim_next, false);
            break;
        };

        let mut start = pos + open + 2;
        let trim_left = is_trim_marker(&src[start..]);
        if trim_left {
            start += 1;
        }
        push_text(&mut items, &rest[..open], trim_next, trim_left);

        let mut lexer = ActionLexer::new(src, start);
        let (tokens, end, trim_right) = lexer.run()?;
        if let Some(tokens) = tokens {
            items.push(Item::Action {
                offset: pos + open,
                tokens,
            });
        }
        pos = end;
        trim_next = trim_right;
    }

    Ok(items)
}

fn is_trim_marker(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct ActionLexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> ActionLexer<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos,
            tokens: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::template_parse(self.pos, message)
    }

    /// Returns the tokens (None for a comment), the offset after `}}` and
    /// whether the close was a trim marker.
    fn run(&mut self) -> Result<(Option<Vec<Token>>, usize, bool)> {
        self.skip_whitespace();
        if self.rest().starts_with("/*") {
            let Some(end) = self.rest().find("*/") else {
                return Err(self.err("unclosed comment"));
            };
            self.pos += end + 2;
            let had_space = self.skip_whitespace();
            let (end, trim) = self.close(had_space)?;
            return Ok((None, end, trim));
        }

        loop {
            let had_space = self.skip_whitespace();
            if self.rest().starts_with("}}")
                || (self.rest().starts_with("-}}") && (had_space || self.tokens.is_empty()))
            {
                let (end, trim) = self.close(had_space || self.tokens.is_empty())?;
                let tokens = std::mem::take(&mut self.tokens);
                return Ok((Some(tokens), end, trim));
            }
            let Some(c) = self.peek() else {
                return Err(self.err("unclosed action"));
            };
            self.token(c)?;
        }
    }

    fn close(&mut self, had_space: bool) -> Result<(usize, bool)> {
        if had_space && self.rest().starts_with("-}}") {
            Ok((self.pos + 3, true))
        } else if self.rest().starts_with("}}") {
            Ok((self.pos + 2, false))
        } else {
            Err(self.err("expected }}"))
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn token(&mut self, c: char) -> Result<()> {
        match c {
            '|' => {
                self.bump();
                self.tokens.push(Token::Pipe);
            }
            '(' => {
                self.bump();
                self.tokens.push(Token::LParen);
            }
            ')' => {
                self.bump();
                self.tokens.push(Token::RParen);
                if self.rest().starts_with('.')
                    && self.rest()[1..].starts_with(is_ident_start)
                {
                    let path = self.path()?;
                    self.tokens.push(Token::Chain(path));
                }
            }
            ',' => {
                self.bump();
                self.tokens.push(Token::Comma);
            }
            ':' => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.err("expected :="));
                }
                self.tokens.push(Token::Declare);
            }
            '=' => {
                self.bump();
                self.tokens.push(Token::Assign);
            }
            '.' => {
                if self.rest()[1..].starts_with(is_ident_start) {
                    let path = self.path()?;
                    self.tokens.push(Token::Field(path));
                } else {
                    self.bump();
                    self.tokens.push(Token::Dot);
                }
            }
            '$' => {
                self.bump();
                let name = self.ident();
                let path = if self.rest().starts_with('.')
                    && self.rest()[1..].starts_with(is_ident_start)
                {
                    self.path()?
                } else {
                    Vec::new()
                };
                self.tokens.push(Token::Variable(name, path));
            }
            '"' => {
                let s = self.quoted()?;
                self.tokens.push(Token::Literal(JsonValue::String(s)));
            }
            '`' => {
                self.bump();
                let Some(end) = self.rest().find('`') else {
                    return Err(self.err("unterminated raw string"));
                };
                let s = self.rest()[..end].to_string();
                self.pos += end + 1;
                self.tokens.push(Token::Literal(JsonValue::String(s)));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let value = self.number()?;
                self.tokens.push(Token::Literal(value));
            }
            c if is_ident_start(c) => {
                let ident = self.ident();
                let token = match ident.as_str() {
                    "true" => Token::Literal(JsonValue::Bool(true)),
                    "false" => Token::Literal(JsonValue::Bool(false)),
                    "nil" => Token::Literal(JsonValue::Null),
                    _ => Token::Ident(ident),
                };
                self.tokens.push(token);
            }
            other => return Err(self.err(format!("unexpected character {other:?} in action"))),
        }
        Ok(())
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    /// `.a.b.c`
    fn path(&mut self) -> Result<Vec<String>> {
        let mut path = Vec::new();
        while self.rest().starts_with('.') {
            self.bump();
            let ident = self.ident();
            if ident.is_empty() {
                return Err(self.err("expected field name after '.'"));
            }
            path.push(ident);
        }
        Ok(path)
    }

    fn quoted(&mut self) -> Result<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('\'') => out.push('\''),
                    Some('u') => {
                        let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                        let c = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.err(format!("invalid unicode escape \\u{hex}")))?;
                        out.push(c);
                    }
                    other => return Err(self.err(format!("unknown escape {other:?}"))),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<JsonValue> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !is_float {
                is_float = true;
                self.bump();
            } else if c == 'e' || c == 'E' {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('-' | '+')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        let text = text.strip_prefix('+').unwrap_or(text);
        if is_float {
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| self.err(format!("invalid number {text}")))
        } else {
            text.parse::<i64>()
                .map(JsonValue::from)
                .map_err(|_| self.err(format!("invalid number {text}")))
        }
    }
}
