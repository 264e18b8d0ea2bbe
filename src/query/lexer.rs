//! Query lexer
//!
//! Produces offset-tagged tokens. String interpolations `\( .. )` are lexed
//! recursively into their own token lists.

use crate::error::{Error, Result};
use crate::types::JsonValue;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `.name` or `."name"`
    Field(String),
    /// `$name`
    Var(String),
    /// Function names and keywords
    Ident(String),
    Number(JsonValue),
    Str(Vec<StrToken>),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Pipe,
    Comma,
    Colon,
    Semicolon,
    Question,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `//`
    Alt,
    /// `=`
    Assign,
    /// `|=`
    Update,
    /// `+=`, `-=`, `*=`, `/=`, `%=`, `//=`; holds the operator token
    UpdateWith(Box<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StrToken {
    Text(String),
    Interp(Vec<Spanned>),
}

pub(crate) type Spanned = (usize, Token);

pub(crate) fn lex(src: &str) -> Result<Vec<Spanned>> {
    let mut lexer = Lexer { src, pos: 0 };
    lexer.tokens(false)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
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

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::query(
            self.src,
            format!("syntax error at offset {}: {}", self.pos, message.into()),
        )
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            if self.peek() != Some('#') {
                return;
            }
            while self.peek().is_some_and(|c| c != '\n') {
                self.bump();
            }
        }
    }

    /// Tokens up to the end of input, or up to the `)` closing an
    /// interpolation when `interp` is set
    fn tokens(&mut self, interp: bool) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                if interp {
                    return Err(self.err("unterminated string interpolation"));
                }
                return Ok(tokens);
            };
            if interp && c == ')' && depth == 0 {
                self.bump();
                return Ok(tokens);
            }
            let token = self.token(c)?;
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            tokens.push((start, token));
        }
    }

    fn token(&mut self, c: char) -> Result<Token> {
        let simple = [
            ("|=", Token::Update),
            ("==", Token::Eq),
            ("!=", Token::Ne),
            ("<=", Token::Le),
            (">=", Token::Ge),
            ("//=", Token::UpdateWith(Box::new(Token::Alt))),
            ("+=", Token::UpdateWith(Box::new(Token::Plus))),
            ("-=", Token::UpdateWith(Box::new(Token::Minus))),
            ("*=", Token::UpdateWith(Box::new(Token::Star))),
            ("/=", Token::UpdateWith(Box::new(Token::Slash))),
            ("%=", Token::UpdateWith(Box::new(Token::Percent))),
            ("//", Token::Alt),
            ("|", Token::Pipe),
            ("(", Token::LParen),
            (")", Token::RParen),
            ("[", Token::LBracket),
            ("]", Token::RBracket),
            ("{", Token::LBrace),
            ("}", Token::RBrace),
            (",", Token::Comma),
            (":", Token::Colon),
            (";", Token::Semicolon),
            ("?", Token::Question),
            ("+", Token::Plus),
            ("-", Token::Minus),
            ("*", Token::Star),
            ("/", Token::Slash),
            ("%", Token::Percent),
            ("=", Token::Assign),
            ("<", Token::Lt),
            (">", Token::Gt),
        ];
        for (text, token) in simple {
            if self.eat(text) {
                return Ok(token);
            }
        }

        match c {
            '.' => {
                self.bump();
                if self.eat(".") {
                    return Ok(Token::DotDot);
                }
                if self.peek().is_some_and(is_ident_start) {
                    return Ok(Token::Field(self.ident()));
                }
                if self.peek() == Some('"') {
                    let parts = self.string()?;
                    return match parts.as_slice() {
                        [] => Ok(Token::Field(String::new())),
                        [StrToken::Text(name)] => Ok(Token::Field(name.clone())),
                        _ => Err(self.err("interpolation is not allowed in a field name")),
                    };
                }
                Ok(Token::Dot)
            }
            '$' => {
                self.bump();
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(self.err("expected variable name after '$'"));
                }
                Ok(Token::Var(self.ident()))
            }
            '"' => Ok(Token::Str(self.string()?)),
            c if c.is_ascii_digit() => self.number(),
            c if is_ident_start(c) => Ok(Token::Ident(self.ident())),
            other => Err(self.err(format!("unexpected character {other:?}"))),
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn string(&mut self) -> Result<Vec<StrToken>> {
        self.bump();
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('b') => text.push('\u{8}'),
                    Some('f') => text.push('\u{c}'),
                    Some('/') => text.push('/'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some('u') => {
                        let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                        let c = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.err(format!("invalid unicode escape \\u{hex}")))?;
                        text.push(c);
                    }
                    Some('(') => {
                        if !text.is_empty() {
                            parts.push(StrToken::Text(std::mem::take(&mut text)));
                        }
                        parts.push(StrToken::Interp(self.tokens(true)?));
                    }
                    other => return Err(self.err(format!("unknown escape {other:?}"))),
                },
                Some(c) => text.push(c),
            }
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(StrToken::Text(text));
        }
        Ok(parts)
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.')
            && self.rest()[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        let value = if is_float {
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
        } else {
            text.parse::<i64>().ok().map(JsonValue::from)
        };
        value
            .map(Token::Number)
            .ok_or_else(|| self.err(format!("invalid number {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_paths_and_operators() {
        assert_eq!(
            kinds(".items[] | .a // 1"),
            vec![
                Token::Field("items".to_string()),
                Token::LBracket,
                Token::RBracket,
                Token::Pipe,
                Token::Field("a".to_string()),
                Token::Alt,
                Token::Number(JsonValue::from(1)),
            ]
        );
        assert_eq!(
            kinds(".\"a b\" |= . + 1"),
            vec![
                Token::Field("a b".to_string()),
                Token::Update,
                Token::Dot,
                Token::Plus,
                Token::Number(JsonValue::from(1)),
            ]
        );
    }

    #[test]
    fn test_interpolation_nests() {
        let tokens = kinds(r#""id-\(.a | tostring)!""#);
        let [Token::Str(parts)] = tokens.as_slice() else {
            panic!("expected one string token");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[1], StrToken::Interp(inner) if inner.len() == 3));
    }

    #[test]
    fn test_comments_and_errors() {
        assert_eq!(kinds(".a # trailing\n"), vec![Token::Field("a".to_string())]);
        assert!(lex("\"open").is_err());
        assert!(lex(".a ^ 1").is_err());
        assert!(lex("$").is_err());
    }
}
