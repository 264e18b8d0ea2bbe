//! Query parser: tokens to an expression tree
//!
//! Precedence, loosest first: `|` (and `as` bindings), `,`, `//`, the
//! assignment operators, `or`, `and`, comparisons, `+ -`, `* / %`, unary
//! minus, then postfix indexing and `?`.

use super::exec;
use super::lexer::{Spanned, StrToken, Token};
use crate::error::{Error, Result};
use crate::types::JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignOp {
    /// `=`
    Set,
    /// `|=`
    Update,
    /// `+=` and friends
    Arith(BinOp),
    /// `//=`
    Alt,
}

#[derive(Debug, Clone)]
pub(crate) enum ObjKey {
    Name(String),
    Var(String),
    Expr(Ast),
}

#[derive(Debug, Clone)]
pub(crate) enum StrPart {
    Text(String),
    Expr(Ast),
}

#[derive(Debug, Clone)]
pub(crate) enum Ast {
    Identity,
    RecurseAll,
    Literal(JsonValue),
    Str(Vec<StrPart>),
    Var(String),
    /// `target[index]`; `.name` is an index with a string literal
    Index(Box<Ast>, Box<Ast>),
    Slice(Box<Ast>, Option<Box<Ast>>, Option<Box<Ast>>),
    Iterate(Box<Ast>),
    Array(Option<Box<Ast>>),
    Object(Vec<(ObjKey, Option<Ast>)>),
    Neg(Box<Ast>),
    Pipe(Box<Ast>, Box<Ast>),
    Comma(Box<Ast>, Box<Ast>),
    Alt(Box<Ast>, Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Binary(BinOp, Box<Ast>, Box<Ast>),
    Assign(AssignOp, Box<Ast>, Box<Ast>),
    /// `source as $name | body`
    Bind(Box<Ast>, String, Box<Ast>),
    Reduce {
        source: Box<Ast>,
        name: String,
        init: Box<Ast>,
        update: Box<Ast>,
    },
    If {
        cond: Box<Ast>,
        then: Box<Ast>,
        otherwise: Option<Box<Ast>>,
    },
    Try(Box<Ast>, Option<Box<Ast>>),
    Call(String, Vec<Ast>),
}

const KEYWORDS: &[&str] = &[
    "as", "and", "or", "if", "then", "elif", "else", "end", "try", "catch", "reduce", "def",
];

pub(crate) fn parse(src: &str, tokens: Vec<Spanned>) -> Result<Ast> {
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        scope: Vec::new(),
    };
    if parser.tokens.is_empty() {
        return Ok(Ast::Identity);
    }
    let ast = parser.pipe()?;
    match parser.peek() {
        None => Ok(ast),
        Some(token) => Err(parser.err(format!("unexpected {token:?}"))),
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Variables bound around the current position
    scope: Vec<String>,
}

fn boxed(ast: Ast) -> Box<Ast> {
    Box::new(ast)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn err(&self, message: impl Into<String>) -> Error {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.src.len(), |(offset, _)| *offset);
        Error::query(
            self.src,
            format!("syntax error at offset {offset}: {}", message.into()),
        )
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err(format!("expected {token:?}")))
        }
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == word)
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.at_keyword(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.err(format!("expected '{word}'")))
        }
    }

    fn expect_var(&mut self) -> Result<String> {
        if let Some(Token::Var(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            return Ok(name);
        }
        Err(self.err("expected a $variable"))
    }

    /// Parse `body` with `name` in scope
    fn scoped<T>(&mut self, name: &str, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope.push(name.to_string());
        let result = body(self);
        self.scope.pop();
        result
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn pipe(&mut self) -> Result<Ast> {
        let lhs = self.comma()?;
        if self.eat_keyword("as") {
            let name = self.expect_var()?;
            self.expect(&Token::Pipe)?;
            let body = self.scoped(&name, Self::pipe)?;
            return Ok(Ast::Bind(boxed(lhs), name, boxed(body)));
        }
        if self.eat(&Token::Pipe) {
            let rhs = self.pipe()?;
            return Ok(Ast::Pipe(boxed(lhs), boxed(rhs)));
        }
        Ok(lhs)
    }

    /// Object values: pipes are allowed, commas end the entry
    fn object_value(&mut self) -> Result<Ast> {
        let lhs = self.alt()?;
        if self.eat(&Token::Pipe) {
            let rhs = self.object_value()?;
            return Ok(Ast::Pipe(boxed(lhs), boxed(rhs)));
        }
        Ok(lhs)
    }

    fn comma(&mut self) -> Result<Ast> {
        let mut lhs = self.alt()?;
        while self.eat(&Token::Comma) {
            let rhs = self.alt()?;
            lhs = Ast::Comma(boxed(lhs), boxed(rhs));
        }
        Ok(lhs)
    }

    fn alt(&mut self) -> Result<Ast> {
        let lhs = self.assign()?;
        if self.eat(&Token::Alt) {
            let rhs = self.alt()?;
            return Ok(Ast::Alt(boxed(lhs), boxed(rhs)));
        }
        Ok(lhs)
    }

    fn assign(&mut self) -> Result<Ast> {
        let lhs = self.or()?;
        let op = match self.peek() {
            Some(Token::Assign) => AssignOp::Set,
            Some(Token::Update) => AssignOp::Update,
            Some(Token::UpdateWith(op)) => match op.as_ref() {
                Token::Alt => AssignOp::Alt,
                other => AssignOp::Arith(arith_op(other).ok_or_else(|| self.err("bad operator"))?),
            },
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.or()?;
        Ok(Ast::Assign(op, boxed(lhs), boxed(rhs)))
    }

    fn or(&mut self) -> Result<Ast> {
        let mut lhs = self.and()?;
        while self.eat_keyword("or") {
            let rhs = self.and()?;
            lhs = Ast::Or(boxed(lhs), boxed(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Ast> {
        let mut lhs = self.compare()?;
        while self.eat_keyword("and") {
            let rhs = self.compare()?;
            lhs = Ast::And(boxed(lhs), boxed(rhs));
        }
        Ok(lhs)
    }

    fn compare(&mut self) -> Result<Ast> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.additive()?;
        Ok(Ast::Binary(op, boxed(lhs), boxed(rhs)))
    }

    fn additive(&mut self) -> Result<Ast> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Ast::Binary(op, boxed(lhs), boxed(rhs));
        }
    }

    fn multiplicative(&mut self) -> Result<Ast> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Ast::Binary(op, boxed(lhs), boxed(rhs));
        }
    }

    fn unary(&mut self) -> Result<Ast> {
        if self.eat(&Token::Minus) {
            return Ok(Ast::Neg(boxed(self.unary()?)));
        }
        self.postfix()
    }

    // ========================================================================
    // Terms
    // ========================================================================

    fn postfix(&mut self) -> Result<Ast> {
        let mut term = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Field(name)) => {
                    let key = Ast::Literal(JsonValue::String(name.clone()));
                    self.pos += 1;
                    term = Ast::Index(boxed(term), boxed(key));
                }
                Some(Token::Dot)
                    if matches!(self.tokens.get(self.pos + 1), Some((_, Token::LBracket))) =>
                {
                    self.pos += 1;
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    term = self.bracket(term)?;
                }
                Some(Token::Question) => {
                    self.pos += 1;
                    term = Ast::Try(boxed(term), None);
                }
                _ => return Ok(term),
            }
        }
    }

    /// After `[`: `[]`, `[e]`, `[e:]`, `[:e]` or `[e:e]`
    fn bracket(&mut self, target: Ast) -> Result<Ast> {
        if self.eat(&Token::RBracket) {
            return Ok(Ast::Iterate(boxed(target)));
        }
        let from = if self.peek() == Some(&Token::Colon) {
            None
        } else {
            Some(boxed(self.pipe()?))
        };
        if self.eat(&Token::Colon) {
            let to = if self.peek() == Some(&Token::RBracket) {
                None
            } else {
                Some(boxed(self.pipe()?))
            };
            self.expect(&Token::RBracket)?;
            if from.is_none() && to.is_none() {
                return Err(self.err("slice needs a bound"));
            }
            return Ok(Ast::Slice(boxed(target), from, to));
        }
        self.expect(&Token::RBracket)?;
        match from {
            Some(index) => Ok(Ast::Index(boxed(target), index)),
            None => Err(self.err("expected an index")),
        }
    }

    fn term(&mut self) -> Result<Ast> {
        let Some(token) = self.next() else {
            return Err(self.err("unexpected end of query"));
        };
        match token {
            Token::Dot => Ok(Ast::Identity),
            Token::DotDot => Ok(Ast::RecurseAll),
            Token::Field(name) => Ok(Ast::Index(
                boxed(Ast::Identity),
                boxed(Ast::Literal(JsonValue::String(name))),
            )),
            Token::Number(n) => Ok(Ast::Literal(n)),
            Token::Str(parts) => self.string(parts),
            Token::Var(name) => {
                if !self.scope.contains(&name) {
                    self.pos -= 1;
                    return Err(self.err(format!("${name} is not defined")));
                }
                Ok(Ast::Var(name))
            }
            Token::LParen => {
                let inner = self.pipe()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                if self.eat(&Token::RBracket) {
                    return Ok(Ast::Array(None));
                }
                let inner = self.pipe()?;
                self.expect(&Token::RBracket)?;
                Ok(Ast::Array(Some(boxed(inner))))
            }
            Token::LBrace => self.object(),
            Token::Ident(word) => self.word(word),
            other => {
                self.pos -= 1;
                Err(self.err(format!("unexpected {other:?}")))
            }
        }
    }

    fn word(&mut self, word: String) -> Result<Ast> {
        match word.as_str() {
            "true" => return Ok(Ast::Literal(JsonValue::Bool(true))),
            "false" => return Ok(Ast::Literal(JsonValue::Bool(false))),
            "null" => return Ok(Ast::Literal(JsonValue::Null)),
            "if" => return self.if_rest(),
            "try" => {
                let body = self.postfix()?;
                let handler = if self.eat_keyword("catch") {
                    Some(boxed(self.postfix()?))
                } else {
                    None
                };
                return Ok(Ast::Try(boxed(body), handler));
            }
            "reduce" => return self.reduce_rest(),
            w if KEYWORDS.contains(&w) => {
                self.pos -= 1;
                return Err(self.err(format!("unexpected keyword '{w}'")));
            }
            _ => {}
        }

        let mut args = Vec::new();
        if self.eat(&Token::LParen) {
            loop {
                args.push(self.pipe()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Semicolon)?;
            }
        }
        if !exec::is_builtin(&word, args.len()) {
            return Err(self.err(format!("{word}/{} is not defined", args.len())));
        }
        Ok(Ast::Call(word, args))
    }

    /// After `if`
    fn if_rest(&mut self) -> Result<Ast> {
        let cond = self.pipe()?;
        self.expect_keyword("then")?;
        let then = self.pipe()?;
        let otherwise = if self.eat_keyword("elif") {
            Some(boxed(self.if_rest()?))
        } else if self.eat_keyword("else") {
            let otherwise = self.pipe()?;
            self.expect_keyword("end")?;
            Some(boxed(otherwise))
        } else {
            self.expect_keyword("end")?;
            None
        };
        Ok(Ast::If {
            cond: boxed(cond),
            then: boxed(then),
            otherwise,
        })
    }

    /// After `reduce`: `SOURCE as $x (INIT; UPDATE)`
    fn reduce_rest(&mut self) -> Result<Ast> {
        let source = self.postfix()?;
        self.expect_keyword("as")?;
        let name = self.expect_var()?;
        self.expect(&Token::LParen)?;
        let init = self.pipe()?;
        self.expect(&Token::Semicolon)?;
        let update = self.scoped(&name, Self::pipe)?;
        self.expect(&Token::RParen)?;
        Ok(Ast::Reduce {
            source: boxed(source),
            name,
            init: boxed(init),
            update: boxed(update),
        })
    }

    fn string(&mut self, parts: Vec<StrToken>) -> Result<Ast> {
        if let [StrToken::Text(text)] = parts.as_slice() {
            return Ok(Ast::Literal(JsonValue::String(text.clone())));
        }
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                StrToken::Text(text) => out.push(StrPart::Text(text)),
                StrToken::Interp(tokens) => out.push(StrPart::Expr(self.nested(tokens)?)),
            }
        }
        Ok(Ast::Str(out))
    }

    /// Parse an interpolation's tokens with the current scope
    fn nested(&mut self, tokens: Vec<Spanned>) -> Result<Ast> {
        let mut inner = Parser {
            src: self.src,
            tokens,
            pos: 0,
            scope: self.scope.clone(),
        };
        let ast = inner.pipe()?;
        match inner.peek() {
            None => Ok(ast),
            Some(token) => Err(inner.err(format!("unexpected {token:?}"))),
        }
    }

    /// After `{`
    fn object(&mut self) -> Result<Ast> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Ast::Object(entries));
        }
        loop {
            let key = match self.next() {
                Some(Token::Ident(name)) => ObjKey::Name(name),
                Some(Token::Var(name)) => {
                    if !self.scope.contains(&name) {
                        self.pos -= 1;
                        return Err(self.err(format!("${name} is not defined")));
                    }
                    ObjKey::Var(name)
                }
                Some(Token::Str(parts)) => match self.string(parts)? {
                    Ast::Literal(JsonValue::String(name)) => ObjKey::Name(name),
                    interpolated => ObjKey::Expr(interpolated),
                },
                Some(Token::LParen) => {
                    let key = self.pipe()?;
                    self.expect(&Token::RParen)?;
                    ObjKey::Expr(key)
                }
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.err("expected an object key"));
                }
            };
            let value = if self.eat(&Token::Colon) {
                Some(self.object_value()?)
            } else if matches!(key, ObjKey::Expr(_)) {
                return Err(self.err("expected ':' after a computed key"));
            } else {
                None
            };
            entries.push((key, value));
            if self.eat(&Token::RBrace) {
                return Ok(Ast::Object(entries));
            }
            self.expect(&Token::Comma)?;
        }
    }
}

fn arith_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::Percent => Some(BinOp::Rem),
        _ => None,
    }
}
