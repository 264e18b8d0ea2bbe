//! Template parser: items to a node tree

use super::funcs;
use super::lexer::{Item, Token};
use crate::error::{Error, Result};
use crate::types::JsonValue;

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Text(String),
    Output(Pipeline),
    If {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    With {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    Range {
        pipeline: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Break,
    Continue,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Pipeline {
    /// Variables declared (`:=`) or assigned (`=`) by this pipeline
    pub decl: Vec<String>,
    pub is_assign: bool,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub(crate) struct Command {
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone)]
pub(crate) enum Operand {
    Dot,
    Field(Vec<String>),
    Variable(String, Vec<String>),
    Func(String),
    Literal(JsonValue),
    Sub(Box<Pipeline>, Vec<String>),
}

enum Stop {
    Eof,
    End,
    Else(usize, Vec<Token>),
}

pub(crate) fn parse(items: Vec<Item>) -> Result<Vec<Node>> {
    let mut parser = Parser {
        items: items.into_iter(),
    };
    let (nodes, stop) = parser.list(0)?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::End => Err(Error::template_parse(0, "unexpected {{end}}")),
        Stop::Else(offset, _) => Err(Error::template_parse(offset, "unexpected {{else}}")),
    }
}

struct Parser {
    items: std::vec::IntoIter<Item>,
}

impl Parser {
    fn list(&mut self, depth: usize) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let (offset, tokens) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { offset, tokens } => (offset, tokens),
            };

            let keyword = match tokens.first() {
                Some(Token::Ident(name)) => name.as_str(),
                _ => "",
            };
            match keyword {
                "end" => {
                    expect_bare(offset, &tokens, "end")?;
                    return Ok((nodes, Stop::End));
                }
                "else" => return Ok((nodes, Stop::Else(offset, tokens[1..].to_vec()))),
                "if" => nodes.push(self.conditional(offset, &tokens[1..], depth, false)?),
                "with" => nodes.push(self.conditional(offset, &tokens[1..], depth, true)?),
                "range" => nodes.push(self.range(offset, &tokens[1..], depth)?),
                "break" => {
                    expect_bare(offset, &tokens, "break")?;
                    nodes.push(Node::Break);
                }
                "continue" => {
                    expect_bare(offset, &tokens, "continue")?;
                    nodes.push(Node::Continue);
                }
                _ => nodes.push(Node::Output(pipeline(offset, &tokens, true)?)),
            }
        }
        if depth > 0 {
            return Err(Error::template_parse(0, "unexpected EOF, missing {{end}}"));
        }
        Ok((nodes, Stop::Eof))
    }

    fn conditional(
        &mut self,
        offset: usize,
        tokens: &[Token],
        depth: usize,
        is_with: bool,
    ) -> Result<Node> {
        let keyword = if is_with { "with" } else { "if" };
        let mut branches = Vec::new();
        let mut otherwise = Vec::new();
        let mut pipe = pipeline(offset, tokens, true)?;

        loop {
            let (body, stop) = self.list(depth + 1)?;
            branches.push((std::mem::take(&mut pipe), body));
            match stop {
                Stop::End => break,
                Stop::Eof => return unreachable_eof(),
                Stop::Else(offset, rest) => {
                    if rest.is_empty() {
                        let (body, stop) = self.list(depth + 1)?;
                        if !matches!(stop, Stop::End) {
                            return Err(Error::template_parse(
                                offset,
                                format!("expected {{{{end}}}} after {{{{else}}}} in {{{{{keyword}}}}}"),
                            ));
                        }
                        otherwise = body;
                        break;
                    }
                    match rest.first() {
                        Some(Token::Ident(k)) if k == keyword => {
                            pipe = pipeline(offset, &rest[1..], true)?;
                        }
                        _ => {
                            return Err(Error::template_parse(
                                offset,
                                format!("unexpected tokens after else in {{{{{keyword}}}}}"),
                            ))
                        }
                    }
                }
            }
        }

        Ok(if is_with {
            Node::With {
                branches,
                otherwise,
            }
        } else {
            Node::If {
                branches,
                otherwise,
            }
        })
    }

    fn range(&mut self, offset: usize, tokens: &[Token], depth: usize) -> Result<Node> {
        let pipe = pipeline(offset, tokens, true)?;
        if pipe.is_assign || pipe.decl.len() > 2 {
            return Err(Error::template_parse(
                offset,
                "range can only declare one or two variables",
            ));
        }
        let (body, stop) = self.list(depth + 1)?;
        let otherwise = match stop {
            Stop::End => Vec::new(),
            Stop::Eof => return unreachable_eof(),
            Stop::Else(offset, rest) => {
                if !rest.is_empty() {
                    return Err(Error::template_parse(offset, "unexpected tokens after else in range"));
                }
                let (body, stop) = self.list(depth + 1)?;
                if !matches!(stop, Stop::End) {
                    return Err(Error::template_parse(offset, "expected {{end}} after {{else}} in range"));
                }
                body
            }
        };
        Ok(Node::Range {
            pipeline: pipe,
            body,
            otherwise,
        })
    }
}

fn unreachable_eof<T>() -> Result<T> {
    Err(Error::template_parse(0, "unexpected EOF, missing {{end}}"))
}

fn expect_bare(offset: usize, tokens: &[Token], keyword: &str) -> Result<()> {
    if tokens.len() == 1 {
        Ok(())
    } else {
        Err(Error::template_parse(
            offset,
            format!("unexpected tokens after {keyword}"),
        ))
    }
}

/// Parse a full pipeline from an action's tokens
fn pipeline(offset: usize, tokens: &[Token], allow_decl: bool) -> Result<Pipeline> {
    let mut cursor = TokenCursor {
        tokens,
        pos: 0,
        offset,
    };
    let pipe = cursor.pipeline(allow_decl)?;
    if cursor.pos != tokens.len() {
        return Err(Error::template_parse(
            offset,
            format!("unexpected token {:?}", tokens[cursor.pos]),
        ));
    }
    Ok(pipe)
}

struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    offset: usize,
}

impl TokenCursor<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::template_parse(self.offset, message)
    }

    fn pipeline(&mut self, allow_decl: bool) -> Result<Pipeline> {
        let mut pipe = Pipeline::default();
        if allow_decl {
            self.declaration(&mut pipe);
        }

        loop {
            let mut args = Vec::new();
            while let Some(token) = self.peek() {
                if matches!(token, Token::Pipe | Token::RParen) {
                    break;
                }
                args.push(self.operand()?);
            }
            if args.is_empty() {
                return Err(self.err("missing value for command"));
            }
            pipe.commands.push(Command { args });
            if matches!(self.peek(), Some(Token::Pipe)) {
                self.pos += 1;
            } else {
                break;
            }
        }

        for command in pipe.commands.iter().skip(1) {
            if !matches!(command.args.first(), Some(Operand::Func(_))) {
                return Err(self.err("non-function in pipeline position"));
            }
        }
        Ok(pipe)
    }

    /// `$x :=`, `$x =`, `$i, $e :=`
    fn declaration(&mut self, pipe: &mut Pipeline) {
        let mut names = Vec::new();
        let mut pos = self.pos;
        loop {
            match self.tokens.get(pos) {
                Some(Token::Variable(name, path)) if path.is_empty() && !name.is_empty() => {
                    names.push(name.clone());
                    pos += 1;
                }
                _ => return,
            }
            match self.tokens.get(pos) {
                Some(Token::Comma) if names.len() == 1 => pos += 1,
                Some(Token::Declare) => {
                    pipe.decl = names;
                    self.pos = pos + 1;
                    return;
                }
                Some(Token::Assign) => {
                    pipe.decl = names;
                    pipe.is_assign = true;
                    self.pos = pos + 1;
                    return;
                }
                _ => return,
            }
        }
    }

    fn operand(&mut self) -> Result<Operand> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(self.err("unexpected end of action"));
        };
        self.pos += 1;
        let operand = match token {
            Token::Dot => Operand::Dot,
            Token::Field(path) => Operand::Field(path),
            Token::Variable(name, path) => Operand::Variable(name, path),
            Token::Literal(value) => Operand::Literal(value),
            Token::Ident(name) => {
                if funcs::lookup(&name).is_none() {
                    return Err(self.err(format!("function \"{name}\" not defined")));
                }
                Operand::Func(name)
            }
            Token::LParen => {
                let inner = self.pipeline(false)?;
                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(self.err("unclosed left paren"));
                }
                self.pos += 1;
                let path = match self.peek() {
                    Some(Token::Chain(path)) => {
                        let path = path.clone();
                        self.pos += 1;
                        path
                    }
                    _ => Vec::new(),
                };
                Operand::Sub(Box::new(inner), path)
            }
            other => return Err(self.err(format!("unexpected token {other:?}"))),
        };
        Ok(operand)
    }
}
