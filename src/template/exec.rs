//! Template executor: walks the node tree against a data value

use super::funcs::{self, to_text, truthy};
use super::parse::{Command, Node, Operand, Pipeline};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// How control leaves a list of nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

pub(crate) fn execute(nodes: &[Node], data: &JsonValue, strict: bool) -> Result<String> {
    let mut exec = Executor {
        vars: vec![(String::new(), data.clone())],
        strict,
        out: String::new(),
    };
    match exec.walk(nodes, data)? {
        Flow::Normal => Ok(exec.out),
        Flow::Break | Flow::Continue => Err(Error::template("break or continue outside range")),
    }
}

struct Executor {
    /// Variable stack; `$` (empty name) is the root
    vars: Vec<(String, JsonValue)>,
    strict: bool,
    out: String,
}

impl Executor {
    fn walk(&mut self, nodes: &[Node], dot: &JsonValue) -> Result<Flow> {
        for node in nodes {
            let flow = match node {
                Node::Text(text) => {
                    self.out.push_str(text);
                    Flow::Normal
                }
                Node::Output(pipe) => {
                    let value = self.eval_pipeline(pipe, dot)?;
                    if pipe.decl.is_empty() {
                        self.out.push_str(&to_text(&value));
                    } else {
                        self.bind(pipe, value)?;
                    }
                    Flow::Normal
                }
                Node::If {
                    branches,
                    otherwise,
                } => self.conditional(branches, otherwise, dot, false)?,
                Node::With {
                    branches,
                    otherwise,
                } => self.conditional(branches, otherwise, dot, true)?,
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => self.range(pipeline, body, otherwise, dot)?,
                Node::Break => Flow::Break,
                Node::Continue => Flow::Continue,
            };
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn scoped(&mut self, nodes: &[Node], dot: &JsonValue, mark: usize) -> Result<Flow> {
        let flow = self.walk(nodes, dot);
        self.vars.truncate(mark);
        flow
    }

    fn conditional(
        &mut self,
        branches: &[(Pipeline, Vec<Node>)],
        otherwise: &[Node],
        dot: &JsonValue,
        is_with: bool,
    ) -> Result<Flow> {
        let mark = self.vars.len();
        for (pipe, body) in branches {
            let value = self.eval_pipeline(pipe, dot)?;
            if !pipe.decl.is_empty() {
                self.bind(pipe, value.clone())?;
            }
            if truthy(&value) {
                let inner = if is_with { &value } else { dot };
                return self.scoped(body, inner, mark);
            }
        }
        self.scoped(otherwise, dot, mark)
    }

    fn range(
        &mut self,
        pipe: &Pipeline,
        body: &[Node],
        otherwise: &[Node],
        dot: &JsonValue,
    ) -> Result<Flow> {
        let value = self.eval_pipeline(pipe, dot)?;
        let entries: Vec<(JsonValue, JsonValue)> = match value {
            JsonValue::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (JsonValue::from(i), v))
                .collect(),
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(k, v)| (JsonValue::String(k), v))
                .collect(),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => {
                let count = n.as_i64().unwrap_or(0).max(0);
                (0..count)
                    .map(|i| (JsonValue::from(i), JsonValue::from(i)))
                    .collect()
            }
            JsonValue::Null => Vec::new(),
            other => return Err(Error::template(format!("range can't iterate over {other}"))),
        };

        let mark = self.vars.len();
        if entries.is_empty() {
            return self.scoped(otherwise, dot, mark);
        }
        for (key, elem) in entries {
            match pipe.decl.as_slice() {
                [] => {}
                [single] => self.vars.push((single.clone(), elem.clone())),
                [k, v, ..] => {
                    self.vars.push((k.clone(), key));
                    self.vars.push((v.clone(), elem.clone()));
                }
            }
            if self.scoped(body, &elem, mark)? == Flow::Break {
                break;
            }
        }
        Ok(Flow::Normal)
    }

    fn bind(&mut self, pipe: &Pipeline, value: JsonValue) -> Result<()> {
        let [name] = pipe.decl.as_slice() else {
            return Err(Error::template("too many declarations in pipeline"));
        };
        if pipe.is_assign {
            let slot = self
                .vars
                .iter_mut()
                .rev()
                .find(|(n, _)| n == name)
                .ok_or_else(|| Error::undefined_var(format!("${name}")))?;
            slot.1 = value;
        } else {
            self.vars.push((name.clone(), value));
        }
        Ok(())
    }

    fn eval_pipeline(&mut self, pipe: &Pipeline, dot: &JsonValue) -> Result<JsonValue> {
        let mut value = None;
        for command in &pipe.commands {
            value = Some(self.eval_command(command, dot, value)?);
        }
        Ok(value.unwrap_or_default())
    }

    fn eval_command(
        &mut self,
        command: &Command,
        dot: &JsonValue,
        piped: Option<JsonValue>,
    ) -> Result<JsonValue> {
        let Some((first, rest)) = command.args.split_first() else {
            return Err(Error::template("empty command"));
        };
        if let Operand::Func(name) = first {
            let mut args = rest
                .iter()
                .map(|arg| self.eval_operand(arg, dot))
                .collect::<Result<Vec<_>>>()?;
            args.extend(piped);
            return call(name, &args);
        }
        if !rest.is_empty() || piped.is_some() {
            return Err(Error::template("can't give argument to non-function"));
        }
        self.eval_operand(first, dot)
    }

    fn eval_operand(&mut self, operand: &Operand, dot: &JsonValue) -> Result<JsonValue> {
        match operand {
            Operand::Dot => Ok(dot.clone()),
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Field(path) => self.field(dot, path),
            Operand::Variable(name, path) => {
                let value = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| Error::undefined_var(format!("${name}")))?;
                self.field(&value, path)
            }
            Operand::Func(name) => call(name, &[]),
            Operand::Sub(pipe, path) => {
                let value = self.eval_pipeline(pipe, dot)?;
                self.field(&value, path)
            }
        }
    }

    /// Follow a `.a.b` path
    fn field(&self, value: &JsonValue, path: &[String]) -> Result<JsonValue> {
        let mut current = value;
        for (i, key) in path.iter().enumerate() {
            current = match current {
                JsonValue::Object(map) => match map.get(key) {
                    Some(v) => v,
                    None if self.strict => {
                        return Err(Error::undefined_var(format!(".{}", path[..=i].join("."))))
                    }
                    None => return Ok(JsonValue::Null),
                },
                JsonValue::Null if self.strict => {
                    return Err(Error::undefined_var(format!(".{}", path[..=i].join("."))))
                }
                JsonValue::Null => return Ok(JsonValue::Null),
                other => {
                    return Err(Error::template(format!(
                        "can't evaluate field {key} in type {}",
                        crate::model::type_name(other)
                    )))
                }
            };
        }
        Ok(current.clone())
    }
}

fn call(name: &str, args: &[JsonValue]) -> Result<JsonValue> {
    let f = funcs::lookup(name)
        .ok_or_else(|| Error::template(format!("function \"{name}\" not defined")))?;
    f(args).map_err(|e| match e {
        Error::Template { message } if !message.starts_with(name) => {
            Error::template(format!("error calling {name}: {message}"))
        }
        other => other,
    })
}
