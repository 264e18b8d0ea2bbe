//! Query evaluation
//!
//! Every expression maps one input to a list of outputs. Runtime errors are
//! JSON values so `try .. catch` can hand them to the handler.

use super::parse::{AssignOp, Ast, BinOp, ObjKey, StrPart};
use crate::types::{JsonObject, JsonValue};
use regex::Regex;
use std::cmp::Ordering;

/// A runtime error raised by a query
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fault(pub(crate) JsonValue);

impl Fault {
    fn msg(message: impl Into<String>) -> Self {
        Self(JsonValue::String(message.into()))
    }

    pub(crate) fn message(&self) -> String {
        match &self.0 {
            JsonValue::String(s) => s.clone(),
            other => format!("{other} (not a string)"),
        }
    }
}

pub(crate) type Outputs = Result<Vec<JsonValue>, Fault>;
type Value = Result<JsonValue, Fault>;
type PathValue = (Vec<JsonValue>, JsonValue);

/// Variable bindings, innermost first
#[derive(Clone, Copy)]
pub(crate) enum Env<'a> {
    Root,
    Bound(&'a str, &'a JsonValue, &'a Env<'a>),
}

impl Env<'_> {
    fn get(&self, name: &str) -> Option<&JsonValue> {
        match self {
            Env::Root => None,
            Env::Bound(n, v, _) if *n == name => Some(*v),
            Env::Bound(_, _, parent) => parent.get(name),
        }
    }
}

// ============================================================================
// Builtins
// ============================================================================

const BUILTINS: &[(&str, usize)] = &[
    ("empty", 0),
    ("error", 0),
    ("error", 1),
    ("not", 0),
    ("length", 0),
    ("keys", 0),
    ("keys_unsorted", 0),
    ("values", 0),
    ("has", 1),
    ("in", 1),
    ("contains", 1),
    ("inside", 1),
    ("map", 1),
    ("map_values", 1),
    ("select", 1),
    ("recurse", 0),
    ("recurse", 1),
    ("type", 0),
    ("tostring", 0),
    ("tonumber", 0),
    ("tojson", 0),
    ("fromjson", 0),
    ("ascii_downcase", 0),
    ("ascii_upcase", 0),
    ("ltrimstr", 1),
    ("rtrimstr", 1),
    ("trim", 0),
    ("ltrim", 0),
    ("rtrim", 0),
    ("startswith", 1),
    ("endswith", 1),
    ("split", 1),
    ("join", 1),
    ("test", 1),
    ("add", 0),
    ("any", 0),
    ("any", 1),
    ("all", 0),
    ("all", 1),
    ("range", 1),
    ("range", 2),
    ("floor", 0),
    ("ceil", 0),
    ("round", 0),
    ("sqrt", 0),
    ("abs", 0),
    ("min", 0),
    ("max", 0),
    ("min_by", 1),
    ("max_by", 1),
    ("sort", 0),
    ("sort_by", 1),
    ("group_by", 1),
    ("unique", 0),
    ("unique_by", 1),
    ("reverse", 0),
    ("first", 0),
    ("first", 1),
    ("last", 0),
    ("last", 1),
    ("limit", 2),
    ("isempty", 1),
    ("to_entries", 0),
    ("from_entries", 0),
    ("with_entries", 1),
    ("objects", 0),
    ("arrays", 0),
    ("strings", 0),
    ("numbers", 0),
    ("booleans", 0),
    ("nulls", 0),
    ("iterables", 0),
    ("scalars", 0),
    ("paths", 0),
    ("path", 1),
    ("getpath", 1),
    ("setpath", 2),
    ("delpaths", 1),
    ("del", 1),
];

pub(crate) fn is_builtin(name: &str, arity: usize) -> bool {
    BUILTINS.contains(&(name, arity))
}

// ============================================================================
// Values
// ============================================================================

pub(crate) fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn truthy(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Null | JsonValue::Bool(false))
}

fn as_f64(n: &serde_json::Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

/// Whole numbers come back as integers, NaN and infinities as null
fn from_f64(f: f64) -> JsonValue {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        JsonValue::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
    }
}

fn to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total order: null < false < true < numbers < strings < arrays < objects
pub(crate) fn compare_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(value: &JsonValue) -> u8 {
        match value {
            JsonValue::Null => 0,
            JsonValue::Bool(false) => 1,
            JsonValue::Bool(true) => 2,
            JsonValue::Number(_) => 3,
            JsonValue::String(_) => 4,
            JsonValue::Array(_) => 5,
            JsonValue::Object(_) => 6,
        }
    }
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => as_f64(x)
            .partial_cmp(&as_f64(y))
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(p, q)| compare_json(p, q))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            let mut xk: Vec<&String> = x.keys().collect();
            let mut yk: Vec<&String> = y.keys().collect();
            xk.sort();
            yk.sort();
            xk.cmp(&yk).then_with(|| {
                xk.iter()
                    .map(|k| compare_json(&x[k.as_str()], &y[k.as_str()]))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn describe_index(index: &JsonValue) -> String {
    match index {
        JsonValue::String(s) => format!("\"{s}\""),
        other => type_name(other).to_string(),
    }
}

/// Array position for a possibly negative index
fn resolve_index(n: &serde_json::Number, len: usize) -> Option<usize> {
    let i = as_f64(n).floor() as i64;
    let i = if i < 0 { len as i64 + i } else { i };
    usize::try_from(i).ok()
}

fn index_value(target: &JsonValue, index: &JsonValue) -> Value {
    match (target, index) {
        (JsonValue::Null, JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Null) => {
            Ok(JsonValue::Null)
        }
        (JsonValue::Object(map), JsonValue::String(key)) => {
            Ok(map.get(key).cloned().unwrap_or(JsonValue::Null))
        }
        (JsonValue::Array(items), JsonValue::Number(n)) => Ok(resolve_index(n, items.len())
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(JsonValue::Null)),
        _ => Err(Fault::msg(format!(
            "Cannot index {} with {}",
            type_name(target),
            describe_index(index)
        ))),
    }
}

fn slice_value(target: &JsonValue, from: &JsonValue, to: &JsonValue) -> Value {
    let bounds = |len: usize| -> Result<(usize, usize), Fault> {
        let clamp = |bound: &JsonValue, default: usize| match bound {
            JsonValue::Null => Ok(default),
            JsonValue::Number(n) => {
                let i = as_f64(n).floor() as i64;
                let len = len as i64;
                let i = if i < 0 { (len + i).max(0) } else { i.min(len) };
                Ok(i as usize)
            }
            _ => Err(Fault::msg("Start and end indices of a slice must be numbers")),
        };
        let start = clamp(from, 0)?;
        let end = clamp(to, len)?.max(start);
        Ok((start, end))
    };
    match target {
        JsonValue::Null => Ok(JsonValue::Null),
        JsonValue::Array(items) => {
            let (start, end) = bounds(items.len())?;
            Ok(JsonValue::Array(items[start..end].to_vec()))
        }
        JsonValue::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = bounds(chars.len())?;
            Ok(JsonValue::String(chars[start..end].iter().collect()))
        }
        other => Err(Fault::msg(format!("Cannot slice {}", type_name(other)))),
    }
}

fn iterate(value: &JsonValue) -> Outputs {
    match value {
        JsonValue::Array(items) => Ok(items.clone()),
        JsonValue::Object(map) => Ok(map.values().cloned().collect()),
        other => Err(Fault::msg(format!("Cannot iterate over {}", type_name(other)))),
    }
}

fn binary(op: BinOp, l: &JsonValue, r: &JsonValue) -> Value {
    use serde_json::Value::{Array, Bool, Null, Number, Object, String};

    let fail = |verb: &str| -> Value {
        Err(Fault::msg(format!(
            "{} ({l}) and {} ({r}) cannot be {verb}",
            type_name(l),
            type_name(r)
        )))
    };
    match op {
        BinOp::Eq => return Ok(Bool(compare_json(l, r).is_eq())),
        BinOp::Ne => return Ok(Bool(compare_json(l, r).is_ne())),
        BinOp::Lt => return Ok(Bool(compare_json(l, r).is_lt())),
        BinOp::Le => return Ok(Bool(compare_json(l, r).is_le())),
        BinOp::Gt => return Ok(Bool(compare_json(l, r).is_gt())),
        BinOp::Ge => return Ok(Bool(compare_json(l, r).is_ge())),
        _ => {}
    }
    match (op, l, r) {
        (BinOp::Add, Null, other) | (BinOp::Add, other, Null) => Ok(other.clone()),
        (BinOp::Add, Number(a), Number(b)) => Ok(match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x
                .checked_add(y)
                .map_or_else(|| from_f64(as_f64(a) + as_f64(b)), JsonValue::from),
            _ => from_f64(as_f64(a) + as_f64(b)),
        }),
        (BinOp::Add, String(a), String(b)) => Ok(String(format!("{a}{b}"))),
        (BinOp::Add, Array(a), Array(b)) => Ok(Array(a.iter().chain(b).cloned().collect())),
        (BinOp::Add, Object(a), Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Ok(Object(merged))
        }
        (BinOp::Add, ..) => fail("added"),
        (BinOp::Sub, Number(a), Number(b)) => Ok(match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x
                .checked_sub(y)
                .map_or_else(|| from_f64(as_f64(a) - as_f64(b)), JsonValue::from),
            _ => from_f64(as_f64(a) - as_f64(b)),
        }),
        (BinOp::Sub, Array(a), Array(b)) => Ok(Array(
            a.iter()
                .filter(|x| !b.iter().any(|y| compare_json(x, y).is_eq()))
                .cloned()
                .collect(),
        )),
        (BinOp::Sub, ..) => fail("subtracted"),
        (BinOp::Mul, Number(a), Number(b)) => Ok(from_f64(as_f64(a) * as_f64(b))),
        (BinOp::Mul, String(s), Number(n)) | (BinOp::Mul, Number(n), String(s)) => {
            let times = as_f64(n);
            if times <= 0.0 {
                Ok(Null)
            } else {
                Ok(String(s.repeat(times.ceil() as usize)))
            }
        }
        (BinOp::Mul, Object(a), Object(b)) => Ok(Object(deep_merge(a.clone(), b))),
        (BinOp::Mul, ..) => fail("multiplied"),
        (BinOp::Div, Number(a), Number(b)) => {
            if as_f64(b) == 0.0 {
                return fail("divided because the divisor is zero");
            }
            Ok(from_f64(as_f64(a) / as_f64(b)))
        }
        (BinOp::Div, String(a), String(b)) => Ok(split_string(a, b)),
        (BinOp::Div, ..) => fail("divided"),
        (BinOp::Rem, Number(a), Number(b)) => {
            let divisor = as_f64(b) as i64;
            if divisor == 0 {
                return fail("divided because the divisor is zero");
            }
            Ok(JsonValue::from((as_f64(a) as i64).wrapping_rem(divisor)))
        }
        (BinOp::Rem, ..) => fail("divided"),
        _ => fail("compared"),
    }
}

fn deep_merge(mut base: JsonObject, overlay: &JsonObject) -> JsonObject {
    for (key, value) in overlay {
        let merged = match (base.get_mut(key), value) {
            (Some(JsonValue::Object(inner)), JsonValue::Object(other)) => {
                JsonValue::Object(deep_merge(std::mem::take(inner), other))
            }
            _ => value.clone(),
        };
        base.insert(key.clone(), merged);
    }
    base
}

fn split_string(s: &str, sep: &str) -> JsonValue {
    if s.is_empty() {
        return JsonValue::Array(Vec::new());
    }
    let parts: Vec<JsonValue> = if sep.is_empty() {
        s.chars().map(|c| JsonValue::String(c.to_string())).collect()
    } else {
        s.split(sep).map(|p| JsonValue::String(p.to_string())).collect()
    };
    JsonValue::Array(parts)
}

// ============================================================================
// Evaluation
// ============================================================================

pub(crate) fn eval(ast: &Ast, input: &JsonValue, env: &Env<'_>) -> Outputs {
    match ast {
        Ast::Identity => Ok(vec![input.clone()]),
        Ast::RecurseAll => {
            let mut out = Vec::new();
            recurse_all(input, &mut out);
            Ok(out)
        }
        Ast::Literal(value) => Ok(vec![value.clone()]),
        Ast::Str(parts) => interpolate(parts, input, env),
        Ast::Var(name) => env
            .get(name)
            .map(|v| vec![v.clone()])
            .ok_or_else(|| Fault::msg(format!("${name} is not defined"))),
        Ast::Index(target, index) => {
            let indexes = eval(index, input, env)?;
            let mut out = Vec::new();
            for t in eval(target, input, env)? {
                for i in &indexes {
                    out.push(index_value(&t, i)?);
                }
            }
            Ok(out)
        }
        Ast::Slice(target, from, to) => {
            let bound = |b: &Option<Box<Ast>>| match b {
                Some(b) => eval(b, input, env),
                None => Ok(vec![JsonValue::Null]),
            };
            let (froms, tos) = (bound(from)?, bound(to)?);
            let mut out = Vec::new();
            for t in eval(target, input, env)? {
                for to in &tos {
                    for from in &froms {
                        out.push(slice_value(&t, from, to)?);
                    }
                }
            }
            Ok(out)
        }
        Ast::Iterate(target) => {
            let mut out = Vec::new();
            for t in eval(target, input, env)? {
                out.extend(iterate(&t)?);
            }
            Ok(out)
        }
        Ast::Array(None) => Ok(vec![JsonValue::Array(Vec::new())]),
        Ast::Array(Some(inner)) => Ok(vec![JsonValue::Array(eval(inner, input, env)?)]),
        Ast::Object(entries) => build_object(entries, input, env),
        Ast::Neg(inner) => eval(inner, input, env)?
            .iter()
            .map(|v| match v {
                JsonValue::Number(n) => Ok(from_f64(-as_f64(n))),
                other => Err(Fault::msg(format!(
                    "{} ({other}) cannot be negated",
                    type_name(other)
                ))),
            })
            .collect(),
        Ast::Pipe(lhs, rhs) => {
            let mut out = Vec::new();
            for v in eval(lhs, input, env)? {
                out.extend(eval(rhs, &v, env)?);
            }
            Ok(out)
        }
        Ast::Comma(lhs, rhs) => {
            let mut out = eval(lhs, input, env)?;
            out.extend(eval(rhs, input, env)?);
            Ok(out)
        }
        Ast::Alt(lhs, rhs) => {
            let left: Vec<JsonValue> = eval(lhs, input, env)
                .unwrap_or_default()
                .into_iter()
                .filter(truthy)
                .collect();
            if left.is_empty() {
                eval(rhs, input, env)
            } else {
                Ok(left)
            }
        }
        Ast::And(lhs, rhs) | Ast::Or(lhs, rhs) => {
            let is_and = matches!(ast, Ast::And(..));
            let mut out = Vec::new();
            for l in eval(lhs, input, env)? {
                if truthy(&l) != is_and {
                    out.push(JsonValue::Bool(!is_and));
                    continue;
                }
                for r in eval(rhs, input, env)? {
                    out.push(JsonValue::Bool(truthy(&r)));
                }
            }
            Ok(out)
        }
        Ast::Binary(op, lhs, rhs) => {
            let lefts = eval(lhs, input, env)?;
            let mut out = Vec::new();
            for r in eval(rhs, input, env)? {
                for l in &lefts {
                    out.push(binary(*op, l, &r)?);
                }
            }
            Ok(out)
        }
        Ast::Assign(op, lhs, rhs) => assign(*op, lhs, rhs, input, env),
        Ast::Bind(source, name, body) => {
            let mut out = Vec::new();
            for v in eval(source, input, env)? {
                let scope = Env::Bound(name, &v, env);
                out.extend(eval(body, input, &scope)?);
            }
            Ok(out)
        }
        Ast::Reduce {
            source,
            name,
            init,
            update,
        } => {
            let items = eval(source, input, env)?;
            let mut out = Vec::new();
            for mut acc in eval(init, input, env)? {
                for item in &items {
                    let scope = Env::Bound(name, item, env);
                    acc = eval(update, &acc, &scope)?
                        .pop()
                        .unwrap_or(JsonValue::Null);
                }
                out.push(acc);
            }
            Ok(out)
        }
        Ast::If {
            cond,
            then,
            otherwise,
        } => {
            let mut out = Vec::new();
            for c in eval(cond, input, env)? {
                if truthy(&c) {
                    out.extend(eval(then, input, env)?);
                } else if let Some(otherwise) = otherwise {
                    out.extend(eval(otherwise, input, env)?);
                } else {
                    out.push(input.clone());
                }
            }
            Ok(out)
        }
        Ast::Try(body, handler) => match eval(body, input, env) {
            Ok(out) => Ok(out),
            Err(fault) => match handler {
                Some(handler) => eval(handler, &fault.0, env),
                None => Ok(Vec::new()),
            },
        },
        Ast::Call(name, args) => call(name, args, input, env),
    }
}

fn recurse_all(value: &JsonValue, out: &mut Vec<JsonValue>) {
    out.push(value.clone());
    match value {
        JsonValue::Array(items) => items.iter().for_each(|v| recurse_all(v, out)),
        JsonValue::Object(map) => map.values().for_each(|v| recurse_all(v, out)),
        _ => {}
    }
}

fn recurse_with(f: &Ast, value: &JsonValue, env: &Env<'_>, out: &mut Vec<JsonValue>) -> Result<(), Fault> {
    out.push(value.clone());
    for child in eval(f, value, env)? {
        recurse_with(f, &child, env, out)?;
    }
    Ok(())
}

fn interpolate(parts: &[StrPart], input: &JsonValue, env: &Env<'_>) -> Outputs {
    let mut strings = vec![String::new()];
    for part in parts {
        match part {
            StrPart::Text(text) => strings.iter_mut().for_each(|s| s.push_str(text)),
            StrPart::Expr(expr) => {
                let values = eval(expr, input, env)?;
                strings = strings
                    .iter()
                    .flat_map(|s| values.iter().map(move |v| format!("{s}{}", to_text(v))))
                    .collect();
            }
        }
    }
    Ok(strings.into_iter().map(JsonValue::String).collect())
}

fn build_object(entries: &[(ObjKey, Option<Ast>)], input: &JsonValue, env: &Env<'_>) -> Outputs {
    let mut objects = vec![JsonObject::new()];
    for (key, value) in entries {
        let keys = match key {
            ObjKey::Name(name) | ObjKey::Var(name) => vec![name.clone()],
            ObjKey::Expr(expr) => eval(expr, input, env)?
                .into_iter()
                .map(|k| match k {
                    JsonValue::String(s) => Ok(s),
                    other => Err(Fault::msg(format!(
                        "Object keys must be strings, got {}",
                        type_name(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        let values = match (key, value) {
            (_, Some(value)) => eval(value, input, env)?,
            (ObjKey::Var(name), None) => eval(&Ast::Var(name.clone()), input, env)?,
            (ObjKey::Name(name), None) => {
                vec![index_value(input, &JsonValue::String(name.clone()))?]
            }
            (ObjKey::Expr(_), None) => return Err(Fault::msg("computed object key needs a value")),
        };
        let mut next = Vec::with_capacity(objects.len() * keys.len() * values.len());
        for object in &objects {
            for k in &keys {
                for v in &values {
                    let mut object = object.clone();
                    object.insert(k.clone(), v.clone());
                    next.push(object);
                }
            }
        }
        objects = next;
    }
    Ok(objects.into_iter().map(JsonValue::Object).collect())
}

// ============================================================================
// Paths
// ============================================================================

fn eval_paths(ast: &Ast, current: &PathValue, env: &Env<'_>) -> Result<Vec<PathValue>, Fault> {
    let (path, value) = current;
    let extend = |p: &[JsonValue], key: JsonValue| {
        let mut p = p.to_vec();
        p.push(key);
        p
    };
    match ast {
        Ast::Identity => Ok(vec![current.clone()]),
        Ast::RecurseAll => {
            let mut out = Vec::new();
            recurse_paths(current, &mut out);
            Ok(out)
        }
        Ast::Literal(JsonValue::Null) => Ok(vec![(path.clone(), JsonValue::Null)]),
        Ast::Index(target, index) => {
            let indexes = eval(index, value, env)?;
            let mut out = Vec::new();
            for (p, v) in eval_paths(target, current, env)? {
                for i in &indexes {
                    out.push((extend(&p, i.clone()), index_value(&v, i)?));
                }
            }
            Ok(out)
        }
        Ast::Iterate(target) => {
            let mut out = Vec::new();
            for (p, v) in eval_paths(target, current, env)? {
                match &v {
                    JsonValue::Array(items) => {
                        for (i, item) in items.iter().enumerate() {
                            out.push((extend(&p, JsonValue::from(i)), item.clone()));
                        }
                    }
                    JsonValue::Object(map) => {
                        for (k, item) in map {
                            out.push((extend(&p, JsonValue::String(k.clone())), item.clone()));
                        }
                    }
                    JsonValue::Null => {}
                    other => {
                        return Err(Fault::msg(format!(
                            "Cannot iterate over {}",
                            type_name(other)
                        )))
                    }
                }
            }
            Ok(out)
        }
        Ast::Pipe(lhs, rhs) => {
            let mut out = Vec::new();
            for pv in eval_paths(lhs, current, env)? {
                out.extend(eval_paths(rhs, &pv, env)?);
            }
            Ok(out)
        }
        Ast::Comma(lhs, rhs) => {
            let mut out = eval_paths(lhs, current, env)?;
            out.extend(eval_paths(rhs, current, env)?);
            Ok(out)
        }
        Ast::Try(body, None) => Ok(eval_paths(body, current, env).unwrap_or_default()),
        Ast::If {
            cond,
            then,
            otherwise,
        } => {
            let mut out = Vec::new();
            for c in eval(cond, value, env)? {
                if truthy(&c) {
                    out.extend(eval_paths(then, current, env)?);
                } else if let Some(otherwise) = otherwise {
                    out.extend(eval_paths(otherwise, current, env)?);
                } else {
                    out.push(current.clone());
                }
            }
            Ok(out)
        }
        Ast::Alt(lhs, rhs) => {
            let left: Vec<PathValue> = eval_paths(lhs, current, env)
                .unwrap_or_default()
                .into_iter()
                .filter(|(_, v)| truthy(v))
                .collect();
            if left.is_empty() {
                eval_paths(rhs, current, env)
            } else {
                Ok(left)
            }
        }
        Ast::Bind(source, name, body) => {
            let mut out = Vec::new();
            for v in eval(source, value, env)? {
                let scope = Env::Bound(name, &v, env);
                out.extend(eval_paths(body, current, &scope)?);
            }
            Ok(out)
        }
        Ast::Call(name, args) => match (name.as_str(), args.as_slice()) {
            ("empty", []) => Ok(Vec::new()),
            ("select", [f]) => Ok(eval(f, value, env)?
                .iter()
                .filter(|c| truthy(c))
                .map(|_| current.clone())
                .collect()),
            ("recurse", []) => {
                let mut out = Vec::new();
                recurse_paths(current, &mut out);
                Ok(out)
            }
            ("first", [f]) => Ok(eval_paths(f, current, env)?.into_iter().take(1).collect()),
            ("last", [f]) => Ok(eval_paths(f, current, env)?.pop().into_iter().collect()),
            ("getpath", [p]) => {
                let mut out = Vec::new();
                for p in eval(p, value, env)? {
                    let JsonValue::Array(keys) = p else {
                        return Err(Fault::msg("Path must be specified as an array"));
                    };
                    let v = get_path(value, &keys)?;
                    let mut full = path.clone();
                    full.extend(keys);
                    out.push((full, v));
                }
                Ok(out)
            }
            _ => Err(Fault::msg(format!("Invalid path expression with {name}"))),
        },
        _ => Err(Fault::msg("Invalid path expression")),
    }
}

fn recurse_paths(current: &PathValue, out: &mut Vec<PathValue>) {
    out.push(current.clone());
    let (path, value) = current;
    let child = |key: JsonValue, v: &JsonValue| {
        let mut p = path.clone();
        p.push(key);
        (p, v.clone())
    };
    match value {
        JsonValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                recurse_paths(&child(JsonValue::from(i), item), out);
            }
        }
        JsonValue::Object(map) => {
            for (k, item) in map {
                recurse_paths(&child(JsonValue::String(k.clone()), item), out);
            }
        }
        _ => {}
    }
}

fn get_path(value: &JsonValue, path: &[JsonValue]) -> Value {
    path.iter()
        .try_fold(value.clone(), |current, key| index_value(&current, key))
}

fn set_path(target: JsonValue, path: &[JsonValue], new: JsonValue) -> Value {
    let Some((key, rest)) = path.split_first() else {
        return Ok(new);
    };
    match (target, key) {
        (JsonValue::Null, JsonValue::String(k)) => {
            let mut map = JsonObject::new();
            map.insert(k.clone(), set_path(JsonValue::Null, rest, new)?);
            Ok(JsonValue::Object(map))
        }
        (JsonValue::Object(mut map), JsonValue::String(k)) => {
            let slot = map.entry(k.clone()).or_insert(JsonValue::Null);
            *slot = set_path(std::mem::take(slot), rest, new)?;
            Ok(JsonValue::Object(map))
        }
        (target @ (JsonValue::Null | JsonValue::Array(_)), JsonValue::Number(n)) => {
            let mut items = match target {
                JsonValue::Array(items) => items,
                _ => Vec::new(),
            };
            let Some(i) = resolve_index(n, items.len()) else {
                return Err(Fault::msg("Out of bounds negative array index"));
            };
            if i >= items.len() {
                items.resize(i + 1, JsonValue::Null);
            }
            items[i] = set_path(std::mem::take(&mut items[i]), rest, new)?;
            Ok(JsonValue::Array(items))
        }
        (target, key) => Err(Fault::msg(format!(
            "Cannot index {} with {}",
            type_name(&target),
            describe_index(key)
        ))),
    }
}

fn delete_path(target: JsonValue, path: &[JsonValue]) -> Value {
    let Some((key, rest)) = path.split_first() else {
        return Ok(JsonValue::Null);
    };
    match (target, key) {
        (JsonValue::Null, _) => Ok(JsonValue::Null),
        (JsonValue::Object(mut map), JsonValue::String(k)) => {
            if rest.is_empty() {
                map.shift_remove(k);
            } else if let Some(slot) = map.get_mut(k) {
                *slot = delete_path(std::mem::take(slot), rest)?;
            }
            Ok(JsonValue::Object(map))
        }
        (JsonValue::Array(mut items), JsonValue::Number(n)) => {
            if let Some(i) = resolve_index(n, items.len()).filter(|i| *i < items.len()) {
                if rest.is_empty() {
                    items.remove(i);
                } else {
                    items[i] = delete_path(std::mem::take(&mut items[i]), rest)?;
                }
            }
            Ok(JsonValue::Array(items))
        }
        (target, key) => Err(Fault::msg(format!(
            "Cannot delete field at {} of {}",
            describe_index(key),
            type_name(&target)
        ))),
    }
}

/// Deepest and last paths go first so earlier array indexes stay valid
fn delete_paths(root: JsonValue, mut paths: Vec<Vec<JsonValue>>) -> Value {
    paths.sort_by(|a, b| compare_json(&JsonValue::Array(b.clone()), &JsonValue::Array(a.clone())));
    paths.dedup();
    paths
        .iter()
        .try_fold(root, |root, path| delete_path(root, path))
}

fn update_paths(
    lhs: &Ast,
    input: &JsonValue,
    env: &Env<'_>,
    mut f: impl FnMut(&JsonValue) -> Result<Option<JsonValue>, Fault>,
) -> Value {
    let mut root = input.clone();
    let mut removed = Vec::new();
    for (path, _) in eval_paths(lhs, &(Vec::new(), input.clone()), env)? {
        let current = get_path(&root, &path)?;
        match f(&current)? {
            Some(new) => root = set_path(root, &path, new)?,
            None => removed.push(path),
        }
    }
    delete_paths(root, removed)
}

fn assign(op: AssignOp, lhs: &Ast, rhs: &Ast, input: &JsonValue, env: &Env<'_>) -> Outputs {
    if op == AssignOp::Update {
        let updated = update_paths(lhs, input, env, |v| Ok(eval(rhs, v, env)?.into_iter().next()))?;
        return Ok(vec![updated]);
    }
    let mut out = Vec::new();
    for r in eval(rhs, input, env)? {
        let updated = update_paths(lhs, input, env, |v| {
            Ok(Some(match op {
                AssignOp::Arith(bop) => binary(bop, v, &r)?,
                AssignOp::Alt if truthy(v) => v.clone(),
                _ => r.clone(),
            }))
        })?;
        out.push(updated);
    }
    Ok(out)
}

// ============================================================================
// Function calls
// ============================================================================

fn array_of<'v>(name: &str, value: &'v JsonValue) -> Result<&'v Vec<JsonValue>, Fault> {
    match value {
        JsonValue::Array(items) => Ok(items),
        other => Err(Fault::msg(format!(
            "Cannot apply {name} to {} ({other})",
            type_name(other)
        ))),
    }
}

fn string_of<'v>(name: &str, value: &'v JsonValue) -> Result<&'v str, Fault> {
    match value {
        JsonValue::String(s) => Ok(s),
        other => Err(Fault::msg(format!(
            "{name} input must be a string, got {} ({other})",
            type_name(other)
        ))),
    }
}

fn number_of(name: &str, value: &JsonValue) -> Result<f64, Fault> {
    match value {
        JsonValue::Number(n) => Ok(as_f64(n)),
        other => Err(Fault::msg(format!(
            "{} ({other}) number required for {name}",
            type_name(other)
        ))),
    }
}

fn length(value: &JsonValue) -> Value {
    Ok(match value {
        JsonValue::Null => JsonValue::from(0),
        JsonValue::Bool(_) => {
            return Err(Fault::msg(format!("boolean ({value}) has no length")));
        }
        JsonValue::Number(n) => from_f64(as_f64(n).abs()),
        JsonValue::String(s) => JsonValue::from(s.chars().count()),
        JsonValue::Array(items) => JsonValue::from(items.len()),
        JsonValue::Object(map) => JsonValue::from(map.len()),
    })
}

fn keys(value: &JsonValue, sorted: bool) -> Value {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            if sorted {
                keys.sort();
            }
            Ok(JsonValue::Array(
                keys.into_iter().map(|k| JsonValue::String(k.clone())).collect(),
            ))
        }
        JsonValue::Array(items) => Ok(JsonValue::Array((0..items.len()).map(JsonValue::from).collect())),
        other => Err(Fault::msg(format!("{} ({other}) has no keys", type_name(other)))),
    }
}

fn has(value: &JsonValue, key: &JsonValue) -> Value {
    match (value, key) {
        (JsonValue::Object(map), JsonValue::String(k)) => Ok(JsonValue::Bool(map.contains_key(k))),
        (JsonValue::Array(items), JsonValue::Number(n)) => {
            let i = as_f64(n);
            Ok(JsonValue::Bool(i >= 0.0 && (i as usize) < items.len()))
        }
        _ => Err(Fault::msg(format!(
            "Cannot check whether {} has a {} key",
            type_name(value),
            type_name(key)
        ))),
    }
}

fn contains(a: &JsonValue, b: &JsonValue) -> Result<bool, Fault> {
    match (a, b) {
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            for (k, bv) in y {
                let Some(av) = x.get(k) else {
                    return Ok(false);
                };
                if !contains(av, bv)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            for bv in y {
                let mut found = false;
                for av in x {
                    if contains(av, bv)? {
                        found = true;
                        break;
                    }
                }
                if !found {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (JsonValue::String(x), JsonValue::String(y)) => Ok(x.contains(y.as_str())),
        _ if type_name(a) == type_name(b) => Ok(compare_json(a, b).is_eq()),
        _ => Err(Fault::msg(format!(
            "{} ({a}) and {} ({b}) cannot have their containment checked",
            type_name(a),
            type_name(b)
        ))),
    }
}

fn sorted_by_keys(
    items: &[JsonValue],
    f: &Ast,
    env: &Env<'_>,
) -> Result<Vec<(JsonValue, JsonValue)>, Fault> {
    let mut keyed = items
        .iter()
        .map(|item| Ok((JsonValue::Array(eval(f, item, env)?), item.clone())))
        .collect::<Result<Vec<_>, Fault>>()?;
    keyed.sort_by(|a, b| compare_json(&a.0, &b.0));
    Ok(keyed)
}

fn group(keyed: Vec<(JsonValue, JsonValue)>) -> Vec<Vec<JsonValue>> {
    let mut groups: Vec<(JsonValue, Vec<JsonValue>)> = Vec::new();
    for (key, item) in keyed {
        let same = groups
            .last()
            .is_some_and(|(last, _)| compare_json(last, &key).is_eq());
        match groups.last_mut() {
            Some((_, members)) if same => members.push(item),
            _ => groups.push((key, vec![item])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn to_entries(value: &JsonValue) -> Value {
    let JsonValue::Object(map) = value else {
        return Err(Fault::msg(format!(
            "{} ({value}) has no keys",
            type_name(value)
        )));
    };
    Ok(JsonValue::Array(
        map.iter()
            .map(|(k, v)| {
                let mut entry = JsonObject::new();
                entry.insert("key".to_string(), JsonValue::String(k.clone()));
                entry.insert("value".to_string(), v.clone());
                JsonValue::Object(entry)
            })
            .collect(),
    ))
}

fn from_entries(value: &JsonValue) -> Value {
    let mut out = JsonObject::new();
    for entry in array_of("from_entries", value)? {
        let JsonValue::Object(entry) = entry else {
            return Err(Fault::msg(format!(
                "Cannot index {} with \"key\"",
                type_name(entry)
            )));
        };
        let pick = |names: &[&str]| names.iter().find_map(|n| entry.get(*n).filter(|v| truthy(v)));
        let key = match pick(&["key", "k", "name", "Name", "Key", "K"]) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(other @ (JsonValue::Number(_) | JsonValue::Bool(_))) => other.to_string(),
            Some(other) => {
                return Err(Fault::msg(format!(
                    "Cannot use {} ({other}) as object key",
                    type_name(other)
                )))
            }
            None => "null".to_string(),
        };
        let value = ["value", "v", "Value", "V"]
            .iter()
            .find_map(|n| entry.get(*n))
            .cloned()
            .unwrap_or(JsonValue::Null);
        out.insert(key, value);
    }
    Ok(JsonValue::Object(out))
}

fn type_filter(name: &str, value: &JsonValue) -> bool {
    match name {
        "objects" => value.is_object(),
        "arrays" => value.is_array(),
        "strings" => value.is_string(),
        "numbers" => value.is_number(),
        "booleans" => value.is_boolean(),
        "nulls" => value.is_null(),
        "iterables" => value.is_array() || value.is_object(),
        _ => !(value.is_array() || value.is_object()),
    }
}

/// Applies `f` to each output of `arg`
fn each(arg: &Ast, input: &JsonValue, env: &Env<'_>, f: impl Fn(&JsonValue) -> Value) -> Outputs {
    eval(arg, input, env)?.iter().map(f).collect()
}

fn call(name: &str, args: &[Ast], input: &JsonValue, env: &Env<'_>) -> Outputs {
    let one = |value: JsonValue| -> Outputs { Ok(vec![value]) };

    match (name, args) {
        ("empty", []) => Ok(Vec::new()),
        ("error", []) => Err(Fault(input.clone())),
        ("error", [message]) => Err(Fault(
            eval(message, input, env)?
                .into_iter()
                .next()
                .unwrap_or(JsonValue::Null),
        )),
        ("not", []) => one(JsonValue::Bool(!truthy(input))),
        ("length", []) => one(length(input)?),
        ("keys", []) => one(keys(input, true)?),
        ("keys_unsorted", []) => one(keys(input, false)?),
        ("values", []) => Ok(if input.is_null() { vec![] } else { vec![input.clone()] }),
        ("has", [key]) => each(key, input, env, |k| has(input, k)),
        ("in", [target]) => each(target, input, env, |t| has(t, input)),
        ("contains", [b]) => each(b, input, env, |b| contains(input, b).map(JsonValue::Bool)),
        ("inside", [a]) => each(a, input, env, |a| contains(a, input).map(JsonValue::Bool)),
        ("map", [f]) => {
            let mut out = Vec::new();
            for item in iterate(input)? {
                out.extend(eval(f, &item, env)?);
            }
            one(JsonValue::Array(out))
        }
        ("map_values", [f]) => {
            let children = Ast::Iterate(Box::new(Ast::Identity));
            one(update_paths(&children, input, env, |v| {
                Ok(eval(f, v, env)?.into_iter().next())
            })?)
        }
        ("select", [f]) => Ok(eval(f, input, env)?
            .iter()
            .filter(|c| truthy(c))
            .map(|_| input.clone())
            .collect()),
        ("recurse", []) => {
            let mut out = Vec::new();
            recurse_all(input, &mut out);
            Ok(out)
        }
        ("recurse", [f]) => {
            let mut out = Vec::new();
            recurse_with(f, input, env, &mut out)?;
            Ok(out)
        }
        ("type", []) => one(JsonValue::String(type_name(input).to_string())),
        ("tostring", []) => one(JsonValue::String(to_text(input))),
        ("tonumber", []) => match input {
            JsonValue::Number(_) => one(input.clone()),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| vec![from_f64(f)])
                .map_err(|_| Fault::msg(format!("Cannot parse '{s}' as a number"))),
            other => Err(Fault::msg(format!(
                "{} ({other}) cannot be parsed as a number",
                type_name(other)
            ))),
        },
        ("tojson", []) => one(JsonValue::String(input.to_string())),
        ("fromjson", []) => {
            let s = string_of(name, input)?;
            serde_json::from_str(s)
                .map(|v| vec![v])
                .map_err(|e| Fault::msg(format!("{e} (while parsing '{s}')")))
        }
        ("ascii_downcase", []) => one(JsonValue::String(string_of(name, input)?.to_ascii_lowercase())),
        ("ascii_upcase", []) => one(JsonValue::String(string_of(name, input)?.to_ascii_uppercase())),
        ("trim", []) => one(JsonValue::String(string_of(name, input)?.trim().to_string())),
        ("ltrim", []) => one(JsonValue::String(string_of(name, input)?.trim_start().to_string())),
        ("rtrim", []) => one(JsonValue::String(string_of(name, input)?.trim_end().to_string())),
        ("ltrimstr", [prefix]) | ("rtrimstr", [prefix]) => each(prefix, input, env, |p| {
            Ok(match (input, p) {
                (JsonValue::String(s), JsonValue::String(p)) => {
                    let trimmed = if name == "ltrimstr" {
                        s.strip_prefix(p.as_str())
                    } else {
                        s.strip_suffix(p.as_str())
                    };
                    JsonValue::String(trimmed.unwrap_or(s).to_string())
                }
                _ => input.clone(),
            })
        }),
        ("startswith", [other]) | ("endswith", [other]) => each(other, input, env, |o| {
            match (input, o) {
                (JsonValue::String(s), JsonValue::String(o)) => Ok(JsonValue::Bool(
                    if name == "startswith" {
                        s.starts_with(o.as_str())
                    } else {
                        s.ends_with(o.as_str())
                    },
                )),
                _ => Err(Fault::msg(format!("{name}() requires string inputs"))),
            }
        }),
        ("split", [sep]) => each(sep, input, env, |sep| {
            let s = string_of(name, input)?;
            let sep = string_of(name, sep)?;
            Ok(split_string(s, sep))
        }),
        ("join", [sep]) => each(sep, input, env, |sep| {
            let sep = string_of(name, sep)?;
            let parts = array_of(name, input)?
                .iter()
                .map(|v| match v {
                    JsonValue::Null => Ok(String::new()),
                    JsonValue::String(s) => Ok(s.clone()),
                    JsonValue::Number(_) | JsonValue::Bool(_) => Ok(v.to_string()),
                    other => Err(Fault::msg(format!("Cannot join with {}", type_name(other)))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(JsonValue::String(parts.join(sep)))
        }),
        ("test", [pattern]) => each(pattern, input, env, |p| {
            let s = string_of(name, input)?;
            let re = Regex::new(string_of(name, p)?)
                .map_err(|e| Fault::msg(format!("invalid regex: {e}")))?;
            Ok(JsonValue::Bool(re.is_match(s)))
        }),
        ("add", []) => {
            let mut acc = JsonValue::Null;
            for item in iterate(input)? {
                acc = binary(BinOp::Add, &acc, &item)?;
            }
            one(acc)
        }
        ("any", []) => one(JsonValue::Bool(array_of(name, input)?.iter().any(truthy))),
        ("all", []) => one(JsonValue::Bool(array_of(name, input)?.iter().all(truthy))),
        ("any", [f]) | ("all", [f]) => {
            let want_any = name == "any";
            for item in iterate(input)? {
                let outputs = eval(f, &item, env)?;
                if want_any && outputs.iter().any(truthy) {
                    return one(JsonValue::Bool(true));
                }
                if !want_any && !outputs.iter().all(truthy) {
                    return one(JsonValue::Bool(false));
                }
            }
            one(JsonValue::Bool(!want_any))
        }
        ("range", [upto]) => {
            let mut out = Vec::new();
            for upto in eval(upto, input, env)? {
                let upto = number_of(name, &upto)?;
                let mut i = 0.0;
                while i < upto {
                    out.push(from_f64(i));
                    i += 1.0;
                }
            }
            Ok(out)
        }
        ("range", [from, upto]) => {
            let mut out = Vec::new();
            let uptos = eval(upto, input, env)?;
            for from in eval(from, input, env)? {
                for upto in &uptos {
                    let mut i = number_of(name, &from)?;
                    let upto = number_of(name, upto)?;
                    while i < upto {
                        out.push(from_f64(i));
                        i += 1.0;
                    }
                }
            }
            Ok(out)
        }
        ("floor", []) => one(from_f64(number_of(name, input)?.floor())),
        ("ceil", []) => one(from_f64(number_of(name, input)?.ceil())),
        ("round", []) => one(from_f64(number_of(name, input)?.round())),
        ("sqrt", []) => one(from_f64(number_of(name, input)?.sqrt())),
        ("abs", []) => one(from_f64(number_of(name, input)?.abs())),
        ("min", []) | ("max", []) => {
            let items = array_of(name, input)?;
            let pick = if name == "min" {
                items.iter().min_by(|a, b| compare_json(a, b))
            } else {
                items.iter().max_by(|a, b| compare_json(a, b))
            };
            one(pick.cloned().unwrap_or(JsonValue::Null))
        }
        ("min_by", [f]) | ("max_by", [f]) => {
            let keyed = sorted_by_keys(array_of(name, input)?, f, env)?;
            let pick = if name == "min_by" {
                keyed.into_iter().next()
            } else {
                keyed.into_iter().last()
            };
            one(pick.map_or(JsonValue::Null, |(_, item)| item))
        }
        ("sort", []) => {
            let mut items = array_of(name, input)?.clone();
            items.sort_by(compare_json);
            one(JsonValue::Array(items))
        }
        ("sort_by", [f]) => one(JsonValue::Array(
            sorted_by_keys(array_of(name, input)?, f, env)?
                .into_iter()
                .map(|(_, item)| item)
                .collect(),
        )),
        ("group_by", [f]) => one(JsonValue::Array(
            group(sorted_by_keys(array_of(name, input)?, f, env)?)
                .into_iter()
                .map(JsonValue::Array)
                .collect(),
        )),
        ("unique", []) => {
            let mut items = array_of(name, input)?.clone();
            items.sort_by(compare_json);
            items.dedup_by(|a, b| compare_json(a, b).is_eq());
            one(JsonValue::Array(items))
        }
        ("unique_by", [f]) => one(JsonValue::Array(
            group(sorted_by_keys(array_of(name, input)?, f, env)?)
                .into_iter()
                .filter_map(|members| members.into_iter().next())
                .collect(),
        )),
        ("reverse", []) => match input {
            JsonValue::Null => one(JsonValue::Array(Vec::new())),
            JsonValue::String(s) => one(JsonValue::String(s.chars().rev().collect())),
            other => {
                let mut items = array_of(name, other)?.clone();
                items.reverse();
                one(JsonValue::Array(items))
            }
        },
        ("first", []) => one(index_value(input, &JsonValue::from(0))?),
        ("last", []) => one(index_value(input, &JsonValue::from(-1))?),
        ("first", [f]) => Ok(eval(f, input, env)?.into_iter().take(1).collect()),
        ("last", [f]) => Ok(eval(f, input, env)?.pop().into_iter().collect()),
        ("limit", [n, f]) => {
            let mut out = Vec::new();
            for n in eval(n, input, env)? {
                let n = number_of(name, &n)?.max(0.0) as usize;
                if n > 0 {
                    out.extend(eval(f, input, env)?.into_iter().take(n));
                }
            }
            Ok(out)
        }
        ("isempty", [f]) => one(JsonValue::Bool(eval(f, input, env)?.is_empty())),
        ("to_entries", []) => one(to_entries(input)?),
        ("from_entries", []) => one(from_entries(input)?),
        ("with_entries", [f]) => {
            let JsonValue::Array(entries) = to_entries(input)? else {
                return Ok(Vec::new());
            };
            let mut mapped = Vec::new();
            for entry in &entries {
                mapped.extend(eval(f, entry, env)?);
            }
            one(from_entries(&JsonValue::Array(mapped))?)
        }
        ("objects" | "arrays" | "strings" | "numbers" | "booleans" | "nulls" | "iterables"
        | "scalars", []) => Ok(if type_filter(name, input) {
            vec![input.clone()]
        } else {
            Vec::new()
        }),
        ("paths", []) => {
            let mut all = Vec::new();
            recurse_paths(&(Vec::new(), input.clone()), &mut all);
            Ok(all
                .into_iter()
                .skip(1)
                .map(|(p, _)| JsonValue::Array(p))
                .collect())
        }
        ("path", [f]) => Ok(eval_paths(f, &(Vec::new(), input.clone()), env)?
            .into_iter()
            .map(|(p, _)| JsonValue::Array(p))
            .collect()),
        ("getpath", [p]) => each(p, input, env, |p| {
            let keys = array_of(name, p)?;
            // Type mismatches along a missing path read as null
            Ok(get_path(input, keys).unwrap_or(JsonValue::Null))
        }),
        ("setpath", [p, v]) => {
            let values = eval(v, input, env)?;
            let mut out = Vec::new();
            for p in eval(p, input, env)? {
                let keys = array_of(name, &p)?;
                for v in &values {
                    out.push(set_path(input.clone(), keys, v.clone())?);
                }
            }
            Ok(out)
        }
        ("delpaths", [ps]) => each(ps, input, env, |ps| {
            let paths = array_of(name, ps)?
                .iter()
                .map(|p| array_of(name, p).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            delete_paths(input.clone(), paths)
        }),
        ("del", [f]) => {
            let paths = eval_paths(f, &(Vec::new(), input.clone()), env)?
                .into_iter()
                .map(|(p, _)| p)
                .collect();
            one(delete_paths(input.clone(), paths)?)
        }
        _ => Err(Fault::msg(format!("{name}/{} is not defined", args.len()))),
    }
}
