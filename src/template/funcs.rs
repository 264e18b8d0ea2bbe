//! Template function library
//!
//! Every function takes already-evaluated arguments; a piped value arrives as
//! the last argument.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

pub(crate) type TemplateFn = fn(&[JsonValue]) -> Result<JsonValue>;

static FUNCS: LazyLock<HashMap<&'static str, TemplateFn>> = LazyLock::new(|| {
    let entries: &[(&'static str, TemplateFn)] = &[
        // builtins
        ("and", and),
        ("or", or),
        ("not", not),
        ("len", len),
        ("index", index),
        ("print", print),
        ("println", println),
        ("printf", printf),
        ("eq", eq),
        ("ne", ne),
        ("lt", lt),
        ("le", le),
        ("gt", gt),
        ("ge", ge),
        // strings
        ("trim", trim),
        ("trimRightSpace", trim_right_space),
        ("trimTrailingWhitespaces", trim_right_space),
        ("trimPrefix", trim_prefix),
        ("trimSuffix", trim_suffix),
        ("toUpper", upper),
        ("toLower", lower),
        ("upper", upper),
        ("lower", lower),
        ("title", title),
        ("replace", replace),
        ("replaceRegexp", replace_regexp),
        ("contains", contains),
        ("hasPrefix", has_prefix),
        ("hasSuffix", has_suffix),
        ("join", join),
        ("split", split),
        ("repeat", repeat),
        ("rpad", rpad),
        ("padLeft", pad_left),
        ("padRight", pad_right),
        ("padCenter", pad_center),
        ("quote", quote),
        ("stripNewlines", strip_newlines),
        ("quoteNewlines", quote_newlines),
        // numbers
        ("add", add),
        ("sub", sub),
        ("mul", mul),
        ("div", div),
        ("mod", modulo),
        ("parseFloat", parse_float),
        ("parseInt", parse_int),
        ("currency", currency),
        // markdown and terminal
        ("bold", bold),
        ("underline", underline),
        ("italic", italic),
        ("strikethrough", strikethrough),
        ("code", code),
        ("codeBlock", code_block),
        ("styleBold", style_bold),
        // formatting
        ("toDate", to_date),
        ("formatDate", format_date),
        ("now", now),
        ("toYaml", to_yaml),
        ("toJson", to_json),
        ("toPrettyJson", to_pretty_json),
        ("indentBlock", indent_block),
        ("indent", indent),
        ("toUrlParameter", to_url_parameter),
        ("b64enc", b64enc),
        ("b64dec", b64dec),
        // collections
        ("default", default),
        ("list", list),
        ("dict", dict),
        // random
        ("randomChoice", random_choice),
        ("randomSubset", random_subset),
        ("randomPermute", random_permute),
        ("randomInt", random_int),
        ("randomFloat", random_float),
        ("randomBool", random_bool),
        ("randomString", random_string),
        ("randomStringList", random_string_list),
    ];
    entries.iter().copied().collect()
});

/// Look up a template function by name
pub(crate) fn lookup(name: &str) -> Option<TemplateFn> {
    FUNCS.get(name).copied()
}

// ============================================================================
// Value helpers
// ============================================================================

/// Text rendering of a value inside a template
pub(crate) fn to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Template truthiness: false, zero, null and empty values are false
pub(crate) fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

fn arity(name: &str, args: &[JsonValue], n: usize) -> Result<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Error::template(format!(
            "wrong number of args for {name}: want {n} got {}",
            args.len()
        )))
    }
}

fn int_of(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => n.as_i64(),
        _ => None,
    }
}

fn to_f64(name: &str, value: &JsonValue) -> Result<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::template(format!("{name}: number out of range"))),
        JsonValue::String(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::template(format!("{name}: {s:?} is not a number"))),
        other => Err(Error::template(format!("{name}: expected a number, got {other}"))),
    }
}

fn to_i64(name: &str, value: &JsonValue) -> Result<i64> {
    if let Some(i) = int_of(value) {
        return Ok(i);
    }
    match value {
        JsonValue::String(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::template(format!("{name}: {s:?} is not an integer"))),
        other => to_f64(name, other).map(|f| f as i64),
    }
}

fn to_usize(name: &str, value: &JsonValue) -> Result<usize> {
    let n = to_i64(name, value)?;
    usize::try_from(n).map_err(|_| Error::template(format!("{name}: {n} must be non-negative")))
}

fn float(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
}

fn string_fn(args: &[JsonValue], name: &str, f: impl Fn(&str) -> String) -> Result<JsonValue> {
    arity(name, args, 1)?;
    Ok(JsonValue::String(f(&to_text(&args[0]))))
}

fn items<'a>(name: &str, value: &'a JsonValue) -> Result<&'a Vec<JsonValue>> {
    match value {
        JsonValue::Array(items) => Ok(items),
        other => Err(Error::template(format!("{name}: expected a list, got {other}"))),
    }
}

// ============================================================================
// Builtins
// ============================================================================

fn and(args: &[JsonValue]) -> Result<JsonValue> {
    let Some(last) = args.last() else {
        return Err(Error::template("and: missing arguments"));
    };
    Ok(args.iter().find(|v| !truthy(v)).unwrap_or(last).clone())
}

fn or(args: &[JsonValue]) -> Result<JsonValue> {
    let Some(last) = args.last() else {
        return Err(Error::template("or: missing arguments"));
    };
    Ok(args.iter().find(|v| truthy(v)).unwrap_or(last).clone())
}

fn not(args: &[JsonValue]) -> Result<JsonValue> {
    arity("not", args, 1)?;
    Ok(JsonValue::Bool(!truthy(&args[0])))
}

fn len(args: &[JsonValue]) -> Result<JsonValue> {
    arity("len", args, 1)?;
    let n = match &args[0] {
        JsonValue::String(s) => s.chars().count(),
        JsonValue::Array(a) => a.len(),
        JsonValue::Object(o) => o.len(),
        JsonValue::Null => 0,
        other => return Err(Error::template(format!("len of {other}"))),
    };
    Ok(JsonValue::from(n))
}

fn index(args: &[JsonValue]) -> Result<JsonValue> {
    let Some((first, keys)) = args.split_first() else {
        return Err(Error::template("index: missing arguments"));
    };
    let mut current = first.clone();
    for key in keys {
        current = match (&current, key) {
            (JsonValue::Array(items), k) => {
                let i = to_i64("index", k)?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| Error::template(format!("index out of range: {i}")))?
            }
            (JsonValue::Object(map), k) => map.get(&to_text(k)).cloned().unwrap_or_default(),
            (JsonValue::Null, _) => JsonValue::Null,
            (other, _) => return Err(Error::template(format!("can't index item of type {other}"))),
        };
    }
    Ok(current)
}

fn print(args: &[JsonValue]) -> Result<JsonValue> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        out.push_str(&to_text(arg));
    }
    Ok(JsonValue::String(out))
}

fn println(args: &[JsonValue]) -> Result<JsonValue> {
    let mut out = args.iter().map(to_text).collect::<Vec<_>>().join(" ");
    out.push('\n');
    Ok(JsonValue::String(out))
}

fn printf(args: &[JsonValue]) -> Result<JsonValue> {
    let Some((format, rest)) = args.split_first() else {
        return Err(Error::template("printf: missing format"));
    };
    Ok(JsonValue::String(sprintf(&to_text(format), rest)))
}

/// A small printf: flags `-+0 `, width, precision and verbs `vsdfegtqxXobc%`
pub(crate) fn sprintf(format: &str, args: &[JsonValue]) -> String {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut next_arg = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut left = false;
        let mut zero = false;
        let mut plus = false;
        let mut space = false;
        while let Some(&f) = chars.peek() {
            match f {
                '-' => left = true,
                '0' => zero = true,
                '+' => plus = true,
                ' ' => space = true,
                _ => break,
            }
            chars.next();
        }
        let mut width = String::new();
        while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            width.push(d);
            chars.next();
        }
        let mut precision: Option<usize> = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut p = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                p.push(d);
                chars.next();
            }
            precision = Some(p.parse().unwrap_or(0));
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = next_arg.next() else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };

        let body = match verb {
            'd' => match to_i64("printf", arg) {
                Ok(i) => sign(i.to_string(), i >= 0, plus, space),
                Err(_) => format!("%!d({})", to_text(arg)),
            },
            'f' | 'F' => match to_f64("printf", arg) {
                Ok(f) => sign(format!("{:.*}", precision.unwrap_or(6), f), f >= 0.0, plus, space),
                Err(_) => format!("%!f({})", to_text(arg)),
            },
            'e' => match to_f64("printf", arg) {
                Ok(f) => format!("{:.*e}", precision.unwrap_or(6), f),
                Err(_) => format!("%!e({})", to_text(arg)),
            },
            'g' => match to_f64("printf", arg) {
                Ok(f) => f.to_string(),
                Err(_) => format!("%!g({})", to_text(arg)),
            },
            'x' | 'X' | 'o' | 'b' => match int_of(arg) {
                Some(i) => match verb {
                    'x' => format!("{i:x}"),
                    'X' => format!("{i:X}"),
                    'o' => format!("{i:o}"),
                    _ => format!("{i:b}"),
                },
                None if verb == 'x' => to_text(arg)
                    .bytes()
                    .map(|b| format!("{b:02x}"))
                    .collect(),
                None => format!("%!{verb}({})", to_text(arg)),
            },
            'c' => int_of(arg)
                .and_then(|i| u32::try_from(i).ok())
                .and_then(char::from_u32)
                .map_or_else(|| format!("%!c({})", to_text(arg)), String::from),
            'q' => format!("{:?}", to_text(arg)),
            't' => match arg {
                JsonValue::Bool(b) => b.to_string(),
                other => format!("%!t({})", to_text(other)),
            },
            's' | 'v' => {
                let s = to_text(arg);
                match precision {
                    Some(p) if verb == 's' => s.chars().take(p).collect(),
                    _ => s,
                }
            }
            other => format!("%!{other}({})", to_text(arg)),
        };

        let width: usize = width.parse().unwrap_or(0);
        let len = body.chars().count();
        if len >= width {
            out.push_str(&body);
        } else if left {
            out.push_str(&body);
            out.push_str(&" ".repeat(width - len));
        } else if zero && matches!(verb, 'd' | 'f' | 'F' | 'x' | 'X' | 'o' | 'b') {
            let (sign_part, digits) = match body.strip_prefix(['-', '+']) {
                Some(rest) => (&body[..1], rest),
                None => ("", body.as_str()),
            };
            out.push_str(sign_part);
            out.push_str(&"0".repeat(width - len));
            out.push_str(digits);
        } else {
            out.push_str(&" ".repeat(width - len));
            out.push_str(&body);
        }
    }
    out
}

fn sign(s: String, non_negative: bool, plus: bool, space: bool) -> String {
    if non_negative && plus {
        format!("+{s}")
    } else if non_negative && space {
        format!(" {s}")
    } else {
        s
    }
}

fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(name: &str, a: &JsonValue, b: &JsonValue) -> Result<Ordering> {
    match (a, b) {
        (JsonValue::Number(_), JsonValue::Number(_)) => {
            let (x, y) = (to_f64(name, a)?, to_f64(name, b)?);
            Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
        }
        (JsonValue::String(x), JsonValue::String(y)) => Ok(x.cmp(y)),
        _ => Err(Error::template(format!(
            "{name}: incompatible types for comparison: {a} and {b}"
        ))),
    }
}

fn eq(args: &[JsonValue]) -> Result<JsonValue> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Error::template("eq: missing arguments"));
    };
    if rest.is_empty() {
        return Err(Error::template("eq: missing argument for comparison"));
    }
    Ok(JsonValue::Bool(rest.iter().any(|v| values_equal(first, v))))
}

fn ne(args: &[JsonValue]) -> Result<JsonValue> {
    arity("ne", args, 2)?;
    Ok(JsonValue::Bool(!values_equal(&args[0], &args[1])))
}

fn lt(args: &[JsonValue]) -> Result<JsonValue> {
    arity("lt", args, 2)?;
    Ok(JsonValue::Bool(compare("lt", &args[0], &args[1])? == Ordering::Less))
}

fn le(args: &[JsonValue]) -> Result<JsonValue> {
    arity("le", args, 2)?;
    Ok(JsonValue::Bool(compare("le", &args[0], &args[1])? != Ordering::Greater))
}

fn gt(args: &[JsonValue]) -> Result<JsonValue> {
    arity("gt", args, 2)?;
    Ok(JsonValue::Bool(compare("gt", &args[0], &args[1])? == Ordering::Greater))
}

fn ge(args: &[JsonValue]) -> Result<JsonValue> {
    arity("ge", args, 2)?;
    Ok(JsonValue::Bool(compare("ge", &args[0], &args[1])? != Ordering::Less))
}

// ============================================================================
// Strings
// ============================================================================

fn trim(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "trim", |s| s.trim().to_string())
}

fn trim_right_space(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "trimRightSpace", |s| s.trim_end().to_string())
}

fn trim_prefix(args: &[JsonValue]) -> Result<JsonValue> {
    arity("trimPrefix", args, 2)?;
    let (prefix, s) = (to_text(&args[0]), to_text(&args[1]));
    Ok(JsonValue::String(
        s.strip_prefix(prefix.as_str()).unwrap_or(&s).to_string(),
    ))
}

fn trim_suffix(args: &[JsonValue]) -> Result<JsonValue> {
    arity("trimSuffix", args, 2)?;
    let (suffix, s) = (to_text(&args[0]), to_text(&args[1]));
    Ok(JsonValue::String(
        s.strip_suffix(suffix.as_str()).unwrap_or(&s).to_string(),
    ))
}

fn upper(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "upper", str::to_uppercase)
}

fn lower(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "lower", str::to_lowercase)
}

fn title(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "title", title_case)
}

/// Uppercase the first letter of every whitespace separated word
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

fn replace(args: &[JsonValue]) -> Result<JsonValue> {
    arity("replace", args, 3)?;
    let (old, new, s) = (to_text(&args[0]), to_text(&args[1]), to_text(&args[2]));
    Ok(JsonValue::String(s.replace(old.as_str(), &new)))
}

fn replace_regexp(args: &[JsonValue]) -> Result<JsonValue> {
    arity("replaceRegexp", args, 3)?;
    let (s, old, new) = (to_text(&args[0]), to_text(&args[1]), to_text(&args[2]));
    let out = match Regex::new(&old) {
        Ok(re) => re.replace_all(&s, new.as_str()).into_owned(),
        Err(_) => s,
    };
    Ok(JsonValue::String(out))
}

fn contains(args: &[JsonValue]) -> Result<JsonValue> {
    arity("contains", args, 2)?;
    Ok(JsonValue::Bool(
        to_text(&args[1]).contains(to_text(&args[0]).as_str()),
    ))
}

fn has_prefix(args: &[JsonValue]) -> Result<JsonValue> {
    arity("hasPrefix", args, 2)?;
    Ok(JsonValue::Bool(
        to_text(&args[1]).starts_with(to_text(&args[0]).as_str()),
    ))
}

fn has_suffix(args: &[JsonValue]) -> Result<JsonValue> {
    arity("hasSuffix", args, 2)?;
    Ok(JsonValue::Bool(
        to_text(&args[1]).ends_with(to_text(&args[0]).as_str()),
    ))
}

fn join(args: &[JsonValue]) -> Result<JsonValue> {
    arity("join", args, 2)?;
    let sep = to_text(&args[0]);
    let joined = match &args[1] {
        JsonValue::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(&sep),
        other => to_text(other),
    };
    Ok(JsonValue::String(joined))
}

fn split(args: &[JsonValue]) -> Result<JsonValue> {
    arity("split", args, 2)?;
    let (sep, s) = (to_text(&args[0]), to_text(&args[1]));
    Ok(JsonValue::Array(
        s.split(sep.as_str())
            .map(|p| JsonValue::String(p.to_string()))
            .collect(),
    ))
}

fn repeat(args: &[JsonValue]) -> Result<JsonValue> {
    arity("repeat", args, 2)?;
    let count = to_usize("repeat", &args[0])?;
    Ok(JsonValue::String(to_text(&args[1]).repeat(count)))
}

fn pad_to(s: &str, width: usize, align_right: bool) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = " ".repeat(width - len);
    if align_right {
        format!("{pad}{s}")
    } else {
        format!("{s}{pad}")
    }
}

fn rpad(args: &[JsonValue]) -> Result<JsonValue> {
    arity("rpad", args, 2)?;
    let width = to_usize("rpad", &args[1])?;
    Ok(JsonValue::String(pad_to(&to_text(&args[0]), width, false)))
}

fn pad_left(args: &[JsonValue]) -> Result<JsonValue> {
    arity("padLeft", args, 2)?;
    let width = to_usize("padLeft", &args[1])?;
    Ok(JsonValue::String(pad_to(&to_text(&args[0]), width, true)))
}

fn pad_right(args: &[JsonValue]) -> Result<JsonValue> {
    arity("padRight", args, 2)?;
    let width = to_usize("padRight", &args[1])?;
    Ok(JsonValue::String(pad_to(&to_text(&args[0]), width, false)))
}

fn pad_center(args: &[JsonValue]) -> Result<JsonValue> {
    arity("padCenter", args, 2)?;
    let width = to_i64("padCenter", &args[1])?;
    let s = to_text(&args[0]);
    let len = s.chars().count() as i64;
    let left = usize::try_from((width + len) / 2).unwrap_or(0);
    let right = usize::try_from((width - len) / 2).unwrap_or(0);
    Ok(JsonValue::String(format!(
        "{}{}",
        pad_to(&s, left, true),
        " ".repeat(right)
    )))
}

fn quote(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "quote", |s| format!("`{s}`"))
}

fn strip_newlines(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "stripNewlines", |s| s.replace('\n', " "))
}

fn quote_newlines(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "quoteNewlines", |s| s.replace('\n', "\\n"))
}

// ============================================================================
// Numbers
// ============================================================================

fn arith(
    name: &str,
    args: &[JsonValue],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<JsonValue> {
    arity(name, args, 2)?;
    if let (Some(a), Some(b)) = (int_of(&args[0]), int_of(&args[1])) {
        return int_op(a, b)
            .map(JsonValue::from)
            .ok_or_else(|| Error::template(format!("{name}: integer overflow or division by zero")));
    }
    let a = to_f64(name, &args[0])?;
    let b = to_f64(name, &args[1])?;
    Ok(float(float_op(a, b)))
}

fn add(args: &[JsonValue]) -> Result<JsonValue> {
    arith("add", args, i64::checked_add, |a, b| a + b)
}

fn sub(args: &[JsonValue]) -> Result<JsonValue> {
    arith("sub", args, i64::checked_sub, |a, b| a - b)
}

fn mul(args: &[JsonValue]) -> Result<JsonValue> {
    arith("mul", args, i64::checked_mul, |a, b| a * b)
}

fn div(args: &[JsonValue]) -> Result<JsonValue> {
    arith("div", args, i64::checked_div, |a, b| a / b)
}

fn modulo(args: &[JsonValue]) -> Result<JsonValue> {
    arity("mod", args, 2)?;
    let (a, b) = (to_i64("mod", &args[0])?, to_i64("mod", &args[1])?);
    a.checked_rem(b)
        .map(JsonValue::from)
        .ok_or_else(|| Error::template("mod: division by zero"))
}

fn parse_float(args: &[JsonValue]) -> Result<JsonValue> {
    arity("parseFloat", args, 1)?;
    Ok(float(to_text(&args[0]).trim().parse().unwrap_or(0.0)))
}

fn parse_int(args: &[JsonValue]) -> Result<JsonValue> {
    arity("parseInt", args, 1)?;
    Ok(JsonValue::from(
        to_text(&args[0]).trim().parse::<i64>().unwrap_or(0),
    ))
}

fn currency(args: &[JsonValue]) -> Result<JsonValue> {
    arity("currency", args, 1)?;
    let s = match &args[0] {
        v if int_of(v).is_some() => format!("{}.00", int_of(v).unwrap_or_default()),
        JsonValue::Number(n) => format!("{:.2}", n.as_f64().unwrap_or_default()),
        _ => String::new(),
    };
    Ok(JsonValue::String(s))
}

// ============================================================================
// Markdown and terminal styling
// ============================================================================

fn bold(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "bold", |s| format!("**{s}**"))
}

fn underline(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "underline", |s| format!("__{s}__"))
}

fn italic(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "italic", |s| format!("*{s}*"))
}

fn strikethrough(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "strikethrough", |s| format!("~~{s}~~"))
}

fn code(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "code", |s| format!("`{s}`"))
}

fn code_block(args: &[JsonValue]) -> Result<JsonValue> {
    arity("codeBlock", args, 2)?;
    Ok(JsonValue::String(format!(
        "```{}\n{}\n```",
        to_text(&args[1]),
        to_text(&args[0])
    )))
}

fn style_bold(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "styleBold", |s| format!("\x1b[1m{s}\x1b[0m"))
}

// ============================================================================
// Formatting
// ============================================================================

fn to_date(args: &[JsonValue]) -> Result<JsonValue> {
    arity("toDate", args, 1)?;
    match &args[0] {
        JsonValue::String(s) => Ok(JsonValue::String(
            s.split('T').next().unwrap_or_default().to_string(),
        )),
        other => Err(Error::template(format!("cannot convert {other} to date"))),
    }
}

/// `formatDate "%Y/%m/%d" .date` with chrono strftime syntax
fn format_date(args: &[JsonValue]) -> Result<JsonValue> {
    arity("formatDate", args, 2)?;
    let (format, value) = (to_text(&args[0]), to_text(&args[1]));
    let formatted = if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&value) {
        dt.format(&format).to_string()
    } else if let Ok(d) = chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        d.format(&format).to_string()
    } else {
        return Err(Error::template(format!("cannot parse {value:?} as a date")));
    };
    Ok(JsonValue::String(formatted))
}

fn now(args: &[JsonValue]) -> Result<JsonValue> {
    arity("now", args, 0)?;
    Ok(JsonValue::String(chrono::Utc::now().to_rfc3339()))
}

fn to_yaml(args: &[JsonValue]) -> Result<JsonValue> {
    arity("toYaml", args, 1)?;
    Ok(JsonValue::String(
        serde_yaml::to_string(&args[0]).unwrap_or_default(),
    ))
}

fn to_json(args: &[JsonValue]) -> Result<JsonValue> {
    arity("toJson", args, 1)?;
    Ok(JsonValue::String(serde_json::to_string(&args[0])?))
}

fn to_pretty_json(args: &[JsonValue]) -> Result<JsonValue> {
    arity("toPrettyJson", args, 1)?;
    Ok(JsonValue::String(serde_json::to_string_pretty(&args[0])?))
}

fn indent_block(args: &[JsonValue]) -> Result<JsonValue> {
    arity("indentBlock", args, 2)?;
    let pad = " ".repeat(to_usize("indentBlock", &args[0])?);
    let out: String = to_text(&args[1])
        .split('\n')
        .map(|line| format!("{pad}{line}\n"))
        .collect();
    Ok(JsonValue::String(out))
}

fn indent(args: &[JsonValue]) -> Result<JsonValue> {
    arity("indent", args, 2)?;
    let pad = " ".repeat(to_usize("indent", &args[0])?);
    let s = to_text(&args[1]);
    Ok(JsonValue::String(format!(
        "{pad}{}",
        s.replace('\n', &format!("\n{pad}"))
    )))
}

fn to_url_parameter(args: &[JsonValue]) -> Result<JsonValue> {
    arity("toUrlParameter", args, 1)?;
    let s = match &args[0] {
        v if int_of(v).is_some() => to_text(v),
        JsonValue::Number(n) => format!("{:.6}", n.as_f64().unwrap_or_default()),
        JsonValue::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        other => to_text(other),
    };
    Ok(JsonValue::String(s))
}

fn b64enc(args: &[JsonValue]) -> Result<JsonValue> {
    string_fn(args, "b64enc", |s| {
        base64::engine::general_purpose::STANDARD.encode(s)
    })
}

fn b64dec(args: &[JsonValue]) -> Result<JsonValue> {
    arity("b64dec", args, 1)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(to_text(&args[0]))
        .map_err(|e| Error::template(format!("b64dec: {e}")))?;
    Ok(JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()))
}

// ============================================================================
// Collections
// ============================================================================

fn default(args: &[JsonValue]) -> Result<JsonValue> {
    match args {
        [fallback] => Ok(fallback.clone()),
        [fallback, value] => Ok(if truthy(value) {
            value.clone()
        } else {
            fallback.clone()
        }),
        _ => Err(Error::template("default: expected 1 or 2 arguments")),
    }
}

fn list(args: &[JsonValue]) -> Result<JsonValue> {
    Ok(JsonValue::Array(args.to_vec()))
}

fn dict(args: &[JsonValue]) -> Result<JsonValue> {
    if args.len() % 2 != 0 {
        return Err(Error::template("dict: expected key/value pairs"));
    }
    let map: JsonObject = args
        .chunks(2)
        .map(|pair| (to_text(&pair[0]), pair[1].clone()))
        .collect();
    Ok(JsonValue::Object(map))
}

// ============================================================================
// Random (OS entropy)
// ============================================================================

const RANDOM_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_choice(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomChoice", args, 1)?;
    let items = items("randomChoice", &args[0])?;
    items
        .choose(&mut OsRng)
        .cloned()
        .ok_or_else(|| Error::template("randomChoice: list is empty"))
}

fn random_subset(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomSubset", args, 2)?;
    let items = items("randomSubset", &args[0])?;
    if items.is_empty() {
        return Err(Error::template("randomSubset: list is empty"));
    }
    let n = to_usize("randomSubset", &args[1])?.min(items.len());
    Ok(JsonValue::Array(
        items.choose_multiple(&mut OsRng, n).cloned().collect(),
    ))
}

fn random_permute(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomPermute", args, 1)?;
    let mut items = items("randomPermute", &args[0])?.clone();
    if items.is_empty() {
        return Err(Error::template("randomPermute: list is empty"));
    }
    items.shuffle(&mut OsRng);
    Ok(JsonValue::Array(items))
}

fn random_int_between(min: i64, max: i64) -> i64 {
    if min >= max {
        min
    } else {
        OsRng.gen_range(min..=max)
    }
}

fn random_int(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomInt", args, 2)?;
    let (min, max) = (to_i64("randomInt", &args[0])?, to_i64("randomInt", &args[1])?);
    Ok(JsonValue::from(random_int_between(min, max)))
}

fn random_float(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomFloat", args, 2)?;
    let (min, max) = (
        to_f64("randomFloat", &args[0])?,
        to_f64("randomFloat", &args[1])?,
    );
    if min >= max {
        return Ok(float(min));
    }
    let f: f64 = OsRng.gen();
    Ok(float(min + f * (max - min)))
}

fn random_bool(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomBool", args, 0)?;
    Ok(JsonValue::Bool(OsRng.gen()))
}

fn random_chars(length: usize) -> String {
    (0..length)
        .map(|_| char::from(RANDOM_CHARSET[OsRng.gen_range(0..RANDOM_CHARSET.len())]))
        .collect()
}

fn random_string(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomString", args, 1)?;
    Ok(JsonValue::String(random_chars(to_usize(
        "randomString",
        &args[0],
    )?)))
}

fn random_string_list(args: &[JsonValue]) -> Result<JsonValue> {
    arity("randomStringList", args, 3)?;
    let count = to_usize("randomStringList", &args[0])?;
    let min = to_i64("randomStringList", &args[1])?;
    let max = to_i64("randomStringList", &args[2])?;
    Ok(JsonValue::Array(
        (0..count)
            .map(|_| {
                let len = usize::try_from(random_int_between(min, max)).unwrap_or(0);
                JsonValue::String(random_chars(len))
            })
            .collect(),
    ))
}
