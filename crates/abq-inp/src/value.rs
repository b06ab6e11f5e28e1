//! Token splitting and scalar coercion for data lines.
//!
//! There is no declared schema: every token is inspected on its own and turned
//! into an integer, a float or text. Coercion never fails.

use std::fmt::{Display, Formatter};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("float pattern is valid")
});

/// A coerced data-line value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Integer view; integral floats are accepted since decks often write
    /// node ids as `12.`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Coerce one token: integer numeral, then float numeral, then text with one
/// layer of enclosing quotes removed.
///
/// Integer numerals that overflow `i64` are read as floats.
pub fn coerce(token: &str) -> Value {
    let token = token.trim();
    if INTEGER.is_match(token)
        && let Ok(v) = token.parse::<i64>()
    {
        return Value::Int(v);
    }
    if FLOAT.is_match(token)
        && let Ok(v) = token.parse::<f64>()
    {
        return Value::Float(v);
    }
    Value::Text(unquote(token).to_string())
}

/// Split a data line into values. Each comma-separated field yields exactly
/// one value, empty and trailing fields included.
pub fn coerce_line(line: &str) -> Vec<Value> {
    split_fields(line).into_iter().map(coerce).collect()
}

/// Split on commas that are not inside a quoted field, trimming each field.
///
/// A quote only opens a quoted region at the start of a field or right after
/// `=` (as in `ELSET="a, b"`), so apostrophes inside plain text are kept as-is.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;

    for (idx, ch) in line.char_indices() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if opens_quote(&line[start..idx]) => quote = Some(ch),
            (None, ',') => {
                fields.push(line[start..idx].trim());
                start = idx + 1;
            }
            (None, _) => {}
        }
    }
    fields.push(line[start..].trim());
    fields
}

fn opens_quote(prefix: &str) -> bool {
    let prefix = prefix.trim_end();
    prefix.is_empty() || prefix.ends_with('=')
}

fn unquote(token: &str) -> &str {
    for q in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(q) && token.ends_with(q) {
            return &token[1..token.len() - 1];
        }
    }
    token
}
