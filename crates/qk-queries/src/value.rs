//! Filter Values
//!
//! Typed values produced from raw query-string text.

use serde::Serialize;
use std::fmt;

/// Raw value that stands for SQL NULL
pub const NULL: &str = "NULL";

/// A typed scalar, bound as one statement argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// The value carried by a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// SQL NULL, rendered as `IS [NOT] NULL`
    Null,
    Single(Value),
    /// Ordered elements of an `IN` list
    List(Vec<Value>),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Values that will be bound as arguments, in order
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Null => &[],
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

impl FilterValue {
    pub fn single(value: impl Into<Value>) -> Self {
        Self::Single(value.into())
    }

    pub fn list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Declared type of a field, taken from the registry key hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    Int,
    Bool,
    #[default]
    String,
}

impl ValueKind {
    /// Parse from a registry type hint
    pub fn from_hint(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "string" | "str" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// Convert one raw element, `None` when it does not fit the kind
    pub fn convert(&self, raw: &str) -> Option<Value> {
        match self {
            Self::Int => raw.trim().parse::<i64>().ok().map(Value::Int),
            Self::Bool => parse_bool(raw.trim()).map(Value::Bool),
            Self::String => Some(Value::Text(raw.to_string())),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Turn `*` at either end of a LIKE value into `%`
pub fn like_pattern(raw: &str) -> String {
    let mut pattern = raw.to_string();
    if let Some(rest) = pattern.strip_prefix('*') {
        pattern = format!("%{}", rest);
    }
    if let Some(rest) = pattern.strip_suffix('*') {
        pattern = format!("{}%", rest);
    }
    pattern
}
