//! Runtime values produced by literal cells and formula evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A computed or literal cell value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    #[default]
    Null,
}

/// Plain finite decimals only: `inf`, `infinity` and `NaN` in any case are
/// not numbers.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let starts_numeric = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if !starts_numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl Value {
    /// Coerce to a number for arithmetic and ordering comparisons.
    ///
    /// - numbers pass through (NaN becomes 0)
    /// - text is parsed as a finite decimal (failure becomes 0)
    /// - booleans become 1 / 0
    /// - null becomes 0
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) if n.is_nan() => 0.0,
            Value::Number(n) => *n,
            Value::Text(s) => parse_decimal(s.trim()).unwrap_or(0.0),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Null => 0.0,
        }
    }

    /// The numeric payload for aggregate functions: numbers only, NaN skipped.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// Truthiness used by `IF`: nonzero numbers, non-empty text, `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Null => false,
        }
    }

    /// Strict equality for `=` / `<>`: same variant and same payload.
    /// A number never equals text, so `5` and `"5"` differ.
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or empty text. `COUNT` skips these.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Canonical number-to-text conversion: integers without a fractional part,
/// no negative zero.
pub fn canonical_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Canonical string conversion used by `CONCAT`, text comparison and export.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&canonical_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
