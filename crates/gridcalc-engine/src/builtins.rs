//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are ALL CAPS (e.g. `SUM`, `AVG`); lookup is
//!   case-insensitive.
//! - Functions receive fully evaluated arguments. Range arguments have already
//!   been expanded to one value per cell, row-major.
//! - If you add a built-in, add a [`Builtin`] variant, a `BUILTINS` entry and
//!   its arm in [`Builtin::apply`].

use crate::engine::{EngineError, Result, Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Builtin {
    Sum,
    Average,
    Count,
    Min,
    Max,
    If,
    Concat,
}

pub struct BuiltinInfo {
    pub sheet_name: &'static str,
    pub builtin: Builtin,
    pub description: &'static str,
}

pub const BUILTINS: &[BuiltinInfo] = &[
    BuiltinInfo {
        sheet_name: "SUM",
        builtin: Builtin::Sum,
        description: "Sum of numeric values",
    },
    BuiltinInfo {
        sheet_name: "AVERAGE",
        builtin: Builtin::Average,
        description: "Average of numeric values (0 when there are none)",
    },
    BuiltinInfo {
        sheet_name: "AVG",
        builtin: Builtin::Average,
        description: "Alias for AVERAGE",
    },
    BuiltinInfo {
        sheet_name: "COUNT",
        builtin: Builtin::Count,
        description: "Count of non-empty values",
    },
    BuiltinInfo {
        sheet_name: "MIN",
        builtin: Builtin::Min,
        description: "Minimum numeric value (0 when there are none)",
    },
    BuiltinInfo {
        sheet_name: "MAX",
        builtin: Builtin::Max,
        description: "Maximum numeric value (0 when there are none)",
    },
    BuiltinInfo {
        sheet_name: "IF",
        builtin: Builtin::If,
        description: "IF(condition, when_true[, when_false])",
    },
    BuiltinInfo {
        sheet_name: "CONCAT",
        builtin: Builtin::Concat,
        description: "Join values as text, skipping empty cells",
    },
];

/// Find a built-in by name, ignoring case.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|info| info.sheet_name.eq_ignore_ascii_case(name))
        .map(|info| info.builtin)
}

impl Builtin {
    /// Whether range arguments are allowed. `IF` takes scalars only.
    pub fn accepts_ranges(self) -> bool {
        !matches!(self, Builtin::If)
    }

    /// Reject a call with the wrong number of arguments before any of them is
    /// evaluated.
    pub fn check_arity(self, name: &str, got: usize) -> Result<()> {
        match self {
            Builtin::If if !(2..=3).contains(&got) => Err(EngineError::Arity {
                name: name.to_string(),
                expected: "2 or 3",
                got,
            }),
            _ => Ok(()),
        }
    }

    pub fn apply(self, args: Vec<Value>) -> Result<Value> {
        let value = match self {
            Builtin::Sum => Value::Number(numbers(&args).sum()),
            Builtin::Average => {
                let (sum, count) = numbers(&args).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
                Value::Number(if count == 0 { 0.0 } else { sum / count as f64 })
            }
            Builtin::Count => Value::Number(args.iter().filter(|v| !v.is_blank()).count() as f64),
            Builtin::Min => Value::Number(numbers(&args).reduce(f64::min).unwrap_or(0.0)),
            Builtin::Max => Value::Number(numbers(&args).reduce(f64::max).unwrap_or(0.0)),
            Builtin::If => {
                let mut args = args.into_iter();
                let condition = args.next().unwrap_or_default();
                let when_true = args.next().unwrap_or_default();
                let when_false = args.next().unwrap_or(Value::Bool(false));
                if condition.is_truthy() {
                    when_true
                } else {
                    when_false
                }
            }
            Builtin::Concat => Value::Text(
                args.iter()
                    .filter(|v| !v.is_null())
                    .map(Value::to_string)
                    .collect(),
            ),
        };
        Ok(value)
    }
}

/// Numeric values only; text, booleans, nulls and NaN are skipped.
fn numbers(values: &[Value]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(Value::as_number)
}
