//! Edit requests passed in from the calling layer.

use crate::error::Result;
use gridcalc_engine::engine::{CellRef, Value, parse_decimal};
use serde::{Deserialize, Serialize};

/// A single cell edit. Addresses are in `A1` notation, case-insensitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Edit {
    Clear { address: String },
    Formula { address: String, source: String },
    Literal { address: String, value: Value },
}

impl Edit {
    /// Interpret raw user input the way a grid cell would:
    /// - empty -> clear
    /// - `=...` -> formula
    /// - `"..."` -> text without the quotes
    /// - number, `TRUE`/`FALSE` -> number or bool
    /// - anything else -> text
    pub fn from_input(address: &str, input: &str) -> Edit {
        let address = address.to_string();
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Edit::Clear { address };
        }
        if trimmed.starts_with('=') {
            return Edit::Formula {
                address,
                source: trimmed.to_string(),
            };
        }

        let value = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            Value::Text(trimmed[1..trimmed.len() - 1].to_string())
        } else if let Some(n) = parse_decimal(trimmed) {
            Value::Number(n)
        } else if trimmed.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else {
            Value::Text(trimmed.to_string())
        };
        Edit::Literal { address, value }
    }

    pub fn address(&self) -> &str {
        match self {
            Edit::Clear { address } | Edit::Formula { address, .. } | Edit::Literal { address, .. } => {
                address
            }
        }
    }

    /// Decode the target address.
    pub fn cell_ref(&self) -> Result<CellRef> {
        let (cell_ref, _) = CellRef::decode(self.address())?;
        Ok(cell_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_input_classifies_values() {
        assert_eq!(
            Edit::from_input("A1", "  "),
            Edit::Clear {
                address: "A1".to_string()
            }
        );
        assert_eq!(
            Edit::from_input("A1", "=SUM(B1:B3)"),
            Edit::Formula {
                address: "A1".to_string(),
                source: "=SUM(B1:B3)".to_string()
            }
        );

        let literal = |input: &str| match Edit::from_input("A1", input) {
            Edit::Literal { value, .. } => value,
            other => panic!("expected literal, got {:?}", other),
        };
        assert_eq!(literal("42"), Value::Number(42.0));
        assert_eq!(literal("-1.5"), Value::Number(-1.5));
        assert_eq!(literal("true"), Value::Bool(true));
        assert_eq!(literal("FALSE"), Value::Bool(false));
        assert_eq!(literal("\"42\""), Value::from("42"));
        assert_eq!(literal("Revenue"), Value::from("Revenue"));
        assert_eq!(literal("inf"), Value::from("inf"));
    }

    #[test]
    fn test_cell_ref_decodes_address() {
        let edit = Edit::from_input("$c$3", "1");
        assert_eq!(edit.cell_ref().unwrap(), CellRef::new(2, 2));
        assert!(Edit::from_input("3C", "1").cell_ref().is_err());
    }
}
