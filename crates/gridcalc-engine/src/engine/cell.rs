//! Cell and sheet data structures.
//!
//! - [`Cell`] - literal, formula (source + parsed AST) or stored error
//! - [`Sheet`] - extents plus sparse cell storage, the unit the evaluator reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ast::Expr;
use super::cell_ref::CellRef;
use super::error::ErrorCode;
use super::parser::parse_formula;
use super::value::Value;

/// Contents of one occupied cell. Exactly one variant is active; edits
/// replace the whole cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cell {
    Literal {
        value: Value,
    },
    /// `ast` is `None` when `source` failed to parse.
    Formula {
        source: String,
        ast: Option<Expr>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl Cell {
    pub fn literal(value: impl Into<Value>) -> Cell {
        Cell::Literal {
            value: value.into(),
        }
    }

    /// Parse `source` into a formula cell. A parse failure still yields a
    /// formula cell, keeping the text so it can be edited later.
    pub fn formula(source: &str) -> Cell {
        let ast = match parse_formula(source) {
            Ok(ast) => Some(ast),
            Err(err) => {
                tracing::debug!(source, error = %err, "formula failed to parse");
                None
            }
        };
        Cell::Formula {
            source: source.to_string(),
            ast,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Cell {
        Cell::Error {
            code,
            message: message.into(),
        }
    }

    pub fn ast(&self) -> Option<&Expr> {
        match self {
            Cell::Formula { ast, .. } => ast.as_ref(),
            _ => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula { .. })
    }

    /// Text a user would edit: the literal, the formula source, or the error code.
    pub fn to_input_string(&self) -> String {
        match self {
            Cell::Literal { value } => value.to_string(),
            Cell::Formula { source, .. } => {
                if source.starts_with('=') {
                    source.clone()
                } else {
                    format!("={}", source)
                }
            }
            Cell::Error { code, .. } => format!("#{}!", code),
        }
    }
}

/// A rectangular sheet with sparse cell storage. Absent entries are empty cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub id: String,
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    cells: BTreeMap<CellRef, Cell>,
    pub updated_at: DateTime<Utc>,
}

impl Sheet {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rows: usize, cols: usize) -> Sheet {
        Sheet {
            id: id.into(),
            name: name.into(),
            rows,
            cols,
            cells: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn get(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cells.get(cell_ref)
    }

    /// Store a cell, replacing whatever was there.
    pub fn set(&mut self, cell_ref: CellRef, cell: Cell) {
        self.cells.insert(cell_ref, cell);
        self.touch();
    }

    pub fn remove(&mut self, cell_ref: &CellRef) -> Option<Cell> {
        let removed = self.cells.remove(cell_ref);
        self.touch();
        removed
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        cell_ref.is_within(self.rows, self.cols)
    }

    /// Append rows. Existing cells keep their addresses.
    pub fn extend_rows(&mut self, count: usize) {
        self.rows = self.rows.saturating_add(count);
        self.touch();
    }

    /// Append columns. Existing cells keep their addresses.
    pub fn extend_cols(&mut self, count: usize) {
        self.cols = self.cols.saturating_add(count);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding box of occupied cells as (top-left, bottom-right), or None if empty.
    pub fn data_bounds(&self) -> Option<(CellRef, CellRef)> {
        let mut cells = self.cells.keys();
        let first = cells.next()?;
        let (mut min_row, mut max_row) = (first.row, first.row);
        let (mut min_col, mut max_col) = (first.col, first.col);
        for cell in cells {
            min_row = min_row.min(cell.row);
            max_row = max_row.max(cell.row);
            min_col = min_col.min(cell.col);
            max_col = max_col.max(cell.col);
        }
        Some((CellRef::new(min_col, min_row), CellRef::new(max_col, max_row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_keeps_source_when_parse_fails() {
        let cell = Cell::formula("=SUM(A1");
        match &cell {
            Cell::Formula { source, ast } => {
                assert_eq!(source, "=SUM(A1");
                assert!(ast.is_none());
            }
            other => panic!("expected formula cell, got {:?}", other),
        }
        assert_eq!(cell.to_input_string(), "=SUM(A1");
    }

    #[test]
    fn test_formula_parses_ast() {
        let cell = Cell::formula("A1+1");
        assert!(cell.ast().is_some());
        assert_eq!(cell.to_input_string(), "=A1+1");
    }

    #[test]
    fn test_input_string_for_literals_and_errors() {
        assert_eq!(Cell::literal(3.5).to_input_string(), "3.5");
        assert_eq!(Cell::literal("Revenue").to_input_string(), "Revenue");
        let err = Cell::error(ErrorCode::Circular, "cycle");
        assert_eq!(err.to_input_string(), "#CIRCULAR!");
        assert!(!err.is_formula());
    }

    #[test]
    fn test_extend_keeps_cells() {
        let mut sheet = Sheet::new("s", "Sheet", 2, 2);
        let b2 = CellRef::new(1, 1);
        sheet.set(b2.clone(), Cell::literal(7));
        let before = sheet.updated_at;

        sheet.extend_rows(3);
        sheet.extend_cols(1);

        assert_eq!((sheet.rows, sheet.cols), (5, 3));
        assert_eq!(sheet.get(&b2), Some(&Cell::literal(7)));
        assert!(sheet.updated_at >= before);
        assert!(sheet.contains(&CellRef::new(2, 4)));
    }

    #[test]
    fn test_data_bounds() {
        let mut sheet = Sheet::new("s", "Sheet", 20, 10);
        assert_eq!(sheet.data_bounds(), None);
        sheet.set(CellRef::new(3, 1), Cell::literal(1));
        sheet.set(CellRef::new(1, 5), Cell::literal("x"));
        assert_eq!(
            sheet.data_bounds(),
            Some((CellRef::new(1, 1), CellRef::new(3, 5)))
        );
    }
}
