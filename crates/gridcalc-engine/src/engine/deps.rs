//! Dependency extraction from parsed formulas.
//!
//! Walks an AST to find every cell it reads (e.g., `A1`, every cell of
//! `B2:C5`). The result feeds the dependency graph for cycle detection and
//! recalculation ordering. String literals never contribute references since
//! they are already separate AST nodes. Cells outside the sheet extents are
//! left out: they can never hold a formula, so they never close a cycle.

use std::collections::HashSet;

use super::ast::Expr;
use super::cell_ref::{CellRef, cells_in_range, range_corners};

/// Extract all cell references from a formula as dependencies.
///
/// Only cells inside a `rows` x `cols` sheet are returned. Ranges expand to
/// their member cells, clipped to the sheet. Duplicates are removed, first
/// occurrence wins.
pub fn extract_dependencies(expr: &Expr, rows: usize, cols: usize) -> Vec<CellRef> {
    let mut collector = Collector {
        rows,
        cols,
        deps: Vec::new(),
        seen: HashSet::new(),
    };
    collector.collect(expr);
    collector.deps
}

struct Collector {
    rows: usize,
    cols: usize,
    deps: Vec<CellRef>,
    seen: HashSet<CellRef>,
}

impl Collector {
    fn collect(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) => {}
            Expr::Ref { cell, .. } => {
                if cell.is_within(self.rows, self.cols) {
                    self.push(cell.clone());
                }
            }
            Expr::Range { start, end, .. } => {
                let (min, max) = range_corners(start, end);
                if !min.is_within(self.rows, self.cols) {
                    return;
                }
                let clipped = CellRef::new(max.col.min(self.cols - 1), max.row.min(self.rows - 1));
                for cell in cells_in_range(&min, &clipped) {
                    self.push(cell);
                }
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    self.collect(arg);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.collect(left);
                self.collect(right);
            }
            Expr::Unary { operand, .. } => self.collect(operand),
        }
    }

    fn push(&mut self, cell: CellRef) {
        if self.seen.insert(cell.clone()) {
            self.deps.push(cell);
        }
    }
}
