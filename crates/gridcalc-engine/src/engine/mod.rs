//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`Value`] - Literal and computed values with their coercion rules
//! - [`parse_formula`] - Lexer + precedence-climbing parser producing an [`Expr`]
//! - [`Cell`], [`Sheet`] - Data structures for cell storage
//! - [`extract_dependencies`] - Cells a parsed formula reads inside the sheet
//! - [`DependencyGraph`] - Cycle checks and recalculation ordering
//! - [`Evaluator`] - Evaluate cells to an [`EvalResult`]
//! - [`format_display`], [`format_result`] - Format results for display and export

mod ast;
mod cell;
mod cell_ref;
mod deps;
mod error;
mod eval;
mod format;
mod graph;
mod lexer;
mod parser;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use cell::{Cell, Sheet};
pub use cell_ref::{Anchor, CellRef, Direction, cells_in_range, range_corners};
pub use deps::extract_dependencies;
pub use error::{CellError, EngineError, ErrorCode, Result};
pub use eval::{EvalPolicy, EvalResult, Evaluator, TraceStep};
pub use format::{format_display, format_error_code, format_number, format_result};
pub use graph::{DependencyGraph, EvaluationOrder};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::parse_formula;
pub use value::{Value, canonical_number, parse_decimal};
