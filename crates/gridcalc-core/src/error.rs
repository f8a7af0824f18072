//! Error types for gridcalc core.

use thiserror::Error;

use gridcalc_engine::engine::{CellRef, EngineError};

/// Errors that can occur while editing, sorting, storing or importing sheets.
///
/// Formula evaluation failures are not here: those are values on an
/// `EvalResult`, never errors of the operation that triggered them.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Cell {cell} is outside the {rows}x{cols} sheet")]
    OutOfBounds {
        cell: CellRef,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
