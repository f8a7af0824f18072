//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "$B$2", "AA100") and zero-indexed column/row coordinates.
//!
//! `$` markers are an annotation on references written inside formulas; they
//! are returned separately as an [`Anchor`] and never stored on [`CellRef`].
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{EngineError, Result};

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is row-major: rows first, then columns.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// Absolute (`$`) markers on a reference, e.g. `B$3` has `row: true`.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub col: bool,
    pub row: bool,
}

/// Direction for [`CellRef::neighbor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<col_abs>\$?)(?<letters>[A-Za-z]+)(?<row_abs>\$?)(?<numbers>[0-9]+)$")
            .expect("cell address regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "$B$2", "aa10").
    /// Returns None if the input is invalid. Any `$` markers are discarded.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::decode(name).ok().map(|(cell, _)| cell)
    }

    /// Decode `[$]LETTERS[$]NUMBER` into a zero-based reference and its anchors.
    pub fn decode(text: &str) -> Result<(CellRef, Anchor)> {
        let invalid = || EngineError::InvalidAddress(text.to_string());
        let caps = address_re().captures(text).ok_or_else(invalid)?;

        let col = Self::letters_to_col(&caps["letters"]).ok_or_else(invalid)?;
        let row = caps["numbers"]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(invalid)?;

        let anchor = Anchor {
            col: !caps["col_abs"].is_empty(),
            row: !caps["row_abs"].is_empty(),
        };
        Ok((CellRef::new(col, row), anchor))
    }

    /// Encode signed coordinates into text form, failing on negative input.
    pub fn encode(col: i64, row: i64, anchor: Anchor) -> Result<String> {
        let cell = Self::try_from_signed(col, row)?;
        Ok(cell.to_anchored_string(anchor))
    }

    /// Build a reference from signed coordinates (e.g. after arithmetic on offsets).
    pub fn try_from_signed(col: i64, row: i64) -> Result<CellRef> {
        match (usize::try_from(col), usize::try_from(row)) {
            (Ok(col), Ok(row)) => Ok(CellRef::new(col, row)),
            _ => Err(EngineError::InvalidAddress(format!("({}, {})", col, row))),
        }
    }

    /// Format with `$` markers, e.g. `$A1`, `A$1`, `$A$1`.
    pub fn to_anchored_string(&self, anchor: Anchor) -> String {
        format!(
            "{}{}{}{}",
            if anchor.col { "$" } else { "" },
            Self::col_to_letters(self.col),
            if anchor.row { "$" } else { "" },
            self.row + 1
        )
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert spreadsheet-style letters to a column index (A -> 0, Z -> 25, AA -> 26).
    /// Case-insensitive. Returns None for empty input, non-letters, or overflow.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Whether this reference lies inside `[0, max_rows) x [0, max_cols)`.
    pub fn is_within(&self, max_rows: usize, max_cols: usize) -> bool {
        self.row < max_rows && self.col < max_cols
    }

    /// The adjacent cell in `direction`, or None if it would leave the sheet.
    pub fn neighbor(&self, direction: Direction, max_rows: usize, max_cols: usize) -> Option<CellRef> {
        let (col, row) = match direction {
            Direction::Up => (Some(self.col), self.row.checked_sub(1)),
            Direction::Down => (Some(self.col), self.row.checked_add(1)),
            Direction::Left => (self.col.checked_sub(1), Some(self.row)),
            Direction::Right => (self.col.checked_add(1), Some(self.row)),
        };
        let next = CellRef::new(col?, row?);
        next.is_within(max_rows, max_cols).then_some(next)
    }

    /// Parse a range like "A1:B5" into its two endpoints (in written order).
    pub fn parse_range(range: &str) -> Result<(CellRef, CellRef)> {
        let invalid = || EngineError::InvalidAddress(range.to_string());
        let (start, end) = range.split_once(':').ok_or_else(invalid)?;
        let (start, _) = Self::decode(start.trim()).map_err(|_| invalid())?;
        let (end, _) = Self::decode(end.trim()).map_err(|_| invalid())?;
        Ok((start, end))
    }
}

/// All cells of the inclusive rectangle spanned by `start` and `end`, row-major.
///
/// The corners may be given in any order: "B3:A1" yields the same cells as "A1:B3".
/// Cells are produced lazily; callers bound the rectangle before walking it.
pub fn cells_in_range(start: &CellRef, end: &CellRef) -> impl Iterator<Item = CellRef> + use<> {
    let (min, max) = range_corners(start, end);
    (min.row..=max.row)
        .flat_map(move |row| (min.col..=max.col).map(move |col| CellRef::new(col, row)))
}

/// Top-left and bottom-right corners of the rectangle spanned by `start` and `end`.
pub fn range_corners(start: &CellRef, end: &CellRef) -> (CellRef, CellRef) {
    (
        CellRef::new(start.col.min(end.col), start.row.min(end.row)),
        CellRef::new(start.col.max(end.col), start.row.max(end.row)),
    )
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::decode(s).map(|(cell, _)| cell)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}
