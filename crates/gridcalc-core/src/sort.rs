//! Row sort over a range, keyed by evaluated values.

use crate::error::{CoreError, Result};
use gridcalc_engine::engine::{CellRef, Evaluator, Sheet, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Row span and key column for [`sort_range`]. Rows are zero-based and inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortOptions {
    pub start_row: usize,
    pub end_row: usize,
    pub sort_column: usize,
    pub ascending: bool,
}

/// Explicit region for a [`SortRequest`], zero-based and inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// A sort as requested by the calling layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub column: usize,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    #[serde(default)]
    pub range: Option<SortRange>,
}

fn default_ascending() -> bool {
    true
}

impl SortRequest {
    /// Turn the request into concrete sort options.
    ///
    /// Without an explicit range the occupied bounding box is used, and row 0
    /// is treated as a header (left in place) when `A1` is occupied.
    /// Returns None when there is nothing to sort.
    pub fn resolve(&self, sheet: &Sheet) -> Option<SortOptions> {
        let (start_row, end_row) = match &self.range {
            Some(range) => (range.start_row, range.end_row),
            None => {
                let (top_left, bottom_right) = sheet.data_bounds()?;
                let mut start_row = top_left.row;
                if start_row == 0 && sheet.get(&CellRef::new(0, 0)).is_some() {
                    start_row = 1;
                }
                (start_row, bottom_right.row)
            }
        };
        if start_row > end_row {
            return None;
        }
        Some(SortOptions {
            start_row,
            end_row,
            sort_column: self.column,
            ascending: self.ascending,
        })
    }
}

/// Sort whole rows in `[start_row, end_row]` by the evaluated value in
/// `sort_column` and return the new sheet.
///
/// Empty cells and cells that evaluate to an error sort last in both
/// directions. Numbers compare numerically, anything else by lowercase text.
/// The sort is stable, so sorting sorted rows again changes nothing. Formulas
/// move with their row and are not rewritten.
pub fn sort_range(sheet: &Sheet, evaluator: &Evaluator, options: &SortOptions) -> Result<Sheet> {
    let SortOptions {
        start_row,
        end_row,
        sort_column,
        ascending,
    } = *options;

    if start_row > end_row || end_row >= sheet.rows || sort_column >= sheet.cols {
        return Err(CoreError::InvalidRange(format!(
            "rows {}..={} by column {} on a {}x{} sheet",
            start_row + 1,
            end_row + 1,
            CellRef::col_to_letters(sort_column),
            sheet.rows,
            sheet.cols
        )));
    }

    let mut keyed: Vec<(usize, Option<Value>)> = (start_row..=end_row)
        .map(|row| {
            let key_ref = CellRef::new(sort_column, row);
            let key = evaluator
                .evaluate_cell(sheet, &key_ref, false)
                .value()
                .filter(|value| !value.is_null())
                .cloned();
            (row, key)
        })
        .collect();

    keyed.sort_by(|(_, a), (_, b)| compare_keys(a.as_ref(), b.as_ref(), ascending));

    let mut sorted = sheet.clone();
    let moved: Vec<(CellRef, _)> = sheet
        .iter()
        .filter(|(cell_ref, _)| (start_row..=end_row).contains(&cell_ref.row))
        .map(|(cell_ref, cell)| (cell_ref.clone(), cell.clone()))
        .collect();
    for (cell_ref, _) in &moved {
        sorted.remove(cell_ref);
    }

    for (offset, (source_row, _)) in keyed.iter().enumerate() {
        let target_row = start_row + offset;
        for (cell_ref, cell) in moved.iter().filter(|(r, _)| r.row == *source_row) {
            sorted.set(CellRef::new(cell_ref.col, target_row), cell.clone());
        }
    }

    tracing::debug!(
        sheet = %sheet.id,
        rows = keyed.len(),
        column = %CellRef::col_to_letters(sort_column),
        ascending,
        "range sorted"
    );
    Ok(sorted)
}

fn compare_keys(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_values(a, b);
            if ascending { ordering } else { ordering.reverse() }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::Cell;
    use pretty_assertions::assert_eq;

    fn c(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn column(sheet: &Sheet, col: &str, rows: std::ops::RangeInclusive<usize>) -> Vec<Option<Cell>> {
        rows.map(|row| sheet.get(&c(&format!("{}{}", col, row))).cloned())
            .collect()
    }

    fn fruit_sheet() -> Sheet {
        let mut sheet = Sheet::new("s", "S", 10, 4);
        for (row, (name, qty)) in [("pear", Some(3)), ("Apple", None), ("fig", Some(10)), ("kiwi", Some(1))]
            .into_iter()
            .enumerate()
        {
            sheet.set(CellRef::new(0, row), Cell::literal(name));
            if let Some(qty) = qty {
                sheet.set(CellRef::new(1, row), Cell::literal(qty));
            }
        }
        sheet
    }

    fn options(start_row: usize, end_row: usize, sort_column: usize, ascending: bool) -> SortOptions {
        SortOptions {
            start_row,
            end_row,
            sort_column,
            ascending,
        }
    }

    #[test]
    fn test_sort_numbers_with_empty_last_both_directions() {
        let sheet = fruit_sheet();
        let evaluator = Evaluator::default();

        let asc = sort_range(&sheet, &evaluator, &options(0, 3, 1, true)).unwrap();
        assert_eq!(
            column(&asc, "A", 1..=4),
            vec![
                Some(Cell::literal("kiwi")),
                Some(Cell::literal("pear")),
                Some(Cell::literal("fig")),
                Some(Cell::literal("Apple")),
            ]
        );
        assert_eq!(asc.get(&c("B4")), None);

        let desc = sort_range(&sheet, &evaluator, &options(0, 3, 1, false)).unwrap();
        assert_eq!(
            column(&desc, "A", 1..=4),
            vec![
                Some(Cell::literal("fig")),
                Some(Cell::literal("pear")),
                Some(Cell::literal("kiwi")),
                Some(Cell::literal("Apple")),
            ]
        );
    }

    #[test]
    fn test_sort_text_case_insensitive() {
        let sheet = fruit_sheet();
        let sorted = sort_range(&sheet, &Evaluator::default(), &options(0, 3, 0, true)).unwrap();
        assert_eq!(
            column(&sorted, "A", 1..=4),
            vec![
                Some(Cell::literal("Apple")),
                Some(Cell::literal("fig")),
                Some(Cell::literal("kiwi")),
                Some(Cell::literal("pear")),
            ]
        );
    }

    #[test]
    fn test_sort_is_idempotent() {
        let evaluator = Evaluator::default();
        let once = sort_range(&fruit_sheet(), &evaluator, &options(0, 3, 1, true)).unwrap();
        let twice = sort_range(&once, &evaluator, &options(0, 3, 1, true)).unwrap();
        let cells = |s: &Sheet| s.iter().map(|(r, c)| (r.clone(), c.clone())).collect::<Vec<_>>();
        assert_eq!(cells(&once), cells(&twice));
    }

    #[test]
    fn test_sort_uses_formula_values_and_leaves_outside_rows() {
        let mut sheet = Sheet::new("s", "S", 10, 4);
        sheet.set(c("A1"), Cell::literal("header"));
        sheet.set(c("A2"), Cell::formula("=5*2"));
        sheet.set(c("A3"), Cell::literal(3));
        sheet.set(c("A4"), Cell::formula("=1/0"));
        sheet.set(c("A5"), Cell::literal("footer"));

        let sorted = sort_range(&sheet, &Evaluator::default(), &options(1, 3, 0, true)).unwrap();
        assert_eq!(
            column(&sorted, "A", 1..=5),
            vec![
                Some(Cell::literal("header")),
                Some(Cell::literal(3)),
                Some(Cell::formula("=5*2")),
                Some(Cell::formula("=1/0")),
                Some(Cell::literal("footer")),
            ]
        );
    }

    #[test]
    fn test_sort_rejects_bad_ranges() {
        let sheet = fruit_sheet();
        let evaluator = Evaluator::default();
        assert!(sort_range(&sheet, &evaluator, &options(3, 1, 0, true)).is_err());
        assert!(sort_range(&sheet, &evaluator, &options(0, 10, 0, true)).is_err());
        assert!(sort_range(&sheet, &evaluator, &options(0, 3, 4, true)).is_err());
    }

    #[test]
    fn test_request_skips_header_when_a1_occupied() {
        let sheet = fruit_sheet();
        let request = SortRequest {
            column: 1,
            ascending: false,
            range: None,
        };
        assert_eq!(request.resolve(&sheet), Some(options(1, 3, 1, false)));

        let mut no_header = Sheet::new("s", "S", 10, 4);
        no_header.set(c("B1"), Cell::literal(2));
        no_header.set(c("B3"), Cell::literal(1));
        assert_eq!(request.resolve(&no_header), Some(options(0, 2, 1, false)));

        assert_eq!(request.resolve(&Sheet::new("s", "S", 10, 4)), None);
    }

    #[test]
    fn test_request_with_explicit_range() {
        let request = SortRequest {
            column: 0,
            ascending: true,
            range: Some(SortRange {
                start_row: 2,
                end_row: 5,
                start_col: 0,
                end_col: 3,
            }),
        };
        assert_eq!(request.resolve(&fruit_sheet()), Some(options(2, 5, 0, true)));
    }
}
