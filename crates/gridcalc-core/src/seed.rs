//! Built-in demo sheet.

use gridcalc_engine::engine::{Cell, CellRef, Sheet, Value};

pub const SEED_SHEET_ID: &str = "seed-sheet-1";

/// Cell contents of the demo sheet as (address, input).
const BUDGET_CELLS: &[(&str, &str)] = &[
    ("A1", "Revenue"),
    ("B1", "Cost"),
    ("C1", "Profit"),
    ("A3", "1000"),
    ("B3", "300"),
    ("C3", "=A3-B3"),
    ("A4", "2000"),
    ("B4", "1250"),
    ("C4", "=A4-B4"),
    ("A5", "=SUM(A3:A4)"),
    ("B5", "=SUM(B3:B4)"),
    ("C5", "=SUM(C3:C4)"),
    ("D3", "=A3-B$3"),
    // C6 and C7 read each other.
    ("C6", "=C7+1"),
    ("C7", "=C6+1"),
    ("F1", "Formula Tests"),
    ("E3", "10"),
    ("E4", "20"),
    ("E5", "30"),
    ("E6", "5"),
    ("F3", "SUM:"),
    ("G3", "=SUM(E3:E5)"),
    ("F4", "AVG:"),
    ("G4", "=AVERAGE(E3:E5)"),
    ("F5", "COUNT:"),
    ("G5", "=COUNT(E3:E6)"),
    ("F6", "MIN:"),
    ("G6", "=MIN(E3:E6)"),
    ("F7", "MAX:"),
    ("G7", "=MAX(E3:E6)"),
    ("F8", "IF:"),
    ("G8", "=IF(E3>15,\"High\",\"Low\")"),
    ("F9", "CONCAT:"),
    ("E9", "Hello"),
    ("E10", "World"),
    ("G9", "=CONCAT(E9,\" \",E10)"),
];

/// The "Budget Calculator" sheet: a small budget table, a formula test area
/// covering every built-in, and a two-cell reference cycle.
///
/// Cells are written straight into the sheet, so the cycle is present at
/// rest. Loading the sheet into a `Document` drops the closing edge from the
/// graph and both cells evaluate to `CIRCULAR`.
pub fn budget_sheet() -> Sheet {
    let mut sheet = Sheet::new(SEED_SHEET_ID, "Budget Calculator", 20, 10);
    for (address, input) in BUDGET_CELLS {
        let Some(cell_ref) = CellRef::from_str(address) else {
            continue;
        };
        let cell = if input.starts_with('=') {
            Cell::formula(input)
        } else if let Ok(n) = input.parse::<f64>() {
            Cell::literal(n)
        } else {
            Cell::literal(Value::from(*input))
        };
        sheet.set(cell_ref, cell);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_cells_are_within_bounds_and_parse() {
        let sheet = budget_sheet();
        assert_eq!(sheet.len(), BUDGET_CELLS.len());
        for (cell_ref, cell) in sheet.iter() {
            assert!(sheet.contains(cell_ref), "{} out of bounds", cell_ref);
            if cell.is_formula() {
                assert!(cell.ast().is_some(), "{} failed to parse", cell_ref);
            }
        }
    }
}
