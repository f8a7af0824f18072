use super::Document;
use gridcalc_engine::engine::{CellRef, EvalResult, format_display};
use std::collections::BTreeMap;

impl Document {
    /// Evaluate one cell, optionally recording the explain trace.
    pub fn evaluate_cell(&self, cell_ref: &CellRef, trace: bool) -> EvalResult {
        self.evaluator.evaluate_cell(&self.sheet, cell_ref, trace)
    }

    /// Evaluate a formula that is not stored on the sheet, against the current cells.
    pub fn evaluate_formula(&self, source: &str, trace: bool) -> EvalResult {
        self.evaluator.evaluate_formula(&self.sheet, source, trace)
    }

    /// Evaluate every occupied cell. Each cell is evaluated on its own, so a
    /// failing cell only affects the cells that read it.
    pub fn evaluate_sheet(&self) -> BTreeMap<CellRef, EvalResult> {
        self.sheet
            .iter()
            .map(|(cell_ref, _)| (cell_ref.clone(), self.evaluate_cell(cell_ref, false)))
            .collect()
    }

    /// Human-readable value for a cell (`#DIV0!`, `3.33`, `TRUE`...).
    pub fn display(&self, cell_ref: &CellRef) -> String {
        format_display(&self.evaluate_cell(cell_ref, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::{Cell, ErrorCode, Value};
    use pretty_assertions::assert_eq;

    fn c(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    #[test]
    fn test_evaluate_sheet_isolates_failures() {
        let mut doc = Document::empty("t", "T", 10, 5);
        doc.update_cell(c("A1"), Cell::formula("=1/0")).unwrap();
        doc.update_cell(c("A2"), Cell::formula("=A1+1")).unwrap();
        doc.update_cell(c("B1"), Cell::literal(7)).unwrap();
        doc.update_cell(c("B2"), Cell::formula("=B1*2")).unwrap();

        let results = doc.evaluate_sheet();
        assert_eq!(results.len(), 4);
        assert_eq!(results[&c("A1")].error_code(), Some(ErrorCode::Div0));
        assert_eq!(results[&c("A2")].error_code(), Some(ErrorCode::Div0));
        assert_eq!(results[&c("B2")].value(), Some(&Value::Number(14.0)));
    }

    #[test]
    fn test_display_formats_values() {
        let mut doc = Document::empty("t", "T", 10, 5);
        doc.update_cell(c("A1"), Cell::formula("=10/3")).unwrap();
        doc.update_cell(c("A2"), Cell::formula("=1/0")).unwrap();
        doc.update_cell(c("A3"), Cell::formula("=1<2")).unwrap();

        assert_eq!(doc.display(&c("A1")), "3.33");
        assert_eq!(doc.display(&c("A2")), "#DIV0!");
        assert_eq!(doc.display(&c("A3")), "TRUE");
        assert_eq!(doc.display(&c("A4")), "");
    }

    #[test]
    fn test_trace_only_when_requested() {
        let mut doc = Document::empty("t", "T", 10, 5);
        doc.update_cell(c("A1"), Cell::formula("=2*3")).unwrap();

        assert!(doc.evaluate_cell(&c("A1"), false).explain.is_none());
        let traced = doc.evaluate_cell(&c("A1"), true);
        assert!(!traced.explain.unwrap_or_default().is_empty());
    }
}
