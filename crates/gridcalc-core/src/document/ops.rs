use super::Document;
use crate::edit::Edit;
use crate::error::Result;
use crate::sort::{SortOptions, sort_range};
use gridcalc_engine::engine::{
    Cell, CellError, CellRef, ErrorCode, EvalResult, extract_dependencies,
};

/// What an edit changed: the edited cell and every cell that reads it,
/// re-evaluated in dependency order.
#[derive(Clone, Debug, PartialEq)]
pub struct Recalculation {
    pub cell: CellRef,
    /// The edit would have closed a cycle; the cell was stored as a `CIRCULAR` error.
    pub rejected_cycle: bool,
    pub results: Vec<(CellRef, EvalResult)>,
}

impl Recalculation {
    pub fn result_for(&self, cell_ref: &CellRef) -> Option<&EvalResult> {
        self.results
            .iter()
            .find(|(cell, _)| cell == cell_ref)
            .map(|(_, result)| result)
    }

    /// Cells in the order they were evaluated.
    pub fn order(&self) -> Vec<&CellRef> {
        self.results.iter().map(|(cell, _)| cell).collect()
    }
}

impl Document {
    /// Apply an edit request from the calling layer.
    pub fn apply_edit(&mut self, edit: Edit) -> Result<Recalculation> {
        let cell_ref = edit.cell_ref()?;
        match edit {
            Edit::Clear { .. } => self.clear_cell(&cell_ref),
            Edit::Formula { source, .. } => self.update_cell(cell_ref, Cell::formula(&source)),
            Edit::Literal { value, .. } => self.update_cell(cell_ref, Cell::literal(value)),
        }
    }

    /// Store `cell` at `cell_ref`, update the dependency graph and re-evaluate
    /// everything that depends on it.
    ///
    /// - a formula that failed to parse is stored as-is and the graph is left alone
    /// - a formula that would close a cycle is stored as a `CIRCULAR` error cell
    ///   with no outgoing edges
    pub fn update_cell(&mut self, cell_ref: CellRef, cell: Cell) -> Result<Recalculation> {
        self.check_bounds(&cell_ref)?;

        if let Cell::Formula { ast: None, .. } = &cell {
            self.sheet.set(cell_ref.clone(), cell);
            return Ok(self.recalculate(cell_ref, false));
        }

        self.graph.remove_outgoing_edges(&cell_ref);
        let (rows, cols) = (self.sheet.rows, self.sheet.cols);
        let deps = cell
            .ast()
            .map(|ast| extract_dependencies(ast, rows, cols))
            .unwrap_or_default();

        if let Some(dep) = deps
            .iter()
            .find(|dep| self.graph.would_create_cycle(&cell_ref, dep))
        {
            tracing::warn!(cell = %cell_ref, dependency = %dep, "edit rejected: circular reference");
            let message = format!("Circular reference detected: {} -> {}", cell_ref, dep);
            self.sheet.set(cell_ref.clone(), Cell::error(ErrorCode::Circular, message));
            return Ok(self.recalculate(cell_ref, true));
        }

        for dep in deps {
            self.graph.add_edge(cell_ref.clone(), dep);
        }
        self.sheet.set(cell_ref.clone(), cell);
        Ok(self.recalculate(cell_ref, false))
    }

    /// Remove the cell at `cell_ref`. Cells that read it now see an empty cell.
    pub fn clear_cell(&mut self, cell_ref: &CellRef) -> Result<Recalculation> {
        self.check_bounds(cell_ref)?;
        self.graph.remove_outgoing_edges(cell_ref);
        self.sheet.remove(cell_ref);
        Ok(self.recalculate(cell_ref.clone(), false))
    }

    /// Append rows to the sheet. Existing cells are untouched; the graph is
    /// rebuilt so formulas pick up edges to cells that are now inside the sheet.
    pub fn extend_rows(&mut self, count: usize) {
        self.sheet.extend_rows(count);
        self.rebuild_graph();
    }

    /// Append columns to the sheet. Existing cells are untouched.
    pub fn extend_cols(&mut self, count: usize) {
        self.sheet.extend_cols(count);
        self.rebuild_graph();
    }

    /// Sort whole rows of the sheet by one column, then rebuild the graph for
    /// the moved formulas.
    pub fn sort_range(&mut self, options: &SortOptions) -> Result<()> {
        self.sheet = sort_range(&self.sheet, &self.evaluator, options)?;
        self.rebuild_graph();
        Ok(())
    }

    /// Evaluate `cell_ref` and its transitive dependents in dependency order.
    /// Results are returned, never cached on the sheet.
    fn recalculate(&self, cell_ref: CellRef, rejected_cycle: bool) -> Recalculation {
        let mut affected: Vec<CellRef> = self.graph.dependents_closure(&cell_ref).into_iter().collect();
        affected.push(cell_ref.clone());
        let order = self.graph.evaluation_order(&affected);

        let mut results: Vec<(CellRef, EvalResult)> = order
            .order
            .into_iter()
            .map(|cell| {
                let result = self.evaluator.evaluate_cell(&self.sheet, &cell, false);
                (cell, result)
            })
            .collect();

        for cell in order.cyclic {
            let message = format!("Circular reference detected: {}", cell);
            results.push((
                cell,
                EvalResult {
                    outcome: Err(CellError::new(ErrorCode::Circular, message)),
                    explain: None,
                },
            ));
        }

        tracing::debug!(
            cell = %cell_ref,
            recalculated = results.len(),
            "recalculation finished"
        );
        Recalculation {
            cell: cell_ref,
            rejected_cycle,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::{Sheet, Value};
    use pretty_assertions::assert_eq;

    fn c(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn doc() -> Document {
        Document::empty("test", "Test", 20, 10)
    }

    fn value(doc: &Document, name: &str) -> Option<Value> {
        doc.evaluate_cell(&c(name), false).value().cloned()
    }

    #[test]
    fn test_update_recalculates_dependents_in_order() {
        let mut doc = doc();
        doc.update_cell(c("A1"), Cell::literal(1)).unwrap();
        doc.update_cell(c("B1"), Cell::formula("=A1*10")).unwrap();
        doc.update_cell(c("C1"), Cell::formula("=B1+A1")).unwrap();

        let recalc = doc.update_cell(c("A1"), Cell::literal(2)).unwrap();
        assert_eq!(recalc.order(), vec![&c("A1"), &c("B1"), &c("C1")]);
        assert_eq!(
            recalc.result_for(&c("C1")).and_then(|r| r.value()),
            Some(&Value::Number(22.0))
        );
        assert!(!recalc.rejected_cycle);
    }

    #[test]
    fn test_values_are_not_cached() {
        let mut doc = doc();
        doc.update_cell(c("A1"), Cell::literal(1)).unwrap();
        doc.update_cell(c("B1"), Cell::formula("=A1+1")).unwrap();
        assert_eq!(doc.sheet().get(&c("B1")), Some(&Cell::formula("=A1+1")));

        doc.update_cell(c("A1"), Cell::literal(41)).unwrap();
        assert_eq!(value(&doc, "B1"), Some(Value::Number(42.0)));
    }

    #[test]
    fn test_parse_failure_keeps_text_and_graph() {
        let mut doc = doc();
        doc.update_cell(c("B1"), Cell::formula("=A1+1")).unwrap();
        let graph_before = doc.graph().clone();

        let recalc = doc.update_cell(c("B1"), Cell::formula("=SUM(A1")).unwrap();

        assert_eq!(doc.graph(), &graph_before);
        assert_eq!(doc.sheet().get(&c("B1")).unwrap().to_input_string(), "=SUM(A1");
        assert_eq!(
            recalc.result_for(&c("B1")).and_then(|r| r.error_code()),
            Some(ErrorCode::Parse)
        );
    }

    #[test]
    fn test_cycle_is_rejected_before_commit() {
        let mut doc = doc();
        doc.update_cell(c("C6"), Cell::formula("=C7+1")).unwrap();
        let recalc = doc.update_cell(c("C7"), Cell::formula("=C6+1")).unwrap();

        assert!(recalc.rejected_cycle);
        assert!(matches!(
            doc.sheet().get(&c("C7")),
            Some(Cell::Error {
                code: ErrorCode::Circular,
                ..
            })
        ));
        assert_eq!(doc.graph().dependencies_of(&c("C7")).count(), 0);
        assert!(doc.graph().is_consistent());

        // C6 reads the error cell and reports the same code.
        let c6 = doc.evaluate_cell(&c("C6"), false);
        assert_eq!(c6.error_code(), Some(ErrorCode::Circular));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut doc = doc();
        let recalc = doc.update_cell(c("A1"), Cell::formula("=A1")).unwrap();
        assert!(recalc.rejected_cycle);
        assert_eq!(doc.graph().edge_count(), 0);
    }

    #[test]
    fn test_fixing_a_cycle_restores_values() {
        let mut doc = doc();
        doc.update_cell(c("C6"), Cell::formula("=C7+1")).unwrap();
        doc.update_cell(c("C7"), Cell::formula("=C6+1")).unwrap();

        let recalc = doc.update_cell(c("C7"), Cell::literal(5)).unwrap();
        assert_eq!(
            recalc.result_for(&c("C6")).and_then(|r| r.value()),
            Some(&Value::Number(6.0))
        );
    }

    #[test]
    fn test_clear_cell_recalculates_readers() {
        let mut doc = doc();
        doc.update_cell(c("A1"), Cell::literal(3)).unwrap();
        doc.update_cell(c("B1"), Cell::formula("=A1*2")).unwrap();

        let recalc = doc.clear_cell(&c("A1")).unwrap();
        assert_eq!(doc.sheet().get(&c("A1")), None);
        assert_eq!(
            recalc.result_for(&c("B1")).and_then(|r| r.value()),
            Some(&Value::Number(0.0))
        );
    }

    #[test]
    fn test_edits_outside_sheet_are_rejected() {
        let mut doc = doc();
        assert!(doc.update_cell(c("K1"), Cell::literal(1)).is_err());
        assert!(doc.clear_cell(&c("A21")).is_err());
    }

    #[test]
    fn test_extend_keeps_existing_cells() {
        let mut doc = doc();
        doc.update_cell(c("J20"), Cell::literal("corner")).unwrap();
        doc.update_cell(c("A1"), Cell::formula("=J20")).unwrap();
        let before: Vec<_> = doc.sheet().iter().map(|(r, c)| (r.clone(), c.clone())).collect();

        doc.extend_rows(5);
        doc.extend_cols(2);

        let after: Vec<_> = doc.sheet().iter().map(|(r, c)| (r.clone(), c.clone())).collect();
        assert_eq!(before, after);
        assert_eq!((doc.sheet().rows, doc.sheet().cols), (25, 12));
        assert_eq!(value(&doc, "A1"), Some(Value::from("corner")));
        assert!(doc.update_cell(c("L25"), Cell::literal(1)).is_ok());
    }

    #[test]
    fn test_huge_range_formula_is_stored_with_clipped_edges() {
        let mut doc = doc();
        doc.update_cell(c("B1"), Cell::literal(5)).unwrap();
        let recalc = doc
            .update_cell(c("A1"), Cell::formula("=SUM(B1:ZZZZZZZZZZZZZ1)"))
            .unwrap();
        assert!(!recalc.rejected_cycle);
        assert_eq!(
            recalc.result_for(&c("A1")).and_then(|r| r.error_code()),
            Some(ErrorCode::Ref)
        );
        assert_eq!(
            doc.sheet().get(&c("A1")),
            Some(&Cell::formula("=SUM(B1:ZZZZZZZZZZZZZ1)"))
        );
        // B1..J1 only.
        assert_eq!(doc.graph().dependencies_of(&c("A1")).count(), 9);
        assert!(doc.graph().is_consistent());
    }

    #[test]
    fn test_extend_adds_edges_to_new_cells() {
        let mut doc = doc();
        doc.update_cell(c("A1"), Cell::formula("=K1+1")).unwrap();
        assert_eq!(doc.graph().dependencies_of(&c("A1")).count(), 0);

        doc.extend_cols(1);
        let recalc = doc.update_cell(c("K1"), Cell::literal(41)).unwrap();
        assert_eq!(recalc.order(), vec![&c("K1"), &c("A1")]);
        assert_eq!(value(&doc, "A1"), Some(Value::Number(42.0)));

        let rejected = doc.update_cell(c("K1"), Cell::formula("=A1")).unwrap();
        assert!(rejected.rejected_cycle);
    }

    #[test]
    fn test_apply_edit_variants() {
        let mut doc = doc();
        doc.apply_edit(Edit::Literal {
            address: "A1".to_string(),
            value: Value::Number(4.0),
        })
        .unwrap();
        doc.apply_edit(Edit::Formula {
            address: "b1".to_string(),
            source: "=A1^2".to_string(),
        })
        .unwrap();
        assert_eq!(value(&doc, "B1"), Some(Value::Number(16.0)));

        doc.apply_edit(Edit::Clear {
            address: "A1".to_string(),
        })
        .unwrap();
        assert_eq!(value(&doc, "B1"), Some(Value::Number(0.0)));

        let bad = doc.apply_edit(Edit::Clear {
            address: "1A".to_string(),
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_sort_rebuilds_graph() {
        let mut sheet = Sheet::new("s", "S", 20, 10);
        sheet.set(c("A1"), Cell::literal(2));
        sheet.set(c("A2"), Cell::literal(1));
        sheet.set(c("B1"), Cell::formula("=A1*10"));
        let mut doc = Document::new(sheet);

        doc.sort_range(&SortOptions {
            start_row: 0,
            end_row: 1,
            sort_column: 0,
            ascending: true,
        })
        .unwrap();

        // The formula moved with its row but still reads A1 (now 1).
        assert_eq!(doc.sheet().get(&c("B2")), Some(&Cell::formula("=A1*10")));
        assert_eq!(doc.graph().dependents_of(&c("A1")).collect::<Vec<_>>(), vec![&c("B2")]);
        assert_eq!(value(&doc, "B2"), Some(Value::Number(10.0)));
    }
}
