use crate::error::{CoreError, Result};
use gridcalc_engine::engine::{CellRef, DependencyGraph, EvalPolicy, Evaluator, Sheet};

/// UI-agnostic document: one sheet plus the dependency graph and evaluator
/// scoped to it.
///
/// Computed values are never stored; every read goes through the evaluator.
/// Mutations take `&mut self`, so at most one edit is in flight per document.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) sheet: Sheet,
    pub(crate) graph: DependencyGraph,
    pub(crate) evaluator: Evaluator,
}

impl Document {
    /// Wrap a sheet with the default evaluation policy.
    pub fn new(sheet: Sheet) -> Self {
        Self::with_policy(sheet, EvalPolicy::default())
    }

    /// Wrap a sheet, building its dependency graph from the stored formulas.
    pub fn with_policy(sheet: Sheet, policy: EvalPolicy) -> Self {
        let graph = DependencyGraph::from_sheet(&sheet);
        tracing::debug!(
            sheet = %sheet.id,
            cells = sheet.len(),
            edges = graph.edge_count(),
            "document loaded"
        );
        Document {
            sheet,
            graph,
            evaluator: Evaluator::new(policy),
        }
    }

    /// An empty sheet of the given size.
    pub fn empty(id: &str, name: &str, rows: usize, cols: usize) -> Self {
        Self::new(Sheet::new(id, name, rows, cols))
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> Sheet {
        self.sheet
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Rebuild the dependency graph from the sheet. Call this after cells are
    /// moved in bulk (e.g. by a sort).
    pub(crate) fn rebuild_graph(&mut self) {
        self.graph = DependencyGraph::from_sheet(&self.sheet);
    }

    pub(crate) fn check_bounds(&self, cell_ref: &CellRef) -> Result<()> {
        if self.sheet.contains(cell_ref) {
            Ok(())
        } else {
            Err(CoreError::OutOfBounds {
                cell: cell_ref.clone(),
                rows: self.sheet.rows,
                cols: self.sheet.cols,
            })
        }
    }
}
