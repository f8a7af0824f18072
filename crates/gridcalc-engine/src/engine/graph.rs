//! Cell dependency graph.
//!
//! Two mirrored adjacency maps: `dependencies` (cell -> cells it reads) and
//! `dependents` (cell -> cells that read it). Edges are checked with
//! [`DependencyGraph::would_create_cycle`] before they are added, so the
//! graph never holds a cycle at rest.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::cell::Sheet;
use super::cell_ref::CellRef;
use super::deps::extract_dependencies;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DependencyGraph {
    dependencies: HashMap<CellRef, HashSet<CellRef>>,
    dependents: HashMap<CellRef, HashSet<CellRef>>,
}

/// Result of [`DependencyGraph::evaluation_order`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationOrder {
    /// Cells whose in-set dependencies all come before them.
    pub order: Vec<CellRef>,
    /// Cells left over when the sort stalled on a cycle, row-major.
    pub cyclic: Vec<CellRef>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for every parsed formula in `sheet`.
    ///
    /// A loaded sheet may already contain formulas that reference each other in
    /// a loop. The edge that would close such a loop is skipped; evaluating
    /// those cells still reports the cycle.
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let mut graph = Self::new();
        for (cell_ref, cell) in sheet.iter() {
            let Some(ast) = cell.ast() else {
                continue;
            };
            for dep in extract_dependencies(ast, sheet.rows, sheet.cols) {
                if graph.would_create_cycle(cell_ref, &dep) {
                    tracing::warn!(cell = %cell_ref, dependency = %dep, "skipping edge that closes a cycle");
                    continue;
                }
                graph.add_edge(cell_ref.clone(), dep);
            }
        }
        graph
    }

    /// Record that `from` reads `to`.
    pub fn add_edge(&mut self, from: CellRef, to: CellRef) {
        self.dependents.entry(to.clone()).or_default().insert(from.clone());
        self.dependencies.entry(from).or_default().insert(to);
    }

    /// Drop the cells `cell` reads. Cells reading `cell` keep their edges.
    pub fn remove_outgoing_edges(&mut self, cell: &CellRef) {
        let Some(deps) = self.dependencies.remove(cell) else {
            return;
        };
        for dep in deps {
            if let Some(readers) = self.dependents.get_mut(&dep) {
                readers.remove(cell);
                if readers.is_empty() {
                    self.dependents.remove(&dep);
                }
            }
        }
    }

    /// Drop every edge touching `cell`, in both directions.
    pub fn remove_all_edges(&mut self, cell: &CellRef) {
        self.remove_outgoing_edges(cell);
        let Some(readers) = self.dependents.remove(cell) else {
            return;
        };
        for reader in readers {
            if let Some(deps) = self.dependencies.get_mut(&reader) {
                deps.remove(cell);
                if deps.is_empty() {
                    self.dependencies.remove(&reader);
                }
            }
        }
    }

    pub fn dependencies_of(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> {
        self.dependencies.get(cell).into_iter().flatten()
    }

    pub fn dependents_of(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> {
        self.dependents.get(cell).into_iter().flatten()
    }

    /// Whether adding `from -> to` would close a cycle, i.e. `to` already
    /// reaches `from`. A self-edge always does.
    pub fn would_create_cycle(&self, from: &CellRef, to: &CellRef) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.dependencies_of(current));
        }
        false
    }

    /// Every cell that reads `cell`, directly or through other cells.
    pub fn dependents_closure(&self, cell: &CellRef) -> HashSet<CellRef> {
        let mut closure = HashSet::new();
        let mut queue: VecDeque<&CellRef> = self.dependents_of(cell).collect();

        while let Some(current) = queue.pop_front() {
            if closure.insert(current.clone()) {
                queue.extend(self.dependents_of(current));
            }
        }
        closure
    }

    /// Topologically order `cells` (Kahn's algorithm), considering only edges
    /// between members of the set. Members still waiting when no cell is ready
    /// are returned in `cyclic` instead of aborting.
    pub fn evaluation_order(&self, cells: &[CellRef]) -> EvaluationOrder {
        let members: BTreeSet<&CellRef> = cells.iter().collect();

        let mut remaining: HashMap<&CellRef, usize> = members
            .iter()
            .map(|&cell| {
                let pending = self
                    .dependencies_of(cell)
                    .filter(|dep| members.contains(dep))
                    .count();
                (cell, pending)
            })
            .collect();

        let mut queue: VecDeque<&CellRef> = members
            .iter()
            .copied()
            .filter(|cell| remaining.get(cell) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(cell) = queue.pop_front() {
            order.push(cell.clone());

            let mut readers: Vec<&CellRef> = self
                .dependents_of(cell)
                .filter(|reader| members.contains(reader))
                .collect();
            readers.sort();
            for reader in readers {
                if let Some(count) = remaining.get_mut(reader) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(reader);
                    }
                }
            }
        }

        let cyclic = members
            .iter()
            .filter(|cell| remaining.get(*cell).is_some_and(|count| *count > 0))
            .map(|cell| (*cell).clone())
            .collect();

        EvaluationOrder { order, cyclic }
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(HashSet::len).sum()
    }

    /// Every edge in one map has its mirror in the other.
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .dependencies
            .iter()
            .all(|(from, tos)| tos.iter().all(|to| self.dependents.get(to).is_some_and(|s| s.contains(from))));
        let backward = self
            .dependents
            .iter()
            .all(|(to, froms)| froms.iter().all(|from| self.dependencies.get(from).is_some_and(|s| s.contains(to))));
        forward && backward
    }
}
