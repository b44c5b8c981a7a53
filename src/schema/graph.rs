//! Traversal over the relation index.
//!
//! Provides reference/dependent neighborhoods, the level-bounded zoom used to
//! cut a readable sub-diagram out of a large schema, and an undirected
//! adjacency view for path searches done by callers.

use super::{Database, TableId};
use crate::error::Result;
use ahash::AHashSet;

impl Database {
    /// Tables that `table` depends on, in reference-table order.
    ///
    /// A self-referencing table appears in its own result.
    pub fn reference_tables(&self, table: TableId) -> Result<Vec<TableId>> {
        self.table(table)?;
        Ok(self
            .compute_relations()
            .outgoing(table)
            .map(|(reference, _)| reference)
            .collect())
    }

    /// Tables holding a relation towards `table`, in dependent-table order
    pub fn dependent_tables(&self, table: TableId) -> Result<Vec<TableId>> {
        self.table(table)?;
        Ok(self
            .compute_relations()
            .iter()
            .filter(|&(_, reference, _)| reference == table)
            .map(|(dependent, _, _)| dependent)
            .collect())
    }

    /// References and dependents of `table`, without `table` itself
    pub fn neighborhood(&self, table: TableId) -> Result<Vec<TableId>> {
        let mut seen = AHashSet::new();
        let mut result = Vec::new();
        for id in self
            .reference_tables(table)?
            .into_iter()
            .chain(self.dependent_tables(table)?)
        {
            if id != table && seen.insert(id) {
                result.push(id);
            }
        }
        Ok(result)
    }

    /// Seeds plus every table reachable within `level` hops.
    ///
    /// Runs `level + 1` rounds. Each round adds the current frontier to the
    /// result and, while hops remain, expands it into the next frontier.
    /// Tables are returned in discovery order and never repeated.
    pub fn zoom(&self, seeds: &[TableId], level: usize) -> Result<Vec<TableId>> {
        for &seed in seeds {
            self.table(seed)?;
        }

        let mut result = Vec::new();
        let mut in_result = AHashSet::new();
        let mut expanded = AHashSet::new();
        let mut frontier: Vec<TableId> = seeds.to_vec();
        let mut remaining = level;

        for _ in 0..=level {
            let mut next = Vec::new();
            for table in frontier {
                if !expanded.insert(table) {
                    continue;
                }
                if in_result.insert(table) {
                    result.push(table);
                }
                if remaining == 0 {
                    continue;
                }
                for neighbor in self.neighborhood(table)? {
                    if in_result.insert(neighbor) {
                        result.push(neighbor);
                    }
                    if !expanded.contains(&neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            frontier = next;
            remaining = remaining.saturating_sub(1);
        }

        Ok(result)
    }

    /// [`Database::zoom`] with seeds given by name
    pub fn zoom_by_names<S: AsRef<str>>(&self, names: &[S], level: usize) -> Result<Vec<TableId>> {
        let seeds = names
            .iter()
            .map(|name| self.require_table(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.zoom(&seeds, level)
    }

    /// Undirected view of the relations among `subset` (all tables when empty)
    pub fn adjacency(&self, subset: &[TableId]) -> Result<AdjacencyView> {
        let vertices = if subset.is_empty() {
            self.table_ids()
        } else {
            for &id in subset {
                self.table(id)?;
            }
            subset.to_vec()
        };
        let members: AHashSet<TableId> = vertices.iter().copied().collect();

        let mut seen = AHashSet::new();
        let mut edges = Vec::new();
        for (dependent, reference, _) in self.compute_relations().iter() {
            if !members.contains(&dependent) || !members.contains(&reference) {
                continue;
            }
            let edge = if dependent <= reference {
                (dependent, reference)
            } else {
                (reference, dependent)
            };
            if seen.insert(edge) {
                edges.push(edge);
            }
        }

        Ok(AdjacencyView { vertices, edges })
    }
}

/// Tables and undirected relation edges, each edge listed once.
///
/// Self-relations appear as `(t, t)` loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyView {
    pub vertices: Vec<TableId>,
    pub edges: Vec<(TableId, TableId)>,
}

impl AdjacencyView {
    /// Neighbors of `table` within the view, loops excluded
    pub fn neighbors(&self, table: TableId) -> Vec<TableId> {
        self.edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == b {
                    None
                } else if a == table {
                    Some(b)
                } else if b == table {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }
}
