use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tn_core::{
    RoutingError,
    RoutingResult,
};

/// Cell marker for vertices that reach no transit node; forces local routing.
pub const NO_CELL: usize = usize::MAX;

/// Decides which queries must bypass the transit table.
///
/// Every vertex carries the set of Voronoi cells touched by its forward (and backward) local
/// search. Two vertices whose sets are disjoint cannot share a shortest path that avoids every
/// transit node, so the table answer is exact for them. Transit nodes carry empty sets.
#[derive(Clone, Debug, Default)]
pub struct LocalityFilter {
    /// Cells touched by each vertex's forward local search.
    forward: Vec<HashSet<usize>>,
    /// Cells touched by each vertex's backward local search.
    backward: Vec<HashSet<usize>>,
}

impl LocalityFilter {
    /// Wraps per-vertex cell sets.
    pub(crate) fn new(forward: Vec<HashSet<usize>>, backward: Vec<HashSet<usize>>) -> Self {
        Self { forward, backward }
    }

    /// True if `source -> target` has to be answered by a plain hierarchy query.
    ///
    /// # Errors
    ///
    /// Fails if either vertex is not in the graph.
    pub fn is_local(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<bool> {
        let forward = self.forward.get(source.index()).ok_or(RoutingError::UnknownVertex(source.index()))?;
        let backward = self.backward.get(target.index()).ok_or(RoutingError::UnknownVertex(target.index()))?;
        if source == target {
            return Ok(true);
        }
        Ok(forward.contains(&NO_CELL) || backward.contains(&NO_CELL) || !forward.is_disjoint(backward))
    }

    /// Cells touched by the forward local search of `v`, with transit node indices as cell ids.
    #[must_use]
    pub fn forward_cells(&self, v: NodeIndex) -> Option<&HashSet<usize>> {
        self.forward.get(v.index())
    }

    /// Cells touched by the backward local search of `v`.
    #[must_use]
    pub fn backward_cells(&self, v: NodeIndex) -> Option<&HashSet<usize>> {
        self.backward.get(v.index())
    }
}
