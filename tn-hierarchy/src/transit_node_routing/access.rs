//! Access vertex discovery.
//!
//! The forward access vertices of `v` are the transit nodes met first when leaving `v` on a
//! shortest path; backward access vertices are the same for arriving at `v`. Candidates come from
//! an upward search that stops at transit nodes, exact distances from a one-to-many table, and
//! candidates that are reachable more cheaply through another candidate are pruned.

use std::collections::HashSet;

use itertools::Itertools;
use petgraph::graph::NodeIndex;
use tn_core::{
    GraphPath,
    RoutingResult,
};
use tracing::instrument;

use super::locality::NO_CELL;
use super::voronoi::VoronoiDiagram;
use crate::contraction_hierarchies::{
    ContractionHierarchy,
    Direction,
    SearchTree,
    VertexId,
};
use crate::many_to_many::{
    bucket_table,
    ManyToManyTable,
};

/// A transit node through which some vertex enters or leaves long-distance routes.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessVertex {
    /// The transit node.
    pub transit: NodeIndex,
    /// Shortest path between the owning vertex and the transit node, in travel order.
    pub path: GraphPath,
}

impl AccessVertex {
    /// Length of the access path.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.path.weight
    }
}

/// Access vertices and touched cells of one vertex, both directions.
#[derive(Debug, Default)]
pub(crate) struct VertexAccess {
    /// Transit nodes for leaving the vertex.
    pub forward: Vec<AccessVertex>,
    /// Transit nodes for arriving at the vertex.
    pub backward: Vec<AccessVertex>,
    /// Cells touched by the forward local search.
    pub forward_cells: HashSet<usize>,
    /// Cells touched by the backward local search.
    pub backward_cells: HashSet<usize>,
}

/// Shared read-only inputs of access discovery.
pub(crate) struct AccessContext<'c> {
    /// Hierarchy searched for candidates.
    pub hierarchy: &'c ContractionHierarchy,
    /// Transit membership per vertex.
    pub is_transit: &'c [bool],
    /// Row/column of each transit node in `table`.
    pub slots: &'c [Option<usize>],
    /// Distances between all transit nodes.
    pub table: &'c ManyToManyTable<'c>,
    /// Cell assignment.
    pub voronoi: &'c VoronoiDiagram,
}

impl AccessContext<'_> {
    /// Access vertices and locality cells of `v`.
    #[instrument(level = "trace", skip(self))]
    pub fn discover(&self, v: VertexId) -> RoutingResult<VertexAccess> {
        if self.is_transit[v] {
            let own = AccessVertex { transit: NodeIndex::new(v), path: GraphPath::singleton(NodeIndex::new(v)) };
            return Ok(VertexAccess { forward: vec![own.clone()], backward: vec![own], ..VertexAccess::default() });
        }

        let (forward, forward_cells) = self.one_side(v, Direction::Forward)?;
        let (backward, backward_cells) = self.one_side(v, Direction::Backward)?;
        Ok(VertexAccess { forward, backward, forward_cells, backward_cells })
    }

    /// Table distance between two transit nodes.
    fn transit_distance(&self, a: VertexId, b: VertexId) -> f64 {
        match (self.slots[a], self.slots[b]) {
            (Some(i), Some(j)) => self.table.weight_at(i, j),
            _ => f64::INFINITY,
        }
    }

    /// Local search from the non-transit vertex `v` in one direction.
    fn one_side(&self, v: VertexId, direction: Direction) -> RoutingResult<(Vec<AccessVertex>, HashSet<usize>)> {
        let graph = &self.hierarchy.graph;
        let tree = SearchTree::explore(graph, v, direction, self.hierarchy.heap, |x| !self.is_transit[x]);

        let cells = tree.labels().map(|(x, _)| self.voronoi.cell_of(x).unwrap_or(NO_CELL)).collect();
        let candidates = tree.labels().map(|(x, _)| x).filter(|&x| self.is_transit[x]).sorted().collect_vec();
        if candidates.is_empty() {
            return Ok((Vec::new(), cells));
        }

        let origin = [NodeIndex::new(v)];
        let ends = candidates.iter().map(|&c| NodeIndex::new(c)).collect_vec();
        let exact = match direction {
            Direction::Forward => {
                let table = bucket_table(self.hierarchy, &origin, &ends)?;
                (0..ends.len()).map(|j| table.path_at(0, j)).collect_vec()
            },
            Direction::Backward => {
                let table = bucket_table(self.hierarchy, &ends, &origin)?;
                (0..ends.len()).map(|i| table.path_at(i, 0)).collect_vec()
            },
        };
        let reached = candidates.into_iter().zip(exact).filter_map(|(c, path)| Some((c, path?))).collect_vec();

        let access = match direction {
            Direction::Forward => prune(reached, |a, b| self.transit_distance(a, b)),
            Direction::Backward => prune(reached, |a, b| self.transit_distance(b, a)),
        };
        Ok((access, cells))
    }
}

/// Drops candidates that are dominated by a closer kept candidate.
///
/// Candidates are visited by increasing distance; `b` is dropped if some kept `a` satisfies
/// `d(a) + via(a, b) <= d(b)`.
fn prune(mut candidates: Vec<(VertexId, GraphPath)>, via: impl Fn(VertexId, VertexId) -> f64) -> Vec<AccessVertex> {
    candidates.sort_by(|(a, pa), (b, pb)| pa.weight.total_cmp(&pb.weight).then(a.cmp(b)));
    let mut kept: Vec<(VertexId, GraphPath)> = Vec::new();
    for (b, path) in candidates {
        if kept.iter().any(|(a, kept_path)| kept_path.weight + via(*a, b) <= path.weight) {
            continue;
        }
        kept.push((b, path));
    }
    kept.into_iter().map(|(c, path)| AccessVertex { transit: NodeIndex::new(c), path }).collect()
}
