use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use tn_core::{
    GraphPath,
    RoutingError,
    RoutingResult,
    ShortestPathTree,
};

use crate::contraction_hierarchies::{
    ContractionHierarchy,
    SearchTree,
    VertexId,
};

/// Data needed to rebuild a path on request.
#[derive(Clone, Debug)]
pub(crate) enum TablePaths<'a> {
    /// One full Dijkstra tree per source row.
    Baseline(Vec<ShortestPathTree>),
    /// Upward search trees of both sides plus the meeting vertex of every cell.
    Buckets {
        /// The hierarchy the trees were grown in.
        hierarchy: &'a ContractionHierarchy,
        /// Forward tree per source row.
        forward: Vec<SearchTree>,
        /// Backward tree per target column.
        backward: Vec<SearchTree>,
        /// Row-major meeting vertices, `None` for unreachable cells.
        middles: Vec<Option<VertexId>>,
    },
}

/// Distances (and lazily, paths) between every source and every target.
///
/// Borrows the hierarchy it was computed on, if any, so it cannot outlive it.
#[derive(Clone, Debug)]
pub struct ManyToManyTable<'a> {
    /// Row vertices in request order.
    sources: Vec<NodeIndex>,
    /// Column vertices in request order.
    targets: Vec<NodeIndex>,
    /// First row of each source vertex.
    rows: HashMap<NodeIndex, usize>,
    /// First column of each target vertex.
    columns: HashMap<NodeIndex, usize>,
    /// Row-major distances, infinite where unreachable.
    weights: Vec<f64>,
    /// Path reconstruction data.
    paths: TablePaths<'a>,
}

impl<'a> ManyToManyTable<'a> {
    /// Assembles a table; `weights` must be row-major `sources.len() x targets.len()`.
    pub(crate) fn new(sources: Vec<NodeIndex>, targets: Vec<NodeIndex>, weights: Vec<f64>, paths: TablePaths<'a>) -> Self {
        debug_assert_eq!(weights.len(), sources.len() * targets.len());
        let mut rows = HashMap::new();
        for (i, &s) in sources.iter().enumerate() {
            rows.entry(s).or_insert(i);
        }
        let mut columns = HashMap::new();
        for (j, &t) in targets.iter().enumerate() {
            columns.entry(t).or_insert(j);
        }
        Self { sources, targets, rows, columns, weights, paths }
    }

    /// Source vertices, one per row.
    #[must_use]
    pub fn sources(&self) -> &[NodeIndex] {
        &self.sources
    }

    /// Target vertices, one per column.
    #[must_use]
    pub fn targets(&self) -> &[NodeIndex] {
        &self.targets
    }

    /// Distance from `source` to `target`, infinite if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if `source` was not a requested source or `target` not a requested target.
    pub fn get_weight(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<f64> {
        let (row, column) = self.cell(source, target)?;
        Ok(self.weight_at(row, column))
    }

    /// Shortest path from `source` to `target`, `None` if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if `source` was not a requested source or `target` not a requested target.
    pub fn get_path(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<Option<GraphPath>> {
        let (row, column) = self.cell(source, target)?;
        Ok(self.path_at(row, column))
    }

    /// Row-major distance lookup by position.
    pub(crate) fn weight_at(&self, row: usize, column: usize) -> f64 {
        self.weights[row * self.targets.len() + column]
    }

    /// Path lookup by position.
    pub(crate) fn path_at(&self, row: usize, column: usize) -> Option<GraphPath> {
        match &self.paths {
            TablePaths::Baseline(trees) => trees[row].path_to(self.targets[column]),
            TablePaths::Buckets { hierarchy, forward, backward, middles } => {
                let middle = middles[row * self.targets.len() + column]?;
                let graph = &hierarchy.graph;
                let mut arcs = forward[row].arcs_to(graph, middle);
                arcs.extend(backward[column].arcs_to(graph, middle));
                let mut path = graph.expand_path(forward[row].root(), &arcs);
                path.weight = self.weight_at(row, column);
                Some(path)
            },
        }
    }

    /// Row and column of a requested pair.
    fn cell(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<(usize, usize)> {
        let row = self.rows.get(&source).ok_or(RoutingError::UnknownVertex(source.index()))?;
        let column = self.columns.get(&target).ok_or(RoutingError::UnknownVertex(target.index()))?;
        Ok((*row, *column))
    }
}
