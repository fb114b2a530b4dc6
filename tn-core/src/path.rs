//! Path results returned by every query component.

use petgraph::graph::{
    EdgeIndex,
    NodeIndex,
};

use crate::errors::{
    RoutingError,
    RoutingResult,
};

/// A path in the original input graph.
///
/// `vertices` always holds one more element than `edges`; a single-vertex path has no edges and
/// zero weight.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphPath {
    /// Visited vertices, in order, including both endpoints.
    pub vertices: Vec<NodeIndex>,
    /// Traversed original edges, in order.
    pub edges: Vec<EdgeIndex>,
    /// Sum of the traversed edge weights.
    pub weight: f64,
}

impl GraphPath {
    /// The zero-weight path consisting of `v` alone.
    #[must_use]
    pub fn singleton(v: NodeIndex) -> Self {
        Self { vertices: vec![v], edges: Vec::new(), weight: 0.0 }
    }

    /// First vertex of the path, `None` for a hand-built path without vertices.
    #[must_use]
    pub fn start(&self) -> Option<NodeIndex> {
        self.vertices.first().copied()
    }

    /// Last vertex of the path, `None` for a hand-built path without vertices.
    #[must_use]
    pub fn end(&self) -> Option<NodeIndex> {
        self.vertices.last().copied()
    }

    /// Number of edges on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True for single-vertex paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Joins `other` onto the end of this path.
    ///
    /// The boundary vertex is kept once; a mismatched or missing boundary is rejected.
    pub fn concat(mut self, other: Self) -> RoutingResult<Self> {
        match (self.end(), other.start()) {
            (Some(end), Some(start)) if end == start => {},
            (end, start) => {
                return Err(RoutingError::config(format!(
                    "cannot join path ending at {end:?} with path starting at {start:?}"
                )));
            },
        }
        self.vertices.extend(other.vertices.into_iter().skip(1));
        self.edges.extend(other.edges);
        self.weight += other.weight;
        Ok(self)
    }
}
