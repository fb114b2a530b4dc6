//! Arena representation of the contraction hierarchy.
//!
//! Vertices and arcs live in flat vectors addressed by integer handles. A shortcut stores the
//! handles of the two arcs it skips, so shortcut trees are plain index trees with no ownership
//! cycles; unpacking walks them depth-first.

use std::collections::HashMap;

use petgraph::graph::{
    EdgeIndex,
    Graph,
    NodeIndex,
};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use tn_core::{
    checked_cost,
    EdgeCost,
    GraphPath,
    HeapKind,
    RoutingError,
    RoutingResult,
};
use tracing::instrument;

use super::query::BidirectionalQuery;

/// Handle of a vertex in the hierarchy arena. Equal to the original `NodeIndex::index()`.
pub type VertexId = usize;

/// Handle of an arc in the hierarchy arena.
pub type ArcId = usize;

/// Contraction state of one original vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractionVertex {
    /// The wrapped vertex of the input graph.
    pub original: NodeIndex,
    /// Position in the contraction order, `None` until the vertex is contracted.
    pub contraction_index: Option<usize>,
    /// Number of neighbours contracted before this vertex.
    pub neighbors_contracted: usize,
    /// Whether the vertex has been removed from the remaining graph.
    pub contracted: bool,
}

impl ContractionVertex {
    /// Creates the uncontracted wrapper of `original`.
    #[must_use]
    pub const fn new(original: NodeIndex) -> Self {
        Self { original, contraction_index: None, neighbors_contracted: 0, contracted: false }
    }

    /// Contraction index, usable only after construction finished.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.contraction_index.unwrap_or(usize::MAX)
    }
}

/// What an arc stands for in the input graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArcKind {
    /// An edge of the input graph (the lightest one, if there were parallel edges).
    Original(EdgeIndex),
    /// A shortcut replacing the path `first` then `second`.
    Shortcut {
        /// Arc entering the contracted vertex.
        first: ArcId,
        /// Arc leaving the contracted vertex.
        second: ArcId,
    },
}

/// A directed arc of the hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractionEdge {
    /// Tail vertex.
    pub source: VertexId,
    /// Head vertex.
    pub target: VertexId,
    /// Traversal cost; for shortcuts the sum of the two skipped arcs.
    pub weight: f64,
    /// Original edge or shortcut.
    pub kind: ArcKind,
    /// True iff the tail was contracted before the head.
    pub is_upward: bool,
}

impl ContractionEdge {
    /// True if this arc is a shortcut.
    #[must_use]
    pub const fn is_shortcut(&self) -> bool {
        matches!(self.kind, ArcKind::Shortcut { .. })
    }
}

/// The input graph's arcs plus every shortcut, always directed.
///
/// Undirected inputs contribute one arc per direction. Self-loops are dropped and parallel edges
/// collapse to the lightest one.
#[derive(Clone, Debug, Default)]
pub struct ContractionGraph {
    /// Arc arena.
    arcs: Vec<ContractionEdge>,
    /// Arcs leaving each vertex.
    outgoing: Vec<Vec<ArcId>>,
    /// Arcs entering each vertex.
    incoming: Vec<Vec<ArcId>>,
    /// Arc lookup by endpoints.
    index: HashMap<(VertexId, VertexId), ArcId>,
    /// Upward arcs leaving each vertex, filled once the order is known.
    upward_out: Vec<Vec<ArcId>>,
    /// Arcs entering each vertex from a higher-ranked vertex.
    downward_in: Vec<Vec<ArcId>>,
}

impl ContractionGraph {
    /// Builds the arc arena for `graph`, rejecting negative weights.
    #[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub(crate) fn from_graph<N, E: EdgeCost, Ty: EdgeType>(graph: &Graph<N, E, Ty>) -> RoutingResult<Self> {
        let mut augmented = Self::with_vertices(graph.node_count());
        for edge in graph.edge_references() {
            let weight = checked_cost(edge.id(), edge.weight())?;
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                continue;
            }
            augmented.insert_min(a, b, weight, ArcKind::Original(edge.id()));
            if !graph.is_directed() {
                augmented.insert_min(b, a, weight, ArcKind::Original(edge.id()));
            }
        }
        Ok(augmented)
    }

    /// An arena with `n` vertices and no arcs.
    fn with_vertices(n: usize) -> Self {
        Self {
            arcs: Vec::new(),
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
            index: HashMap::new(),
            upward_out: vec![Vec::new(); n],
            downward_in: vec![Vec::new(); n],
        }
    }

    /// Inserts `a -> b`, or overwrites an existing heavier `a -> b` arc in place.
    ///
    /// Returns the handle of the arc now holding the minimum.
    pub(crate) fn insert_min(&mut self, a: VertexId, b: VertexId, weight: f64, kind: ArcKind) -> ArcId {
        if let Some(&id) = self.index.get(&(a, b)) {
            let arc = &mut self.arcs[id];
            if weight < arc.weight {
                arc.weight = weight;
                arc.kind = kind;
            }
            return id;
        }
        let id = self.arcs.len();
        self.arcs.push(ContractionEdge { source: a, target: b, weight, kind, is_upward: false });
        self.outgoing[a].push(id);
        self.incoming[b].push(id);
        self.index.insert((a, b), id);
        id
    }

    /// Mutable access to the arc arena for the parallel upward-marking pass.
    pub(crate) fn arcs_mut(&mut self) -> &mut [ContractionEdge] {
        &mut self.arcs
    }

    /// Installs the per-vertex search adjacency computed after upward marking.
    pub(crate) fn set_search_adjacency(&mut self, upward_out: Vec<Vec<ArcId>>, downward_in: Vec<Vec<ArcId>>) {
        self.upward_out = upward_out;
        self.downward_in = downward_in;
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Number of arcs, shortcuts included.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Number of shortcut arcs.
    #[must_use]
    pub fn shortcut_count(&self) -> usize {
        self.arcs.iter().filter(|a| a.is_shortcut()).count()
    }

    /// The arc behind `id`.
    #[must_use]
    pub fn arc(&self, id: ArcId) -> &ContractionEdge {
        &self.arcs[id]
    }

    /// Every arc with its handle.
    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &ContractionEdge)> {
        self.arcs.iter().enumerate()
    }

    /// Arcs leaving `v`.
    #[must_use]
    pub fn outgoing(&self, v: VertexId) -> &[ArcId] {
        &self.outgoing[v]
    }

    /// Arcs entering `v`.
    #[must_use]
    pub fn incoming(&self, v: VertexId) -> &[ArcId] {
        &self.incoming[v]
    }

    /// Upward arcs leaving `v`; the forward search space.
    #[must_use]
    pub fn upward(&self, v: VertexId) -> &[ArcId] {
        &self.upward_out[v]
    }

    /// Arcs entering `v` from higher-ranked vertices; the backward search space.
    #[must_use]
    pub fn downward_into(&self, v: VertexId) -> &[ArcId] {
        &self.downward_in[v]
    }

    /// Handle of the arc `a -> b`, if any.
    #[must_use]
    pub fn find_arc(&self, a: VertexId, b: VertexId) -> Option<ArcId> {
        self.index.get(&(a, b)).copied()
    }

    /// True if the hierarchy has an arc (original or shortcut) from `a` to `b`.
    #[must_use]
    pub fn contains_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.find_arc(a.index(), b.index()).is_some()
    }

    /// Weight of the arc `a -> b`, if any.
    #[must_use]
    pub fn edge_weight(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        self.find_arc(a.index(), b.index()).map(|id| self.arcs[id].weight)
    }

    /// Expands `arc` into the original edges it stands for, in travel order.
    ///
    /// Each entry pairs an input edge with the vertex it leads to.
    #[must_use]
    pub fn unpack(&self, arc: ArcId) -> Vec<(EdgeIndex, VertexId)> {
        let mut leaves = Vec::new();
        let mut stack = vec![arc];
        while let Some(id) = stack.pop() {
            match self.arcs[id].kind {
                ArcKind::Original(edge) => leaves.push((edge, self.arcs[id].target)),
                ArcKind::Shortcut { first, second } => {
                    stack.push(second);
                    stack.push(first);
                },
            }
        }
        leaves
    }

    /// Builds the input-graph path that starts at `start` and follows `arcs` in order.
    #[must_use]
    pub fn expand_path(&self, start: VertexId, arcs: &[ArcId]) -> GraphPath {
        let mut path = GraphPath::singleton(NodeIndex::new(start));
        for &id in arcs {
            path.weight += self.arcs[id].weight;
            for (edge, head) in self.unpack(id) {
                path.edges.push(edge);
                path.vertices.push(NodeIndex::new(head));
            }
        }
        path
    }
}

/// Read-only map from input vertices to their contraction state.
#[derive(Clone, Debug, Default)]
pub struct ContractionMapping {
    /// One entry per input vertex, indexed by `NodeIndex::index()`.
    vertices: Vec<ContractionVertex>,
}

impl ContractionMapping {
    /// Wraps the final vertex states.
    pub(crate) const fn new(vertices: Vec<ContractionVertex>) -> Self {
        Self { vertices }
    }

    /// Contraction state of `v`.
    pub fn get(&self, v: NodeIndex) -> RoutingResult<&ContractionVertex> {
        self.vertices.get(v.index()).ok_or(RoutingError::UnknownVertex(v.index()))
    }

    /// Arena handle of `v`, failing for vertices outside the graph.
    pub fn vertex_id(&self, v: NodeIndex) -> RoutingResult<VertexId> {
        self.get(v).map(|_| v.index())
    }

    /// Contraction index of `v`.
    pub fn rank(&self, v: NodeIndex) -> RoutingResult<usize> {
        self.get(v).map(ContractionVertex::rank)
    }

    /// Contraction index of the vertex behind an arena handle known to be in range.
    pub(crate) fn rank_of(&self, id: VertexId) -> usize {
        self.vertices[id].rank()
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True for the empty graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertex states in `NodeIndex` order.
    pub fn iter(&self) -> impl Iterator<Item = &ContractionVertex> {
        self.vertices.iter()
    }
}

/// A finished contraction hierarchy: the augmented graph and the vertex mapping, plus the queue
/// implementation and worker count that searches over it reuse.
#[derive(Clone, Debug)]
pub struct ContractionHierarchy {
    /// Arcs and shortcuts.
    pub graph: ContractionGraph,
    /// Vertex states.
    pub mapping: ContractionMapping,
    /// Priority queue used by searches over this hierarchy.
    pub heap: HeapKind,
    /// Worker pool size the hierarchy was built with; batch searches over it default to it.
    pub parallelism: usize,
}

impl ContractionHierarchy {
    /// Point-to-point query engine over this hierarchy.
    #[must_use]
    pub const fn query(&self) -> BidirectionalQuery<'_> {
        BidirectionalQuery::new(self)
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mapping.len()
    }
}
