//! Baseline single-source shortest paths.
//!
//! This is the ground-truth oracle the hierarchy is checked against, and the engine behind the
//! baseline many-to-many strategy.

use std::collections::{
    HashMap,
    HashSet,
};

use ordered_float::OrderedFloat;
use petgraph::graph::{
    EdgeIndex,
    EdgeReference,
    Graph,
    NodeIndex,
};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use tracing::instrument;

use crate::config::default_parallelism;
use crate::errors::{
    RoutingError,
    RoutingResult,
};
use crate::graph::{
    ensure_vertex,
    EdgeCost,
    Weight,
};
use crate::heap::HeapKind;
use crate::path::GraphPath;

/// Settled distances and predecessor edges of one Dijkstra run.
#[derive(Clone, Debug)]
pub struct ShortestPathTree {
    /// Search origin.
    root: NodeIndex,
    /// Final distances of settled vertices.
    distances: HashMap<NodeIndex, f64>,
    /// Tree edge entering each settled vertex other than the root.
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
}

impl ShortestPathTree {
    /// Search origin.
    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    /// Distance from the root, infinite if `v` was not settled.
    #[must_use]
    pub fn distance(&self, v: NodeIndex) -> f64 {
        self.distances.get(&v).copied().unwrap_or(f64::INFINITY)
    }

    /// Vertices settled by the search.
    pub fn settled(&self) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.distances.iter().map(|(&v, &d)| (v, d))
    }

    /// Walks the predecessor chain back from `v`.
    #[must_use]
    pub fn path_to(&self, v: NodeIndex) -> Option<GraphPath> {
        let weight = *self.distances.get(&v)?;
        let mut vertices = vec![v];
        let mut edges = Vec::new();
        let mut current = v;
        while let Some(&(prev, edge)) = self.predecessors.get(&current) {
            vertices.push(prev);
            edges.push(edge);
            current = prev;
        }
        vertices.reverse();
        edges.reverse();
        Some(GraphPath { vertices, edges, weight })
    }
}

/// Runs Dijkstra's algorithm from `start`.
///
/// `edge_cost` maps each traversed edge to its cost, or `None` to skip the edge. When `targets`
/// is non-empty the search stops as soon as all of them are settled. A negative cost aborts the
/// search with [`RoutingError::NegativeWeight`].
#[instrument(level = "trace", skip_all, fields(start = start.index(), targets = targets.len()))]
pub fn dijkstra<N, E, Ty, F>(
    graph: &Graph<N, E, Ty>,
    start: NodeIndex,
    targets: &[NodeIndex],
    heap: HeapKind,
    mut edge_cost: F,
) -> RoutingResult<ShortestPathTree>
where
    Ty: EdgeType,
    F: FnMut(EdgeReference<'_, E>) -> Option<f64>,
{
    ensure_vertex(graph, start)?;

    let mut queue = heap.build::<Weight>();
    let mut tentative: HashMap<NodeIndex, f64> = HashMap::from([(start, 0.0)]);
    let mut distances = HashMap::new();
    let mut predecessors = HashMap::new();
    let mut remaining: HashSet<NodeIndex> = targets.iter().copied().collect();
    queue.push(start.index(), OrderedFloat(0.0));

    while let Some((u, OrderedFloat(dist))) = queue.pop_min() {
        let u = NodeIndex::new(u);
        distances.insert(u, dist);
        remaining.remove(&u);
        if !targets.is_empty() && remaining.is_empty() {
            break;
        }

        for edge in graph.edges(u) {
            let Some(cost) = edge_cost(edge) else {
                continue;
            };
            if !(cost >= 0.0) {
                return Err(RoutingError::NegativeWeight { edge: edge.id().index(), weight: cost });
            }
            let v = edge.target();
            if distances.contains_key(&v) {
                continue;
            }
            let candidate = dist + cost;
            if tentative.get(&v).map_or(true, |&old| candidate < old) {
                tentative.insert(v, candidate);
                predecessors.insert(v, (u, edge.id()));
                queue.push(v.index(), OrderedFloat(candidate));
            }
        }
    }

    predecessors.retain(|v, _| distances.contains_key(v));
    Ok(ShortestPathTree { root: start, distances, predecessors })
}

/// A single-source shortest-path engine, independent of the graph type it searches.
///
/// Batch consumers such as many-to-many tables run many searches at once and size their worker
/// pool by [`ShortestPathOracle::parallelism`].
pub trait ShortestPathOracle: Sync {
    /// Number of vertices in the searched graph.
    fn vertex_count(&self) -> usize;

    /// Worker pool size for batches of searches.
    fn parallelism(&self) -> usize;

    /// Shortest-path tree from `source`, stopping early once `targets` are settled.
    fn tree(&self, source: NodeIndex, targets: &[NodeIndex]) -> RoutingResult<ShortestPathTree>;
}

/// Point-to-point and one-to-many queries answered by plain Dijkstra.
#[derive(Debug)]
pub struct DijkstraBaseline<'a, N, E, Ty: EdgeType> {
    /// The searched graph.
    graph: &'a Graph<N, E, Ty>,
    /// Queue implementation for every search.
    heap: HeapKind,
    /// Worker pool size for batches of searches.
    parallelism: usize,
}

impl<'a, N, E: EdgeCost, Ty: EdgeType> DijkstraBaseline<'a, N, E, Ty> {
    /// Wraps `graph` using the default heap and one worker per hardware thread.
    pub fn new(graph: &'a Graph<N, E, Ty>) -> Self {
        Self { graph, heap: HeapKind::default(), parallelism: default_parallelism() }
    }

    /// Selects the priority queue backing each search.
    #[must_use]
    pub fn with_heap(mut self, heap: HeapKind) -> Self {
        self.heap = heap;
        self
    }

    /// Sets the worker pool size for batches of searches.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// The wrapped graph.
    pub const fn graph(&self) -> &'a Graph<N, E, Ty> {
        self.graph
    }

    /// Shortest-path tree from `source`, stopping early once `targets` are settled.
    pub fn tree(&self, source: NodeIndex, targets: &[NodeIndex]) -> RoutingResult<ShortestPathTree> {
        for &t in targets {
            ensure_vertex(self.graph, t)?;
        }
        dijkstra(self.graph, source, targets, self.heap, |e| {
            (e.source() != e.target()).then(|| e.weight().cost())
        })
    }

    /// Shortest path from `source` to `target`, `None` if unreachable.
    pub fn path(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<Option<GraphPath>> {
        Ok(self.tree(source, &[target])?.path_to(target))
    }

    /// Shortest distance from `source` to `target`, infinite if unreachable.
    pub fn weight(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<f64> {
        Ok(self.tree(source, &[target])?.distance(target))
    }
}

impl<N, E, Ty> ShortestPathOracle for DijkstraBaseline<'_, N, E, Ty>
where
    N: Sync,
    E: EdgeCost + Sync,
    Ty: EdgeType + Sync,
{
    fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    fn parallelism(&self) -> usize {
        self.parallelism
    }

    fn tree(&self, source: NodeIndex, targets: &[NodeIndex]) -> RoutingResult<ShortestPathTree> {
        DijkstraBaseline::tree(self, source, targets)
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::UnGraph;
    use petgraph::Graph;

    use super::*;

    fn n(i: u32) -> NodeIndex {
        NodeIndex::new(i as usize)
    }

    #[test]
    fn test_directed_paths() {
        let graph = Graph::<(), f64>::from_edges([(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0), (2, 3, 0.5)]);
        let baseline = DijkstraBaseline::new(&graph);

        let path = baseline.path(n(0), n(3)).unwrap().unwrap();
        assert_eq!(path.vertices, vec![n(0), n(1), n(2), n(3)]);
        assert_eq!(path.weight, 2.5);
        assert_eq!(path.edges.len(), 3);

        assert_eq!(baseline.weight(n(3), n(0)).unwrap(), f64::INFINITY);
        assert_eq!(baseline.path(n(3), n(0)).unwrap(), None);
    }

    #[test]
    fn test_undirected_edges_traverse_both_ways() {
        let graph = UnGraph::<(), u32>::from_edges([(0, 1, 2), (1, 2, 3)]);
        let baseline = DijkstraBaseline::new(&graph).with_heap(HeapKind::Binary);
        assert_eq!(baseline.weight(n(2), n(0)).unwrap(), 5.0);
        let path = baseline.path(n(2), n(0)).unwrap().unwrap();
        assert_eq!(path.vertices, vec![n(2), n(1), n(0)]);
    }

    #[test]
    fn test_source_equals_target() {
        let graph = Graph::<(), f64>::from_edges([(0, 1, 1.0)]);
        let path = DijkstraBaseline::new(&graph).path(n(1), n(1)).unwrap().unwrap();
        assert_eq!(path, GraphPath::singleton(n(1)));
    }

    #[test]
    fn test_unknown_vertex_and_negative_weight() {
        let graph = Graph::<(), f64>::from_edges([(0, 1, -1.0)]);
        let baseline = DijkstraBaseline::new(&graph);
        assert_eq!(baseline.weight(n(0), n(9)), Err(RoutingError::UnknownVertex(9)));
        assert_eq!(baseline.weight(n(9), n(0)), Err(RoutingError::UnknownVertex(9)));
        assert!(matches!(baseline.weight(n(0), n(1)), Err(RoutingError::NegativeWeight { edge: 0, .. })));
    }

    #[test]
    fn test_full_tree_settles_everything_reachable() {
        let graph = Graph::<(), f64>::from_edges([(0, 1, 1.0), (0, 2, 4.0), (1, 2, 1.0), (3, 0, 1.0)]);
        let tree = DijkstraBaseline::new(&graph).tree(n(0), &[]).unwrap();
        let mut settled: Vec<_> = tree.settled().collect();
        settled.sort_by_key(|(v, _)| *v);
        assert_eq!(settled, vec![(n(0), 0.0), (n(1), 1.0), (n(2), 2.0)]);
        assert_eq!(tree.root(), n(0));
    }

    #[test]
    fn test_oracle_through_trait_object() {
        let graph = Graph::<(), f64>::from_edges([(0, 1, 2.0), (1, 2, 2.0)]);
        let baseline = DijkstraBaseline::new(&graph).with_parallelism(3);
        let oracle: &dyn ShortestPathOracle = &baseline;
        assert_eq!(oracle.vertex_count(), 3);
        assert_eq!(oracle.parallelism(), 3);
        assert_eq!(oracle.tree(n(0), &[n(2)]).unwrap().distance(n(2)), 4.0);
    }
}
