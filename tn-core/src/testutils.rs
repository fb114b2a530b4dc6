//! Graph fixtures shared by the workspace's tests.

use petgraph::graph::{
    DiGraph,
    NodeIndex,
    UnGraph,
};
use rand::rngs::StdRng;
use rand::{
    Rng,
    SeedableRng,
};
use rstest::fixture;

/// Tolerance used when comparing hierarchy answers against the baseline.
pub const EPS: f64 = 1e-9;

/// Shorthand for building a `NodeIndex` in assertions.
#[must_use]
pub fn n(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

/// Directed graph 0 -> 1 -> 2 with a back edge 2 -> 1, all of weight one.
#[fixture]
pub fn directed_path() -> DiGraph<(), f64> {
    DiGraph::from_edges([(0, 1, 1.0), (1, 2, 1.0), (2, 1, 1.0)])
}

/// Undirected chain 0 - 1 (weight one), 1 - 2 (weight two).
#[fixture]
pub fn short_chain() -> UnGraph<(), f64> {
    UnGraph::from_edges([(0, 1, 1.0), (1, 2, 2.0)])
}

/// Small directed road-like network with a one-way street and an isolated vertex.
#[fixture]
pub fn small_network() -> DiGraph<(), f64> {
    let mut graph = DiGraph::from_edges([
        (0, 1, 4.0),
        (1, 0, 4.0),
        (0, 2, 1.0),
        (2, 0, 1.0),
        (2, 1, 2.0),
        (1, 3, 5.0),
        (3, 1, 5.0),
        (2, 3, 8.0),
        (3, 4, 3.0),
        (4, 5, 1.0),
        (5, 3, 1.0),
        (5, 6, 2.0),
        (6, 5, 2.0),
        (6, 7, 1.5),
        (7, 4, 0.5),
    ]);
    graph.add_node(());
    graph
}

/// Undirected `width` x `height` grid with uniform random weights in `[1, 10)`.
#[must_use]
pub fn grid_graph(width: usize, height: usize, seed: u64) -> UnGraph<(), f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = UnGraph::with_capacity(width * height, 2 * width * height);
    let nodes: Vec<NodeIndex> = (0..width * height).map(|_| graph.add_node(())).collect();
    for y in 0..height {
        for x in 0..width {
            let v = nodes[y * width + x];
            if x + 1 < width {
                graph.add_edge(v, nodes[y * width + x + 1], rng.gen_range(1.0..10.0));
            }
            if y + 1 < height {
                graph.add_edge(v, nodes[(y + 1) * width + x], rng.gen_range(1.0..10.0));
            }
        }
    }
    graph
}

/// Random directed multigraph with `nodes` vertices and `edges` arcs.
///
/// Weights are integral in `[0, 20]` so that ties and zero-weight arcs show up; self-loops and
/// parallel arcs are allowed.
#[must_use]
pub fn random_digraph(nodes: usize, edges: usize, seed: u64) -> DiGraph<(), f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = DiGraph::with_capacity(nodes, edges);
    let ids: Vec<NodeIndex> = (0..nodes).map(|_| graph.add_node(())).collect();
    if nodes == 0 {
        return graph;
    }
    for _ in 0..edges {
        let a = ids[rng.gen_range(0..nodes)];
        let b = ids[rng.gen_range(0..nodes)];
        graph.add_edge(a, b, f64::from(rng.gen_range(0u8..=20)));
    }
    graph
}

/// Random undirected graph: a spanning path plus `extra` random chords.
#[must_use]
pub fn random_connected_ungraph(nodes: usize, extra: usize, seed: u64) -> UnGraph<(), f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = UnGraph::with_capacity(nodes, nodes + extra);
    let ids: Vec<NodeIndex> = (0..nodes).map(|_| graph.add_node(())).collect();
    for pair in ids.windows(2) {
        graph.add_edge(pair[0], pair[1], rng.gen_range(0.5..5.0));
    }
    if nodes > 1 {
        for _ in 0..extra {
            let a = ids[rng.gen_range(0..nodes)];
            let b = ids[rng.gen_range(0..nodes)];
            graph.add_edge(a, b, rng.gen_range(0.5..15.0));
        }
    }
    graph
}
