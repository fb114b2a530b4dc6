//! Every accelerated query must agree with plain Dijkstra on the input graph.

use anyhow::{
    ensure,
    Context,
    Result,
};
use assertables::*;
use petgraph::graph::{
    Graph,
    NodeIndex,
};
use petgraph::EdgeType;
use rstest::rstest;
use tn_core::testutils::*;
use tn_core::{
    DijkstraBaseline,
    GraphPath,
    HeapKind,
    HierarchyConfig,
    TransitConfig,
};
use tn_hierarchy::{
    ContractionHierarchyBuilder,
    ManyToManyShortestPaths,
    TransitNodeRoutingPrecomputation,
};

/// Checks that `path` runs from `s` to `t` over real edges and weighs `expected`.
fn check_path<Ty: EdgeType>(
    graph: &Graph<(), f64, Ty>,
    path: &GraphPath,
    s: NodeIndex,
    t: NodeIndex,
    expected: f64,
) -> Result<()> {
    ensure!(path.start() == Some(s) && path.end() == Some(t), "path {path:?} does not link {s:?} and {t:?}");
    ensure!(path.vertices.len() == path.edges.len() + 1, "malformed path {path:?}");
    let mut edge_sum = 0.0;
    for (i, &e) in path.edges.iter().enumerate() {
        let (a, b) = graph.edge_endpoints(e).context("edge outside the graph")?;
        let (from, to) = (path.vertices[i], path.vertices[i + 1]);
        let matches = (a, b) == (from, to) || (!graph.is_directed() && (b, a) == (from, to));
        ensure!(matches, "edge {e:?} does not join {from:?} and {to:?}");
        edge_sum += graph[e];
    }
    assert_in_delta!(edge_sum, expected, EPS);
    assert_in_delta!(path.weight, expected, EPS);
    Ok(())
}

#[rstest]
#[case(1, 30, 90)]
#[case(2, 50, 120)]
#[case(3, 60, 300)]
#[case(4, 12, 60)]
fn test_hierarchy_matches_dijkstra_on_random_digraphs(
    #[case] seed: u64,
    #[case] nodes: usize,
    #[case] edges: usize,
) -> Result<()> {
    let graph = random_digraph(nodes, edges, seed);
    let config = HierarchyConfig::default().seed(seed).parallelism(3);
    let hierarchy = ContractionHierarchyBuilder::new(config).build(&graph)?;
    let query = hierarchy.query();
    let baseline = DijkstraBaseline::new(&graph);

    for s in graph.node_indices() {
        let tree = baseline.tree(s, &[])?;
        for t in graph.node_indices() {
            let expected = tree.distance(t);
            match query.path(s, t)? {
                Some(path) => check_path(&graph, &path, s, t, expected)?,
                None => ensure!(expected.is_infinite(), "missed path {s:?} -> {t:?}"),
            }
            let weight = query.weight(s, t)?;
            ensure!(weight == expected || (weight - expected).abs() <= EPS, "{s:?} -> {t:?}: {weight} vs {expected}");
        }
    }
    Ok(())
}

#[rstest]
#[case(HeapKind::Pairing)]
#[case(HeapKind::Binary)]
fn test_shortcuts_unpack_to_their_weight(#[case] heap: HeapKind) -> Result<()> {
    let graph = grid_graph(7, 6, 12);
    let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(12).heap(heap)).build(&graph)?;
    ensure!(hierarchy.graph.shortcut_count() > 0, "grid contraction should need shortcuts");

    for (id, arc) in hierarchy.graph.arcs().filter(|(_, arc)| arc.is_shortcut()) {
        let leaves = hierarchy.graph.unpack(id);
        let total: f64 = leaves.iter().map(|&(e, _)| graph[e]).sum();
        assert_in_delta!(total, arc.weight, EPS);
        ensure!(leaves.last().map(|&(_, head)| head) == Some(arc.target), "shortcut {id} ends elsewhere");
    }
    Ok(())
}

#[rstest]
#[case(5, 40)]
#[case(6, 80)]
fn test_bucket_table_matches_baseline_table(#[case] seed: u64, #[case] nodes: usize) -> Result<()> {
    let graph = random_connected_ungraph(nodes, nodes, seed);
    let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(seed)).build(&graph)?;
    let sources = graph.node_indices().step_by(3).collect::<Vec<_>>();
    let targets = graph.node_indices().step_by(4).collect::<Vec<_>>();

    let oracle = DijkstraBaseline::new(&graph);
    let expected = ManyToManyShortestPaths::Baseline(&oracle).compute(&sources, &targets)?;
    let actual = ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&sources, &targets)?;

    for &s in &sources {
        for &t in &targets {
            let weight = expected.get_weight(s, t)?;
            assert_in_delta!(actual.get_weight(s, t)?, weight, EPS);
            let path = actual.get_path(s, t)?.context("connected graph")?;
            check_path(&graph, &path, s, t, weight)?;
        }
    }
    Ok(())
}

#[rstest]
#[case(7, None)]
#[case(8, Some(3))]
#[case(9, Some(20))]
fn test_transit_node_routing_matches_dijkstra(#[case] seed: u64, #[case] transit: Option<usize>) -> Result<()> {
    let graph = random_digraph(45, 160, seed);
    let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(seed)).build(&graph)?;
    let config = TransitConfig { transit_node_count: transit, ..TransitConfig::default() };
    let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, config).compute()?;
    let query = routing.query();
    let baseline = DijkstraBaseline::new(&graph);

    for transit_node in routing.transit_nodes() {
        ensure!(routing.is_transit_node(transit_node)?);
        let access = routing.forward_access(transit_node)?;
        ensure!(access.len() == 1 && access[0].transit == transit_node, "transit nodes access themselves");
    }

    for s in graph.node_indices() {
        let tree = baseline.tree(s, &[])?;
        for t in graph.node_indices() {
            let expected = tree.distance(t);
            match query.path(s, t)? {
                Some(path) => check_path(&graph, &path, s, t, expected)?,
                None => ensure!(expected.is_infinite(), "missed path {s:?} -> {t:?}"),
            }
        }
    }
    Ok(())
}

#[rstest]
fn test_access_paths_are_shortest(small_network: Graph<(), f64>) -> Result<()> {
    let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(5)).build(&small_network)?;
    let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default()).compute()?;
    let baseline = DijkstraBaseline::new(&small_network);

    for v in small_network.node_indices() {
        for access in routing.forward_access(v)? {
            let expected = baseline.weight(v, access.transit)?;
            check_path(&small_network, &access.path, v, access.transit, expected)?;
        }
        for access in routing.backward_access(v)? {
            let expected = baseline.weight(access.transit, v)?;
            check_path(&small_network, &access.path, access.transit, v, expected)?;
        }
    }
    Ok(())
}
