use assertables::*;
use petgraph::graph::{
    DiGraph,
    NodeIndex,
};
use rstest::*;
use tn_core::{
    DijkstraBaseline,
    HeapKind,
    HierarchyConfig,
    TransitConfig,
};

/// Ring of 30 vertices with chords; weights vary with the vertex index.
#[fixture]
fn ring() -> DiGraph<(), u32> {
    let n = 30_u32;
    let mut edges = Vec::new();
    for i in 0..n {
        edges.push((i, (i + 1) % n, 1 + i % 4));
        edges.push(((i + 1) % n, i, 2 + i % 3));
        if i % 5 == 0 {
            edges.push((i, (i + 11) % n, 6));
        }
    }
    DiGraph::from_edges(edges)
}

#[rstest]
fn test_heap_backends_agree(ring: DiGraph<(), u32>) {
    let pairing = DijkstraBaseline::new(&ring).with_heap(HeapKind::Pairing);
    let binary = DijkstraBaseline::new(&ring).with_heap(HeapKind::Binary);

    for s in ring.node_indices() {
        let expected = pairing.tree(s, &[]).unwrap();
        let actual = binary.tree(s, &[]).unwrap();
        for t in ring.node_indices() {
            assert_in_delta!(expected.distance(t), actual.distance(t), 1e-9);
            let path = actual.path_to(t).unwrap();
            let sum: f64 = path.edges.iter().map(|&e| f64::from(ring[e])).sum();
            assert_in_delta!(sum, expected.distance(t), 1e-9);
        }
    }
}

#[rstest]
fn test_targeted_search_stops_early(ring: DiGraph<(), u32>) {
    let baseline = DijkstraBaseline::new(&ring);
    let full = baseline.tree(NodeIndex::new(0), &[]).unwrap();
    let targeted = baseline.tree(NodeIndex::new(0), &[NodeIndex::new(1)]).unwrap();

    assert_eq!(targeted.distance(NodeIndex::new(1)), full.distance(NodeIndex::new(1)));
    assert_lt!(targeted.settled().count(), full.settled().count());
}

#[rstest]
fn test_configs_from_json() {
    let hierarchy: HierarchyConfig = serde_json::from_str(r#"{"seed": 3, "heap": "binary"}"#).unwrap();
    assert_eq!(hierarchy.seed, Some(3));
    assert_eq!(hierarchy.heap, HeapKind::Binary);
    assert_ge!(hierarchy.parallelism, 1);

    let transit: TransitConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(transit.resolve(100).unwrap(), 10);
    assert_eq!(transit.transit_node_count(4).resolve(100).unwrap(), 4);
}
