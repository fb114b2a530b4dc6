//! Distance tables between a set of sources and a set of targets.
//!
//! Two interchangeable strategies produce the same [`ManyToManyTable`]:
//!
//! - [`ManyToManyShortestPaths::Baseline`] runs one plain Dijkstra per source on the input graph.
//! - [`ManyToManyShortestPaths::Hierarchy`] runs the bucket algorithm on a contraction hierarchy,
//!   needing one upward search per source and per target instead of one full search per pair.

/// Parallel per-source Dijkstra
mod baseline;
mod bucket;
/// Result table
mod table;

use petgraph::graph::NodeIndex;
use tn_core::{
    RoutingError,
    RoutingResult,
    ShortestPathOracle,
};
use tracing::{
    info,
    instrument,
};

pub(crate) use self::bucket::bucket_table;
pub use self::table::ManyToManyTable;
use crate::contraction_hierarchies::ContractionHierarchy;
use crate::workers::{
    run_phase,
    worker_pool,
};

/// Strategy for computing a many-to-many table.
///
/// Each strategy brings its own worker count: the oracle's [`ShortestPathOracle::parallelism`]
/// or the hierarchy's build-time [`ContractionHierarchy::parallelism`].
#[derive(Clone, Copy)]
pub enum ManyToManyShortestPaths<'a> {
    /// Independent single-source searches on the input graph, typically a
    /// [`tn_core::DijkstraBaseline`].
    Baseline(&'a dyn ShortestPathOracle),
    /// Bucket search on a contraction hierarchy.
    Hierarchy(&'a ContractionHierarchy),
}

impl<'a> ManyToManyShortestPaths<'a> {
    /// Computes distances between every source and every target.
    ///
    /// Paths are not materialised up front; [`ManyToManyTable::get_path`] rebuilds them on demand.
    ///
    /// # Errors
    ///
    /// Fails if any requested vertex is not in the graph, on negative weights met by the baseline,
    /// on a zero worker count, or if a worker panics.
    #[instrument(skip_all, fields(sources = sources.len(), targets = targets.len()))]
    pub fn compute(&self, sources: &[NodeIndex], targets: &[NodeIndex]) -> RoutingResult<ManyToManyTable<'a>> {
        let (vertex_count, parallelism) = match *self {
            Self::Baseline(oracle) => (oracle.vertex_count(), oracle.parallelism()),
            Self::Hierarchy(hierarchy) => (hierarchy.vertex_count(), hierarchy.parallelism),
        };
        if let Some(v) = sources.iter().chain(targets).find(|v| v.index() >= vertex_count) {
            return Err(RoutingError::UnknownVertex(v.index()));
        }

        let pool = worker_pool(parallelism, "m2m-worker")?;
        let table = match *self {
            Self::Baseline(oracle) => {
                run_phase(&pool, "baseline table", || baseline::baseline_table(oracle, sources, targets))??
            },
            Self::Hierarchy(hierarchy) => {
                run_phase(&pool, "bucket table", || bucket_table(hierarchy, sources, targets))??
            },
        };
        info!(sources = sources.len(), targets = targets.len(), threads = parallelism, "many-to-many table computed");
        Ok(table)
    }
}

impl std::fmt::Debug for ManyToManyShortestPaths<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Baseline(oracle) => f.debug_tuple("Baseline").field(&oracle.vertex_count()).finish(),
            Self::Hierarchy(hierarchy) => f.debug_tuple("Hierarchy").field(&hierarchy.vertex_count()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use petgraph::graph::DiGraph;
    use rstest::rstest;
    use tn_core::testutils::*;
    use tn_core::{
        DijkstraBaseline,
        GraphPath,
        HierarchyConfig,
    };
    use tracing_test::traced_test;

    use super::*;
    use crate::contraction_hierarchies::ContractionHierarchyBuilder;

    #[rstest]
    fn test_strategies_agree(small_network: DiGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(8)).build(&small_network).unwrap();
        let sources = [n(0), n(3), n(7), n(8)];
        let targets = [n(1), n(2), n(5), n(6), n(8), n(0)];

        let oracle = DijkstraBaseline::new(&small_network).with_parallelism(2);
        let baseline = ManyToManyShortestPaths::Baseline(&oracle).compute(&sources, &targets).unwrap();
        let buckets = ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&sources, &targets).unwrap();

        for &s in &sources {
            for &t in &targets {
                let expected = baseline.get_weight(s, t).unwrap();
                let actual = buckets.get_weight(s, t).unwrap();
                if expected.is_infinite() {
                    assert_eq!(actual, f64::INFINITY);
                    assert_eq!(buckets.get_path(s, t).unwrap(), None);
                    continue;
                }
                assert_in_delta!(actual, expected, EPS);
                let path = buckets.get_path(s, t).unwrap().unwrap();
                assert_eq!((path.start(), path.end()), (Some(s), Some(t)));
                let edge_sum: f64 = path.edges.iter().map(|&e| small_network[e]).sum();
                assert_in_delta!(edge_sum, expected, EPS);
            }
        }
    }

    #[rstest]
    fn test_more_sources_than_targets(small_network: DiGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(1)).build(&small_network).unwrap();
        let sources = small_network.node_indices().collect::<Vec<_>>();
        let table = ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&sources, &[n(4)]).unwrap();
        let baseline = DijkstraBaseline::new(&small_network);
        for &s in &sources {
            assert_in_delta!(table.get_weight(s, n(4)).unwrap(), baseline.weight(s, n(4)).unwrap(), EPS);
        }
        assert_eq!(table.get_path(n(4), n(4)).unwrap(), Some(GraphPath::singleton(n(4))));
    }

    #[rstest]
    fn test_unknown_vertices(small_network: DiGraph<(), f64>) {
        let oracle = DijkstraBaseline::new(&small_network);
        let strategy = ManyToManyShortestPaths::Baseline(&oracle);
        assert_eq!(strategy.compute(&[n(0)], &[n(99)]).unwrap_err(), RoutingError::UnknownVertex(99));

        let table = strategy.compute(&[n(0)], &[n(1)]).unwrap();
        assert_eq!(table.get_weight(n(1), n(1)), Err(RoutingError::UnknownVertex(1)));
        assert_eq!(table.get_path(n(0), n(0)), Err(RoutingError::UnknownVertex(0)));
        assert_eq!(table.sources(), &[n(0)]);
        assert_eq!(table.targets(), &[n(1)]);
    }

    #[rstest]
    fn test_empty_request(small_network: DiGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::default().build(&small_network).unwrap();
        let table = ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&[], &[n(1)]).unwrap();
        assert!(table.sources().is_empty());
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_runs_with_configured_parallelism(small_network: DiGraph<(), f64>, #[case] parallelism: usize) {
        let config = HierarchyConfig::default().seed(3).parallelism(parallelism);
        let hierarchy = ContractionHierarchyBuilder::new(config).build(&small_network).unwrap();
        let oracle = DijkstraBaseline::new(&small_network).with_parallelism(parallelism);
        let vertices = small_network.node_indices().collect::<Vec<_>>();

        let buckets = ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&vertices, &vertices).unwrap();
        let baseline = ManyToManyShortestPaths::Baseline(&oracle).compute(&vertices, &vertices).unwrap();
        for &s in &vertices {
            for &t in &vertices {
                let expected = baseline.get_weight(s, t).unwrap();
                if expected.is_infinite() {
                    assert_eq!(buckets.get_weight(s, t).unwrap(), f64::INFINITY);
                } else {
                    assert_in_delta!(buckets.get_weight(s, t).unwrap(), expected, EPS);
                }
            }
        }
    }

    #[rstest]
    fn test_zero_parallelism_oracle_rejected(small_network: DiGraph<(), f64>) {
        let oracle = DijkstraBaseline::new(&small_network).with_parallelism(0);
        let err = ManyToManyShortestPaths::Baseline(&oracle).compute(&[n(0)], &[n(1)]).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidConfiguration(_)));
    }

    #[test]
    #[traced_test]
    fn test_public_compute_logs_once() {
        let graph = DiGraph::<(), f64>::from_edges([(0, 1, 1.0), (1, 2, 1.0)]);
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(1)).build(&graph).unwrap();
        ManyToManyShortestPaths::Hierarchy(&hierarchy).compute(&[n(0)], &[n(2)]).unwrap();
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("many-to-many table computed")).count() {
                1 => Ok(()),
                count => Err(format!("expected one table line, got {count}")),
            }
        });
    }
}
