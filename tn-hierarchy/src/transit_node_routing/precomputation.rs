use std::cmp::Reverse;

use itertools::Itertools;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use tn_core::{
    GraphPath,
    RoutingError,
    RoutingResult,
    TransitConfig,
};
use tracing::{
    info,
    instrument,
};

use super::access::{
    AccessContext,
    AccessVertex,
    VertexAccess,
};
use super::locality::LocalityFilter;
use super::query::TransitNodeRoutingQuery;
use super::voronoi::VoronoiDiagram;
use crate::contraction_hierarchies::{
    ContractionHierarchy,
    VertexId,
};
use crate::many_to_many::{
    bucket_table,
    ManyToManyTable,
};
use crate::workers::{
    run_phase,
    worker_pool,
};

/// Computes transit node routing data on top of a contraction hierarchy.
#[derive(Clone, Debug)]
pub struct TransitNodeRoutingPrecomputation<'a> {
    /// The hierarchy providing contraction order and local searches.
    hierarchy: &'a ContractionHierarchy,
    /// Transit node count and related options.
    config: TransitConfig,
}

impl<'a> TransitNodeRoutingPrecomputation<'a> {
    /// Prepares a precomputation over `hierarchy`.
    #[must_use]
    pub const fn new(hierarchy: &'a ContractionHierarchy, config: TransitConfig) -> Self {
        Self { hierarchy, config }
    }

    /// Selects transit nodes, computes their distance table, every vertex's access vertices and
    /// the locality filter.
    ///
    /// The table and the access searches run on a dedicated pool sized by the configured
    /// `parallelism`, or by the hierarchy's own parallelism when unset.
    ///
    /// # Errors
    ///
    /// Fails if the transit node count or the parallelism is out of range, or a worker panics.
    #[instrument(skip_all, fields(vertices = self.hierarchy.vertex_count()))]
    pub fn compute(&self) -> RoutingResult<TransitNodeRouting<'a>> {
        let hierarchy = self.hierarchy;
        let n = hierarchy.vertex_count();
        let k = self.config.resolve(n)?;
        let pool = worker_pool(self.config.parallelism.unwrap_or(hierarchy.parallelism), "tnr-worker")?;

        let transit_nodes = (0..n).sorted_by_key(|&v| Reverse(hierarchy.mapping.rank_of(v))).take(k).collect_vec();
        let mut is_transit = vec![false; n];
        let mut slots = vec![None; n];
        for (slot, &v) in transit_nodes.iter().enumerate() {
            is_transit[v] = true;
            slots[v] = Some(slot);
        }

        let voronoi = VoronoiDiagram::compute(&hierarchy.graph, &transit_nodes, hierarchy.heap);
        let transit_ids = transit_nodes.iter().map(|&v| NodeIndex::new(v)).collect_vec();
        let table = run_phase(&pool, "transit table", || bucket_table(hierarchy, &transit_ids, &transit_ids))??;

        let context = AccessContext { hierarchy, is_transit: &is_transit, slots: &slots, table: &table, voronoi: &voronoi };
        let accesses = run_phase(&pool, "access discovery", || {
            (0..n).into_par_iter().map(|v| context.discover(v)).collect::<RoutingResult<Vec<_>>>()
        })??;
        let (forward_access, backward_access, locality) = assemble(accesses);

        info!(
            transit_nodes = k,
            threads = pool.current_num_threads(),
            forward_access = forward_access.iter().map(Vec::len).sum::<usize>(),
            backward_access = backward_access.iter().map(Vec::len).sum::<usize>(),
            "transit node routing precomputed"
        );
        Ok(TransitNodeRouting {
            hierarchy,
            transit_nodes,
            slots,
            table,
            voronoi,
            forward_access,
            backward_access,
            locality,
        })
    }
}

/// Per-vertex access lists, both directions.
type AccessLists = Vec<Vec<AccessVertex>>;

/// Splits per-vertex discovery results into access lists and the locality filter.
#[instrument(skip_all, fields(vertices = accesses.len()))]
fn assemble(accesses: Vec<VertexAccess>) -> (AccessLists, AccessLists, LocalityFilter) {
    let n = accesses.len();
    let mut forward_access = Vec::with_capacity(n);
    let mut backward_access = Vec::with_capacity(n);
    let mut forward_cells = Vec::with_capacity(n);
    let mut backward_cells = Vec::with_capacity(n);
    for access in accesses {
        forward_access.push(access.forward);
        backward_access.push(access.backward);
        forward_cells.push(access.forward_cells);
        backward_cells.push(access.backward_cells);
    }
    (forward_access, backward_access, LocalityFilter::new(forward_cells, backward_cells))
}

/// Precomputed transit node routing data.
///
/// Immutable after construction and borrowing its hierarchy, so any number of
/// [`TransitNodeRoutingQuery`] engines can share it across threads.
#[derive(Clone, Debug)]
pub struct TransitNodeRouting<'a> {
    /// Underlying hierarchy, used for local queries.
    hierarchy: &'a ContractionHierarchy,
    /// Transit nodes by decreasing contraction index; position equals table slot.
    transit_nodes: Vec<VertexId>,
    /// Table slot of each vertex, `None` for non-transit vertices.
    slots: Vec<Option<usize>>,
    /// Distances and paths between all transit nodes.
    table: ManyToManyTable<'a>,
    /// Cell assignment.
    voronoi: VoronoiDiagram,
    /// Forward access vertices per vertex.
    forward_access: Vec<Vec<AccessVertex>>,
    /// Backward access vertices per vertex.
    backward_access: Vec<Vec<AccessVertex>>,
    /// Local query detection.
    locality: LocalityFilter,
}

impl<'a> TransitNodeRouting<'a> {
    /// Query engine over this data.
    #[must_use]
    pub fn query(&self) -> TransitNodeRoutingQuery<'_> {
        TransitNodeRoutingQuery::new(self)
    }

    /// The hierarchy this data was computed on.
    #[must_use]
    pub const fn hierarchy(&self) -> &'a ContractionHierarchy {
        self.hierarchy
    }

    /// Transit nodes, highest contraction index first.
    pub fn transit_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.transit_nodes.iter().map(|&v| NodeIndex::new(v))
    }

    /// Whether `v` was selected as a transit node.
    ///
    /// # Errors
    ///
    /// Fails if `v` is not in the graph.
    pub fn is_transit_node(&self, v: NodeIndex) -> RoutingResult<bool> {
        self.slots.get(v.index()).map(Option::is_some).ok_or(RoutingError::UnknownVertex(v.index()))
    }

    /// Transit nodes used to leave `v`, with the exact path to each.
    ///
    /// # Errors
    ///
    /// Fails if `v` is not in the graph.
    pub fn forward_access(&self, v: NodeIndex) -> RoutingResult<&[AccessVertex]> {
        self.forward_access.get(v.index()).map(Vec::as_slice).ok_or(RoutingError::UnknownVertex(v.index()))
    }

    /// Transit nodes used to reach `v`, with the exact path from each.
    ///
    /// # Errors
    ///
    /// Fails if `v` is not in the graph.
    pub fn backward_access(&self, v: NodeIndex) -> RoutingResult<&[AccessVertex]> {
        self.backward_access.get(v.index()).map(Vec::as_slice).ok_or(RoutingError::UnknownVertex(v.index()))
    }

    /// Distances and paths between all pairs of transit nodes.
    #[must_use]
    pub const fn transit_table(&self) -> &ManyToManyTable<'a> {
        &self.table
    }

    /// Cell assignment of every vertex.
    #[must_use]
    pub const fn voronoi(&self) -> &VoronoiDiagram {
        &self.voronoi
    }

    /// Local query detection.
    #[must_use]
    pub const fn locality_filter(&self) -> &LocalityFilter {
        &self.locality
    }

    /// Table distance between two transit nodes, infinite if either is not one.
    pub(crate) fn transit_distance(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        match (self.slot(a), self.slot(b)) {
            (Some(i), Some(j)) => self.table.weight_at(i, j),
            _ => f64::INFINITY,
        }
    }

    /// Table path between two transit nodes.
    pub(crate) fn transit_path(&self, a: NodeIndex, b: NodeIndex) -> Option<GraphPath> {
        self.table.path_at(self.slot(a)?, self.slot(b)?)
    }

    /// Table slot of `v`.
    fn slot(&self, v: NodeIndex) -> Option<usize> {
        self.slots.get(v.index()).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use petgraph::graph::{
        DiGraph,
        UnGraph,
    };
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
    fn test_single_worker_matches_parallel_run() {
        // integral weights keep distance ties exact across runs
        let graph = random_digraph(40, 140, 13);
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(13)).build(&graph).unwrap();
        let single = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default().parallelism(1))
            .compute()
            .unwrap();
        let parallel = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default().parallelism(4))
            .compute()
            .unwrap();
        let baseline = DijkstraBaseline::new(&graph);

        assert_eq!(single.transit_nodes().collect_vec(), parallel.transit_nodes().collect_vec());
        let summary = |access: &[AccessVertex]| access.iter().map(|a| (a.transit, a.distance())).collect_vec();
        for v in graph.node_indices() {
            assert_eq!(summary(single.forward_access(v).unwrap()), summary(parallel.forward_access(v).unwrap()));
            assert_eq!(summary(single.backward_access(v).unwrap()), summary(parallel.backward_access(v).unwrap()));
        }
        for s in graph.node_indices().step_by(3) {
            for t in graph.node_indices() {
                let expected = baseline.weight(s, t).unwrap();
                let actual = single.query().weight(s, t).unwrap();
                if expected.is_infinite() {
                    assert_eq!(actual, f64::INFINITY);
                } else {
                    assert_in_delta!(actual, expected, EPS);
                }
            }
        }
    }

    #[rstest]
    fn test_zero_parallelism_rejected(short_chain: UnGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::default().build(&short_chain).unwrap();
        let err = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default().parallelism(0))
            .compute()
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidConfiguration(_)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(5))]
    fn test_empty_graph_routes_nothing(#[case] transit: Option<usize>) {
        let graph = DiGraph::<(), f64>::new();
        let hierarchy = ContractionHierarchyBuilder::default().build(&graph).unwrap();
        let config = TransitConfig { transit_node_count: transit, ..TransitConfig::default() };
        let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, config).compute().unwrap();

        assert_eq!(routing.transit_nodes().count(), 0);
        assert!(routing.transit_table().sources().is_empty());
        assert_eq!(routing.query().weight(n(0), n(0)), Err(RoutingError::UnknownVertex(0)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(5))]
    fn test_single_vertex_is_all_local(#[case] transit: Option<usize>) {
        let mut graph = DiGraph::<(), f64>::new();
        let v = graph.add_node(());
        let hierarchy = ContractionHierarchyBuilder::default().build(&graph).unwrap();
        let config = TransitConfig { transit_node_count: transit, ..TransitConfig::default() };
        let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, config).compute().unwrap();
        let query = routing.query();

        assert_eq!(routing.transit_nodes().count(), 0);
        assert!(!routing.is_transit_node(v).unwrap());
        assert!(routing.forward_access(v).unwrap().is_empty());
        assert!(query.is_local(v, v).unwrap());
        assert_eq!(query.path(v, v).unwrap(), Some(GraphPath::singleton(v)));
        assert_eq!(query.weight(v, v).unwrap(), 0.0);
    }

    #[test]
    #[traced_test]
    fn test_precomputation_logs_summary_only() {
        let graph = grid_graph(5, 5, 2);
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(2)).build(&graph).unwrap();
        TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default().parallelism(1)).compute().unwrap();

        assert!(logs_contain("transit node routing precomputed"));
        assert!(logs_contain("threads=1"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("many-to-many table computed")).count() {
                0 => Ok(()),
                count => Err(format!("access discovery logged {count} table lines")),
            }
        });
    }
}
