use itertools::iproduct;
use petgraph::graph::NodeIndex;
use tn_core::{
    GraphPath,
    RoutingResult,
};
use tracing::instrument;

use super::access::AccessVertex;
use super::precomputation::TransitNodeRouting;
use crate::contraction_hierarchies::BidirectionalQuery;

/// Answers queries from precomputed transit node routing data.
///
/// Global queries combine access vertices with the transit table; local queries fall back to a
/// plain contraction hierarchy query.
#[derive(Clone, Copy, Debug)]
pub struct TransitNodeRoutingQuery<'a> {
    /// Precomputed data.
    routing: &'a TransitNodeRouting<'a>,
    /// Fallback for local queries.
    local: BidirectionalQuery<'a>,
}

impl<'a> TransitNodeRoutingQuery<'a> {
    /// Query engine over `routing`.
    #[must_use]
    pub const fn new(routing: &'a TransitNodeRouting<'a>) -> Self {
        Self { routing, local: BidirectionalQuery::new(routing.hierarchy()) }
    }

    /// True if `source -> target` is answered by the local fallback.
    ///
    /// # Errors
    ///
    /// Fails if either vertex is not in the graph.
    pub fn is_local(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<bool> {
        self.routing.locality_filter().is_local(source, target)
    }

    /// Shortest path from `source` to `target`, `None` if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if either vertex is not in the graph.
    #[instrument(level = "debug", skip(self), fields(source = source.index(), target = target.index()))]
    pub fn path(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<Option<GraphPath>> {
        if self.is_local(source, target)? {
            return self.local.path(source, target);
        }
        let Some((first, last, _)) = self.best_access_pair(source, target)? else {
            return Ok(None);
        };
        let Some(middle) = self.routing.transit_path(first.transit, last.transit) else {
            return Ok(None);
        };
        first.path.clone().concat(middle)?.concat(last.path.clone()).map(Some)
    }

    /// Shortest distance from `source` to `target`, infinite if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if either vertex is not in the graph.
    pub fn weight(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<f64> {
        if self.is_local(source, target)? {
            return self.local.weight(source, target);
        }
        Ok(self.best_access_pair(source, target)?.map_or(f64::INFINITY, |(_, _, weight)| weight))
    }

    /// Minimises `d(s, a) + T(a, b) + d(b, t)` over all forward access vertices `a` of the source
    /// and backward access vertices `b` of the target.
    fn best_access_pair(
        &self,
        source: NodeIndex,
        target: NodeIndex,
    ) -> RoutingResult<Option<(&'a AccessVertex, &'a AccessVertex, f64)>> {
        let routing = self.routing;
        let forward = routing.forward_access(source)?;
        let backward = routing.backward_access(target)?;
        Ok(iproduct!(forward, backward)
            .map(|(a, b)| (a, b, a.distance() + routing.transit_distance(a.transit, b.transit) + b.distance()))
            .filter(|(_, _, weight)| weight.is_finite())
            .min_by(|x, y| x.2.total_cmp(&y.2)))
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use petgraph::graph::UnGraph;
    use rstest::rstest;
    use tn_core::testutils::*;
    use tn_core::{
        DijkstraBaseline,
        HierarchyConfig,
        RoutingError,
        TransitConfig,
    };

    use super::*;
    use crate::contraction_hierarchies::ContractionHierarchyBuilder;
    use crate::transit_node_routing::TransitNodeRoutingPrecomputation;

    #[rstest]
    fn test_locality_scenario(short_chain: UnGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::default().build_with_order(&short_chain, [n(0), n(2), n(1)]).unwrap();
        let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default().transit_node_count(1))
            .compute()
            .unwrap();
        let query = routing.query();

        assert_eq!(routing.transit_nodes().collect::<Vec<_>>(), vec![n(1)]);
        assert!(query.is_local(n(0), n(0)).unwrap());
        assert!(!query.is_local(n(0), n(1)).unwrap());
        assert!(query.is_local(n(0), n(2)).unwrap());

        assert_eq!(query.weight(n(0), n(1)).unwrap(), 1.0);
        assert_eq!(query.weight(n(0), n(2)).unwrap(), 3.0);
        let path = query.path(n(2), n(1)).unwrap().unwrap();
        assert_eq!(path.vertices, vec![n(2), n(1)]);
        assert_eq!(path.weight, 2.0);
    }

    #[rstest]
    fn test_global_path_joins_segments() {
        let graph = grid_graph(8, 8, 21);
        let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(4)).build(&graph).unwrap();
        let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default()).compute().unwrap();
        let query = routing.query();
        let baseline = DijkstraBaseline::new(&graph);

        let mut global = 0;
        for s in graph.node_indices().step_by(5) {
            for t in graph.node_indices().step_by(7).chain(routing.transit_nodes()) {
                if !query.is_local(s, t).unwrap() {
                    global += 1;
                }
                let expected = baseline.weight(s, t).unwrap();
                let path = query.path(s, t).unwrap().unwrap();
                assert_in_delta!(path.weight, expected, EPS);
                assert_in_delta!(query.weight(s, t).unwrap(), expected, EPS);
                assert_eq!((path.start(), path.end()), (Some(s), Some(t)));
                let edge_sum: f64 = path.edges.iter().map(|&e| graph[e]).sum();
                assert_in_delta!(edge_sum, expected, EPS);
            }
        }
        assert_gt!(global, 0);
    }

    #[rstest]
    fn test_unknown_vertex(short_chain: UnGraph<(), f64>) {
        let hierarchy = ContractionHierarchyBuilder::default().build(&short_chain).unwrap();
        let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default()).compute().unwrap();
        assert_eq!(routing.query().weight(n(0), n(5)), Err(RoutingError::UnknownVertex(5)));
        assert_eq!(routing.is_transit_node(n(5)), Err(RoutingError::UnknownVertex(5)));
    }
}
