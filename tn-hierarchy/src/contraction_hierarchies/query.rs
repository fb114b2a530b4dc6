//! Point-to-point queries on a finished hierarchy.

use petgraph::graph::NodeIndex;
use tn_core::{
    GraphPath,
    RoutingResult,
};
use tracing::instrument;

use super::graph::{
    ContractionGraph,
    ContractionHierarchy,
    VertexId,
};
use super::search::{
    Direction,
    SearchFrontier,
};

/// Outcome of a bidirectional search that met somewhere.
struct Meeting {
    /// Vertex where the best forward and backward labels meet.
    middle: VertexId,
    /// Exact distance.
    weight: f64,
    /// Forward side after termination.
    forward: SearchFrontier,
    /// Backward side after termination.
    backward: SearchFrontier,
}

/// Bidirectional upward Dijkstra over a [`ContractionHierarchy`].
///
/// Holds no mutable state, so one instance can serve concurrent queries.
#[derive(Clone, Copy, Debug)]
pub struct BidirectionalQuery<'a> {
    /// The searched hierarchy.
    hierarchy: &'a ContractionHierarchy,
}

impl<'a> BidirectionalQuery<'a> {
    /// Query engine over `hierarchy`.
    #[must_use]
    pub const fn new(hierarchy: &'a ContractionHierarchy) -> Self {
        Self { hierarchy }
    }

    /// The searched hierarchy.
    #[must_use]
    pub const fn hierarchy(&self) -> &'a ContractionHierarchy {
        self.hierarchy
    }

    /// Shortest path from `source` to `target` in the input graph, `None` if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint is not a vertex of the graph.
    #[instrument(level = "debug", skip(self), fields(source = source.index(), target = target.index()))]
    pub fn path(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<Option<GraphPath>> {
        let (s, t) = self.endpoints(source, target)?;
        if s == t {
            return Ok(Some(GraphPath::singleton(source)));
        }
        let Some(meeting) = self.search(s, t) else {
            return Ok(None);
        };

        let graph = &self.hierarchy.graph;
        let mut arcs = meeting.forward.into_tree().arcs_to(graph, meeting.middle);
        arcs.extend(meeting.backward.into_tree().arcs_to(graph, meeting.middle));
        let mut path = graph.expand_path(s, &arcs);
        path.weight = meeting.weight;
        Ok(Some(path))
    }

    /// Shortest distance from `source` to `target`, infinite if unreachable.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint is not a vertex of the graph.
    pub fn weight(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<f64> {
        let (s, t) = self.endpoints(source, target)?;
        if s == t {
            return Ok(0.0);
        }
        Ok(self.search(s, t).map_or(f64::INFINITY, |m| m.weight))
    }

    /// Resolves both endpoints to arena handles.
    fn endpoints(&self, source: NodeIndex, target: NodeIndex) -> RoutingResult<(VertexId, VertexId)> {
        let mapping = &self.hierarchy.mapping;
        Ok((mapping.vertex_id(source)?, mapping.vertex_id(target)?))
    }

    /// Alternates the two upward searches, always advancing the side with the smaller key, until
    /// neither side can improve on the best meeting found.
    fn search(&self, s: VertexId, t: VertexId) -> Option<Meeting> {
        let graph = &self.hierarchy.graph;
        let heap = self.hierarchy.heap;
        let mut forward = SearchFrontier::new(Direction::Forward, heap, s);
        let mut backward = SearchFrontier::new(Direction::Backward, heap, t);
        let mut best = f64::INFINITY;
        let mut middle = None;

        loop {
            let advance_forward = match (forward.min_key(), backward.min_key()) {
                (None, None) => break,
                (Some(f), Some(b)) => f <= b,
                (Some(_), None) => true,
                (None, Some(_)) => false,
            };
            if advance_forward {
                step(graph, &mut forward, &backward, &mut best, &mut middle);
            } else {
                step(graph, &mut backward, &forward, &mut best, &mut middle);
            }
            let lowest = forward.min_key().into_iter().chain(backward.min_key()).fold(f64::INFINITY, f64::min);
            if lowest >= best {
                break;
            }
        }

        middle.map(|middle| Meeting { middle, weight: best, forward, backward })
    }
}

/// Settles one vertex of `active`, recording any meeting with `other` that beats `best`.
fn step(
    graph: &ContractionGraph,
    active: &mut SearchFrontier,
    other: &SearchFrontier,
    best: &mut f64,
    middle: &mut Option<VertexId>,
) {
    active.settle_next(
        graph,
        |_| true,
        |v, dist| {
            if let Some(label) = other.label(v) {
                if dist + label.distance < *best {
                    *best = dist + label.distance;
                    *middle = Some(v);
                }
            }
        },
    );
}
