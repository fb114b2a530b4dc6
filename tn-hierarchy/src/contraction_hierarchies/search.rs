//! Upward searches over a finished hierarchy.
//!
//! Every hierarchy query, whether point-to-point, many-to-many or transit-node access discovery,
//! is built from the same primitive: a Dijkstra search that only climbs in contraction order.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use tn_core::{
    AddressableHeap,
    HeapKind,
    Weight,
};

use super::graph::{
    ArcId,
    ContractionGraph,
    VertexId,
};

/// Which way a search travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// From the source along upward out-arcs.
    Forward,
    /// From the target against arcs entering from higher-ranked vertices.
    Backward,
}

/// Distance label of a reached vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Label {
    /// Distance from (forward) or to (backward) the root.
    pub distance: f64,
    /// Arc through which the label was set; `None` for the root.
    pub parent: Option<ArcId>,
}

/// One side of a search in progress.
pub struct SearchFrontier {
    /// Travel direction.
    direction: Direction,
    /// Search origin.
    root: VertexId,
    /// Open vertices.
    queue: Box<dyn AddressableHeap<Weight>>,
    /// Best known label of every reached vertex.
    labels: HashMap<VertexId, Label>,
}

impl SearchFrontier {
    /// A frontier containing only `root`.
    #[must_use]
    pub fn new(direction: Direction, heap: HeapKind, root: VertexId) -> Self {
        let mut queue = heap.build();
        queue.push(root, OrderedFloat(0.0));
        let labels = HashMap::from([(root, Label { distance: 0.0, parent: None })]);
        Self { direction, root, queue, labels }
    }

    /// Smallest open key, `None` once the frontier is exhausted.
    #[must_use]
    pub fn min_key(&self) -> Option<f64> {
        self.queue.peek_min().map(|(_, OrderedFloat(key))| key)
    }

    /// Label of `v`, if reached.
    #[must_use]
    pub fn label(&self, v: VertexId) -> Option<Label> {
        self.labels.get(&v).copied()
    }

    /// Settles the closest open vertex and relaxes its arcs.
    ///
    /// `on_improve` sees every vertex whose label got better. When `expand` returns `false` for
    /// the settled vertex its arcs are not relaxed.
    pub fn settle_next(
        &mut self,
        graph: &ContractionGraph,
        mut expand: impl FnMut(VertexId) -> bool,
        mut on_improve: impl FnMut(VertexId, f64),
    ) -> Option<(VertexId, f64)> {
        let (v, OrderedFloat(dist)) = self.queue.pop_min()?;
        if !expand(v) {
            return Some((v, dist));
        }

        let arcs = match self.direction {
            Direction::Forward => graph.upward(v),
            Direction::Backward => graph.downward_into(v),
        };
        for &id in arcs {
            let arc = graph.arc(id);
            let next = match self.direction {
                Direction::Forward => arc.target,
                Direction::Backward => arc.source,
            };
            let candidate = dist + arc.weight;
            if self.labels.get(&next).map_or(true, |l| candidate < l.distance) {
                self.labels.insert(next, Label { distance: candidate, parent: Some(id) });
                self.queue.push(next, OrderedFloat(candidate));
                on_improve(next, candidate);
            }
        }
        Some((v, dist))
    }

    /// Freezes the labels into a search tree.
    #[must_use]
    pub fn into_tree(self) -> SearchTree {
        SearchTree { direction: self.direction, root: self.root, labels: self.labels }
    }
}

/// Labels of a completed upward search.
#[derive(Clone, Debug)]
pub struct SearchTree {
    /// Travel direction.
    direction: Direction,
    /// Search origin.
    root: VertexId,
    /// Label of every reached vertex.
    labels: HashMap<VertexId, Label>,
}

impl SearchTree {
    /// Runs a search from `root` until its frontier is exhausted.
    ///
    /// Vertices for which `expand` returns `false` are labelled but never relaxed.
    #[must_use]
    pub fn explore(
        graph: &ContractionGraph,
        root: VertexId,
        direction: Direction,
        heap: HeapKind,
        mut expand: impl FnMut(VertexId) -> bool,
    ) -> Self {
        let mut frontier = SearchFrontier::new(direction, heap, root);
        while frontier.settle_next(graph, &mut expand, |_, _| {}).is_some() {}
        frontier.into_tree()
    }

    /// Search origin.
    #[must_use]
    pub const fn root(&self) -> VertexId {
        self.root
    }

    /// Label of `v`, if reached.
    #[must_use]
    pub fn label(&self, v: VertexId) -> Option<Label> {
        self.labels.get(&v).copied()
    }

    /// Every reached vertex with its distance.
    pub fn labels(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.labels.iter().map(|(&v, l)| (v, l.distance))
    }

    /// Arcs linking the root and `v`, in travel order.
    ///
    /// Forward trees yield the path root to `v`, backward trees the path `v` to root.
    #[must_use]
    pub fn arcs_to(&self, graph: &ContractionGraph, v: VertexId) -> Vec<ArcId> {
        let mut arcs = Vec::new();
        let mut current = v;
        while let Some(id) = self.labels.get(&current).and_then(|l| l.parent) {
            arcs.push(id);
            let arc = graph.arc(id);
            current = match self.direction {
                Direction::Forward => arc.source,
                Direction::Backward => arc.target,
            };
        }
        if self.direction == Direction::Forward {
            arcs.reverse();
        }
        arcs
    }
}
