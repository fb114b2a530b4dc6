//! Witness search: does a path that avoids the contracted vertex keep `u -> w` short?

use std::collections::{
    HashMap,
    HashSet,
};

use ordered_float::OrderedFloat;
use tn_core::{
    AddressableHeap,
    HeapKind,
    Weight,
};

use super::graph::{
    ContractionGraph,
    ContractionVertex,
    VertexId,
};

/// Reusable bounded Dijkstra over the remaining (uncontracted) graph.
///
/// One instance per worker; its buffers are cleared between runs.
pub struct WitnessSearch {
    /// Search queue.
    queue: Box<dyn AddressableHeap<Weight>>,
    /// Tentative distances from the current source.
    distances: HashMap<VertexId, f64>,
    /// Targets not yet settled.
    remaining: HashSet<VertexId>,
}

impl WitnessSearch {
    /// Creates an idle search backed by `heap`.
    #[must_use]
    pub fn new(heap: HeapKind) -> Self {
        Self { queue: heap.build(), distances: HashMap::new(), remaining: HashSet::new() }
    }

    /// Searches from `source` without entering `excluded` or contracted vertices.
    ///
    /// Stops once every target is settled or the next key exceeds `radius`.
    pub fn run(
        &mut self,
        graph: &ContractionGraph,
        vertices: &[ContractionVertex],
        source: VertexId,
        excluded: VertexId,
        targets: &[VertexId],
        radius: f64,
    ) {
        self.queue.clear();
        self.distances.clear();
        self.remaining.clear();
        self.remaining.extend(targets.iter().copied());

        self.distances.insert(source, 0.0);
        self.queue.push(source, OrderedFloat(0.0));

        while let Some((x, OrderedFloat(dist))) = self.queue.pop_min() {
            if dist > radius {
                break;
            }
            if self.remaining.remove(&x) && self.remaining.is_empty() {
                break;
            }
            for &id in graph.outgoing(x) {
                let arc = graph.arc(id);
                let y = arc.target;
                if y == excluded || vertices[y].contracted {
                    continue;
                }
                let candidate = dist + arc.weight;
                if candidate > radius {
                    continue;
                }
                if self.distances.get(&y).map_or(true, |&old| candidate < old) {
                    self.distances.insert(y, candidate);
                    self.queue.push(y, OrderedFloat(candidate));
                }
            }
        }
    }

    /// Length of the best witness to `v` found by the last run; infinite if none.
    #[must_use]
    pub fn distance(&self, v: VertexId) -> f64 {
        self.distances.get(&v).copied().unwrap_or(f64::INFINITY)
    }
}
