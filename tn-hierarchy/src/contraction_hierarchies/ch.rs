use std::ops::Range;

use itertools::Itertools;
use petgraph::graph::{
    Graph,
    NodeIndex,
};
use petgraph::EdgeType;
use rand::rngs::StdRng;
use rand::{
    Rng,
    SeedableRng,
};
use rayon::prelude::*;
use rayon::ThreadPool;
use tn_core::{
    AddressableHeap,
    EdgeCost,
    HeapKind,
    HierarchyConfig,
    RoutingError,
    RoutingResult,
};
use tracing::{
    debug,
    info,
    instrument,
};

use super::graph::{
    ArcId,
    ArcKind,
    ContractionGraph,
    ContractionHierarchy,
    ContractionMapping,
    ContractionVertex,
    VertexId,
};
use super::priority::VertexPriority;
use super::witness::WitnessSearch;
use crate::workers::{
    run_phase,
    worker_pool,
};

/// A shortcut that contracting some vertex would insert.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PlannedShortcut {
    /// Tail, an uncontracted in-neighbour of the contracted vertex.
    source: VertexId,
    /// Head, an uncontracted out-neighbour of the contracted vertex.
    target: VertexId,
    /// Combined weight of the two skipped arcs.
    weight: f64,
    /// Arc entering the contracted vertex.
    first: ArcId,
    /// Arc leaving the contracted vertex.
    second: ArcId,
}

/// An uncontracted neighbour reached through one live arc: `(arc, neighbour, weight)`.
type LiveArc = (ArcId, VertexId, f64);

// In the context of contracting a graph whose vertices and arcs are both addressed by dense
// indices, facing the need to insert shortcuts whose validity depends on arcs created earlier, we
// decided for a single growing arc arena in which a shortcut refers to its two children by handle
// and a heavier arc u -> w is overwritten in place, and neglected rebuilding adjacency per
// contraction, to achieve stable handles for unpacking and a memory footprint linear in the final
// arc count, accepting that witness searches must skip arcs into contracted vertices.

/// Builds a [`ContractionHierarchy`] from any weighted `petgraph` graph.
///
/// The contraction order is chosen lazily: vertices sit in a priority queue keyed by
/// [`VertexPriority`], and the popped vertex is re-evaluated before contraction. If its fresh
/// priority is no longer minimal it is pushed back instead.
#[derive(Clone, Debug, Default)]
pub struct ContractionHierarchyBuilder {
    /// Construction options.
    config: HierarchyConfig,
}

impl ContractionHierarchyBuilder {
    /// Creates a builder with the given options.
    #[must_use]
    pub const fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Construction options.
    #[must_use]
    pub const fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Contracts every vertex of `graph` in heuristic order.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, negative edge weights, or a panicking worker.
    #[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub fn build<N, E: EdgeCost, Ty: EdgeType>(&self, graph: &Graph<N, E, Ty>) -> RoutingResult<ContractionHierarchy> {
        self.config.validate()?;
        let heap = self.config.heap;
        let augmented = ContractionGraph::from_graph(graph)?;
        let pool = self.worker_pool()?;

        let mut rng = self.config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let tiebreaks = (0..graph.node_count()).map(|_| rng.gen()).collect_vec();
        let mut state = Contraction::new(augmented, tiebreaks);

        let mut queue = heap.build::<VertexPriority>();
        for (v, priority) in state.initial_priorities(&pool, heap)?.into_iter().enumerate() {
            queue.push(v, priority);
        }
        state.contract_lazily(queue.as_mut(), heap);

        state.finish(&pool, heap, self.config.parallelism)
    }

    /// Contracts the vertices of `graph` in exactly the given order.
    ///
    /// # Errors
    ///
    /// Besides the failures of [`Self::build`], rejects orders that are not a permutation of the
    /// graph's vertices.
    #[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub fn build_with_order<N, E: EdgeCost, Ty: EdgeType>(
        &self,
        graph: &Graph<N, E, Ty>,
        order: impl IntoIterator<Item = NodeIndex>,
    ) -> RoutingResult<ContractionHierarchy> {
        self.config.validate()?;
        let order = order.into_iter().collect_vec();
        let n = graph.node_count();

        let mut seen = vec![false; n];
        for v in &order {
            let slot = seen.get_mut(v.index()).ok_or(RoutingError::UnknownVertex(v.index()))?;
            if *slot {
                return Err(RoutingError::config(format!(
                    "vertex {} appears twice in the contraction order",
                    v.index()
                )));
            }
            *slot = true;
        }
        if order.len() != n {
            return Err(RoutingError::config(format!("contraction order covers {} of {n} vertices", order.len())));
        }

        let heap = self.config.heap;
        let augmented = ContractionGraph::from_graph(graph)?;
        let pool = self.worker_pool()?;
        let mut state = Contraction::new(augmented, vec![0; n]);
        state.contract_in_order(&order, heap);

        state.finish(&pool, heap, self.config.parallelism)
    }

    /// Dedicated pool for the parallel phases, sized by the configured parallelism.
    fn worker_pool(&self) -> RoutingResult<ThreadPool> {
        worker_pool(self.config.parallelism, "ch-worker")
    }
}

/// Mutable state of one construction run.
struct Contraction {
    /// Arcs and shortcuts inserted so far.
    graph: ContractionGraph,
    /// Per-vertex contraction state.
    vertices: Vec<ContractionVertex>,
    /// Per-vertex random tiebreak.
    tiebreaks: Vec<u64>,
    /// Index handed to the next contracted vertex.
    next_index: usize,
}

impl Contraction {
    /// Starts a run over `graph` with nothing contracted.
    fn new(graph: ContractionGraph, tiebreaks: Vec<u64>) -> Self {
        let vertices = (0..graph.vertex_count()).map(|i| ContractionVertex::new(NodeIndex::new(i))).collect();
        Self { graph, vertices, tiebreaks, next_index: 0 }
    }

    /// Arcs between `v` and its uncontracted neighbours, split into incoming and outgoing.
    fn live_arcs(&self, v: VertexId) -> (Vec<LiveArc>, Vec<LiveArc>) {
        let incoming = self
            .graph
            .incoming(v)
            .iter()
            .map(|&id| (id, self.graph.arc(id)))
            .filter(|(_, arc)| !self.vertices[arc.source].contracted)
            .map(|(id, arc)| (id, arc.source, arc.weight))
            .collect();
        let outgoing = self
            .graph
            .outgoing(v)
            .iter()
            .map(|&id| (id, self.graph.arc(id)))
            .filter(|(_, arc)| !self.vertices[arc.target].contracted)
            .map(|(id, arc)| (id, arc.target, arc.weight))
            .collect();
        (incoming, outgoing)
    }

    /// Simulates contracting `v`: its current priority and the shortcuts it would need.
    fn evaluate(&self, v: VertexId, witness: &mut WitnessSearch) -> (VertexPriority, Vec<PlannedShortcut>) {
        let (incoming, outgoing) = self.live_arcs(v);
        let shortcuts = self.plan_shortcuts(v, &incoming, &outgoing, witness);
        let priority = VertexPriority::new(
            shortcuts.len(),
            incoming.len() + outgoing.len(),
            self.vertices[v].neighbors_contracted,
            self.tiebreaks[v],
        );
        (priority, shortcuts)
    }

    /// Witness-searches every pair `u -> v -> w` and keeps the pairs with no shorter detour.
    fn plan_shortcuts(
        &self,
        v: VertexId,
        incoming: &[LiveArc],
        outgoing: &[LiveArc],
        witness: &mut WitnessSearch,
    ) -> Vec<PlannedShortcut> {
        let Some(max_out) = outgoing.iter().map(|&(_, _, w)| w).max_by(f64::total_cmp) else {
            return Vec::new();
        };

        let mut shortcuts = Vec::new();
        for &(first, u, w_in) in incoming {
            let targets = outgoing.iter().map(|&(_, w, _)| w).filter(|&w| w != u).collect_vec();
            if targets.is_empty() {
                continue;
            }
            witness.run(&self.graph, &self.vertices, u, v, &targets, w_in + max_out);
            shortcuts.extend(outgoing.iter().filter(|&&(_, w, _)| w != u).filter_map(|&(second, w, w_out)| {
                let weight = w_in + w_out;
                (witness.distance(w) > weight).then_some(PlannedShortcut { source: u, target: w, weight, first, second })
            }));
        }
        shortcuts
    }

    /// The lazy contraction loop: pops the cheapest vertex, re-evaluates it, and contracts it
    /// only if it is still no worse than the new queue minimum.
    #[instrument(skip_all, fields(vertices = self.vertices.len()))]
    fn contract_lazily(&mut self, queue: &mut dyn AddressableHeap<VertexPriority>, heap: HeapKind) {
        let mut witness = WitnessSearch::new(heap);
        let mut requeued = 0_usize;
        while let Some((v, _)) = queue.pop_min() {
            let (priority, shortcuts) = self.evaluate(v, &mut witness);
            if queue.peek_min().map_or(true, |(_, next)| priority.key() <= next.key()) {
                self.contract(v, &shortcuts);
            } else {
                debug!(vertex = v, edge_difference = priority.edge_difference, "stale priority, vertex re-queued");
                requeued += 1;
                queue.push(v, priority);
            }
        }
        debug!(requeued, "lazy priority updates");
    }

    /// Contracts the vertices exactly in `order`.
    #[instrument(skip_all, fields(vertices = order.len()))]
    fn contract_in_order(&mut self, order: &[NodeIndex], heap: HeapKind) {
        let mut witness = WitnessSearch::new(heap);
        for v in order {
            let (_, shortcuts) = self.evaluate(v.index(), &mut witness);
            self.contract(v.index(), &shortcuts);
        }
    }

    /// Removes `v` from the remaining graph, inserting `shortcuts`.
    fn contract(&mut self, v: VertexId, shortcuts: &[PlannedShortcut]) {
        let neighbors = self
            .graph
            .incoming(v)
            .iter()
            .map(|&id| self.graph.arc(id).source)
            .chain(self.graph.outgoing(v).iter().map(|&id| self.graph.arc(id).target))
            .filter(|&x| !self.vertices[x].contracted)
            .unique()
            .collect_vec();

        for s in shortcuts {
            let kind = ArcKind::Shortcut { first: s.first, second: s.second };
            let id = self.graph.insert_min(s.source, s.target, s.weight, kind);
            debug!(arc = id, source = s.source, target = s.target, via = v, weight = s.weight, "shortcut inserted");
        }
        for x in neighbors {
            self.vertices[x].neighbors_contracted += 1;
        }

        let vertex = &mut self.vertices[v];
        vertex.contraction_index = Some(self.next_index);
        vertex.contracted = true;
        self.next_index += 1;
    }

    /// Priorities of all vertices before anything is contracted, computed range-parallel.
    #[instrument(skip_all, fields(vertices = self.vertices.len(), threads = pool.current_num_threads()))]
    fn initial_priorities(&self, pool: &ThreadPool, heap: HeapKind) -> RoutingResult<Vec<VertexPriority>> {
        let ranges = vertex_ranges(self.vertices.len(), pool.current_num_threads());
        let chunks = run_phase(pool, "initial priorities", || {
            ranges
                .par_iter()
                .map(|range| {
                    let mut witness = WitnessSearch::new(heap);
                    range.clone().map(|v| self.evaluate(v, &mut witness).0).collect_vec()
                })
                .collect::<Vec<_>>()
        })?;
        Ok(chunks.concat())
    }

    /// Marks upward arcs and builds the search adjacency, both range-parallel.
    #[instrument(skip_all, fields(arcs = self.graph.arc_count(), threads = pool.current_num_threads()))]
    fn finish(mut self, pool: &ThreadPool, heap: HeapKind, parallelism: usize) -> RoutingResult<ContractionHierarchy> {
        let threads = pool.current_num_threads();
        let ranks = self.vertices.iter().map(ContractionVertex::rank).collect_vec();

        let chunk = self.graph.arc_count().div_ceil(threads).max(1);
        let arcs = self.graph.arcs_mut();
        run_phase(pool, "upward marking", || {
            arcs.par_chunks_mut(chunk).for_each(|arcs| {
                for arc in arcs {
                    arc.is_upward = ranks[arc.source] < ranks[arc.target];
                }
            });
        })?;

        let graph = &self.graph;
        let ranges = vertex_ranges(graph.vertex_count(), threads);
        let adjacency = run_phase(pool, "search adjacency", || {
            ranges
                .par_iter()
                .map(|range| {
                    range
                        .clone()
                        .map(|v| {
                            let up = graph.outgoing(v).iter().copied().filter(|&id| graph.arc(id).is_upward);
                            let down = graph.incoming(v).iter().copied().filter(|&id| !graph.arc(id).is_upward);
                            (up.collect_vec(), down.collect_vec())
                        })
                        .collect_vec()
                })
                .collect::<Vec<_>>()
        })?;
        let (upward_out, downward_in): (Vec<_>, Vec<_>) = adjacency.into_iter().flatten().unzip();
        self.graph.set_search_adjacency(upward_out, downward_in);

        info!(
            vertices = self.graph.vertex_count(),
            arcs = self.graph.arc_count(),
            shortcuts = self.graph.shortcut_count(),
            "contraction hierarchy built"
        );
        Ok(ContractionHierarchy {
            graph: self.graph,
            mapping: ContractionMapping::new(self.vertices),
            heap,
            parallelism,
        })
    }
}

/// Splits `0..n` into at most `parts` contiguous ranges.
fn vertex_ranges(n: usize, parts: usize) -> Vec<Range<usize>> {
    let chunk = n.div_ceil(parts.max(1)).max(1);
    (0..n).step_by(chunk).map(|start| start..(start + chunk).min(n)).collect()
}
