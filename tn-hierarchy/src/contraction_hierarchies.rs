//! Contraction Hierarchies speed up shortest path queries on weighted graphs, conventionally road
//! networks.
//!
//! Contraction Hierarchies traditionally has two stages:
//! 1. Preprocessing:
//!     * Pick the next vertex to contract with a heuristic ([`VertexPriority`]: edge difference,
//!       then contracted neighbours, then a seeded random tiebreak) or take it from a precomputed
//!       order.
//!     * Remove the vertex from the remaining graph, adding a shortcut `u -> w` for every pair of
//!       neighbours whose shortest path ran through it. A bounded witness search decides which
//!       pairs still have a detour of equal or smaller weight.
//! 2. Querying:
//!     * The hierarchy is the input graph augmented with all shortcuts. Every shortest path has a
//!       variant that first climbs in contraction order and then descends, so a bidirectional
//!       Dijkstra that only relaxes upward arcs from both ends finds it.
//!     * Shortcuts on the result are unpacked recursively into input-graph edges.
//!
//! The upward searches in [`search`] are shared with the many-to-many and transit node routing
//! modules.

/// Hierarchy construction
mod ch;
/// Arc arena and vertex mapping
mod graph;
/// Contraction order heuristic
mod priority;
/// Bidirectional point-to-point queries
mod query;
pub mod search;
/// Witness searches during contraction
mod witness;

pub use ch::ContractionHierarchyBuilder;
pub use graph::{
    ArcId,
    ArcKind,
    ContractionEdge,
    ContractionGraph,
    ContractionHierarchy,
    ContractionMapping,
    ContractionVertex,
    VertexId,
};
pub use priority::VertexPriority;
pub use query::BidirectionalQuery;
pub use search::{
    Direction,
    Label,
    SearchFrontier,
    SearchTree,
};
pub use witness::WitnessSearch;
