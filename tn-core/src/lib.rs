#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
)]
#![warn(missing_docs, clippy::missing_docs_in_private_items)]
#![allow(clippy::module_name_repetitions)]

//! # tn-core – primitives for hierarchical shortest-path routing
//!
//! Everything the routing engine in `tn-hierarchy` consumes but does not own:
//!
//! - [`graph`] – the [`EdgeCost`] abstraction over [`petgraph::Graph`] edge payloads.
//! - [`heap`] – [`AddressableHeap`], the decrease-key priority queue every search runs on, with a
//!   pairing heap (default) and an indexed binary heap backend.
//! - [`dijkstra`] – the baseline single-source oracle.
//! - [`path`] – the [`GraphPath`] result type.
//! - [`config`] – construction and routing options.
//! - [`errors`] – the [`RoutingError`] taxonomy.
//!
//! Enable the `testutils` feature for shared graph fixtures.

pub mod config;
pub mod dijkstra;
pub mod errors;
pub mod graph;
pub mod heap;
pub mod path;
#[cfg(feature = "testutils")]
pub mod testutils;

pub use config::{
    HierarchyConfig,
    TransitConfig,
};
pub use dijkstra::{
    dijkstra,
    DijkstraBaseline,
    ShortestPathOracle,
    ShortestPathTree,
};
pub use errors::{
    RoutingError,
    RoutingResult,
};
pub use graph::{
    checked_cost,
    ensure_vertex,
    EdgeCost,
    Weight,
    WEIGHT_EPSILON,
};
pub use heap::{
    AddressableHeap,
    HeapKind,
    PairingHeap,
};
pub use path::GraphPath;
