#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
)]
#![warn(missing_docs, clippy::missing_docs_in_private_items)]
#![allow(clippy::module_name_repetitions)]

//! # tn-hierarchy – hierarchical shortest-path routing
//!
//! tn-hierarchy turns a weighted [`petgraph::Graph`] into structures that answer shortest-path
//! queries much faster than plain Dijkstra, at the cost of a one-off precomputation.
//!
//! ## Pipeline overview
//! 1. Contraction ([`ContractionHierarchyBuilder`]) – Order the vertices by importance and
//!    contract them one by one, inserting shortcuts so that every shortest path survives as an
//!    "up, then down" path in the resulting [`ContractionHierarchy`]. Point-to-point queries run a
//!    [`BidirectionalQuery`] on it.
//! 2. Many-to-many tables ([`ManyToManyShortestPaths`]) – Distances between a set of sources and a
//!    set of targets, computed either by independent Dijkstra runs or by the bucket algorithm on
//!    the hierarchy, returned as a [`ManyToManyTable`].
//! 3. Transit node routing ([`TransitNodeRoutingPrecomputation`]) – Pick the most important
//!    vertices as transit nodes, tabulate their pairwise distances and every vertex's access
//!    vertices, and answer long-distance queries with a handful of table lookups through
//!    [`TransitNodeRoutingQuery`].
//!
//! Every precomputation stage is annotated with [`tracing`] spans, and the parallel phases run on
//! [`rayon`] pools.
//!
//! ```
//! use petgraph::graph::{NodeIndex, UnGraph};
//! use tn_core::{HierarchyConfig, TransitConfig};
//! use tn_hierarchy::{ContractionHierarchyBuilder, TransitNodeRoutingPrecomputation};
//!
//! let graph = UnGraph::<(), f64>::from_edges([(0, 1, 1.0), (1, 2, 2.0), (2, 3, 1.0), (3, 0, 5.0)]);
//! let hierarchy = ContractionHierarchyBuilder::new(HierarchyConfig::default().seed(1)).build(&graph)?;
//! assert_eq!(hierarchy.query().weight(NodeIndex::new(0), NodeIndex::new(3))?, 4.0);
//!
//! let routing = TransitNodeRoutingPrecomputation::new(&hierarchy, TransitConfig::default()).compute()?;
//! assert_eq!(routing.query().weight(NodeIndex::new(3), NodeIndex::new(1))?, 3.0);
//! # Ok::<(), tn_core::RoutingError>(())
//! ```

pub mod contraction_hierarchies;
pub mod many_to_many;
pub mod transit_node_routing;
/// Dedicated worker pools and panic capture for parallel phases
mod workers;

pub use contraction_hierarchies::{
    BidirectionalQuery,
    ContractionHierarchy,
    ContractionHierarchyBuilder,
};
pub use many_to_many::{
    ManyToManyShortestPaths,
    ManyToManyTable,
};
pub use transit_node_routing::{
    TransitNodeRouting,
    TransitNodeRoutingPrecomputation,
    TransitNodeRoutingQuery,
};
