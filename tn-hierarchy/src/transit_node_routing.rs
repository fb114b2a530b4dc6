//! Transit node routing on top of a contraction hierarchy.
//!
//! A small set of important vertices, the transit nodes, is taken from the top of the
//! contraction order. Precomputation stores:
//!
//! 1. the full distance table between all transit nodes (via the many-to-many bucket search);
//! 2. for every vertex, its forward and backward access vertices: the transit nodes through
//!    which its long-distance shortest paths enter or leave the transit network;
//! 3. a Voronoi partition by nearest transit node and, per vertex, the cells its local searches
//!    touch. This is the locality filter.
//!
//! A global query is then a minimum over `|access(s)| x |access(t)|` table lookups. Queries the
//! locality filter flags as local fall back to the hierarchy's bidirectional search.

mod access;
/// Local query detection
mod locality;
/// Transit node selection and per-vertex precomputation
mod precomputation;
/// Query engine
mod query;
/// Nearest-transit-node partition
mod voronoi;

pub use access::AccessVertex;
pub use locality::{
    LocalityFilter,
    NO_CELL,
};
pub use precomputation::{
    TransitNodeRouting,
    TransitNodeRoutingPrecomputation,
};
pub use query::TransitNodeRoutingQuery;
pub use voronoi::VoronoiDiagram;
