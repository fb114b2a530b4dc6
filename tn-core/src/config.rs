//! Configuration for hierarchy construction and transit node routing.
//!
//! Both structs deserialize from any serde format with every field optional, and expose chained
//! setters for programmatic use:
//!
//! ```
//! use tn_core::{HeapKind, HierarchyConfig};
//!
//! let config = HierarchyConfig::default().seed(7).parallelism(2).heap(HeapKind::Binary);
//! assert_eq!(config.seed, Some(7));
//! ```

use derive_setters::Setters;
use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    RoutingError,
    RoutingResult,
};
use crate::heap::HeapKind;

/// Returns the number of hardware threads, falling back to one.
pub(crate) fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Options for contraction hierarchy construction and the searches run on top of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(strip_option)]
pub struct HierarchyConfig {
    /// Worker pool size for the parallel precomputation phases.
    pub parallelism: usize,
    /// Seed for the contraction-order tiebreaks. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Priority queue backing every search.
    pub heap: HeapKind,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self { parallelism: default_parallelism(), seed: None, heap: HeapKind::default() }
    }
}

impl HierarchyConfig {
    /// Rejects values that cannot drive a precomputation.
    pub fn validate(&self) -> RoutingResult<()> {
        if self.parallelism == 0 {
            return Err(RoutingError::config("parallelism must be at least 1"));
        }
        Ok(())
    }
}

/// Options for transit node routing precomputation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(strip_option)]
pub struct TransitConfig {
    /// Number of transit nodes. `None` picks `ceil(sqrt(|V|))`.
    pub transit_node_count: Option<usize>,
    /// Worker pool size for the transit table and access discovery. `None` reuses the
    /// parallelism the hierarchy was built with.
    pub parallelism: Option<usize>,
}

impl TransitConfig {
    /// Resolves the transit node count for a graph with `vertex_count` vertices.
    ///
    /// Graphs with at most one vertex get no transit nodes. Otherwise the count must lie in
    /// `1..vertex_count`. A zero parallelism is rejected as well.
    pub fn resolve(&self, vertex_count: usize) -> RoutingResult<usize> {
        if self.parallelism == Some(0) {
            return Err(RoutingError::config("parallelism must be at least 1"));
        }
        if vertex_count <= 1 {
            return Ok(0);
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let k = self
            .transit_node_count
            .unwrap_or_else(|| ((vertex_count as f64).sqrt().ceil() as usize).min(vertex_count - 1));

        if k == 0 {
            return Err(RoutingError::config("transit node count must be positive"));
        }
        if k >= vertex_count {
            return Err(RoutingError::config(format!(
                "transit node count {k} must be smaller than the vertex count {vertex_count}"
            )));
        }
        Ok(k)
    }
}
