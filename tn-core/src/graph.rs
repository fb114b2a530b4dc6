//! The weighted graph abstraction consumed by the engine.
//!
//! Input graphs are plain [`petgraph::Graph`]s, directed or undirected. The only thing the engine
//! needs from an edge payload is a non-negative cost, provided through [`EdgeCost`].

use ordered_float::OrderedFloat;
use petgraph::graph::{
    EdgeIndex,
    Graph,
    NodeIndex,
};
use petgraph::EdgeType;

use crate::errors::{
    RoutingError,
    RoutingResult,
};

/// Totally ordered weight used as a priority-queue key.
pub type Weight = OrderedFloat<f64>;

/// Tolerance used when comparing accumulated path weights.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Trait for edge payloads that carry a traversal cost.
///
/// Costs of a path are combined by summing. Every component assumes costs are non-negative;
/// [`checked_cost`] is used wherever the assumption is enforced.
pub trait EdgeCost {
    /// Returns the cost of traversing this edge.
    fn cost(&self) -> f64;
}

macro_rules! impl_edge_cost {
    ($($t:ty),*) => {
        $(
            impl EdgeCost for $t {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn cost(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

impl_edge_cost!(f64, f32, u32, u64, usize, i32, i64);

impl EdgeCost for OrderedFloat<f64> {
    fn cost(&self) -> f64 {
        self.into_inner()
    }
}

/// Returns the cost of `edge`, rejecting negative and NaN costs.
pub fn checked_cost<E: EdgeCost>(edge: EdgeIndex, payload: &E) -> RoutingResult<f64> {
    let weight = payload.cost();
    if weight >= 0.0 {
        Ok(weight)
    } else {
        Err(RoutingError::NegativeWeight { edge: edge.index(), weight })
    }
}

/// Fails with [`RoutingError::UnknownVertex`] unless `v` is a vertex of `graph`.
pub fn ensure_vertex<N, E, Ty: EdgeType>(graph: &Graph<N, E, Ty>, v: NodeIndex) -> RoutingResult<()> {
    if v.index() < graph.node_count() {
        Ok(())
    } else {
        Err(RoutingError::UnknownVertex(v.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_cost_rejects_negative() {
        assert_eq!(checked_cost(EdgeIndex::new(3), &2.5f64), Ok(2.5));
        assert_eq!(
            checked_cost(EdgeIndex::new(3), &-1i64),
            Err(RoutingError::NegativeWeight { edge: 3, weight: -1.0 })
        );
        assert!(checked_cost(EdgeIndex::new(0), &f64::NAN).is_err());
    }

    #[test]
    fn test_ensure_vertex() {
        let mut graph = Graph::<(), f64>::new();
        let a = graph.add_node(());
        assert!(ensure_vertex(&graph, a).is_ok());
        assert_eq!(ensure_vertex(&graph, NodeIndex::new(1)), Err(RoutingError::UnknownVertex(1)));
    }
}
