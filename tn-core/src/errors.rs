//! Error taxonomy shared by every precomputation and query component.
//!
//! Structural problems (unknown vertices, bad configuration, negative weights) fail fast at the
//! boundary of the component that detects them. Unreachability is not an error: it is reported as
//! `None` paths and infinite weights.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Errors surfaced by hierarchy construction, many-to-many tables and transit node routing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    /// A source, target or transit vertex is not present in the graph.
    #[error("vertex {0} is not present in the graph")]
    UnknownVertex(usize),

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An edge carries a negative (or NaN) weight, which breaks Dijkstra-style relaxation.
    #[error("edge {edge} has negative weight {weight}")]
    NegativeWeight {
        /// Index of the offending edge in the input graph.
        edge: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// A parallel precomputation worker panicked; the whole phase was aborted.
    #[error("worker failed during {phase}: {reason}")]
    WorkerFailed {
        /// Name of the precomputation phase.
        phase: &'static str,
        /// Panic payload, if it was a string.
        reason: String,
    },
}

impl RoutingError {
    /// Shorthand for [`RoutingError::InvalidConfiguration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
