//! Contraction order heuristic.

use std::cmp::Ordering;

/// Priority of a vertex in the contraction queue. Lower values are contracted first.
///
/// Ordered by edge difference, then by the number of already-contracted neighbours (spreading
/// contractions evenly over the graph), then by a random tiebreak so that the order is
/// deterministic for a fixed seed but not biased by vertex numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexPriority {
    /// Shortcuts added minus live incident arcs removed.
    pub edge_difference: i64,
    /// Neighbours contracted so far.
    pub neighbors_contracted: usize,
    /// Random tiebreak drawn per vertex.
    pub tiebreak: u64,
}

impl VertexPriority {
    /// Builds the priority of a vertex whose contraction would add `shortcuts` arcs and remove
    /// `removed` live arcs.
    #[must_use]
    pub fn new(shortcuts: usize, removed: usize, neighbors_contracted: usize, tiebreak: u64) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        let edge_difference = shortcuts as i64 - removed as i64;
        Self { edge_difference, neighbors_contracted, tiebreak }
    }

    /// The part of the priority that depends on the graph, without the tiebreak.
    #[must_use]
    pub const fn key(&self) -> (i64, usize) {
        (self.edge_difference, self.neighbors_contracted)
    }
}

impl Ord for VertexPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key()).then(self.tiebreak.cmp(&other.tiebreak))
    }
}

impl PartialOrd for VertexPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
