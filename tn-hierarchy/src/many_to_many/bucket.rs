//! Bucket-based many-to-many search on a contraction hierarchy.
//!
//! Every source grows one forward upward search tree and every target one backward upward search
//! tree. The trees of the larger side are scattered into per-vertex buckets of
//! `(tree, distance)` entries; each tree of the smaller side then scans its own labels against
//! the buckets. The shortest `s -> t` distance is the minimum of `d(s, v) + d(v, t)` over all
//! vertices `v` in both search spaces, so `|S| + |T|` searches cover the whole table.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use tn_core::RoutingResult;
use tracing::{
    debug,
    instrument,
};

use super::table::{
    ManyToManyTable,
    TablePaths,
};
use crate::contraction_hierarchies::{
    ContractionHierarchy,
    Direction,
    SearchTree,
    VertexId,
};
use crate::workers::catch_worker_panic;

/// Best meeting found for one table cell.
type Cell = (f64, Option<VertexId>);

/// Computes the table with the bucket algorithm on the current rayon pool.
///
/// Vertices must already be known to lie in the hierarchy.
#[instrument(level = "debug", skip_all, fields(sources = sources.len(), targets = targets.len()))]
pub(crate) fn bucket_table<'a>(
    hierarchy: &'a ContractionHierarchy,
    sources: &[NodeIndex],
    targets: &[NodeIndex],
) -> RoutingResult<ManyToManyTable<'a>> {
    let graph = &hierarchy.graph;
    let heap = hierarchy.heap;
    let grow = |roots: &[NodeIndex], direction: Direction| {
        roots.par_iter().map(|v| SearchTree::explore(graph, v.index(), direction, heap, |_| true)).collect::<Vec<_>>()
    };
    let (forward, backward) = catch_worker_panic("upward searches", || {
        rayon::join(|| grow(sources, Direction::Forward), || grow(targets, Direction::Backward))
    })?;

    // the smaller side is searched last, against buckets filled by the larger side
    let scan_sources = sources.len() <= targets.len();
    let (bucket_trees, scan_trees) = if scan_sources { (&backward, &forward) } else { (&forward, &backward) };

    let mut buckets: HashMap<VertexId, Vec<(usize, f64)>> = HashMap::new();
    for (i, tree) in bucket_trees.iter().enumerate() {
        for (v, dist) in tree.labels() {
            buckets.entry(v).or_default().push((i, dist));
        }
    }
    debug!(buckets = buckets.len(), scanned = scan_trees.len(), "buckets filled");

    let scanned: Vec<Vec<Cell>> = catch_worker_panic("bucket scans", || {
        scan_trees
            .par_iter()
            .map(|tree| {
                let mut best = vec![(f64::INFINITY, None); bucket_trees.len()];
                for (v, dist) in tree.labels() {
                    for &(i, other) in buckets.get(&v).into_iter().flatten() {
                        if dist + other < best[i].0 {
                            best[i] = (dist + other, Some(v));
                        }
                    }
                }
                best
            })
            .collect()
    })?;

    let cells = if scan_sources {
        scanned.into_iter().flatten().collect_vec()
    } else {
        // scanned rows are target columns; transpose to row-major
        (0..sources.len()).flat_map(|i| scanned.iter().map(move |column| column[i])).collect_vec()
    };
    let (weights, middles) = cells.into_iter().unzip();

    Ok(ManyToManyTable::new(
        sources.to_vec(),
        targets.to_vec(),
        weights,
        TablePaths::Buckets { hierarchy, forward, backward, middles },
    ))
}
