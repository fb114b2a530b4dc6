use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use tn_core::{
    RoutingResult,
    ShortestPathOracle,
};
use tracing::instrument;

use super::table::{
    ManyToManyTable,
    TablePaths,
};
use crate::workers::catch_worker_panic;

/// One early-terminating search per source, run in parallel on the current rayon pool.
#[instrument(level = "debug", skip_all, fields(sources = sources.len(), targets = targets.len()))]
pub(crate) fn baseline_table<'a>(
    oracle: &dyn ShortestPathOracle,
    sources: &[NodeIndex],
    targets: &[NodeIndex],
) -> RoutingResult<ManyToManyTable<'a>> {
    let trees = catch_worker_panic("baseline searches", || {
        sources.par_iter().map(|&s| oracle.tree(s, targets)).collect::<RoutingResult<Vec<_>>>()
    })??;

    let weights = trees.iter().flat_map(|tree| targets.iter().map(|&t| tree.distance(t))).collect();
    Ok(ManyToManyTable::new(sources.to_vec(), targets.to_vec(), weights, TablePaths::Baseline(trees)))
}
