use ordered_float::OrderedFloat;
use petgraph::graph::NodeIndex;
use tn_core::{
    HeapKind,
    Weight,
};
use tracing::instrument;

use crate::contraction_hierarchies::{
    ContractionGraph,
    VertexId,
};

/// Partition of the vertices by their nearest transit node.
///
/// "Nearest" is measured along the direction of travel: a vertex belongs to the transit node it
/// can reach most cheaply. Vertices that reach no transit node belong to no cell.
#[derive(Clone, Debug, Default)]
pub struct VoronoiDiagram {
    /// Cell centre of each vertex.
    cells: Vec<Option<VertexId>>,
    /// Distance from each vertex to its centre.
    distances: Vec<f64>,
}

impl VoronoiDiagram {
    /// Multi-source Dijkstra from all `centers` at once, against the arc direction.
    #[instrument(skip_all, fields(centers = centers.len()))]
    pub(crate) fn compute(graph: &ContractionGraph, centers: &[VertexId], heap: HeapKind) -> Self {
        let n = graph.vertex_count();
        let mut cells = vec![None; n];
        let mut distances = vec![f64::INFINITY; n];
        let mut queue = heap.build::<Weight>();
        for &c in centers {
            cells[c] = Some(c);
            distances[c] = 0.0;
            queue.push(c, OrderedFloat(0.0));
        }

        while let Some((v, OrderedFloat(dist))) = queue.pop_min() {
            for &id in graph.incoming(v) {
                let arc = graph.arc(id);
                let candidate = dist + arc.weight;
                if candidate < distances[arc.source] {
                    distances[arc.source] = candidate;
                    cells[arc.source] = cells[v];
                    queue.push(arc.source, OrderedFloat(candidate));
                }
            }
        }
        Self { cells, distances }
    }

    /// Transit node whose cell contains `v`.
    #[must_use]
    pub fn cell(&self, v: NodeIndex) -> Option<NodeIndex> {
        self.cells.get(v.index()).copied().flatten().map(NodeIndex::new)
    }

    /// Distance from `v` to the centre of its cell, infinite outside every cell.
    #[must_use]
    pub fn distance(&self, v: NodeIndex) -> f64 {
        self.distances.get(v.index()).copied().unwrap_or(f64::INFINITY)
    }

    /// Cell centre by arena handle.
    pub(crate) fn cell_of(&self, v: VertexId) -> Option<VertexId> {
        self.cells[v]
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::DiGraph;
    use tn_core::testutils::n;

    use super::*;
    use crate::contraction_hierarchies::ContractionHierarchyBuilder;

    #[test]
    fn test_cells_follow_travel_direction() {
        // 0 -> 1 -> 2 <- 3, with 4 isolated; centres 1 and 3
        let mut graph = DiGraph::<(), f64>::from_edges([(0, 1, 1.0), (1, 2, 1.0), (3, 2, 1.0), (0, 3, 5.0)]);
        graph.add_node(());
        let hierarchy = ContractionHierarchyBuilder::default().build(&graph).unwrap();
        let voronoi = VoronoiDiagram::compute(&hierarchy.graph, &[1, 3], HeapKind::Pairing);

        assert_eq!(voronoi.cell(n(0)), Some(n(1)));
        assert_eq!(voronoi.distance(n(0)), 1.0);
        assert_eq!(voronoi.cell(n(3)), Some(n(3)));
        assert_eq!(voronoi.cell(n(2)), None);
        assert_eq!(voronoi.cell(n(4)), None);
        assert_eq!(voronoi.distance(n(4)), f64::INFINITY);
    }
}
