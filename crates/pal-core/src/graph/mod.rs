//! Sparse graph machinery: CSR storage, kNN queries, shortest paths,
//! connectivity repair, and connected components.

pub mod components;
pub mod connect;
pub mod knn;
pub mod shortest_path;
pub mod sparse;

pub use components::connected_components;
pub use connect::{connect_graph, RepairedGraph};
pub use knn::{nearest_neighbors, NeighborTable};
pub use shortest_path::{dijkstra, multi_source};
pub use sparse::CsrMatrix;

use pal_common::{Embedding, Result};

use crate::logging::event_names;
use crate::parallel::Parallelism;

/// Undirected kNN distance graph over `points`, repaired so that every row
/// is reachable from `start`.
pub fn build_connected_graph(
    points: &Embedding,
    k: usize,
    start: usize,
    par: &Parallelism,
) -> Result<RepairedGraph> {
    let table = nearest_neighbors(points, k, par)?;
    let graph = table.distance_graph()?.symmetrize_min();
    tracing::debug!(
        event = event_names::GRAPH_BUILT,
        nodes = graph.nrows(),
        edges = graph.nnz(),
        k,
        "built kNN distance graph"
    );
    connect_graph(graph, points, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::CellId;

    #[test]
    fn separated_clusters_end_up_connected() {
        let cells = (0..8).map(|i| CellId::new(format!("c{i}"))).collect();
        let rows = (0..8)
            .map(|i| vec![if i < 4 { i as f64 } else { 100.0 + i as f64 }])
            .collect();
        let points = Embedding::from_rows(cells, rows).unwrap();
        let par = Parallelism::sequential().unwrap();
        let out = build_connected_graph(&points, 3, 0, &par).unwrap();
        assert!(out.repaired_edges >= 1);
        assert!(out.start_distances.iter().all(|d| d.is_finite()));
    }
}
