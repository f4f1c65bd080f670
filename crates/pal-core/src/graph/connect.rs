//! Connectivity repair for kNN graphs.
//!
//! A kNN graph over well-separated clusters can leave cells unreachable from
//! the start cell. Repair bridges the gap one edge at a time: the farthest
//! reachable cell is linked to its nearest unreachable cell, and reachability
//! is recomputed until every cell is reached.

use pal_common::{Embedding, Result};
use pal_math::euclidean;

use super::shortest_path::dijkstra;
use super::sparse::CsrMatrix;
use crate::logging::event_names;

/// An undirected graph whose every node is reachable from `start`.
#[derive(Debug, Clone)]
pub struct RepairedGraph {
    pub graph: CsrMatrix,
    /// Distances from the start node after repair.
    pub start_distances: Vec<f64>,
    /// Bridging edges that had to be added.
    pub repaired_edges: usize,
}

/// Bridge disconnected parts of the undirected `graph` until all nodes are
/// reachable from `start`.
///
/// `graph` must already be symmetric. Each bridge is added in both
/// directions with the Euclidean distance between its endpoints in `points`.
/// A warning is logged the first time unreachable nodes are found.
pub fn connect_graph(graph: CsrMatrix, points: &Embedding, start: usize) -> Result<RepairedGraph> {
    let mut graph = graph;
    let mut dist = dijkstra(&graph, start);
    let mut repaired = 0usize;

    loop {
        let unreachable: Vec<usize> = (0..dist.len()).filter(|&i| dist[i].is_infinite()).collect();
        if unreachable.is_empty() {
            break;
        }
        if repaired == 0 {
            tracing::warn!(
                event = event_names::GRAPH_DISCONNECTED,
                unreachable = unreachable.len(),
                nodes = dist.len(),
                "kNN graph is disconnected; bridging unreachable cells to the farthest reachable cell"
            );
        }

        // First maximum among reachable nodes.
        let mut farthest = start;
        for (i, &d) in dist.iter().enumerate() {
            if d.is_finite() && d > dist[farthest] {
                farthest = i;
            }
        }
        // First minimum among unreachable nodes.
        let origin = points.row(farthest);
        let mut target = unreachable[0];
        let mut best = euclidean(origin, points.row(target));
        for &j in &unreachable[1..] {
            let d = euclidean(origin, points.row(j));
            if d < best {
                best = d;
                target = j;
            }
        }

        // Coincident points would make a zero weight, which CSR cannot store.
        let weight = best.max(f64::MIN_POSITIVE);
        graph = graph.with_entries(&[(farthest, target, weight), (target, farthest, weight)])?;
        repaired += 1;
        tracing::debug!(farthest, target, weight, "bridged disconnected component");
        dist = dijkstra(&graph, start);
    }

    if repaired > 0 {
        tracing::info!(
            event = event_names::GRAPH_REPAIRED,
            repaired_edges = repaired,
            "kNN graph connected"
        );
    }
    Ok(RepairedGraph {
        graph,
        start_distances: dist,
        repaired_edges: repaired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::CellId;

    fn two_clusters() -> Embedding {
        let cells = (0..6).map(|i| CellId::new(format!("c{i}"))).collect();
        let rows = vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![10.0],
            vec![11.0],
            vec![12.0],
        ];
        Embedding::from_rows(cells, rows).unwrap()
    }

    fn chain(edges: &[(usize, usize)]) -> CsrMatrix {
        let triplets = edges.iter().map(|&(a, b)| (a, b, (b as f64 - a as f64).abs()));
        CsrMatrix::from_triplets(6, 6, triplets).unwrap().symmetrize_min()
    }

    #[test]
    fn connected_graph_is_untouched() {
        let g = chain(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        let out = connect_graph(g.clone(), &two_clusters(), 0).unwrap();
        assert_eq!(out.repaired_edges, 0);
        assert_eq!(out.graph, g);
    }

    #[test]
    fn bridges_farthest_reachable_to_nearest_unreachable() {
        let g = chain(&[(0, 1), (1, 2), (3, 4), (4, 5)]);
        let out = connect_graph(g, &two_clusters(), 0).unwrap();
        assert_eq!(out.repaired_edges, 1);
        assert_eq!(out.graph.get(2, 3), 8.0);
        assert_eq!(out.graph.get(3, 2), 8.0);
        assert!(out.start_distances.iter().all(|d| d.is_finite()));
        assert_eq!(out.start_distances[5], 2.0 + 8.0 + 2.0);
    }

    #[test]
    fn isolated_nodes_each_get_a_bridge() {
        let g = chain(&[(0, 1)]);
        let out = connect_graph(g, &two_clusters(), 0).unwrap();
        assert_eq!(out.repaired_edges, 4);
        assert!(out.start_distances.iter().all(|d| d.is_finite()));
    }
}
