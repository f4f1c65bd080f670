//! Single-source shortest paths over non-negative weighted graphs.

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::sparse::CsrMatrix;
use crate::parallel::Parallelism;

/// Dijkstra distances from `source` following stored edges `i → j`.
///
/// Unreachable nodes are `f64::INFINITY`. Pass a symmetrized graph for
/// undirected distances.
pub fn dijkstra(graph: &CsrMatrix, source: usize) -> Vec<f64> {
    let n = graph.nrows();
    let mut dist = vec![f64::INFINITY; n];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(d), u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for (v, w) in graph.row_iter(u) {
            let candidate = d + w;
            if candidate < dist[v] {
                dist[v] = candidate;
                heap.push(Reverse((OrderedFloat(candidate), v)));
            }
        }
    }
    dist
}

/// Distances from each of `sources`, one row per source, computed on the pool.
///
/// The graph is shared read-only; rows come back in `sources` order.
pub fn multi_source(graph: &CsrMatrix, sources: &[usize], par: &Parallelism) -> Vec<Vec<f64>> {
    par.install(|| sources.par_iter().map(|&s| dijkstra(graph, s)).collect())
}
