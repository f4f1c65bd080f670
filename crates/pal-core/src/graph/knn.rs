//! Exact k-nearest-neighbor queries.
//!
//! Brute force over all rows with a bounded max-heap per query. Each query
//! row is independent, so rows are processed on the worker pool and merged
//! by index.

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::collections::BinaryHeap;

use pal_common::{Embedding, Error, Result};
use pal_math::squared_euclidean;

use super::sparse::CsrMatrix;
use crate::parallel::Parallelism;

/// The `k` nearest rows of every row, the row itself included.
///
/// Neighbors are sorted by ascending distance, ties broken by row index.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    k: usize,
    indices: Vec<usize>,
    distances: Vec<f64>,
}

impl NeighborTable {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_rows(&self) -> usize {
        self.indices.len() / self.k
    }

    /// Neighbor indices and distances of row `i`.
    pub fn neighbors(&self, i: usize) -> (&[usize], &[f64]) {
        let span = i * self.k..(i + 1) * self.k;
        (&self.indices[span.clone()], &self.distances[span])
    }

    /// Distance from row `i` to its neighbor at rank `rank` (0 is the row itself).
    pub fn distance_at(&self, i: usize, rank: usize) -> f64 {
        self.distances[i * self.k + rank]
    }

    /// Directed distance graph: row `i` links to each of its neighbors other
    /// than itself, weighted by Euclidean distance.
    ///
    /// Exact duplicates of a row sit at distance zero and cannot be stored
    /// in a sparse matrix, so they contribute no edge.
    pub fn distance_graph(&self) -> Result<CsrMatrix> {
        let n = self.n_rows();
        let triplets = (0..n).flat_map(|i| {
            let (idx, dist) = self.neighbors(i);
            idx.iter()
                .zip(dist)
                .filter(move |(&j, _)| j != i)
                .map(move |(&j, &d)| (i, j, d))
                .collect::<Vec<_>>()
        });
        CsrMatrix::from_triplets(n, n, triplets)
    }
}

/// Find the `k` nearest rows (self included) of every row of `points`.
pub fn nearest_neighbors(points: &Embedding, k: usize, par: &Parallelism) -> Result<NeighborTable> {
    let n = points.n_cells();
    if k == 0 || k > n {
        return Err(Error::invalid_parameter(
            "knn",
            format!("must be between 1 and the number of rows ({n}), got {k}"),
        ));
    }

    let rows: Vec<Vec<(usize, f64)>> = par.install(|| {
        (0..n)
            .into_par_iter()
            .map(|i| query_row(points, i, k))
            .collect()
    });

    let mut indices = Vec::with_capacity(n * k);
    let mut distances = Vec::with_capacity(n * k);
    for row in rows {
        for (j, d) in row {
            indices.push(j);
            distances.push(d);
        }
    }
    Ok(NeighborTable {
        k,
        indices,
        distances,
    })
}

fn query_row(points: &Embedding, i: usize, k: usize) -> Vec<(usize, f64)> {
    let origin = points.row(i);
    // Max-heap on (distance, index): the top is the current worst neighbor.
    let mut heap: BinaryHeap<(OrderedFloat<f64>, usize)> = BinaryHeap::with_capacity(k + 1);
    for j in 0..points.n_cells() {
        let d = OrderedFloat(squared_euclidean(origin, points.row(j)));
        if heap.len() < k {
            heap.push((d, j));
        } else if let Some(&top) = heap.peek() {
            if (d, j) < top {
                heap.pop();
                heap.push((d, j));
            }
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|(d, j)| (j, d.into_inner().sqrt()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::CellId;

    fn line(n: usize) -> Embedding {
        let cells = (0..n).map(|i| CellId::new(format!("c{i}"))).collect();
        let rows = (0..n).map(|i| vec![i as f64]).collect();
        Embedding::from_rows(cells, rows).unwrap()
    }

    #[test]
    fn neighbors_include_self_first() {
        let par = Parallelism::sequential().unwrap();
        let table = nearest_neighbors(&line(6), 3, &par).unwrap();
        let (idx, dist) = table.neighbors(0);
        assert_eq!(idx, &[0, 1, 2]);
        assert_eq!(dist, &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn ties_break_by_index() {
        let par = Parallelism::sequential().unwrap();
        let table = nearest_neighbors(&line(5), 3, &par).unwrap();
        // Row 2 has equidistant neighbors 1 and 3.
        assert_eq!(table.neighbors(2).0, &[2, 1, 3]);
        assert_eq!(table.distance_at(2, 2), 1.0);
    }

    #[test]
    fn rejects_k_larger_than_rows() {
        let par = Parallelism::sequential().unwrap();
        assert!(nearest_neighbors(&line(3), 4, &par).is_err());
        assert!(nearest_neighbors(&line(3), 0, &par).is_err());
    }

    #[test]
    fn distance_graph_skips_self() {
        let par = Parallelism::sequential().unwrap();
        let g = nearest_neighbors(&line(4), 2, &par)
            .unwrap()
            .distance_graph()
            .unwrap();
        assert_eq!(g.nnz(), 4);
        assert_eq!(g.get(0, 0), 0.0);
        assert_eq!(g.get(0, 1), 1.0);
        assert_eq!(g.get(3, 2), 1.0);
    }

    #[test]
    fn worker_count_does_not_change_result() {
        let points = line(40);
        let a = nearest_neighbors(&points, 5, &Parallelism::sequential().unwrap()).unwrap();
        let b = nearest_neighbors(&points, 5, &Parallelism::from_n_jobs(4).unwrap()).unwrap();
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.distances, b.distances);
    }
}
