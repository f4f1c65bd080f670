//! Locally adaptive Gaussian affinities and transition matrices.
//!
//! Each row gets its own bandwidth, the distance to its ⌊k/3⌋-th nearest
//! neighbor (rank 0 being the row itself), so dense regions get narrow
//! kernels and sparse regions wide ones. For an edge `i → j` at distance `d`:
//!
//! ```text
//! affinity(i, j) = exp(-d²/(2σᵢ²) - d²/(2σⱼ²))
//! ```

use pal_common::{Embedding, Result};

use crate::graph::{nearest_neighbors, CsrMatrix, NeighborTable};
use crate::parallel::Parallelism;

/// Neighbor rank whose distance sets a row's bandwidth.
///
/// Never rank 0, which would be the row's distance to itself.
pub fn adaptive_rank(k: usize) -> usize {
    (k / 3).max(1).min(k.saturating_sub(1))
}

/// Per-row adaptive bandwidths.
pub fn adaptive_bandwidths(table: &NeighborTable) -> Vec<f64> {
    let rank = adaptive_rank(table.k());
    (0..table.n_rows())
        .map(|i| table.distance_at(i, rank))
        .collect()
}

/// Directed affinity matrix over the kNN edges of `table`.
///
/// Zero-distance entries (the row itself and exact duplicates) carry no edge.
pub fn affinity_matrix(table: &NeighborTable) -> Result<CsrMatrix> {
    let sigma = adaptive_bandwidths(table);
    let n = table.n_rows();
    let mut triplets = Vec::with_capacity(n * table.k());
    for i in 0..n {
        let (idx, dist) = table.neighbors(i);
        for (&j, &d) in idx.iter().zip(dist) {
            if d == 0.0 {
                continue;
            }
            let d2 = d * d;
            let a = (-0.5 * d2 / (sigma[i] * sigma[i]) - 0.5 * d2 / (sigma[j] * sigma[j])).exp();
            triplets.push((i, j, a));
        }
    }
    CsrMatrix::from_triplets(n, n, triplets)
}

/// Row-normalize an affinity matrix into a right-stochastic transition matrix.
///
/// Fails with `DegenerateChain` on any row with no positive affinity.
pub fn normalize_transition_matrix(affinity: &CsrMatrix) -> Result<CsrMatrix> {
    affinity.normalize_rows()
}

/// kNN → adaptive affinity → transition matrix over the rows of `points`.
pub fn transition_matrix(points: &Embedding, k: usize, par: &Parallelism) -> Result<CsrMatrix> {
    let table = nearest_neighbors(points, k, par)?;
    let affinity = affinity_matrix(&table)?;
    normalize_transition_matrix(&affinity).map_err(|e| e.with_state_labels(points.cells()))
}
