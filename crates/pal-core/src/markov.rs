//! Directed Markov chain over waypoints.
//!
//! Starts from the adaptive-kernel transition matrix and prunes, per source
//! waypoint, enough of the weakest backward edges (those pointing to an
//! earlier pseudotime) that the retained backward mass never exceeds the
//! forward mass. Rows are renormalized afterwards.

use pal_common::{Embedding, Error, Result};

use crate::graph::CsrMatrix;
use crate::kernel::transition_matrix;
use crate::logging::{event_names, Stage, StageTimer};
use crate::parallel::Parallelism;

const PRUNE_TOLERANCE: f64 = 1e-12;

/// Outcome of pruning a single row's backward edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneSummary {
    pub backward_edges: usize,
    pub pruned_edges: usize,
}

/// Build the forward-biased transition matrix over the rows of `wp_points`.
///
/// `wp_pseudotime[i]` is the pseudotime of row `i`.
pub fn directed_markov_chain(
    wp_points: &Embedding,
    wp_pseudotime: &[f64],
    k: usize,
    par: &Parallelism,
) -> Result<CsrMatrix> {
    if wp_pseudotime.len() != wp_points.n_cells() {
        return Err(Error::InputShapeMismatch {
            context: "waypoint pseudotime".to_string(),
            expected: wp_points.n_cells(),
            actual: wp_pseudotime.len(),
        });
    }
    let timer = StageTimer::start(Stage::MarkovChain);
    let transitions = transition_matrix(wp_points, k, par)?;
    let (pruned, summary) = prune_backward_edges(&transitions, wp_pseudotime);
    tracing::debug!(
        event = event_names::MARKOV_PRUNED,
        waypoints = wp_points.n_cells(),
        backward_edges = summary.backward_edges,
        pruned_edges = summary.pruned_edges,
        "pruned backward transitions"
    );
    let chain = pruned
        .normalize_rows()
        .map_err(|e| e.with_state_labels(wp_points.cells()))?;
    timer.finish();
    Ok(chain)
}

/// Drop backward edges of a row-stochastic `transitions` until every row's
/// retained backward mass is at most its forward mass.
///
/// An edge `i → j` is forward when `pseudotime[i] <= pseudotime[j]`. A row
/// with no forward edges keeps all of its backward edges. The result is not
/// renormalized.
pub fn prune_backward_edges(transitions: &CsrMatrix, pseudotime: &[f64]) -> (CsrMatrix, PruneSummary) {
    let mut dropped: Vec<Vec<usize>> = Vec::with_capacity(transitions.nrows());
    let mut summary = PruneSummary::default();

    for i in 0..transitions.nrows() {
        let (cols, vals) = transitions.row(i);
        let mut backward: Vec<(usize, f64)> = cols
            .iter()
            .zip(vals)
            .filter(|(&j, _)| pseudotime[i] > pseudotime[j])
            .map(|(&j, &w)| (j, w))
            .collect();
        summary.backward_edges += backward.len();

        let has_forward = backward.len() < cols.len();
        let mass: f64 = backward.iter().map(|(_, w)| w).sum();
        let excess = mass - (1.0 - mass);
        if !has_forward || excess <= 0.0 {
            dropped.push(Vec::new());
            continue;
        }

        backward.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let mut cumulative = 0.0;
        let mut cut = backward.len();
        for (p, (_, w)) in backward.iter().enumerate() {
            cumulative += w;
            if cumulative >= excess - PRUNE_TOLERANCE {
                cut = p + 1;
                break;
            }
        }
        let mut row_dropped: Vec<usize> = backward[..cut].iter().map(|(j, _)| *j).collect();
        row_dropped.sort_unstable();
        summary.pruned_edges += row_dropped.len();
        dropped.push(row_dropped);
    }

    let mut pruned = transitions.clone();
    pruned.retain(|i, j, _| dropped[i].binary_search(&j).is_err());
    (pruned, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_backward(m: &CsrMatrix, t: &[f64], i: usize) -> (f64, f64) {
        let (mut fwd, mut back) = (0.0, 0.0);
        for (j, w) in m.row_iter(i) {
            if t[i] <= t[j] {
                fwd += w;
            } else {
                back += w;
            }
        }
        (fwd, back)
    }

    #[test]
    fn excess_backward_mass_is_pruned() {
        // Row 2 sits at t = 2 with backward mass 0.1 + 0.2 + 0.4 = 0.7.
        let t = vec![0.0, 1.0, 2.0, 3.0, 1.5];
        let m = CsrMatrix::from_triplets(
            5,
            5,
            vec![(2, 0, 0.1), (2, 1, 0.2), (2, 4, 0.4), (2, 3, 0.3)],
        )
        .unwrap();
        let (pruned, summary) = prune_backward_edges(&m, &t);
        // excess = 0.4; 0.1 + 0.2 < 0.4 <= 0.1 + 0.2 + 0.4 drops all three.
        assert_eq!(summary.backward_edges, 3);
        assert_eq!(summary.pruned_edges, 3);
        assert_eq!(pruned.row(2).0, &[3]);
    }

    #[test]
    fn heavy_backward_edges_survive() {
        let t = vec![0.0, 1.0, 2.0, 3.0];
        let m = CsrMatrix::from_triplets(
            4,
            4,
            vec![(2, 0, 0.05), (2, 1, 0.55), (2, 3, 0.4)],
        )
        .unwrap();
        // B = 0.6, excess = 0.2: dropping 0.05 is not enough, 0.05 + 0.55 is.
        let (pruned, _) = prune_backward_edges(&m, &t);
        assert_eq!(pruned.row(2).0, &[3]);

        let m = CsrMatrix::from_triplets(
            4,
            4,
            vec![(2, 0, 0.15), (2, 1, 0.2), (2, 3, 0.65)],
        )
        .unwrap();
        // B = 0.35 leaves no excess, nothing pruned.
        let (pruned, summary) = prune_backward_edges(&m, &t);
        assert_eq!(summary.pruned_edges, 0);
        assert_eq!(pruned.nnz(), 3);
    }

    #[test]
    fn rows_without_forward_edges_keep_everything() {
        let t = vec![0.0, 1.0, 2.0];
        let m = CsrMatrix::from_triplets(3, 3, vec![(2, 0, 0.3), (2, 1, 0.7)]).unwrap();
        let (pruned, summary) = prune_backward_edges(&m, &t);
        assert_eq!(summary.pruned_edges, 0);
        assert_eq!(pruned.nnz(), 2);
    }

    #[test]
    fn equal_pseudotime_counts_as_forward() {
        let t = vec![1.0, 1.0];
        let m = CsrMatrix::from_triplets(2, 2, vec![(0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        let (pruned, summary) = prune_backward_edges(&m, &t);
        assert_eq!(summary.backward_edges, 0);
        assert_eq!(pruned.nnz(), 2);
    }

    #[test]
    fn chain_is_stochastic_and_forward_biased() {
        let n = 40;
        let cells = (0..n).map(|i| pal_common::CellId::new(format!("w{i}"))).collect();
        let rows = (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                vec![x, (x * 6.0).sin() * 0.1]
            })
            .collect();
        let points = Embedding::from_rows(cells, rows).unwrap();
        let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let par = Parallelism::sequential().unwrap();
        let chain = directed_markov_chain(&points, &t, 6, &par).unwrap();
        for (i, s) in chain.row_sums().into_iter().enumerate() {
            assert!((s - 1.0).abs() < 1e-12);
            let (fwd, back) = forward_backward(&chain, &t, i);
            if fwd > 0.0 {
                assert!(fwd + 1e-9 >= back, "row {i}: fwd {fwd} < back {back}");
            }
        }
    }

    #[test]
    fn pseudotime_length_is_checked() {
        let cells = (0..4).map(|i| pal_common::CellId::new(format!("w{i}"))).collect();
        let rows = (0..4).map(|i| vec![i as f64]).collect();
        let points = Embedding::from_rows(cells, rows).unwrap();
        let par = Parallelism::sequential().unwrap();
        assert!(directed_markov_chain(&points, &[0.0; 3], 3, &par).is_err());
    }
}
