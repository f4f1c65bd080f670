//! Branch probabilities and differentiation entropy.

use std::collections::{HashMap, HashSet};

use pal_common::Result;
use pal_math::row_entropies;

use crate::absorption::absorption_probabilities;
use crate::graph::CsrMatrix;
use crate::logging::{Stage, StageTimer};
use crate::trajectory::PerspectiveWeights;

/// Probabilities over terminal states with the entropy of each row.
#[derive(Debug, Clone)]
pub struct BranchProbabilities {
    /// `rows × terminals`, row-major.
    pub probabilities: Vec<f64>,
    pub entropy: Vec<f64>,
    pub terminals: usize,
}

impl BranchProbabilities {
    fn from_rows(probabilities: Vec<f64>, terminals: usize) -> Self {
        let entropy = row_entropies(&probabilities, terminals);
        Self {
            probabilities,
            entropy,
            terminals,
        }
    }

    pub fn rows(&self) -> usize {
        self.entropy.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.probabilities[i * self.terminals..(i + 1) * self.terminals]
    }
}

/// Turn the neighborhood of each terminal into a basin.
///
/// For every terminal `s` and every `nb` with `chain[s, nb] > 0`, the edge
/// `nb → s` is set to `weight`, replacing whatever was there. Rows are left
/// unnormalized.
pub fn expand_sinks(chain: &CsrMatrix, terminals: &[usize], weight: f64) -> Result<CsrMatrix> {
    let mut overrides: HashMap<(usize, usize), f64> = HashMap::new();
    for &s in terminals {
        for (nb, p) in chain.row_iter(s) {
            if p > 0.0 {
                overrides.insert((nb, s), weight);
            }
        }
    }
    let mut expanded = chain.clone();
    expanded.retain(|i, j, _| !overrides.contains_key(&(i, j)));
    let extra: Vec<(usize, usize, f64)> = overrides.into_iter().map(|((i, j), w)| (i, j, w)).collect();
    expanded.with_entries(&extra)
}

/// Branch probabilities over the waypoint chain.
///
/// `terminals` index rows of `chain`; the columns follow their order after
/// deduplication. Terminal rows are indicators of themselves.
pub fn waypoint_branch_probabilities(
    chain: &CsrMatrix,
    terminals: &[usize],
    sink_weight: f64,
) -> Result<BranchProbabilities> {
    let timer = StageTimer::start(Stage::Absorption);
    let mut seen = HashSet::new();
    let terminals: Vec<usize> = terminals.iter().copied().filter(|t| seen.insert(*t)).collect();
    let expanded = expand_sinks(chain, &terminals, sink_weight)?;
    let absorption = absorption_probabilities(&expanded, &terminals)?;
    let out = BranchProbabilities::from_rows(absorption.full_rows(), terminals.len());
    timer.finish();
    Ok(out)
}

/// Project waypoint branch probabilities onto every cell with `Wᵀ`, then
/// recompute entropy on the projected rows.
pub fn project_to_cells(weights: &PerspectiveWeights, branches: &BranchProbabilities) -> Result<BranchProbabilities> {
    let timer = StageTimer::start(Stage::Project);
    let projected = weights.project(&branches.probabilities, branches.terminals)?;
    let out = BranchProbabilities::from_rows(projected, branches.terminals);
    timer.finish();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_chain() -> CsrMatrix {
        // 0 ⇄ 1 ⇄ 2 ⇄ 3 ⇄ 4, uniform over neighbors.
        let mut t = Vec::new();
        for i in 0..5usize {
            let nbs: Vec<usize> = [i.checked_sub(1), Some(i + 1).filter(|&j| j < 5)]
                .into_iter()
                .flatten()
                .collect();
            let p = 1.0 / nbs.len() as f64;
            for j in nbs {
                t.push((i, j, p));
            }
        }
        CsrMatrix::from_triplets(5, 5, t).unwrap()
    }

    #[test]
    fn sinks_overwrite_edges_into_terminal() {
        let chain = path_chain();
        let expanded = expand_sinks(&chain, &[4], 0.9).unwrap();
        // 4's only neighbor is 3; 3 → 4 is replaced, not summed.
        assert_eq!(expanded.get(3, 4), 0.9);
        assert_eq!(expanded.get(3, 2), 0.5);
        assert_eq!(expanded.get(2, 3), chain.get(2, 3));
    }

    #[test]
    fn sinks_can_add_new_edges() {
        // 0 → 1 only; terminal 0 makes 1 → 0 appear.
        let chain = CsrMatrix::from_triplets(2, 2, vec![(0, 1, 1.0), (1, 1, 1.0)]).unwrap();
        let expanded = expand_sinks(&chain, &[0], 0.5).unwrap();
        assert_eq!(expanded.get(1, 0), 0.5);
    }

    #[test]
    fn symmetric_path_splits_evenly() {
        let chain = path_chain();
        let branches = waypoint_branch_probabilities(&chain, &[0, 4], 0.5).unwrap();
        assert_eq!(branches.rows(), 5);
        for i in 0..5 {
            let s: f64 = branches.row(i).iter().sum();
            assert!((s - 1.0).abs() < 1e-9);
        }
        assert_eq!(branches.row(0), &[1.0, 0.0]);
        assert_eq!(branches.row(4), &[0.0, 1.0]);
        assert!((branches.row(2)[0] - 0.5).abs() < 1e-9);
        assert!((branches.entropy[2] - 2f64.ln()).abs() < 1e-9);
        assert_eq!(branches.entropy[0], 0.0);
        assert!(branches.row(1)[0] > branches.row(1)[1]);
    }

    #[test]
    fn duplicate_terminals_collapse() {
        let branches = waypoint_branch_probabilities(&path_chain(), &[4, 0, 4], 0.5).unwrap();
        assert_eq!(branches.terminals, 2);
        assert_eq!(branches.row(4), &[1.0, 0.0]);
    }

    #[test]
    fn projection_keeps_rows_stochastic() {
        let chain = path_chain();
        let branches = waypoint_branch_probabilities(&chain, &[0, 4], 0.5).unwrap();
        let d: Vec<Vec<f64>> = (0..5)
            .map(|w| (0..7).map(|c| (w as f64 - c as f64 * 4.0 / 6.0).abs()).collect())
            .collect();
        let weights = PerspectiveWeights::from_distances(&d).unwrap();
        let cells = project_to_cells(&weights, &branches).unwrap();
        assert_eq!(cells.rows(), 7);
        for i in 0..7 {
            let s: f64 = cells.row(i).iter().sum();
            assert!((s - 1.0).abs() < 1e-9);
            assert!(cells.entropy[i] >= 0.0);
        }
        assert!(cells.row(0)[0] > cells.row(6)[0]);
    }
}
