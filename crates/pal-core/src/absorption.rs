//! Absorption probabilities via the fundamental matrix.
//!
//! With absorbing states made into self loops the chain reads, in transient /
//! absorbing block form, `[[Q, R], [0, I]]`. The probability of ending in each
//! absorbing state is `B = (I - Q)⁻¹ R`, obtained here by an LU solve rather
//! than an explicit inverse.

use std::collections::HashMap;

use nalgebra::DMatrix;

use pal_common::{Error, Result};

use crate::graph::CsrMatrix;
use crate::logging::event_names;

/// Absorption probabilities of every transient state.
#[derive(Debug, Clone)]
pub struct Absorption {
    /// Transient state indices, ascending.
    pub transient: Vec<usize>,
    /// Absorbing state indices in the order given.
    pub absorbing: Vec<usize>,
    /// `transient.len() × absorbing.len()`, row-major. Negative round-off is
    /// clamped to zero.
    pub probabilities: Vec<f64>,
}

impl Absorption {
    /// Probabilities for all `n` states: transient rows from the solve,
    /// absorbing rows as indicators of themselves.
    pub fn full_rows(&self) -> Vec<f64> {
        let m = self.absorbing.len();
        let n = self.transient.len() + m;
        let mut out = vec![0.0; n * m];
        for (r, &state) in self.transient.iter().enumerate() {
            out[state * m..(state + 1) * m].copy_from_slice(&self.probabilities[r * m..(r + 1) * m]);
        }
        for (c, &state) in self.absorbing.iter().enumerate() {
            out[state * m + c] = 1.0;
        }
        out
    }
}

/// Make `absorbing` states absorbing in `chain` and solve for the absorption
/// probabilities of the remaining states.
///
/// Rows of `chain` need not be normalized; every row is normalized after the
/// absorbing rows are replaced by self loops.
pub fn absorption_probabilities(chain: &CsrMatrix, absorbing: &[usize]) -> Result<Absorption> {
    let n = chain.nrows();
    let mut column_of: HashMap<usize, usize> = HashMap::with_capacity(absorbing.len());
    let mut absorbing_states = Vec::with_capacity(absorbing.len());
    for &s in absorbing {
        if s >= n {
            return Err(Error::invalid_parameter(
                "absorbing states",
                format!("state {s} out of range for {n} states"),
            ));
        }
        if !column_of.contains_key(&s) {
            column_of.insert(s, absorbing_states.len());
            absorbing_states.push(s);
        }
    }
    if absorbing_states.is_empty() {
        return Err(Error::invalid_parameter(
            "absorbing states",
            "at least one absorbing state is required",
        ));
    }

    let mut absorbed = chain.clone();
    absorbed.retain(|i, _, _| !column_of.contains_key(&i));
    let loops: Vec<(usize, usize, f64)> = absorbing_states.iter().map(|&s| (s, s, 1.0)).collect();
    let transitions = absorbed.with_entries(&loops)?.normalize_rows()?;

    let transient: Vec<usize> = (0..n).filter(|i| !column_of.contains_key(i)).collect();
    let row_of: HashMap<usize, usize> = transient.iter().enumerate().map(|(r, &s)| (s, r)).collect();
    let (t, m) = (transient.len(), absorbing_states.len());

    let mut fundamental = DMatrix::<f64>::identity(t, t);
    let mut targets = DMatrix::<f64>::zeros(t, m);
    for (r, &state) in transient.iter().enumerate() {
        for (j, p) in transitions.row_iter(state) {
            if let Some(&c) = row_of.get(&j) {
                fundamental[(r, c)] -= p;
            } else if let Some(&c) = column_of.get(&j) {
                targets[(r, c)] += p;
            }
        }
    }

    let solved = if t == 0 {
        DMatrix::<f64>::zeros(0, m)
    } else {
        fundamental
            .lu()
            .solve(&targets)
            .filter(|x| x.iter().all(|v| v.is_finite()))
            .ok_or(Error::SingularFundamentalMatrix { transient: t })?
    };

    let mut probabilities = Vec::with_capacity(t * m);
    for r in 0..t {
        for c in 0..m {
            probabilities.push(solved[(r, c)].max(0.0));
        }
    }
    tracing::debug!(
        event = event_names::ABSORPTION_SOLVED,
        transient = t,
        absorbing = m,
        "solved absorption probabilities"
    );

    Ok(Absorption {
        transient,
        absorbing: absorbing_states,
        probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamblers_ruin_closed_form() {
        // 0 ← 1 ⇄ 2 → 3 with fair steps: from 1 reach 0 w.p. 2/3.
        let chain = CsrMatrix::from_triplets(
            4,
            4,
            vec![(0, 1, 1.0), (1, 0, 0.5), (1, 2, 0.5), (2, 1, 0.5), (2, 3, 0.5), (3, 2, 1.0)],
        )
        .unwrap();
        let abs = absorption_probabilities(&chain, &[0, 3]).unwrap();
        assert_eq!(abs.transient, vec![1, 2]);
        let p = &abs.probabilities;
        assert!((p[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((p[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((p[2] - 1.0 / 3.0).abs() < 1e-12);
        assert!((p[3] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn three_state_chain() {
        // 0 → {0: .5, 1: .3, 2: .2}; 1 and 2 absorbing.
        let chain = CsrMatrix::from_triplets(
            3,
            3,
            vec![(0, 0, 0.5), (0, 1, 0.3), (0, 2, 0.2), (1, 0, 1.0), (2, 0, 1.0)],
        )
        .unwrap();
        let abs = absorption_probabilities(&chain, &[2, 1]).unwrap();
        assert_eq!(abs.absorbing, vec![2, 1]);
        assert!((abs.probabilities[0] - 0.4).abs() < 1e-6);
        assert!((abs.probabilities[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn one_absorbing_two_transient_matches_fundamental_matrix() {
        // Q = [[.2, .5], [.4, .1]], R = [.3, .5]; state 2's outgoing edges are replaced.
        let chain = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 0.2),
                (0, 1, 0.5),
                (0, 2, 0.3),
                (1, 0, 0.4),
                (1, 1, 0.1),
                (1, 2, 0.5),
                (2, 0, 0.7),
                (2, 2, 0.3),
            ],
        )
        .unwrap();
        let abs = absorption_probabilities(&chain, &[2]).unwrap();
        assert_eq!(abs.transient, vec![0, 1]);

        // N = (I - Q)⁻¹ = [[.9, .5], [.4, .8]] / .52
        let det = 0.8 * 0.9 - 0.5 * 0.4;
        let n = [[0.9 / det, 0.5 / det], [0.4 / det, 0.8 / det]];
        let r = [0.3, 0.5];
        for (row, expected) in n.iter().enumerate() {
            let nr = expected[0] * r[0] + expected[1] * r[1];
            assert!((abs.probabilities[row] - nr).abs() < 1e-6, "row {row}");
            assert!((abs.probabilities[row] - 1.0).abs() < 1e-6);
        }
        assert_eq!(&abs.full_rows()[2..3], &[1.0]);
    }

    #[test]
    fn full_rows_adds_indicator_rows() {
        let chain = CsrMatrix::from_triplets(
            3,
            3,
            vec![(0, 1, 1.0), (1, 0, 0.25), (1, 2, 0.75), (2, 1, 1.0)],
        )
        .unwrap();
        let abs = absorption_probabilities(&chain, &[0, 2]).unwrap();
        let rows = abs.full_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(&rows[0..2], &[1.0, 0.0]);
        assert_eq!(&rows[4..6], &[0.0, 1.0]);
        assert!((rows[2] - 0.25).abs() < 1e-12);
        assert!((rows[3] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn closed_transient_class_is_singular() {
        // 0 ⇄ 1 never reaches absorbing state 2.
        let chain = CsrMatrix::from_triplets(
            3,
            3,
            vec![(0, 1, 1.0), (1, 0, 1.0), (2, 0, 1.0)],
        )
        .unwrap();
        let err = absorption_probabilities(&chain, &[2]).unwrap_err();
        assert!(matches!(err, Error::SingularFundamentalMatrix { transient: 2 }));
    }

    #[test]
    fn invalid_absorbing_sets() {
        let chain = CsrMatrix::from_triplets(2, 2, vec![(0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        assert!(absorption_probabilities(&chain, &[]).is_err());
        assert!(absorption_probabilities(&chain, &[5]).is_err());
        let all = absorption_probabilities(&chain, &[0, 1, 0]).unwrap();
        assert!(all.transient.is_empty());
        assert_eq!(all.absorbing, vec![0, 1]);
        assert_eq!(all.full_rows(), vec![1.0, 0.0, 0.0, 1.0]);
    }
}
