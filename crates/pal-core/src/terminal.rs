//! Terminal-state discovery.
//!
//! Waypoints whose stationary mass is an outlier (above a high normal
//! quantile fitted with median and MAD) are grouped into connected regions of
//! the chain. Each region contributes its latest waypoint, snapped to the
//! nearest boundary waypoint of the embedding.

use std::collections::HashSet;

use pal_common::{Embedding, Error, Result};
use pal_math::{median, median_abs_deviation, normal_quantile};

use crate::graph::{connected_components, CsrMatrix};
use crate::logging::{event_names, Stage, StageTimer};
use crate::spectral::{stationary_distribution, EigenOptions};

/// Relative margin above the cutoff below which ranks count as ties.
const RANK_NOISE: f64 = 1e-9;

/// Identify terminal waypoints of a directed chain.
///
/// Rows of `chain`, `wp_points`, and `wp_pseudotime` all index the same
/// waypoints; the returned values are indices into that list, in region
/// order and deduplicated.
pub fn terminal_states_from_chain(
    chain: &CsrMatrix,
    wp_points: &Embedding,
    wp_pseudotime: &[f64],
    quantile: f64,
    eigen: EigenOptions,
) -> Result<Vec<usize>> {
    let n = wp_points.n_cells();
    if chain.nrows() != n || wp_pseudotime.len() != n {
        return Err(Error::InputShapeMismatch {
            context: "terminal state inputs".to_string(),
            expected: n,
            actual: chain.nrows().min(wp_pseudotime.len()),
        });
    }
    let timer = StageTimer::start(Stage::Terminal);

    let stationary = stationary_distribution(chain, eigen)?;
    let ranks: Vec<f64> = stationary.values.iter().map(|v| v.abs()).collect();
    let center = median(&ranks);
    let spread = median_abs_deviation(&ranks);
    let cutoff = normal_quantile(quantile, center, spread);
    // Solver round-off must not lift a rank over the cutoff.
    let noise = RANK_NOISE * ranks.iter().copied().fold(0.0, f64::max);
    let candidates: Vec<usize> = (0..n).filter(|&i| ranks[i] > cutoff + noise).collect();
    tracing::debug!(
        event = event_names::TERMINAL_CUTOFF,
        median = center,
        mad = spread,
        cutoff,
        candidates = candidates.len(),
        eigen_iterations = stationary.iterations,
        "stationary mass cutoff"
    );

    let boundaries = wp_points.boundary_cells();
    let mut seen = HashSet::new();
    let mut terminals = Vec::new();
    for region in connected_components(chain, &candidates) {
        let Some(latest) = latest_member(&region, wp_pseudotime) else {
            continue;
        };
        let Some(terminal) = wp_points.nearest_among(latest, &boundaries) else {
            continue;
        };
        if seen.insert(terminal) {
            terminals.push(terminal);
        }
    }
    timer.finish();

    if terminals.is_empty() {
        return Err(Error::NoTerminalStates { waypoints: n });
    }
    tracing::info!(
        event = event_names::TERMINAL_IDENTIFIED,
        count = terminals.len(),
        terminals = ?terminals.iter().map(|&i| wp_points.cells()[i].as_str()).collect::<Vec<_>>(),
        "identified terminal states"
    );
    Ok(terminals)
}

/// Member with the largest pseudotime; earliest member on ties.
fn latest_member(members: &[usize], pseudotime: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &m in members {
        match best {
            Some(b) if pseudotime[m] <= pseudotime[b] => {}
            _ => best = Some(m),
        }
    }
    best
}
