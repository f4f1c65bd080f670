//! Waypoint selection.
//!
//! Waypoints are a well-spread subset of cells that stand in for the full
//! data set during trajectory refinement and Markov chain construction. They
//! come from max-min sampling along each embedding component, unioned with
//! the boundary cells and any terminal states, with the start cell first.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use pal_common::{CellId, Embedding, Error, Result};

/// How waypoints are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waypoints {
    /// Max-min sample about this many cells.
    Count(usize),
    /// Use exactly these cells (plus boundary, terminal, and start cells).
    Explicit(Vec<CellId>),
}

impl Default for Waypoints {
    fn default() -> Self {
        Waypoints::Count(1200)
    }
}

impl From<usize> for Waypoints {
    fn from(n: usize) -> Self {
        Waypoints::Count(n)
    }
}

/// RNG for sampling: reproducible when seeded, OS entropy otherwise.
pub fn sampling_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Max-min sampling along each component independently.
///
/// Each component gets `num_waypoints / n_components` picks: one random row,
/// then repeatedly the row whose smallest absolute difference (along that
/// component) to the rows picked so far is largest, first index on ties.
/// When `num_waypoints` is smaller than the number of components only the
/// first `num_waypoints` components are sampled, one pick each. Results are
/// deduplicated in pick order and never exceed `num_waypoints`.
pub fn max_min_sampling<R: Rng>(
    points: &Embedding,
    num_waypoints: usize,
    rng: &mut R,
) -> Vec<usize> {
    let n = points.n_cells();
    let d = points.n_components();
    let (columns, iterations) = if num_waypoints >= d {
        (d, num_waypoints / d)
    } else {
        (num_waypoints, 1)
    };

    let mut seen = HashSet::new();
    let mut picked = Vec::with_capacity(columns * iterations);
    for j in 0..columns {
        let column = points.column(j);
        let first = rng.random_range(0..n);
        let mut chosen = vec![first];
        let mut min_dists: Vec<f64> = column.iter().map(|v| (v - column[first]).abs()).collect();

        for _ in 1..iterations {
            let mut next = 0;
            for (i, &m) in min_dists.iter().enumerate() {
                if m > min_dists[next] {
                    next = i;
                }
            }
            chosen.push(next);
            for (i, m) in min_dists.iter_mut().enumerate() {
                *m = m.min((column[i] - column[next]).abs());
            }
        }

        for c in chosen {
            if seen.insert(c) {
                picked.push(c);
            }
        }
    }
    picked
}

/// The row to start the trajectory from.
///
/// Unless `use_as_given`, the early cell is snapped to the nearest boundary
/// cell (a cell holding some component's minimum or maximum).
pub fn select_start_cell(points: &Embedding, early_cell: &CellId, use_as_given: bool) -> Result<usize> {
    let early = points.require(early_cell)?;
    if use_as_given {
        return Ok(early);
    }
    let boundaries = points.boundary_cells();
    points
        .nearest_among(early, &boundaries)
        .ok_or(Error::EmptyEmbedding)
}

/// Ordered, deduplicated waypoint rows: `start`, then each group in turn.
pub fn assemble_waypoints(start: usize, groups: &[&[usize]]) -> Vec<usize> {
    let mut seen = HashSet::new();
    seen.insert(start);
    let mut out = vec![start];
    for group in groups {
        for &row in group.iter() {
            if seen.insert(row) {
                out.push(row);
            }
        }
    }
    out
}

/// Resolve a [`Waypoints`] choice to row indices (without start/boundary unions).
pub fn candidate_waypoints<R: Rng>(
    points: &Embedding,
    waypoints: &Waypoints,
    rng: &mut R,
) -> Result<Vec<usize>> {
    match waypoints {
        Waypoints::Count(0) => Err(Error::invalid_parameter(
            "num_waypoints",
            "must be at least 1",
        )),
        Waypoints::Count(n) => Ok(max_min_sampling(points, *n, rng)),
        Waypoints::Explicit(labels) => labels.iter().map(|l| points.require(l)).collect(),
    }
}
