//! Pseudotime by iterative waypoint triangulation.
//!
//! Every waypoint sees the data from its own perspective: its shortest-path
//! distance to each cell, signed negative for cells that currently sit
//! before it and shifted by its own pseudotime so all perspectives share the
//! start cell's origin. The pseudotime of a cell is the Gaussian-weighted
//! average of those perspectives. Refinement repeats until successive
//! estimates correlate above the convergence threshold.

use serde::Serialize;

use pal_common::{Embedding, Error, Result};
use pal_math::{gaussian_weight, pearson, silverman_bandwidth};

use crate::graph::{build_connected_graph, multi_source};
use crate::logging::{event_names, Stage, StageTimer};
use crate::parallel::Parallelism;

/// Waypoints × cells weights whose columns sum to one.
///
/// Used to combine waypoint perspectives and, transposed, to project
/// waypoint-level quantities onto every cell.
#[derive(Debug, Clone)]
pub struct PerspectiveWeights {
    n_waypoints: usize,
    n_cells: usize,
    values: Vec<f64>,
}

impl PerspectiveWeights {
    /// Gaussian weights of a waypoints × cells distance matrix.
    ///
    /// The bandwidth follows Silverman's rule over all entries. A cell whose
    /// weights all underflow is assigned entirely to its nearest waypoint.
    pub fn from_distances(distances: &[Vec<f64>]) -> Result<Self> {
        let n_waypoints = distances.len();
        let n_cells = distances.first().map(Vec::len).unwrap_or(0);
        let flat: Vec<f64> = distances.iter().flatten().copied().collect();
        let sigma = silverman_bandwidth(&flat);
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::invalid_parameter(
                "waypoints",
                format!("shortest-path distances have no spread (bandwidth {sigma})"),
            ));
        }

        let mut values: Vec<f64> = flat.iter().map(|&d| gaussian_weight(d, sigma)).collect();
        for j in 0..n_cells {
            let total: f64 = (0..n_waypoints).map(|w| values[w * n_cells + j]).sum();
            if total > 0.0 {
                for w in 0..n_waypoints {
                    values[w * n_cells + j] /= total;
                }
            } else {
                let nearest = (0..n_waypoints)
                    .min_by(|&a, &b| distances[a][j].total_cmp(&distances[b][j]))
                    .unwrap_or(0);
                values[nearest * n_cells + j] = 1.0;
            }
        }
        Ok(Self {
            n_waypoints,
            n_cells,
            values,
        })
    }

    pub fn n_waypoints(&self) -> usize {
        self.n_waypoints
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Weight of waypoint `w` for cell `j`.
    pub fn get(&self, w: usize, j: usize) -> f64 {
        self.values[w * self.n_cells + j]
    }

    /// `Wᵀ · rows` for a waypoints × `m` row-major matrix, giving cells × `m`.
    pub fn project(&self, rows: &[f64], m: usize) -> Result<Vec<f64>> {
        if rows.len() != self.n_waypoints * m {
            return Err(Error::InputShapeMismatch {
                context: "waypoint rows for projection".to_string(),
                expected: self.n_waypoints * m,
                actual: rows.len(),
            });
        }
        let mut out = vec![0.0; self.n_cells * m];
        for w in 0..self.n_waypoints {
            let src = &rows[w * m..(w + 1) * m];
            for j in 0..self.n_cells {
                let weight = self.get(w, j);
                if weight == 0.0 {
                    continue;
                }
                let dst = &mut out[j * m..(j + 1) * m];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += weight * s;
                }
            }
        }
        Ok(out)
    }
}

/// How refinement ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryDiagnostics {
    /// Refinement rounds performed.
    pub iterations: usize,
    pub converged: bool,
    /// Pearson correlation between successive estimates, one per round.
    pub correlations: Vec<f64>,
    /// Edges added to connect the kNN graph.
    pub repaired_edges: usize,
}

/// Pseudotime over all cells with the weights used to compute it.
#[derive(Debug, Clone)]
pub struct TrajectoryEstimate {
    /// Indexed like the rows of the embedding.
    pub pseudotime: Vec<f64>,
    pub weights: PerspectiveWeights,
    pub diagnostics: TrajectoryDiagnostics,
}

/// Refinement controls.
#[derive(Debug, Clone, Copy)]
pub struct RefineOptions {
    pub max_iterations: usize,
    pub convergence_threshold: f64,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            convergence_threshold: 0.9999,
        }
    }
}

/// Compute pseudotime for every row of `points`.
///
/// `waypoints` are row indices and must start with `start`.
pub fn compute_trajectory(
    points: &Embedding,
    start: usize,
    k: usize,
    waypoints: &[usize],
    options: RefineOptions,
    par: &Parallelism,
) -> Result<TrajectoryEstimate> {
    if waypoints.first() != Some(&start) {
        return Err(Error::invalid_parameter(
            "waypoints",
            "the start cell must be the first waypoint",
        ));
    }

    let timer = StageTimer::start(Stage::ShortestPaths);
    let repaired = build_connected_graph(points, k, start, par)?;
    let distances = multi_source(&repaired.graph, waypoints, par);
    timer.finish();

    let timer = StageTimer::start(Stage::Trajectory);
    let weights = PerspectiveWeights::from_distances(&distances)?;
    let (pseudotime, iterations, converged, correlations) =
        refine(&distances, waypoints, &weights, options);
    timer.finish();

    Ok(TrajectoryEstimate {
        pseudotime,
        weights,
        diagnostics: TrajectoryDiagnostics {
            iterations,
            converged,
            correlations,
            repaired_edges: repaired.repaired_edges,
        },
    })
}

/// Fixed-point refinement starting from the start cell's distances.
///
/// Returns the final estimate, rounds performed, whether the threshold was
/// crossed, and the per-round correlations. The estimate produced by the
/// round that converges is the one returned.
pub fn refine(
    distances: &[Vec<f64>],
    waypoints: &[usize],
    weights: &PerspectiveWeights,
    options: RefineOptions,
) -> (Vec<f64>, usize, bool, Vec<f64>) {
    let n_cells = weights.n_cells();
    let mut trajectory = distances[0].clone();
    let mut correlations = Vec::with_capacity(options.max_iterations);
    let mut converged = false;

    while !converged && correlations.len() < options.max_iterations {
        let offsets: Vec<f64> = waypoints.iter().map(|&r| trajectory[r]).collect();
        let candidate: Vec<f64> = (0..n_cells)
            .map(|j| {
                let mut value = weights.get(0, j) * distances[0][j];
                for (w, &offset) in offsets.iter().enumerate().skip(1) {
                    let d = distances[w][j];
                    let signed = if trajectory[j] < offset { -d } else { d };
                    value += weights.get(w, j) * (signed + offset);
                }
                value
            })
            .collect();

        let corr = pearson(&trajectory, &candidate);
        correlations.push(corr);
        tracing::debug!(
            event = event_names::TRAJECTORY_ITERATION,
            iteration = correlations.len(),
            correlation = corr,
            "refined trajectory"
        );
        converged = corr > options.convergence_threshold;
        trajectory = candidate;
    }

    let iterations = correlations.len();
    if converged {
        tracing::info!(
            event = event_names::TRAJECTORY_CONVERGED,
            iterations,
            "trajectory converged"
        );
    } else {
        tracing::warn!(
            event = event_names::TRAJECTORY_NOT_CONVERGED,
            iterations,
            last_correlation = correlations.last().copied().unwrap_or(f64::NAN),
            "trajectory did not converge; returning the last estimate"
        );
    }
    (trajectory, iterations, converged, correlations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_common::CellId;
    use pal_math::spearman;

    fn line(n: usize) -> Embedding {
        let cells = (0..n).map(|i| CellId::new(format!("c{i}"))).collect();
        let rows = (0..n).map(|i| vec![i as f64 / n as f64, 0.0]).collect();
        Embedding::from_rows(cells, rows).unwrap()
    }

    #[test]
    fn weights_columns_sum_to_one() {
        let d = vec![vec![0.0, 1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0, 0.0]];
        let w = PerspectiveWeights::from_distances(&d).unwrap();
        for j in 0..4 {
            let s: f64 = (0..2).map(|i| w.get(i, j)).sum();
            assert!((s - 1.0).abs() < 1e-12);
        }
        // Closer waypoint carries more weight.
        assert!(w.get(0, 0) > w.get(1, 0));
    }

    #[test]
    fn flat_distances_are_rejected() {
        let d = vec![vec![0.0, 0.0]];
        assert!(PerspectiveWeights::from_distances(&d).is_err());
    }

    #[test]
    fn projection_averages_waypoint_rows() {
        let d = vec![vec![0.0, 1.0, 2.0], vec![2.0, 1.0, 0.0]];
        let w = PerspectiveWeights::from_distances(&d).unwrap();
        // Two columns: indicator of each waypoint.
        let rows = vec![1.0, 0.0, 0.0, 1.0];
        let out = w.project(&rows, 2).unwrap();
        for j in 0..3 {
            assert!((out[j * 2] + out[j * 2 + 1] - 1.0).abs() < 1e-12);
        }
        assert!((out[2] - 0.5).abs() < 1e-12);
        assert!(w.project(&rows[..3], 2).is_err());
    }

    #[test]
    fn start_must_lead_waypoints() {
        let par = Parallelism::sequential().unwrap();
        let err = compute_trajectory(&line(10), 0, 3, &[2, 0], RefineOptions::default(), &par);
        assert!(err.is_err());
    }

    #[test]
    fn line_pseudotime_follows_position() {
        let points = line(60);
        let par = Parallelism::sequential().unwrap();
        let waypoints = vec![0, 10, 20, 30, 40, 50, 59];
        let est =
            compute_trajectory(&points, 0, 5, &waypoints, RefineOptions::default(), &par).unwrap();
        let truth: Vec<f64> = (0..60).map(|i| i as f64).collect();
        assert!(spearman(&est.pseudotime, &truth) > 0.99);
        assert!(est.diagnostics.iterations >= 1);
        assert_eq!(est.diagnostics.repaired_edges, 0);
        assert_eq!(est.weights.n_waypoints(), 7);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let points = line(30);
        let par = Parallelism::sequential().unwrap();
        let options = RefineOptions {
            max_iterations: 1,
            convergence_threshold: 0.999_999_999,
        };
        let est = compute_trajectory(&points, 0, 4, &[0, 15, 29], options, &par).unwrap();
        assert_eq!(est.diagnostics.iterations, 1);
        assert_eq!(est.diagnostics.correlations.len(), 1);
    }
}
