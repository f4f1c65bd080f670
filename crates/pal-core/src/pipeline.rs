//! The three public analyses.
//!
//! Each call validates the configuration against the data, builds its own
//! worker pool, and recomputes everything from the embedding; nothing is
//! cached between calls.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use pal_common::{CellId, Embedding, Error, LabeledMatrix, LabeledSeries, Result};
use pal_config::PalantirConfig;
use pal_math::row_entropies;

use crate::absorption::absorption_probabilities;
use crate::branch::{project_to_cells, waypoint_branch_probabilities};
use crate::graph::CsrMatrix;
use crate::kernel::transition_matrix;
use crate::logging::{event_names, Stage, StageTimer};
use crate::markov::directed_markov_chain;
use crate::parallel::Parallelism;
use crate::results::{FatePrediction, PalantirResult, RunDiagnostics};
use crate::sampling::{
    assemble_waypoints, candidate_waypoints, sampling_rng, select_start_cell, Waypoints,
};
use crate::spectral::EigenOptions;
use crate::terminal::terminal_states_from_chain;
use crate::trajectory::{compute_trajectory, RefineOptions, TrajectoryEstimate};

/// Pseudotime, terminal states, branch probabilities, and entropy.
///
/// Waypoints are max-min sampled to about `config.num_waypoints`. When
/// `terminal_states` is `None` they are discovered from the directed chain.
pub fn run_palantir(
    embedding: &Embedding,
    early_cell: &CellId,
    terminal_states: Option<&[CellId]>,
    config: &PalantirConfig,
) -> Result<PalantirResult> {
    run_palantir_with_waypoints(
        embedding,
        early_cell,
        terminal_states,
        &Waypoints::Count(config.num_waypoints),
        config,
    )
}

/// [`run_palantir`] with an explicit waypoint choice.
pub fn run_palantir_with_waypoints(
    embedding: &Embedding,
    early_cell: &CellId,
    terminal_states: Option<&[CellId]>,
    waypoints: &Waypoints,
    config: &PalantirConfig,
) -> Result<PalantirResult> {
    let started = Instant::now();
    config.validate_for(embedding.n_cells())?;
    let par = Parallelism::from_n_jobs(config.n_jobs)?;
    tracing::info!(
        event = event_names::RUN_STARTED,
        operation = "run_palantir",
        cells = embedding.n_cells(),
        components = embedding.n_components(),
        knn = config.knn,
        threads = par.threads(),
        "starting pseudotime run"
    );

    let data = if config.scale_components {
        embedding.min_max_scaled()
    } else {
        embedding.clone()
    };
    let given: Vec<usize> = terminal_states
        .unwrap_or_default()
        .iter()
        .map(|label| data.require(label))
        .collect::<Result<_>>()?;

    let chain = ChainContext::build(
        &data,
        early_cell,
        config.use_start_cell_as_given,
        &given,
        waypoints,
        config,
        &par,
    )?;

    let positions: Vec<usize> = if terminal_states.is_some() {
        let position_of: HashMap<usize, usize> =
            chain.waypoints.iter().enumerate().map(|(p, &r)| (r, p)).collect();
        let mut seen = HashSet::new();
        given
            .iter()
            .filter(|r| seen.insert(**r))
            .filter_map(|r| position_of.get(r).copied())
            .collect()
    } else {
        chain.identify_terminals(config)?
    };
    if positions.is_empty() {
        return Err(Error::NoTerminalStates {
            waypoints: chain.waypoints.len(),
        });
    }

    let wp_labels = chain.wp_data.cells();
    let branches = waypoint_branch_probabilities(&chain.transitions, &positions, config.sink_weight)
        .map_err(|e| e.with_state_labels(wp_labels))?;
    let cells = project_to_cells(&chain.trajectory.weights, &branches)?;

    let terminal_labels: Vec<CellId> = positions.iter().map(|&p| wp_labels[p].clone()).collect();
    let columns: Vec<String> = terminal_labels.iter().map(CellId::to_string).collect();
    let labels = embedding.cells().to_vec();
    let result = PalantirResult {
        pseudotime: chain.pseudotime.reindex(&labels)?,
        entropy: LabeledSeries::new(labels.clone(), cells.entropy)?,
        branch_probs: LabeledMatrix::new(labels, columns, cells.probabilities)?,
        waypoints: wp_labels.to_vec(),
        terminal_states: terminal_labels,
        diagnostics: RunDiagnostics {
            start_cell: data.cells()[chain.start].clone(),
            terminals_identified: terminal_states.is_none(),
            trajectory: chain.trajectory.diagnostics.clone(),
        },
    };

    tracing::info!(
        event = event_names::RUN_FINISHED,
        operation = "run_palantir",
        waypoints = result.waypoints.len(),
        terminal_states = result.terminal_states.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "pseudotime run finished"
    );
    Ok(result)
}

/// Terminal states of the embedding, discovered from the directed chain.
///
/// Components are always min-max scaled and the early cell is always snapped
/// to the nearest boundary cell.
pub fn identify_terminal_states(
    embedding: &Embedding,
    early_cell: &CellId,
    config: &PalantirConfig,
) -> Result<Vec<CellId>> {
    let started = Instant::now();
    config.validate_for(embedding.n_cells())?;
    let par = Parallelism::from_n_jobs(config.n_jobs)?;
    tracing::info!(
        event = event_names::RUN_STARTED,
        operation = "identify_terminal_states",
        cells = embedding.n_cells(),
        knn = config.knn,
        "starting terminal state search"
    );

    let data = embedding.min_max_scaled();
    let chain = ChainContext::build(
        &data,
        early_cell,
        false,
        &[],
        &Waypoints::Count(config.num_waypoints),
        config,
        &par,
    )?;
    let terminals: Vec<CellId> = chain
        .identify_terminals(config)?
        .into_iter()
        .map(|p| chain.wp_data.cells()[p].clone())
        .collect();

    tracing::info!(
        event = event_names::RUN_FINISHED,
        operation = "identify_terminal_states",
        terminal_states = terminals.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "terminal state search finished"
    );
    Ok(terminals)
}

/// Fate probabilities from a partial labeling of cells.
///
/// Every labeled cell is absorbing. Absorption probabilities of the
/// unlabeled cells are summed per label; labeled cells get the indicator of
/// their own label. Columns follow first appearance of each label and rows
/// follow the embedding. The embedding is used as given, without scaling.
pub fn fate_prediction(
    embedding: &Embedding,
    labels: &[(CellId, String)],
    config: &PalantirConfig,
) -> Result<FatePrediction> {
    let started = Instant::now();
    config.validate_for(embedding.n_cells())?;
    if labels.is_empty() {
        return Err(Error::invalid_parameter(
            "labels",
            "at least one labeled cell is required",
        ));
    }
    let par = Parallelism::from_n_jobs(config.n_jobs)?;
    tracing::info!(
        event = event_names::RUN_STARTED,
        operation = "fate_prediction",
        cells = embedding.n_cells(),
        labeled = labels.len(),
        knn = config.knn,
        "starting fate prediction"
    );

    let mut columns: Vec<String> = Vec::new();
    let mut column_of: HashMap<&str, usize> = HashMap::new();
    let mut absorbing = Vec::with_capacity(labels.len());
    let mut label_column = Vec::with_capacity(labels.len());
    let mut seen = HashSet::new();
    for (cell, label) in labels {
        let row = embedding.require(cell)?;
        if !seen.insert(row) {
            return Err(Error::DuplicateCell {
                label: cell.to_string(),
            });
        }
        let column = *column_of.entry(label.as_str()).or_insert_with(|| {
            columns.push(label.clone());
            columns.len() - 1
        });
        absorbing.push(row);
        label_column.push(column);
    }

    let transitions = transition_matrix(embedding, config.knn, &par)?;
    let timer = StageTimer::start(Stage::Absorption);
    let absorption = absorption_probabilities(&transitions, &absorbing)
        .map_err(|e| e.with_state_labels(embedding.cells()))?;
    let per_state = absorption.full_rows();
    timer.finish();

    let (m_states, m_labels) = (absorbing.len(), columns.len());
    let n = embedding.n_cells();
    let mut probabilities = vec![0.0; n * m_labels];
    for i in 0..n {
        for (c, &col) in label_column.iter().enumerate() {
            probabilities[i * m_labels + col] += per_state[i * m_states + c];
        }
    }
    let entropy = row_entropies(&probabilities, m_labels);

    let cells = embedding.cells().to_vec();
    let prediction = FatePrediction {
        probabilities: LabeledMatrix::new(cells.clone(), columns, probabilities)?,
        entropy: LabeledSeries::new(cells, entropy)?,
    };
    tracing::info!(
        event = event_names::RUN_FINISHED,
        operation = "fate_prediction",
        labels = m_labels,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "fate prediction finished"
    );
    Ok(prediction)
}

/// Everything up to and including the directed waypoint chain.
struct ChainContext {
    start: usize,
    /// Rows of the (scaled) data, start first.
    waypoints: Vec<usize>,
    trajectory: TrajectoryEstimate,
    /// Pseudotime of every cell, keyed by label.
    pseudotime: LabeledSeries,
    wp_data: Embedding,
    wp_pseudotime: Vec<f64>,
    transitions: CsrMatrix,
}

impl ChainContext {
    fn build(
        data: &Embedding,
        early_cell: &CellId,
        use_start_as_given: bool,
        terminals: &[usize],
        waypoints: &Waypoints,
        config: &PalantirConfig,
        par: &Parallelism,
    ) -> Result<Self> {
        let timer = StageTimer::start(Stage::Sample);
        let start = select_start_cell(data, early_cell, use_start_as_given)?;
        tracing::debug!(
            event = event_names::SAMPLE_START_CELL,
            early_cell = %early_cell,
            start_cell = %data.cells()[start],
            "selected start cell"
        );
        let mut rng = sampling_rng(config.seed);
        let sampled = candidate_waypoints(data, waypoints, &mut rng)?;
        let boundaries = data.boundary_cells();
        let rows = assemble_waypoints(start, &[boundaries.as_slice(), terminals, sampled.as_slice()]);
        tracing::info!(
            event = event_names::SAMPLE_WAYPOINTS,
            sampled = sampled.len(),
            boundaries = boundaries.len(),
            waypoints = rows.len(),
            "assembled waypoints"
        );
        timer.finish();
        if config.knn > rows.len() {
            return Err(Error::invalid_parameter(
                "knn",
                format!(
                    "knn ({}) exceeds the number of waypoints ({})",
                    config.knn,
                    rows.len()
                ),
            ));
        }

        let options = RefineOptions {
            max_iterations: config.max_iterations,
            convergence_threshold: config.convergence_threshold,
        };
        let trajectory = compute_trajectory(data, start, config.knn, &rows, options, par)?;

        let wp_data = data.subset(&rows)?;
        let pseudotime = LabeledSeries::new(data.cells().to_vec(), trajectory.pseudotime.clone())?;
        let wp_pseudotime = pseudotime.values_for(wp_data.cells())?;
        let transitions = directed_markov_chain(&wp_data, &wp_pseudotime, config.knn, par)?;

        Ok(Self {
            start,
            waypoints: rows,
            trajectory,
            pseudotime,
            wp_data,
            wp_pseudotime,
            transitions,
        })
    }

    /// Waypoint positions of discovered terminal states.
    fn identify_terminals(&self, config: &PalantirConfig) -> Result<Vec<usize>> {
        let eigen = EigenOptions {
            max_iterations: config.eigen_max_iterations,
            tolerance: config.eigen_tolerance,
        };
        terminal_states_from_chain(
            &self.transitions,
            &self.wp_data,
            &self.wp_pseudotime,
            config.terminal_quantile,
            eigen,
        )
    }
}
