//! Pipeline stages and stable event names.
//!
//! Event names are used as the `event` field of every structured log line
//! so that JSONL consumers can filter without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waypoint selection.
    Sample,
    /// kNN graph, repair, and waypoint distance matrix.
    ShortestPaths,
    /// Iterative pseudotime refinement.
    Trajectory,
    /// Directed transition matrix over waypoints.
    MarkovChain,
    /// Spectral terminal state discovery.
    Terminal,
    /// Absorption probabilities.
    Absorption,
    /// Projection of waypoint results onto all cells.
    Project,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Sample => "sample",
            Stage::ShortestPaths => "shortest_paths",
            Stage::Trajectory => "trajectory",
            Stage::MarkovChain => "markov_chain",
            Stage::Terminal => "terminal",
            Stage::Absorption => "absorption",
            Stage::Project => "project",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const STAGE_STARTED: &str = "stage.started";
    pub const STAGE_FINISHED: &str = "stage.finished";

    // Sampling
    pub const SAMPLE_START_CELL: &str = "sample.start_cell";
    pub const SAMPLE_WAYPOINTS: &str = "sample.waypoints";

    // Graph
    pub const GRAPH_BUILT: &str = "graph.built";
    pub const GRAPH_DISCONNECTED: &str = "graph.disconnected";
    pub const GRAPH_REPAIRED: &str = "graph.repaired";

    // Trajectory
    pub const TRAJECTORY_ITERATION: &str = "trajectory.iteration";
    pub const TRAJECTORY_CONVERGED: &str = "trajectory.converged";
    pub const TRAJECTORY_NOT_CONVERGED: &str = "trajectory.not_converged";

    // Markov chain
    pub const MARKOV_PRUNED: &str = "markov.pruned";

    // Terminal states
    pub const TERMINAL_CUTOFF: &str = "terminal.cutoff";
    pub const TERMINAL_IDENTIFIED: &str = "terminal.identified";

    // Absorption
    pub const ABSORPTION_SOLVED: &str = "absorption.solved";
}
