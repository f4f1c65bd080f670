//! Palantir Core Library
//!
//! Pseudotime, terminal states, and fate probabilities for cells embedded in
//! a diffusion-map style space:
//! - Waypoint sampling and kNN graph construction with connectivity repair
//! - Iterative pseudotime refinement over shortest-path distances
//! - A forward-biased Markov chain over waypoints
//! - Spectral terminal-state discovery
//! - Absorption probabilities and differentiation entropy
//!
//! The entry points are [`run_palantir`], [`identify_terminal_states`], and
//! [`fate_prediction`].

pub mod absorption;
pub mod branch;
pub mod graph;
pub mod kernel;
pub mod logging;
pub mod markov;
pub mod parallel;
pub mod pipeline;
pub mod results;
pub mod sampling;
pub mod spectral;
pub mod terminal;
pub mod trajectory;

pub use pal_common::{CellId, Embedding, Error, LabeledMatrix, LabeledSeries, Result};
pub use pal_config::PalantirConfig;
pub use pipeline::{fate_prediction, identify_terminal_states, run_palantir, run_palantir_with_waypoints};
pub use results::{FatePrediction, PalantirResult, RunDiagnostics};
pub use sampling::Waypoints;
pub use trajectory::TrajectoryDiagnostics;
