//! Pipeline outputs.
//!
//! All results serialize with `serde` so callers can export them as JSON.

use serde::Serialize;

use pal_common::{CellId, LabeledMatrix, LabeledSeries};

use crate::trajectory::TrajectoryDiagnostics;

/// Output of a full pseudotime run.
#[derive(Debug, Clone, Serialize)]
pub struct PalantirResult {
    /// Pseudotime of every cell, in embedding order.
    pub pseudotime: LabeledSeries,
    /// Differentiation entropy of every cell.
    pub entropy: LabeledSeries,
    /// Cells × terminal states; rows sum to one.
    pub branch_probs: LabeledMatrix,
    /// Start cell first.
    pub waypoints: Vec<CellId>,
    pub terminal_states: Vec<CellId>,
    pub diagnostics: RunDiagnostics,
}

/// What happened along the way.
#[derive(Debug, Clone, Serialize)]
pub struct RunDiagnostics {
    /// Start cell after boundary snapping.
    pub start_cell: CellId,
    /// Whether terminal states were discovered rather than supplied.
    pub terminals_identified: bool,
    pub trajectory: TrajectoryDiagnostics,
}

impl PalantirResult {
    /// Branch probabilities of one cell, keyed by terminal state.
    pub fn fate_of(&self, cell: &CellId) -> Option<Vec<(CellId, f64)>> {
        let row = self.branch_probs.row_by_label(cell)?;
        Some(
            self.terminal_states
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect(),
        )
    }
}

/// Output of fate prediction from labeled cells.
#[derive(Debug, Clone, Serialize)]
pub struct FatePrediction {
    /// Cells × labels; rows sum to one.
    pub probabilities: LabeledMatrix,
    pub entropy: LabeledSeries,
}
