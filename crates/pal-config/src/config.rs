//! Typed pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Tunables shared by the three public analyses.
///
/// Every field has a default, so a config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PalantirConfig {
    /// Neighbor count for kNN graphs and the adaptive kernel bandwidth.
    pub knn: usize,

    /// Target number of max-min sampled waypoints.
    pub num_waypoints: usize,

    /// Worker threads for the parallel phases; -1 uses every logical CPU.
    pub n_jobs: i32,

    /// Min-max scale each embedding component to [0, 1] before use.
    pub scale_components: bool,

    /// Use the early cell verbatim instead of snapping it to a boundary cell.
    pub use_start_cell_as_given: bool,

    /// Upper bound on trajectory refinement rounds.
    pub max_iterations: usize,

    /// Pearson correlation between successive trajectories that ends refinement.
    pub convergence_threshold: f64,

    /// Seed for waypoint sampling. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Quantile of the fitted normal above which a stationary rank is terminal.
    pub terminal_quantile: f64,

    /// Weight assigned to a terminal's in-edges from its neighbors before absorption.
    pub sink_weight: f64,

    pub eigen_max_iterations: usize,

    pub eigen_tolerance: f64,
}

impl Default for PalantirConfig {
    fn default() -> Self {
        Self {
            knn: 30,
            num_waypoints: 1200,
            n_jobs: -1,
            scale_components: true,
            use_start_cell_as_given: false,
            max_iterations: 25,
            convergence_threshold: 0.9999,
            seed: None,
            terminal_quantile: 0.9999,
            sink_weight: 0.5,
            eigen_max_iterations: 10_000,
            eigen_tolerance: 1e-10,
        }
    }
}

impl PalantirConfig {
    /// Load from a `.toml` or `.json` file. Other extensions are parsed as TOML.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("invalid TOML config: {e}")))
    }

    pub fn from_json_str(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("invalid JSON config: {e}")))
    }

    /// Load and validate in one step.
    pub fn load(path: &Path) -> ValidationResult<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = PalantirConfig::default();
        assert_eq!(c.knn, 30);
        assert_eq!(c.num_waypoints, 1200);
        assert_eq!(c.n_jobs, -1);
        assert!(c.scale_components);
        assert!(!c.use_start_cell_as_given);
        assert_eq!(c.max_iterations, 25);
        assert_eq!(c.seed, None);
        assert_eq!(c.sink_weight, 0.5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = PalantirConfig::from_toml_str("knn = 10\nseed = 7\n").unwrap();
        assert_eq!(c.knn, 10);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.num_waypoints, 1200);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = PalantirConfig::from_json_str(r#"{"num_waypoints": 50, "n_jobs": 2}"#).unwrap();
        assert_eq!(c.num_waypoints, 50);
        assert_eq!(c.n_jobs, 2);
        assert_eq!(c.knn, 30);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PalantirConfig::from_toml_str("k = 10\n").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }
}
