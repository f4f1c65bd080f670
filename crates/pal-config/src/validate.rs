//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::config::PalantirConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 40,
            ValidationError::ParseError(_) => 41,
            ValidationError::SemanticError(_) => 42,
            ValidationError::InvalidValue { .. } => 43,
        }
    }

    fn invalid(field: &str, message: String) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message,
        }
    }
}

impl From<ValidationError> for pal_common::Error {
    fn from(err: ValidationError) -> Self {
        pal_common::Error::Config(err.to_string())
    }
}

impl PalantirConfig {
    /// Check every field against its admissible range.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.knn < 2 {
            return Err(ValidationError::invalid(
                "knn",
                format!("Must be at least 2, got {}", self.knn),
            ));
        }
        if self.num_waypoints == 0 {
            return Err(ValidationError::invalid(
                "num_waypoints",
                "Must be at least 1, got 0".to_string(),
            ));
        }
        if self.n_jobs != -1 && self.n_jobs < 1 {
            return Err(ValidationError::invalid(
                "n_jobs",
                format!("Must be -1 or a positive count, got {}", self.n_jobs),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::invalid(
                "max_iterations",
                "Must be at least 1, got 0".to_string(),
            ));
        }
        validate_open_unit("convergence_threshold", self.convergence_threshold)?;
        validate_open_unit("terminal_quantile", self.terminal_quantile)?;
        if !(self.sink_weight > 0.0 && self.sink_weight.is_finite()) {
            return Err(ValidationError::invalid(
                "sink_weight",
                format!("Must be positive, got {}", self.sink_weight),
            ));
        }
        if self.eigen_max_iterations == 0 {
            return Err(ValidationError::invalid(
                "eigen_max_iterations",
                "Must be at least 1, got 0".to_string(),
            ));
        }
        if !(self.eigen_tolerance > 0.0 && self.eigen_tolerance.is_finite()) {
            return Err(ValidationError::invalid(
                "eigen_tolerance",
                format!("Must be positive, got {}", self.eigen_tolerance),
            ));
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus checks that depend on the data size.
    pub fn validate_for(&self, n_cells: usize) -> ValidationResult<()> {
        self.validate()?;
        if self.knn > n_cells {
            return Err(ValidationError::SemanticError(format!(
                "knn ({}) exceeds the number of cells ({})",
                self.knn, n_cells
            )));
        }
        Ok(())
    }
}

fn validate_open_unit(field: &str, value: f64) -> ValidationResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("Must be in (0, 1), got {}", value),
        ))
    }
}
