//! Error types for Palantir.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! Only fatal conditions are errors. A disconnected kNN graph and a
//! trajectory that does not converge are repaired or tolerated in place and
//! reported through `tracing` warnings instead.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "graph",
//!   "message": "degenerate chain at state 17 of 240: row has zero total affinity",
//!   "recoverable": true,
//!   "context": { "state": 17, "dimension": 240 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::id::CellId;

/// Result type alias for Palantir operations.
pub type Result<T> = std::result::Result<T, Error>;

fn label_suffix(label: &Option<String>) -> String {
    label.as_ref().map(|l| format!(" ({l})")).unwrap_or_default()
}

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Embedding shape, labels, and parameter errors.
    Input,
    /// Graph and Markov-chain structure errors.
    Graph,
    /// Linear algebra and spectral errors.
    Numerical,
    /// Configuration file errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Graph => write!(f, "graph"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Palantir.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("input shape mismatch in {context}: expected {expected}, got {actual}")]
    InputShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("cell {label} is not present in the embedding")]
    UnknownCell { label: String },

    #[error("duplicate cell label {label}")]
    DuplicateCell { label: String },

    #[error("embedding has no cells or no components")]
    EmptyEmbedding,

    #[error("non-finite value for cell {label} in component {component}")]
    NonFiniteValue { label: String, component: usize },

    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    // Graph errors (20-29)
    #[error("degenerate chain at state {state} of {dimension}{}: {reason}", label_suffix(.label))]
    DegenerateChain {
        state: usize,
        dimension: usize,
        label: Option<String>,
        reason: String,
    },

    #[error("no terminal states identified among {waypoints} waypoints")]
    NoTerminalStates { waypoints: usize },

    // Numerical errors (30-39)
    #[error("fundamental matrix (I - Q) is singular for {transient} transient states")]
    SingularFundamentalMatrix { transient: usize },

    #[error("eigensolver returned {converged} of {requested} requested eigenvectors: {reason}")]
    InsufficientSpectrum {
        requested: usize,
        converged: usize,
        reason: String,
    },

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::UnknownCell`].
    pub fn unknown_cell(label: &CellId) -> Self {
        Error::UnknownCell {
            label: label.to_string(),
        }
    }

    /// Attach the cell label of the offending state, when the state index
    /// refers into `labels`.
    pub fn with_state_labels(self, labels: &[CellId]) -> Self {
        match self {
            Error::DegenerateChain {
                state,
                dimension,
                label: None,
                reason,
            } => Error::DegenerateChain {
                state,
                dimension,
                label: labels.get(state).map(|l| l.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Graph errors
    /// - 30-39: Numerical errors
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InputShapeMismatch { .. } => 10,
            Error::UnknownCell { .. } => 11,
            Error::DuplicateCell { .. } => 12,
            Error::EmptyEmbedding => 13,
            Error::NonFiniteValue { .. } => 14,
            Error::InvalidParameter { .. } => 15,
            Error::DegenerateChain { .. } => 20,
            Error::NoTerminalStates { .. } => 21,
            Error::SingularFundamentalMatrix { .. } => 30,
            Error::InsufficientSpectrum { .. } => 31,
            Error::Config(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InputShapeMismatch { .. }
            | Error::UnknownCell { .. }
            | Error::DuplicateCell { .. }
            | Error::EmptyEmbedding
            | Error::NonFiniteValue { .. }
            | Error::InvalidParameter { .. } => ErrorCategory::Input,

            Error::DegenerateChain { .. } | Error::NoTerminalStates { .. } => ErrorCategory::Graph,

            Error::SingularFundamentalMatrix { .. } | Error::InsufficientSpectrum { .. } => {
                ErrorCategory::Numerical
            }

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    ///
    /// Recoverable errors may be resolved by changing parameters (k,
    /// waypoint count) or by supplying terminal states explicitly.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Input: the data itself is wrong
            Error::InputShapeMismatch { .. } => false,
            Error::UnknownCell { .. } => false,
            Error::DuplicateCell { .. } => false,
            Error::EmptyEmbedding => false,
            Error::NonFiniteValue { .. } => false,
            Error::InvalidParameter { .. } => true,

            // Graph: usually fixed by a larger k or explicit terminals
            Error::DegenerateChain { .. } => true,
            Error::NoTerminalStates { .. } => true,

            Error::SingularFundamentalMatrix { .. } => true,
            Error::InsufficientSpectrum { .. } => true,

            Error::Config(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InputShapeMismatch { .. } => {
                "Check that the embedding has one label per row and a value for every component."
            }
            Error::UnknownCell { .. } => {
                "The start cell and terminal states must be row labels of the embedding."
            }
            Error::DuplicateCell { .. } => "Row labels must be unique. De-duplicate cell barcodes.",
            Error::EmptyEmbedding => "Provide at least one cell and one embedding component.",
            Error::NonFiniteValue { .. } => {
                "Remove or impute NaN/infinite embedding values before running the pipeline."
            }
            Error::InvalidParameter { .. } => {
                "Adjust the parameter; see PalantirConfig for valid ranges."
            }
            Error::DegenerateChain { .. } => {
                "A state has no outgoing transitions. Increase k or remove duplicated cells."
            }
            Error::NoTerminalStates { .. } => {
                "Supply terminal states explicitly or increase the number of waypoints."
            }
            Error::SingularFundamentalMatrix { .. } => {
                "Some transient states cannot reach any terminal state. Increase k or add terminal states."
            }
            Error::InsufficientSpectrum { .. } => {
                "Raise eigen_max_iterations or loosen eigen_tolerance, or supply terminal states."
            }
            Error::Config(_) => "Check syntax and value ranges in the configuration file.",
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or restore from backup.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InputShapeMismatch { .. } => "Input Shape Mismatch",
            Error::UnknownCell { .. } => "Unknown Cell",
            Error::DuplicateCell { .. } => "Duplicate Cell Label",
            Error::EmptyEmbedding => "Empty Embedding",
            Error::NonFiniteValue { .. } => "Non-finite Embedding Value",
            Error::InvalidParameter { .. } => "Invalid Parameter",
            Error::DegenerateChain { .. } => "Degenerate Markov Chain",
            Error::NoTerminalStates { .. } => "No Terminal States",
            Error::SingularFundamentalMatrix { .. } => "Singular Fundamental Matrix",
            Error::InsufficientSpectrum { .. } => "Insufficient Spectrum",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., offending state, matrix size).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InputShapeMismatch {
                context: what,
                expected,
                actual,
            } => {
                context.insert("context".to_string(), serde_json::json!(what));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::UnknownCell { label } | Error::DuplicateCell { label } => {
                context.insert("label".to_string(), serde_json::json!(label));
            }
            Error::DegenerateChain {
                state,
                dimension,
                label,
                ..
            } => {
                context.insert("state".to_string(), serde_json::json!(state));
                context.insert("dimension".to_string(), serde_json::json!(dimension));
                if let Some(label) = label {
                    context.insert("label".to_string(), serde_json::json!(label));
                }
            }
            Error::SingularFundamentalMatrix { transient } => {
                context.insert("transient".to_string(), serde_json::json!(transient));
            }
            Error::InsufficientSpectrum {
                requested,
                converged,
                ..
            } => {
                context.insert("requested".to_string(), serde_json::json!(requested));
                context.insert("converged".to_string(), serde_json::json!(converged));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degenerate() -> Error {
        Error::DegenerateChain {
            state: 2,
            dimension: 5,
            label: None,
            reason: "row has zero total affinity".into(),
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(Error::EmptyEmbedding.code(), 13);
        assert_eq!(degenerate().code(), 20);
        assert_eq!(Error::SingularFundamentalMatrix { transient: 4 }.code(), 30);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::UnknownCell { label: "x".into() }.category(),
            ErrorCategory::Input
        );
        assert_eq!(degenerate().category(), ErrorCategory::Graph);
        assert_eq!(
            Error::InsufficientSpectrum {
                requested: 1,
                converged: 0,
                reason: "no convergence".into()
            }
            .category(),
            ErrorCategory::Numerical
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(!Error::DuplicateCell { label: "a".into() }.is_recoverable());
        assert!(degenerate().is_recoverable());
        assert!(Error::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_state_labels_attach() {
        let labels: Vec<CellId> = ["a", "b", "c", "d", "e"].iter().map(|&s| s.into()).collect();
        let err = degenerate().with_state_labels(&labels);
        let msg = err.to_string();
        assert!(msg.contains("state 2 of 5 (c)"), "{msg}");
    }

    #[test]
    fn test_structured_error_from_error() {
        let structured = StructuredError::from(&degenerate());

        assert_eq!(structured.code, 20);
        assert_eq!(structured.category, ErrorCategory::Graph);
        assert!(structured.recoverable);
        assert_eq!(structured.context.get("state"), Some(&serde_json::json!(2)));
        assert_eq!(
            structured.context.get("dimension"),
            Some(&serde_json::json!(5))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::SingularFundamentalMatrix { transient: 12 };
        let json = StructuredError::from(&err).to_json();

        assert!(json.contains(r#""code":30"#));
        assert!(json.contains(r#""category":"numerical""#));
        assert!(json.contains(r#""transient":12"#));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::UnknownCell {
            label: "cell-9".into(),
        };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Unknown Cell"));
        assert!(formatted.contains("cell cell-9 is not present"));
        assert!(formatted.contains("Fix:"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Numerical.to_string(), "numerical");
        assert_eq!(ErrorCategory::Graph.to_string(), "graph");
    }
}
