//! Palantir common types, labels, and errors.
//!
//! This crate provides foundational types shared across pal-core modules:
//! - Cell identity labels
//! - The labeled embedding matrix consumed by the pipeline
//! - Label-indexed series and matrices with alignment helpers
//! - Common error types

pub mod embedding;
pub mod error;
pub mod id;
pub mod matrix;
pub mod series;

pub use embedding::Embedding;
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::CellId;
pub use matrix::LabeledMatrix;
pub use series::LabeledSeries;
