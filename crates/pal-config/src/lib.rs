//! Palantir configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`PalantirConfig`] with built-in defaults
//! - TOML and JSON loading chosen by file extension
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation

pub mod config;
pub mod resolve;
pub mod validate;

pub use config::PalantirConfig;
pub use resolve::{resolve_config, ConfigSource, ResolvedConfig};
pub use validate::{ValidationError, ValidationResult};
