//! Core math modules.

pub mod distance;
pub mod entropy;
pub mod normal;
pub mod stats;
