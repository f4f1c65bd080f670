//! Palantir math utilities.

pub mod math;

pub use math::distance::*;
pub use math::entropy::*;
pub use math::normal::*;
pub use math::stats::*;
