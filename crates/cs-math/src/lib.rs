//! CrowdSense math utilities.

pub mod math;

pub use math::decay::*;
pub use math::mean::*;
