//! Point-set utilities for tests, benchmarks and examples.

pub mod point_generation;

pub use point_generation::*;
