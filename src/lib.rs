//! # sweep-delaunay
//!
//! This is a library for computing the Delaunay triangulation of a set of 2D points using
//! the sweep-hull algorithm: points are sorted by x, a convex hull is grown one point at a
//! time by attaching each new point to every hull edge it can see, and each new triangle is
//! repaired with Lawson edge flips until the empty-circumcircle property holds.
//!
//! # Features
//!
//! - `O(n log n)` expected construction dominated by the initial sort
//! - Flat `[a, b, c, ...]` triangle output with parallel neighbor adjacency
//! - Counter-clockwise convex hull export
//! - Floating-point predicates guarded by static error bounds
//! - Configurable jitter, legalization mode and per-step validation
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use sweep_delaunay::prelude::*;
//!
//! let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.4]];
//! let dt = triangulate(&points).unwrap();
//!
//! // 2n - 2 - h triangles, where h is the number of hull vertices.
//! assert_eq!(dt.number_of_triangles(), 2 * 5 - 2 - dt.hull().len());
//! assert!(dt.is_valid().is_ok());
//! assert!(dt.validate_delaunay().is_ok());
//! ```
//!
//! # Index convention
//!
//! Before the sweep, every coordinate receives a small random perturbation (see
//! [`SweepConfig::jitter`](core::config::SweepConfig::jitter)) and the points are stably
//! sorted by x. Triangle indices refer to this sorted buffer, available through
//! [`Triangulation::points`](core::triangulation::Triangulation::points). The sort
//! permutation is kept, so indices can be mapped back to the caller's ordering:
//!
//! ```rust
//! use sweep_delaunay::prelude::*;
//!
//! let points = [[2.0, 0.0], [0.0, 0.0], [1.0, 2.0]];
//! let dt = Triangulation::new_with_config(&points, &SweepConfig::exact()).unwrap();
//! assert_eq!(dt.original_indices(), &[1, 2, 0]);
//!
//! let mut input_order = dt.triangles_in_input_order();
//! input_order.sort_unstable();
//! assert_eq!(input_order, vec![0, 1, 2]);
//! ```
//!
//! # Triangulation Invariants
//!
//! | Invariant | Helper method |
//! |---|---|
//! | Indices in range, no repeated vertex | [`Triangulation::validate_indices`](core::triangulation::Triangulation::validate_indices) |
//! | Mutual neighbor links across a shared edge | [`Triangulation::validate_neighbors`](core::triangulation::Triangulation::validate_neighbors) |
//! | No duplicate triangles | [`Triangulation::validate_no_duplicate_triangles`](core::triangulation::Triangulation::validate_no_duplicate_triangles) |
//! | Empty circumcircles | [`Triangulation::validate_delaunay`](core::triangulation::Triangulation::validate_delaunay) |
//!
//! [`Triangulation::is_valid`](core::triangulation::Triangulation::is_valid) runs the structural
//! checks; the Delaunay check is `O(triangles × points)` and is run separately.
//!
//! # Degenerate input
//!
//! Predicates report values within their rounding-error bound as degenerate: a point on a
//! hull edge's line is not visible from it, and a point on a circumcircle does not make an
//! edge illegal. With jitter disabled, an exact duplicate, or a point collinear with a
//! degenerate seed, sees no hull edge and construction fails with
//! [`SweepError::InvisiblePoint`](core::algorithms::incremental_insertion::SweepError::InvisiblePoint).

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the sweep, its data structures and the finished
/// [`Triangulation`](core::triangulation::Triangulation).
pub mod core {
    /// Construction algorithms
    pub mod algorithms {
        /// Edge flips and legalization
        pub mod flips;
        /// Sweep-hull incremental construction
        pub mod incremental_insertion;
        pub use flips::*;
        pub use incremental_insertion::*;
    }
    pub mod boundary;
    pub mod config;
    pub mod triangle_store;
    pub mod triangulation;
    pub mod util;

    pub use algorithms::*;
    pub use boundary::*;
    pub use config::*;
    pub use triangle_store::*;
    pub use triangulation::*;
    pub use util::*;
}

/// Contains geometric types, predicates and point preparation.
pub mod geometry {
    pub mod point_buffer;
    pub mod predicates;
    pub mod util;

    pub use point_buffer::*;
    pub use predicates::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types and functions.
pub mod prelude {
    pub use crate::core::{
        algorithms::incremental_insertion::{SweepError, SweepStatistics},
        config::{Legalization, SweepConfig, SweepConfigBuilder},
        triangle_store::NO_NEIGHBOR,
        triangulation::Triangulation,
        util::{DelaunayValidationError, TriangulationValidationError},
    };
    pub use crate::geometry::{
        point_buffer::PointBuffer,
        predicates::{InCircle, Orientation, in_circle, is_on_right_side, orientation},
        util::*,
    };
    pub use crate::triangulate;
}

use crate::core::algorithms::incremental_insertion::SweepError;
use crate::core::triangulation::Triangulation;

/// Triangulate `points` with the default configuration.
///
/// # Errors
///
/// Returns a [`SweepError`] if the input contains non-finite coordinates or if
/// construction fails.
///
/// # Examples
///
/// ```rust
/// let dt = sweep_delaunay::triangulate(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
/// assert_eq!(dt.number_of_triangles(), 1);
/// ```
pub fn triangulate(points: &[[f64; 2]]) -> Result<Triangulation, SweepError> {
    Triangulation::new(points)
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            boundary::Hull, config::SweepConfig, triangle_store::TriangleStore,
            triangulation::Triangulation,
        },
        geometry::point_buffer::PointBuffer,
        is_normal,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Triangulation>());
        assert!(is_normal::<PointBuffer>());
        assert!(is_normal::<SweepConfig>());
        assert!(is_normal::<TriangleStore>());
        assert!(is_normal::<Hull>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let points = generate_random_points_seeded(50, (-1.0, 1.0), 3).unwrap();
        let config = SweepConfigBuilder::default().seed(3).build().unwrap();
        let dt = Triangulation::new_with_config(&points, &config).unwrap();
        assert!(dt.is_valid().is_ok());
        assert_eq!(
            Orientation::from_value(orientation([0.0, 0.0], [1.0, 0.0], [0.0, 1.0])),
            Orientation::POSITIVE
        );
        assert!(triangulate(&points).is_ok());
    }
}
