//! Random and structured 2D point generation.
//!
//! These helpers produce reproducible point sets for tests, benchmarks and
//! regression cases.

use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Errors that can occur while generating point sets.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RandomPointGenerationError {
    /// Coordinate range is empty or inverted.
    #[error("Invalid coordinate range: min {min} must be less than max {max}")]
    InvalidRange {
        /// Lower end of the requested range
        min: f64,
        /// Upper end of the requested range
        max: f64,
    },
    /// Polygon needs at least three vertices and a positive radius.
    #[error("Invalid regular polygon: {sides} sides with radius {radius}")]
    InvalidPolygon {
        /// Requested number of sides
        sides: usize,
        /// Requested circumradius
        radius: f64,
    },
}

fn check_range(range: (f64, f64)) -> Result<(), RandomPointGenerationError> {
    // Written so that NaN bounds are rejected as well.
    if range.0 < range.1 {
        Ok(())
    } else {
        Err(RandomPointGenerationError::InvalidRange {
            min: range.0,
            max: range.1,
        })
    }
}

/// Generate `n_points` uniformly distributed points using the thread RNG.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidRange` if min >= max
pub fn generate_random_points(
    n_points: usize,
    range: (f64, f64),
) -> Result<Vec<[f64; 2]>, RandomPointGenerationError> {
    check_range(range)?;
    let mut rng = rand::rng();
    Ok((0..n_points)
        .map(|_| {
            [
                rng.random_range(range.0..range.1),
                rng.random_range(range.0..range.1),
            ]
        })
        .collect())
}

/// Generate random points with a seeded RNG for reproducible results.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidRange` if min >= max
///
/// # Examples
///
/// ```
/// use sweep_delaunay::geometry::util::generate_random_points_seeded;
///
/// let points1 = generate_random_points_seeded(100, (-5.0, 5.0), 42).unwrap();
/// let points2 = generate_random_points_seeded(100, (-5.0, 5.0), 42).unwrap();
/// assert_eq!(points1, points2);
///
/// let points3 = generate_random_points_seeded(100, (-5.0, 5.0), 123).unwrap();
/// assert_ne!(points1, points3);
/// ```
pub fn generate_random_points_seeded(
    n_points: usize,
    range: (f64, f64),
    seed: u64,
) -> Result<Vec<[f64; 2]>, RandomPointGenerationError> {
    check_range(range)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Ok((0..n_points)
        .map(|_| {
            [
                rng.random_range(range.0..range.1),
                rng.random_range(range.0..range.1),
            ]
        })
        .collect())
}

/// Vertices of a regular polygon centered at `center`, counter-clockwise,
/// starting at angle `phase` (radians).
///
/// All returned points are co-circular, which makes this the canonical
/// degenerate input for in-circle tie handling.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidPolygon` if `sides < 3` or the
///   radius is not a positive finite number
///
/// # Examples
///
/// ```
/// use sweep_delaunay::geometry::util::generate_regular_polygon;
///
/// let pentagon = generate_regular_polygon(5, [0.0, 0.0], 1.0, 0.0).unwrap();
/// assert_eq!(pentagon.len(), 5);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn generate_regular_polygon(
    sides: usize,
    center: [f64; 2],
    radius: f64,
    phase: f64,
) -> Result<Vec<[f64; 2]>, RandomPointGenerationError> {
    if sides < 3 || !radius.is_finite() || radius <= 0.0 {
        return Err(RandomPointGenerationError::InvalidPolygon { sides, radius });
    }
    let step = std::f64::consts::TAU / sides as f64;
    Ok((0..sides)
        .map(|k| {
            let angle = phase + step * k as f64;
            [
                radius.mul_add(angle.cos(), center[0]),
                radius.mul_add(angle.sin(), center[1]),
            ]
        })
        .collect())
}

/// Points of an `nx × ny` axis-aligned grid with the given spacing.
///
/// Grids are maximally degenerate (collinear rows, co-circular cells) and are
/// intended to be triangulated with jitter enabled.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn generate_grid_points(nx: usize, ny: usize, spacing: f64, origin: [f64; 2]) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            points.push([
                spacing.mul_add(i as f64, origin[0]),
                spacing.mul_add(j as f64, origin[1]),
            ]);
        }
    }
    points
}
