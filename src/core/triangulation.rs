//! The finished triangulation and its query and validation API.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::core::algorithms::incremental_insertion::{SweepError, SweepStatistics, sweep};
use crate::core::config::SweepConfig;
use crate::core::triangle_store::NO_NEIGHBOR;
use crate::core::util::delaunay_validation::{
    TriangulationValidationError, find_delaunay_violations,
    validate_delaunay, validate_indices, validate_neighbors, validate_no_duplicate_triangles,
};
use crate::geometry::point_buffer::PointBuffer;

/// A 2D Delaunay triangulation built by the sweep-hull algorithm.
///
/// Triangle indices refer to positions in [`Triangulation::points`], the
/// sorted (and possibly jittered) buffer the sweep consumed. Use
/// [`Triangulation::original_index`] or
/// [`Triangulation::triangles_in_input_order`] to map back to the caller's
/// ordering.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::config::SweepConfig;
/// use sweep_delaunay::core::triangulation::Triangulation;
///
/// let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
/// let dt = Triangulation::new_with_config(&points, &SweepConfig::exact()).unwrap();
///
/// assert_eq!(dt.number_of_triangles(), 2);
/// assert_eq!(dt.hull().len(), 4);
/// assert!(dt.is_valid().is_ok());
/// assert!(dt.validate_delaunay().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TriangulationParts")]
pub struct Triangulation {
    points: PointBuffer,
    triangles: Vec<usize>,
    neighbors: Vec<usize>,
    hull: Vec<usize>,
    statistics: SweepStatistics,
}

/// Unchecked serialized form of a [`Triangulation`].
#[derive(Deserialize)]
struct TriangulationParts {
    points: PointBuffer,
    triangles: Vec<usize>,
    neighbors: Vec<usize>,
    hull: Vec<usize>,
    statistics: SweepStatistics,
}

impl TryFrom<TriangulationParts> for Triangulation {
    type Error = TriangulationValidationError;

    /// Deserialized arrays must index the buffer and link symmetrically.
    fn try_from(parts: TriangulationParts) -> Result<Self, Self::Error> {
        let n = parts.points.len();
        validate_neighbors(&parts.triangles, &parts.neighbors)?;
        validate_indices(&parts.triangles, n)?;
        if let Some(&index) = parts.hull.iter().find(|&&v| v >= n) {
            return Err(TriangulationValidationError::HullIndexOutOfRange { index, points: n });
        }
        Ok(Self {
            points: parts.points,
            triangles: parts.triangles,
            neighbors: parts.neighbors,
            hull: parts.hull,
            statistics: parts.statistics,
        })
    }
}

impl Triangulation {
    /// Triangulate `points` with the default [`SweepConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`SweepError`] if the input contains non-finite coordinates
    /// or if construction fails.
    pub fn new(points: &[[f64; 2]]) -> Result<Self, SweepError> {
        Self::new_with_config(points, &SweepConfig::default())
    }

    /// Triangulate `points`: jitter, sort by x, pack, then sweep.
    ///
    /// # Errors
    ///
    /// Returns a [`SweepError`] if the input contains non-finite coordinates
    /// or if construction fails.
    pub fn new_with_config(points: &[[f64; 2]], config: &SweepConfig) -> Result<Self, SweepError> {
        let buffer = PointBuffer::prepare(points, config)?;
        Self::from_buffer(buffer, config)
    }

    /// Triangulate an already prepared buffer. The config's jitter and seed
    /// are not used.
    ///
    /// # Errors
    ///
    /// Returns a [`SweepError`] if construction fails.
    pub fn from_buffer(points: PointBuffer, config: &SweepConfig) -> Result<Self, SweepError> {
        let output = sweep(&points, config)?;
        Ok(Self {
            points,
            triangles: output.triangles,
            neighbors: output.neighbors,
            hull: output.hull,
            statistics: output.statistics,
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Flat `[a0, b0, c0, a1, ...]` counter-clockwise triangles.
    #[must_use]
    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    /// Flat neighbor triples parallel to [`Triangulation::triangles`]. Slot
    /// `k` of triangle `t` is the triangle across edge `(v[k], v[k+1])`, or
    /// [`NO_NEIGHBOR`] on the hull.
    #[must_use]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Number of triangles.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of input points.
    #[must_use]
    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    /// The sorted point buffer that triangle indices refer to.
    #[must_use]
    pub const fn points(&self) -> &PointBuffer {
        &self.points
    }

    /// Vertices of triangle `t`, if it exists.
    #[must_use]
    pub fn triangle(&self, t: usize) -> Option<[usize; 3]> {
        let end = t.checked_mul(3)?.checked_add(3)?;
        let tri = self.triangles.get(end - 3..end)?;
        Some([tri[0], tri[1], tri[2]])
    }

    /// Neighbors of triangle `t`, if it exists. Hull edges yield `None`.
    #[must_use]
    pub fn triangle_neighbors(&self, t: usize) -> Option<[Option<usize>; 3]> {
        let end = t.checked_mul(3)?.checked_add(3)?;
        let adj = self.neighbors.get(end - 3..end)?;
        Some([adj[0], adj[1], adj[2]].map(|o| (o != NO_NEIGHBOR).then_some(o)))
    }

    /// Hull vertices in counter-clockwise order.
    #[must_use]
    pub fn hull(&self) -> &[usize] {
        &self.hull
    }

    /// Construction counters.
    #[must_use]
    pub const fn statistics(&self) -> &SweepStatistics {
        &self.statistics
    }

    /// For each buffer position, the index of the point in the caller's input.
    #[must_use]
    pub fn original_indices(&self) -> &[usize] {
        self.points.original_indices()
    }

    /// Index in the caller's input of buffer point `i`.
    #[must_use]
    pub fn original_index(&self, i: usize) -> Option<usize> {
        self.points.original_index(i)
    }

    /// Triangles with every index mapped back to the caller's input order.
    #[must_use]
    pub fn triangles_in_input_order(&self) -> Vec<usize> {
        let order = self.points.original_indices();
        self.triangles.iter().map(|&v| order[v]).collect()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Check that every triangle index is in range and no triangle repeats a
    /// vertex.
    ///
    /// # Errors
    ///
    /// Returns the first offending triangle.
    pub fn validate_indices(&self) -> Result<(), TriangulationValidationError> {
        validate_indices(&self.triangles, self.points.len())
    }

    /// Check neighbor symmetry.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistent link.
    pub fn validate_neighbors(&self) -> Result<(), TriangulationValidationError> {
        validate_neighbors(&self.triangles, &self.neighbors)
    }

    /// Check that no triangle appears twice.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate pair.
    pub fn validate_no_duplicate_triangles(&self) -> Result<(), TriangulationValidationError> {
        validate_no_duplicate_triangles(&self.triangles)
    }

    /// Check the empty-circumcircle property against every point.
    ///
    /// This is `O(triangles × points)`.
    ///
    /// # Errors
    ///
    /// Returns an index error for malformed triangles, otherwise the first
    /// violation found.
    pub fn validate_delaunay(&self) -> Result<(), TriangulationValidationError> {
        validate_delaunay(&self.triangles, &self.points)
    }

    /// All `(triangle, point)` pairs violating the empty-circumcircle property.
    #[must_use]
    pub fn find_delaunay_violations(&self) -> Vec<(usize, usize)> {
        find_delaunay_violations(&self.triangles, &self.points)
    }

    /// Run all structural checks (indices, neighbors, duplicates).
    ///
    /// A triangle count that differs from `2n − 2 − h` is logged as a warning
    /// rather than reported, since collinear hull points legitimately change
    /// it.
    ///
    /// # Errors
    ///
    /// Returns the first structural failure.
    pub fn is_valid(&self) -> Result<(), TriangulationValidationError> {
        self.validate_indices()?;
        self.validate_neighbors()?;
        self.validate_no_duplicate_triangles()?;

        let n = self.points.len();
        if n >= 3 {
            let expected = (2 * n).saturating_sub(2 + self.hull.len());
            if self.number_of_triangles() != expected {
                tracing::warn!(
                    points = n,
                    hull = self.hull.len(),
                    triangles = self.number_of_triangles(),
                    expected,
                    "triangle count differs from 2n - 2 - h"
                );
            }
        }
        Ok(())
    }
}
