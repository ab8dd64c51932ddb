//! Sweep-hull incremental construction.
//!
//! Points are consumed in ascending x order from a [`PointBuffer`]. The first
//! three seed a triangle; every later point lies outside the current hull, so
//! it is connected to each hull edge it can see, the hull is updated around
//! it, and each new triangle is legalized against the triangle behind the
//! edge it was built on.
//!
//! # Hull update
//!
//! For a point `i` and a visible hull edge `e = (from, to)`:
//!
//! 1. triangle `(to, from, i)` is appended and linked to the triangle owning `e`;
//! 2. `e` is removed from the hull;
//! 3. the lower edge `(from, i)` is inserted, unless the edge before `e` is
//!    `(i, from)`, in which case that edge is consumed instead (a collapse) and
//!    the two triangles are linked across it;
//! 4. the upper edge `(i, to)` is handled symmetrically against the edge
//!    after `e`.
//!
//! Visibility is decided on a snapshot of the hull taken before the point is
//! processed, so edges created for `i` are never tested against `i`.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::flips::{FlipError, Legalizer};
use crate::core::boundary::{Hull, HullEdgeKey, HullError};
use crate::core::config::SweepConfig;
use crate::core::triangle_store::{TriangleStore, TriangleStoreError, max_triangles};
use crate::geometry::point_buffer::{PointBuffer, PointBufferError};
use crate::geometry::predicates::is_on_right_side;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors that abort a sweep.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum SweepError {
    /// The input points could not be prepared.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] PointBufferError),
    /// A point lies strictly right of no hull edge. This happens for exact
    /// duplicates and for points out of x order.
    #[error("Point {point} sees no hull edge (duplicate or unsorted input)")]
    InvisiblePoint {
        /// Buffer index of the point
        point: usize,
    },
    /// A hull edge is tagged with a triangle that does not contain it.
    #[error("Hull edge ({from},{to}) is tagged with triangle {triangle}, which does not contain it")]
    StaleHullTag {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
        /// Recorded tag
        triangle: usize,
    },
    /// The hull cycle is corrupted.
    #[error("Hull error: {0}")]
    Hull(#[from] HullError),
    /// Edge legalization failed.
    #[error("Legalization error: {0}")]
    Flip(#[from] FlipError),
    /// The triangle store rejected an operation.
    #[error("Triangle store error: {0}")]
    Store(#[from] TriangleStoreError),
    /// A point index outside the buffer was passed to [`HullSweep::insert`].
    #[error("Point {point} is out of range for a buffer of {points} points")]
    PointOutOfRange {
        /// Requested index
        point: usize,
        /// Number of points in the buffer
        points: usize,
    },
    /// A point was passed to [`HullSweep::insert`] twice, or is a seed point.
    #[error("Point {point} is already part of the triangulation")]
    AlreadyInserted {
        /// Requested index
        point: usize,
    },
    /// A sweep cannot be seeded from fewer than three points.
    #[error("Cannot seed a sweep from {count} points")]
    TooFewPoints {
        /// Number of points available
        count: usize,
    },
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Counters describing one construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStatistics {
    /// Number of input points.
    pub points: usize,
    /// Number of output triangles.
    pub triangles: usize,
    /// Number of vertices on the final hull.
    pub hull_size: usize,
    /// Total edge flips performed by legalization.
    pub flips: usize,
    /// Total edges examined by legalization.
    pub edges_checked: usize,
    /// Hull edges consumed by a collapse instead of being inserted.
    pub collapses: usize,
    /// Largest legalization queue observed.
    pub max_queue_len: usize,
}

/// Raw result of a sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepOutput {
    /// Flat `[a0, b0, c0, a1, ...]` counter-clockwise triangles.
    pub triangles: Vec<usize>,
    /// Flat neighbor triples parallel to `triangles`.
    pub neighbors: Vec<usize>,
    /// Hull vertices, counter-clockwise.
    pub hull: Vec<usize>,
    /// Construction counters.
    pub statistics: SweepStatistics,
}

// =============================================================================
// SWEEP
// =============================================================================

/// In-progress sweep over a point buffer.
///
/// Most callers want [`sweep`]; this type exposes the individual steps for
/// inspection and testing.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::algorithms::incremental_insertion::HullSweep;
/// use sweep_delaunay::core::config::SweepConfig;
/// use sweep_delaunay::geometry::point_buffer::PointBuffer;
///
/// let buffer = PointBuffer::from_packed(vec![0.0, 0.0, 1.0, 1.0, 2.0, 0.0, 3.0, 1.0]).unwrap();
/// let mut sweep = HullSweep::new(&buffer, &SweepConfig::exact()).unwrap();
/// assert_eq!(sweep.store().len(), 1);
/// sweep.insert(3).unwrap();
/// assert_eq!(sweep.store().len(), 2);
/// assert_eq!(sweep.hull().len(), 4);
/// ```
#[derive(Debug)]
pub struct HullSweep<'a> {
    points: &'a PointBuffer,
    store: TriangleStore,
    hull: Hull,
    legalizer: Legalizer,
    validate_steps: bool,
    inserted: Vec<bool>,
    collapses: usize,
}

impl<'a> HullSweep<'a> {
    /// Seed the sweep with the first three points of `points`.
    ///
    /// If point 2 lies strictly right of `0 → 1` the seed triangle is
    /// `(1, 0, 2)`, otherwise `(0, 1, 2)`.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::TooFewPoints`] if the buffer holds fewer than
    /// three points.
    pub fn new(points: &'a PointBuffer, config: &SweepConfig) -> Result<Self, SweepError> {
        if points.len() < 3 {
            return Err(SweepError::TooFewPoints {
                count: points.len(),
            });
        }
        let mut store = TriangleStore::with_capacity(max_triangles(points.len()));
        let (a, b) = if is_on_right_side(points.point(0), points.point(1), points.point(2)) {
            (1, 0)
        } else {
            (0, 1)
        };
        let seed = store.push(a, b, 2)?;
        let hull = Hull::from_triangle(a, b, 2, seed);
        tracing::trace!(seed = ?store.vertices(seed), "seeded sweep");
        let mut inserted = vec![false; points.len()];
        inserted[..3].fill(true);

        Ok(Self {
            points,
            store,
            hull,
            legalizer: Legalizer::new(config.legalization),
            validate_steps: config.validate_steps,
            inserted,
            collapses: 0,
        })
    }

    /// The triangles built so far.
    #[must_use]
    pub const fn store(&self) -> &TriangleStore {
        &self.store
    }

    /// The current hull.
    #[must_use]
    pub const fn hull(&self) -> &Hull {
        &self.hull
    }

    /// Add point `i`, which must lie outside the current hull.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::PointOutOfRange`] or
    /// [`SweepError::AlreadyInserted`] for an index that cannot be added,
    /// [`SweepError::InvisiblePoint`] if no hull edge is visible from `i`, or
    /// any error raised by the hull, the store or legalization.
    pub fn insert(&mut self, i: usize) -> Result<(), SweepError> {
        match self.inserted.get(i) {
            None => {
                return Err(SweepError::PointOutOfRange {
                    point: i,
                    points: self.points.len(),
                });
            }
            Some(true) => return Err(SweepError::AlreadyInserted { point: i }),
            Some(false) => {}
        }
        let p = self.points.point(i);
        let mut visible = 0;

        for key in self.hull.keys_from_root()? {
            let edge = *self.hull.get(key)?;
            if !is_on_right_side(self.points.point(edge.from), self.points.point(edge.to), p) {
                continue;
            }
            visible += 1;
            self.attach(key, i)?;
        }

        if visible == 0 {
            return Err(SweepError::InvisiblePoint { point: i });
        }
        self.inserted[i] = true;
        if self.validate_steps {
            self.hull.validate()?;
            self.hull.validate_tags(&self.store)?;
        }
        tracing::trace!(point = i, visible, hull = %self.hull, "inserted point");
        Ok(())
    }

    /// Build the triangle on visible edge `key` toward point `i`, update the
    /// hull around it and legalize it.
    fn attach(&mut self, key: HullEdgeKey, i: usize) -> Result<(), SweepError> {
        let edge = *self.hull.get(key)?;
        let (from, to, old) = (edge.from, edge.to, edge.triangle);
        let old_slot = self.owned_slot(old, from, to)?;

        let t = self.store.push(to, from, i)?;
        self.store.link(t, 0, old, old_slot);
        self.hull.unlink(key)?;

        let prev = self.hull.get(edge.prev())?;
        let anchor = if prev.is(i, from) {
            let (prev_tri, prev_prev) = (prev.triangle, prev.prev());
            let slot = self.owned_slot(prev_tri, i, from)?;
            self.store.link(t, 1, prev_tri, slot);
            self.hull.unlink(edge.prev())?;
            self.collapses += 1;
            prev_prev
        } else {
            self.hull.insert_after(edge.prev(), from, i, t)?
        };

        let next = self.hull.get(edge.next())?;
        if next.is(to, i) {
            let next_tri = next.triangle;
            let slot = self.owned_slot(next_tri, to, i)?;
            self.store.link(t, 2, next_tri, slot);
            self.hull.unlink(edge.next())?;
            self.collapses += 1;
        } else {
            self.hull.insert_after(anchor, i, to, t)?;
        }

        self.legalizer
            .legalize(&mut self.store, &mut self.hull, self.points, t, 0)?;
        Ok(())
    }

    /// Slot of hull edge `from → to` in its tagged triangle.
    fn owned_slot(&self, triangle: usize, from: usize, to: usize) -> Result<usize, SweepError> {
        let stale = SweepError::StaleHullTag { from, to, triangle };
        if triangle >= self.store.len() {
            return Err(stale);
        }
        self.store.edge_slot(triangle, from, to).ok_or(stale)
    }

    /// Validate the final hull and hand back the arrays.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Hull`] if the hull cycle or its tags are
    /// inconsistent.
    pub fn finish(self) -> Result<SweepOutput, SweepError> {
        self.hull.validate()?;
        self.hull.validate_tags(&self.store)?;

        let stats = self.legalizer.stats();
        let statistics = SweepStatistics {
            points: self.points.len(),
            triangles: self.store.len(),
            hull_size: self.hull.len(),
            flips: stats.flips_performed,
            edges_checked: stats.edges_checked,
            collapses: self.collapses,
            max_queue_len: stats.max_queue_len,
        };
        let hull = self.hull.vertices();
        let (triangles, neighbors) = self.store.into_parts();
        Ok(SweepOutput {
            triangles,
            neighbors,
            hull,
            statistics,
        })
    }
}

/// Triangulate an x-sorted point buffer.
///
/// Fewer than three points yield an empty output.
///
/// # Errors
///
/// Returns a [`SweepError`] if a point cannot be attached to the hull or if
/// an internal consistency check fails.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::algorithms::incremental_insertion::sweep;
/// use sweep_delaunay::core::config::SweepConfig;
/// use sweep_delaunay::geometry::point_buffer::PointBuffer;
///
/// let buffer = PointBuffer::from_packed(vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
/// let output = sweep(&buffer, &SweepConfig::exact()).unwrap();
/// assert_eq!(output.triangles.len(), 6);
/// assert_eq!(output.statistics.hull_size, 4);
/// ```
pub fn sweep(points: &PointBuffer, config: &SweepConfig) -> Result<SweepOutput, SweepError> {
    if points.len() < 3 {
        tracing::debug!(points = points.len(), "fewer than three points, nothing to triangulate");
        return Ok(SweepOutput {
            statistics: SweepStatistics {
                points: points.len(),
                ..SweepStatistics::default()
            },
            ..SweepOutput::default()
        });
    }

    tracing::debug!(
        points = points.len(),
        legalization = %config.legalization,
        "starting sweep"
    );
    let mut hull_sweep = HullSweep::new(points, config)?;
    for i in 3..points.len() {
        hull_sweep.insert(i)?;
    }
    let output = hull_sweep.finish()?;
    tracing::debug!(statistics = ?output.statistics, "sweep finished");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Legalization;
    use crate::core::triangle_store::NO_NEIGHBOR;

    fn buffer(points: &[[f64; 2]]) -> PointBuffer {
        PointBuffer::prepare(points, &SweepConfig::exact()).unwrap()
    }

    fn assert_symmetric(output: &SweepOutput) {
        let n_tri = output.triangles.len() / 3;
        for t in 0..n_tri {
            for k in 0..3 {
                let o = output.neighbors[3 * t + k];
                if o == NO_NEIGHBOR {
                    continue;
                }
                assert!(o < n_tri);
                assert!(
                    (0..3).any(|m| output.neighbors[3 * o + m] == t),
                    "neighbor {o} of {t} does not link back"
                );
            }
        }
    }

    #[test]
    fn test_seed_orientation() {
        // Point 2 is right of 0 -> 1, so the seed is reversed.
        let points = buffer(&[[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]);
        let sweep = HullSweep::new(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(sweep.store().vertices(0), [1, 0, 2]);
        assert_eq!(sweep.hull().vertices(), vec![1, 0, 2]);

        let points = buffer(&[[0.0, 0.0], [1.0, -1.0], [2.0, 0.0]]);
        let sweep = HullSweep::new(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(sweep.store().vertices(0), [0, 1, 2]);
    }

    #[test]
    fn test_fewer_than_three_points() {
        for points in [vec![], vec![[0.0, 0.0]], vec![[0.0, 0.0], [1.0, 1.0]]] {
            let output = sweep(&buffer(&points), &SweepConfig::exact()).unwrap();
            assert!(output.triangles.is_empty());
            assert!(output.hull.is_empty());
            assert_eq!(output.statistics.points, points.len());
        }
    }

    #[test]
    fn test_seeding_needs_three_points() {
        let points = buffer(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            HullSweep::new(&points, &SweepConfig::exact()),
            Err(SweepError::TooFewPoints { count: 2 })
        ));
    }

    #[test]
    fn test_insert_rejects_bad_indices() {
        let points = buffer(&[[0.0, 0.0], [1.0, 1.0], [2.0, -1.0], [3.0, 0.5]]);
        let mut hull_sweep = HullSweep::new(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(
            hull_sweep.insert(4),
            Err(SweepError::PointOutOfRange { point: 4, points: 4 })
        );
        assert_eq!(
            hull_sweep.insert(usize::MAX),
            Err(SweepError::PointOutOfRange {
                point: usize::MAX,
                points: 4
            })
        );
        assert_eq!(hull_sweep.insert(1), Err(SweepError::AlreadyInserted { point: 1 }));

        hull_sweep.insert(3).unwrap();
        let triangles = hull_sweep.store().len();
        assert_eq!(hull_sweep.insert(3), Err(SweepError::AlreadyInserted { point: 3 }));
        assert_eq!(hull_sweep.store().len(), triangles);
        hull_sweep.hull().validate().unwrap();
    }

    #[test]
    fn test_single_triangle() {
        let output = sweep(&buffer(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]), &SweepConfig::exact())
            .unwrap();
        assert_eq!(output.triangles.len(), 3);
        assert_eq!(output.neighbors, vec![NO_NEIGHBOR; 3]);
        assert_eq!(output.statistics.flips, 0);
        assert_eq!(output.statistics.hull_size, 3);
    }

    #[test]
    fn test_collapse_links_triangles() {
        // Point 3 sees two hull edges; the second attachment consumes the
        // upper edge created by the first, swallowing point 2 into the hull.
        let points = buffer(&[[0.0, 0.0], [1.0, 2.0], [1.5, -2.0], [3.0, -5.0]]);
        let output = sweep(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(output.triangles.len(), 9);
        assert_eq!(output.statistics.collapses, 1);
        assert_eq!(output.statistics.hull_size, 3);
        assert!(!output.hull.contains(&2));
        assert_symmetric(&output);
    }

    #[test]
    fn test_flip_produces_delaunay_diagonal() {
        // The sweep attaches point 3 across the long edge 1-2, which is then
        // flipped to the short diagonal 0-3.
        let points = buffer(&[[0.0, 0.0], [1.0, 5.0], [1.1, -5.0], [2.0, 0.0]]);
        let output = sweep(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(output.triangles.len(), 9);
        assert_eq!(output.statistics.flips, 1);
        for tri in output.triangles.chunks_exact(3) {
            assert!(tri.contains(&0) && tri.contains(&3), "triangle {tri:?}");
        }
        assert_symmetric(&output);
    }

    #[test]
    fn test_duplicate_point_is_invisible() {
        let points = buffer(&[[0.0, 0.0], [1.0, 1.0], [2.0, 0.0], [2.0, 0.0]]);
        assert_eq!(
            sweep(&points, &SweepConfig::exact()),
            Err(SweepError::InvisiblePoint { point: 3 })
        );
    }

    #[test]
    fn test_validate_steps_and_single_check() {
        let points: Vec<[f64; 2]> = (0..20_u32)
            .map(|k| {
                let x = f64::from(k);
                [x, (x * 1.7).sin() * 3.0]
            })
            .collect();
        let config = SweepConfig {
            validate_steps: true,
            legalization: Legalization::SingleCheck,
            ..SweepConfig::exact()
        };
        let output = sweep(&buffer(&points), &config).unwrap();
        let h = output.statistics.hull_size;
        assert_eq!(output.triangles.len() / 3, 2 * points.len() - 2 - h);
        assert_eq!(output.statistics.max_queue_len, 0);
        assert_symmetric(&output);
    }
}
