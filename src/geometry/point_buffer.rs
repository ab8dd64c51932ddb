//! Packed coordinate buffer consumed by the sweep.
//!
//! The sweep reads points by index from a single `[x0, y0, x1, y1, ...]`
//! buffer that is sorted by ascending x. This module owns the three simple
//! preparation steps (jitter, stable sort by x, packing) and remembers the sort
//! permutation so that results can be mapped back to the caller's ordering.

#![forbid(unsafe_code)]

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{JITTER_RELATIVE_FLOOR, SweepConfig};

/// Errors raised while building a [`PointBuffer`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PointBufferError {
    /// A coordinate is NaN or infinite.
    #[error("Point {index} has a non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// Index of the point in the caller's input
        index: usize,
        /// x coordinate
        x: f64,
        /// y coordinate
        y: f64,
    },
    /// A packed buffer must hold an even number of values.
    #[error("Packed coordinate buffer has odd length {len}")]
    OddLength {
        /// Length of the rejected buffer
        len: usize,
    },
    /// A packed buffer passed as pre-sorted is not sorted by x.
    #[error("Packed coordinate buffer is not sorted by x at point {index}")]
    Unsorted {
        /// First point whose x is smaller than its predecessor's
        index: usize,
    },
    /// The recorded permutation does not have one entry per point.
    #[error("Permutation has {indices} entries for {points} points")]
    PermutationLength {
        /// Number of points in the buffer
        points: usize,
        /// Number of permutation entries
        indices: usize,
    },
    /// A permutation entry is out of range or repeated.
    #[error("Permutation entry {position} ({index}) is out of range or repeated")]
    InvalidPermutation {
        /// Buffer position of the bad entry
        position: usize,
        /// The entry itself
        index: usize,
    },
}

/// Sorted, jittered and packed coordinates.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::config::SweepConfig;
/// use sweep_delaunay::geometry::point_buffer::PointBuffer;
///
/// let buffer = PointBuffer::prepare(&[[2.0, 0.0], [0.0, 0.0], [1.0, 1.0]], &SweepConfig::exact())
///     .unwrap();
/// assert_eq!(buffer.coords(), &[0.0, 0.0, 1.0, 1.0, 2.0, 0.0]);
/// assert_eq!(buffer.original_indices(), &[1, 2, 0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PackedPoints")]
pub struct PointBuffer {
    coords: Vec<f64>,
    original_indices: Vec<usize>,
}

/// Unchecked serialized form of a [`PointBuffer`].
#[derive(Deserialize)]
struct PackedPoints {
    coords: Vec<f64>,
    original_indices: Vec<usize>,
}

impl TryFrom<PackedPoints> for PointBuffer {
    type Error = PointBufferError;

    fn try_from(raw: PackedPoints) -> Result<Self, Self::Error> {
        let mut buffer = Self::from_packed(raw.coords)?;
        validate_permutation(&raw.original_indices, buffer.len())?;
        buffer.original_indices = raw.original_indices;
        Ok(buffer)
    }
}

impl PointBuffer {
    /// Run jitter → stable sort by x → pack on the caller's points.
    ///
    /// Jitter is applied before sorting so the packed buffer is exactly
    /// x-sorted.
    ///
    /// # Errors
    ///
    /// Returns [`PointBufferError::NonFinite`] if any input coordinate is NaN
    /// or infinite.
    pub fn prepare(points: &[[f64; 2]], config: &SweepConfig) -> Result<Self, PointBufferError> {
        validate_finite(points)?;

        let mut working = points.to_vec();
        let magnitude = effective_jitter(points, config.jitter);
        if magnitude > 0.0 {
            if magnitude > config.jitter {
                tracing::debug!(
                    requested = config.jitter,
                    magnitude,
                    "raised jitter above coordinate resolution"
                );
            }
            match config.seed {
                Some(seed) => {
                    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                    jitter_points(&mut working, magnitude, &mut rng);
                }
                None => jitter_points(&mut working, magnitude, &mut rand::rng()),
            }
        }

        let order = sort_by_x(&working);
        let coords = pack(&working, &order);
        Ok(Self {
            coords,
            original_indices: order,
        })
    }

    /// Wrap an already packed, x-sorted buffer. The identity permutation is
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has odd length, contains a non-finite
    /// value, or is not sorted by ascending x.
    pub fn from_packed(coords: Vec<f64>) -> Result<Self, PointBufferError> {
        if coords.len() % 2 != 0 {
            return Err(PointBufferError::OddLength { len: coords.len() });
        }
        for (index, pair) in coords.chunks_exact(2).enumerate() {
            if !(pair[0].is_finite() && pair[1].is_finite()) {
                return Err(PointBufferError::NonFinite {
                    index,
                    x: pair[0],
                    y: pair[1],
                });
            }
            if index > 0 && pair[0] < coords[2 * index - 2] {
                return Err(PointBufferError::Unsorted { index });
            }
        }
        let original_indices = (0..coords.len() / 2).collect();
        Ok(Self {
            coords,
            original_indices,
        })
    }

    /// Number of points.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    /// Whether the buffer holds no points.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    #[must_use]
    pub fn point(&self, index: usize) -> [f64; 2] {
        [self.coords[2 * index], self.coords[2 * index + 1]]
    }

    /// The packed `[x0, y0, x1, y1, ...]` buffer.
    #[must_use]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Iterate over the points in buffer order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = [f64; 2]> + '_ {
        self.coords.chunks_exact(2).map(|pair| [pair[0], pair[1]])
    }

    /// For each buffer position, the index of the point in the caller's input.
    #[must_use]
    pub fn original_indices(&self) -> &[usize] {
        &self.original_indices
    }

    /// Index in the caller's input of buffer point `index`.
    #[inline]
    #[must_use]
    pub fn original_index(&self, index: usize) -> Option<usize> {
        self.original_indices.get(index).copied()
    }
}

fn validate_permutation(order: &[usize], n: usize) -> Result<(), PointBufferError> {
    if order.len() != n {
        return Err(PointBufferError::PermutationLength {
            points: n,
            indices: order.len(),
        });
    }
    let mut seen = vec![false; n];
    for (position, &index) in order.iter().enumerate() {
        if index >= n || seen[index] {
            return Err(PointBufferError::InvalidPermutation { position, index });
        }
        seen[index] = true;
    }
    Ok(())
}

fn validate_finite(points: &[[f64; 2]]) -> Result<(), PointBufferError> {
    match points
        .iter()
        .position(|p| !(p[0].is_finite() && p[1].is_finite()))
    {
        Some(index) => Err(PointBufferError::NonFinite {
            index,
            x: points[index][0],
            y: points[index][1],
        }),
        None => Ok(()),
    }
}

/// Jitter magnitude actually applied to `points` for a requested `jitter`.
///
/// A non-positive request disables jitter. Otherwise the request is raised to
/// [`JITTER_RELATIVE_FLOOR`] times the largest absolute coordinate, so that
/// adding it still moves points that sit far from the origin.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::geometry::point_buffer::effective_jitter;
///
/// assert_eq!(effective_jitter(&[[0.0, 1.0]], 1e-6), 1e-6);
/// assert_eq!(effective_jitter(&[[0.0, 1.0]], 0.0), 0.0);
/// assert!(effective_jitter(&[[1e11, 0.0]], 1e-6) > 1e-3);
/// ```
#[must_use]
pub fn effective_jitter(points: &[[f64; 2]], jitter: f64) -> f64 {
    if jitter <= 0.0 {
        return 0.0;
    }
    let max_abs = points
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, c| acc.max(c.abs()));
    jitter.max(max_abs * JITTER_RELATIVE_FLOOR)
}

/// Add an independent uniform perturbation in `[0, magnitude)` to every
/// coordinate.
pub fn jitter_points<R: Rng>(points: &mut [[f64; 2]], magnitude: f64, rng: &mut R) {
    if magnitude <= 0.0 {
        return;
    }
    for p in points.iter_mut() {
        p[0] += rng.random_range(0.0..magnitude);
        p[1] += rng.random_range(0.0..magnitude);
    }
}

/// Stable ordering of `points` by ascending x.
///
/// Returns the permutation: `order[k]` is the input index of the k-th point
/// in sorted order. Points with equal x keep their input order.
#[must_use]
pub fn sort_by_x(points: &[[f64; 2]]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[a][0].total_cmp(&points[b][0]));
    order
}

/// Flatten `points` taken in `order` into one `[x0, y0, x1, y1, ...]` buffer.
#[must_use]
pub fn pack(points: &[[f64; 2]], order: &[usize]) -> Vec<f64> {
    let mut coords = Vec::with_capacity(order.len() * 2);
    for &i in order {
        coords.push(points[i][0]);
        coords.push(points[i][1]);
    }
    coords
}
