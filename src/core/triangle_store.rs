//! Flat triangle and adjacency storage.
//!
//! Triangles are stored as consecutive vertex triples in one array and their
//! neighbors as consecutive triples in a parallel array. Triangle `t` occupies
//! positions `3t..3t+3` of both. Neighbor slot `k` of triangle `t` holds the
//! triangle across the directed edge `(v[k], v[(k + 1) % 3])`, or
//! [`NO_NEIGHBOR`] when that edge lies on the hull.
//!
//! All triangles are counter-clockwise. Two adjacent triangles traverse their
//! shared edge in opposite directions.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Sentinel stored in a neighbor slot whose edge lies on the hull.
pub const NO_NEIGHBOR: usize = usize::MAX;

/// Slot following `k` within a triangle.
#[inline]
#[must_use]
pub const fn next_slot(k: usize) -> usize {
    if k == 2 { 0 } else { k + 1 }
}

/// Slot preceding `k` within a triangle.
#[inline]
#[must_use]
pub const fn prev_slot(k: usize) -> usize {
    if k == 0 { 2 } else { k - 1 }
}

/// Upper bound on the number of triangles for `n` points, `max(2n − 5, 0)`.
///
/// A triangulation of `n` points with `h` hull vertices has `2n − 2 − h`
/// triangles, and `h ≥ 3`.
#[inline]
#[must_use]
pub const fn max_triangles(n_points: usize) -> usize {
    (2 * n_points).saturating_sub(5)
}

/// Errors raised by [`TriangleStore`] operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TriangleStoreError {
    /// More triangles than the pre-sized capacity were requested.
    #[error("Triangle store capacity of {capacity} triangles exceeded")]
    CapacityExceeded {
        /// Capacity the store was created with
        capacity: usize,
    },
    /// A neighbor link that should point back at a triangle does not.
    #[error("Triangle {triangle} does not list {expected} as a neighbor")]
    MissingBackReference {
        /// Triangle whose neighbor slots were searched
        triangle: usize,
        /// Neighbor that was expected in one of the slots
        expected: usize,
    },
}

/// Pre-sized triangle and adjacency arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriangleStore {
    vertices: Vec<usize>,
    neighbors: Vec<usize>,
    capacity: usize,
}

impl TriangleStore {
    /// Create a store able to hold `capacity` triangles without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity * 3),
            neighbors: Vec::with_capacity(capacity * 3),
            capacity,
        }
    }

    /// Append the triangle `(a, b, c)` with no neighbors and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`TriangleStoreError::CapacityExceeded`] if the store is full.
    pub fn push(&mut self, a: usize, b: usize, c: usize) -> Result<usize, TriangleStoreError> {
        let index = self.len();
        if index >= self.capacity {
            return Err(TriangleStoreError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.vertices.extend_from_slice(&[a, b, c]);
        self.neighbors
            .extend_from_slice(&[NO_NEIGHBOR, NO_NEIGHBOR, NO_NEIGHBOR]);
        Ok(index)
    }

    /// Number of triangles stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether no triangle has been stored yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Maximum number of triangles.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertices of triangle `t`.
    #[inline]
    #[must_use]
    pub fn vertices(&self, t: usize) -> [usize; 3] {
        [
            self.vertices[3 * t],
            self.vertices[3 * t + 1],
            self.vertices[3 * t + 2],
        ]
    }

    /// Vertex in slot `k` of triangle `t`.
    #[inline]
    #[must_use]
    pub fn vertex(&self, t: usize, k: usize) -> usize {
        self.vertices[3 * t + k]
    }

    /// Overwrite the vertex in slot `k` of triangle `t`.
    #[inline]
    pub fn set_vertex(&mut self, t: usize, k: usize, vertex: usize) {
        self.vertices[3 * t + k] = vertex;
    }

    /// Neighbors of triangle `t`.
    #[inline]
    #[must_use]
    pub fn neighbors(&self, t: usize) -> [usize; 3] {
        [
            self.neighbors[3 * t],
            self.neighbors[3 * t + 1],
            self.neighbors[3 * t + 2],
        ]
    }

    /// Neighbor across edge slot `k` of triangle `t`.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, t: usize, k: usize) -> usize {
        self.neighbors[3 * t + k]
    }

    /// Overwrite the neighbor across edge slot `k` of triangle `t`.
    #[inline]
    pub fn set_neighbor(&mut self, t: usize, k: usize, neighbor: usize) {
        self.neighbors[3 * t + k] = neighbor;
    }

    /// Slot of the directed edge `from → to` in triangle `t`, if present.
    #[must_use]
    pub fn edge_slot(&self, t: usize, from: usize, to: usize) -> Option<usize> {
        let v = self.vertices(t);
        (0..3).find(|&k| v[k] == from && v[next_slot(k)] == to)
    }

    /// Make `a` and `b` neighbors across slot `a_slot` of `a` and slot
    /// `b_slot` of `b`.
    #[inline]
    pub fn link(&mut self, a: usize, a_slot: usize, b: usize, b_slot: usize) {
        self.set_neighbor(a, a_slot, b);
        self.set_neighbor(b, b_slot, a);
    }

    /// In triangle `t`, replace the neighbor link to `old` with `new`.
    ///
    /// # Errors
    ///
    /// Returns [`TriangleStoreError::MissingBackReference`] if `t` has no slot
    /// pointing at `old`.
    pub fn replace_neighbor(
        &mut self,
        t: usize,
        old: usize,
        new: usize,
    ) -> Result<(), TriangleStoreError> {
        let k = (0..3)
            .find(|&k| self.neighbor(t, k) == old)
            .ok_or(TriangleStoreError::MissingBackReference {
                triangle: t,
                expected: old,
            })?;
        self.set_neighbor(t, k, new);
        Ok(())
    }

    /// Flat vertex triples of all stored triangles.
    #[must_use]
    pub fn triangles(&self) -> &[usize] {
        &self.vertices
    }

    /// Flat neighbor triples of all stored triangles.
    #[must_use]
    pub fn adjacency(&self) -> &[usize] {
        &self.neighbors
    }

    /// Consume the store, returning the vertex and neighbor arrays trimmed to
    /// the real triangle count.
    #[must_use]
    pub fn into_parts(mut self) -> (Vec<usize>, Vec<usize>) {
        self.vertices.shrink_to_fit();
        self.neighbors.shrink_to_fit();
        (self.vertices, self.neighbors)
    }
}
