//! Structural and empty-circumcircle validation of flat triangle arrays.

#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::triangle_store::{NO_NEIGHBOR, next_slot};
use crate::geometry::point_buffer::PointBuffer;
use crate::geometry::predicates::{Orientation, in_circle, orientation};

/// Errors that can occur during Delaunay property validation.
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::util::DelaunayValidationError;
///
/// let err = DelaunayValidationError::DelaunayViolation { triangle: 4, point: 9 };
/// assert!(err.to_string().contains("triangle 4"));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DelaunayValidationError {
    /// A point lies strictly inside the circumcircle of a triangle.
    #[error("Point {point} lies strictly inside the circumcircle of triangle {triangle}")]
    DelaunayViolation {
        /// Offending triangle
        triangle: usize,
        /// Point inside its circumcircle
        point: usize,
    },
}

/// Structural problems found in a triangulation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationValidationError {
    /// Triangle and neighbor arrays are not parallel triples.
    #[error("Triangle array has length {triangles}, neighbor array has length {neighbors}")]
    LengthMismatch {
        /// Length of the triangle array
        triangles: usize,
        /// Length of the neighbor array
        neighbors: usize,
    },
    /// A triangle references a point that does not exist.
    #[error("Triangle {triangle} references point {index}, but only {points} points exist")]
    IndexOutOfRange {
        /// Offending triangle
        triangle: usize,
        /// Referenced point index
        index: usize,
        /// Number of points
        points: usize,
    },
    /// A triangle repeats a vertex.
    #[error("Triangle {triangle} repeats a vertex: {vertices:?}")]
    RepeatedVertex {
        /// Offending triangle
        triangle: usize,
        /// Its vertices
        vertices: [usize; 3],
    },
    /// A neighbor slot references a triangle that does not exist.
    #[error("Triangle {triangle} slot {slot} references missing neighbor {neighbor}")]
    NeighborOutOfRange {
        /// Offending triangle
        triangle: usize,
        /// Edge slot
        slot: usize,
        /// Referenced neighbor
        neighbor: usize,
    },
    /// A neighbor does not share the edge or does not link back.
    #[error("Triangle {triangle} slot {slot} names {neighbor}, which does not link back across the shared edge")]
    AsymmetricNeighbor {
        /// Offending triangle
        triangle: usize,
        /// Edge slot
        slot: usize,
        /// Referenced neighbor
        neighbor: usize,
    },
    /// Two triangles have the same vertex set.
    #[error("Triangles {first} and {second} have the same vertices")]
    DuplicateTriangle {
        /// Earlier triangle
        first: usize,
        /// Later triangle
        second: usize,
    },
    /// A hull entry references a point that does not exist.
    #[error("Hull references point {index}, but only {points} points exist")]
    HullIndexOutOfRange {
        /// Referenced point index
        index: usize,
        /// Number of points
        points: usize,
    },
    /// The empty-circumcircle property does not hold.
    #[error(transparent)]
    Delaunay(#[from] DelaunayValidationError),
}

/// Vertices of triangle `t` in a flat array.
#[inline]
fn triple(triangles: &[usize], t: usize) -> [usize; 3] {
    [triangles[3 * t], triangles[3 * t + 1], triangles[3 * t + 2]]
}

/// Check that every index is in `[0, n_points)` and no triangle repeats a
/// vertex.
///
/// # Errors
///
/// Returns the first out-of-range index or repeated vertex.
pub fn validate_indices(
    triangles: &[usize],
    n_points: usize,
) -> Result<(), TriangulationValidationError> {
    for t in 0..triangles.len() / 3 {
        let vertices = triple(triangles, t);
        if let Some(&index) = vertices.iter().find(|&&v| v >= n_points) {
            return Err(TriangulationValidationError::IndexOutOfRange {
                triangle: t,
                index,
                points: n_points,
            });
        }
        if vertices[0] == vertices[1] || vertices[1] == vertices[2] || vertices[0] == vertices[2]
        {
            return Err(TriangulationValidationError::RepeatedVertex {
                triangle: t,
                vertices,
            });
        }
    }
    Ok(())
}

/// Check that every non-sentinel neighbor link is mutual and crosses the
/// same edge in the opposite direction.
///
/// # Errors
///
/// Returns the first inconsistent link.
pub fn validate_neighbors(
    triangles: &[usize],
    neighbors: &[usize],
) -> Result<(), TriangulationValidationError> {
    if triangles.len() != neighbors.len() || triangles.len() % 3 != 0 {
        return Err(TriangulationValidationError::LengthMismatch {
            triangles: triangles.len(),
            neighbors: neighbors.len(),
        });
    }
    let n_triangles = triangles.len() / 3;
    for t in 0..n_triangles {
        let vertices = triple(triangles, t);
        for k in 0..3 {
            let o = neighbors[3 * t + k];
            if o == NO_NEIGHBOR {
                continue;
            }
            if o >= n_triangles {
                return Err(TriangulationValidationError::NeighborOutOfRange {
                    triangle: t,
                    slot: k,
                    neighbor: o,
                });
            }
            let (a, b) = (vertices[k], vertices[next_slot(k)]);
            let other = triple(triangles, o);
            let links_back = (0..3).any(|m| {
                other[m] == b && other[next_slot(m)] == a && neighbors[3 * o + m] == t
            });
            if !links_back {
                return Err(TriangulationValidationError::AsymmetricNeighbor {
                    triangle: t,
                    slot: k,
                    neighbor: o,
                });
            }
        }
    }
    Ok(())
}

/// Check that no two triangles share the same unordered vertex set.
///
/// # Errors
///
/// Returns the first duplicate pair found.
pub fn validate_no_duplicate_triangles(
    triangles: &[usize],
) -> Result<(), TriangulationValidationError> {
    let mut seen: FxHashMap<[usize; 3], usize> = FxHashMap::default();
    seen.reserve(triangles.len() / 3);
    for t in 0..triangles.len() / 3 {
        let mut key = triple(triangles, t);
        key.sort_unstable();
        if let Some(&first) = seen.get(&key) {
            return Err(TriangulationValidationError::DuplicateTriangle { first, second: t });
        }
        seen.insert(key, t);
    }
    Ok(())
}

/// Every `(triangle, point)` pair where the point lies strictly inside the
/// triangle's circumcircle.
///
/// This is a brute-force `O(triangles × points)` scan intended for tests and
/// debugging. Triangles whose orientation is degenerate, or that reference a
/// point outside `points`, are skipped; [`validate_delaunay`] reports the
/// latter as errors.
#[must_use]
pub fn find_delaunay_violations(triangles: &[usize], points: &PointBuffer) -> Vec<(usize, usize)> {
    let mut violations = Vec::new();
    let mut degenerate = 0_usize;
    let mut malformed = 0_usize;
    for t in 0..triangles.len() / 3 {
        let vertices = triple(triangles, t);
        if vertices.iter().any(|&v| v >= points.len()) {
            malformed += 1;
            continue;
        }
        let [a, b, c] = vertices.map(|v| points.point(v));
        if Orientation::from_value(orientation(a, b, c)) != Orientation::POSITIVE {
            degenerate += 1;
            continue;
        }
        for p in 0..points.len() {
            if !vertices.contains(&p) && in_circle(a, b, c, points.point(p)) {
                violations.push((t, p));
            }
        }
    }
    if degenerate > 0 {
        tracing::warn!(degenerate, "skipped triangles without positive orientation");
    }
    if malformed > 0 {
        tracing::warn!(malformed, "skipped triangles with out-of-range vertices");
    }
    tracing::debug!(
        triangles = triangles.len() / 3,
        violations = violations.len(),
        "find_delaunay_violations: scan complete"
    );
    violations
}

/// Check the empty-circumcircle property for every triangle.
///
/// Indices are checked first, so malformed input is reported rather than
/// skipped.
///
/// # Errors
///
/// Returns the index error from [`validate_indices`] if a triangle is
/// malformed, otherwise [`DelaunayValidationError::DelaunayViolation`] for
/// the first violation found.
pub fn validate_delaunay(
    triangles: &[usize],
    points: &PointBuffer,
) -> Result<(), TriangulationValidationError> {
    validate_indices(triangles, points.len())?;
    match find_delaunay_violations(triangles, points).first() {
        Some(&(triangle, point)) => {
            Err(DelaunayValidationError::DelaunayViolation { triangle, point }.into())
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PointBuffer {
        PointBuffer::from_packed(vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_validate_indices() {
        assert!(validate_indices(&[0, 2, 1], 3).is_ok());
        assert_eq!(
            validate_indices(&[0, 2, 3], 3),
            Err(TriangulationValidationError::IndexOutOfRange {
                triangle: 0,
                index: 3,
                points: 3
            })
        );
        assert!(matches!(
            validate_indices(&[0, 2, 0], 3),
            Err(TriangulationValidationError::RepeatedVertex { triangle: 0, .. })
        ));
    }

    #[test]
    fn test_validate_neighbors() {
        // (0,2,3) and (0,3,1) share the edge 0-3 in opposite directions.
        let triangles = [0, 2, 3, 0, 3, 1];
        let neighbors = [NO_NEIGHBOR, NO_NEIGHBOR, 1, 0, NO_NEIGHBOR, NO_NEIGHBOR];
        assert!(validate_neighbors(&triangles, &neighbors).is_ok());

        let one_sided = [NO_NEIGHBOR, NO_NEIGHBOR, 1, NO_NEIGHBOR, NO_NEIGHBOR, NO_NEIGHBOR];
        assert_eq!(
            validate_neighbors(&triangles, &one_sided),
            Err(TriangulationValidationError::AsymmetricNeighbor {
                triangle: 0,
                slot: 2,
                neighbor: 1
            })
        );

        let dangling = [5, NO_NEIGHBOR, NO_NEIGHBOR, NO_NEIGHBOR, NO_NEIGHBOR, NO_NEIGHBOR];
        assert!(matches!(
            validate_neighbors(&triangles, &dangling),
            Err(TriangulationValidationError::NeighborOutOfRange { neighbor: 5, .. })
        ));
        assert!(matches!(
            validate_neighbors(&triangles, &neighbors[..3]),
            Err(TriangulationValidationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_triangles() {
        assert!(validate_no_duplicate_triangles(&[0, 1, 2, 1, 2, 3]).is_ok());
        assert_eq!(
            validate_no_duplicate_triangles(&[0, 1, 2, 2, 0, 1]),
            Err(TriangulationValidationError::DuplicateTriangle { first: 0, second: 1 })
        );
    }

    #[test]
    fn test_delaunay_checks() {
        let points = PointBuffer::from_packed(vec![0.0, 0.0, 1.0, 5.0, 1.1, -5.0, 2.0, 0.0])
            .unwrap();
        // Long diagonal 1-2: point 0 is inside the circumcircle of (1,2,3).
        let bad = [1, 0, 2, 1, 2, 3];
        assert!(!find_delaunay_violations(&bad, &points).is_empty());
        assert!(validate_delaunay(&bad, &points).is_err());

        // Short diagonal 0-3.
        let good = [0, 2, 3, 0, 3, 1];
        assert!(find_delaunay_violations(&good, &points).is_empty());
        assert!(validate_delaunay(&good, &points).is_ok());
    }

    #[test]
    fn test_delaunay_checks_reject_out_of_range_vertices() {
        let points = square();
        let triangles = [0, 2, 7];
        assert!(find_delaunay_violations(&triangles, &points).is_empty());
        assert_eq!(
            validate_delaunay(&triangles, &points),
            Err(TriangulationValidationError::IndexOutOfRange {
                triangle: 0,
                index: 7,
                points: 4
            })
        );
    }

    #[test]
    fn test_cocircular_square_is_delaunay() {
        let points = square();
        assert!(validate_delaunay(&[0, 2, 3, 0, 3, 1], &points).is_ok());
        assert!(validate_delaunay(&[0, 2, 1, 1, 2, 3], &points).is_ok());
    }
}
