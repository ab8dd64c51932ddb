//! Geometric predicates for the sweep-hull construction.
//!
//! This module contains the orientation and in-circle tests that drive hull
//! visibility and edge legalization. Both predicates use a static floating-point
//! error bound (Shewchuk's stage-A bounds): when the computed value is smaller
//! than the accumulated rounding error could be, the result is reported as
//! uncertain instead of with a possibly wrong sign.
//!
//! All predicates work on raw `[f64; 2]` coordinates so they can be evaluated
//! directly on the packed [`PointBuffer`](crate::geometry::point_buffer::PointBuffer).

#![forbid(unsafe_code)]

use std::fmt;

/// Relative error bound for [`orientation`], `(3 + 16ε)ε`.
pub const ORIENTATION_ERROR_BOUND: f64 = (3.0 + 16.0 * f64::EPSILON) * f64::EPSILON;

/// Relative error bound for [`in_circle_determinant`], `(10 + 96ε)ε`.
pub const IN_CIRCLE_ERROR_BOUND: f64 = (10.0 + 96.0 * f64::EPSILON) * f64::EPSILON;

/// Represents the orientation of a point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn (negative signed area)
    NEGATIVE,
    /// Collinear, or too close to collinear for the sign to be trusted
    DEGENERATE,
    /// Counter-clockwise turn (positive signed area)
    POSITIVE,
}

impl Orientation {
    /// Classify a value returned by [`orientation`].
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            Self::POSITIVE
        } else if value < 0.0 {
            Self::NEGATIVE
        } else {
            Self::DEGENERATE
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point is on the circle (within the error bound)
    BOUNDARY,
    /// The point is strictly inside the circumcircle
    INSIDE,
}

impl fmt::Display for InCircle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Twice the signed area of the triangle `(p0, p1, p2)`, or exactly `0.0`
/// when the sign cannot be trusted.
///
/// The value is positive when `p0 → p1 → p2` turns counter-clockwise (in a
/// y-up frame) and negative when it turns clockwise.
///
/// # Example
///
/// ```
/// use sweep_delaunay::geometry::predicates::orientation;
///
/// assert_eq!(orientation([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]), 1.0);
/// assert_eq!(orientation([0.0, 0.0], [0.0, 1.0], [1.0, 0.0]), -1.0);
/// assert_eq!(orientation([0.0, 0.0], [1.0, 1.0], [2.0, 2.0]), 0.0);
/// ```
#[inline]
#[must_use]
pub fn orientation(p0: [f64; 2], p1: [f64; 2], p2: [f64; 2]) -> f64 {
    let left = (p1[0] - p0[0]) * (p2[1] - p0[1]);
    let right = (p1[1] - p0[1]) * (p2[0] - p0[0]);
    let det = left - right;

    // |left + right| equals |left| + |right| whenever the sign could be wrong;
    // when the terms have opposite signs the first comparison always holds.
    if det.abs() >= ORIENTATION_ERROR_BOUND * (left + right).abs() {
        det
    } else {
        0.0
    }
}

/// Whether `p` lies strictly to the right of the directed line `from → to`.
///
/// The orientation is evaluated on the three cyclic rotations of
/// `(from, to, p)`; the sign of the first certain result is used. Rotating
/// changes which coordinates get subtracted first, so a triple that is
/// uncertain in one rotation is frequently decidable in another. When all
/// three rotations are uncertain the point is reported as *not* on the right.
///
/// # Example
///
/// ```
/// use sweep_delaunay::geometry::predicates::is_on_right_side;
///
/// assert!(is_on_right_side([0.0, 0.0], [1.0, 0.0], [0.5, -1.0]));
/// assert!(!is_on_right_side([0.0, 0.0], [1.0, 0.0], [0.5, 1.0]));
/// ```
#[inline]
#[must_use]
pub fn is_on_right_side(from: [f64; 2], to: [f64; 2], p: [f64; 2]) -> bool {
    let mut value = orientation(from, to, p);
    if value == 0.0 {
        value = orientation(to, p, from);
    }
    if value == 0.0 {
        value = orientation(p, from, to);
    }
    value < 0.0
}

/// Lifted in-circle determinant of `p` against the circle through `a, b, c`,
/// paired with its permanent (the magnitude bound used for the error check).
///
/// The determinant is positive when `p` is inside the circle and
/// `(a, b, c)` is counter-clockwise.
#[inline]
#[must_use]
pub fn in_circle_determinant(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> (f64, f64) {
    let adx = a[0] - p[0];
    let ady = a[1] - p[1];
    let bdx = b[0] - p[0];
    let bdy = b[1] - p[1];
    let cdx = c[0] - p[0];
    let cdy = c[1] - p[1];

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let alift = adx * adx + ady * ady;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let blift = bdx * bdx + bdy * bdy;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
        + (cdxady.abs() + adxcdy.abs()) * blift
        + (adxbdy.abs() + bdxady.abs()) * clift;

    (det, permanent)
}

/// Classify `p` against the circumcircle of the counter-clockwise triangle
/// `(a, b, c)`.
///
/// Determinants within the error bound are reported as
/// [`InCircle::BOUNDARY`], which makes co-circular configurations (squares,
/// regular polygons) stable: neither diagonal is considered illegal.
#[must_use]
pub fn in_circle_test(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> InCircle {
    let (det, permanent) = in_circle_determinant(a, b, c, p);
    let bound = IN_CIRCLE_ERROR_BOUND * permanent;
    if det > bound {
        InCircle::INSIDE
    } else if det < -bound {
        InCircle::OUTSIDE
    } else {
        InCircle::BOUNDARY
    }
}

/// Whether `p` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `(a, b, c)`.
///
/// # Example
///
/// ```
/// use sweep_delaunay::geometry::predicates::in_circle;
///
/// let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
/// assert!(in_circle(a, b, c, [0.4, 0.4]));
/// assert!(!in_circle(a, b, c, [2.0, 2.0]));
/// // (1, 1) is co-circular with the triangle: not strictly inside.
/// assert!(!in_circle(a, b, c, [1.0, 1.0]));
/// ```
#[inline]
#[must_use]
pub fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> bool {
    in_circle_test(a, b, c, p) == InCircle::INSIDE
}
