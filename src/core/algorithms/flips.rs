//! Edge flips and Lawson legalization.
//!
//! An edge shared by triangles `(a, b, p)` and `(b, a, q)` is illegal when
//! `q` lies strictly inside the circumcircle of `(a, b, p)`. Flipping replaces
//! the diagonal `a–b` of the quadrilateral `a, q, b, p` with `p–q`:
//!
//! ```text
//!        p                 p
//!      / | \             / | \
//!     a  |  b    ==>    a  |  b
//!      \ | /             \ | /
//!        q                 q
//!   (diagonal a-b)    (diagonal p-q)
//! ```
//!
//! Both triangles are rewritten in place, so triangle indices stay stable and
//! the adjacency of the four outer edges is patched locally. When an outer
//! edge lies on the hull, the hull edge's triangle tag is moved to whichever
//! triangle now owns it.
//!
//! [`Legalizer`] drives flips from a work queue of `(triangle, slot)` pairs.
//! In [`Legalization::Propagate`] mode each flip enqueues the two edges
//! opposite the apex, so legalization continues until every edge around the
//! newly inserted point is locally Delaunay.

#![forbid(unsafe_code)]

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::boundary::{Hull, TagFix};
use crate::core::config::Legalization;
use crate::core::triangle_store::{
    NO_NEIGHBOR, TriangleStore, TriangleStoreError, next_slot, prev_slot,
};
use crate::geometry::point_buffer::PointBuffer;
use crate::geometry::predicates::{InCircle, in_circle_test};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors that can occur while flipping or legalizing edges.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlipError {
    /// The neighbor across an edge does not contain the reversed edge.
    #[error(
        "Triangle {triangle} names {neighbor} across slot {slot}, but {neighbor} has no matching reversed edge"
    )]
    AsymmetricAdjacency {
        /// Triangle whose edge was examined
        triangle: usize,
        /// Edge slot in `triangle`
        slot: usize,
        /// Recorded neighbor
        neighbor: usize,
    },
    /// A flip was requested across a hull edge.
    #[error("Edge slot {slot} of triangle {triangle} lies on the hull and cannot be flipped")]
    HullEdge {
        /// Triangle whose edge was requested
        triangle: usize,
        /// Edge slot in `triangle`
        slot: usize,
    },
    /// A hull edge expected to carry a triangle tag was not found.
    #[error("Hull edge ({from},{to}) tagged with triangle {triangle} not found while retagging")]
    StaleHullTag {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
        /// Tag the edge was expected to carry
        triangle: usize,
    },
    /// Legalization did not settle within the flip budget of one call.
    #[error("Legalization from triangle {triangle} exceeded {limit} flips")]
    FlipLimitExceeded {
        /// Triangle legalization started from
        triangle: usize,
        /// Flip budget for the call
        limit: usize,
    },
    /// Adjacency back-reference repair failed.
    #[error(transparent)]
    Store(#[from] TriangleStoreError),
}

// =============================================================================
// FLIP
// =============================================================================

/// The two triangles produced by a flip, as rewritten in place.
///
/// After the flip `triangle` is `(a, q, p)` and `neighbor` is `(b, p, q)`,
/// with the new diagonal at `neighbor`'s slot `next_slot(neighbor_slot)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlippedPair {
    /// The triangle the flipped edge was addressed from
    pub triangle: usize,
    /// Slot of the edge `a → q` in `triangle`, opposite the apex `p`
    pub slot: usize,
    /// The former neighbor across the flipped edge
    pub neighbor: usize,
    /// Slot of the edge `b → p` in `neighbor`
    pub neighbor_slot: usize,
}

impl FlippedPair {
    /// Slot of the edge `q → b` in `neighbor`, opposite the apex `p`.
    #[must_use]
    pub const fn neighbor_outer_slot(&self) -> usize {
        prev_slot(self.neighbor_slot)
    }
}

/// The neighbor across slot `k` of `t` and the slot of the reversed edge in
/// it, or `None` for a hull edge.
fn opposite(store: &TriangleStore, t: usize, k: usize) -> Result<Option<(usize, usize)>, FlipError> {
    let o = store.neighbor(t, k);
    if o == NO_NEIGHBOR {
        return Ok(None);
    }
    let a = store.vertex(t, k);
    let b = store.vertex(t, next_slot(k));
    let m = store
        .edge_slot(o, b, a)
        .ok_or(FlipError::AsymmetricAdjacency {
            triangle: t,
            slot: k,
            neighbor: o,
        })?;
    Ok(Some((o, m)))
}

/// Whether the edge in slot `k` of `t` is illegal: the far apex of its
/// neighbor lies strictly inside the circumcircle of `t`.
///
/// Hull edges are always legal.
///
/// # Errors
///
/// Returns [`FlipError::AsymmetricAdjacency`] if the neighbor does not share
/// the edge.
pub fn is_illegal(
    store: &TriangleStore,
    points: &PointBuffer,
    t: usize,
    k: usize,
) -> Result<bool, FlipError> {
    let Some((o, m)) = opposite(store, t, k)? else {
        return Ok(false);
    };
    let [a, b, p] = [k, next_slot(k), prev_slot(k)].map(|s| points.point(store.vertex(t, s)));
    let q = points.point(store.vertex(o, prev_slot(m)));
    Ok(in_circle_test(a, b, p, q) == InCircle::INSIDE)
}

/// Flip the edge in slot `k` of triangle `t`.
///
/// Rewrites both triangles, repairs the back-references of the two outer
/// neighbors that change owner, and retags the corresponding hull edges when
/// those outer edges lie on the hull.
///
/// # Errors
///
/// Returns an error if the edge lies on the hull, if adjacency is not
/// symmetric, or if a hull edge that should be retagged is missing.
pub fn flip_edge(
    store: &mut TriangleStore,
    hull: &mut Hull,
    t: usize,
    k: usize,
) -> Result<FlippedPair, FlipError> {
    let (o, m) = opposite(store, t, k)?.ok_or(FlipError::HullEdge { triangle: t, slot: k })?;

    let a = store.vertex(t, k);
    let b = store.vertex(t, next_slot(k));
    let p = store.vertex(t, prev_slot(k));
    let q = store.vertex(o, prev_slot(m));

    let t_bp = store.neighbor(t, next_slot(k));
    let o_aq = store.neighbor(o, next_slot(m));

    // t: (a, b, p) -> (a, q, p); o: (b, a, q) -> (b, p, q)
    store.set_vertex(t, next_slot(k), q);
    store.set_vertex(o, next_slot(m), p);

    store.set_neighbor(t, k, o_aq);
    store.set_neighbor(o, m, t_bp);
    store.link(t, next_slot(k), o, next_slot(m));

    let mut fixes = Vec::new();
    if o_aq == NO_NEIGHBOR {
        fixes.push(TagFix { from: a, to: q, old: o, new: t });
    } else {
        store.replace_neighbor(o_aq, o, t)?;
    }
    if t_bp == NO_NEIGHBOR {
        fixes.push(TagFix { from: b, to: p, old: t, new: o });
    } else {
        store.replace_neighbor(t_bp, t, o)?;
    }

    if hull.retag(&fixes) != fixes.len() {
        let missing = fixes
            .iter()
            .find(|fix| {
                !hull
                    .iter()
                    .any(|edge| edge.is(fix.from, fix.to) && edge.triangle == fix.new)
            })
            .copied()
            .unwrap_or(fixes[0]);
        return Err(FlipError::StaleHullTag {
            from: missing.from,
            to: missing.to,
            triangle: missing.old,
        });
    }

    Ok(FlippedPair {
        triangle: t,
        slot: k,
        neighbor: o,
        neighbor_slot: m,
    })
}

// =============================================================================
// LEGALIZATION
// =============================================================================

/// Counters accumulated by a [`Legalizer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalizationStats {
    /// Number of queued edges examined.
    pub edges_checked: usize,
    /// Number of flips performed.
    pub flips_performed: usize,
    /// Maximum queue length observed.
    pub max_queue_len: usize,
}

/// Queue-driven edge legalizer.
///
/// The queue is kept between calls so its allocation is reused across the
/// whole sweep.
#[derive(Clone, Debug)]
pub struct Legalizer {
    mode: Legalization,
    queue: VecDeque<(usize, usize)>,
    stats: LegalizationStats,
}

impl Legalizer {
    /// Create a legalizer for the given mode.
    #[must_use]
    pub fn new(mode: Legalization) -> Self {
        Self {
            mode,
            queue: VecDeque::with_capacity(32),
            stats: LegalizationStats::default(),
        }
    }

    /// The legalization mode.
    #[must_use]
    pub const fn mode(&self) -> Legalization {
        self.mode
    }

    /// Counters accumulated over all calls so far.
    #[must_use]
    pub const fn stats(&self) -> &LegalizationStats {
        &self.stats
    }

    /// Legalize starting from the edge in slot `slot` of `triangle`, whose
    /// opposite vertex is taken as the apex.
    ///
    /// Returns the number of flips performed by this call.
    ///
    /// # Errors
    ///
    /// Returns a [`FlipError`] on corrupted adjacency, on a missing hull tag,
    /// or if the flip budget is exhausted.
    pub fn legalize(
        &mut self,
        store: &mut TriangleStore,
        hull: &mut Hull,
        points: &PointBuffer,
        triangle: usize,
        slot: usize,
    ) -> Result<usize, FlipError> {
        // Every flip raises the apex degree by one, which is bounded by the
        // number of points.
        let limit = points.len() + 3;
        let mut flips = 0;

        self.queue.clear();
        self.queue.push_back((triangle, slot));
        while let Some((t, k)) = self.queue.pop_front() {
            self.stats.edges_checked += 1;
            if !is_illegal(store, points, t, k)? {
                continue;
            }
            if flips == limit {
                self.queue.clear();
                return Err(FlipError::FlipLimitExceeded { triangle, limit });
            }

            let pair = flip_edge(store, hull, t, k)?;
            flips += 1;
            tracing::trace!(
                triangle = pair.triangle,
                neighbor = pair.neighbor,
                "flipped illegal edge"
            );

            if self.mode == Legalization::Propagate {
                self.queue.push_back((pair.triangle, pair.slot));
                self.queue
                    .push_back((pair.neighbor, pair.neighbor_outer_slot()));
                self.stats.max_queue_len = self.stats.max_queue_len.max(self.queue.len());
            }
        }

        self.stats.flips_performed += flips;
        Ok(flips)
    }
}
