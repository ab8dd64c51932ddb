//! The advancing convex-hull boundary.
//!
//! The hull of the points processed so far is kept as a cycle of directed
//! edges, counter-clockwise, so that the triangulated region lies to the left
//! of every edge and a new point is visible from an edge exactly when it lies
//! strictly to the right of it. Each edge is tagged with the triangle that
//! currently owns it.
//!
//! Edges live in a [`SlotMap`] arena and refer to their neighbors by
//! [`HullEdgeKey`]. Removing an edge frees its slot; stale keys are detected by
//! the arena's generation check and surface as [`HullError::MissingEdge`].

#![forbid(unsafe_code)]

use slotmap::{SlotMap, new_key_type};
use std::fmt;
use thiserror::Error;

use crate::core::triangle_store::{NO_NEIGHBOR, TriangleStore};

new_key_type! {
    /// Key of an edge in the hull arena.
    pub struct HullEdgeKey;
}

/// Errors detected while walking or mutating the hull cycle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HullError {
    /// A key does not name a live edge.
    #[error("Hull edge {key:?} is not live")]
    MissingEdge {
        /// The stale or unknown key
        key: HullEdgeKey,
    },
    /// An edge's successor does not point back at it.
    #[error(
        "Hull edge ({from},{to}) has next ({next_from},{next_to}), but the next edge's prev is not ({from},{to})"
    )]
    BrokenLink {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
        /// Start of its successor
        next_from: usize,
        /// End of its successor
        next_to: usize,
    },
    /// Consecutive edges do not share an endpoint.
    #[error("Hull edge ({from},{to}) is followed by ({next_from},{next_to})")]
    Disconnected {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
        /// Start of its successor
        next_from: usize,
        /// End of its successor
        next_to: usize,
    },
    /// Walking from the root does not visit every live edge exactly once.
    #[error("Hull walk visited {visited} edges, but {live} are live")]
    CycleLength {
        /// Edges reached before returning to the root
        visited: usize,
        /// Live edges in the arena
        live: usize,
    },
    /// Removing the edge would leave the hull empty.
    #[error("Cannot remove the last hull edge ({from},{to})")]
    LastEdge {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
    },
    /// An edge's triangle tag does not own the edge.
    #[error("Hull edge ({from},{to}) is tagged with triangle {triangle}, which does not bound it")]
    StaleTag {
        /// Start of the edge
        from: usize,
        /// End of the edge
        to: usize,
        /// The recorded tag
        triangle: usize,
    },
}

/// A directed hull edge tagged with its incident triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HullEdge {
    /// Start point index
    pub from: usize,
    /// End point index
    pub to: usize,
    /// Triangle whose directed edge `from → to` this is
    pub triangle: usize,
    next: HullEdgeKey,
    prev: HullEdgeKey,
}

impl HullEdge {
    /// Key of the following edge in the cycle.
    #[must_use]
    pub const fn next(&self) -> HullEdgeKey {
        self.next
    }

    /// Key of the preceding edge in the cycle.
    #[must_use]
    pub const fn prev(&self) -> HullEdgeKey {
        self.prev
    }

    /// Whether this edge is `from → to`.
    #[inline]
    #[must_use]
    pub const fn is(&self, from: usize, to: usize) -> bool {
        self.from == from && self.to == to
    }
}

/// A retagging request: the hull edge `from → to` currently tagged `old`
/// should be tagged `new`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagFix {
    /// Start of the edge
    pub from: usize,
    /// End of the edge
    pub to: usize,
    /// Expected current tag
    pub old: usize,
    /// Replacement tag
    pub new: usize,
}

/// Cyclic, doubly-linked hull boundary.
#[derive(Clone, Debug)]
pub struct Hull {
    edges: SlotMap<HullEdgeKey, HullEdge>,
    root: HullEdgeKey,
}

impl Hull {
    /// Seed the cycle `(p0,p1) → (p1,p2) → (p2,p0)`, all edges tagged with
    /// `triangle`. The root is `(p0,p1)`.
    #[must_use]
    pub fn from_triangle(p0: usize, p1: usize, p2: usize, triangle: usize) -> Self {
        let mut edges = SlotMap::with_capacity_and_key(16);
        let detached = |from, to| HullEdge {
            from,
            to,
            triangle,
            next: HullEdgeKey::default(),
            prev: HullEdgeKey::default(),
        };
        let e0 = edges.insert(detached(p0, p1));
        let e1 = edges.insert(detached(p1, p2));
        let e2 = edges.insert(detached(p2, p0));
        for (key, prev, next) in [(e0, e2, e1), (e1, e0, e2), (e2, e1, e0)] {
            let edge = &mut edges[key];
            edge.prev = prev;
            edge.next = next;
        }
        Self { edges, root: e0 }
    }

    /// Key of the root edge, where walks start.
    #[must_use]
    pub const fn root(&self) -> HullEdgeKey {
        self.root
    }

    /// Number of live edges (equals the number of hull vertices).
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the hull has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The live edge named by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] if `key` is stale.
    pub fn get(&self, key: HullEdgeKey) -> Result<&HullEdge, HullError> {
        self.edges.get(key).ok_or(HullError::MissingEdge { key })
    }

    fn get_mut(&mut self, key: HullEdgeKey) -> Result<&mut HullEdge, HullError> {
        self.edges.get_mut(key).ok_or(HullError::MissingEdge { key })
    }

    /// Key of the edge following `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] if `key` is stale.
    pub fn next(&self, key: HullEdgeKey) -> Result<HullEdgeKey, HullError> {
        self.get(key).map(|edge| edge.next)
    }

    /// Key of the edge preceding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] if `key` is stale.
    pub fn prev(&self, key: HullEdgeKey) -> Result<HullEdgeKey, HullError> {
        self.get(key).map(|edge| edge.prev)
    }

    /// Keys of the cycle in order, starting at the root.
    ///
    /// The snapshot is taken before any mutation, so callers can mutate the
    /// hull while iterating it without ever visiting edges they create.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] on a dangling link and
    /// [`HullError::CycleLength`] if the walk does not close within the
    /// number of live edges.
    pub fn keys_from_root(&self) -> Result<Vec<HullEdgeKey>, HullError> {
        let live = self.edges.len();
        let mut keys = Vec::with_capacity(live);
        let mut key = self.root;
        loop {
            keys.push(key);
            key = self.next(key)?;
            if key == self.root {
                break;
            }
            if keys.len() >= live {
                return Err(HullError::CycleLength {
                    visited: keys.len() + 1,
                    live,
                });
            }
        }
        Ok(keys)
    }

    /// Iterate over the edges in cycle order starting at the root.
    ///
    /// Iteration stops early at a dangling link; use [`Hull::validate`] to
    /// detect corruption.
    pub fn iter(&self) -> impl Iterator<Item = &HullEdge> + '_ {
        let mut key = Some(self.root);
        let mut remaining = self.edges.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let edge = self.edges.get(key?)?;
            remaining -= 1;
            key = Some(edge.next);
            Some(edge)
        })
    }

    /// Hull vertices in counter-clockwise order starting at the root's start.
    #[must_use]
    pub fn vertices(&self) -> Vec<usize> {
        self.iter().map(|edge| edge.from).collect()
    }

    /// Remove the edge `key`, joining its neighbors. The root moves to the
    /// following edge if it named the removed one.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] for a stale key and
    /// [`HullError::LastEdge`] when `key` is the only edge.
    pub fn unlink(&mut self, key: HullEdgeKey) -> Result<HullEdge, HullError> {
        let edge = *self.get(key)?;
        if self.edges.len() == 1 {
            return Err(HullError::LastEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        self.get_mut(edge.prev)?.next = edge.next;
        self.get_mut(edge.next)?.prev = edge.prev;
        self.edges.remove(key);
        if self.root == key {
            self.root = edge.next;
        }
        Ok(edge)
    }

    /// Insert the edge `from → to` tagged `triangle` right after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::MissingEdge`] if `anchor` or its successor is stale.
    pub fn insert_after(
        &mut self,
        anchor: HullEdgeKey,
        from: usize,
        to: usize,
        triangle: usize,
    ) -> Result<HullEdgeKey, HullError> {
        let next = self.next(anchor)?;
        // Check the successor before allocating so a failure leaves no orphan.
        self.get(next)?;
        let key = self.edges.insert(HullEdge {
            from,
            to,
            triangle,
            next,
            prev: anchor,
        });
        self.get_mut(anchor)?.next = key;
        self.get_mut(next)?.prev = key;
        Ok(key)
    }

    /// Walk the cycle once, applying every fix in `fixes`, and stop as soon
    /// as all of them have been applied. Returns the number applied.
    pub fn retag(&mut self, fixes: &[TagFix]) -> usize {
        if fixes.is_empty() {
            return 0;
        }
        let mut applied = 0;
        let mut key = self.root;
        for _ in 0..self.edges.len() {
            let Some(edge) = self.edges.get_mut(key) else {
                break;
            };
            if let Some(fix) = fixes
                .iter()
                .find(|fix| edge.is(fix.from, fix.to) && edge.triangle == fix.old)
            {
                edge.triangle = fix.new;
                applied += 1;
                if applied == fixes.len() {
                    break;
                }
            }
            key = edge.next;
        }
        applied
    }

    /// Check that the edges form one closed, consistently linked cycle.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), HullError> {
        let keys = self.keys_from_root()?;
        if keys.len() != self.edges.len() {
            return Err(HullError::CycleLength {
                visited: keys.len(),
                live: self.edges.len(),
            });
        }
        for &key in &keys {
            let edge = self.get(key)?;
            let next = self.get(edge.next)?;
            if next.prev != key {
                return Err(HullError::BrokenLink {
                    from: edge.from,
                    to: edge.to,
                    next_from: next.from,
                    next_to: next.to,
                });
            }
            if edge.to != next.from {
                return Err(HullError::Disconnected {
                    from: edge.from,
                    to: edge.to,
                    next_from: next.from,
                    next_to: next.to,
                });
            }
        }
        Ok(())
    }

    /// Check that every edge's tag names a triangle owning the directed edge,
    /// with no neighbor across it.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::StaleTag`] for the first mismatching edge.
    pub fn validate_tags(&self, store: &TriangleStore) -> Result<(), HullError> {
        for edge in self.iter() {
            let owned = edge.triangle < store.len()
                && store
                    .edge_slot(edge.triangle, edge.from, edge.to)
                    .is_some_and(|k| store.neighbor(edge.triangle, k) == NO_NEIGHBOR);
            if !owned {
                return Err(HullError::StaleTag {
                    from: edge.from,
                    to: edge.to,
                    triangle: edge.triangle,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Hull {
    /// Formats the cycle as `(from,to,trig t)->...`, marking a broken link
    /// instead of following it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key = self.root;
        for _ in 0..self.edges.len() {
            let Some(edge) = self.edges.get(key) else {
                return write!(f, "<dangling>");
            };
            write!(f, "({},{},trig {})->", edge.from, edge.to, edge.triangle)?;
            match self.edges.get(edge.next) {
                Some(next) if next.prev != key => {
                    return write!(f, "<broken: next ({},{}) links back elsewhere>", next.from, next.to);
                }
                _ => {}
            }
            key = edge.next;
        }
        write!(f, "root")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges_of(hull: &Hull) -> Vec<(usize, usize)> {
        hull.iter().map(|e| (e.from, e.to)).collect()
    }

    #[test]
    fn test_from_triangle_builds_cycle() {
        let hull = Hull::from_triangle(1, 0, 2, 0);
        assert_eq!(hull.len(), 3);
        assert_eq!(edges_of(&hull), vec![(1, 0), (0, 2), (2, 1)]);
        assert_eq!(hull.vertices(), vec![1, 0, 2]);
        assert!(hull.validate().is_ok());
        assert_eq!(hull.keys_from_root().unwrap().len(), 3);
    }

    #[test]
    fn test_insert_after_and_unlink() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        let root = hull.root();
        let second = hull.next(root).unwrap();

        // Replace (1,2) by (1,3),(3,2).
        let removed = hull.unlink(second).unwrap();
        assert!(removed.is(1, 2));
        let lower = hull.insert_after(root, 1, 3, 1).unwrap();
        hull.insert_after(lower, 3, 2, 1).unwrap();

        assert_eq!(edges_of(&hull), vec![(0, 1), (1, 3), (3, 2), (2, 0)]);
        assert!(hull.validate().is_ok());
        assert_eq!(hull.get(second), Err(HullError::MissingEdge { key: second }));
    }

    #[test]
    fn test_unlink_root_moves_root() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        let root = hull.root();
        let next = hull.next(root).unwrap();
        hull.unlink(root).unwrap();
        assert_eq!(hull.root(), next);
        assert_eq!(hull.len(), 2);
    }

    #[test]
    fn test_unlink_last_edge_fails() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        hull.unlink(hull.root()).unwrap();
        hull.unlink(hull.root()).unwrap();
        assert_eq!(
            hull.unlink(hull.root()),
            Err(HullError::LastEdge { from: 2, to: 0 })
        );
    }

    #[test]
    fn test_validate_detects_disconnected_edges() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        let root = hull.root();
        hull.get_mut(root).unwrap().to = 7;
        assert!(matches!(
            hull.validate(),
            Err(HullError::Disconnected { from: 0, to: 7, .. })
        ));
    }

    #[test]
    fn test_validate_detects_broken_back_link() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        let root = hull.root();
        let second = hull.next(root).unwrap();
        hull.get_mut(second).unwrap().prev = second;
        assert!(matches!(
            hull.validate(),
            Err(HullError::BrokenLink { from: 0, to: 1, .. })
        ));
        assert!(hull.to_string().contains("<broken"));
    }

    #[test]
    fn test_retag_stops_after_all_fixes() {
        let mut hull = Hull::from_triangle(0, 1, 2, 0);
        let fixes = [
            TagFix { from: 1, to: 2, old: 0, new: 5 },
            TagFix { from: 2, to: 0, old: 0, new: 6 },
        ];
        assert_eq!(hull.retag(&fixes), 2);
        let tags: Vec<usize> = hull.iter().map(|e| e.triangle).collect();
        assert_eq!(tags, vec![0, 5, 6]);
        // Old tag no longer matches.
        assert_eq!(hull.retag(&fixes[..1]), 0);
        assert_eq!(hull.retag(&[]), 0);
    }

    #[test]
    fn test_validate_tags_against_store() {
        let mut store = TriangleStore::with_capacity(1);
        let t = store.push(0, 1, 2).unwrap();
        let hull = Hull::from_triangle(0, 1, 2, t);
        assert!(hull.validate_tags(&store).is_ok());

        let reversed = Hull::from_triangle(1, 0, 2, t);
        assert!(matches!(
            reversed.validate_tags(&store),
            Err(HullError::StaleTag { from: 1, to: 0, .. })
        ));
    }

    #[test]
    fn test_display() {
        let hull = Hull::from_triangle(0, 1, 2, 3);
        assert_eq!(
            hull.to_string(),
            "(0,1,trig 3)->(1,2,trig 3)->(2,0,trig 3)->root"
        );
    }
}
