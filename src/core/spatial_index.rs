//! Periodic spatial index answering k-nearest and radius-ball queries.
//!
//! [`PeriodicIndex`] is built once from a fixed set of positions and is
//! read-only afterwards, so a single index can be shared across rayon workers
//! by reference. Distances follow the minimum-image metric of the
//! [`PeriodicBox`] it was built with.
//!
//! # Examples
//!
//! ```rust
//! use halo_pairs::core::spatial_index::PeriodicIndex;
//! use halo_pairs::geometry::periodic_box::PeriodicBox;
//!
//! let domain = PeriodicBox::<3>::new(10.0).unwrap();
//! let positions = [[0.1, 5.0, 5.0], [9.8, 5.0, 5.0], [5.0, 5.0, 5.0]];
//! let index = PeriodicIndex::build(domain, &positions).unwrap();
//!
//! let hits = index.nearest_k(&positions[0], 2, None);
//! assert_eq!(hits[0].index, 0);
//! assert_eq!(hits[1].index, 1); // across the periodic boundary
//! assert!(index.ball(&positions[0], 1.0).iter().all(|n| n.index != 2));
//! ```

#![forbid(unsafe_code)]

use crate::core::collections::periodic_kd_tree::PeriodicKdTree;
use crate::geometry::periodic_box::{PeriodicBox, PeriodicBoxError};

/// A query hit: the index of an indexed point and its periodic distance to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the slice the index was built from.
    pub index: usize,
    /// Periodic distance from the query position.
    pub distance: f64,
}

/// Immutable spatial index over points in a periodic box.
#[derive(Clone, Debug)]
pub struct PeriodicIndex<const D: usize> {
    domain: PeriodicBox<D>,
    tree: PeriodicKdTree<D>,
}

impl<const D: usize> PeriodicIndex<D> {
    /// Builds the index. Positions are wrapped into `[0, L)^D`; positions that
    /// already lie in the box are stored unchanged.
    ///
    /// Construction is `O(n log n)` and query cost does not depend on how
    /// clustered the positions are.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodicBoxError::NonFiniteCoordinate`] if any coordinate is
    /// `NaN` or infinite.
    pub fn build(domain: PeriodicBox<D>, positions: &[[f64; D]]) -> Result<Self, PeriodicBoxError> {
        let mut stored = Vec::with_capacity(positions.len());
        for position in positions {
            let mut coords = *position;
            domain.canonicalize_point(&mut coords)?;
            stored.push(coords);
        }
        let tree = PeriodicKdTree::build(domain, stored);

        tracing::debug!(
            points = tree.len(),
            nodes = tree.node_count(),
            depth = tree.depth(),
            "built periodic index"
        );

        Ok(Self { domain, tree })
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` when no point is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// The periodic box this index measures distances in.
    #[must_use]
    pub const fn domain(&self) -> &PeriodicBox<D> {
        &self.domain
    }

    /// Stored (wrapped) position of point `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<&[f64; D]> {
        self.tree.position(index)
    }

    /// Returns up to `k` indexed points closest to `query`, ascending by
    /// distance with ties broken by lowest index.
    ///
    /// Points farther than `upper_bound` (when given) are excluded. A query
    /// that is itself an indexed position finds itself first at distance `0`.
    /// Non-finite queries, `k == 0` and an empty index yield no hits.
    #[must_use]
    pub fn nearest_k(&self, query: &[f64; D], k: usize, upper_bound: Option<f64>) -> Vec<Neighbor> {
        let Some(query) = self.wrap_query(query) else {
            return Vec::new();
        };
        if k == 0 || self.is_empty() || upper_bound.is_some_and(|b| b.is_nan() || b < 0.0) {
            return Vec::new();
        }

        self.tree
            .nearest(&query, k, upper_bound.map(|b| b * b))
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.distance_squared.sqrt(),
            })
            .collect()
    }

    /// Returns every indexed point within periodic distance `radius` of
    /// `query`, boundary inclusive, in unspecified order.
    ///
    /// Negative or `NaN` radii, non-finite queries and an empty index yield no hits.
    #[must_use]
    pub fn ball(&self, query: &[f64; D], radius: f64) -> Vec<Neighbor> {
        let mut hits = Vec::new();
        self.visit_ball(query, radius, |neighbor| {
            hits.push(neighbor);
            true
        });
        hits
    }

    /// Calls `f` for every indexed point within `radius` of `query` until `f`
    /// returns `false`.
    ///
    /// Returns `false` if the visitor stopped the walk early.
    pub fn visit_ball<F>(&self, query: &[f64; D], radius: f64, mut f: F) -> bool
    where
        F: FnMut(Neighbor) -> bool,
    {
        let Some(query) = self.wrap_query(query) else {
            return true;
        };
        if self.is_empty() || radius.is_nan() || radius < 0.0 {
            return true;
        }

        self.tree
            .visit_within(&query, radius, &mut |index, distance| f(Neighbor { index, distance }))
    }

    fn wrap_query(&self, query: &[f64; D]) -> Option<[f64; D]> {
        let mut coords = *query;
        self.domain.canonicalize_point(&mut coords).ok()?;
        Some(coords)
    }
}
