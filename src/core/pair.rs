//! Canonical unordered index pairs.

#![forbid(unsafe_code)]

use crate::core::point::Point;
use crate::geometry::periodic_box::PeriodicBox;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A pair whose two members are the same point.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("Pair members must be distinct, got ({0}, {0})")]
pub struct SelfPairError(pub usize);

/// Unordered pair of point indices, stored with the smaller index first.
///
/// The canonical order makes `Pair::new(3, 1) == Pair::new(1, 3)`, so a pair
/// found from either member collapses onto one entry in a set. Ordering is
/// lexicographic on `(first, second)`.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::pair::Pair;
///
/// let pair = Pair::new(5, 2).unwrap();
/// assert_eq!(pair.indices(), (2, 5));
/// assert!(Pair::new(4, 4).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Pair {
    first: usize,
    second: usize,
}

impl Pair {
    /// Creates the canonical pair `(min(a, b), max(a, b))`.
    ///
    /// # Errors
    ///
    /// Returns [`SelfPairError`] when `a == b`.
    pub const fn new(a: usize, b: usize) -> Result<Self, SelfPairError> {
        if a == b {
            return Err(SelfPairError(a));
        }
        if a < b {
            Ok(Self {
                first: a,
                second: b,
            })
        } else {
            Ok(Self {
                first: b,
                second: a,
            })
        }
    }

    /// The smaller index ("A side").
    #[must_use]
    pub const fn first(&self) -> usize {
        self.first
    }

    /// The larger index ("B side").
    #[must_use]
    pub const fn second(&self) -> usize {
        self.second
    }

    #[must_use]
    pub const fn indices(&self) -> (usize, usize) {
        (self.first, self.second)
    }

    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        self.first == index || self.second == index
    }

    /// Periodic distance between the two members.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds for `points`.
    #[must_use]
    pub fn separation(&self, points: &[Point], domain: &PeriodicBox<3>) -> f64 {
        domain.distance(
            points[self.first].position(),
            points[self.second].position(),
        )
    }
}

impl TryFrom<(usize, usize)> for Pair {
    type Error = SelfPairError;

    fn try_from((a, b): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(a, b)
    }
}

impl From<Pair> for (usize, usize) {
    fn from(pair: Pair) -> Self {
        pair.indices()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}
