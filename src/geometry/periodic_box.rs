//! Periodic (toroidal) cubic domain and its minimum-image metric.
//!
//! A [`PeriodicBox`] identifies opposite faces of the cube `[0, L)^D`, so every
//! axis wraps with period `L`. Distances are taken over the nearest periodic
//! image: each axis difference is wrapped into `[-L/2, L/2]` before the
//! Euclidean norm is applied.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors emitted while constructing a [`PeriodicBox`] or wrapping coordinates into it.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PeriodicBoxError {
    /// The box side length is invalid (must be finite and strictly positive).
    #[error("Invalid box side length {side:?}; expected finite value > 0")]
    InvalidSide {
        /// Rejected side length.
        side: f64,
    },

    /// A coordinate is non-finite and cannot be wrapped into the box.
    #[error("Non-finite coordinate encountered while processing axis {axis}: {value:?}")]
    NonFiniteCoordinate {
        /// Axis index where the non-finite coordinate was encountered.
        axis: usize,
        /// Non-finite coordinate value.
        value: f64,
    },
}

/// A `D`-dimensional cube of side `L` with periodic boundaries on every axis.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::geometry::periodic_box::PeriodicBox;
///
/// let domain = PeriodicBox::<3>::new(10.0).unwrap();
/// let d = domain.distance(&[0.1, 5.0, 5.0], &[9.9, 5.0, 5.0]);
/// assert!((d - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicBox<const D: usize> {
    side: f64,
}

impl<const D: usize> PeriodicBox<D> {
    /// Creates a periodic box with the given side length.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodicBoxError::InvalidSide`] if `side` is not finite or not
    /// strictly positive.
    pub fn new(side: f64) -> Result<Self, PeriodicBoxError> {
        if !side.is_finite() || side <= 0.0 {
            return Err(PeriodicBoxError::InvalidSide { side });
        }
        Ok(Self { side })
    }

    /// Side length `L` of the box.
    #[must_use]
    pub const fn side(&self) -> f64 {
        self.side
    }

    /// Half the side length. No two points are further apart than this along a single axis.
    #[must_use]
    pub fn half_side(&self) -> f64 {
        0.5 * self.side
    }

    /// Wraps a single coordinate into `[0, L)`.
    ///
    /// `rem_euclid` can round a tiny negative value up to exactly `L`; that
    /// case folds back onto `0` so the half-open interval always holds.
    #[must_use]
    pub fn wrap_coordinate(&self, value: f64) -> f64 {
        let wrapped = value.rem_euclid(self.side);
        if wrapped >= self.side { 0.0 } else { wrapped }
    }

    /// Wraps coordinates into the fundamental domain `[0, L)^D` in place.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodicBoxError::NonFiniteCoordinate`] if any coordinate is
    /// `NaN` or infinite. Coordinates are left untouched in that case.
    pub fn canonicalize_point(&self, coords: &mut [f64; D]) -> Result<(), PeriodicBoxError> {
        check_finite(coords)?;
        for coord in coords.iter_mut() {
            *coord = self.wrap_coordinate(*coord);
        }
        Ok(())
    }

    /// Shifts raw catalog coordinates by half a box and wraps them:
    /// `x -> (x + L/2) mod L`.
    ///
    /// Source catalogs store positions in `[-L/2, L/2)`; downstream consumers
    /// expect `[0, L)` with this exact shift, so it must be applied once and
    /// only once per position.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodicBoxError::NonFiniteCoordinate`] if any coordinate is
    /// `NaN` or infinite.
    pub fn recenter(&self, coords: &mut [f64; D]) -> Result<(), PeriodicBoxError> {
        check_finite(coords)?;
        let half = self.half_side();
        for coord in coords.iter_mut() {
            *coord = self.wrap_coordinate(*coord + half);
        }
        Ok(())
    }

    /// Wraps an axis difference into `[-L/2, L/2]` (minimum image convention).
    #[must_use]
    pub fn wrap_delta(&self, delta: f64) -> f64 {
        let reduced = delta.rem_euclid(self.side);
        if reduced > self.half_side() {
            reduced - self.side
        } else {
            reduced
        }
    }

    /// Minimum-image displacement vector from `a` to `b`.
    #[must_use]
    pub fn displacement(&self, a: &[f64; D], b: &[f64; D]) -> [f64; D] {
        let mut delta = [0.0; D];
        for (axis, slot) in delta.iter_mut().enumerate() {
            *slot = self.wrap_delta(b[axis] - a[axis]);
        }
        delta
    }

    /// Squared periodic distance between `a` and `b`.
    #[must_use]
    pub fn distance_squared(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        self.displacement(a, b).iter().map(|d| d * d).sum()
    }

    /// Periodic distance between `a` and `b`.
    #[must_use]
    pub fn distance(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        self.distance_squared(a, b).sqrt()
    }
}

fn check_finite<const D: usize>(coords: &[f64; D]) -> Result<(), PeriodicBoxError> {
    for (axis, &value) in coords.iter().enumerate() {
        if !value.is_finite() {
            return Err(PeriodicBoxError::NonFiniteCoordinate { axis, value });
        }
    }
    Ok(())
}
