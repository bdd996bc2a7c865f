//! Utilities for building synthetic catalogs.
//!
//! The generators live in [`point_generation`]; they are used by the tests
//! and benchmarks and are handy for exercising the pipeline without a
//! catalog on disk.

#![forbid(unsafe_code)]

use crate::core::error::ConfigurationError;
use thiserror::Error;

pub mod point_generation;

pub use point_generation::*;

/// Errors raised while generating synthetic catalogs.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PointGenerationError {
    /// The requested value range is empty or not finite.
    #[error("Invalid range [{min}, {max}); expected finite min < max")]
    InvalidRange {
        /// Lower end of the range.
        min: f64,
        /// Upper end of the range.
        max: f64,
    },

    /// The box side is not a finite positive value.
    #[error("Invalid box size {box_size:?}; expected finite value > 0")]
    InvalidBoxSize {
        /// Rejected side length.
        box_size: f64,
    },

    /// The pair separation does not fit the box.
    #[error("Invalid pair separation {separation:?}; expected finite value in (0, {max})")]
    InvalidSeparation {
        /// Rejected separation.
        separation: f64,
        /// Exclusive upper bound (half the box side).
        max: f64,
    },

    /// The cluster parameters do not describe a sub-cube of the box.
    #[error(
        "Invalid cluster (fraction {fraction:?}, side {side:?}); expected fraction in [0, 1] and side in (0, {box_size}]"
    )]
    InvalidCluster {
        /// Rejected fraction of clustered rows.
        fraction: f64,
        /// Rejected cluster side.
        side: f64,
        /// Box side the cluster must fit in.
        box_size: f64,
    },

    /// The generated columns were rejected by the catalog.
    #[error(transparent)]
    Catalog(#[from] ConfigurationError),
}
