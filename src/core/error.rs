//! Error types for catalog validation and pair selection.

#![forbid(unsafe_code)]

use crate::core::pair::Pair;
use crate::geometry::periodic_box::PeriodicBoxError;
use thiserror::Error;

/// Invalid configuration or malformed input. Raised before any index is built
/// and never clamped into a valid value.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::error::ConfigurationError;
///
/// let err = ConfigurationError::InvalidExclusionFactor { factor: 0.5 };
/// assert_eq!(
///     err.to_string(),
///     "Invalid exclusion factor 0.5; expected finite value >= 1"
/// );
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The exclusion factor is below one or not finite.
    #[error("Invalid exclusion factor {factor:?}; expected finite value >= 1")]
    InvalidExclusionFactor {
        /// Rejected factor.
        factor: f64,
    },

    /// The prominence lower threshold is not finite.
    #[error("Invalid prominence threshold {value:?}; expected finite value")]
    InvalidProminenceThreshold {
        /// Rejected threshold.
        value: f64,
    },

    /// The prominence upper limit is not finite.
    #[error("Invalid prominence upper limit {value:?}; expected finite value")]
    InvalidProminenceUpperLimit {
        /// Rejected limit.
        value: f64,
    },

    /// The box side is invalid or a position could not be wrapped into the box.
    #[error(transparent)]
    Domain(#[from] PeriodicBoxError),

    /// A catalog column does not have one entry per object.
    #[error("Catalog column `{column}` has {actual} entries; expected {expected}")]
    ColumnLengthMismatch {
        /// Name of the offending column.
        column: &'static str,
        /// Length of the position column.
        expected: usize,
        /// Length of the offending column.
        actual: usize,
    },

    /// A catalog value that must be finite is `NaN` or infinite.
    #[error("Non-finite {column} value at row {row}: {value:?}")]
    NonFiniteValue {
        /// Name of the offending column.
        column: &'static str,
        /// Row index.
        row: usize,
        /// Offending value.
        value: f64,
    },

    /// A catalog value that must be non-negative is below zero.
    #[error("Negative {column} value at row {row}: {value:?}; expected a value >= 0")]
    NegativeValue {
        /// Name of the offending column.
        column: &'static str,
        /// Row index.
        row: usize,
        /// Offending value.
        value: f64,
    },

    /// A required builder field was never set.
    #[error("Configuration field `{0}` was not initialized")]
    UninitializedField(&'static str),
}

impl From<derive_builder::UninitializedFieldError> for ConfigurationError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::UninitializedField(err.field_name())
    }
}

/// Errors that abort the processing of one realization.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum SelectionError {
    /// Configuration or input shape is invalid.
    #[error("Invalid configuration or input: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The spatial index returned a result that violates its own contract
    /// (a hit outside the requested radius or more hits than requested).
    /// Indicates an internal fault.
    #[error("Spatial index query around point {point} returned an inconsistent result{}: {detail}", pair_context(.pair))]
    IndexQueryInconsistency {
        /// Query point index.
        point: usize,
        /// Pair under test, if the query belonged to one.
        pair: Option<Pair>,
        /// What was wrong with the result.
        detail: String,
    },
}

fn pair_context(pair: &Option<Pair>) -> String {
    pair.map(|p| format!(" while checking pair {p}"))
        .unwrap_or_default()
}

impl From<PeriodicBoxError> for SelectionError {
    fn from(err: PeriodicBoxError) -> Self {
        Self::Configuration(ConfigurationError::Domain(err))
    }
}
