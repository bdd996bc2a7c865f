//! Pipeline configuration.
//!
//! [`SelectionConfig`] enumerates the optional stages of the selection
//! pipeline instead of keeping one pipeline variant per combination. Build it
//! with [`SelectionConfigBuilder`]; the builder validates every value it was
//! given.
//!
//! ```rust
//! use halo_pairs::core::config::{RealizationId, SelectionConfigBuilder};
//!
//! let config = SelectionConfigBuilder::default()
//!     .prominence_threshold(150.0)
//!     .prominence_upper_limit(300.0)
//!     .realization(RealizationId::new(2, 0))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.exclusion_factor, 3.0);
//! assert_eq!(config.prominence_upper_limit, Some(300.0));
//! assert_eq!(config.realization.to_string(), "c002_ph000");
//!
//! assert!(SelectionConfigBuilder::default().exclusion_factor(0.5).build().is_err());
//! ```

#![forbid(unsafe_code)]

use crate::core::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default prominence lower threshold (km/s for peak circular velocities).
pub const DEFAULT_PROMINENCE_THRESHOLD: f64 = 200.0;

/// Default ratio between the isolation radius and the pair separation.
pub const DEFAULT_EXCLUSION_FACTOR: f64 = 3.0;

/// Identifies one realization of a simulation suite. Only used for labelling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RealizationId {
    /// Cosmology index.
    pub cosmology: u32,
    /// Phase (initial-condition seed) index.
    pub phase: u32,
}

impl RealizationId {
    #[must_use]
    pub const fn new(cosmology: u32, phase: u32) -> Self {
        Self { cosmology, phase }
    }
}

impl fmt::Display for RealizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{:03}_ph{:03}", self.cosmology, self.phase)
    }
}

/// Parameters of one pipeline run.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "ConfigurationError"))]
pub struct SelectionConfig {
    /// Points must have prominence strictly above this value to be indexed.
    #[builder(default = "DEFAULT_PROMINENCE_THRESHOLD")]
    pub prominence_threshold: f64,

    /// When set, pairs with a member at or above this prominence are dropped.
    #[builder(setter(into, strip_option), default)]
    pub prominence_upper_limit: Option<f64>,

    /// Isolation radius in units of the pair separation. Must be `>= 1`.
    #[builder(default = "DEFAULT_EXCLUSION_FACTOR")]
    pub exclusion_factor: f64,

    /// Drop pairs with a member whose mass proxy is not positive.
    #[builder(default = "true")]
    pub require_positive_mass: bool,

    /// Apply the `(x + L/2) mod L` shift to raw catalog positions. When
    /// `false`, positions are only wrapped into `[0, L)`.
    #[builder(default = "true")]
    pub recenter_positions: bool,

    /// Echo the whole selected set in the output records.
    #[builder(default = "false")]
    pub include_selected_set: bool,

    /// Evaluate per-point and per-pair queries on the rayon thread pool.
    #[builder(default = "true")]
    pub parallel: bool,

    /// Label of the realization being processed.
    #[builder(default)]
    pub realization: RealizationId,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            prominence_threshold: DEFAULT_PROMINENCE_THRESHOLD,
            prominence_upper_limit: None,
            exclusion_factor: DEFAULT_EXCLUSION_FACTOR,
            require_positive_mass: true,
            recenter_positions: true,
            include_selected_set: false,
            parallel: true,
            realization: RealizationId::default(),
        }
    }
}

impl SelectionConfig {
    /// Checks every numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found: exclusion factor below
    /// one or non-finite, non-finite threshold or upper limit.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_exclusion_factor(self.exclusion_factor)?;
        check_threshold(self.prominence_threshold)?;
        if let Some(limit) = self.prominence_upper_limit {
            check_upper_limit(limit)?;
        }
        Ok(())
    }

    /// Copy of this configuration labelled with another realization.
    #[must_use]
    pub fn for_realization(&self, realization: RealizationId) -> Self {
        Self {
            realization,
            ..*self
        }
    }
}

impl SelectionConfigBuilder {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(factor) = self.exclusion_factor {
            check_exclusion_factor(factor)?;
        }
        if let Some(threshold) = self.prominence_threshold {
            check_threshold(threshold)?;
        }
        if let Some(Some(limit)) = self.prominence_upper_limit {
            check_upper_limit(limit)?;
        }
        Ok(())
    }
}

pub(crate) fn check_exclusion_factor(factor: f64) -> Result<(), ConfigurationError> {
    if factor.is_finite() && factor >= 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidExclusionFactor { factor })
    }
}

fn check_threshold(value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidProminenceThreshold { value })
    }
}

fn check_upper_limit(value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidProminenceUpperLimit { value })
    }
}
