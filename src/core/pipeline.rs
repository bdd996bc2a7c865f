//! The per-realization selection pipeline.
//!
//! Stages, in order, each only narrowing the candidate list:
//!
//! 1. keep catalog rows with prominence strictly above the threshold and move
//!    their positions into `[0, L)`;
//! 2. build the periodic index over the selected points and pair reciprocal
//!    nearest neighbours;
//! 3. keep isolated pairs;
//! 4. when an upper limit is configured, drop pairs with a member at or above it;
//! 5. when enabled, drop pairs with a member whose mass proxy is not positive.
//!
//! [`select_pairs`] is the pure `(catalog, config) -> result` core;
//! [`SelectionPipeline`] wraps a validated configuration and
//! [`process_batch`] fans independent realizations out over rayon.

#![forbid(unsafe_code)]

use crate::core::algorithms::isolation::filter_isolated;
use crate::core::algorithms::reciprocal::find_reciprocal_pairs;
use crate::core::catalog::{Catalog, PairCatalog};
use crate::core::config::{RealizationId, SelectionConfig};
use crate::core::error::SelectionError;
use crate::core::pair::Pair;
use crate::core::point::{Point, Position};
use crate::core::spatial_index::PeriodicIndex;
use crate::geometry::periodic_box::PeriodicBox;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of candidates alive after each stage of one run.
///
/// Disabled stages pass their input through, so their count equals the
/// previous stage's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Rows in the input catalog.
    pub catalog_size: usize,
    /// Points above the prominence threshold.
    pub selected: usize,
    /// Reciprocal nearest-neighbour pairs.
    pub reciprocal: usize,
    /// Pairs passing the isolation test.
    pub isolated: usize,
    /// Pairs passing the prominence upper limit.
    pub within_upper_limit: usize,
    /// Pairs passing every stage.
    pub final_pairs: usize,
    /// Fewer than two points were selected, so no index was built.
    pub short_circuited: bool,
}

/// Outcome of one realization.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionResult {
    /// Realization label.
    pub realization: RealizationId,
    /// Box side length.
    pub box_size: f64,
    /// Selected points with wrapped positions; pair members index into this.
    pub points: Vec<Point>,
    /// Surviving pairs, canonical and ascending.
    pub pairs: Vec<Pair>,
    /// Per-stage counts.
    pub report: SelectionReport,
    include_selected_set: bool,
}

impl SelectionResult {
    /// Assembles the A/B output record of the surviving pairs.
    #[must_use]
    pub fn to_pair_catalog(&self) -> PairCatalog {
        PairCatalog::from_pairs(
            self.realization,
            self.box_size,
            &self.points,
            &self.pairs,
            self.include_selected_set,
        )
    }
}

/// Selection pipeline bound to one validated configuration.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::catalog::Catalog;
/// use halo_pairs::core::config::SelectionConfig;
/// use halo_pairs::core::pipeline::SelectionPipeline;
///
/// // Raw positions are in [-L/2, L/2); the pipeline recenters them.
/// let catalog = Catalog::new(
///     1000.0,
///     vec![[-400.0, -400.0, -400.0], [-399.0, -400.0, -400.0], [0.0, 0.0, 0.0]],
///     vec![[0.0; 3]; 3],
///     vec![250.0, 240.0, 300.0],
///     vec![10, 12, 14],
///     vec![100, 101, 102],
/// )
/// .unwrap();
///
/// let pipeline = SelectionPipeline::new(SelectionConfig::default()).unwrap();
/// let result = pipeline.run(&catalog).unwrap();
/// assert_eq!(result.pairs.len(), 1);
/// assert_eq!(result.points[0].position(), &[100.0, 100.0, 100.0]);
///
/// let record = result.to_pair_catalog();
/// assert_eq!(record.id_a, vec![100]);
/// assert_eq!(record.id_b, vec![101]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionPipeline {
    config: SelectionConfig,
}

impl SelectionPipeline {
    /// # Errors
    ///
    /// Returns [`SelectionError::Configuration`] if `config` fails validation.
    pub fn new(config: SelectionConfig) -> Result<Self, SelectionError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Runs every stage on `catalog`.
    ///
    /// # Errors
    ///
    /// See [`select_pairs`].
    pub fn run(&self, catalog: &Catalog) -> Result<SelectionResult, SelectionError> {
        select_pairs(catalog, &self.config)
    }
}

/// Runs the whole pipeline on one catalog.
///
/// # Errors
///
/// - [`SelectionError::Configuration`] for an invalid configuration, checked
///   before any point is touched.
/// - [`SelectionError::IndexQueryInconsistency`] if the spatial index breaks
///   its query contract.
pub fn select_pairs(catalog: &Catalog, config: &SelectionConfig) -> Result<SelectionResult, SelectionError> {
    config.validate()?;

    let span = tracing::info_span!("realization", id = %config.realization);
    let _entered = span.enter();

    let domain = *catalog.domain();
    let mut report = SelectionReport {
        catalog_size: catalog.len(),
        ..SelectionReport::default()
    };

    let points = preselect(catalog, config)?;
    report.selected = points.len();
    tracing::info!(
        catalog_size = report.catalog_size,
        selected = report.selected,
        threshold = config.prominence_threshold,
        "selected points above prominence threshold"
    );

    let result = |pairs: Vec<Pair>, report: SelectionReport, points: Vec<Point>| SelectionResult {
        realization: config.realization,
        box_size: domain.side(),
        points,
        pairs,
        report,
        include_selected_set: config.include_selected_set,
    };

    if points.len() < 2 {
        report.short_circuited = true;
        tracing::warn!(
            selected = points.len(),
            "fewer than two points above threshold; no pairs possible"
        );
        return Ok(result(Vec::new(), report, points));
    }

    let positions: Vec<Position> = points.iter().map(|p| *p.position()).collect();
    let index = PeriodicIndex::build(domain, &positions)?;

    let pairs = find_reciprocal_pairs(&index, config.parallel)?;
    report.reciprocal = pairs.len();
    tracing::info!(pairs = report.reciprocal, "found potential pairs");

    let pairs = filter_isolated(
        &pairs,
        &points,
        &index,
        config.exclusion_factor,
        config.parallel,
    )?;
    report.isolated = pairs.len();
    tracing::info!(pairs = report.isolated, "found isolated pairs");

    let pairs = match config.prominence_upper_limit {
        Some(limit) => {
            let kept = drop_above_upper_limit(pairs, &points, limit);
            tracing::info!(pairs = kept.len(), limit, "applied prominence upper limit");
            kept
        }
        None => pairs,
    };
    report.within_upper_limit = pairs.len();

    let pairs = if config.require_positive_mass {
        let kept = drop_non_positive_mass(pairs, &points);
        tracing::info!(pairs = kept.len(), "dropped pairs with non-positive mass");
        kept
    } else {
        pairs
    };
    report.final_pairs = pairs.len();

    Ok(result(pairs, report, points))
}

/// Stage 1: rows with prominence strictly above the threshold, positions
/// moved into `[0, L)`.
///
/// With `recenter_positions` the raw coordinates get the `(x + L/2) mod L`
/// shift; otherwise they are only wrapped.
///
/// # Errors
///
/// Returns [`SelectionError::Configuration`] for a non-finite coordinate.
pub fn preselect(catalog: &Catalog, config: &SelectionConfig) -> Result<Vec<Point>, SelectionError> {
    let domain = catalog.domain();
    catalog
        .rows()
        .filter(|row| row.prominence() > config.prominence_threshold)
        .map(|row| -> Result<Point, SelectionError> {
            let mut position = *row.position();
            move_into_box(domain, &mut position, config.recenter_positions)?;
            Ok(row.with_position(position))
        })
        .collect()
}

fn move_into_box(
    domain: &PeriodicBox<3>,
    position: &mut Position,
    recenter: bool,
) -> Result<(), SelectionError> {
    if recenter {
        domain.recenter(position)?;
    } else {
        domain.canonicalize_point(position)?;
    }
    Ok(())
}

/// Stage 4: drops pairs with either member's prominence `>= limit`.
///
/// # Panics
///
/// Panics if a pair member is out of bounds for `points`.
#[must_use]
pub fn drop_above_upper_limit(pairs: Vec<Pair>, points: &[Point], limit: f64) -> Vec<Pair> {
    pairs
        .into_iter()
        .filter(|pair| {
            points[pair.first()].prominence() < limit && points[pair.second()].prominence() < limit
        })
        .collect()
}

/// Stage 5: drops pairs with either member's mass proxy `<= 0`.
///
/// # Panics
///
/// Panics if a pair member is out of bounds for `points`.
#[must_use]
pub fn drop_non_positive_mass(pairs: Vec<Pair>, points: &[Point]) -> Vec<Pair> {
    pairs
        .into_iter()
        .filter(|pair| {
            points[pair.first()].has_positive_mass() && points[pair.second()].has_positive_mass()
        })
        .collect()
}

/// Runs independent realizations, in parallel when `config.parallel` is set.
///
/// Each catalog is processed with `config` relabelled by its realization id.
/// One result is returned per input, in input order; a failing realization
/// never aborts the others.
#[must_use]
pub fn process_batch(
    catalogs: &[(RealizationId, Catalog)],
    config: &SelectionConfig,
) -> Vec<(RealizationId, Result<SelectionResult, SelectionError>)> {
    let run = |(id, catalog): &(RealizationId, Catalog)| {
        let outcome = select_pairs(catalog, &config.for_realization(*id));
        if let Err(err) = &outcome {
            tracing::error!(realization = %id, error = %err, "realization failed");
        }
        (*id, outcome)
    };

    if config.parallel {
        catalogs.par_iter().map(run).collect()
    } else {
        catalogs.iter().map(run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SelectionConfigBuilder;
    use crate::core::error::ConfigurationError;
    use approx::assert_relative_eq;

    fn catalog(rows: &[Point]) -> Catalog {
        Catalog::from_points(1000.0, rows).unwrap()
    }

    fn unshifted() -> SelectionConfig {
        SelectionConfigBuilder::default()
            .recenter_positions(false)
            .parallel(false)
            .build()
            .unwrap()
    }

    fn row(x: f64, prominence: f64, mass: i64) -> Point {
        Point::new([x, 100.0, 100.0], [0.0; 3], prominence, mass, 0)
    }

    #[test]
    fn test_preselect_is_strict_and_recenters() {
        let rows = [row(-500.0, 200.0, 1), row(-400.0, 200.5, 1), row(499.0, 900.0, 1)];
        let config = SelectionConfig::default();
        let points = preselect(&catalog(&rows), &config).unwrap();
        assert_eq!(points.len(), 2, "prominence equal to the threshold is excluded");
        assert_relative_eq!(points[0].position()[0], 100.0);
        assert_relative_eq!(points[0].position()[1], 600.0);
        assert_relative_eq!(points[1].position()[0], 999.0);

        let points = preselect(&catalog(&rows), &unshifted()).unwrap();
        assert_relative_eq!(points[0].position()[0], 600.0);
        assert_relative_eq!(points[1].position()[0], 499.0);
    }

    #[test]
    fn test_short_circuit_on_fewer_than_two_selected() {
        let rows = [row(10.0, 250.0, 1), row(11.0, 150.0, 1)];
        let result = select_pairs(&catalog(&rows), &unshifted()).unwrap();
        assert!(result.pairs.is_empty());
        assert!(result.report.short_circuited);
        assert_eq!(result.report.catalog_size, 2);
        assert_eq!(result.report.selected, 1);
        assert!(result.to_pair_catalog().is_empty());
    }

    #[test]
    fn test_report_counts_every_stage() {
        let rows = [
            row(10.0, 250.0, 1),
            row(11.0, 240.0, 1),
            row(300.0, 260.0, 1),
            row(301.0, 245.0, -1),
            row(600.0, 250.0, 1),
            row(601.0, 240.0, 1),
            row(602.5, 300.0, 1),
        ];
        let config = SelectionConfig {
            prominence_upper_limit: Some(255.0),
            ..unshifted()
        };
        let result = select_pairs(&catalog(&rows), &config).unwrap();
        assert_eq!(result.report.selected, 7);
        assert_eq!(result.report.reciprocal, 3);
        assert_eq!(result.report.isolated, 2);
        assert_eq!(result.report.within_upper_limit, 1);
        assert_eq!(result.report.final_pairs, 1);
        assert_eq!(result.pairs, vec![Pair::new(0, 1).unwrap()]);
        assert!(!result.report.short_circuited);
    }

    #[test]
    fn test_upper_limit_boundary_is_exclusive() {
        let points = [row(0.0, 245.0, 1), row(1.0, 244.999, 1), row(2.0, 100.0, 1)];
        let pairs = vec![Pair::new(0, 2).unwrap(), Pair::new(1, 2).unwrap()];
        assert_eq!(
            drop_above_upper_limit(pairs, &points, 245.0),
            vec![Pair::new(1, 2).unwrap()]
        );
    }

    #[test]
    fn test_positive_mass_filter() {
        let points = [row(0.0, 1.0, 0), row(1.0, 1.0, 5), row(2.0, 1.0, 7)];
        let pairs = vec![Pair::new(0, 1).unwrap(), Pair::new(1, 2).unwrap()];
        assert_eq!(
            drop_non_positive_mass(pairs, &points),
            vec![Pair::new(1, 2).unwrap()]
        );
    }

    #[test]
    fn test_invalid_config_fails_before_any_work() {
        let config = SelectionConfig {
            exclusion_factor: 0.9,
            ..SelectionConfig::default()
        };
        assert!(matches!(
            SelectionPipeline::new(config.clone()),
            Err(SelectionError::Configuration(
                ConfigurationError::InvalidExclusionFactor { .. }
            ))
        ));
        let rows = [row(10.0, 250.0, 1), row(11.0, 240.0, 1)];
        assert!(select_pairs(&catalog(&rows), &config).is_err());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let good = catalog(&[row(10.0, 250.0, 1), row(11.0, 240.0, 1)]);
        let empty = catalog(&[]);
        let batch = vec![
            (RealizationId::new(0, 0), good.clone()),
            (RealizationId::new(1, 0), empty),
            (RealizationId::new(2, 0), good),
        ];
        let results = process_batch(&batch, &SelectionConfig::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].0, RealizationId::new(1, 0));
        let first = results[0].1.as_ref().unwrap();
        assert_eq!(first.realization, RealizationId::new(0, 0));
        assert_eq!(first.pairs.len(), 1);
        assert!(results[1].1.as_ref().unwrap().report.short_circuited);

        let bad = SelectionConfig {
            exclusion_factor: f64::NAN,
            ..SelectionConfig::default()
        };
        let results = process_batch(&batch, &bad);
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }
}
