//! End-to-end selection scenarios on small hand-built catalogs.
//!
//! Positions are given in `[0, L)` and the shift is disabled, so catalog rows,
//! selected points and pair members share one numbering.

use approx::assert_relative_eq;
use halo_pairs::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Fixtures
// =============================================================================

const BOX_SIZE: f64 = 10.0;

fn row(position: [f64; 3], prominence: f64) -> Point {
    Point::new(position, [0.0; 3], prominence, 1, 0)
}

/// Two well separated close pairs.
fn two_close_pairs() -> Vec<Point> {
    vec![
        row([1.0, 1.0, 1.0], 250.0),
        row([1.1, 1.0, 1.0], 240.0),
        row([8.0, 8.0, 8.0], 260.0),
        row([8.2, 8.0, 8.0], 245.0),
    ]
}

fn config() -> SelectionConfigBuilder {
    let mut builder = SelectionConfigBuilder::default();
    builder
        .prominence_threshold(200.0)
        .exclusion_factor(3.0)
        .recenter_positions(false);
    builder
}

fn run(rows: &[Point], config: &SelectionConfig) -> SelectionResult {
    init_tracing();
    let catalog = Catalog::from_points(BOX_SIZE, rows).unwrap();
    select_pairs(&catalog, config).unwrap()
}

fn pair(a: usize, b: usize) -> Pair {
    Pair::new(a, b).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn two_isolated_pairs_both_survive() {
    let result = run(&two_close_pairs(), &config().build().unwrap());
    assert_eq!(result.pairs, vec![pair(0, 1), pair(2, 3)]);
    assert_eq!(result.report.selected, 4);
    assert_eq!(result.report.reciprocal, 2);
    assert_eq!(result.report.final_pairs, 2);
}

#[test]
fn brighter_point_beside_a_pair_removes_only_that_pair() {
    let mut rows = two_close_pairs();
    rows.push(row([1.05, 1.0, 1.0], 500.0));
    let result = run(&rows, &config().build().unwrap());

    assert!(!result.pairs.contains(&pair(0, 1)));
    assert!(result.pairs.contains(&pair(2, 3)));

    // Even as a candidate, (0, 1) fails isolation because of point 4.
    let positions: Vec<[f64; 3]> = result.points.iter().map(|p| *p.position()).collect();
    let index = PeriodicIndex::build(PeriodicBox::new(BOX_SIZE).unwrap(), &positions).unwrap();
    assert!(!is_isolated(&pair(0, 1), &result.points, &index, 3.0).unwrap());
    assert!(is_isolated(&pair(2, 3), &result.points, &index, 3.0).unwrap());
}

#[test]
fn upper_limit_rejects_pairs_with_a_member_at_or_above_it() {
    let result = run(
        &two_close_pairs(),
        &config().prominence_upper_limit(245.0).build().unwrap(),
    );
    // (2, 3) has a member at exactly 245, (0, 1) has a member at 250.
    assert!(result.pairs.is_empty());
    assert_eq!(result.report.isolated, 2);
    assert_eq!(result.report.within_upper_limit, 0);
}

#[test]
fn upper_limit_equal_to_member_prominence_rejects_the_pair() {
    let at_limit = run(
        &two_close_pairs(),
        &config().prominence_upper_limit(260.0).build().unwrap(),
    );
    assert_eq!(at_limit.pairs, vec![pair(0, 1)]);

    let just_above = run(
        &two_close_pairs(),
        &config().prominence_upper_limit(260.0 + 1e-9).build().unwrap(),
    );
    assert_eq!(just_above.pairs, vec![pair(0, 1), pair(2, 3)]);
}

#[test]
fn single_point_catalog_yields_nothing() {
    let result = run(&[row([5.0, 5.0, 5.0], 900.0)], &config().build().unwrap());
    assert!(result.pairs.is_empty());
    assert!(result.report.short_circuited);
}

#[test]
fn empty_catalog_yields_nothing() {
    let result = run(&[], &config().build().unwrap());
    assert!(result.pairs.is_empty());
    assert!(result.report.short_circuited);
    assert_eq!(result.report.catalog_size, 0);
}

// =============================================================================
// Filters and conventions
// =============================================================================

#[test]
fn positive_mass_filter_is_optional() {
    let mut rows = two_close_pairs();
    rows[3] = Point::new([8.2, 8.0, 8.0], [0.0; 3], 245.0, 0, 0);

    let filtered = run(&rows, &config().build().unwrap());
    assert_eq!(filtered.pairs, vec![pair(0, 1)]);

    let unfiltered = run(&rows, &config().require_positive_mass(false).build().unwrap());
    assert_eq!(unfiltered.pairs, vec![pair(0, 1), pair(2, 3)]);
}

#[test]
fn pairs_across_the_periodic_boundary_are_found() {
    let rows = [
        row([0.01 * BOX_SIZE, 5.0, 5.0], 250.0),
        row([0.99 * BOX_SIZE, 5.0, 5.0], 240.0),
        row([5.0, 5.0, 5.0], 300.0),
    ];
    let result = run(&rows, &config().build().unwrap());
    assert_eq!(result.pairs, vec![pair(0, 1)]);

    let domain = PeriodicBox::<3>::new(BOX_SIZE).unwrap();
    assert_relative_eq!(
        result.pairs[0].separation(&result.points, &domain),
        0.02 * BOX_SIZE,
        epsilon = 1e-9
    );
}

#[test]
fn recentering_shifts_positions_but_not_pairs() {
    let shifted = run(
        &two_close_pairs(),
        &config().recenter_positions(true).build().unwrap(),
    );
    assert_eq!(shifted.pairs, vec![pair(0, 1), pair(2, 3)]);
    assert_relative_eq!(shifted.points[0].position()[0], 6.0);
    assert_relative_eq!(shifted.points[2].position()[0], 3.0);
}

#[test]
fn output_record_carries_both_members() {
    let rows = vec![
        Point::new([1.0, 1.0, 1.0], [1.0, 2.0, 3.0], 250.0, 11, 1001),
        Point::new([1.1, 1.0, 1.0], [4.0, 5.0, 6.0], 240.0, 12, 1002),
        Point::new([6.0, 6.0, 6.0], [0.0; 3], 150.0, 13, 1003),
    ];
    let result = run(
        &rows,
        &config()
            .include_selected_set(true)
            .realization(RealizationId::new(4, 2))
            .build()
            .unwrap(),
    );
    let record = result.to_pair_catalog();
    assert_eq!(record.len(), 1);
    assert_eq!(record.id_a, vec![1001]);
    assert_eq!(record.id_b, vec![1002]);
    assert_eq!(record.mass_a, vec![11]);
    assert_eq!(record.vel_b, vec![[4.0, 5.0, 6.0]]);
    assert_eq!(record.selected_vmax, Some(vec![250.0, 240.0]));
    assert_eq!(record.realization.to_string(), "c004_ph002");
}

#[test]
fn configuration_errors_fail_fast() {
    assert!(matches!(
        config().exclusion_factor(0.5).build(),
        Err(ConfigurationError::InvalidExclusionFactor { .. })
    ));
    assert!(matches!(
        Catalog::from_points(-1.0, &two_close_pairs()),
        Err(ConfigurationError::Domain(PeriodicBoxError::InvalidSide { .. }))
    ));
}
