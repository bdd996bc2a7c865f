//! Isolation test for candidate pairs.
//!
//! A pair `(i, j)` with periodic separation `s` is isolated when, within the
//! ball of radius `exclusion_factor * s` around each member, no third point
//! has a prominence strictly greater than that member's. Points of equal
//! prominence do not break isolation, and the members themselves are never
//! counted against each other.

#![forbid(unsafe_code)]

use crate::core::config::check_exclusion_factor;
use crate::core::error::SelectionError;
use crate::core::pair::Pair;
use crate::core::point::Point;
use crate::core::spatial_index::PeriodicIndex;
use rayon::prelude::*;

/// Tests whether `pair` is isolated among `points`.
///
/// `points` must be the slice `index` was built from, so that pair members,
/// index hits and rows share one numbering. Distances use the index's box.
///
/// # Errors
///
/// - [`SelectionError::Configuration`] if `exclusion_factor` is below one or
///   not finite.
/// - [`SelectionError::IndexQueryInconsistency`] if a ball query returns a
///   point outside the requested radius.
///
/// # Panics
///
/// Panics if a pair member or index hit is out of bounds for `points`.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::algorithms::isolation::is_isolated;
/// use halo_pairs::core::pair::Pair;
/// use halo_pairs::core::point::Point;
/// use halo_pairs::core::spatial_index::PeriodicIndex;
/// use halo_pairs::geometry::periodic_box::PeriodicBox;
///
/// let points = [
///     Point::new([100.0, 100.0, 100.0], [0.0; 3], 250.0, 1, 0),
///     Point::new([101.0, 100.0, 100.0], [0.0; 3], 240.0, 1, 1),
///     Point::new([102.5, 100.0, 100.0], [0.0; 3], 300.0, 1, 2),
/// ];
/// let positions: Vec<_> = points.iter().map(|p| *p.position()).collect();
/// let index = PeriodicIndex::build(PeriodicBox::new(1000.0).unwrap(), &positions).unwrap();
///
/// let pair = Pair::new(0, 1).unwrap();
/// assert!(!is_isolated(&pair, &points, &index, 3.0).unwrap());
/// assert!(is_isolated(&pair, &points, &index, 1.0).unwrap());
/// ```
pub fn is_isolated(
    pair: &Pair,
    points: &[Point],
    index: &PeriodicIndex<3>,
    exclusion_factor: f64,
) -> Result<bool, SelectionError> {
    check_exclusion_factor(exclusion_factor)?;
    let separation = pair.separation(points, index.domain());
    let radius = exclusion_factor * separation;

    for member in [pair.first(), pair.second()] {
        if !member_is_dominant(pair, member, points, index, radius)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `true` when no third point within `radius` of `member` outranks it.
fn member_is_dominant(
    pair: &Pair,
    member: usize,
    points: &[Point],
    index: &PeriodicIndex<3>,
    radius: f64,
) -> Result<bool, SelectionError> {
    let prominence = points[member].prominence();
    let mut outranked = false;
    let mut stray = None;

    index.visit_ball(points[member].position(), radius, |hit| {
        if hit.distance > radius {
            stray = Some(hit);
            return false;
        }
        if pair.contains(hit.index) {
            return true;
        }
        if points[hit.index].prominence() > prominence {
            outranked = true;
            return false;
        }
        true
    });

    if let Some(hit) = stray {
        let detail = format!(
            "ball hit {} at distance {} exceeds radius {radius}",
            hit.index, hit.distance
        );
        tracing::error!(point = member, %pair, %detail, "ball query returned an inconsistent result");
        return Err(SelectionError::IndexQueryInconsistency {
            point: member,
            pair: Some(*pair),
            detail,
        });
    }

    Ok(!outranked)
}

/// Keeps the isolated pairs of `pairs`, preserving their order.
///
/// # Errors
///
/// Same as [`is_isolated`]. The exclusion factor is checked before any query
/// runs, so an invalid factor fails even for an empty pair list.
pub fn filter_isolated(
    pairs: &[Pair],
    points: &[Point],
    index: &PeriodicIndex<3>,
    exclusion_factor: f64,
    parallel: bool,
) -> Result<Vec<Pair>, SelectionError> {
    check_exclusion_factor(exclusion_factor)?;

    let keep = |pair: &Pair| -> Result<Option<Pair>, SelectionError> {
        Ok(is_isolated(pair, points, index, exclusion_factor)?.then_some(*pair))
    };

    let kept: Vec<Option<Pair>> = if parallel {
        pairs.par_iter().map(keep).collect::<Result<_, _>>()?
    } else {
        pairs.iter().map(keep).collect::<Result<_, _>>()?
    };
    let isolated: Vec<Pair> = kept.into_iter().flatten().collect();

    tracing::debug!(
        candidates = pairs.len(),
        isolated = isolated.len(),
        exclusion_factor,
        "filtered pairs by isolation"
    );
    Ok(isolated)
}
