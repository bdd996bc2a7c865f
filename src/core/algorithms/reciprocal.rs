//! Reciprocal nearest-neighbour pairing.
//!
//! Two indexed points `i` and `j` form a reciprocal pair when `j` is the
//! nearest other point of `i` and `i` is the nearest other point of `j`.
//! The nearest other point of every indexed point is computed once with a
//! forward query `nearest_k(pos, 2, Some(L/2))`; reciprocity is then a table
//! lookup. If `j` lies within `L/2` of `i`, the nearest other point of `j` is
//! at most `d(i, j)` away, so the cutoff never hides it.

#![forbid(unsafe_code)]

use crate::core::error::SelectionError;
use crate::core::pair::Pair;
use crate::core::spatial_index::{Neighbor, PeriodicIndex};
use rayon::prelude::*;

/// Neighbours requested per forward query: the point itself plus one other.
const FORWARD_QUERY_K: usize = 2;

/// Nearest other indexed point of every indexed point, in index order.
///
/// Entry `i` is `None` when no other point lies within `L/2` of point `i`
/// (including the single-point case).
///
/// # Errors
///
/// Returns [`SelectionError::IndexQueryInconsistency`] if a forward query
/// returns more than two hits or a hit beyond the cutoff.
pub fn nearest_others(
    index: &PeriodicIndex<3>,
    parallel: bool,
) -> Result<Vec<Option<Neighbor>>, SelectionError> {
    if parallel {
        (0..index.len())
            .into_par_iter()
            .map(|point| nearest_other(index, point))
            .collect()
    } else {
        (0..index.len())
            .map(|point| nearest_other(index, point))
            .collect()
    }
}

fn nearest_other(index: &PeriodicIndex<3>, point: usize) -> Result<Option<Neighbor>, SelectionError> {
    let Some(position) = index.position(point) else {
        return Ok(None);
    };
    let cutoff = index.domain().half_side();
    let hits = index.nearest_k(position, FORWARD_QUERY_K, Some(cutoff));

    if hits.len() > FORWARD_QUERY_K {
        return Err(inconsistency(
            point,
            format!("{} hits for k = {FORWARD_QUERY_K}", hits.len()),
        ));
    }
    if let Some(hit) = hits.iter().find(|hit| hit.distance > cutoff) {
        return Err(inconsistency(
            point,
            format!(
                "hit {} at distance {} exceeds cutoff {cutoff}",
                hit.index, hit.distance
            ),
        ));
    }

    Ok(hits.into_iter().find(|hit| hit.index != point))
}

fn inconsistency(point: usize, detail: String) -> SelectionError {
    tracing::error!(point, %detail, "nearest-neighbour query returned an inconsistent result");
    SelectionError::IndexQueryInconsistency {
        point,
        pair: None,
        detail,
    }
}

/// Pairs the entries of a nearest-other table. Returns every reciprocal pair
/// once, canonical and ascending.
///
/// # Panics
///
/// Panics if a table entry names an index outside the table.
#[must_use]
pub fn reciprocal_pairs_from_table(nearest: &[Option<Neighbor>], parallel: bool) -> Vec<Pair> {
    let accept = |point: usize| -> Option<Pair> {
        let other = nearest[point]?.index;
        // Each pair is emitted from its smaller member only.
        if other <= point {
            return None;
        }
        if nearest[other]?.index != point {
            return None;
        }
        Pair::new(point, other).ok()
    };

    let mut pairs: Vec<Pair> = if parallel {
        (0..nearest.len())
            .into_par_iter()
            .fold(Vec::new, |mut acc, point| {
                acc.extend(accept(point));
                acc
            })
            .reduce(Vec::new, |mut left, mut right| {
                left.append(&mut right);
                left
            })
    } else {
        (0..nearest.len()).filter_map(accept).collect()
    };
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Finds all reciprocal nearest-neighbour pairs among the indexed points.
///
/// Pair members are indices into the slice the index was built from. The
/// result is sorted ascending with no duplicates and no self pairs.
///
/// # Errors
///
/// Propagates [`SelectionError::IndexQueryInconsistency`] from
/// [`nearest_others`].
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::algorithms::reciprocal::find_reciprocal_pairs;
/// use halo_pairs::core::spatial_index::PeriodicIndex;
/// use halo_pairs::geometry::periodic_box::PeriodicBox;
///
/// let domain = PeriodicBox::<3>::new(1000.0).unwrap();
/// let positions = [[100.0, 100.0, 100.0], [101.0, 100.0, 100.0], [500.0, 500.0, 500.0]];
/// let index = PeriodicIndex::build(domain, &positions).unwrap();
///
/// let pairs = find_reciprocal_pairs(&index, false).unwrap();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].indices(), (0, 1));
/// ```
pub fn find_reciprocal_pairs(
    index: &PeriodicIndex<3>,
    parallel: bool,
) -> Result<Vec<Pair>, SelectionError> {
    let nearest = nearest_others(index, parallel)?;
    let pairs = reciprocal_pairs_from_table(&nearest, parallel);
    tracing::debug!(
        points = index.len(),
        pairs = pairs.len(),
        "found reciprocal nearest-neighbour pairs"
    );
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::periodic_box::PeriodicBox;
    use approx::assert_relative_eq;

    fn index_of(side: f64, positions: &[[f64; 3]]) -> PeriodicIndex<3> {
        PeriodicIndex::build(PeriodicBox::new(side).unwrap(), positions).unwrap()
    }

    #[test]
    fn test_empty_and_single_point_sets_have_no_pairs() {
        let index = index_of(10.0, &[]);
        assert!(find_reciprocal_pairs(&index, true).unwrap().is_empty());

        let index = index_of(10.0, &[[1.0, 1.0, 1.0]]);
        assert_eq!(nearest_others(&index, false).unwrap(), vec![None]);
        assert!(find_reciprocal_pairs(&index, false).unwrap().is_empty());
    }

    #[test]
    fn test_chain_pairs_only_the_mutual_couple() {
        // 0 -> 1 <-> 2, 3 -> 2: only (1, 2) is mutual.
        let positions = [
            [1.0, 5.0, 5.0],
            [3.0, 5.0, 5.0],
            [3.5, 5.0, 5.0],
            [5.0, 5.0, 5.0],
        ];
        let index = index_of(20.0, &positions);
        let nearest = nearest_others(&index, false).unwrap();
        let targets: Vec<Option<usize>> = nearest.iter().map(|n| n.map(|n| n.index)).collect();
        assert_eq!(targets, vec![Some(1), Some(2), Some(1), Some(2)]);

        let pairs = find_reciprocal_pairs(&index, false).unwrap();
        assert_eq!(pairs, vec![Pair::new(1, 2).unwrap()]);
    }

    #[test]
    fn test_pairing_across_periodic_boundary() {
        let positions = [[0.1, 5.0, 5.0], [9.9, 5.0, 5.0], [5.0, 5.0, 5.0]];
        let index = index_of(10.0, &positions);
        let nearest = nearest_others(&index, false).unwrap();
        let first = nearest[0].unwrap();
        assert_eq!(first.index, 1);
        assert_relative_eq!(first.distance, 0.2, epsilon = 1e-12);
        assert_eq!(
            find_reciprocal_pairs(&index, true).unwrap(),
            vec![Pair::new(0, 1).unwrap()]
        );
    }

    #[test]
    fn test_points_beyond_half_box_have_no_candidate() {
        // Minimum-image distance is 5 * sqrt(3), past the L/2 = 5 cutoff.
        let positions = [[0.0, 0.0, 0.0], [5.0, 5.0, 5.0]];
        let index = index_of(10.0, &positions);
        assert_eq!(nearest_others(&index, false).unwrap(), vec![None, None]);
        assert!(find_reciprocal_pairs(&index, false).unwrap().is_empty());
        assert!(find_reciprocal_pairs(&index, true).unwrap().is_empty());
    }

    #[test]
    fn test_pair_at_exactly_half_box_is_found() {
        let positions = [[0.0, 5.0, 5.0], [5.0, 5.0, 5.0]];
        let index = index_of(10.0, &positions);
        let nearest = nearest_others(&index, false).unwrap();
        assert_relative_eq!(nearest[0].unwrap().distance, 5.0);
        assert_eq!(
            find_reciprocal_pairs(&index, false).unwrap(),
            vec![Pair::new(0, 1).unwrap()]
        );
    }

    #[test]
    fn test_coincident_points_pair_with_each_other() {
        let positions = [[2.0, 2.0, 2.0], [2.0, 2.0, 2.0], [7.0, 7.0, 7.0]];
        let index = index_of(10.0, &positions);
        let pairs = find_reciprocal_pairs(&index, false).unwrap();
        assert_eq!(pairs, vec![Pair::new(0, 1).unwrap()]);
    }

    #[test]
    fn test_table_pairing_ignores_non_mutual_and_missing_entries() {
        let n = |index: usize| {
            Some(Neighbor {
                index,
                distance: 1.0,
            })
        };
        let table = vec![n(1), n(0), n(1), None, n(5), n(4)];
        let expected = vec![Pair::new(0, 1).unwrap(), Pair::new(4, 5).unwrap()];
        assert_eq!(reciprocal_pairs_from_table(&table, false), expected);
        assert_eq!(reciprocal_pairs_from_table(&table, true), expected);
    }

    #[test]
    fn test_parallel_and_sequential_paths_agree() {
        let mut positions = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                let x = f64::from(i) * 8.0 + f64::from(j % 3) * 0.7;
                let y = f64::from(j) * 8.0 + f64::from(i % 4) * 0.9;
                positions.push([x, y, f64::from(i * j % 7) * 13.0]);
            }
        }
        let index = index_of(96.0, &positions);
        assert_eq!(
            find_reciprocal_pairs(&index, true).unwrap(),
            find_reciprocal_pairs(&index, false).unwrap()
        );
    }
}
