//! Seeded synthetic catalogs.
//!
//! Positions are drawn in the raw catalog convention `[-L/2, L/2)`, so the
//! default pipeline recentering applies to them exactly as it does to real
//! catalogs. The same seed always yields the same catalog.

use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use super::PointGenerationError;
use crate::core::catalog::Catalog;
use crate::core::point::{Position, Velocity};

/// Velocity components are drawn from `[-VELOCITY_SCALE, VELOCITY_SCALE)`.
const VELOCITY_SCALE: f64 = 500.0;

/// Mass proxies are drawn from `MASS_RANGE`.
const MASS_RANGE: std::ops::RangeInclusive<i64> = 1..=10_000;

fn check_box_size(box_size: f64) -> Result<(), PointGenerationError> {
    if box_size.is_finite() && box_size > 0.0 {
        Ok(())
    } else {
        Err(PointGenerationError::InvalidBoxSize { box_size })
    }
}

fn check_range((min, max): (f64, f64)) -> Result<(), PointGenerationError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(PointGenerationError::InvalidRange { min, max })
    }
}

fn raw_position<R: Rng>(rng: &mut R, half: f64) -> Position {
    std::array::from_fn(|_| rng.random_range(-half..half))
}

fn velocity<R: Rng>(rng: &mut R) -> Velocity {
    std::array::from_fn(|_| rng.random_range(-VELOCITY_SCALE..VELOCITY_SCALE))
}

/// Uniform direction on the unit sphere.
fn unit_vector<R: Rng>(rng: &mut R) -> [f64; 3] {
    let z: f64 = rng.random_range(-1.0..1.0);
    let phi: f64 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).sqrt();
    [r * phi.cos(), r * phi.sin(), z]
}

/// Generates `n_points` objects uniformly distributed in the box.
///
/// Prominences are uniform in `prominence_range`, mass proxies are positive
/// and ids are the row numbers.
///
/// # Errors
///
/// Returns [`PointGenerationError`] for a non-positive box size or an empty
/// prominence range.
///
/// # Examples
///
/// ```
/// use halo_pairs::geometry::util::generate_random_catalog_seeded;
///
/// let a = generate_random_catalog_seeded(100, 500.0, (100.0, 400.0), 42).unwrap();
/// let b = generate_random_catalog_seeded(100, 500.0, (100.0, 400.0), 42).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 100);
/// ```
pub fn generate_random_catalog_seeded(
    n_points: usize,
    box_size: f64,
    prominence_range: (f64, f64),
    seed: u64,
) -> Result<Catalog, PointGenerationError> {
    check_box_size(box_size)?;
    check_range(prominence_range)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let half = box_size / 2.0;
    let mut positions = Vec::with_capacity(n_points);
    let mut velocities = Vec::with_capacity(n_points);
    let mut prominence = Vec::with_capacity(n_points);
    let mut mass = Vec::with_capacity(n_points);

    for _ in 0..n_points {
        positions.push(raw_position(&mut rng, half));
        velocities.push(velocity(&mut rng));
        prominence.push(rng.random_range(prominence_range.0..prominence_range.1));
        mass.push(rng.random_range(MASS_RANGE));
    }
    let ids = (0..n_points).map(row_id).collect();

    Ok(Catalog::new(
        box_size, positions, velocities, prominence, mass, ids,
    )?)
}

/// Generates `n_pairs` close pairs: two objects per pair placed
/// `separation` apart along a random direction around a uniform centre.
///
/// Rows `2k` and `2k + 1` are the members of pair `k`. Pairs are not
/// guaranteed to be isolated from each other.
///
/// # Errors
///
/// Returns [`PointGenerationError`] for a non-positive box size, an empty
/// prominence range or a separation outside `(0, L/2)`.
pub fn generate_paired_catalog_seeded(
    n_pairs: usize,
    box_size: f64,
    separation: f64,
    prominence_range: (f64, f64),
    seed: u64,
) -> Result<Catalog, PointGenerationError> {
    check_box_size(box_size)?;
    check_range(prominence_range)?;
    let half = box_size / 2.0;
    if !(separation.is_finite() && separation > 0.0 && separation < half) {
        return Err(PointGenerationError::InvalidSeparation {
            separation,
            max: half,
        });
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let n_points = 2 * n_pairs;
    let mut positions = Vec::with_capacity(n_points);
    let mut velocities = Vec::with_capacity(n_points);
    let mut prominence = Vec::with_capacity(n_points);
    let mut mass = Vec::with_capacity(n_points);

    for _ in 0..n_pairs {
        let centre = raw_position(&mut rng, half);
        let direction = unit_vector(&mut rng);
        for sign in [-0.5, 0.5] {
            // Members may leave [-L/2, L/2); the pipeline wraps them.
            positions.push(std::array::from_fn(|axis| {
                centre[axis] + sign * separation * direction[axis]
            }));
            velocities.push(velocity(&mut rng));
            prominence.push(rng.random_range(prominence_range.0..prominence_range.1));
            mass.push(rng.random_range(MASS_RANGE));
        }
    }
    let ids = (0..n_points).map(row_id).collect();

    Ok(Catalog::new(
        box_size, positions, velocities, prominence, mass, ids,
    )?)
}

/// Generates `n_points` objects of which a fraction `cluster_fraction` is
/// packed into one cube of side `cluster_side` and the rest is uniform.
///
/// Rows `0..round(n_points * cluster_fraction)` are the clustered ones.
///
/// # Errors
///
/// Returns [`PointGenerationError`] for a non-positive box size, an empty
/// prominence range, a fraction outside `[0, 1]` or a cluster side outside
/// `(0, L]`.
///
/// # Examples
///
/// ```
/// use halo_pairs::geometry::util::generate_clustered_catalog_seeded;
///
/// let catalog = generate_clustered_catalog_seeded(1000, 1000.0, 0.99, 2.0, (100.0, 400.0), 7).unwrap();
/// assert_eq!(catalog.len(), 1000);
/// ```
pub fn generate_clustered_catalog_seeded(
    n_points: usize,
    box_size: f64,
    cluster_fraction: f64,
    cluster_side: f64,
    prominence_range: (f64, f64),
    seed: u64,
) -> Result<Catalog, PointGenerationError> {
    check_box_size(box_size)?;
    check_range(prominence_range)?;
    if !((0.0..=1.0).contains(&cluster_fraction)
        && cluster_side.is_finite()
        && cluster_side > 0.0
        && cluster_side <= box_size)
    {
        return Err(PointGenerationError::InvalidCluster {
            fraction: cluster_fraction,
            side: cluster_side,
            box_size,
        });
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let half = box_size / 2.0;
    let clustered = clustered_rows(n_points, cluster_fraction);
    let centre = raw_position(&mut rng, half);
    let mut positions = Vec::with_capacity(n_points);
    let mut velocities = Vec::with_capacity(n_points);
    let mut prominence = Vec::with_capacity(n_points);
    let mut mass = Vec::with_capacity(n_points);

    for row in 0..n_points {
        if row < clustered {
            let offset = raw_position(&mut rng, cluster_side / 2.0);
            positions.push(std::array::from_fn(|axis| centre[axis] + offset[axis]));
        } else {
            positions.push(raw_position(&mut rng, half));
        }
        velocities.push(velocity(&mut rng));
        prominence.push(rng.random_range(prominence_range.0..prominence_range.1));
        mass.push(rng.random_range(MASS_RANGE));
    }
    let ids = (0..n_points).map(row_id).collect();

    Ok(Catalog::new(
        box_size, positions, velocities, prominence, mass, ids,
    )?)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "fraction is in [0, 1], so the product lies in [0, n_points]"
)]
fn clustered_rows(n_points: usize, fraction: f64) -> usize {
    ((n_points as f64 * fraction).round() as usize).min(n_points)
}

fn row_id(row: usize) -> i64 {
    i64::try_from(row).unwrap_or(i64::MAX)
}
