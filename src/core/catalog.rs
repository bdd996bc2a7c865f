//! Column-oriented input catalogs and output pair records.
//!
//! A [`Catalog`] is what the catalog loader hands over: a box side plus one
//! column per field, all of the same length. A [`PairCatalog`] is what goes to
//! the serializer: the A-side and B-side members of every surviving pair,
//! under field names that downstream readers depend on.

#![forbid(unsafe_code)]

use crate::core::config::RealizationId;
use crate::core::error::ConfigurationError;
use crate::core::pair::Pair;
use crate::core::point::{Point, Position, Velocity};
use crate::geometry::periodic_box::PeriodicBox;
use serde::{Deserialize, Serialize};

/// Raw catalog of one realization, as delivered by the loader.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::catalog::Catalog;
///
/// let catalog = Catalog::new(
///     10.0,
///     vec![[1.0, 1.0, 1.0], [1.1, 1.0, 1.0]],
///     vec![[0.0; 3]; 2],
///     vec![250.0, 240.0],
///     vec![10, 12],
///     vec![100, 101],
/// )
/// .unwrap();
/// assert_eq!(catalog.len(), 2);
///
/// assert!(Catalog::new(10.0, vec![[0.0; 3]], vec![], vec![1.0], vec![1], vec![1]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    domain: PeriodicBox<3>,
    positions: Vec<Position>,
    velocities: Vec<Velocity>,
    prominence: Vec<f64>,
    mass: Vec<i64>,
    ids: Vec<i64>,
}

impl Catalog {
    /// Validates and wraps the loader's columns.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::Domain`] for a non-positive or non-finite box side.
    /// - [`ConfigurationError::ColumnLengthMismatch`] when a column length
    ///   differs from the position column.
    /// - [`ConfigurationError::NonFiniteValue`] for a non-finite position
    ///   coordinate or prominence.
    /// - [`ConfigurationError::NegativeValue`] for a prominence below zero.
    pub fn new(
        box_size: f64,
        positions: Vec<Position>,
        velocities: Vec<Velocity>,
        prominence: Vec<f64>,
        mass: Vec<i64>,
        ids: Vec<i64>,
    ) -> Result<Self, ConfigurationError> {
        let domain = PeriodicBox::new(box_size)?;
        let expected = positions.len();
        for (column, actual) in [
            ("velocity", velocities.len()),
            ("prominence", prominence.len()),
            ("mass", mass.len()),
            ("id", ids.len()),
        ] {
            if actual != expected {
                return Err(ConfigurationError::ColumnLengthMismatch {
                    column,
                    expected,
                    actual,
                });
            }
        }
        for (row, position) in positions.iter().enumerate() {
            if let Some(&value) = position.iter().find(|c| !c.is_finite()) {
                return Err(ConfigurationError::NonFiniteValue {
                    column: "position",
                    row,
                    value,
                });
            }
        }
        if let Some((row, &value)) = prominence.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigurationError::NonFiniteValue {
                column: "prominence",
                row,
                value,
            });
        }
        if let Some((row, &value)) = prominence.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(ConfigurationError::NegativeValue {
                column: "prominence",
                row,
                value,
            });
        }

        Ok(Self {
            domain,
            positions,
            velocities,
            prominence,
            mass,
            ids,
        })
    }

    /// Builds a catalog from complete rows.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::new`].
    pub fn from_points(box_size: f64, points: &[Point]) -> Result<Self, ConfigurationError> {
        Self::new(
            box_size,
            points.iter().map(|p| *p.position()).collect(),
            points.iter().map(|p| *p.velocity()).collect(),
            points.iter().map(Point::prominence).collect(),
            points.iter().map(Point::mass).collect(),
            points.iter().map(Point::id).collect(),
        )
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub const fn domain(&self) -> &PeriodicBox<3> {
        &self.domain
    }

    #[must_use]
    pub const fn box_size(&self) -> f64 {
        self.domain.side()
    }

    #[must_use]
    pub fn prominence(&self) -> &[f64] {
        &self.prominence
    }

    /// Row `row` as a point with its raw (unwrapped) position.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Point> {
        Some(Point::new(
            *self.positions.get(row)?,
            self.velocities[row],
            self.prominence[row],
            self.mass[row],
            self.ids[row],
        ))
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(|row| self.row(row))
    }
}

/// Output record of one realization: A-side and B-side columns of every
/// surviving pair, optionally followed by the whole selected set.
///
/// Serialized field names (`pos_A`, `vmax_B`, `halo_A_id`, ...) are part of
/// the output contract and must not change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PairCatalog {
    /// Realization these pairs came from.
    pub realization: RealizationId,
    /// Box side length.
    pub box_size: f64,

    #[serde(rename = "pos_A")]
    pub pos_a: Vec<Position>,
    #[serde(rename = "pos_B")]
    pub pos_b: Vec<Position>,
    #[serde(rename = "mass_A")]
    pub mass_a: Vec<i64>,
    #[serde(rename = "mass_B")]
    pub mass_b: Vec<i64>,
    #[serde(rename = "vel_A")]
    pub vel_a: Vec<Velocity>,
    #[serde(rename = "vel_B")]
    pub vel_b: Vec<Velocity>,
    #[serde(rename = "vmax_A")]
    pub vmax_a: Vec<f64>,
    #[serde(rename = "vmax_B")]
    pub vmax_b: Vec<f64>,
    #[serde(rename = "halo_A_id")]
    pub id_a: Vec<i64>,
    #[serde(rename = "halo_B_id")]
    pub id_b: Vec<i64>,

    /// Positions of the whole selected set, when requested.
    #[serde(rename = "pos", default, skip_serializing_if = "Option::is_none")]
    pub selected_pos: Option<Vec<Position>>,
    /// Velocities of the whole selected set, when requested.
    #[serde(rename = "vel", default, skip_serializing_if = "Option::is_none")]
    pub selected_vel: Option<Vec<Velocity>>,
    /// Prominences of the whole selected set, when requested.
    #[serde(rename = "vmax", default, skip_serializing_if = "Option::is_none")]
    pub selected_vmax: Option<Vec<f64>>,
}

impl PairCatalog {
    /// Gathers the member columns of `pairs` from the selected `points`.
    ///
    /// # Panics
    ///
    /// Panics if a pair refers to an index outside `points`.
    #[must_use]
    pub fn from_pairs(
        realization: RealizationId,
        box_size: f64,
        points: &[Point],
        pairs: &[Pair],
        include_selected_set: bool,
    ) -> Self {
        let mut out = Self {
            realization,
            box_size,
            ..Self::default()
        };
        for pair in pairs {
            let a = &points[pair.first()];
            let b = &points[pair.second()];
            out.pos_a.push(*a.position());
            out.pos_b.push(*b.position());
            out.mass_a.push(a.mass());
            out.mass_b.push(b.mass());
            out.vel_a.push(*a.velocity());
            out.vel_b.push(*b.velocity());
            out.vmax_a.push(a.prominence());
            out.vmax_b.push(b.prominence());
            out.id_a.push(a.id());
            out.id_b.push(b.id());
        }
        if include_selected_set {
            out.selected_pos = Some(points.iter().map(|p| *p.position()).collect());
            out.selected_vel = Some(points.iter().map(|p| *p.velocity()).collect());
            out.selected_vmax = Some(points.iter().map(Point::prominence).collect());
        }
        out
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_a.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_a.is_empty()
    }

    /// Output file stem, `pairs_<realization>`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("pairs_{}", self.realization)
    }
}
