//! Selected catalog objects.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Position in periodic box coordinates.
pub type Position = [f64; 3];

/// Velocity, carried through the pipeline unchanged.
pub type Velocity = [f64; 3];

/// One object of the selected set.
///
/// Points are immutable once materialised; their index in the selected slice
/// is the handle every later stage refers to.
///
/// # Examples
///
/// ```rust
/// use halo_pairs::core::point::Point;
///
/// let p = Point::new([1.0, 2.0, 3.0], [0.0; 3], 250.0, 42, 7);
/// assert_eq!(p.mass(), 42);
/// assert!(p.has_positive_mass());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    position: Position,
    velocity: Velocity,
    prominence: f64,
    mass: i64,
    id: i64,
}

impl Point {
    /// Creates a point from its catalog row.
    #[must_use]
    pub const fn new(
        position: Position,
        velocity: Velocity,
        prominence: f64,
        mass: i64,
        id: i64,
    ) -> Self {
        Self {
            position,
            velocity,
            prominence,
            mass,
            id,
        }
    }

    /// Position inside `[0, L)^3`.
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    #[must_use]
    pub const fn velocity(&self) -> &Velocity {
        &self.velocity
    }

    /// Ranking value (peak circular velocity in halo catalogs).
    #[must_use]
    pub const fn prominence(&self) -> f64 {
        self.prominence
    }

    /// Mass proxy (particle count in halo catalogs).
    #[must_use]
    pub const fn mass(&self) -> i64 {
        self.mass
    }

    /// Identifier of the row in the source catalog.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub const fn has_positive_mass(&self) -> bool {
        self.mass > 0
    }

    /// Same point moved to `position`; every other field is kept.
    #[must_use]
    pub const fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}
