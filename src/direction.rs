use strum::{Display, EnumString, VariantArray};

use crate::location::Location;

/// One of the four orthogonal steps a flow head may take.
///
/// [`Direction::VARIANTS`] is the fixed order in which every strategy tries directions.
#[derive(Copy, Clone, VariantArray, Display, EnumString, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards column 0.
    Left,
    /// Away from column 0.
    Right,
    // switch it up like nintendo
}

impl Direction {
    /// Attempt the step from `location` in the direction specified by `self` and return the resultant [`Location`].
    ///
    /// The result is not bounds checked; see [`Puzzle::contains`](crate::Puzzle::contains).
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((-1, 0)),
            Self::Down => location.offset_by((1, 0)),
            Self::Left => location.offset_by((0, -1)),
            Self::Right => location.offset_by((0, 1)),
        }
    }

    /// Invert the direction specified by `self`.
    pub fn invert(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Determine the direction from `a` to `b` by calling [`attempt_from`](Self::attempt_from) until one works.
    ///
    /// Returns [`None`] unless `a` and `b` are orthogonally adjacent.
    pub fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }
}
