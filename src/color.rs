use std::fmt::{Display, Formatter};

use crate::direction::Direction;
use crate::location::Location;

/// Index of a terminal pair within its [`Puzzle`](crate::Puzzle); colours are numbered from 0 in insertion order.
pub type ColorId = usize;

/// The two terminals of one colour.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Terminals {
    /// Where the flow begins; every move sequence grows from here.
    pub start: Location,
    /// Where the flow must end.
    pub goal: Location,
}

/// Advance the flow of `color` by one cell in `direction`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Move {
    /// The flow being advanced.
    pub color: ColorId,
    /// Which way its head steps.
    pub direction: Direction,
}

impl Move {
    /// Construct a move of `color` in `direction`.
    pub fn new(color: ColorId, direction: Direction) -> Self {
        Self { color, direction }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.color, self.direction)
    }
}

/// Spell out a simple path as the moves that trace it from its first cell.
///
/// Consecutive cells must be adjacent; paths come out of the path walkers in [`csp`](crate::csp) and
/// [`annealing`](crate::annealing), which only ever step orthogonally.
pub(crate) fn moves_along(color: ColorId, path: &[Location]) -> impl Iterator<Item = Move> + '_ {
    path.windows(2).filter_map(move |pair| {
        Direction::direction_to(pair[0], pair[1]).map(|direction| Move::new(color, direction))
    })
}
