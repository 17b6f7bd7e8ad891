use std::fmt::{Display, Formatter};
use std::ops::Range;

use ndarray::Array2;
use strum::VariantArray;

use crate::board;
use crate::cell::Cell;
use crate::color::{ColorId, Terminals};
use crate::direction::Direction;
use crate::location::{Dimension, Location};

/// An immutable, validated puzzle: grid dimensions plus one pair of [`Terminals`] per colour.
///
/// [`Puzzle`]s should be built using a [`PuzzleBuilder`](crate::PuzzleBuilder) or parsed from text with [`str::parse`].
/// Solve one with [`Puzzle::solve`].
#[derive(Clone, Debug)]
pub struct Puzzle {
    // rows, columns
    pub(crate) dims: (Dimension, Dimension),
    pub(crate) terminals: Vec<Terminals>,
    pub(crate) displays: Vec<char>,
    /// Every terminal pre-placed on an otherwise empty grid.
    pub(crate) seeded: Array2<Cell>,
}

impl Puzzle {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.dims.0.get()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.dims.1.get()
    }

    /// Number of cells, terminals included.
    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Number of colours, i.e. terminal pairs.
    pub fn num_colors(&self) -> usize {
        self.terminals.len()
    }

    /// All colour identifiers, in insertion order.
    pub fn colors(&self) -> Range<ColorId> {
        0..self.terminals.len()
    }

    /// The start and goal of `color`. Panics if `color` is not one of [`colors`](Self::colors).
    pub fn terminals(&self, color: ColorId) -> Terminals {
        self.terminals[color]
    }

    /// The character this colour was declared with.
    pub fn display_of(&self, color: ColorId) -> char {
        self.displays[color]
    }

    /// Look a colour up by the character it was declared with, ignoring ASCII case.
    pub fn color_of(&self, display: char) -> Option<ColorId> {
        self.displays.iter().position(|d| d.eq_ignore_ascii_case(&display))
    }

    /// Whether `location` lies on the board.
    pub fn contains(&self, location: Location) -> bool {
        location.0 < self.rows() && location.1 < self.cols()
    }

    /// In-bounds orthogonal neighbours of `location`, in [`Direction::VARIANTS`] order.
    pub(crate) fn neighbors_of(&self, location: Location) -> impl Iterator<Item = (Direction, Location)> + '_ {
        Direction::VARIANTS.iter()
            .map(move |dir| (*dir, dir.attempt_from(location)))
            .filter(|(_, neighbor)| self.contains(*neighbor))
    }

    /// Row-major index of `location`, for bitsets and state keys.
    #[inline]
    pub(crate) fn index_of(&self, location: Location) -> usize {
        location.0 * self.cols() + location.1
    }

    /// The colour whose start or goal sits on `location`, if any.
    #[inline]
    pub(crate) fn terminus_owner(&self, location: Location) -> Option<ColorId> {
        self.seeded.get(location.as_index()).and_then(Cell::owner)
    }

    /// The colour whose goal sits on `location`, if any.
    pub(crate) fn goal_owner(&self, location: Location) -> Option<ColorId> {
        self.terminus_owner(location).filter(|color| self.terminals[*color].goal == location)
    }
}

impl Display for Puzzle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", board::print(&self.seeded, &self.displays))
    }
}
