use std::fmt::{Display, Formatter};

use ndarray::Array2;
use thiserror::Error;

use crate::cell::Cell;
use crate::color::{ColorId, Move};
use crate::location::Location;
use crate::puzzle::Puzzle;

/// Reasons a move sequence does not describe a solution of its [`Puzzle`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ReplayError {
    /// A move names a colour the puzzle does not have.
    #[error("move {index} names colour {color}, which does not exist")]
    UnknownColor {
        /// Position of the move in the sequence.
        index: usize,
        /// The colour it names.
        color: ColorId,
    },
    /// A flow moves again after reaching its goal.
    #[error("move {index} advances colour {color} after it already reached its goal")]
    AlreadyFinished {
        /// Position of the move in the sequence.
        index: usize,
        /// The finished colour.
        color: ColorId,
    },
    /// A flow steps off the edge.
    #[error("move {index} steps colour {color} off the board")]
    OutOfBounds {
        /// Position of the move in the sequence.
        index: usize,
        /// The moving colour.
        color: ColorId,
    },
    /// A flow steps onto a cell that is neither empty nor its own goal.
    #[error("move {index} steps colour {color} onto occupied cell {location}")]
    Blocked {
        /// Position of the move in the sequence.
        index: usize,
        /// The moving colour.
        color: ColorId,
        /// The occupied cell.
        location: Location,
    },
    /// Every move replayed but this cell is still empty.
    #[error("cell {location} is never filled")]
    Unfilled {
        /// The first empty cell in reading order.
        location: Location,
    },
    /// Every move replayed but this flow stops short of its goal.
    #[error("colour {color} never reaches its goal")]
    Unfinished {
        /// The unfinished colour.
        color: ColorId,
    },
}

/// A fully replayed board: every cell owned by exactly one colour.
///
/// Obtain one from [`Puzzle::replay`].
#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) cells: Array2<Cell>,
    pub(crate) displays: Vec<char>,
}

impl Board {
    /// The colour owning `location`, or [`None`] if it lies outside the board.
    pub fn owner_at(&self, location: Location) -> Option<ColorId> {
        self.cells.get(location.as_index()).and_then(Cell::owner)
    }
}

impl Puzzle {
    /// Replay `moves` from each colour's start, one cell per move, and check the result is a solution:
    /// every step lands on an empty cell or the moving colour's own goal, every cell ends up filled and every
    /// flow ends on its goal.
    pub fn replay(&self, moves: &[Move]) -> Result<Board, ReplayError> {
        let mut cells = self.seeded.clone();
        let mut heads = self.terminals.iter().map(|t| t.start).collect::<Vec<_>>();

        for (index, step) in moves.iter().enumerate() {
            let color = step.color;
            let Some(head) = heads.get_mut(color) else {
                return Err(ReplayError::UnknownColor { index, color });
            };
            let goal = self.terminals[color].goal;
            if *head == goal {
                return Err(ReplayError::AlreadyFinished { index, color });
            }

            let location = step.direction.attempt_from(*head);
            let Some(cell) = cells.get_mut(location.as_index()) else {
                return Err(ReplayError::OutOfBounds { index, color });
            };
            match *cell {
                Cell::Empty => *cell = Cell::Path { color },
                Cell::Terminus { color: owner } if owner == color && location == goal => {}
                _ => return Err(ReplayError::Blocked { index, color, location }),
            }
            *head = location;
        }

        if let Some((index, _)) = cells.indexed_iter().find(|(_, cell)| cell.is_empty()) {
            return Err(ReplayError::Unfilled { location: Location::from(index) });
        }

        if let Some(color) = self.colors().find(|color| heads[*color] != self.terminals[*color].goal) {
            return Err(ReplayError::Unfinished { color });
        }

        Ok(Board {
            cells,
            displays: self.displays.clone(),
        })
    }
}

/// Lay a grid out one row per line: termini upper case, path cells lower case, empty cells as `.`.
pub(crate) fn print(cells: &Array2<Cell>, displays: &[char]) -> String {
    let mut out = String::with_capacity(cells.nrows() * (cells.ncols() + 1));

    for row in cells.rows() {
        for cell in row {
            out.push(match cell {
                Cell::Terminus { color } => displays[*color].to_ascii_uppercase(),
                Cell::Path { color } => displays[*color].to_ascii_lowercase(),
                Cell::Empty => '.',
            });
        }
        out.push('\n');
    }

    out
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", print(&self.cells, &self.displays))
    }
}
