use std::num::NonZero;
use std::str::FromStr;

use itertools::Itertools;
use ndarray::Array2;
use thiserror::Error;

use crate::cell::Cell;
use crate::color::Terminals;
use crate::location::{Dimension, Location};
use crate::puzzle::Puzzle;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum BuilderInvalidReason {
    /// A terminus was placed outside the bounds specified by `dims` on a builder.
    #[error("terminus {display} at {location} lies outside the board")]
    TerminusOutOfBounds {
        /// The colour being added.
        display: char,
        /// The offending cell.
        location: Location,
    },
    /// A terminus was placed on a cell already holding a terminus of any colour.
    #[error("terminus {display} at {location} overlaps an existing terminus")]
    DuplicateTerminus {
        /// The colour being added.
        display: char,
        /// The cell already taken.
        location: Location,
    },
    /// A colour's start and goal are the same cell.
    #[error("terminus {display} starts and ends at {location}")]
    DegenerateTerminus {
        /// The colour being added.
        display: char,
        /// Its only cell.
        location: Location,
    },
    /// Two colours were declared with the same display character, ignoring ASCII case.
    #[error("display {display} is used by more than one colour")]
    DuplicateDisplay {
        /// The character as passed the second time.
        display: char,
    },
    /// The board has no termini at all.
    #[error("no termini were added")]
    NoTermini,
}

/// A builder could not produce a [`Puzzle`]; carries every reason it recorded.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid puzzle: {}", .0.iter().join(", "))]
pub struct BuildError(pub Vec<BuilderInvalidReason>);

/// A builder for rectangular Flow Free boards.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a builder is invalid every further call is ignored, and [`build`](Self::build) reports why.
#[derive(Clone, Debug)]
pub struct PuzzleBuilder {
    // rows, columns
    dims: (Dimension, Dimension),
    cells: Array2<Cell>,
    terminals: Vec<Terminals>,
    displays: Vec<char>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for PuzzleBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::new(5).unwrap(), NonZero::new(5).unwrap()))
    }
}

impl PuzzleBuilder {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(rows, columns)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_shape_simple_fn((dims.0.get(), dims.1.get()), Cell::default),
            terminals: Default::default(),
            displays: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    fn in_bounds(&self, location: Location) -> bool {
        location.0 < self.dims.0.get() && location.1 < self.dims.1.get()
    }

    fn invalidate(&mut self, reason: BuilderInvalidReason) -> &mut Self {
        self.invalid_reasons.push(reason);
        self
    }

    /// Add a colour whose flow must run from `locations.0` (the start) to `locations.1` (the goal).
    ///
    /// May cause the builder to enter an invalid state if either location is out of bounds or already holds a
    /// terminus, if both locations coincide, or if `display` is already taken.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_termini(&mut self, display: char, locations: (Location, Location)) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        // boards print termini upper case, so `r` and `R` would be indistinguishable
        if self.displays.iter().any(|taken| taken.eq_ignore_ascii_case(&display)) {
            return self.invalidate(BuilderInvalidReason::DuplicateDisplay { display });
        }

        for location in [locations.0, locations.1] {
            if !self.in_bounds(location) {
                return self.invalidate(BuilderInvalidReason::TerminusOutOfBounds { display, location });
            }
            if !self.cells[location.as_index()].is_empty() {
                return self.invalidate(BuilderInvalidReason::DuplicateTerminus { display, location });
            }
        }

        if locations.0 == locations.1 {
            return self.invalidate(BuilderInvalidReason::DegenerateTerminus { display, location: locations.0 });
        }

        let color = self.terminals.len();
        for location in [locations.0, locations.1] {
            self.cells[location.as_index()] = Cell::Terminus { color };
        }
        self.terminals.push(Terminals { start: locations.0, goal: locations.1 });
        self.displays.push(display);

        self
    }

    /// Remove the most recently added pair of termini.
    ///
    /// If the builder is in an invalid state or no termini are present, this function does nothing.
    pub fn pop_termini(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if let Some(terminals) = self.terminals.pop() {
            self.displays.pop();
            for location in [terminals.start, terminals.goal] {
                self.cells[location.as_index()] = Cell::Empty;
            }
        }

        self
    }

    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Puzzle`].
    /// If the builder is invalid for any reason, or holds no termini, a [`BuildError`] will indicate why.
    pub fn build(&self) -> Result<Puzzle, BuildError> {
        if !self.invalid_reasons.is_empty() {
            return Err(BuildError(self.invalid_reasons.clone()));
        }

        if self.terminals.is_empty() {
            return Err(BuildError(vec![BuilderInvalidReason::NoTermini]));
        }

        Ok(Puzzle {
            dims: self.dims,
            terminals: self.terminals.clone(),
            displays: self.displays.clone(),
            seeded: self.cells.clone(),
        })
    }
}

/// Reasons a textual puzzle could not be read.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParsePuzzleError {
    /// Nothing but whitespace.
    #[error("puzzle text contains no rows")]
    Empty,
    /// A row differs in width from the first.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
    /// Neither `.` nor an ASCII letter or digit.
    #[error("unexpected character {character:?} at {location}")]
    InvalidCharacter {
        /// The character found.
        character: char,
        /// Where it was found.
        location: Location,
    },
    /// A terminal character that does not appear exactly twice.
    #[error("terminus {display} appears {count} times, expected exactly 2")]
    UnpairedTerminus {
        /// The terminal, upper case.
        display: char,
        /// How often it appears.
        count: usize,
    },
    /// The terminals parsed but do not form a valid puzzle.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Reads the format [`Puzzle`] prints: one line per row, `.` for an empty cell and an alphanumeric character for
/// each terminus. Case is ignored, so `r` and `R` name the same colour. Every character must appear exactly twice;
/// its first occurrence in reading order is the start.
///
/// ```
/// use flowsearch::Puzzle;
///
/// let puzzle: Puzzle = "R.B\n...\nR.B".parse().unwrap();
/// assert_eq!(puzzle.num_colors(), 2);
/// assert_eq!(puzzle.to_string(), "R.B\n...\nR.B\n");
/// ```
impl FromStr for Puzzle {
    type Err = ParsePuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s.trim()
            .lines()
            .map(|line| line.trim().chars().collect_vec())
            .collect_vec();

        let width = rows.first().map_or(0, Vec::len);
        let (Some(height), Some(width)) = (NonZero::new(rows.len()), NonZero::new(width)) else {
            return Err(ParsePuzzleError::Empty);
        };

        // first-seen order is colour order
        let mut seen: Vec<(char, Vec<Location>)> = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            if line.len() != width.get() {
                return Err(ParsePuzzleError::Ragged { row, expected: width.get(), found: line.len() });
            }

            for (col, character) in line.iter().copied().enumerate() {
                let location = Location(row, col);
                match character {
                    '.' => {}
                    c if c.is_ascii_alphanumeric() => {
                        let display = c.to_ascii_uppercase();
                        match seen.iter_mut().find(|(d, _)| *d == display) {
                            Some((_, locations)) => locations.push(location),
                            None => seen.push((display, vec![location])),
                        }
                    }
                    _ => return Err(ParsePuzzleError::InvalidCharacter { character, location }),
                }
            }
        }

        let mut builder = PuzzleBuilder::with_dims((height, width));
        for (display, locations) in seen {
            match locations.as_slice() {
                [start, goal] => builder.add_termini(display, (*start, *goal)),
                _ => return Err(ParsePuzzleError::UnpairedTerminus { display, count: locations.len() }),
            };
        }

        Ok(builder.build()?)
    }
}
