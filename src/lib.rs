#![warn(missing_docs)]

//! # `flowsearch`
//!
//! Search-based solvers for [Numberlink](https://en.wikipedia.org/wiki/Numberlink) as posited in the mobile game Flow Free.
//! Begin by building a puzzle with a [`PuzzleBuilder`] or by parsing its text form with [`str::parse`].
//! Then call [`solve()`](crate::Puzzle::solve) with a [`Strategy`] and a [`SolverConfig`], and replay the moves in the
//! returned [`SearchReport`] with [`replay()`](crate::Puzzle::replay) to get a filled [`Board`].
//!
//! ```
//! use flowsearch::{Puzzle, SolverConfig, Strategy};
//!
//! let puzzle: Puzzle = "R.G\n...\nRG.".parse().unwrap();
//! let report = puzzle.solve(Strategy::Csp, &SolverConfig::default()).unwrap();
//! let board = puzzle.replay(&report.moves.unwrap()).unwrap();
//! println!("{board}");
//! ```
//!
//! # Internals
//! Every strategy answers the same question: for each colour, find a simple path between its two terminals such
//! that the paths together cover every cell exactly once. They differ in what a search state is.
//!
//! [`AStarSolver`] and [`BfsSolver`] grow flows one cell at a time from their starts.
//! A state is a partially filled grid plus the head of every flow, and states are deduplicated by a canonical key
//! built from both. A* advances a single, heuristically chosen flow per node and orders its open set by moves made
//! plus the Manhattan distance every head still has to cover. Branches where some head is cut off from its goal are
//! dropped on the spot. Breadth-first search branches on every flow, reordered per node, and is bounded by a cap on
//! expansions.
//!
//! [`CspSolver`] treats each colour as a variable whose values are whole paths. Every simple path between a colour's
//! terminals is enumerated up front. Colours are then assigned in minimum-remaining-values order, ties going to the
//! colour whose terminals touch the most others, and each path tried is the one ruling out the fewest alternatives.
//! Forward checking removes overlapping paths from undecided colours before descending.
//!
//! [`AnnealingSolver`] starts from one random path per colour and repeatedly reroutes a random colour, scoring an
//! assignment by its overlapping claims plus its uncovered cells. It stops as soon as that score reaches zero.
//! It is the only strategy that is not deterministic, unless seeded through [`AnnealingConfig::random_seed`].

pub use annealing::AnnealingSolver;
pub use astar::AStarSolver;
pub use bfs::BfsSolver;
pub use board::{Board, ReplayError};
pub use builder::{BuildError, BuilderInvalidReason, ParsePuzzleError, PuzzleBuilder};
pub use color::{ColorId, Move, Terminals};
pub use config::{AnnealingConfig, BfsConfig, ConfigError, CspConfig, SolverConfig};
pub use csp::CspSolver;
pub use direction::Direction;
pub use location::{Dimension, Location};
pub use puzzle::Puzzle;
pub use solver::{FlowSolver, SearchReport, Strategy, Termination};

pub(crate) mod annealing;
pub(crate) mod astar;
pub(crate) mod bfs;
pub(crate) mod board;
pub mod builder;
pub(crate) mod cell;
pub(crate) mod color;
pub mod config;
pub(crate) mod csp;
pub(crate) mod direction;
pub(crate) mod location;
pub(crate) mod puzzle;
pub(crate) mod solver;
pub(crate) mod state;
mod tests;
