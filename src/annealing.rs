//! Simulated annealing over complete path assignments.
//!
//! Every colour always holds some simple path between its terminals. A neighbour swaps one colour's path for a
//! fresh random one. Cost counts every extra claim on an already claimed cell plus every cell nobody claims, so it
//! reaches zero exactly on a solution.

use std::time::Instant;

use ndarray::Array2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::color::{moves_along, ColorId, Terminals};
use crate::config::{AnnealingConfig, ConfigError};
use crate::location::Location;
use crate::puzzle::Puzzle;
use crate::solver::{FlowSolver, SearchReport, Termination};

/// Claim counts for every cell under one assignment, with the cost kept current as paths come and go.
#[derive(Clone, Debug)]
pub(crate) struct Coverage {
    claims: Array2<u32>,
    conflicts: usize,
    empty: usize,
}

impl Coverage {
    pub(crate) fn new(puzzle: &Puzzle) -> Self {
        Self {
            claims: Array2::zeros((puzzle.rows(), puzzle.cols())),
            conflicts: 0,
            empty: puzzle.cell_count(),
        }
    }

    pub(crate) fn add(&mut self, path: &[Location]) {
        for cell in path {
            let claims = &mut self.claims[cell.as_index()];
            if *claims == 0 {
                self.empty -= 1;
            } else {
                self.conflicts += 1;
            }
            *claims += 1;
        }
    }

    pub(crate) fn remove(&mut self, path: &[Location]) {
        for cell in path {
            let claims = &mut self.claims[cell.as_index()];
            *claims -= 1;
            if *claims == 0 {
                self.empty += 1;
            } else {
                self.conflicts -= 1;
            }
        }
    }

    #[inline]
    pub(crate) fn cost(&self) -> usize {
        self.conflicts + self.empty
    }
}

/// Annealing solver for one [`Puzzle`], drawing randomness from `R`.
pub struct AnnealingSolver<'a, R: Rng = ChaCha8Rng> {
    puzzle: &'a Puzzle,
    schedule: AnnealingConfig,
    rng: R,
}

impl<'a> AnnealingSolver<'a> {
    /// Seeds from [`AnnealingConfig::random_seed`], or from a freshly drawn seed which is logged so the run can be
    /// repeated.
    ///
    /// Fails if `schedule` does not pass [`AnnealingConfig::validate`].
    pub fn new(puzzle: &'a Puzzle, schedule: &AnnealingConfig) -> Result<Self, ConfigError> {
        let seed = schedule.random_seed.unwrap_or_else(|| {
            let seed = rand::rng().random();
            info!(seed, "drew annealing seed");
            seed
        });
        Self::with_rng(puzzle, schedule, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> AnnealingSolver<'a, R> {
    /// Use `rng` as is; [`AnnealingConfig::random_seed`] is ignored.
    ///
    /// Fails if `schedule` does not pass [`AnnealingConfig::validate`], since such a schedule may never end.
    pub fn with_rng(puzzle: &'a Puzzle, schedule: &AnnealingConfig, rng: R) -> Result<Self, ConfigError> {
        schedule.validate()?;
        Ok(Self {
            puzzle,
            schedule: schedule.clone(),
            rng,
        })
    }

    /// A random simple path from the start of `color` to its goal that avoids every other colour's terminals.
    ///
    /// Randomised depth-first walk: each step goes to a random unvisited neighbour, backing up when there is none.
    /// Cells stay visited after backing out of them, so the walk is linear in the board size.
    pub(crate) fn random_path(&mut self, color: ColorId) -> Option<Vec<Location>> {
        let puzzle = self.puzzle;
        let Terminals { start, goal } = puzzle.terminals(color);
        let mut visited = Array2::from_elem((puzzle.rows(), puzzle.cols()), false);
        visited[start.as_index()] = true;
        let mut path = vec![start];

        loop {
            let head = *path.last()?;
            if head == goal {
                return Some(path);
            }

            let options = puzzle.neighbors_of(head)
                .map(|(_, neighbor)| neighbor)
                .filter(|neighbor| {
                    !visited[neighbor.as_index()]
                        && puzzle.terminus_owner(*neighbor).map_or(true, |owner| owner == color)
                })
                .collect::<Vec<_>>();

            match options.choose(&mut self.rng) {
                Some(next) => {
                    visited[next.as_index()] = true;
                    path.push(*next);
                }
                None => {
                    path.pop();
                }
            }
        }
    }

    /// One random path per colour, or [`None`] if some colour cannot reach its goal at all.
    pub(crate) fn random_assignment(&mut self) -> Option<Vec<Vec<Location>>> {
        self.puzzle.colors().map(|color| self.random_path(color)).collect()
    }

    fn finish(&self, assignment: &[Vec<Location>], started: Instant) -> SearchReport {
        let moves = assignment.iter()
            .enumerate()
            .flat_map(|(color, path)| moves_along(color, path))
            .collect::<Vec<_>>();
        info!(event = "solve_end", strategy = "sa", steps = moves.len());
        SearchReport::solved(moves, started.elapsed())
    }
}

impl<R: Rng> FlowSolver for AnnealingSolver<'_, R> {
    fn solve(mut self) -> SearchReport {
        let puzzle = self.puzzle;
        let started = Instant::now();
        info!(
            event = "solve_start",
            strategy = "sa",
            rows = puzzle.rows(),
            cols = puzzle.cols(),
            colors = puzzle.num_colors(),
            starting_temperature = self.schedule.starting_temperature,
            minimum_temperature = self.schedule.minimum_temperature,
            cooling_rate = self.schedule.cooling_rate,
            trials_per_temperature = self.schedule.trials_per_temperature,
        );

        let Some(mut current) = self.random_assignment() else {
            debug!("some colour has no path to its goal");
            info!(event = "solve_end", strategy = "sa", termination = ?Termination::Exhausted);
            return SearchReport::failed(Termination::Exhausted);
        };

        let mut coverage = Coverage::new(puzzle);
        for path in &current {
            coverage.add(path);
        }
        let mut current_cost = coverage.cost();
        let mut best = current.clone();
        let mut best_cost = current_cost;
        if best_cost == 0 {
            return self.finish(&best, started);
        }

        let mut temperature = self.schedule.starting_temperature;
        while temperature > self.schedule.minimum_temperature {
            for _ in 0..self.schedule.trials_per_temperature {
                let color = self.rng.random_range(puzzle.colors());
                let Some(replacement) = self.random_path(color) else {
                    continue;
                };

                let previous = std::mem::replace(&mut current[color], replacement);
                coverage.remove(&previous);
                coverage.add(&current[color]);
                let next_cost = coverage.cost();

                let delta = next_cost as f64 - current_cost as f64;
                if delta <= 0.0 || self.rng.random::<f64>() < (-delta / temperature).exp() {
                    current_cost = next_cost;
                    if current_cost < best_cost {
                        best.clone_from(&current);
                        best_cost = current_cost;
                        if best_cost == 0 {
                            return self.finish(&best, started);
                        }
                    }
                } else {
                    coverage.remove(&current[color]);
                    coverage.add(&previous);
                    current[color] = previous;
                }
            }

            temperature *= self.schedule.cooling_rate;
            debug!(temperature, current_cost, best_cost, "cooled");
        }

        info!(event = "solve_end", strategy = "sa", termination = ?Termination::Cooled, best_cost);
        SearchReport::failed(Termination::Cooled)
    }
}
