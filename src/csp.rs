//! Whole-path backtracking.
//!
//! Every colour is a variable whose values are the simple paths between its terminals. Domains are enumerated once
//! up front and only ever filtered afterwards. Variables are fixed in MRV/degree order. Values are tried least
//! constraining first, and each tentative assignment forward-checks the colours still undecided.

use std::cmp::Reverse;
use std::time::Instant;

use bitvec::prelude::*;
use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use strum::VariantArray;
use tracing::{debug, info};

use crate::color::{moves_along, ColorId, Terminals};
use crate::direction::Direction;
use crate::location::Location;
use crate::puzzle::Puzzle;
use crate::solver::{FlowSolver, SearchReport, Termination};

/// One simple path from a colour's start to its goal.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    pub(crate) cells: Vec<Location>,
    /// Every cell of the path except the start, as row-major bits.
    claims: BitVec,
}

impl Candidate {
    fn new(puzzle: &Puzzle, cells: Vec<Location>) -> Self {
        let mut claims = bitvec![0; puzzle.cell_count()];
        for cell in &cells[1..] {
            claims.set(puzzle.index_of(*cell), true);
        }
        Self { cells, claims }
    }

    /// Whether the two paths share any cell other than their starts.
    pub(crate) fn conflicts_with(&self, other: &Candidate) -> bool {
        self.claims.iter_ones().any(|index| other.claims[index])
    }
}

/// Per colour, indices into that colour's candidate list which are still feasible.
pub(crate) type Domains = Vec<Vec<usize>>;

/// One level of the backtracking stack.
struct Frame {
    /// Untried values for this level's colour, best first.
    values: std::vec::IntoIter<usize>,
    /// Domains as they stood before this level assigned anything.
    domains: Domains,
}

/// Constraint solver for one [`Puzzle`].
pub struct CspSolver<'a> {
    puzzle: &'a Puzzle,
    max_path_len: usize,
}

impl<'a> CspSolver<'a> {
    /// `max_path_len` bounds enumerated paths, in cells; [`None`] allows paths as long as the board has cells.
    pub fn new(puzzle: &'a Puzzle, max_path_len: Option<usize>) -> Self {
        Self {
            puzzle,
            max_path_len: max_path_len.unwrap_or_else(|| puzzle.cell_count()),
        }
    }

    /// Every simple path of at most `max_path_len` cells from the start of `color` to its goal, crossing only
    /// cells that hold no terminal.
    pub(crate) fn enumerate_paths(&self, color: ColorId) -> Vec<Candidate> {
        let puzzle = self.puzzle;
        let Terminals { start, goal } = puzzle.terminals(color);
        let mut found = Vec::new();
        if self.max_path_len < 2 {
            return found;
        }

        let mut on_path = bitvec![0; puzzle.cell_count()];
        on_path.set(puzzle.index_of(start), true);
        let mut path = vec![start];
        let mut branches = vec![Direction::VARIANTS.iter()];

        while let Some(branch) = branches.last_mut() {
            let head = path[path.len() - 1];
            let Some(direction) = branch.next() else {
                branches.pop();
                if let Some(cell) = path.pop() {
                    on_path.set(puzzle.index_of(cell), false);
                }
                continue;
            };

            let next = direction.attempt_from(head);
            if !puzzle.contains(next) || on_path[puzzle.index_of(next)] {
                continue;
            }
            if next == goal {
                let mut cells = path.clone();
                cells.push(goal);
                found.push(Candidate::new(puzzle, cells));
                continue;
            }
            // room for this cell and the goal after it
            if puzzle.terminus_owner(next).is_some() || path.len() + 2 > self.max_path_len {
                continue;
            }

            on_path.set(puzzle.index_of(next), true);
            path.push(next);
            branches.push(Direction::VARIANTS.iter());
        }

        found
    }

    /// Number of other colours with a terminal orthogonally adjacent to one of this colour's terminals.
    pub(crate) fn degrees(&self) -> Vec<usize> {
        let puzzle = self.puzzle;
        let mut graph = UnGraphMap::<ColorId, ()>::new();
        for color in puzzle.colors() {
            graph.add_node(color);
        }

        for (a, b) in puzzle.colors().tuple_combinations() {
            let (ta, tb) = (puzzle.terminals(a), puzzle.terminals(b));
            let touching = [ta.start, ta.goal].into_iter()
                .cartesian_product([tb.start, tb.goal])
                .any(|(x, y)| x.manhattan_to(y) == 1);
            if touching {
                graph.add_edge(a, b, ());
            }
        }

        puzzle.colors().map(|color| graph.neighbors(color).count()).collect()
    }

    /// Fewest remaining values first, then most entangled, then colour order.
    pub(crate) fn order_colors(&self, domains: &Domains, degrees: &[usize]) -> Vec<ColorId> {
        self.puzzle.colors()
            .sorted_by_key(|color| (domains[*color].len(), Reverse(degrees[*color])))
            .collect()
    }

    /// Values of `color` ordered by how many values of `undecided` colours they rule out, fewest first.
    pub(crate) fn order_values(candidates: &[Vec<Candidate>], domains: &Domains, color: ColorId, undecided: &[ColorId]) -> Vec<usize> {
        domains[color].iter()
            .copied()
            .sorted_by_cached_key(|value| {
                let chosen = &candidates[color][*value];
                undecided.iter()
                    .map(|other| domains[*other].iter().filter(|v| chosen.conflicts_with(&candidates[*other][**v])).count())
                    .sum::<usize>()
            })
            .collect()
    }

    /// Domains after fixing `color` to `value`: undecided colours lose every value overlapping it.
    ///
    /// Returns [`None`] as soon as an undecided colour is left with nothing. `domains` is never touched.
    pub(crate) fn forward_check(candidates: &[Vec<Candidate>], domains: &Domains, color: ColorId, value: usize, undecided: &[ColorId]) -> Option<Domains> {
        let chosen = &candidates[color][value];
        let mut pruned = domains.clone();
        pruned[color] = vec![value];

        for other in undecided {
            pruned[*other].retain(|v| !chosen.conflicts_with(&candidates[*other][*v]));
            if pruned[*other].is_empty() {
                return None;
            }
        }

        Some(pruned)
    }

    /// Whether the chosen paths claim every cell exactly once.
    fn covers_exactly(&self, paths: &[&Candidate]) -> bool {
        let mut covered = bitvec![0; self.puzzle.cell_count()];
        for cell in paths.iter().flat_map(|candidate| &candidate.cells) {
            let index = self.puzzle.index_of(*cell);
            if covered[index] {
                return false;
            }
            covered.set(index, true);
        }
        covered.all()
    }
}

impl FlowSolver for CspSolver<'_> {
    fn solve(self) -> SearchReport {
        let puzzle = self.puzzle;
        let started = Instant::now();
        info!(
            event = "solve_start",
            strategy = "csp",
            rows = puzzle.rows(),
            cols = puzzle.cols(),
            colors = puzzle.num_colors(),
            max_path_len = self.max_path_len,
        );

        let candidates = puzzle.colors().map(|color| self.enumerate_paths(color)).collect::<Vec<_>>();
        debug!(domain_sizes = ?candidates.iter().map(Vec::len).collect::<Vec<_>>(), "domains enumerated");
        if let Some(color) = puzzle.colors().find(|color| candidates[*color].is_empty()) {
            debug!(color, "colour has no path to its goal");
            info!(event = "solve_end", strategy = "csp", termination = ?Termination::Exhausted);
            return SearchReport::failed(Termination::Exhausted);
        }

        let domains: Domains = candidates.iter().map(|paths| (0..paths.len()).collect()).collect();
        let order = self.order_colors(&domains, &self.degrees());
        debug!(order = ?order, "variable order fixed");

        let mut frames = vec![Frame {
            values: Self::order_values(&candidates, &domains, order[0], &order[1..]).into_iter(),
            domains,
        }];
        // chosen[i] is the value assigned to order[i]
        let mut chosen: Vec<usize> = Vec::with_capacity(order.len());
        let mut tried = 0u64;

        while !frames.is_empty() {
            let depth = frames.len() - 1;
            let frame = &mut frames[depth];
            chosen.truncate(depth);
            let color = order[depth];
            let Some(value) = frame.values.next() else {
                frames.pop();
                continue;
            };
            tried += 1;

            let undecided = &order[depth + 1..];
            let Some(pruned) = Self::forward_check(&candidates, &frame.domains, color, value, undecided) else {
                continue;
            };
            chosen.push(value);

            if undecided.is_empty() {
                let mut by_color = order.iter().zip(&chosen)
                    .map(|(color, value)| (*color, &candidates[*color][*value]))
                    .collect::<Vec<_>>();
                by_color.sort_by_key(|(color, _)| *color);
                let paths = by_color.into_iter().map(|(_, candidate)| candidate).collect::<Vec<_>>();

                if self.covers_exactly(&paths) {
                    let moves = paths.iter()
                        .zip(puzzle.colors())
                        .flat_map(|(candidate, color)| moves_along(color, &candidate.cells))
                        .collect::<Vec<_>>();
                    info!(event = "solve_end", strategy = "csp", steps = moves.len(), assignments_tried = tried);
                    return SearchReport::solved(moves, started.elapsed());
                }
                continue;
            }

            let values = Self::order_values(&candidates, &pruned, undecided[0], &undecided[1..]);
            frames.push(Frame { values: values.into_iter(), domains: pruned });
        }

        info!(event = "solve_end", strategy = "csp", termination = ?Termination::Exhausted, assignments_tried = tried);
        SearchReport::failed(Termination::Exhausted)
    }
}
