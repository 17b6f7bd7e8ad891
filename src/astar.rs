//! Best-first search over single-flow advances.
//!
//! Each node advances exactly one flow: the unfinished colour with the fewest options plus the shortest remaining
//! distance. That keeps the branching factor at four no matter how many colours the puzzle has. Nodes are ranked by
//! `f = g + h`, where `g` counts moves so far and `h` sums every flow's Manhattan distance to its goal. Every flow
//! needs at least that many more moves, so `h` never overestimates.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use strum::VariantArray;
use tracing::{info, trace};

use crate::color::{ColorId, Move};
use crate::direction::Direction;
use crate::puzzle::Puzzle;
use crate::solver::{Counters, FlowSolver, NodeId, SearchReport, SearchTree, Termination};
use crate::state::{GridState, StateKey};

/// Open-set entry. Ordered so that [`BinaryHeap`] pops the lowest `f` first and, among equal `f`, the entry pushed
/// first.
struct OpenEntry {
    f: usize,
    seq: u64,
    node: NodeId,
    state: GridState,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A node as it leaves the open set, reported to [`AStarSolver::search`] observers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Expansion {
    pub(crate) f: usize,
    pub(crate) g: usize,
}

/// A* search for one [`Puzzle`]. Build with [`From`] and run with [`FlowSolver::solve`].
pub struct AStarSolver<'a> {
    puzzle: &'a Puzzle,
}

impl<'a> From<&'a Puzzle> for AStarSolver<'a> {
    fn from(puzzle: &'a Puzzle) -> Self {
        Self { puzzle }
    }
}

impl AStarSolver<'_> {
    /// Sum of every flow's Manhattan distance to its goal.
    pub(crate) fn heuristic(&self, state: &GridState) -> usize {
        self.puzzle.colors().map(|color| state.distance_to_goal(self.puzzle, color)).sum()
    }

    /// The unfinished colour minimising valid moves plus distance to goal; ties go to the lower colour.
    pub(crate) fn choose_flow(&self, state: &GridState) -> Option<ColorId> {
        self.puzzle.colors()
            .filter(|color| !state.at_goal(self.puzzle, *color))
            .min_by_key(|color| state.valid_move_count(self.puzzle, *color) + state.distance_to_goal(self.puzzle, *color))
    }

    /// Children of `state` that advance the chosen flow and leave every flow able to reach its goal.
    fn successors(&self, state: &GridState) -> Vec<(Move, GridState)> {
        let Some(color) = self.choose_flow(state) else {
            return Vec::new();
        };

        Direction::VARIANTS.iter()
            .filter(|direction| state.can_move(self.puzzle, color, **direction))
            .map(|direction| (Move::new(color, *direction), state.apply_move(self.puzzle, color, *direction)))
            .filter(|(_, child)| !child.has_dead_end(self.puzzle))
            .collect()
    }

    /// Run the search, calling `on_expand` for every node popped from the open set.
    pub(crate) fn search(&self, mut on_expand: impl FnMut(Expansion)) -> SearchReport {
        let puzzle = self.puzzle;
        let started = Instant::now();
        info!(
            event = "solve_start",
            strategy = "astar",
            rows = puzzle.rows(),
            cols = puzzle.cols(),
            colors = puzzle.num_colors(),
        );

        let (mut tree, root) = SearchTree::with_root();
        let root_state = GridState::initial(puzzle);
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;
        open.push(OpenEntry { f: self.heuristic(&root_state), seq, node: root, state: root_state });

        // cheapest g seen per state
        let mut best_cost: HashMap<StateKey, usize> = HashMap::new();
        let mut counters = Counters::default();

        while let Some(OpenEntry { f, node, state, .. }) = open.pop() {
            counters.expanded += 1;
            let g = tree.depth(node);
            counters.max_depth = counters.max_depth.max(g);
            on_expand(Expansion { f, g });

            if state.is_goal(puzzle) {
                let moves = tree.moves_to(node);
                info!(
                    event = "solve_end",
                    strategy = "astar",
                    steps = moves.len(),
                    nodes_generated = counters.generated,
                    nodes_expanded = counters.expanded,
                    max_depth = counters.max_depth,
                );
                return SearchReport::solved(moves, started.elapsed()).with_counters(&counters);
            }

            match best_cost.entry(state.encode(puzzle)) {
                Entry::Occupied(known) if *known.get() <= g => continue,
                Entry::Occupied(mut known) => {
                    known.insert(g);
                }
                Entry::Vacant(slot) => {
                    slot.insert(g);
                }
            }

            for (step, child_state) in self.successors(&state) {
                counters.generated += 1;
                let child_g = g + 1;
                if best_cost.get(&child_state.encode(puzzle)).is_some_and(|known| *known <= child_g) {
                    continue;
                }

                let child = tree.add_child(node, step);
                let child_f = child_g + self.heuristic(&child_state);
                trace!(color = step.color, direction = %step.direction, f = child_f, "push");
                seq += 1;
                open.push(OpenEntry { f: child_f, seq, node: child, state: child_state });
            }
        }

        info!(
            event = "solve_end",
            strategy = "astar",
            termination = ?Termination::Exhausted,
            nodes_generated = counters.generated,
            nodes_expanded = counters.expanded,
        );
        SearchReport::failed(Termination::Exhausted).with_counters(&counters)
    }
}

impl FlowSolver for AStarSolver<'_> {
    fn solve(self) -> SearchReport {
        self.search(|_| {})
    }
}
