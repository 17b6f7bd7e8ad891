//! Level-order search over single-flow advances.
//!
//! Unlike [`astar`](crate::astar), every unfinished flow is branched on at every node. The order flows are tried in
//! is reshuffled per node so that flows near their goal with few escape routes come first, which pulls the first
//! solution forward within its level.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use itertools::Itertools;
use strum::VariantArray;
use tracing::{debug, info, trace};

use crate::color::{ColorId, Move};
use crate::direction::Direction;
use crate::puzzle::Puzzle;
use crate::solver::{Counters, FlowSolver, NodeId, SearchReport, SearchTree, Termination};
use crate::state::{GridState, StateKey};

/// Breadth-first search for one [`Puzzle`], capped at a number of expansions.
pub struct BfsSolver<'a> {
    puzzle: &'a Puzzle,
    max_nodes: u64,
}

impl<'a> BfsSolver<'a> {
    /// A solver that stops with [`Termination::NodeLimit`] after expanding `max_nodes` nodes.
    pub fn new(puzzle: &'a Puzzle, max_nodes: u64) -> Self {
        Self { puzzle, max_nodes }
    }

    /// Unfinished colours, ascending by distance to goal minus empty cells around the head.
    /// Equal keys keep colour order.
    pub(crate) fn color_priority(&self, state: &GridState) -> Vec<ColorId> {
        self.puzzle.colors()
            .filter(|color| !state.at_goal(self.puzzle, *color))
            .sorted_by_key(|color| {
                let distance = state.distance_to_goal(self.puzzle, *color) as isize;
                distance - state.empty_neighbors(self.puzzle, state.head(*color)) as isize
            })
            .collect()
    }

    /// Whether `color` may step in `direction`. Other colours' goals are off limits even before their flows arrive.
    fn allowed(&self, state: &GridState, color: ColorId, direction: Direction) -> bool {
        let target = direction.attempt_from(state.head(color));
        self.puzzle.goal_owner(target).map_or(true, |owner| owner == color)
            && state.can_move(self.puzzle, color, direction)
    }
}

impl FlowSolver for BfsSolver<'_> {
    fn solve(self) -> SearchReport {
        let puzzle = self.puzzle;
        let started = Instant::now();
        info!(
            event = "solve_start",
            strategy = "bfs",
            rows = puzzle.rows(),
            cols = puzzle.cols(),
            colors = puzzle.num_colors(),
            max_nodes = self.max_nodes,
        );

        let (mut tree, root) = SearchTree::with_root();
        let root_state = GridState::initial(puzzle);
        let mut visited: HashSet<StateKey> = HashSet::from([root_state.encode(puzzle)]);
        let mut frontier: VecDeque<(NodeId, GridState)> = VecDeque::from([(root, root_state)]);
        let mut counters = Counters { generated: 1, ..Counters::default() };

        loop {
            if counters.expanded >= self.max_nodes {
                debug!(expanded = counters.expanded, queued = frontier.len(), "node limit reached");
                info!(
                    event = "solve_end",
                    strategy = "bfs",
                    termination = ?Termination::NodeLimit,
                    nodes_generated = counters.generated,
                    nodes_expanded = counters.expanded,
                );
                return SearchReport::failed(Termination::NodeLimit).with_counters(&counters);
            }

            let Some((node, state)) = frontier.pop_front() else {
                break;
            };
            counters.expanded += 1;

            if state.is_goal(puzzle) {
                let moves = tree.moves_to(node);
                info!(
                    event = "solve_end",
                    strategy = "bfs",
                    steps = moves.len(),
                    nodes_generated = counters.generated,
                    nodes_expanded = counters.expanded,
                    max_depth = counters.max_depth,
                );
                return SearchReport::solved(moves, started.elapsed()).with_counters(&counters);
            }

            for color in self.color_priority(&state) {
                for direction in Direction::VARIANTS {
                    if !self.allowed(&state, color, *direction) {
                        continue;
                    }

                    let child_state = state.apply_move(puzzle, color, *direction);
                    if !visited.insert(child_state.encode(puzzle)) {
                        continue;
                    }

                    let child = tree.add_child(node, Move::new(color, *direction));
                    counters.generated += 1;
                    counters.max_depth = counters.max_depth.max(tree.depth(child));
                    trace!(color, %direction, depth = tree.depth(child), "enqueue");
                    frontier.push_back((child, child_state));
                }
            }
        }

        info!(
            event = "solve_end",
            strategy = "bfs",
            termination = ?Termination::Exhausted,
            nodes_generated = counters.generated,
            nodes_expanded = counters.expanded,
        );
        SearchReport::failed(Termination::Exhausted).with_counters(&counters)
    }
}
