//! Partially filled boards as seen by the incremental searches ([`astar`](crate::astar) and [`bfs`](crate::bfs)).

use ndarray::Array2;

use crate::cell::Cell;
use crate::color::ColorId;
use crate::direction::Direction;
use crate::location::Location;
use crate::puzzle::Puzzle;

/// Canonical, collision-free encoding of a [`GridState`]: the owner of every cell in row-major order followed by
/// every head, in colour order. Equal keys mean interchangeable states.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct StateKey(Box<[u32]>);

/// A board snapshot plus the head of every flow.
///
/// States are never mutated once built; [`apply_move`](Self::apply_move) returns a fresh copy.
#[derive(Clone, Debug)]
pub(crate) struct GridState {
    pub(crate) cells: Array2<Cell>,
    pub(crate) heads: Vec<Location>,
}

impl GridState {
    /// Every terminal placed, every head on its start.
    pub(crate) fn initial(puzzle: &Puzzle) -> Self {
        Self {
            cells: puzzle.seeded.clone(),
            heads: puzzle.terminals.iter().map(|t| t.start).collect(),
        }
    }

    #[inline]
    pub(crate) fn head(&self, color: ColorId) -> Location {
        self.heads[color]
    }

    #[inline]
    pub(crate) fn at_goal(&self, puzzle: &Puzzle, color: ColorId) -> bool {
        self.heads[color] == puzzle.terminals[color].goal
    }

    /// Manhattan distance from the head of `color` to its goal.
    #[inline]
    pub(crate) fn distance_to_goal(&self, puzzle: &Puzzle, color: ColorId) -> usize {
        self.heads[color].manhattan_to(puzzle.terminals[color].goal)
    }

    /// Whether the head of `color` may step in `direction`: the destination must be on the board and either empty
    /// or the colour's own goal.
    pub(crate) fn can_move(&self, puzzle: &Puzzle, color: ColorId, direction: Direction) -> bool {
        let target = direction.attempt_from(self.heads[color]);
        match self.cells.get(target.as_index()) {
            Some(Cell::Empty) => true,
            Some(Cell::Terminus { color: owner }) => *owner == color && target == puzzle.terminals[color].goal,
            _ => false,
        }
    }

    /// A copy of this state with the head of `color` advanced one cell in `direction`.
    ///
    /// Callers must have checked [`can_move`](Self::can_move).
    pub(crate) fn apply_move(&self, puzzle: &Puzzle, color: ColorId, direction: Direction) -> Self {
        debug_assert!(self.can_move(puzzle, color, direction));

        let target = direction.attempt_from(self.heads[color]);
        let mut next = self.clone();
        if next.cells[target.as_index()].is_empty() {
            next.cells[target.as_index()] = Cell::Path { color };
        }
        next.heads[color] = target;
        next
    }

    /// Number of directions the head of `color` can currently take.
    pub(crate) fn valid_move_count(&self, puzzle: &Puzzle, color: ColorId) -> usize {
        puzzle.neighbors_of(self.heads[color])
            .filter(|(direction, _)| self.can_move(puzzle, color, *direction))
            .count()
    }

    /// Number of empty cells orthogonally adjacent to `location`.
    pub(crate) fn empty_neighbors(&self, puzzle: &Puzzle, location: Location) -> usize {
        puzzle.neighbors_of(location)
            .filter(|(_, neighbor)| self.cells[neighbor.as_index()].is_empty())
            .count()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Full coverage with every flow resting on its goal.
    pub(crate) fn is_goal(&self, puzzle: &Puzzle) -> bool {
        puzzle.colors().all(|color| self.at_goal(puzzle, color)) && self.is_full()
    }

    /// Whether some flow can no longer reach its goal through empty cells.
    pub(crate) fn has_dead_end(&self, puzzle: &Puzzle) -> bool {
        puzzle.colors().any(|color| !reachable(puzzle, &self.cells, self.heads[color], puzzle.terminals[color].goal))
    }

    pub(crate) fn encode(&self, puzzle: &Puzzle) -> StateKey {
        StateKey(self.cells.iter()
            .map(|cell| cell.owner().map_or(0, |color| color as u32 + 1))
            .chain(self.heads.iter().map(|head| puzzle.index_of(*head) as u32))
            .collect())
    }
}

/// Depth-first flood from `from` over empty cells, succeeding once `to` is adjacent.
///
/// Only truly empty cells and `to` itself are traversable; cells held by any colour, including the one being
/// tested, block the flood.
pub(crate) fn reachable(puzzle: &Puzzle, cells: &Array2<Cell>, from: Location, to: Location) -> bool {
    if from == to {
        return true;
    }

    let mut visited = Array2::from_elem(cells.raw_dim(), false);
    let mut stack = vec![from];
    visited[from.as_index()] = true;

    while let Some(location) = stack.pop() {
        for (_, neighbor) in puzzle.neighbors_of(location) {
            if neighbor == to {
                return true;
            }
            if !visited[neighbor.as_index()] && cells[neighbor.as_index()].is_empty() {
                visited[neighbor.as_index()] = true;
                stack.push(neighbor);
            }
        }
    }

    false
}
