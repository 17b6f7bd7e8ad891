use std::time::Duration;

use strum::{Display, EnumString, VariantArray};

use crate::annealing::AnnealingSolver;
use crate::astar::AStarSolver;
use crate::bfs::BfsSolver;
use crate::color::Move;
use crate::config::{ConfigError, SolverConfig};
use crate::csp::CspSolver;
use crate::puzzle::Puzzle;

/// The search strategies available through [`Puzzle::solve`].
#[derive(Copy, Clone, Debug, Display, EnumString, VariantArray, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// Best-first search over single-flow advances; see [`AStarSolver`].
    #[strum(to_string = "astar", serialize = "a*")]
    AStar,
    /// Level-order search with heuristic flow ordering; see [`BfsSolver`].
    #[strum(to_string = "bfs")]
    Bfs,
    /// Whole-path backtracking with forward checking; see [`CspSolver`].
    #[strum(to_string = "csp")]
    Csp,
    /// Simulated annealing over random path assignments; see [`AnnealingSolver`].
    #[strum(to_string = "sa", serialize = "annealing")]
    Annealing,
}

/// Why a strategy stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Termination {
    /// A solution was found.
    Solved,
    /// The strategy's whole search space was explored without a solution.
    Exhausted,
    /// Breadth-first search reached its expansion cap; the puzzle may still be solvable.
    NodeLimit,
    /// The annealing schedule cooled down without reaching a zero-cost assignment.
    Cooled,
}

/// What a strategy hands back: the moves (if any) plus whatever statistics it keeps.
///
/// Replaying `moves` from each colour's start with [`Puzzle::replay`] reconstructs every path.
/// Only [`AStarSolver`] and [`BfsSolver`] count nodes; the other strategies leave those fields unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    /// The solution, one cell per move. Moves of different colours may interleave.
    pub moves: Option<Vec<Move>>,
    /// Why the strategy stopped.
    pub termination: Termination,
    /// Wall time spent, present whenever `moves` is.
    pub elapsed: Option<Duration>,
    /// Children created.
    pub nodes_generated: Option<u64>,
    /// Nodes taken off the frontier.
    pub nodes_expanded: Option<u64>,
    /// Deepest node reached, in moves from the root.
    pub max_depth: Option<usize>,
}

impl SearchReport {
    pub(crate) fn solved(moves: Vec<Move>, elapsed: Duration) -> Self {
        Self {
            moves: Some(moves),
            termination: Termination::Solved,
            elapsed: Some(elapsed),
            nodes_generated: None,
            nodes_expanded: None,
            max_depth: None,
        }
    }

    pub(crate) fn failed(termination: Termination) -> Self {
        Self {
            moves: None,
            termination,
            elapsed: None,
            nodes_generated: None,
            nodes_expanded: None,
            max_depth: None,
        }
    }

    pub(crate) fn with_counters(self, counters: &Counters) -> Self {
        Self {
            nodes_generated: Some(counters.generated),
            nodes_expanded: Some(counters.expanded),
            max_depth: Some(counters.max_depth),
            ..self
        }
    }

    /// Whether a solution was found.
    pub fn is_solved(&self) -> bool {
        self.moves.is_some()
    }
}

/// Node statistics kept by the tree searches.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub(crate) generated: u64,
    pub(crate) expanded: u64,
    pub(crate) max_depth: usize,
}

/// A strategy ready to run on one puzzle. Solving consumes the solver, so every run owns its own search data.
pub trait FlowSolver {
    /// Run to completion: a solution, an exhausted search space, or the strategy's own limit.
    fn solve(self) -> SearchReport;
}

pub(crate) type NodeId = usize;

#[derive(Clone, Copy, Debug)]
struct TreeNode {
    parent: Option<NodeId>,
    step: Option<Move>,
    depth: usize,
}

/// Arena of search-tree nodes linked to their parents by index.
///
/// Only the links live here; frontiers own the board snapshots and drop them once a node is expanded.
#[derive(Debug)]
pub(crate) struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    /// A tree holding only its root, which is returned alongside.
    pub(crate) fn with_root() -> (Self, NodeId) {
        let root = TreeNode { parent: None, step: None, depth: 0 };
        (Self { nodes: vec![root] }, 0)
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, step: Move) -> NodeId {
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode { parent: Some(parent), step: Some(step), depth });
        self.nodes.len() - 1
    }

    #[inline]
    pub(crate) fn depth(&self, node: NodeId) -> usize {
        self.nodes[node].depth
    }

    /// The moves leading from the root to `node`, root first.
    pub(crate) fn moves_to(&self, node: NodeId) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.depth(node));
        let mut current = Some(node);
        while let Some(id) = current {
            let TreeNode { parent, step, .. } = self.nodes[id];
            moves.extend(step);
            current = parent;
        }
        moves.reverse();
        moves
    }
}

impl Puzzle {
    /// Solve this puzzle with `strategy`, reading that strategy's section of `config`.
    ///
    /// "No solution" is an ordinary outcome: check [`SearchReport::termination`].
    /// The only error is a `config` failing [`SolverConfig::validate`], which is checked before any search starts.
    ///
    /// ```
    /// use flowsearch::{Direction, Move, Puzzle, SolverConfig, Strategy};
    ///
    /// let puzzle: Puzzle = "RR".parse().unwrap();
    /// let report = puzzle.solve(Strategy::AStar, &SolverConfig::default()).unwrap();
    /// assert_eq!(report.moves, Some(vec![Move::new(0, Direction::Right)]));
    /// ```
    pub fn solve(&self, strategy: Strategy, config: &SolverConfig) -> Result<SearchReport, ConfigError> {
        config.validate()?;
        Ok(match strategy {
            Strategy::AStar => AStarSolver::from(self).solve(),
            Strategy::Bfs => BfsSolver::new(self, config.bfs.max_nodes).solve(),
            Strategy::Csp => CspSolver::new(self, config.csp.max_path_len).solve(),
            Strategy::Annealing => AnnealingSolver::new(self, &config.annealing)?.solve(),
        })
    }
}
