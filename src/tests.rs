#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZero;

    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use strum::VariantArray;

    use crate::annealing::{AnnealingSolver, Coverage};
    use crate::astar::AStarSolver;
    use crate::bfs::BfsSolver;
    use crate::builder::{BuildError, BuilderInvalidReason, ParsePuzzleError, PuzzleBuilder};
    use crate::color::{Move, Terminals};
    use crate::config::{ConfigError, SolverConfig};
    use crate::csp::{CspSolver, Domains};
    use crate::direction::Direction;
    use crate::location::{Dimension, Location};
    use crate::puzzle::Puzzle;
    use crate::solver::{FlowSolver, Strategy, Termination};
    use crate::state::GridState;
    use crate::ReplayError;

    fn dims(rows: usize, cols: usize) -> (Dimension, Dimension) {
        (NonZero::new(rows).unwrap(), NonZero::new(cols).unwrap())
    }

    // flow free classic pack level 1
    fn classic_one() -> Puzzle {
        PuzzleBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(4, 1)))
            .add_termini('B', (Location(0, 2), Location(3, 1)))
            .add_termini('C', (Location(1, 2), Location(4, 2)))
            .add_termini('D', (Location(0, 4), Location(3, 3)))
            .add_termini('E', (Location(1, 4), Location(4, 3)))
            .build()
            .unwrap()
    }

    /// A short, seeded schedule so annealing tests stay quick and repeatable.
    fn quick_config(seed: u64) -> SolverConfig {
        SolverConfig::default()
            .with_random_seed(seed)
            .with_schedule(10.0, 0.1, 0.8, 200)
    }

    fn solved_board(puzzle: &Puzzle, strategy: Strategy, config: &SolverConfig) -> String {
        let report = puzzle.solve(strategy, config).unwrap();
        assert_eq!(report.termination, Termination::Solved, "{strategy} did not solve\n{puzzle}");
        assert!(report.elapsed.is_some());
        let moves = report.moves.unwrap();
        puzzle.replay(&moves).unwrap().to_string()
    }

    #[test]
    fn remove_termini() {
        let puzzle = PuzzleBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .add_termini('B', (Location(2, 0), Location(1, 3)))
            .pop_termini()
            .build()
            .unwrap();

        assert_eq!(puzzle.num_colors(), 1);
        assert_eq!(format!("{}", puzzle), "A....
....A
.....
.....
.....
");
    }

    #[test]
    fn builder_rejects_out_of_bounds() {
        let result = PuzzleBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(5, 0)))
            .build();

        assert_eq!(result.unwrap_err(), BuildError(vec![
            BuilderInvalidReason::TerminusOutOfBounds { display: 'A', location: Location(5, 0) },
        ]));
    }

    #[test]
    fn builder_ignores_calls_once_invalid() {
        let mut builder = PuzzleBuilder::default();
        builder
            .add_termini('A', (Location(0, 0), Location(0, 1)))
            .add_termini('B', (Location(0, 1), Location(2, 2)))
            .add_termini('C', (Location(3, 3), Location(4, 4)))
            .pop_termini();

        let reasons = vec![BuilderInvalidReason::DuplicateTerminus { display: 'B', location: Location(0, 1) }];
        assert_eq!(builder.is_valid(), Some(&reasons));
        assert_eq!(builder.build().unwrap_err(), BuildError(reasons));
    }

    #[test]
    fn builder_rejects_degenerate_and_duplicate_display() {
        let degenerate = PuzzleBuilder::default()
            .add_termini('A', (Location(1, 1), Location(1, 1)))
            .build();
        assert_eq!(degenerate.unwrap_err(), BuildError(vec![
            BuilderInvalidReason::DegenerateTerminus { display: 'A', location: Location(1, 1) },
        ]));

        let duplicate = PuzzleBuilder::default()
            .add_termini('A', (Location(0, 0), Location(0, 4)))
            .add_termini('A', (Location(4, 0), Location(4, 4)))
            .build();
        assert_eq!(duplicate.unwrap_err(), BuildError(vec![BuilderInvalidReason::DuplicateDisplay { display: 'A' }]));

        let folded = PuzzleBuilder::default()
            .add_termini('R', (Location(0, 0), Location(0, 4)))
            .add_termini('r', (Location(4, 0), Location(4, 4)))
            .build();
        assert_eq!(folded.unwrap_err(), BuildError(vec![BuilderInvalidReason::DuplicateDisplay { display: 'r' }]));
    }

    #[test]
    fn builder_requires_termini() {
        assert_eq!(PuzzleBuilder::default().build().unwrap_err(), BuildError(vec![BuilderInvalidReason::NoTermini]));
    }

    #[test]
    fn parse_matches_builder() {
        let puzzle: Puzzle = "
            A.B.D
            ..C.E
            .....
            .B.D.
            .ACE.
        ".parse().unwrap();

        assert_eq!(puzzle.to_string(), classic_one().to_string());
        assert_eq!(puzzle.num_colors(), 5);
        // colours are numbered in reading order
        assert_eq!(puzzle.color_of('D'), Some(2));
        assert_eq!(puzzle.terminals(0), Terminals { start: Location(0, 0), goal: Location(4, 1) });
        assert_eq!(puzzle.display_of(3), 'C');
    }

    #[test]
    fn parse_errors() {
        assert_eq!("  \n ".parse::<Puzzle>().unwrap_err(), ParsePuzzleError::Empty);
        assert_eq!("AB.\nA.".parse::<Puzzle>().unwrap_err(), ParsePuzzleError::Ragged { row: 1, expected: 3, found: 2 });
        assert_eq!(
            "A.A\n.#.".parse::<Puzzle>().unwrap_err(),
            ParsePuzzleError::InvalidCharacter { character: '#', location: Location(1, 1) },
        );
        assert_eq!("A.A\n.A.".parse::<Puzzle>().unwrap_err(), ParsePuzzleError::UnpairedTerminus { display: 'A', count: 3 });
        assert_eq!("A..\n...".parse::<Puzzle>().unwrap_err(), ParsePuzzleError::UnpairedTerminus { display: 'A', count: 1 });
    }

    #[test]
    fn parse_ignores_case() {
        let puzzle: Puzzle = "r.R".parse().unwrap();
        assert_eq!(puzzle.num_colors(), 1);
        assert_eq!(puzzle.color_of('r'), Some(0));
        assert_eq!(puzzle.color_of('R'), Some(0));

        let lower: Puzzle = "r.r".parse().unwrap();
        let printed = lower.to_string();
        assert_eq!(printed, "R.R\n");
        assert_eq!(printed.parse::<Puzzle>().unwrap().to_string(), printed);
    }

    #[test]
    fn replay_rejects_bad_moves() {
        let puzzle: Puzzle = "R.R".parse().unwrap();
        let right = Move::new(0, Direction::Right);

        assert_eq!(puzzle.replay(&[right, right]).unwrap().to_string(), "RrR\n");
        assert_eq!(puzzle.replay(&[]).unwrap_err(), ReplayError::Unfilled { location: Location(0, 1) });
        assert_eq!(
            puzzle.replay(&[Move::new(0, Direction::Left)]).unwrap_err(),
            ReplayError::OutOfBounds { index: 0, color: 0 },
        );
        assert_eq!(
            puzzle.replay(&[Move::new(1, Direction::Right)]).unwrap_err(),
            ReplayError::UnknownColor { index: 0, color: 1 },
        );
        assert_eq!(
            puzzle.replay(&[right, right, right]).unwrap_err(),
            ReplayError::AlreadyFinished { index: 2, color: 0 },
        );
        assert_eq!(
            puzzle.replay(&[right, Move::new(0, Direction::Left)]).unwrap_err(),
            ReplayError::Blocked { index: 1, color: 0, location: Location(0, 0) },
        );

        let columns: Puzzle = "RB\nRB".parse().unwrap();
        assert_eq!(columns.replay(&[]).unwrap_err(), ReplayError::Unfinished { color: 0 });
    }

    #[test]
    fn directions_step_and_invert() {
        let center = Location(1, 1);
        for direction in Direction::VARIANTS {
            let moved = direction.attempt_from(center);
            assert_eq!(moved.manhattan_to(center), 1);
            assert_eq!(Direction::direction_to(center, moved), Some(*direction));
            assert_eq!(direction.invert().attempt_from(moved), center);
        }
        assert_eq!(Direction::direction_to(center, Location(2, 2)), None);
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
    }

    #[test]
    fn board_owners() {
        let puzzle: Puzzle = "RR\nBB".parse().unwrap();
        let board = puzzle.replay(&[Move::new(0, Direction::Right), Move::new(1, Direction::Right)]).unwrap();
        assert_eq!(board.owner_at(Location(0, 1)), Some(0));
        assert_eq!(board.owner_at(Location(1, 0)), Some(1));
        assert_eq!(board.owner_at(Location(2, 0)), None);
    }

    #[test]
    fn strategy_names() {
        assert_eq!("a*".parse::<Strategy>().unwrap(), Strategy::AStar);
        assert_eq!("astar".parse::<Strategy>().unwrap(), Strategy::AStar);
        assert_eq!("annealing".parse::<Strategy>().unwrap(), Strategy::Annealing);
        assert_eq!("sa".parse::<Strategy>().unwrap(), Strategy::Annealing);
        assert_eq!(Strategy::AStar.to_string(), "astar");
        assert_eq!(Strategy::Annealing.to_string(), "sa");
        assert!("dfs".parse::<Strategy>().is_err());
    }

    #[test]
    fn single_step() {
        let puzzle: Puzzle = "RR".parse().unwrap();
        for strategy in Strategy::VARIANTS {
            let report = puzzle.solve(*strategy, &quick_config(1)).unwrap();
            assert_eq!(report.moves, Some(vec![Move::new(0, Direction::Right)]), "{strategy}");
        }
    }

    #[test]
    fn straight_corridor() {
        let puzzle: Puzzle = "R.R".parse().unwrap();
        let right = Move::new(0, Direction::Right);
        for strategy in Strategy::VARIANTS {
            let report = puzzle.solve(*strategy, &quick_config(1)).unwrap();
            assert_eq!(report.moves, Some(vec![right, right]), "{strategy}");
            assert_eq!(solved_board(&puzzle, *strategy, &quick_config(1)), "RrR\n");
        }
    }

    #[test]
    fn two_rows() {
        let puzzle: Puzzle = "RR\nBB".parse().unwrap();
        for strategy in Strategy::VARIANTS {
            let report = puzzle.solve(*strategy, &quick_config(1)).unwrap();
            assert_eq!(
                report.moves,
                Some(vec![Move::new(0, Direction::Right), Move::new(1, Direction::Right)]),
                "{strategy}",
            );
        }
    }

    #[test]
    fn crossed_corners_are_unsolvable() {
        let puzzle: Puzzle = "RB\nBR".parse().unwrap();
        for strategy in Strategy::VARIANTS {
            let report = puzzle.solve(*strategy, &quick_config(1)).unwrap();
            assert_eq!(report.moves, None, "{strategy}");
            assert_eq!(report.termination, Termination::Exhausted, "{strategy}");
            assert_eq!(report.elapsed, None);
        }
    }

    #[test]
    fn uncoverable_cell() {
        let puzzle: Puzzle = "RR.".parse().unwrap();
        let config = quick_config(3);

        assert_eq!(puzzle.solve(Strategy::AStar, &config).unwrap().termination, Termination::Exhausted);
        assert_eq!(puzzle.solve(Strategy::Bfs, &config).unwrap().termination, Termination::Exhausted);
        assert_eq!(puzzle.solve(Strategy::Csp, &config).unwrap().termination, Termination::Exhausted);

        let annealed = puzzle.solve(Strategy::Annealing, &config).unwrap();
        assert_eq!(annealed.termination, Termination::Cooled);
        assert_eq!(annealed.moves, None);
    }

    #[test]
    fn small_puzzle_every_tree_search() {
        let puzzle: Puzzle = "R.G\n...\nRG.".parse().unwrap();
        let config = SolverConfig::default();

        for strategy in [Strategy::AStar, Strategy::Bfs, Strategy::Csp] {
            let board = solved_board(&puzzle, strategy, &config);
            assert_eq!(board.lines().count(), 3);
            assert!(!board.contains('.'), "{strategy} left a gap:\n{board}");
        }
    }

    #[test]
    fn solve_most_basic_astar() {
        let puzzle = classic_one();
        assert_eq!(format!("{}", puzzle), "A.B.D
..C.E
.....
.B.D.
.ACE.
");

        assert_eq!(solved_board(&puzzle, Strategy::AStar, &SolverConfig::default()), "AbBdD
abCdE
abcde
aBcDe
aACEe
");
    }

    #[test]
    fn solve_most_basic_csp() {
        assert_eq!(solved_board(&classic_one(), Strategy::Csp, &SolverConfig::default()), "AbBdD
abCdE
abcde
aBcDe
aACEe
");
    }

    #[test]
    fn astar_pops_in_f_order() {
        let puzzle = classic_one();
        let solver = AStarSolver::from(&puzzle);
        let root = GridState::initial(&puzzle);
        assert_eq!(solver.heuristic(&root), 20);

        let mut pops = Vec::new();
        let report = solver.search(|expansion| pops.push(expansion));
        let moves = report.moves.unwrap();

        assert!(pops.windows(2).all(|pair| pair[0].f <= pair[1].f));
        let last = pops.last().unwrap();
        assert_eq!(last.g, moves.len());
        assert_eq!(last.f, moves.len());
        assert_eq!(report.nodes_expanded, Some(pops.len() as u64));
        assert!(report.nodes_generated.unwrap() >= moves.len() as u64);
        assert_eq!(report.max_depth, Some(moves.len()));
    }

    #[test]
    fn astar_picks_most_constrained_flow() {
        let puzzle = classic_one();
        let root = GridState::initial(&puzzle);
        // D has a single way out, so it goes first despite being four cells from its goal
        assert_eq!(AStarSolver::from(&puzzle).choose_flow(&root), Some(3));
    }

    #[test]
    fn bfs_color_priority() {
        let puzzle = classic_one();
        let root = GridState::initial(&puzzle);
        assert_eq!(BfsSolver::new(&puzzle, 10).color_priority(&root), vec![2, 1, 4, 0, 3]);
    }

    #[test]
    fn bfs_node_limit_is_distinct() {
        let puzzle: Puzzle = "R.R".parse().unwrap();

        let capped = BfsSolver::new(&puzzle, 1).solve();
        assert_eq!(capped.termination, Termination::NodeLimit);
        assert_eq!(capped.moves, None);
        assert_eq!(capped.nodes_expanded, Some(1));
        assert_eq!(capped.nodes_generated, Some(2));

        let uncapped = BfsSolver::new(&puzzle, 100).solve();
        assert_eq!(uncapped.termination, Termination::Solved);
        assert_eq!(uncapped.nodes_expanded, Some(3));
        assert_eq!(uncapped.max_depth, Some(2));

        let dead: Puzzle = "RR.".parse().unwrap();
        assert_eq!(BfsSolver::new(&dead, 100).solve().termination, Termination::Exhausted);
    }

    #[test]
    fn csp_reports_no_node_counts() {
        let puzzle: Puzzle = "R.R".parse().unwrap();
        let report = CspSolver::new(&puzzle, None).solve();
        assert!(report.is_solved());
        assert_eq!((report.nodes_generated, report.nodes_expanded, report.max_depth), (None, None, None));

        // three cells will not fit in two
        assert_eq!(CspSolver::new(&puzzle, Some(2)).solve().termination, Termination::Exhausted);
    }

    #[test]
    fn csp_degrees() {
        let puzzle = classic_one();
        assert_eq!(CspSolver::new(&puzzle, None).degrees(), vec![2, 2, 3, 1, 2]);
    }

    #[test]
    fn forward_check_only_removes() {
        let puzzle = classic_one();
        let solver = CspSolver::new(&puzzle, None);
        let candidates = puzzle.colors().map(|color| solver.enumerate_paths(color)).collect::<Vec<_>>();
        let domains: Domains = candidates.iter().map(|paths| (0..paths.len()).collect()).collect();
        let before = domains.clone();
        let mut pruned_any = false;

        for color in puzzle.colors() {
            let undecided = puzzle.colors().filter(|other| *other != color).collect::<Vec<_>>();
            for value in domains[color].iter().copied() {
                let Some(pruned) = CspSolver::forward_check(&candidates, &domains, color, value, &undecided) else {
                    continue;
                };

                assert_eq!(pruned[color], vec![value]);
                for other in &undecided {
                    assert!(pruned[*other].iter().all(|v| domains[*other].contains(v)));
                    pruned_any |= pruned[*other].len() < domains[*other].len();
                }
            }
        }

        assert!(pruned_any);
        assert_eq!(domains, before);
    }

    #[test]
    fn enumerated_paths_are_simple() {
        let puzzle = classic_one();
        let solver = CspSolver::new(&puzzle, None);
        for color in puzzle.colors() {
            let Terminals { start, goal } = puzzle.terminals(color);
            let paths = solver.enumerate_paths(color);
            assert!(!paths.is_empty());

            for candidate in paths {
                let cells = &candidate.cells;
                assert_eq!((cells[0], cells[cells.len() - 1]), (start, goal));
                assert_eq!(cells.iter().collect::<HashSet<_>>().len(), cells.len());
                assert!(cells.windows(2).all(|pair| pair[0].manhattan_to(pair[1]) == 1));
            }
        }
    }

    #[test]
    fn random_paths_avoid_other_termini() {
        let puzzle = classic_one();
        for seed in 0..20 {
            let mut solver = AnnealingSolver::with_rng(&puzzle, &SolverConfig::default().annealing, ChaCha8Rng::seed_from_u64(seed)).unwrap();
            for color in puzzle.colors() {
                let Terminals { start, goal } = puzzle.terminals(color);
                let path = solver.random_path(color).unwrap();

                assert_eq!((path[0], path[path.len() - 1]), (start, goal));
                assert_eq!(path.iter().collect::<HashSet<_>>().len(), path.len());
                assert!(path.windows(2).all(|pair| pair[0].manhattan_to(pair[1]) == 1));
                assert!(path[1..path.len() - 1].iter().all(|cell| puzzle.terminus_owner(*cell).is_none()));
            }
        }
    }

    #[test]
    fn coverage_cost() {
        let puzzle: Puzzle = "R.R".parse().unwrap();
        let mut coverage = Coverage::new(&puzzle);
        assert_eq!(coverage.cost(), 3);

        let full = [Location(0, 0), Location(0, 1), Location(0, 2)];
        coverage.add(&full);
        assert_eq!(coverage.cost(), 0);
        coverage.add(&full[1..]);
        assert_eq!(coverage.cost(), 2);
        coverage.remove(&full[1..]);
        assert_eq!(coverage.cost(), 0);
        coverage.remove(&full);
        assert_eq!(coverage.cost(), 3);
    }

    #[test]
    fn annealing_fills_open_board() {
        let puzzle: Puzzle = "R..\n...\n..R".parse().unwrap();
        assert_eq!(solved_board(&puzzle, Strategy::Annealing, &quick_config(11)), "Rrr
rrr
rrR
");
    }

    #[test]
    fn deterministic_runs() {
        let puzzle: Puzzle = "R.G\n...\nRG.".parse().unwrap();
        let config = SolverConfig::default();
        for strategy in [Strategy::AStar, Strategy::Bfs, Strategy::Csp] {
            let first = puzzle.solve(strategy, &config).unwrap();
            let second = puzzle.solve(strategy, &config).unwrap();
            assert_eq!(first.moves, second.moves, "{strategy}");
            assert_eq!(first.nodes_expanded, second.nodes_expanded, "{strategy}");
        }

        let open: Puzzle = "R..\n...\n..R".parse().unwrap();
        let first = open.solve(Strategy::Annealing, &quick_config(5)).unwrap();
        let second = open.solve(Strategy::Annealing, &quick_config(5)).unwrap();
        assert!(first.is_solved());
        assert_eq!(first.moves, second.moves);
    }

    #[test]
    fn config_from_toml() {
        let config = SolverConfig::from_toml_str(r#"
            [bfs]
            max_nodes = 250

            [csp]
            max_path_len = 12

            [annealing]
            starting_temperature = 50.0
            random_seed = 9
        "#).unwrap();

        assert_eq!(config.bfs.max_nodes, 250);
        assert_eq!(config.csp.max_path_len, Some(12));
        assert_eq!(config.annealing.starting_temperature, 50.0);
        assert_eq!(config.annealing.cooling_rate, 0.95);
        assert_eq!(config.annealing.random_seed, Some(9));
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn config_validation() {
        for toml in [
            "[bfs]\nmax_nodes = 0",
            "[csp]\nmax_path_len = 1",
            "[annealing]\ncooling_rate = 1.5",
            "[annealing]\nminimum_temperature = 0.0",
            "[annealing]\nstarting_temperature = 0.001",
            "[annealing]\ntrials_per_temperature = 0",
        ] {
            assert!(matches!(SolverConfig::from_toml_str(toml), Err(ConfigError::Invalid(_))), "{toml}");
        }

        assert!(matches!(SolverConfig::from_toml_str("bfs = 3"), Err(ConfigError::Toml(_))));
        assert!(matches!(SolverConfig::load("/nonexistent/flowsearch.toml"), Err(ConfigError::Io(_))));
        assert!(quick_config(0).validate().is_ok());
    }

    #[test]
    fn solve_rejects_endless_schedule() {
        let puzzle: Puzzle = "RR.".parse().unwrap();
        let endless = SolverConfig::default()
            .with_random_seed(1)
            .with_schedule(10.0, 0.1, 1.0, 10);

        for &strategy in Strategy::VARIANTS {
            assert!(matches!(puzzle.solve(strategy, &endless), Err(ConfigError::Invalid(_))), "{strategy}");
        }

        let rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(AnnealingSolver::with_rng(&puzzle, &endless.annealing, rng), Err(ConfigError::Invalid(_))));
        assert!(matches!(AnnealingSolver::new(&puzzle, &endless.annealing), Err(ConfigError::Invalid(_))));

        let report = puzzle.solve(Strategy::Annealing, &quick_config(1)).unwrap();
        assert_eq!(report.termination, Termination::Cooled);
    }
}
