use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use flowsearch::{Puzzle, SearchReport, SolverConfig, Strategy, Termination};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "solver", version, about = "Solve Flow Free puzzles by search")]
struct Cli {
    /// Puzzle file: one line per row, `.` for empty cells, a letter or digit for each terminal
    puzzle: PathBuf,

    /// astar (a*), bfs, csp or sa (annealing)
    #[arg(short, long, default_value = "astar")]
    strategy: Strategy,

    /// TOML file with [bfs], [csp] and [annealing] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for simulated annealing, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Breadth-first expansion cap, overriding the config file
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Log more; repeat for debug output. RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<SolverConfig> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SolverConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_random_seed(seed);
    }
    if let Some(max_nodes) = cli.max_nodes {
        config = config.with_max_nodes(max_nodes);
    }
    config.validate()?;
    Ok(config)
}

fn print_stats(strategy: Strategy, report: &SearchReport, steps: usize) {
    println!("Solved using algorithm: {strategy}");
    println!("Number of steps to goal: {steps}");
    if let Some(elapsed) = report.elapsed {
        println!("Time taken: {:.4} seconds", elapsed.as_secs_f64());
    }
    if let Some(generated) = report.nodes_generated {
        println!("Nodes generated: {generated}");
    }
    if let Some(expanded) = report.nodes_expanded {
        println!("Nodes expanded: {expanded}");
    }
    if let Some(depth) = report.max_depth {
        println!("Maximum depth reached: {depth}");
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let text = fs::read_to_string(&cli.puzzle).with_context(|| format!("reading {}", cli.puzzle.display()))?;
    let puzzle: Puzzle = text.parse().with_context(|| format!("parsing {}", cli.puzzle.display()))?;
    println!("{puzzle}");

    let report = puzzle.solve(cli.strategy, &config)?;
    let Some(moves) = &report.moves else {
        match report.termination {
            Termination::NodeLimit => println!("{}: gave up after {} expansions.", cli.strategy, config.bfs.max_nodes),
            _ => println!("{}: no solution found.", cli.strategy),
        }
        return Ok(ExitCode::FAILURE);
    };

    let board = puzzle.replay(moves).context("solver returned an invalid move sequence")?;
    println!("{board}");
    print_stats(cli.strategy, &report, moves.len());

    Ok(ExitCode::SUCCESS)
}
