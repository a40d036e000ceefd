//! civgrid CLI - run and batch city-building games between strategies.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// civgrid - a deterministic multi-agent city-building game
#[derive(Parser, Debug)]
#[command(name = "civgrid")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single game between strategies
    Run {
        /// Agent strategies in turn order, comma separated
        /// (2-8 agents, default: economic,reputation,balanced)
        #[arg(short, long, value_delimiter = ',')]
        agents: Vec<cli::StrategyArg>,

        /// Random seed for strategies (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum steps (default: 50)
        #[arg(short, long, default_value = "50")]
        turns: u32,

        /// JSON game config (default: built-in tables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the grid side length
        #[arg(short, long)]
        grid_size: Option<u16>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Write the turn-by-turn board log to this file (truncated first)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Suppress the run banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many games in parallel and aggregate statistics
    Batch {
        /// Agent strategies in turn order, comma separated
        #[arg(short, long, value_delimiter = ',')]
        agents: Vec<cli::StrategyArg>,

        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum steps per game (default: 50)
        #[arg(short = 't', long, default_value = "50")]
        max_turns: u32,

        /// JSON game config (default: built-in tables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::BatchFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the effective game config as JSON
    Config {
        /// JSON game config to check and normalize
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_file = match &args.command {
        Commands::Run { log_file, .. } => log_file.clone(),
        Commands::Batch { .. } | Commands::Config { .. } => None,
    };
    if let Err(e) = cli::init_logging(log_file.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match args.command {
        Commands::Run {
            agents,
            seed,
            turns,
            config,
            grid_size,
            format,
            log_file,
            quiet,
        } => cli::run::execute(&agents, seed, turns, config, grid_size, format, log_file, quiet),

        Commands::Batch {
            agents,
            games,
            seed,
            threads,
            max_turns,
            config,
            format,
            progress,
        } => cli::batch::execute(&agents, games, seed, threads, max_turns, config, format, progress),

        Commands::Config { config, output } => cli::config::execute(config, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
