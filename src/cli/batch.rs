//! Batch command implementation.

use super::output::{JsonBatchResult, format_batch_csv, format_batch_text};
use super::{BatchFormat, CliError, StrategyArg, build_roster, load_config, resolve_seed};
use civgrid::driver::{DriverOptions, run_batch};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if the config or roster is invalid.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    agents: &[StrategyArg],
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_turns: u32,
    config: Option<PathBuf>,
    format: BatchFormat,
    progress: bool,
) -> Result<(), CliError> {
    let seats = build_roster(agents);
    let config = load_config(config.as_deref(), None)?;

    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = resolve_seed(seed);
    let options = DriverOptions {
        max_turns,
        log_board: false,
    };

    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let stats = run_batch(base_seed, games, &seats, &config, &options, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        BatchFormat::Text => {
            println!();
            print!("{}", format_batch_text(&stats, &seats));
            println!();
            println!(
                "Base seed: {base_seed}, duration: {:.2}s ({games_per_sec:.0} games/sec)",
                duration.as_secs_f64()
            );
        }
        BatchFormat::Json => {
            let json_result = JsonBatchResult::from_stats(&stats, &seats);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        BatchFormat::Csv => {
            print!("{}", format_batch_csv(&stats, &seats));
        }
    }

    Ok(())
}
