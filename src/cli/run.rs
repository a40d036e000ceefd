//! Run command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, OutputFormat, StrategyArg, build_roster, load_config, resolve_seed};
use civgrid::driver::{DriverOptions, check_roster, run_game};
use std::path::PathBuf;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the game fails to run.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    agents: &[StrategyArg],
    seed: Option<u64>,
    turns: u32,
    config: Option<PathBuf>,
    grid_size: Option<u16>,
    format: OutputFormat,
    log_file: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let seats = build_roster(agents);
    check_roster(&seats)?;
    let config = load_config(config.as_deref(), grid_size)?;
    let seed = resolve_seed(seed);

    let options = DriverOptions {
        max_turns: turns,
        log_board: log_file.is_some(),
    };

    if !quiet && format == OutputFormat::Text {
        println!("Running game with seed {seed}...");
        let roster: Vec<String> = seats
            .iter()
            .map(|s| format!("{} ({})", s.name, s.strategy))
            .collect();
        println!("Agents: {}", roster.join(", "));
        if let Some(path) = &log_file {
            println!("Logging board to {}", path.display());
        }
        println!();
    }

    let result = run_game(seed, &seats, config, &options)?;

    match format {
        OutputFormat::Text => {
            if !result.terminated {
                println!("Game forcefully ended after {} moves.", result.turns_played);
            }
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json_result = JsonGameResult::from_game_result(&result);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
