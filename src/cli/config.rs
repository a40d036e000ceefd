//! Config command implementation.

use super::{CliError, load_config};
use std::fs;
use std::path::PathBuf;

/// Print the effective configuration as JSON, or write it to `output`.
///
/// # Errors
///
/// Returns an error if the input config is invalid or the output cannot be written.
pub(crate) fn execute(config: Option<PathBuf>, output: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), None)?;
    let json = config.to_json_pretty()?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{json}\n")).map_err(|e| {
                CliError::new(format!("Failed to write {}: {e}", path.display()))
            })?;
            println!("Config written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
