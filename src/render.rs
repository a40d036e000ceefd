//! Plain-text rendering of the board and scores.
//!
//! Every function here is read-only: it formats a snapshot and returns a
//! `String`. Drivers route the text through the `log` facade.
//!
//! Board format, one line per grid row:
//! ```text
//! Current Board State:
//! [P|G:60|V:0|D:30|B:P1]  , [X|G:40|V:20|D:30|B:NA] , ...
//! ```
//!
//! The compact board shows only buildings: `[P][ ][S][H]`.

// Allow format! with push_str for readability
#![allow(clippy::format_push_string)]

use crate::game::{AgentScore, Grid};

/// Width every cell is padded to.
pub const CELL_WIDTH: usize = 24;

/// Separator between cells of one row.
const SEPARATOR: &str = ", ";

/// Longest builder name shown on the board.
const BUILDER_NAME_LIMIT: usize = 4;

/// Header logged before each board.
#[must_use]
pub fn render_turn_header(turn: u32, agent: &str) -> String {
    format!("Current Turn: {turn}, Agent: {agent}")
}

/// Render the whole board, one line per row.
///
/// Builder names are truncated to four characters; a builder index outside
/// `agents` renders as `None`.
#[must_use]
pub fn render_board(grid: &Grid, agents: &[String]) -> String {
    let mut output = String::from("Current Board State:\n");
    let size = usize::from(grid.size());

    for row in grid.cells().chunks(size) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                let [g, v, d] = cell.indices();
                let content = match cell.building() {
                    None => format!("[X|G:{g}|V:{v}|D:{d}|B:NA]"),
                    Some(building) => {
                        let name = agents
                            .get(building.builder)
                            .map_or("None", String::as_str);
                        let short: String = name.chars().take(BUILDER_NAME_LIMIT).collect();
                        format!(
                            "[{}|G:{g}|V:{v}|D:{d}|B:{short}]",
                            building.kind.letter()
                        )
                    }
                };
                format!("{content:<CELL_WIDTH$}")
            })
            .collect();
        output.push_str(&cells.join(SEPARATOR));
        output.push('\n');
    }

    output.push('\n');
    output
}

/// Render the board as building letters only, one line per row.
#[must_use]
pub fn render_compact(grid: &Grid) -> String {
    let size = usize::from(grid.size());
    let mut output = String::with_capacity(grid.cells().len() * 3 + size);

    for row in grid.cells().chunks(size) {
        for cell in row {
            let letter = cell.building().map_or(' ', |b| b.kind.letter());
            output.push('[');
            output.push(letter);
            output.push(']');
        }
        output.push('\n');
    }
    output
}

/// Self and final score for every agent.
#[must_use]
pub fn render_player_stats(agents: &[String], scores: &[AgentScore]) -> String {
    let mut output = String::from("Player Statistics:\n");
    for (name, score) in agents.iter().zip(scores) {
        output.push_str(&format!("{name}:\n"));
        output.push_str(&format!("  Self Score: {}\n", score.self_score));
        output.push_str(&format!("  Final Score: {:.2}\n", score.final_score));
    }
    output.push('\n');
    output
}
