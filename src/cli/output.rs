//! Output formatting utilities for CLI.

// Allow format! with push_str for readability
#![allow(clippy::format_push_string)]

use civgrid::driver::{BatchStats, GameResult, Seat};
use civgrid::render::render_compact;
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult {
    /// Seed used.
    pub(super) seed: u64,
    /// Steps played.
    pub(super) turns_played: u32,
    /// Ended by game rules (false if cut by the turn cap).
    pub(super) terminated: bool,
    /// Environment score at game end.
    pub(super) environment_score: f64,
    /// Buildings on the board.
    pub(super) buildings: usize,
    /// Winner name (null if tied).
    pub(super) winner: Option<String>,
    /// Per-agent results.
    pub(super) agents: Vec<JsonAgentResult>,
}

/// JSON-serializable agent result.
#[derive(Debug, Serialize)]
pub(super) struct JsonAgentResult {
    /// Agent name.
    pub(super) name: String,
    /// Strategy name.
    pub(super) strategy: String,
    /// Sum of step rewards.
    pub(super) self_score: i64,
    /// Final blended score.
    pub(super) final_score: f64,
    /// Money at game end.
    pub(super) money: i64,
    /// Reputation at game end.
    pub(super) reputation: i64,
    /// Successful placements.
    pub(super) placements: u32,
    /// Penalized placements.
    pub(super) penalties: u32,
}

impl JsonGameResult {
    /// Create from a `GameResult`.
    pub(super) fn from_game_result(result: &GameResult) -> Self {
        Self {
            seed: result.seed,
            turns_played: result.turns_played,
            terminated: result.terminated,
            environment_score: result.environment_score,
            buildings: result.buildings,
            winner: result
                .winner
                .and_then(|w| result.agents.get(w))
                .map(|a| a.name.clone()),
            agents: result
                .agents
                .iter()
                .map(|a| JsonAgentResult {
                    name: a.name.clone(),
                    strategy: a.strategy.to_string(),
                    self_score: a.self_score,
                    final_score: a.final_score,
                    money: a.resources.money,
                    reputation: a.resources.reputation,
                    placements: a.placements,
                    penalties: a.penalties,
                })
                .collect(),
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result (seed: {})\n", result.seed));
    match result.winner.and_then(|w| result.agents.get(w)) {
        Some(winner) => output.push_str(&format!("  Winner: {} ({})\n", winner.name, winner.strategy)),
        None => output.push_str("  Winner: Draw\n"),
    }
    let ending = if result.terminated { "game over" } else { "turn cap" };
    output.push_str(&format!("  Turns: {} ({ending})\n", result.turns_played));
    output.push_str(&format!("  Buildings: {}\n\n", result.buildings));

    for agent in &result.agents {
        output.push_str(&format!(
            "  {} ({}): final {:.2}, self {}, money {}, reputation {}, {} placed, {} penalized\n",
            agent.name,
            agent.strategy,
            agent.final_score,
            agent.self_score,
            agent.resources.money,
            agent.resources.reputation,
            agent.placements,
            agent.penalties
        ));
    }

    output.push_str(&format!(
        "\nGlobal Environment Score: {:.2}\n",
        result.environment_score
    ));
    output.push_str("\nFinal Board:\n");
    output.push_str(&render_compact(&result.grid));
    output
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Total games played.
    games_played: u64,
    /// Games that ended before the turn cap.
    games_terminated: u64,
    /// Per-seat statistics.
    agents: Vec<JsonBatchAgent>,
    /// Number of draws.
    draws: u64,
    /// Average game length in steps.
    avg_turns: f64,
    /// Average final environment score.
    avg_environment_score: f64,
}

/// JSON-serializable per-seat batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchAgent {
    /// Agent name.
    name: String,
    /// Strategy name.
    strategy: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final score.
    avg_final_score: f64,
    /// Final score standard deviation.
    final_score_std_dev: f64,
    /// Average self score.
    avg_self_score: f64,
}

impl JsonBatchResult {
    /// Create from stats and seats.
    pub(super) fn from_stats(stats: &BatchStats, seats: &[Seat]) -> Self {
        let agents = seats
            .iter()
            .enumerate()
            .map(|(i, seat)| JsonBatchAgent {
                name: seat.name.clone(),
                strategy: seat.strategy.to_string(),
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                avg_final_score: stats.avg_final_score(i),
                final_score_std_dev: stats.final_score_std_dev(i),
                avg_self_score: stats.avg_self_score(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            games_terminated: stats.games_terminated,
            agents,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
            avg_environment_score: stats.avg_environment_score(),
        }
    }
}

/// Format batch stats as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_batch_text(stats: &BatchStats, seats: &[Seat]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Batch Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, seat) in seats.iter().enumerate() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let rate = stats.win_rate(i) * 100.0;
        output.push_str(&format!(
            "  {} ({}): {rate:.1}% ({wins} wins)\n",
            seat.name, seat.strategy
        ));
    }
    let draw_rate = if stats.games_played == 0 {
        0.0
    } else {
        stats.draws as f64 / stats.games_played as f64 * 100.0
    };
    output.push_str(&format!("  Draws: {} ({draw_rate:.1}%)\n\n", stats.draws));

    output.push_str("Average Final Scores:\n");
    for (i, seat) in seats.iter().enumerate() {
        output.push_str(&format!(
            "  {} ({}): {:.1} (+/- {:.1}), self {:.1}\n",
            seat.name,
            seat.strategy,
            stats.avg_final_score(i),
            stats.final_score_std_dev(i),
            stats.avg_self_score(i)
        ));
    }

    output.push_str(&format!(
        "\nAverage Game Length: {:.1} steps ({} of {} games ended before the cap)\n",
        stats.avg_turns(),
        stats.games_terminated,
        stats.games_played
    ));
    output.push_str(&format!(
        "Average Environment Score: {:.2}\n",
        stats.avg_environment_score()
    ));

    output
}

/// Format batch stats as CSV.
pub(super) fn format_batch_csv(stats: &BatchStats, seats: &[Seat]) -> String {
    let mut output = String::new();

    output.push_str("agent,strategy,wins,win_rate,avg_final_score,final_score_std_dev,avg_self_score\n");

    for (i, seat) in seats.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{:.4},{:.2},{:.2},{:.2}\n",
            seat.name,
            seat.strategy,
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.avg_final_score(i),
            stats.final_score_std_dev(i),
            stats.avg_self_score(i)
        ));
    }

    output
}
