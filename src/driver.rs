//! Game driver and batch runner.
//!
//! Provides a pure function interface: `(seed, seats, config, options) -> GameResult`
//!
//! The driver handles:
//! - Strategy instantiation with per-seat seeds
//! - The observe → select → step loop with a turn cap
//! - Board and score logging through the `log` facade
//! - Parallel batches of independent sessions with rayon

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{GameConfig, Resources};
use crate::error::{ConfigError, SessionError};
use crate::game::{Action, AgentIdx, GameSession, Grid, PlacementOutcome};
use crate::render::{render_board, render_player_stats, render_turn_header};
use crate::strategy::{Strategy, StrategyKind};

/// Fewest seats a driven game accepts.
pub const MIN_AGENTS: usize = 2;

/// Most seats a driven game accepts.
pub const MAX_AGENTS: usize = 8;

/// Action id played when a strategy has no move.
const IDLE_ACTION: i64 = 0;

/// Spreads per-seat strategy seeds apart.
const SEAT_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// One agent in a driven game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    /// Agent name, unique within the roster.
    pub name: String,
    /// Strategy controlling this agent.
    pub strategy: StrategyKind,
}

impl Seat {
    /// Create a seat.
    #[must_use]
    pub fn new(name: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }

    /// The three-seat roster used when none is given: P1 economic,
    /// P2 reputation, P3 balanced.
    #[must_use]
    pub fn default_roster() -> Vec<Self> {
        vec![
            Self::new("P1", StrategyKind::Economic),
            Self::new("P2", StrategyKind::Reputation),
            Self::new("P3", StrategyKind::Balanced),
        ]
    }
}

/// Options for the game loop.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Step cap; the game is cut short after this many steps.
    pub max_turns: u32,
    /// Log the board and player statistics after every step.
    pub log_board: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_turns: 50,
            log_board: true,
        }
    }
}

/// Per-agent outcome of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    /// Agent name.
    pub name: String,
    /// Strategy that played.
    pub strategy: StrategyKind,
    /// Sum of step rewards.
    pub self_score: i64,
    /// Final blended score.
    pub final_score: f64,
    /// Holdings at game end.
    pub resources: Resources,
    /// Successful placements.
    pub placements: u32,
    /// Rejected placements (occupied or unaffordable).
    pub penalties: u32,
    /// Action ids that fell back to the default action.
    pub fallbacks: u32,
}

/// Final result of a driven game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    /// The seed used for this game.
    pub seed: u64,
    /// Steps played.
    pub turns_played: u32,
    /// Whether the game ended by its own rules rather than the turn cap.
    pub terminated: bool,
    /// Environment score at game end.
    pub environment_score: f64,
    /// Buildings standing at game end.
    pub buildings: usize,
    /// The board at game end.
    pub grid: Grid,
    /// Agent with the strictly highest final score, if any.
    pub winner: Option<AgentIdx>,
    /// Per-agent results in seat order.
    pub agents: Vec<AgentResult>,
}

/// Error type for driver operations.
#[derive(Debug)]
pub enum DriverError {
    /// Not enough seats.
    TooFewAgents(usize),
    /// Too many seats.
    TooManyAgents(usize),
    /// The configuration or roster was rejected.
    Config(ConfigError),
    /// The session refused a call.
    Session(SessionError),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewAgents(n) => write!(f, "Too few agents: {n} (minimum {MIN_AGENTS})"),
            Self::TooManyAgents(n) => write!(f, "Too many agents: {n} (maximum {MAX_AGENTS})"),
            Self::Config(e) => write!(f, "Invalid configuration: {e}"),
            Self::Session(e) => write!(f, "Session error: {e}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::TooFewAgents(_) | Self::TooManyAgents(_) => None,
        }
    }
}

impl From<ConfigError> for DriverError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SessionError> for DriverError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

/// Check the roster size against [`MIN_AGENTS`] and [`MAX_AGENTS`].
///
/// # Errors
///
/// Returns an error if the roster is too small or too large.
pub fn check_roster(seats: &[Seat]) -> Result<(), DriverError> {
    if seats.len() < MIN_AGENTS {
        return Err(DriverError::TooFewAgents(seats.len()));
    }
    if seats.len() > MAX_AGENTS {
        return Err(DriverError::TooManyAgents(seats.len()));
    }
    Ok(())
}

/// Run a complete game with the given seed and seats.
///
/// This is the main entry point - a pure function from inputs to result.
///
/// # Determinism
///
/// Given the same seed, seats, config and options, this function always
/// produces the same `GameResult`.
///
/// # Errors
///
/// Returns an error if:
/// - Number of seats is outside the valid range
/// - The config fails validation or seat names repeat
pub fn run_game(
    seed: u64,
    seats: &[Seat],
    config: Arc<GameConfig>,
    options: &DriverOptions,
) -> Result<GameResult, DriverError> {
    let runner = GameRunner::new(seed, seats, config, *options)?;
    runner.run()
}

/// Per-seat bookkeeping that lives outside the session.
#[derive(Debug)]
struct SeatState {
    strategy: Box<dyn Strategy>,
    kind: StrategyKind,
    placements: u32,
    penalties: u32,
    fallbacks: u32,
}

/// Drives one session to completion.
#[derive(Debug)]
struct GameRunner {
    session: GameSession,
    seats: Vec<SeatState>,
    options: DriverOptions,
    seed: u64,
}

impl GameRunner {
    fn new(
        seed: u64,
        seats: &[Seat],
        config: Arc<GameConfig>,
        options: DriverOptions,
    ) -> Result<Self, DriverError> {
        check_roster(seats)?;

        let catalog = config.buildings;
        let names = seats.iter().map(|seat| seat.name.clone()).collect();
        let session = GameSession::new(config, names)?;

        let seats = seats
            .iter()
            .zip(0u64..)
            .map(|(seat, i)| SeatState {
                strategy: seat.strategy.build(catalog, seed ^ i.wrapping_mul(SEAT_SEED_MIX)),
                kind: seat.strategy,
                placements: 0,
                penalties: 0,
                fallbacks: 0,
            })
            .collect();

        Ok(Self {
            session,
            seats,
            options,
            seed,
        })
    }

    fn run(mut self) -> Result<GameResult, DriverError> {
        self.session.reset();
        self.log_state(0, "None");

        let mut moves = 0;
        while !self.session.is_terminated() && moves < self.options.max_turns {
            self.play_step()?;
            moves += 1;

            let next = self.session.agent_selection();
            let name = self.session.agents()[next].clone();
            self.log_state(moves, &name);
        }

        if self.session.is_terminated() {
            log::info!("Game over after {moves} steps");
        } else {
            log::info!("Game forcefully ended after {moves} steps");
        }

        Ok(self.build_result(moves))
    }

    fn play_step(&mut self) -> Result<(), DriverError> {
        let agent = self.session.agent_selection();
        let observation = self.session.observe(agent)?;
        let seat = &mut self.seats[agent];
        let action = seat
            .strategy
            .select_action(&observation)
            .unwrap_or(IDLE_ACTION);

        let report = self.session.step(action)?;

        if report.info.fallback {
            seat.fallbacks += 1;
        }
        match report.info.outcome {
            Some(PlacementOutcome::Placed) => seat.placements += 1,
            Some(PlacementOutcome::Occupied | PlacementOutcome::Unaffordable) => {
                seat.penalties += 1;
            }
            None => {}
        }
        if let Some(Action { kind, coord }) = report.info.action {
            log::debug!(
                "{} ({}) played {kind:?} at ({}, {}) for reward {}",
                self.session.agents()[agent],
                seat.kind,
                coord.x,
                coord.y,
                report.reward
            );
        }
        Ok(())
    }

    fn log_state(&self, turn: u32, agent: &str) {
        if !self.options.log_board || !log::log_enabled!(log::Level::Info) {
            return;
        }
        log::info!("{}", render_turn_header(turn, agent));
        log::info!("{}", render_board(self.session.grid(), self.session.agents()));
        log::info!(
            "{}",
            render_player_stats(self.session.agents(), self.session.scores())
        );
    }

    fn build_result(self, turns_played: u32) -> GameResult {
        let session = &self.session;
        let agents: Vec<AgentResult> = self
            .seats
            .iter()
            .enumerate()
            .map(|(i, seat)| {
                let score = session.scores()[i];
                AgentResult {
                    name: session.agents()[i].clone(),
                    strategy: seat.kind,
                    self_score: score.self_score,
                    final_score: score.final_score,
                    resources: session.resources(i).unwrap_or_default(),
                    placements: seat.placements,
                    penalties: seat.penalties,
                    fallbacks: seat.fallbacks,
                }
            })
            .collect();

        GameResult {
            seed: self.seed,
            turns_played,
            terminated: session.is_terminated(),
            environment_score: session.environment_score(),
            buildings: session.grid().building_count(),
            grid: session.grid().clone(),
            winner: strict_winner(&agents),
            agents,
        }
    }
}

/// Index of the unique highest final score.
fn strict_winner(agents: &[AgentResult]) -> Option<AgentIdx> {
    let best = agents
        .iter()
        .map(|a| a.final_score)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut leaders = agents
        .iter()
        .enumerate()
        .filter(|(_, a)| (a.final_score - best).abs() < f64::EPSILON);
    match (leaders.next(), leaders.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

/// Aggregated statistics over many games.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Total games played.
    pub games_played: u64,
    /// Games that ended by their own rules rather than the turn cap.
    pub games_terminated: u64,
    /// Win count per seat.
    pub wins: Vec<u64>,
    /// Games without a unique winner.
    pub draws: u64,
    total_final: Vec<f64>,
    final_sq_sums: Vec<f64>,
    total_self: Vec<i128>,
    total_environment: f64,
    total_turns: u64,
}

impl BatchStats {
    /// Create empty stats for `seats` seats.
    #[must_use]
    pub fn new(seats: usize) -> Self {
        Self {
            wins: vec![0; seats],
            total_final: vec![0.0; seats],
            final_sq_sums: vec![0.0; seats],
            total_self: vec![0; seats],
            ..Self::default()
        }
    }

    /// Add a game result to the stats.
    pub fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);
        self.total_environment += result.environment_score;
        if result.terminated {
            self.games_terminated += 1;
        }

        match result.winner.and_then(|w| self.wins.get_mut(w)) {
            Some(wins) => *wins += 1,
            None => self.draws += 1,
        }

        for (i, agent) in result.agents.iter().enumerate() {
            if i < self.total_final.len() {
                self.total_final[i] += agent.final_score;
                self.final_sq_sums[i] += agent.final_score * agent.final_score;
                self.total_self[i] += i128::from(agent.self_score);
            }
        }
    }

    /// Merge another set of stats into this one.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.games_terminated += other.games_terminated;
        self.draws += other.draws;
        self.total_environment += other.total_environment;
        self.total_turns += other.total_turns;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.total_final.iter_mut().zip(&other.total_final) {
            *a += b;
        }
        for (a, b) in self.final_sq_sums.iter_mut().zip(&other.final_sq_sums) {
            *a += b;
        }
        for (a, b) in self.total_self.iter_mut().zip(&other.total_self) {
            *a += b;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn per_game(&self, total: f64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total / self.games_played as f64
    }

    /// Win rate for a seat (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, seat: usize) -> f64 {
        self.per_game(self.wins.get(seat).copied().unwrap_or(0) as f64)
    }

    /// Mean final score for a seat.
    #[must_use]
    pub fn avg_final_score(&self, seat: usize) -> f64 {
        self.per_game(self.total_final.get(seat).copied().unwrap_or(0.0))
    }

    /// Mean self score for a seat.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_self_score(&self, seat: usize) -> f64 {
        self.per_game(self.total_self.get(seat).copied().unwrap_or(0) as f64)
    }

    /// Final score standard deviation for a seat.
    #[must_use]
    pub fn final_score_std_dev(&self, seat: usize) -> f64 {
        let mean = self.avg_final_score(seat);
        let sq_mean = self.per_game(self.final_sq_sums.get(seat).copied().unwrap_or(0.0));
        let variance = sq_mean - mean * mean;
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }

    /// Mean environment score at game end.
    #[must_use]
    pub fn avg_environment_score(&self) -> f64 {
        self.per_game(self.total_environment)
    }

    /// Mean game length in steps.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_turns(&self) -> f64 {
        self.per_game(self.total_turns as f64)
    }
}

/// Run `games` independent games in parallel, seeded `base_seed`,
/// `base_seed + 1`, and so on.
///
/// `on_game` is called once per finished game, from worker threads.
///
/// # Errors
///
/// Returns an error if the roster or config is invalid. Both are checked
/// once before any game starts.
pub fn run_batch<F>(
    base_seed: u64,
    games: u64,
    seats: &[Seat],
    config: &Arc<GameConfig>,
    options: &DriverOptions,
    on_game: F,
) -> Result<BatchStats, DriverError>
where
    F: Fn(&GameResult) + Sync,
{
    check_roster(seats)?;
    let names = seats.iter().map(|seat| seat.name.clone()).collect();
    GameSession::new(Arc::clone(config), names)?;

    let options = DriverOptions {
        log_board: false,
        ..*options
    };
    let num_seats = seats.len();

    // Each worker accumulates its own stats; merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || BatchStats::new(num_seats),
            |mut local, i| {
                let seed = base_seed.wrapping_add(i);
                match run_game(seed, seats, Arc::clone(config), &options) {
                    Ok(result) => {
                        on_game(&result);
                        local.add_result(&result);
                    }
                    Err(e) => log::warn!("game with seed {seed} failed: {e}"),
                }
                local
            },
        )
        .reduce(
            || BatchStats::new(num_seats),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> DriverOptions {
        DriverOptions {
            log_board: false,
            ..DriverOptions::default()
        }
    }

    fn default_config() -> Arc<GameConfig> {
        Arc::new(GameConfig::default())
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::TooFewAgents(1);
        assert!(format!("{err}").contains("Too few agents"));

        let err = DriverError::TooManyAgents(9);
        assert!(format!("{err}").contains("Too many agents"));
    }

    #[test]
    fn test_driver_options_default() {
        let options = DriverOptions::default();
        assert_eq!(options.max_turns, 50);
        assert!(options.log_board);
    }

    #[test]
    fn test_run_game_too_few_agents() {
        let seats = vec![Seat::new("solo", StrategyKind::Economic)];
        let result = run_game(42, &seats, default_config(), &quiet());
        assert!(matches!(result, Err(DriverError::TooFewAgents(1))));
    }

    #[test]
    fn test_run_game_too_many_agents() {
        let seats: Vec<_> = (0..9)
            .map(|i| Seat::new(format!("P{i}"), StrategyKind::Random))
            .collect();
        let result = run_game(42, &seats, default_config(), &quiet());
        assert!(matches!(result, Err(DriverError::TooManyAgents(9))));
    }

    #[test]
    fn test_run_game_duplicate_names() {
        let seats = vec![
            Seat::new("P1", StrategyKind::Economic),
            Seat::new("P1", StrategyKind::Balanced),
        ];
        let result = run_game(42, &seats, default_config(), &quiet());
        assert!(matches!(
            result,
            Err(DriverError::Config(ConfigError::DuplicateAgent(_)))
        ));
    }

    #[test]
    fn test_default_roster_game() {
        let result = run_game(7, &Seat::default_roster(), default_config(), &quiet()).unwrap();

        assert_eq!(result.seed, 7);
        assert_eq!(result.agents.len(), 3);
        assert!(result.turns_played <= 50);
        assert!(result.turns_played > 0);
        // A 4x4 board fills in at most 16 successful placements
        let placed: u32 = result.agents.iter().map(|a| a.placements).sum();
        assert_eq!(usize::try_from(placed).unwrap(), result.buildings);
        if result.terminated {
            assert!(result.buildings == 16 || result.environment_score < 10.0);
        } else {
            assert_eq!(result.turns_played, 50);
        }
    }

    #[test]
    fn test_run_game_deterministic() {
        let a = run_game(123, &Seat::default_roster(), default_config(), &quiet()).unwrap();
        let b = run_game(123, &Seat::default_roster(), default_config(), &quiet()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_turn_cap() {
        let options = DriverOptions {
            max_turns: 3,
            log_board: false,
        };
        let result = run_game(1, &Seat::default_roster(), default_config(), &options).unwrap();
        assert_eq!(result.turns_played, 3);
        assert!(!result.terminated);
    }

    #[test]
    fn test_steps_accounted() {
        let result = run_game(5, &Seat::default_roster(), default_config(), &quiet()).unwrap();
        let accounted: u32 = result
            .agents
            .iter()
            .map(|a| a.placements + a.penalties)
            .sum();
        assert_eq!(accounted, result.turns_played);
    }

    #[test]
    fn test_strict_winner() {
        let agent = |score| AgentResult {
            name: String::new(),
            strategy: StrategyKind::Random,
            self_score: 0,
            final_score: score,
            resources: Resources::default(),
            placements: 0,
            penalties: 0,
            fallbacks: 0,
        };
        assert_eq!(strict_winner(&[agent(1.0), agent(3.0), agent(2.0)]), Some(1));
        assert_eq!(strict_winner(&[agent(3.0), agent(3.0)]), None);
        assert_eq!(strict_winner(&[]), None);
    }

    #[test]
    fn test_batch_stats_merge() {
        let seats = Seat::default_roster();
        let config = default_config();
        let mut sequential = BatchStats::new(3);
        for seed in 0..4 {
            let result = run_game(seed, &seats, Arc::clone(&config), &quiet()).unwrap();
            sequential.add_result(&result);
        }

        let parallel = run_batch(0, 4, &seats, &config, &quiet(), |_| {}).unwrap();

        assert_eq!(parallel.games_played, 4);
        assert_eq!(parallel.wins, sequential.wins);
        assert_eq!(parallel.draws, sequential.draws);
        assert!((parallel.avg_turns() - sequential.avg_turns()).abs() < 1e-9);
        for seat in 0..3 {
            assert!(
                (parallel.avg_final_score(seat) - sequential.avg_final_score(seat)).abs() < 1e-9
            );
        }
    }

    #[test]
    fn test_batch_rejects_bad_roster() {
        let seats = vec![Seat::new("solo", StrategyKind::Random)];
        let result = run_batch(0, 10, &seats, &default_config(), &quiet(), |_| {});
        assert!(matches!(result, Err(DriverError::TooFewAgents(1))));
    }

    #[test]
    fn test_empty_stats() {
        let stats = BatchStats::new(2);
        assert!(stats.win_rate(0).abs() < f64::EPSILON);
        assert!(stats.avg_final_score(1).abs() < f64::EPSILON);
        assert!(stats.final_score_std_dev(0).abs() < f64::EPSILON);
        assert!(stats.avg_turns().abs() < f64::EPSILON);
    }
}
