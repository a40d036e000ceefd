//! Game session: turn rotation, step resolution and termination.
//!
//! A session is the only mutable game object. Each [`GameSession::step`]
//! runs to completion before returning:
//!
//! ```text
//! decode id ─▶ resolve (placement + recurring pass) ─▶ self score
//!          ─▶ environment score ─▶ turn += 1 ─▶ termination ─▶ next agent
//! ```
//!
//! Termination is shared: when the board fills or the environment score
//! drops below the configured threshold, every agent is terminated at once.
//! Steps after that are null steps that only rotate the cursor.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{GameConfig, Resources};
use crate::error::{ConfigError, SessionError};
use crate::game::invariants::assert_invariants;
use crate::game::{
    environment_score, Action, ActionCodec, AgentIdx, AgentScore, Cell, EffectEngine, Grid,
    PlacementOutcome,
};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Agents are still playing.
    Active,
    /// The termination predicate fired. Absorbing.
    Terminated,
}

/// Per-agent details about the agent's last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInfo {
    /// Action actually played (after any fallback).
    pub action: Option<Action>,
    /// True if the submitted id was out of range.
    pub fallback: bool,
    /// Placement result.
    pub outcome: Option<PlacementOutcome>,
    /// Resources credited by the recurring pass.
    pub income: Resources,
}

/// What a single call to [`GameSession::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Agent that held the turn.
    pub agent: AgentIdx,
    /// Reward for this step.
    pub reward: i64,
    /// Step details.
    pub info: StepInfo,
    /// True if the agent was already terminated and nothing was resolved.
    pub null_step: bool,
    /// Session state after the step.
    pub state: SessionState,
}

/// Read-only snapshot handed to strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// `[G, V, D]` per cell, indexed `[x][y]`.
    pub grid: Vec<Vec<[i64; 3]>>,
    /// The observing agent's resources.
    pub resources: Resources,
    /// Builder per cell, indexed `[x][y]`.
    pub builders: Vec<Vec<Option<AgentIdx>>>,
}

impl Observation {
    /// Side length of the observed grid.
    #[must_use]
    pub fn size(&self) -> usize {
        self.grid.len()
    }
}

/// Everything an external driver needs about the agent whose turn it is.
#[derive(Debug, Clone, PartialEq)]
pub struct LastStep {
    /// Agent holding the turn.
    pub agent: AgentIdx,
    /// That agent's observation.
    pub observation: Observation,
    /// Reward from that agent's previous step.
    pub reward: i64,
    /// Whether the agent is terminated.
    pub terminated: bool,
    /// Details of that agent's previous step.
    pub info: StepInfo,
}

/// A multi-agent city-building game.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Shared immutable configuration.
    config: Arc<GameConfig>,
    /// Agent names in turn order.
    agents: Vec<String>,
    /// Action codec for this grid size.
    codec: ActionCodec,
    /// The board.
    grid: Grid,
    /// Resources per agent.
    resources: Vec<Resources>,
    /// Scores per agent.
    scores: Vec<AgentScore>,
    /// Reward of each agent's last step.
    rewards: Vec<i64>,
    /// Info of each agent's last step.
    infos: Vec<StepInfo>,
    /// Termination flag per agent; all flip together.
    terminations: Vec<bool>,
    /// Environment score after the last step.
    environment_score: f64,
    /// Index of the agent whose turn it is.
    cursor: AgentIdx,
    /// Completed (non-null) steps since reset.
    turn: u32,
    /// Set by `reset`.
    ready: bool,
}

impl GameSession {
    /// Create a session for the given agents.
    ///
    /// The session must be [`reset`](Self::reset) before the first step.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no agents are
    /// given, or two agents share a name.
    pub fn new(config: Arc<GameConfig>, agents: Vec<String>) -> Result<Self, ConfigError> {
        config.validate()?;
        if agents.is_empty() {
            return Err(ConfigError::NoAgents);
        }
        let mut seen = HashSet::with_capacity(agents.len());
        for name in &agents {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateAgent(name.clone()));
            }
        }

        let grid =
            Grid::new(config.grid_size, config.baseline_index).ok_or(ConfigError::ZeroGridSize)?;
        let count = agents.len();
        let environment_score = environment_score(&grid);

        Ok(Self {
            codec: ActionCodec::new(config.grid_size),
            resources: vec![config.starting_resources; count],
            scores: vec![AgentScore::default(); count],
            rewards: vec![0; count],
            infos: vec![StepInfo::default(); count],
            terminations: vec![false; count],
            environment_score,
            cursor: 0,
            turn: 0,
            ready: false,
            grid,
            agents,
            config,
        })
    }

    /// Reinitialize all mutable state.
    ///
    /// Every cell returns to the baseline with no buildings, every agent gets
    /// fresh resources and zero scores, and the first agent holds the turn.
    pub fn reset(&mut self) {
        self.grid.reset(self.config.baseline_index);
        self.resources.fill(self.config.starting_resources);
        self.rewards.fill(0);
        self.infos.fill(StepInfo::default());
        self.terminations.fill(false);
        self.environment_score = environment_score(&self.grid);
        self.scores.fill(AgentScore::default());
        for score in &mut self.scores {
            score.refresh(self.environment_score, &self.config.scoring);
        }
        self.cursor = 0;
        self.turn = 0;
        self.ready = true;
    }

    /// Play action `action_id` for the agent whose turn it is.
    ///
    /// Out-of-range ids play the default action. Occupied or unaffordable
    /// placements earn the configured penalty. If the agent is already
    /// terminated, the call is a null step that only moves the turn on.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReset`] if the session was never reset.
    pub fn step(&mut self, action_id: i64) -> Result<StepReport, SessionError> {
        if !self.ready {
            return Err(SessionError::NotReset);
        }

        let agent = self.cursor;

        if self.terminations[agent] {
            self.rewards[agent] = 0;
            self.infos[agent] = StepInfo::default();
            self.advance_cursor();
            return Ok(StepReport {
                agent,
                reward: 0,
                info: StepInfo::default(),
                null_step: true,
                state: SessionState::Terminated,
            });
        }

        let decoded = self.codec.decode(action_id);
        if decoded.fallback {
            log::debug!(
                "{}: action id {action_id} out of range, playing {:?}",
                self.agents[agent],
                decoded.action
            );
        }

        let engine = EffectEngine::new(&self.config);
        let resolution = engine.resolve(
            &mut self.grid,
            agent,
            &mut self.resources,
            decoded.action,
            self.turn,
        );
        if !resolution.outcome.is_placed() {
            log::debug!(
                "{}: {:?} at ({}, {}) rejected as {:?}",
                self.agents[agent],
                decoded.action.kind,
                decoded.action.coord.x,
                decoded.action.coord.y,
                resolution.outcome
            );
        }

        let reward = resolution.reward();
        let info = StepInfo {
            action: Some(decoded.action),
            fallback: decoded.fallback,
            outcome: Some(resolution.outcome),
            income: resolution.income,
        };
        self.rewards[agent] = reward;
        self.infos[agent] = info;
        self.scores[agent].self_score = self.scores[agent].self_score.saturating_add(reward);

        self.environment_score = environment_score(&self.grid);
        for score in &mut self.scores {
            score.refresh(self.environment_score, &self.config.scoring);
        }

        self.turn = self.turn.saturating_add(1);
        if self.termination_predicate() {
            log::info!(
                "game over after {} turns (board full: {}, environment score {:.2})",
                self.turn,
                self.grid.is_full(),
                self.environment_score
            );
            self.terminations.fill(true);
        }

        self.advance_cursor();
        assert_invariants(self);

        Ok(StepReport {
            agent,
            reward,
            info,
            null_step: false,
            state: self.state(),
        })
    }

    fn termination_predicate(&self) -> bool {
        self.grid.is_full() || self.environment_score < self.config.termination_threshold
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.agents.len();
    }

    /// Agent whose turn it is.
    #[must_use]
    pub const fn agent_selection(&self) -> AgentIdx {
        self.cursor
    }

    /// Agent names in turn order.
    #[must_use]
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The board.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Action codec for this session's grid.
    #[must_use]
    pub const fn codec(&self) -> ActionCodec {
        self.codec
    }

    /// Number of completed steps since reset.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Whether `reset` has been called.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Environment score after the last step.
    #[must_use]
    pub const fn environment_score(&self) -> f64 {
        self.environment_score
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_terminated() {
            SessionState::Terminated
        } else {
            SessionState::Active
        }
    }

    /// Whether the game has ended for every agent.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminations.iter().all(|&t| t)
    }

    /// Termination flag per agent.
    #[must_use]
    pub fn terminations(&self) -> &[bool] {
        &self.terminations
    }

    /// Reward of each agent's last step.
    #[must_use]
    pub fn rewards(&self) -> &[i64] {
        &self.rewards
    }

    /// Info of each agent's last step.
    #[must_use]
    pub fn infos(&self) -> &[StepInfo] {
        &self.infos
    }

    /// Resources of one agent.
    ///
    /// # Errors
    ///
    /// Returns an error if `agent` is not in the roster.
    pub fn resources(&self, agent: AgentIdx) -> Result<Resources, SessionError> {
        self.resources
            .get(agent)
            .copied()
            .ok_or(SessionError::UnknownAgent(agent))
    }

    /// Scores of one agent.
    ///
    /// # Errors
    ///
    /// Returns an error if `agent` is not in the roster.
    pub fn score(&self, agent: AgentIdx) -> Result<AgentScore, SessionError> {
        self.scores
            .get(agent)
            .copied()
            .ok_or(SessionError::UnknownAgent(agent))
    }

    /// Scores of every agent in turn order.
    #[must_use]
    pub fn scores(&self) -> &[AgentScore] {
        &self.scores
    }

    /// Snapshot of the game from `agent`'s point of view.
    ///
    /// # Errors
    ///
    /// Returns an error if `agent` is not in the roster.
    pub fn observe(&self, agent: AgentIdx) -> Result<Observation, SessionError> {
        if agent >= self.agents.len() {
            return Err(SessionError::UnknownAgent(agent));
        }
        Ok(self.snapshot(agent))
    }

    fn snapshot(&self, agent: AgentIdx) -> Observation {
        let size = usize::from(self.grid.size());
        let rows = || self.grid.cells().chunks(size);

        Observation {
            grid: rows().map(|row| row.iter().map(Cell::indices).collect()).collect(),
            resources: self.resources[agent],
            builders: rows().map(|row| row.iter().map(Cell::builder).collect()).collect(),
        }
    }

    /// Observation, last reward, termination flag and info for the agent
    /// whose turn it is.
    #[must_use]
    pub fn last(&self) -> LastStep {
        let agent = self.cursor;
        LastStep {
            agent,
            observation: self.snapshot(agent),
            reward: self.rewards[agent],
            terminated: self.terminations[agent],
            info: self.infos[agent],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildingType;
    use crate::game::Coord;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{i}")).collect()
    }

    fn create_session(config: GameConfig, agents: usize) -> GameSession {
        let mut session = GameSession::new(Arc::new(config), names(agents)).unwrap();
        session.reset();
        session
    }

    fn id(session: &GameSession, kind: BuildingType, x: u16, y: u16) -> i64 {
        session.codec().encode(kind, Coord::new(x, y)).unwrap()
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut session = GameSession::new(Arc::new(GameConfig::default()), names(3)).unwrap();
        let grid_before = session.grid().clone();

        assert_eq!(session.step(0), Err(SessionError::NotReset));
        assert_eq!(session.grid(), &grid_before);
        assert_eq!(session.turn(), 0);
        assert_eq!(session.agent_selection(), 0);
    }

    #[test]
    fn test_new_rejects_bad_rosters() {
        let config = Arc::new(GameConfig::default());
        assert!(matches!(
            GameSession::new(Arc::clone(&config), Vec::new()),
            Err(ConfigError::NoAgents)
        ));
        assert!(matches!(
            GameSession::new(config, vec!["A".into(), "A".into()]),
            Err(ConfigError::DuplicateAgent(name)) if name == "A"
        ));
    }

    #[test]
    fn test_reset_state() {
        let session = create_session(GameConfig::default(), 3);
        assert_eq!(session.turn(), 0);
        assert_eq!(session.agent_selection(), 0);
        assert_eq!(session.state(), SessionState::Active);
        assert!((session.environment_score() - 30.0).abs() < 1e-9);
        assert_eq!(session.resources(2).unwrap(), Resources::new(20, 20));
        assert!((session.score(0).unwrap().final_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_park_scenario() {
        let mut session = create_session(GameConfig::default(), 3);
        let action = id(&session, BuildingType::Park, 1, 1);

        let report = session.step(action).unwrap();
        assert_eq!(report.agent, 0);
        assert_eq!(report.reward, 4);
        assert_eq!(report.info.outcome, Some(PlacementOutcome::Placed));
        assert!(!report.null_step);

        // Cost (1, 3) then recurring utility (-1, 3)
        assert_eq!(session.resources(0).unwrap(), Resources::new(18, 20));
        assert_eq!(session.score(0).unwrap().self_score, 4);
        assert_eq!(session.grid().get(Coord::new(1, 1)).unwrap().indices(), [60, 0, 30]);
        assert_eq!(session.grid().get(Coord::new(0, 1)).unwrap().indices(), [40, 20, 30]);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.agent_selection(), 1);

        // Park adds +30 -30 +0 own and 4 × (10 - 10 + 0) to neighbors: sum unchanged
        assert!((session.environment_score() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_robin_wraps() {
        let mut session = create_session(GameConfig::default(), 3);
        let mut order = Vec::new();
        for i in 0..7 {
            order.push(session.agent_selection());
            session.step(id(&session, BuildingType::Park, 3, 3) + i % 2).unwrap();
        }
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_invalid_id_plays_default() {
        let mut session = create_session(GameConfig::default(), 2);
        let report = session.step(-1).unwrap();
        assert!(report.info.fallback);
        assert_eq!(report.info.action, Some(Action::DEFAULT));
        assert!(session.grid().get(Coord::new(0, 0)).unwrap().is_occupied());
    }

    #[test]
    fn test_occupied_penalty_only_touches_reward() {
        let mut session = create_session(GameConfig::default(), 2);
        let action = id(&session, BuildingType::House, 2, 2);
        session.step(action).unwrap();

        let grid_before = session.grid().clone();
        let resources_before = session.resources(1).unwrap();
        let report = session.step(action).unwrap();

        assert_eq!(report.info.outcome, Some(PlacementOutcome::Occupied));
        // Penalty -5 plus House utility +2 from the recurring pass
        assert_eq!(report.reward, -3);
        assert_eq!(session.grid(), &grid_before);
        assert_eq!(session.grid().building_count(), 1);
        assert_eq!(
            session.resources(1).unwrap(),
            Resources::new(resources_before.money + 2, resources_before.reputation)
        );
    }

    #[test]
    fn test_board_full_terminates() {
        let config = GameConfig {
            grid_size: 2,
            termination_threshold: f64::MIN,
            ..GameConfig::default()
        };
        let mut session = create_session(config, 2);

        for (x, y) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(session.state(), SessionState::Active);
            let action = id(&session, BuildingType::House, x, y);
            let report = session.step(action).unwrap();
            assert_eq!(report.info.outcome, Some(PlacementOutcome::Placed));
        }

        assert!(session.grid().is_full());
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.terminations().iter().all(|&t| t));
    }

    #[test]
    fn test_low_environment_terminates() {
        let config = GameConfig {
            starting_resources: Resources::new(1000, 1000),
            termination_threshold: 20.0,
            ..GameConfig::default()
        };
        let mut session = create_session(config, 1);

        // Shops lower the grid sum by 50/60/70 (corner/edge/interior).
        // Row-major, the first 8 drop it by 480 to a mean of exactly 20.
        for n in 0..16u16 {
            if session.is_terminated() {
                break;
            }
            session.step(id(&session, BuildingType::Shop, n / 4, n % 4)).unwrap();
        }

        assert!(session.is_terminated());
        assert!(!session.grid().is_full());
        assert_eq!(session.grid().building_count(), 9);
        assert!(session.environment_score() < 20.0);
    }

    #[test]
    fn test_terminated_steps_are_null() {
        let config = GameConfig {
            grid_size: 1,
            ..GameConfig::default()
        };
        let mut session = create_session(config, 3);
        session.step(0).unwrap();
        assert!(session.is_terminated());

        let grid_before = session.grid().clone();
        let scores_before = session.scores().to_vec();
        let turn_before = session.turn();

        for expected in [1, 2, 0, 1] {
            assert_eq!(session.agent_selection(), expected);
            let report = session.step(5).unwrap();
            assert!(report.null_step);
            assert_eq!(report.agent, expected);
            assert_eq!(report.reward, 0);
            assert_eq!(session.rewards()[expected], 0);
            assert_eq!(session.infos()[expected], StepInfo::default());
        }

        assert_eq!(session.grid(), &grid_before);
        assert_eq!(session.scores(), scores_before.as_slice());
        assert_eq!(session.turn(), turn_before);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut session = create_session(GameConfig::default(), 2);
        session.step(id(&session, BuildingType::Shop, 1, 1)).unwrap();
        session.step(id(&session, BuildingType::Park, 2, 2)).unwrap();

        session.reset();
        assert_eq!(session.turn(), 0);
        assert_eq!(session.grid().building_count(), 0);
        assert_eq!(session.agent_selection(), 0);
        assert_eq!(session.score(1).unwrap().self_score, 0);
        assert_eq!(session.resources(0).unwrap(), Resources::new(20, 20));
    }

    #[test]
    fn test_observation_contents() {
        let mut session = create_session(GameConfig::default(), 2);
        session.step(id(&session, BuildingType::Park, 0, 3)).unwrap();

        let obs = session.observe(0).unwrap();
        assert_eq!(obs.size(), 4);
        assert_eq!(obs.grid[0][3], [60, 0, 30]);
        assert_eq!(obs.builders[0][3], Some(0));
        assert_eq!(obs.builders[1][1], None);
        assert_eq!(obs.resources, Resources::new(18, 20));

        assert_eq!(session.observe(9), Err(SessionError::UnknownAgent(9)));
    }

    #[test]
    fn test_last_reports_cursor_agent() {
        let mut session = create_session(GameConfig::default(), 2);
        session.step(id(&session, BuildingType::Park, 1, 1)).unwrap();
        session.step(id(&session, BuildingType::Park, 1, 1)).unwrap();

        // Back to agent 0, whose last step earned 4
        let last = session.last();
        assert_eq!(last.agent, 0);
        assert_eq!(last.reward, 4);
        assert!(!last.terminated);
        assert_eq!(last.info.outcome, Some(PlacementOutcome::Placed));
    }

    #[test]
    fn test_builder_policy_session() {
        let config = GameConfig {
            utility_policy: crate::game::UtilityPolicy::Builder,
            ..GameConfig::default()
        };
        let mut session = create_session(config, 2);
        let report = session.step(id(&session, BuildingType::House, 0, 0)).unwrap();
        assert_eq!(report.reward, 4);
        assert_eq!(session.resources(0).unwrap(), Resources::new(20, 18));

        // Agent 0's House keeps paying agent 0 while agent 1 acts
        let report = session.step(id(&session, BuildingType::Park, 3, 3)).unwrap();
        assert_eq!(report.info.outcome, Some(PlacementOutcome::Placed));
        assert_eq!(report.reward, 4);
        assert_eq!(report.info.income, Resources::new(-1, 3));
        assert_eq!(session.resources(0).unwrap(), Resources::new(22, 18));
        assert_eq!(session.resources(1).unwrap(), Resources::new(18, 20));

        // Agent 0's penalized step still pays agent 1 for its Park, and
        // agent 0's reward only counts its own House
        let report = session.step(id(&session, BuildingType::Shop, 3, 3)).unwrap();
        assert_eq!(report.info.outcome, Some(PlacementOutcome::Occupied));
        assert_eq!(report.reward, -3);
        assert_eq!(session.resources(0).unwrap(), Resources::new(24, 18));
        assert_eq!(session.resources(1).unwrap(), Resources::new(17, 23));
    }

    #[test]
    fn test_unaffordable_step_bookkeeping() {
        let config = GameConfig {
            starting_resources: Resources::new(0, 0),
            ..GameConfig::default()
        };
        let mut session = create_session(config, 2);
        let grid_before = session.grid().clone();

        let report = session.step(id(&session, BuildingType::Shop, 1, 1)).unwrap();
        assert_eq!(report.agent, 0);
        assert_eq!(report.info.outcome, Some(PlacementOutcome::Unaffordable));
        assert_eq!(report.reward, -5);
        assert_eq!(report.info.income, Resources::default());
        assert!(!report.null_step);

        assert_eq!(session.grid(), &grid_before);
        assert_eq!(session.grid().building_count(), 0);
        assert_eq!(session.resources(0).unwrap(), Resources::new(0, 0));
        assert_eq!(session.score(0).unwrap().self_score, -5);
        assert_eq!(session.score(1).unwrap().self_score, 0);
        assert_eq!(session.rewards(), &[-5, 0]);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.agent_selection(), 1);
        assert_eq!(session.state(), SessionState::Active);
        assert!(crate::game::invariants::check_invariants(&session).is_empty());
    }
}
