//! Turn resolution: placement, grid effects and recurring utility.
//!
//! One step of resolution for the acting agent runs two phases:
//!
//! 1. **Placement.** An occupied target or a cost the agent cannot cover
//!    yields the configured penalty and changes nothing else. Otherwise the
//!    cost is paid once, the building is recorded, its own-cell effect and
//!    neighbor effect are applied, and its utility total is realized as
//!    reward.
//! 2. **Recurring pass.** Every standing building, including one placed in
//!    phase 1, pays its utility to the agent chosen by the [`UtilityPolicy`].
//!    Whatever the acting agent collects is added to its step reward.
//!
//! Resolution has no randomness: the same grid, wallet and action always
//! produce the same result.

use serde::{Deserialize, Serialize};

use crate::config::{BuildingCatalog, GameConfig, Resources};
use crate::game::{Action, AgentIdx, Building, Grid};

/// Who collects recurring building utility on a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityPolicy {
    /// Every standing building pays the agent whose turn it is.
    #[default]
    ActingAgent,
    /// Every standing building pays the agent that built it, on every step.
    Builder,
}

impl UtilityPolicy {
    /// Agent credited with `building`'s utility when `acting` holds the turn.
    #[must_use]
    pub const fn recipient(self, building: &Building, acting: AgentIdx) -> AgentIdx {
        match self {
            Self::ActingAgent => acting,
            Self::Builder => building.builder,
        }
    }
}

/// What happened to the placement part of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlacementOutcome {
    /// The building was placed and its effects applied.
    Placed,
    /// The target cell already held a building.
    Occupied,
    /// The agent could not cover the building's cost.
    Unaffordable,
}

impl PlacementOutcome {
    /// Whether the grid changed.
    #[must_use]
    pub const fn is_placed(self) -> bool {
        matches!(self, Self::Placed)
    }
}

/// Full result of resolving one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Placement result.
    pub outcome: PlacementOutcome,
    /// Penalty, or the placed building's utility total.
    pub placement_reward: i64,
    /// Reward from the recurring pass.
    pub recurring_reward: i64,
    /// Resources the recurring pass credited to the acting agent.
    pub income: Resources,
}

impl Resolution {
    /// Total reward for the step.
    #[must_use]
    pub const fn reward(&self) -> i64 {
        self.placement_reward.saturating_add(self.recurring_reward)
    }
}

/// Applies building costs, effects and utilities.
///
/// Borrows the immutable building tables from the session's configuration.
#[derive(Debug, Clone, Copy)]
pub struct EffectEngine<'a> {
    catalog: &'a BuildingCatalog,
    policy: UtilityPolicy,
    penalty: i64,
}

impl<'a> EffectEngine<'a> {
    /// Create an engine over the tables and policy in `config`.
    #[must_use]
    pub const fn new(config: &'a GameConfig) -> Self {
        Self {
            catalog: &config.buildings,
            policy: config.utility_policy,
            penalty: config.placement_penalty,
        }
    }

    /// Replace the recurring-utility policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: UtilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Placement phase.
    ///
    /// Returns the outcome and its reward contribution.
    pub fn place(
        &self,
        grid: &mut Grid,
        agent: AgentIdx,
        wallet: &mut Resources,
        action: Action,
        turn: u32,
    ) -> (PlacementOutcome, i64) {
        if !grid.is_empty(action.coord) {
            return (PlacementOutcome::Occupied, self.penalty);
        }

        let spec = self.catalog.get(action.kind);
        if !wallet.covers(spec.cost) {
            return (PlacementOutcome::Unaffordable, self.penalty);
        }

        if grid.place(action.coord, action.kind, agent, turn).is_err() {
            return (PlacementOutcome::Occupied, self.penalty);
        }
        wallet.debit(spec.cost);

        grid.apply_delta(action.coord, spec.effect.own);
        let (neighbors, count) = action.coord.adjacent(grid.size());
        for neighbor in &neighbors[..usize::from(count)] {
            grid.apply_delta(*neighbor, spec.effect.neighbors);
        }

        (PlacementOutcome::Placed, spec.utility.total())
    }

    /// Recurring pass.
    ///
    /// Credits every building's utility to the wallet of its recipient under
    /// the policy. `wallets` is indexed by agent. Returns what the acting
    /// agent collected and its reward contribution; income owed to an agent
    /// without a wallet is dropped.
    pub fn recurring(
        &self,
        grid: &Grid,
        agent: AgentIdx,
        wallets: &mut [Resources],
    ) -> (Resources, i64) {
        let mut income = Resources::default();
        let mut reward = 0i64;

        for (_, building) in grid.buildings() {
            let utility = self.catalog.get(building.kind).utility;
            let recipient = self.policy.recipient(building, agent);
            if let Some(wallet) = wallets.get_mut(recipient) {
                wallet.credit(utility);
            }
            if recipient == agent {
                income.credit(utility);
                reward = reward.saturating_add(utility.total());
            }
        }

        (income, reward)
    }

    /// Resolve one full step for `agent`.
    ///
    /// `wallets` holds every agent's resources, indexed by agent. An agent
    /// without a wallet cannot pay, so its placement is unaffordable.
    pub fn resolve(
        &self,
        grid: &mut Grid,
        agent: AgentIdx,
        wallets: &mut [Resources],
        action: Action,
        turn: u32,
    ) -> Resolution {
        let (outcome, placement_reward) = match wallets.get_mut(agent) {
            Some(wallet) => self.place(grid, agent, wallet, action, turn),
            None => (PlacementOutcome::Unaffordable, self.penalty),
        };
        let (income, recurring_reward) = self.recurring(grid, agent, wallets);

        Resolution {
            outcome,
            placement_reward,
            recurring_reward,
            income,
        }
    }
}
