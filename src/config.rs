//! Game configuration: building tables and session parameters.
//!
//! The building catalog is immutable once a session is built. Sessions hold
//! the whole [`GameConfig`] behind an `Arc`, so any number of isolated
//! sessions can share one set of tables without copying.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{ScoringWeights, UtilityPolicy};

/// Kind of building an agent can place.
///
/// The declaration order is the order used by action encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Green space: raises G, lowers V.
    Park,
    /// Housing: raises D, lowers G.
    House,
    /// Commerce: raises V, lowers G and D.
    Shop,
}

impl BuildingType {
    /// All building types in action-encoding order.
    pub const ALL: [Self; 3] = [Self::Park, Self::House, Self::Shop];

    /// Number of building types.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this type in [`BuildingType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Park => 0,
            Self::House => 1,
            Self::Shop => 2,
        }
    }

    /// Look up a type by its encoding index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Park),
            1 => Some(Self::House),
            2 => Some(Self::Shop),
            _ => None,
        }
    }

    /// Single-letter tag used on the text board.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Park => 'P',
            Self::House => 'H',
            Self::Shop => 'S',
        }
    }
}

/// A pair of money and reputation amounts.
///
/// Used for agent holdings as well as for building costs and utilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Money amount.
    pub money: i64,
    /// Reputation amount.
    pub reputation: i64,
}

impl Resources {
    /// Create a new resource pair.
    #[must_use]
    pub const fn new(money: i64, reputation: i64) -> Self {
        Self { money, reputation }
    }

    /// Sum of both components.
    #[must_use]
    pub const fn total(self) -> i64 {
        self.money.saturating_add(self.reputation)
    }

    /// Whether these holdings cover `cost` in both components.
    #[must_use]
    pub const fn covers(self, cost: Self) -> bool {
        self.money >= cost.money && self.reputation >= cost.reputation
    }

    /// Add `other` component-wise.
    pub const fn credit(&mut self, other: Self) {
        self.money = self.money.saturating_add(other.money);
        self.reputation = self.reputation.saturating_add(other.reputation);
    }

    /// Subtract `other` component-wise.
    pub const fn debit(&mut self, other: Self) {
        self.money = self.money.saturating_sub(other.money);
        self.reputation = self.reputation.saturating_sub(other.reputation);
    }
}

/// Change applied to a cell's G/V/D indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDelta {
    /// Change to G.
    #[serde(rename = "G")]
    pub g: i64,
    /// Change to V.
    #[serde(rename = "V")]
    pub v: i64,
    /// Change to D.
    #[serde(rename = "D")]
    pub d: i64,
}

impl IndexDelta {
    /// Create a new delta.
    #[must_use]
    pub const fn new(g: i64, v: i64, d: i64) -> Self {
        Self { g, v, d }
    }
}

/// Environmental effect of a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Delta applied to the building's own cell.
    pub own: IndexDelta,
    /// Delta applied to each in-bounds orthogonal neighbor.
    pub neighbors: IndexDelta,
}

/// Static tables for one building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSpec {
    /// Paid once on placement.
    pub cost: Resources,
    /// Paid out by every standing building on every step.
    pub utility: Resources,
    /// Grid effect applied on placement.
    pub effect: Effect,
}

/// Building tables for every [`BuildingType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingCatalog {
    /// Park tables.
    pub park: BuildingSpec,
    /// House tables.
    pub house: BuildingSpec,
    /// Shop tables.
    pub shop: BuildingSpec,
}

impl BuildingCatalog {
    /// Tables for the given building type.
    #[must_use]
    pub const fn get(&self, kind: BuildingType) -> &BuildingSpec {
        match kind {
            BuildingType::Park => &self.park,
            BuildingType::House => &self.house,
            BuildingType::Shop => &self.shop,
        }
    }
}

impl Default for BuildingCatalog {
    fn default() -> Self {
        Self {
            park: BuildingSpec {
                cost: Resources::new(1, 3),
                utility: Resources::new(-1, 3),
                effect: Effect {
                    own: IndexDelta::new(30, -30, 0),
                    neighbors: IndexDelta::new(10, -10, 0),
                },
            },
            house: BuildingSpec {
                cost: Resources::new(2, 2),
                utility: Resources::new(2, 0),
                effect: Effect {
                    own: IndexDelta::new(-30, 0, 30),
                    neighbors: IndexDelta::new(-10, 10, 10),
                },
            },
            shop: BuildingSpec {
                cost: Resources::new(3, 1),
                utility: Resources::new(3, -1),
                effect: Effect {
                    own: IndexDelta::new(-30, 30, -30),
                    neighbors: IndexDelta::new(-10, 10, -10),
                },
            },
        }
    }
}

/// Largest accepted grid side length.
pub const MAX_GRID_SIZE: u16 = 256;

/// Complete configuration for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square grid.
    pub grid_size: u16,
    /// Resources every agent starts with.
    pub starting_resources: Resources,
    /// Initial value of G, V and D on every cell.
    pub baseline_index: i64,
    /// Reward for an occupied or unaffordable placement.
    pub placement_penalty: i64,
    /// Game ends once the environment score drops below this value.
    pub termination_threshold: f64,
    /// Weights for integrated and final scores.
    pub scoring: ScoringWeights,
    /// Who receives recurring building utility.
    pub utility_policy: UtilityPolicy,
    /// Building tables.
    pub buildings: BuildingCatalog,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            starting_resources: Resources::new(20, 20),
            baseline_index: 30,
            placement_penalty: -5,
            termination_threshold: 10.0,
            scoring: ScoringWeights::default(),
            utility_policy: UtilityPolicy::default(),
            buildings: BuildingCatalog::default(),
        }
    }
}

impl GameConfig {
    /// Number of cells on the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::from(self.grid_size) * usize::from(self.grid_size)
    }

    /// Check that the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns an error for a grid size outside `1..=MAX_GRID_SIZE` or
    /// non-finite weights/threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge(self.grid_size));
        }
        if !self.scoring.self_weight.is_finite() {
            return Err(ConfigError::NonFiniteWeight("self_weight"));
        }
        if !self.scoring.environment_weight.is_finite() {
            return Err(ConfigError::NonFiniteWeight("environment_weight"));
        }
        if !self.termination_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold);
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON text.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize this configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
