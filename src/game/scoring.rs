//! Environment and per-agent scoring.

use serde::{Deserialize, Serialize};

use crate::game::Grid;

/// Weights blending an agent's own score with the shared environment score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the agent's self score (default: 0.5).
    pub self_weight: f64,
    /// Weight of the environment score (default: 0.5).
    pub environment_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            self_weight: 0.5,
            environment_weight: 0.5,
        }
    }
}

impl ScoringWeights {
    /// Blend a self score with an environment score.
    #[must_use]
    pub fn blend(&self, self_score: i64, environment_score: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let self_score = self_score as f64;
        self.self_weight * self_score + self.environment_weight * environment_score
    }
}

/// Score components for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AgentScore {
    /// Running sum of the agent's step rewards.
    pub self_score: i64,
    /// Environment score at the last refresh (shared by all agents).
    pub environment_score: f64,
    /// Weighted blend of self and environment scores.
    pub integrated_score: f64,
    /// Terminal metric; same formula as the integrated score.
    pub final_score: f64,
}

impl AgentScore {
    /// Recompute the derived components from `self_score` and a fresh
    /// environment score.
    pub fn refresh(&mut self, environment_score: f64, weights: &ScoringWeights) {
        self.environment_score = environment_score;
        self.integrated_score = weights.blend(self.self_score, environment_score);
        self.final_score = self.integrated_score;
    }
}

/// Grand mean of every G, V and D value on the grid.
///
/// Equal to the mean of the three per-index averages. Pure and O(N²).
#[must_use]
pub fn environment_score(grid: &Grid) -> f64 {
    let cells = grid.cells();
    if cells.is_empty() {
        return 0.0;
    }

    let (g, v, d) = cells.iter().fold((0i128, 0i128, 0i128), |(g, v, d), cell| {
        (
            g + i128::from(cell.g),
            v + i128::from(cell.v),
            d + i128::from(cell.d),
        )
    });

    #[allow(clippy::cast_precision_loss)]
    let n = cells.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let (g_avg, v_avg, d_avg) = (g as f64 / n, v as f64 / n, d as f64 / n);

    (g_avg + v_avg + d_avg) / 3.0
}
