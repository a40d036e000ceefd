//! Game layer for civgrid.
//!
//! Implements the rules of the city-building game:
//! - Grid of G/V/D indices with one building per cell
//! - Action ids decoded into (building, cell) placements
//! - Costs, grid effects and recurring utility
//! - Environment and per-agent scoring
//! - Turn rotation and shared termination

mod action;
mod effects;
mod grid;
pub mod invariants;
mod scoring;
mod session;

pub use action::{Action, ActionCodec, Decoded};
pub use effects::{EffectEngine, PlacementOutcome, Resolution, UtilityPolicy};
pub use grid::{AgentIdx, Building, Cell, Coord, Grid, Occupancy, PlaceError};
pub use scoring::{environment_score, AgentScore, ScoringWeights};
pub use session::{
    GameSession, LastStep, Observation, SessionState, StepInfo, StepReport,
};
