// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! civgrid: a deterministic multi-agent city-building environment.
//!
//! Agents take turns placing Parks, Houses and Shops on a square grid.
//! Buildings cost money and reputation once, pay utility every turn, and
//! shift the G/V/D environmental indices of their cell and its orthogonal
//! neighbors. The game ends for everyone when the board is full or the
//! environment score collapses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Driver / batch runner (rayon)     │  strategies pick action ids
//! ├─────────────────────────────────────┤
//! │   GameSession (turn scheduler)      │  step(id) → reward, info
//! ├─────────────────────────────────────┤
//! │ ActionCodec · EffectEngine · Scores │
//! ├─────────────────────────────────────┤
//! │   Grid (cells, buildings, builders) │
//! └─────────────────────────────────────┘
//! ```
//!
//! The session is a pure function of its state and the submitted action id.
//! All randomness lives in [`strategy`] implementations.

pub mod config;
pub mod driver;
pub mod error;
pub mod game;
pub mod render;
pub mod strategy;

pub use config::{BuildingType, GameConfig, Resources};
pub use error::{ConfigError, SessionError};

// Re-export key game types at crate root for convenience
pub use game::{
    Action, ActionCodec, AgentIdx, AgentScore, Coord, GameSession, Grid, Observation,
    SessionState, StepReport, UtilityPolicy,
};
