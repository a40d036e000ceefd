//! Error types for sessions and configuration.

use std::fmt;
use std::io;

/// Errors reported by [`GameSession`](crate::game::GameSession) operations.
///
/// Illegal placements and unaffordable buildings are not errors: they are
/// resolved inside the step as a reward penalty. Only precondition
/// violations surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `step` was called on a session that was never reset.
    NotReset,
    /// An agent index outside the session's roster was requested.
    UnknownAgent(usize),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReset => write!(f, "session must be reset before calling step"),
            Self::UnknownAgent(idx) => write!(f, "unknown agent index {idx}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors produced while loading or validating a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Grid side length must be at least 1.
    ZeroGridSize,
    /// Grid side length exceeds [`MAX_GRID_SIZE`](crate::config::MAX_GRID_SIZE).
    GridTooLarge(u16),
    /// A session needs at least one agent.
    NoAgents,
    /// Two agents share the same name.
    DuplicateAgent(String),
    /// A scoring weight is NaN or infinite.
    NonFiniteWeight(&'static str),
    /// The termination threshold is NaN or infinite.
    NonFiniteThreshold,
    /// Reading the config file failed.
    Io(io::Error),
    /// The config file is not valid JSON for a `GameConfig`.
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGridSize => write!(f, "grid size must be at least 1"),
            Self::GridTooLarge(size) => write!(
                f,
                "grid size {size} exceeds the maximum of {}",
                crate::config::MAX_GRID_SIZE
            ),
            Self::NoAgents => write!(f, "at least one agent is required"),
            Self::DuplicateAgent(name) => write!(f, "duplicate agent name: {name}"),
            Self::NonFiniteWeight(which) => write!(f, "scoring weight `{which}` must be finite"),
            Self::NonFiniteThreshold => write!(f, "termination threshold must be finite"),
            Self::Io(e) => write!(f, "failed to read config: {e}"),
            Self::Json(e) => write!(f, "failed to parse config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
