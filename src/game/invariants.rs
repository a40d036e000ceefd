//! Session invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger for a session driven only through `reset` and
//! `step`. If they do, resolution or bookkeeping is broken.

use crate::game::{environment_score, GameSession};

/// Tolerance when comparing the cached environment score to a recompute.
const SCORE_EPSILON: f64 = 1e-9;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all session invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(session: &GameSession) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let grid = session.grid();
    let agent_count = session.agents().len();

    // Building bookkeeping
    let standing = grid.buildings().count();
    if standing != grid.building_count() {
        violations.push(InvariantViolation {
            message: format!(
                "Grid counts {} buildings but {} cells are occupied",
                grid.building_count(),
                standing
            ),
        });
    }

    // Every placement consumes a turn
    if u64::try_from(standing).unwrap_or(u64::MAX) > u64::from(session.turn()) {
        violations.push(InvariantViolation {
            message: format!(
                "{} buildings stand after only {} turns",
                standing,
                session.turn()
            ),
        });
    }

    for (coord, building) in grid.buildings() {
        if building.builder >= agent_count {
            violations.push(InvariantViolation {
                message: format!(
                    "Building at {coord:?} has builder {} outside roster of {agent_count}",
                    building.builder
                ),
            });
        }
        if building.built_turn >= session.turn() {
            violations.push(InvariantViolation {
                message: format!(
                    "Building at {coord:?} built on turn {} but session is at turn {}",
                    building.built_turn,
                    session.turn()
                ),
            });
        }
    }

    // Shared termination
    let terminations = session.terminations();
    if terminations.iter().any(|&t| t) && !terminations.iter().all(|&t| t) {
        violations.push(InvariantViolation {
            message: format!("Termination flags disagree: {terminations:?}"),
        });
    }

    // Cached environment score
    let fresh = environment_score(grid);
    if (fresh - session.environment_score()).abs() > SCORE_EPSILON {
        violations.push(InvariantViolation {
            message: format!(
                "Cached environment score {} differs from recomputed {fresh}",
                session.environment_score()
            ),
        });
    }

    // Termination predicate after at least one step
    if session.turn() > 0 && !session.is_terminated() {
        let threshold = session.config().termination_threshold;
        if grid.is_full() || fresh < threshold {
            violations.push(InvariantViolation {
                message: format!(
                    "Session active with full board ({}) or environment score {fresh} below {threshold}",
                    grid.is_full()
                ),
            });
        }
    }

    violations
}

/// Assert all session invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(session: &GameSession) {
    let violations = check_invariants(session);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Session invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_session: &GameSession) {}
