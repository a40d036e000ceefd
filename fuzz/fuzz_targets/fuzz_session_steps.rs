#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use civgrid::game::invariants::check_invariants;
use civgrid::{GameConfig, GameSession, Resources, UtilityPolicy};
use libfuzzer_sys::fuzz_target;

/// Structured input for session fuzzing.
#[derive(Arbitrary, Debug)]
struct SessionInput {
    /// Grid side length (capped to keep runs short).
    grid_size: u8,
    /// Number of agents (capped).
    agents: u8,
    /// Starting money.
    money: i16,
    /// Starting reputation.
    reputation: i16,
    /// Termination threshold.
    threshold: i8,
    /// Pay recurring utility to builders only.
    builder_policy: bool,
    /// Whether to reset before stepping.
    reset: bool,
    /// Action ids submitted in order.
    actions: Vec<i64>,
}

fuzz_target!(|input: SessionInput| {
    let config = GameConfig {
        grid_size: u16::from(input.grid_size % 12),
        starting_resources: Resources::new(i64::from(input.money), i64::from(input.reputation)),
        termination_threshold: f64::from(input.threshold),
        utility_policy: if input.builder_policy {
            UtilityPolicy::Builder
        } else {
            UtilityPolicy::ActingAgent
        },
        ..GameConfig::default()
    };
    let agents = usize::from(input.agents % 9);
    let names = (0..agents).map(|i| format!("A{i}")).collect();

    // Zero grid size or an empty roster must be rejected, never panic
    let mut session = match GameSession::new(Arc::new(config), names) {
        Ok(s) => s,
        Err(_) => return,
    };

    if input.reset {
        session.reset();
    }

    for &id in input.actions.iter().take(500) {
        let expected = session.agent_selection();
        match session.step(id) {
            Ok(report) => assert_eq!(report.agent, expected),
            Err(_) => {
                assert!(!input.reset);
                assert_eq!(session.turn(), 0);
                return;
            }
        }

        let violations = check_invariants(&session);
        assert!(violations.is_empty(), "Invariant violations: {violations:?}");
    }
});
