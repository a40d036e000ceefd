//! Integration tests for complete sessions and driven games.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::sync::Arc;

use civgrid::driver::{DriverOptions, Seat, run_batch, run_game};
use civgrid::game::invariants::check_invariants;
use civgrid::game::PlacementOutcome;
use civgrid::strategy::StrategyKind;
use civgrid::{
    BuildingType, ConfigError, Coord, GameConfig, GameSession, Resources, SessionError,
    SessionState, UtilityPolicy,
};

fn create_test_session(config: GameConfig, names: &[&str]) -> GameSession {
    let names = names.iter().map(|n| (*n).to_string()).collect();
    let mut session = GameSession::new(Arc::new(config), names).unwrap();
    session.reset();
    session
}

fn quiet() -> DriverOptions {
    DriverOptions {
        log_board: false,
        ..DriverOptions::default()
    }
}

#[test]
fn test_two_agent_opening() {
    let mut session = create_test_session(GameConfig::default(), &["P1", "P2"]);
    let codec = session.codec();

    // P1 builds a Park in the middle of the board
    let park = codec.encode(BuildingType::Park, Coord::new(1, 1)).unwrap();
    let report = session.step(park).unwrap();
    assert_eq!(report.reward, 4);
    assert_eq!(session.resources(0).unwrap(), Resources::new(18, 20));

    // P2 builds a House next to it; the Park also pays P2 under the default policy
    let house = codec.encode(BuildingType::House, Coord::new(1, 2)).unwrap();
    let report = session.step(house).unwrap();
    assert_eq!(report.info.outcome, Some(PlacementOutcome::Placed));
    // placement utility 2, recurring: Park 2 + House 2
    assert_eq!(report.reward, 6);
    // 20 - 2 + 2 - 1 = 19 money, 20 - 2 + 0 + 3 = 21 reputation
    assert_eq!(session.resources(1).unwrap(), Resources::new(19, 21));

    let park_cell = session.grid().get(Coord::new(1, 1)).unwrap();
    assert_eq!(park_cell.indices(), [50, 10, 40]);
    let house_cell = session.grid().get(Coord::new(1, 2)).unwrap();
    assert_eq!(house_cell.indices(), [10, 20, 60]);

    assert_eq!(session.agent_selection(), 0);
    assert_eq!(session.turn(), 2);
    assert!(check_invariants(&session).is_empty());
}

#[test]
fn test_environment_collapse_on_large_board() {
    let config = GameConfig {
        grid_size: 8,
        starting_resources: Resources::new(10_000, 10_000),
        ..GameConfig::default()
    };
    let mut session = create_test_session(config, &["A", "B"]);
    let codec = session.codec();

    let mut placed = 0;
    'outer: for x in 0..8 {
        for y in 0..8 {
            let id = codec.encode(BuildingType::Shop, Coord::new(x, y)).unwrap();
            session.step(id).unwrap();
            placed += 1;
            if session.is_terminated() {
                break 'outer;
            }
        }
    }

    assert_eq!(session.state(), SessionState::Terminated);
    assert!(!session.grid().is_full());
    assert!(placed < 64);
    assert!(session.environment_score() < 10.0);
    assert!(session.terminations().iter().all(|&t| t));

    // Further steps are null and change nothing
    let turn = session.turn();
    let report = session.step(0).unwrap();
    assert!(report.null_step);
    assert_eq!(session.turn(), turn);
}

#[test]
fn test_step_before_reset() {
    let names = vec!["P1".to_string()];
    let mut session = GameSession::new(Arc::new(GameConfig::default()), names).unwrap();
    assert_eq!(session.step(3), Err(SessionError::NotReset));
    assert!(!session.is_ready());

    session.reset();
    assert!(session.step(3).is_ok());
}

#[test]
fn test_sessions_share_config_in_isolation() {
    let config = Arc::new(GameConfig::default());
    let names = || vec!["P1".to_string(), "P2".to_string()];
    let mut a = GameSession::new(Arc::clone(&config), names()).unwrap();
    let mut b = GameSession::new(Arc::clone(&config), names()).unwrap();
    a.reset();
    b.reset();

    a.step(0).unwrap();
    assert_eq!(a.grid().building_count(), 1);
    assert_eq!(b.grid().building_count(), 0);
    assert_eq!(b.turn(), 0);
    assert_eq!(Arc::strong_count(&config), 3);
}

#[test]
fn test_builder_policy_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"grid_size": 3, "starting_resources": {{"money": 5, "reputation": 5}}, "utility_policy": "builder"}}"#
    )
    .unwrap();

    let config = GameConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.grid_size, 3);
    assert_eq!(config.utility_policy, UtilityPolicy::Builder);
    assert_eq!(config.placement_penalty, -5);

    let mut session = create_test_session(config, &["P1", "P2"]);
    let codec = session.codec();
    session
        .step(codec.encode(BuildingType::Shop, Coord::new(0, 0)).unwrap())
        .unwrap();
    // Cost (3, 1) then the Shop's own utility (3, -1)
    assert_eq!(session.resources(0).unwrap(), Resources::new(5, 3));

    // P2's penalty step earns nothing, but P1's Shop still pays P1
    let report = session
        .step(codec.encode(BuildingType::Park, Coord::new(0, 0)).unwrap())
        .unwrap();
    assert_eq!(report.info.outcome, Some(PlacementOutcome::Occupied));
    assert_eq!(report.reward, -5);
    assert_eq!(session.resources(1).unwrap(), Resources::new(5, 5));
    assert_eq!(session.resources(0).unwrap(), Resources::new(8, 2));
}

#[test]
fn test_invalid_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"grid_size": 0}}"#).unwrap();
    assert!(matches!(
        GameConfig::from_json_file(file.path()),
        Err(ConfigError::ZeroGridSize)
    ));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        GameConfig::from_json_file(&missing),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_driven_game_keeps_totals() {
    let seats = vec![
        Seat::new("Eco", StrategyKind::Economic),
        Seat::new("Rep", StrategyKind::Reputation),
        Seat::new("Bal", StrategyKind::Balanced),
        Seat::new("Rnd", StrategyKind::Random),
    ];
    let result = run_game(2024, &seats, Arc::new(GameConfig::default()), &quiet()).unwrap();

    assert_eq!(result.agents.len(), 4);
    assert_eq!(result.agents[3].name, "Rnd");
    let placed: u32 = result.agents.iter().map(|a| a.placements).sum();
    assert!(placed <= 16);
    assert_eq!(usize::try_from(placed).unwrap(), result.buildings);

    // Final score blends the same environment score for everyone
    for agent in &result.agents {
        let self_score = f64::from(i32::try_from(agent.self_score).unwrap());
        let expected = 0.5 * self_score + 0.5 * result.environment_score;
        assert!((agent.final_score - expected).abs() < 1e-9);
    }
}

#[test]
fn test_economic_fills_board() {
    // Economic agents only target empty cells, so a 3x3 board fills
    let seats = vec![
        Seat::new("P1", StrategyKind::Economic),
        Seat::new("P2", StrategyKind::Economic),
    ];
    let config = GameConfig {
        grid_size: 3,
        starting_resources: Resources::new(100, 100),
        ..GameConfig::default()
    };
    let result = run_game(9, &seats, Arc::new(config), &quiet()).unwrap();

    assert!(result.terminated);
    assert_eq!(result.buildings, 9);
    assert_eq!(result.turns_played, 9);
    assert!(result.agents.iter().all(|a| a.penalties == 0));
}

#[test]
fn test_batch_is_reproducible() {
    let seats = Seat::default_roster();
    let config = Arc::new(GameConfig::default());

    let first = run_batch(100, 16, &seats, &config, &quiet(), |_| {}).unwrap();
    let second = run_batch(100, 16, &seats, &config, &quiet(), |_| {}).unwrap();

    assert_eq!(first.games_played, 16);
    assert_eq!(first.wins, second.wins);
    assert_eq!(first.draws, second.draws);
    assert!((first.avg_environment_score() - second.avg_environment_score()).abs() < 1e-9);
    let wins: u64 = first.wins.iter().sum();
    assert_eq!(wins + first.draws, 16);
}
