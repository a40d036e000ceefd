//! Agent strategies.
//!
//! A strategy turns an [`Observation`] into an action id. The session never
//! calls strategies itself; drivers do. Built-in strategies draw from a
//! seeded [`SmallRng`], so a driver run is reproducible from its seed.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::config::{BuildingCatalog, BuildingType, Resources};
use crate::game::{ActionCodec, Coord, Observation};

/// A decision function for one agent.
pub trait Strategy: fmt::Debug + Send {
    /// Short label for reports.
    fn label(&self) -> &'static str;

    /// Pick an action id.
    ///
    /// `None` means the strategy sees no useful move; drivers map it to the
    /// default action.
    fn select_action(&mut self, observation: &Observation) -> Option<i64>;
}

/// Built-in strategy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Builds the affordable type with the best money utility on an empty cell.
    Economic,
    /// Builds the affordable type with the best reputation utility on an empty cell.
    Reputation,
    /// Picks uniformly among every action whose cost it can cover.
    Balanced,
    /// Picks any action id uniformly.
    Random,
}

impl StrategyKind {
    /// All built-in kinds.
    pub const ALL: [Self; 4] = [Self::Economic, Self::Reputation, Self::Balanced, Self::Random];

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Economic => "economic",
            Self::Reputation => "reputation",
            Self::Balanced => "balanced",
            Self::Random => "random",
        }
    }

    /// Instantiate this strategy.
    #[must_use]
    pub fn build(self, catalog: BuildingCatalog, seed: u64) -> Box<dyn Strategy> {
        let rng = SmallRng::seed_from_u64(seed);
        match self {
            Self::Economic => Box::new(Greedy {
                label: self.name(),
                catalog,
                rng,
                value: |utility| utility.money,
            }),
            Self::Reputation => Box::new(Greedy {
                label: self.name(),
                catalog,
                rng,
                value: |utility| utility.reputation,
            }),
            Self::Balanced => Box::new(Balanced { catalog, rng }),
            Self::Random => Box::new(Uniform { rng }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy `{s}`"))
    }
}

/// Codec matching the observed grid.
fn codec_for(observation: &Observation) -> Option<ActionCodec> {
    u16::try_from(observation.size())
        .ok()
        .filter(|&n| n > 0)
        .map(ActionCodec::new)
}

/// Coordinates with no builder.
fn empty_cells(observation: &Observation) -> Vec<Coord> {
    let mut cells = Vec::new();
    for (x, row) in observation.builders.iter().enumerate() {
        for (y, builder) in row.iter().enumerate() {
            if builder.is_none() {
                if let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) {
                    cells.push(Coord::new(x, y));
                }
            }
        }
    }
    cells
}

/// Building types whose cost `resources` can cover.
fn affordable(catalog: &BuildingCatalog, resources: Resources) -> impl Iterator<Item = BuildingType> + '_ {
    BuildingType::ALL
        .into_iter()
        .filter(move |&kind| resources.covers(catalog.get(kind).cost))
}

/// Maximizes one utility component, placing on a random empty cell.
struct Greedy {
    label: &'static str,
    catalog: BuildingCatalog,
    rng: SmallRng,
    value: fn(Resources) -> i64,
}

impl fmt::Debug for Greedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Greedy").field("label", &self.label).finish_non_exhaustive()
    }
}

impl Strategy for Greedy {
    fn label(&self) -> &'static str {
        self.label
    }

    fn select_action(&mut self, observation: &Observation) -> Option<i64> {
        let codec = codec_for(observation)?;
        // max_by_key keeps the last maximum; reverse so ties favor encoding order
        let kind = affordable(&self.catalog, observation.resources)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .max_by_key(|&kind| (self.value)(self.catalog.get(kind).utility))?;
        let coord = *empty_cells(observation).choose(&mut self.rng)?;
        codec.encode(kind, coord)
    }
}

/// Uniform over every affordable action id, occupied cells included.
#[derive(Debug)]
struct Balanced {
    catalog: BuildingCatalog,
    rng: SmallRng,
}

impl Strategy for Balanced {
    fn label(&self) -> &'static str {
        "balanced"
    }

    fn select_action(&mut self, observation: &Observation) -> Option<i64> {
        let codec = codec_for(observation)?;
        let size = u16::try_from(observation.size()).ok()?;

        let mut candidates = Vec::new();
        for kind in affordable(&self.catalog, observation.resources) {
            for x in 0..size {
                for y in 0..size {
                    candidates.extend(codec.encode(kind, Coord::new(x, y)));
                }
            }
        }
        candidates.choose(&mut self.rng).copied()
    }
}

/// Uniform over the whole action space.
#[derive(Debug)]
struct Uniform {
    rng: SmallRng,
}

impl Strategy for Uniform {
    fn label(&self) -> &'static str {
        "random"
    }

    fn select_action(&mut self, observation: &Observation) -> Option<i64> {
        let codec = codec_for(observation)?;
        Some(self.rng.random_range(0..codec.action_space()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(size: usize, resources: Resources) -> Observation {
        Observation {
            grid: vec![vec![[30, 30, 30]; size]; size],
            resources,
            builders: vec![vec![None; size]; size],
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Economic".parse::<StrategyKind>(), Ok(StrategyKind::Economic));
        assert_eq!("random".parse::<StrategyKind>(), Ok(StrategyKind::Random));
        assert!("greedy".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_economic_prefers_shop() {
        let mut strategy = StrategyKind::Economic.build(BuildingCatalog::default(), 1);
        let obs = observation(4, Resources::new(20, 20));
        let codec = ActionCodec::new(4);

        for _ in 0..20 {
            let id = strategy.select_action(&obs).unwrap();
            assert_eq!(codec.decode(id).action.kind, BuildingType::Shop);
        }
    }

    #[test]
    fn test_reputation_prefers_park() {
        let mut strategy = StrategyKind::Reputation.build(BuildingCatalog::default(), 1);
        let obs = observation(4, Resources::new(20, 20));
        let id = strategy.select_action(&obs).unwrap();
        assert_eq!(ActionCodec::new(4).decode(id).action.kind, BuildingType::Park);
    }

    #[test]
    fn test_economic_falls_back_to_affordable() {
        let mut strategy = StrategyKind::Economic.build(BuildingCatalog::default(), 1);
        // Shop (3, 1) unaffordable, House (2, 2) affordable
        let obs = observation(4, Resources::new(2, 2));
        let id = strategy.select_action(&obs).unwrap();
        assert_eq!(ActionCodec::new(4).decode(id).action.kind, BuildingType::House);
    }

    #[test]
    fn test_greedy_only_targets_empty_cells() {
        let mut strategy = StrategyKind::Economic.build(BuildingCatalog::default(), 7);
        let mut obs = observation(2, Resources::new(20, 20));
        obs.builders[0] = vec![Some(0), Some(1)];
        obs.builders[1][0] = Some(2);

        let id = strategy.select_action(&obs).unwrap();
        assert_eq!(ActionCodec::new(2).decode(id).action.coord, Coord::new(1, 1));

        obs.builders[1][1] = Some(0);
        assert_eq!(strategy.select_action(&obs), None);
    }

    #[test]
    fn test_broke_agents_have_no_action() {
        let obs = observation(4, Resources::new(0, 0));
        for kind in [StrategyKind::Economic, StrategyKind::Reputation, StrategyKind::Balanced] {
            let mut strategy = kind.build(BuildingCatalog::default(), 3);
            assert_eq!(strategy.select_action(&obs), None, "{kind}");
        }
    }

    #[test]
    fn test_random_stays_in_action_space() {
        let mut strategy = StrategyKind::Random.build(BuildingCatalog::default(), 11);
        let obs = observation(3, Resources::default());
        let codec = ActionCodec::new(3);
        for _ in 0..200 {
            let id = strategy.select_action(&obs).unwrap();
            assert!(codec.contains(id));
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let obs = observation(4, Resources::new(20, 20));
        let mut a = StrategyKind::Balanced.build(BuildingCatalog::default(), 99);
        let mut b = StrategyKind::Balanced.build(BuildingCatalog::default(), 99);
        for _ in 0..50 {
            assert_eq!(a.select_action(&obs), b.select_action(&obs));
        }
    }
}
