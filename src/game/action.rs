//! Mapping between flat action ids and placements.
//!
//! An action id packs a building type and a cell:
//!
//! ```text
//! id = type_index * N² + x * N + y
//! ```
//!
//! Ids outside `0..types * N²` decode to the default action, a Park at
//! `(0, 0)`, so every integer a strategy returns is playable.

use crate::config::BuildingType;
use crate::game::Coord;

/// A decoded placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    /// Building to place.
    pub kind: BuildingType,
    /// Target cell.
    pub coord: Coord,
}

impl Action {
    /// Substituted for ids outside the action space.
    pub const DEFAULT: Self = Self {
        kind: BuildingType::Park,
        coord: Coord::new(0, 0),
    };
}

/// Result of decoding an action id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// The action to play.
    pub action: Action,
    /// True if the id was out of range and [`Action::DEFAULT`] was substituted.
    pub fallback: bool,
}

/// Encodes and decodes action ids for a grid of fixed side length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionCodec {
    size: u16,
}

impl ActionCodec {
    /// Create a codec for a grid of side `size`.
    #[must_use]
    pub const fn new(size: u16) -> Self {
        Self { size }
    }

    /// Number of cells on the grid.
    const fn cells(self) -> i64 {
        let n = self.size as i64;
        n * n
    }

    /// Total number of valid action ids.
    #[must_use]
    pub const fn action_space(self) -> i64 {
        self.cells() * BuildingType::COUNT as i64
    }

    /// Whether `id` names a real action.
    #[must_use]
    pub const fn contains(self, id: i64) -> bool {
        id >= 0 && id < self.action_space()
    }

    /// Decode an action id, falling back to [`Action::DEFAULT`] when out of range.
    #[must_use]
    pub fn decode(self, id: i64) -> Decoded {
        if !self.contains(id) {
            return Decoded {
                action: Action::DEFAULT,
                fallback: true,
            };
        }

        let cells = self.cells();
        let n = i64::from(self.size);
        let type_index = id / cells;
        let position = id % cells;

        // All three quotients are bounded by `contains` above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (kind, x, y) = (
            BuildingType::from_index(type_index as usize),
            (position / n) as u16,
            (position % n) as u16,
        );

        match kind {
            Some(kind) => Decoded {
                action: Action {
                    kind,
                    coord: Coord::new(x, y),
                },
                fallback: false,
            },
            None => Decoded {
                action: Action::DEFAULT,
                fallback: true,
            },
        }
    }

    /// Encode a placement as an action id.
    ///
    /// Returns `None` if the coordinate is off the grid.
    #[must_use]
    pub fn encode(self, kind: BuildingType, coord: Coord) -> Option<i64> {
        if coord.x >= self.size || coord.y >= self.size {
            return None;
        }
        let n = i64::from(self.size);
        #[allow(clippy::cast_possible_wrap)]
        let type_index = kind.index() as i64;
        Some(type_index * self.cells() + i64::from(coord.x) * n + i64::from(coord.y))
    }
}
