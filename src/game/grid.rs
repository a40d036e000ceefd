//! Grid cells, building placements and builder attribution.

use crate::config::{BuildingType, IndexDelta};

/// Index of an agent in the session roster.
pub type AgentIdx = usize;

/// A coordinate on the grid.
///
/// `x` is the row and `y` the column, matching action decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// Row.
    pub x: u16,
    /// Column.
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbors that fall inside a square grid of side `size`.
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, size: u16) -> ([Coord; 4], u8) {
        let mut result = [Coord::new(0, 0); 4];
        let mut count = 0u8;

        if self.x > 0 {
            result[count as usize] = Coord::new(self.x - 1, self.y);
            count += 1;
        }
        if self.x + 1 < size {
            result[count as usize] = Coord::new(self.x + 1, self.y);
            count += 1;
        }
        if self.y > 0 {
            result[count as usize] = Coord::new(self.x, self.y - 1);
            count += 1;
        }
        if self.y + 1 < size {
            result[count as usize] = Coord::new(self.x, self.y + 1);
            count += 1;
        }

        (result, count)
    }
}

/// A placed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Building {
    /// Building type.
    pub kind: BuildingType,
    /// Turn ordinal at which the building was placed.
    pub built_turn: u32,
    /// Agent that placed it.
    pub builder: AgentIdx,
}

/// Occupancy of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Occupancy {
    /// No building.
    #[default]
    Empty,
    /// A building stands here. It is never removed.
    Occupied(Building),
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// G index.
    pub g: i64,
    /// V index.
    pub v: i64,
    /// D index.
    pub d: i64,
    /// Building on this cell, if any.
    pub occupancy: Occupancy,
}

impl Cell {
    /// Create an empty cell with all indices at `baseline`.
    #[must_use]
    pub const fn new(baseline: i64) -> Self {
        Self {
            g: baseline,
            v: baseline,
            d: baseline,
            occupancy: Occupancy::Empty,
        }
    }

    /// The building on this cell.
    #[must_use]
    pub const fn building(&self) -> Option<&Building> {
        match &self.occupancy {
            Occupancy::Occupied(building) => Some(building),
            Occupancy::Empty => None,
        }
    }

    /// Agent that built on this cell.
    #[must_use]
    pub const fn builder(&self) -> Option<AgentIdx> {
        match self.occupancy {
            Occupancy::Occupied(building) => Some(building.builder),
            Occupancy::Empty => None,
        }
    }

    /// Whether a building stands here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        matches!(self.occupancy, Occupancy::Occupied(_))
    }

    /// The three indices as `[G, V, D]`.
    #[must_use]
    pub const fn indices(&self) -> [i64; 3] {
        [self.g, self.v, self.d]
    }

    fn apply(&mut self, delta: IndexDelta) {
        self.g = self.g.saturating_add(delta.g);
        self.v = self.v.saturating_add(delta.v);
        self.d = self.d.saturating_add(delta.d);
    }
}

/// Why [`Grid::place`] refused a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    /// A building already stands on the cell.
    Occupied(Building),
    /// The coordinate lies outside the grid.
    OutOfBounds(Coord),
}

/// The square game grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Side length.
    size: u16,
    /// Cells stored in row-major order (`x * size + y`).
    cells: Vec<Cell>,
    /// Number of occupied cells.
    buildings: usize,
}

impl Grid {
    /// Create a grid of side `size` with every index at `baseline`.
    ///
    /// Returns `None` if `size` is zero.
    #[must_use]
    pub fn new(size: u16, baseline: i64) -> Option<Self> {
        if size == 0 {
            return None;
        }

        let count = usize::from(size) * usize::from(size);
        Some(Self {
            size,
            cells: vec![Cell::new(baseline); count],
            buildings: 0,
        })
    }

    /// Return every cell to `baseline` with no buildings.
    pub fn reset(&mut self, baseline: i64) {
        self.cells.fill(Cell::new(baseline));
        self.buildings = 0;
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Check if a coordinate is within the grid.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }

    fn coord_to_index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.x) * usize::from(self.size) + usize::from(coord.y))
        } else {
            None
        }
    }

    /// Get the cell at the given coordinate.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.coord_to_index(coord).map(|idx| &self.cells[idx])
    }

    /// Whether no building stands at `coord`.
    ///
    /// Out-of-bounds coordinates are reported as not empty.
    #[must_use]
    pub fn is_empty(&self, coord: Coord) -> bool {
        self.get(coord).is_some_and(|cell| !cell.is_occupied())
    }

    /// Record a building at `coord`.
    ///
    /// Does not touch the cell's indices.
    ///
    /// # Errors
    ///
    /// Returns a [`PlaceError`] without mutating anything if a building
    /// already stands at `coord` or `coord` is off the grid.
    pub fn place(
        &mut self,
        coord: Coord,
        kind: BuildingType,
        builder: AgentIdx,
        turn: u32,
    ) -> Result<(), PlaceError> {
        let idx = self
            .coord_to_index(coord)
            .ok_or(PlaceError::OutOfBounds(coord))?;
        let cell = &mut self.cells[idx];

        if let Occupancy::Occupied(existing) = cell.occupancy {
            return Err(PlaceError::Occupied(existing));
        }

        cell.occupancy = Occupancy::Occupied(Building {
            kind,
            built_turn: turn,
            builder,
        });
        self.buildings += 1;
        Ok(())
    }

    /// Add `delta` to the indices at `coord`. Values are not clamped.
    ///
    /// Returns `false` if the coordinate is out of bounds.
    pub fn apply_delta(&mut self, coord: Coord, delta: IndexDelta) -> bool {
        if let Some(idx) = self.coord_to_index(coord) {
            self.cells[idx].apply(delta);
            true
        } else {
            false
        }
    }

    /// Iterate over all coordinates and cells.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> {
        let size = usize::from(self.size);
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            #[allow(clippy::cast_possible_truncation)]
            let coord = Coord::new((idx / size) as u16, (idx % size) as u16);
            (coord, cell)
        })
    }

    /// Iterate over standing buildings.
    pub fn buildings(&self) -> impl Iterator<Item = (Coord, &Building)> {
        self.iter()
            .filter_map(|(coord, cell)| cell.building().map(|b| (coord, b)))
    }

    /// Number of standing buildings.
    #[must_use]
    pub const fn building_count(&self) -> usize {
        self.buildings
    }

    /// Whether every cell holds a building.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buildings == self.cells.len()
    }
}
