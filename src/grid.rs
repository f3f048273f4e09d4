//! The hex grid: a flat arena of cells plus the units standing on them.
//!
//! The grid is the sole creator and destroyer of cells. Cells are stored
//! in one contiguous vector indexed by `x + z * cell_count_x`; all
//! cross-references are arena indices. The grid also owns the single
//! priority queue and search phase counter shared by every search
//! (land raising, pathfinding, visibility) — searches are never nested,
//! and the phase counter lazily invalidates per-cell scratch state
//! instead of clearing the whole arena.

use std::fmt;
use std::io;

use crate::cell::{edge_type, HexCell, HexEdgeType};
use crate::coords::{HexCoordinates, HexDirection};
use crate::queue::CellPriorityQueue;
use crate::unit::HexUnit;
use crate::visibility;

/// Maps must be sized in whole render chunks.
pub const CHUNK_SIZE_X: i32 = 5;
pub const CHUNK_SIZE_Z: i32 = 5;

/// Errors from map creation and persistence.
#[derive(Debug)]
pub enum MapError {
    /// Requested dimensions are not positive multiples of the chunk size.
    InvalidDimensions { x: i32, z: i32 },
    /// Save file carries a format version this build does not know.
    UnknownVersion(i32),
    /// Underlying IO failure while reading or writing a save.
    Io(io::Error),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidDimensions { x, z } => write!(
                f,
                "unsupported map size {}x{}: dimensions must be positive multiples of {}x{}",
                x, z, CHUNK_SIZE_X, CHUNK_SIZE_Z
            ),
            MapError::UnknownVersion(version) => {
                write!(f, "unknown map format version {}", version)
            }
            MapError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for MapError {}

impl From<io::Error> for MapError {
    fn from(e: io::Error) -> Self {
        MapError::Io(e)
    }
}

/// Grid of hex cells with optional east-west wrapping.
#[derive(Debug, Default)]
pub struct HexGrid {
    pub cells: Vec<HexCell>,
    pub cell_count_x: i32,
    pub cell_count_z: i32,
    pub wrapping: bool,

    pub units: Vec<HexUnit>,

    /// Shared search state. One queue, one phase counter, reused by all
    /// searches on this grid.
    pub search_frontier: CellPriorityQueue,
    pub search_frontier_phase: i32,

    pub(crate) current_path_from: usize,
    pub(crate) current_path_to: usize,
    pub(crate) current_path_exists: bool,
    pub(crate) current_path_cost: i32,

    /// Set when an elevation or water change invalidates every cached
    /// visibility count; flushed before the next visibility operation.
    pub(crate) visibility_reset_dirty: bool,
}

impl HexGrid {
    /// Build a grid without dimension validation. Callers that accept
    /// user input should go through [`HexGrid::create_map`].
    pub fn new(cell_count_x: i32, cell_count_z: i32, wrapping: bool) -> HexGrid {
        let mut grid = HexGrid {
            cells: Vec::with_capacity((cell_count_x * cell_count_z) as usize),
            cell_count_x,
            cell_count_z,
            wrapping,
            units: Vec::new(),
            search_frontier: CellPriorityQueue::new(),
            search_frontier_phase: 0,
            current_path_from: 0,
            current_path_to: 0,
            current_path_exists: false,
            current_path_cost: 0,
            visibility_reset_dirty: false,
        };
        let mut i = 0;
        for z in 0..cell_count_z {
            for x in 0..cell_count_x {
                grid.create_cell(x, z, i);
                i += 1;
            }
        }
        grid
    }

    /// Replace the current map with a freshly allocated one. Dimensions
    /// must be positive multiples of the chunk size; on failure the
    /// existing map is left untouched.
    pub fn create_map(&mut self, x: i32, z: i32, wrapping: bool) -> Result<(), MapError> {
        if x <= 0 || x % CHUNK_SIZE_X != 0 || z <= 0 || z % CHUNK_SIZE_Z != 0 {
            return Err(MapError::InvalidDimensions { x, z });
        }
        *self = HexGrid::new(x, z, wrapping);
        Ok(())
    }

    fn create_cell(&mut self, x: i32, z: i32, i: usize) {
        let mut cell = HexCell::new(i, HexCoordinates::from_offset(x, z));
        cell.explorable = if self.wrapping {
            z > 0 && z < self.cell_count_z - 1
        } else {
            x > 0 && z > 0 && x < self.cell_count_x - 1 && z < self.cell_count_z - 1
        };
        self.cells.push(cell);

        let width = self.cell_count_x as usize;
        if x > 0 {
            self.set_neighbor(i, HexDirection::W, i - 1);
            if self.wrapping && x == self.cell_count_x - 1 {
                self.set_neighbor(i, HexDirection::E, i - x as usize);
            }
        }
        if z > 0 {
            if (z & 1) == 0 {
                self.set_neighbor(i, HexDirection::SE, i - width);
                if x > 0 {
                    self.set_neighbor(i, HexDirection::SW, i - width - 1);
                } else if self.wrapping {
                    self.set_neighbor(i, HexDirection::SW, i - 1);
                }
            } else {
                self.set_neighbor(i, HexDirection::SW, i - width);
                if x < self.cell_count_x - 1 {
                    self.set_neighbor(i, HexDirection::SE, i - width + 1);
                } else if self.wrapping {
                    self.set_neighbor(i, HexDirection::SE, i + 1 - width * 2);
                }
            }
        }
    }

    fn set_neighbor(&mut self, cell: usize, direction: HexDirection, neighbor: usize) {
        self.cells[cell].neighbors[direction.index()] = Some(neighbor);
        self.cells[neighbor].neighbors[direction.opposite().index()] = Some(cell);
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Columns the x axis wraps over, or 0 on a bounded map.
    pub fn wrap_size(&self) -> i32 {
        if self.wrapping {
            self.cell_count_x
        } else {
            0
        }
    }

    pub fn cell(&self, index: usize) -> &HexCell {
        &self.cells[index]
    }

    pub fn cell_mut(&mut self, index: usize) -> &mut HexCell {
        &mut self.cells[index]
    }

    /// Arena index for cube coordinates, or `None` outside the map.
    pub fn cell_index_at(&self, coordinates: HexCoordinates) -> Option<usize> {
        let z = coordinates.z;
        if z < 0 || z >= self.cell_count_z {
            return None;
        }
        let x = coordinates.x + z / 2;
        if x < 0 || x >= self.cell_count_x {
            return None;
        }
        Some((x + z * self.cell_count_x) as usize)
    }

    pub fn cell_at(&self, coordinates: HexCoordinates) -> Option<&HexCell> {
        self.cell_index_at(coordinates).map(|i| &self.cells[i])
    }

    /// Look up the cell containing a world-space position.
    pub fn cell_at_position(&self, px: f32, pz: f32) -> Option<&HexCell> {
        self.cell_at(HexCoordinates::from_position(px, pz))
    }

    /// Hex distance between two cells, honoring wrapping.
    pub fn distance_between(&self, a: usize, b: usize) -> i32 {
        self.cells[a]
            .coordinates
            .wrapped_distance_to(self.cells[b].coordinates, self.wrap_size())
    }

    pub fn edge_type_between(&self, index: usize, direction: HexDirection) -> Option<HexEdgeType> {
        let neighbor = self.cells[index].neighbor(direction)?;
        Some(edge_type(
            self.cells[index].elevation,
            self.cells[neighbor].elevation,
        ))
    }

    pub fn elevation_difference(&self, index: usize, direction: HexDirection) -> i32 {
        match self.cells[index].neighbor(direction) {
            Some(neighbor) => (self.cells[index].elevation - self.cells[neighbor].elevation).abs(),
            None => 0,
        }
    }

    // ------------------------------------------------------------------
    // Terrain mutation. These keep the river and road invariants intact,
    // so the generator and any editor front end share one rule set.
    // ------------------------------------------------------------------

    pub fn set_elevation(&mut self, index: usize, elevation: i32) {
        if self.cells[index].elevation == elevation {
            return;
        }
        let original_view_elevation = self.cells[index].view_elevation();
        self.cells[index].elevation = elevation;
        if self.cells[index].view_elevation() != original_view_elevation {
            self.visibility_reset_dirty = true;
        }

        self.validate_rivers(index);

        // Roads cannot climb more than one level.
        for direction in HexDirection::all() {
            if self.cells[index].roads[direction.index()]
                && self.elevation_difference(index, direction) > 1
            {
                self.set_road(index, direction, false);
            }
        }
    }

    pub fn set_water_level(&mut self, index: usize, water_level: i32) {
        if self.cells[index].water_level == water_level {
            return;
        }
        let original_view_elevation = self.cells[index].view_elevation();
        self.cells[index].water_level = water_level;
        if self.cells[index].view_elevation() != original_view_elevation {
            self.visibility_reset_dirty = true;
        }
        self.validate_rivers(index);
    }

    pub fn set_walled(&mut self, index: usize, walled: bool) {
        self.cells[index].walled = walled;
    }

    /// A river may flow into a neighbor that is not higher, or end in a
    /// body of water whose surface matches the neighbor's elevation.
    fn is_valid_river_destination(&self, index: usize, neighbor: usize) -> bool {
        let cell = &self.cells[index];
        let other = &self.cells[neighbor];
        cell.elevation >= other.elevation || cell.water_level == other.elevation
    }

    fn validate_rivers(&mut self, index: usize) {
        if let Some(direction) = self.cells[index].outgoing_river {
            let valid = self.cells[index]
                .neighbor(direction)
                .map(|n| self.is_valid_river_destination(index, n))
                .unwrap_or(false);
            if !valid {
                self.remove_outgoing_river(index);
            }
        }
        if let Some(direction) = self.cells[index].incoming_river {
            let valid = self.cells[index]
                .neighbor(direction)
                .map(|n| self.is_valid_river_destination(n, index))
                .unwrap_or(false);
            if !valid {
                self.remove_incoming_river(index);
            }
        }
    }

    pub fn remove_outgoing_river(&mut self, index: usize) {
        let Some(direction) = self.cells[index].outgoing_river else {
            return;
        };
        self.cells[index].outgoing_river = None;
        if let Some(neighbor) = self.cells[index].neighbor(direction) {
            self.cells[neighbor].incoming_river = None;
        }
    }

    pub fn remove_incoming_river(&mut self, index: usize) {
        let Some(direction) = self.cells[index].incoming_river else {
            return;
        };
        self.cells[index].incoming_river = None;
        if let Some(neighbor) = self.cells[index].neighbor(direction) {
            self.cells[neighbor].outgoing_river = None;
        }
    }

    pub fn remove_river(&mut self, index: usize) {
        self.remove_outgoing_river(index);
        self.remove_incoming_river(index);
    }

    /// Start or redirect the river leaving a cell. Silently refuses
    /// invalid destinations (uphill, off the map). The neighbor's old
    /// incoming river is displaced, so no cell ever carries two.
    pub fn set_outgoing_river(&mut self, index: usize, direction: HexDirection) {
        if self.cells[index].outgoing_river == Some(direction) {
            return;
        }
        let Some(neighbor) = self.cells[index].neighbor(direction) else {
            return;
        };
        if !self.is_valid_river_destination(index, neighbor) {
            return;
        }

        self.remove_outgoing_river(index);
        if self.cells[index].incoming_river == Some(direction) {
            self.remove_incoming_river(index);
        }
        self.cells[index].outgoing_river = Some(direction);

        self.remove_incoming_river(neighbor);
        self.cells[neighbor].incoming_river = Some(direction.opposite());

        // Rivers wash out roads on their edge.
        self.set_road(index, direction, false);
    }

    /// Add a road on an edge, unless a river runs through it or the
    /// slope is too steep.
    pub fn add_road(&mut self, index: usize, direction: HexDirection) {
        if !self.cells[index].roads[direction.index()]
            && !self.cells[index].has_river_through_edge(direction)
            && self.cells[index].neighbor(direction).is_some()
            && self.elevation_difference(index, direction) <= 1
        {
            self.set_road(index, direction, true);
        }
    }

    pub fn remove_roads(&mut self, index: usize) {
        for direction in HexDirection::all() {
            if self.cells[index].roads[direction.index()] {
                self.set_road(index, direction, false);
            }
        }
    }

    fn set_road(&mut self, index: usize, direction: HexDirection, state: bool) {
        self.cells[index].roads[direction.index()] = state;
        if let Some(neighbor) = self.cells[index].neighbor(direction) {
            self.cells[neighbor].roads[direction.opposite().index()] = state;
        }
    }

    // ------------------------------------------------------------------
    // Units. The grid owns unit lifetimes; cell and unit hold mutual
    // index back-references.
    // ------------------------------------------------------------------

    /// Place a new unit on an unoccupied cell. Returns its index, or
    /// `None` when the cell is taken or underwater.
    pub fn add_unit(&mut self, mut unit: HexUnit, location: usize, orientation: f32) -> Option<usize> {
        let cell = &self.cells[location];
        if cell.unit.is_some() || cell.is_underwater() {
            return None;
        }
        visibility::flush_pending_reset(self);
        let index = self.units.len();
        unit.location = location;
        unit.orientation = orientation;
        let vision_range = unit.vision_range;
        self.units.push(unit);
        self.cells[location].unit = Some(index);
        visibility::increase_visibility(self, location, vision_range);
        Some(index)
    }

    pub fn remove_unit(&mut self, index: usize) {
        visibility::flush_pending_reset(self);
        let unit = self.units.swap_remove(index);
        self.cells[unit.location].unit = None;
        visibility::decrease_visibility(self, unit.location, unit.vision_range);
        // Fix the back-reference of the unit that took the freed slot.
        if index < self.units.len() {
            let moved_location = self.units[index].location;
            self.cells[moved_location].unit = Some(index);
        }
    }

    /// Move a unit to the end of a path. Visibility transfers from the
    /// old location to the new one. A later call simply supersedes this
    /// one — last request wins.
    pub fn move_unit(&mut self, index: usize, destination: usize) {
        let from = self.units[index].location;
        if from == destination {
            return;
        }
        visibility::flush_pending_reset(self);
        let vision_range = self.units[index].vision_range;
        visibility::decrease_visibility(self, from, vision_range);
        self.cells[from].unit = None;
        self.units[index].location = destination;
        self.cells[destination].unit = Some(index);
        visibility::increase_visibility(self, destination, vision_range);
    }

    pub fn remove_all_units(&mut self) {
        while !self.units.is_empty() {
            self.remove_unit(self.units.len() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_map_rejects_bad_dimensions() {
        let mut grid = HexGrid::new(5, 5, false);
        assert!(matches!(
            grid.create_map(7, 5, false),
            Err(MapError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            grid.create_map(5, 0, false),
            Err(MapError::InvalidDimensions { .. })
        ));
        // The old map survives a rejected request.
        assert_eq!(grid.cell_count(), 25);

        assert!(grid.create_map(10, 15, false).is_ok());
        assert_eq!(grid.cell_count(), 150);
    }

    #[test]
    fn test_neighbor_links_are_mutual() {
        let grid = HexGrid::new(6, 6, false);
        for cell in &grid.cells {
            for direction in HexDirection::all() {
                if let Some(neighbor) = cell.neighbor(direction) {
                    assert_eq!(
                        grid.cells[neighbor].neighbor(direction.opposite()),
                        Some(cell.index)
                    );
                }
            }
        }
    }

    #[test]
    fn test_wrapping_connects_east_west_edges() {
        let grid = HexGrid::new(6, 4, true);
        // Row 0: last cell's east neighbor is the row's first cell.
        assert_eq!(grid.cells[5].neighbor(HexDirection::E), Some(0));
        assert_eq!(grid.cells[0].neighbor(HexDirection::W), Some(5));

        let bounded = HexGrid::new(6, 4, false);
        assert_eq!(bounded.cells[5].neighbor(HexDirection::E), None);
    }

    #[test]
    fn test_coordinate_lookup_round_trips() {
        let grid = HexGrid::new(8, 6, false);
        for cell in &grid.cells {
            assert_eq!(grid.cell_index_at(cell.coordinates), Some(cell.index));
        }
        assert_eq!(grid.cell_index_at(HexCoordinates::new(100, 0)), None);
        assert_eq!(grid.cell_index_at(HexCoordinates::new(0, -1)), None);
    }

    #[test]
    fn test_river_never_flows_uphill() {
        let mut grid = HexGrid::new(6, 6, false);
        let a = 14;
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();
        grid.set_elevation(a, 1);
        grid.set_elevation(b, 3);

        grid.set_outgoing_river(a, HexDirection::E);
        assert_eq!(grid.cells[a].outgoing_river, None);

        grid.set_outgoing_river(b, HexDirection::W);
        assert_eq!(grid.cells[b].outgoing_river, Some(HexDirection::W));
        assert_eq!(grid.cells[a].incoming_river, Some(HexDirection::E));
    }

    #[test]
    fn test_raising_terrain_removes_invalid_river() {
        let mut grid = HexGrid::new(6, 6, false);
        let a = 14;
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();
        grid.set_elevation(a, 2);
        grid.set_elevation(b, 1);
        grid.set_outgoing_river(a, HexDirection::E);
        assert!(grid.cells[a].has_river());

        // Lifting the downstream cell above the source breaks the river.
        grid.set_elevation(b, 4);
        assert!(!grid.cells[a].has_river());
        assert!(!grid.cells[b].has_river());
    }

    #[test]
    fn test_incoming_river_is_displaced_not_duplicated() {
        let mut grid = HexGrid::new(6, 6, false);
        let center = 14;
        let east = grid.cells[center].neighbor(HexDirection::E).unwrap();
        let west = grid.cells[center].neighbor(HexDirection::W).unwrap();
        grid.set_elevation(east, 2);
        grid.set_elevation(west, 2);

        grid.set_outgoing_river(east, HexDirection::W);
        assert_eq!(grid.cells[center].incoming_river, Some(HexDirection::E));

        grid.set_outgoing_river(west, HexDirection::E);
        assert_eq!(grid.cells[center].incoming_river, Some(HexDirection::W));
        // The displaced river's source lost its outgoing link.
        assert_eq!(grid.cells[east].outgoing_river, None);
    }

    #[test]
    fn test_roads_refused_on_rivers_and_cliffs() {
        let mut grid = HexGrid::new(6, 6, false);
        let a = 14;
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();

        grid.set_elevation(b, 3);
        grid.add_road(a, HexDirection::E);
        assert!(!grid.cells[a].has_road_through_edge(HexDirection::E));

        grid.set_elevation(b, 1);
        grid.add_road(a, HexDirection::E);
        assert!(grid.cells[a].has_road_through_edge(HexDirection::E));
        assert!(grid.cells[b].has_road_through_edge(HexDirection::W));

        // A new river washes the road away.
        grid.set_elevation(a, 1);
        grid.set_outgoing_river(a, HexDirection::E);
        assert!(!grid.cells[a].has_road_through_edge(HexDirection::E));
    }

    #[test]
    fn test_road_removed_when_slope_becomes_cliff() {
        let mut grid = HexGrid::new(6, 6, false);
        let a = 14;
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();
        grid.add_road(a, HexDirection::E);
        assert!(grid.cells[a].has_road_through_edge(HexDirection::E));

        grid.set_elevation(b, 2);
        assert!(!grid.cells[a].has_road_through_edge(HexDirection::E));
        assert!(!grid.cells[b].has_road_through_edge(HexDirection::W));
    }

    #[test]
    fn test_unit_occupancy_and_removal() {
        let mut grid = HexGrid::new(6, 6, false);
        let u0 = grid.add_unit(HexUnit::new(), 10, 0.0).unwrap();
        assert_eq!(grid.cells[10].unit, Some(u0));
        // Occupied cell refuses a second unit.
        assert_eq!(grid.add_unit(HexUnit::new(), 10, 0.0), None);

        let u1 = grid.add_unit(HexUnit::new(), 20, 90.0).unwrap();
        grid.remove_unit(u0);
        assert_eq!(grid.cells[10].unit, None);
        // The swapped-in unit's back-reference is patched.
        assert_eq!(grid.cells[20].unit, Some(0));
        assert_eq!(grid.units[0].location, 20);
        let _ = u1;
    }

    #[test]
    fn test_underwater_cell_refuses_units() {
        let mut grid = HexGrid::new(6, 6, false);
        grid.set_water_level(10, 2);
        assert!(grid.cells[10].is_underwater());
        assert_eq!(grid.add_unit(HexUnit::new(), 10, 0.0), None);
    }
}
