//! Cell state for one hex tile.
//!
//! Cells live in a flat arena owned by the grid; every reference between
//! cells (neighbors, path predecessors, queue links) is an index into
//! that arena, never a pointer.

use crate::coords::{HexCoordinates, HexDirection};

/// Relationship between the elevations of two adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HexEdgeType {
    Flat,
    Slope,
    Cliff,
}

/// Classify the edge between two elevations. Cliffs are impassable for
/// roads, rivers, and travelers.
pub fn edge_type(elevation1: i32, elevation2: i32) -> HexEdgeType {
    let delta = (elevation1 - elevation2).abs();
    match delta {
        0 => HexEdgeType::Flat,
        1 => HexEdgeType::Slope,
        _ => HexEdgeType::Cliff,
    }
}

/// One hexagonal tile.
///
/// The search scratch fields (`distance`, `search_heuristic`,
/// `search_phase`, `path_from`, `next_with_same_priority`) belong to the
/// grid's shared frontier and are only meaningful while `search_phase`
/// matches the active search; they are invalidated by bumping the phase
/// counter rather than cleared.
#[derive(Clone, Debug)]
pub struct HexCell {
    pub index: usize,
    pub coordinates: HexCoordinates,

    pub elevation: i32,
    pub water_level: i32,
    pub terrain_type_index: u8,
    pub urban_level: i32,
    pub farm_level: i32,
    pub plant_level: i32,
    pub special_index: u8,
    pub walled: bool,

    /// Neighbor arena indices, one per direction. Weak back-references:
    /// the grid owns every cell.
    pub neighbors: [Option<usize>; 6],
    /// Road presence per edge direction, mirrored on the neighbor.
    pub roads: [bool; 6],

    pub incoming_river: Option<HexDirection>,
    pub outgoing_river: Option<HexDirection>,

    // Search scratch, valid only for the current phase.
    pub distance: i32,
    pub search_heuristic: i32,
    pub search_phase: i32,
    pub path_from: usize,
    pub next_with_same_priority: Option<usize>,

    /// Count of units currently seeing this cell. Never negative.
    pub visibility: i32,
    pub explored: bool,
    /// Border cells are kept out of visibility searches so fog never
    /// reveals the unreachable map edge.
    pub explorable: bool,

    /// Occupying unit, if any (index into the grid's unit list).
    pub unit: Option<usize>,
}

impl HexCell {
    pub fn new(index: usize, coordinates: HexCoordinates) -> HexCell {
        HexCell {
            index,
            coordinates,
            elevation: 0,
            water_level: 0,
            terrain_type_index: 0,
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            neighbors: [None; 6],
            roads: [false; 6],
            incoming_river: None,
            outgoing_river: None,
            distance: 0,
            search_heuristic: 0,
            search_phase: 0,
            path_from: 0,
            next_with_same_priority: None,
            visibility: 0,
            explored: false,
            explorable: false,
            unit: None,
        }
    }

    pub fn neighbor(&self, direction: HexDirection) -> Option<usize> {
        self.neighbors[direction.index()]
    }

    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    /// Effective height for line-of-sight: terrain or water surface,
    /// whichever is higher.
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    pub fn is_visible(&self) -> bool {
        self.visibility > 0 && self.explorable
    }

    pub fn is_explored(&self) -> bool {
        self.explored && self.explorable
    }

    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    /// Direction of the river at a begin or end cell.
    pub fn river_begin_or_end_direction(&self) -> Option<HexDirection> {
        self.incoming_river.or(self.outgoing_river)
    }

    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads[direction.index()]
    }

    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(|&road| road)
    }

    /// Queue priority while on the search frontier.
    pub fn search_priority(&self) -> i32 {
        self.distance + self.search_heuristic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_classification() {
        assert_eq!(edge_type(2, 2), HexEdgeType::Flat);
        assert_eq!(edge_type(2, 3), HexEdgeType::Slope);
        assert_eq!(edge_type(3, 2), HexEdgeType::Slope);
        assert_eq!(edge_type(0, 2), HexEdgeType::Cliff);
        assert_eq!(edge_type(5, -1), HexEdgeType::Cliff);
    }

    #[test]
    fn test_underwater_and_view_elevation() {
        let mut cell = HexCell::new(0, HexCoordinates::new(0, 0));
        cell.elevation = 1;
        cell.water_level = 3;
        assert!(cell.is_underwater());
        assert_eq!(cell.view_elevation(), 3);

        cell.elevation = 4;
        assert!(!cell.is_underwater());
        assert_eq!(cell.view_elevation(), 4);
    }

    #[test]
    fn test_river_edges() {
        let mut cell = HexCell::new(0, HexCoordinates::new(0, 0));
        assert!(!cell.has_river());
        cell.outgoing_river = Some(HexDirection::E);
        assert!(cell.has_river());
        assert!(cell.has_river_begin_or_end());
        assert!(cell.has_river_through_edge(HexDirection::E));
        assert!(!cell.has_river_through_edge(HexDirection::W));

        cell.incoming_river = Some(HexDirection::W);
        assert!(!cell.has_river_begin_or_end());
    }
}
