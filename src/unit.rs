//! Units standing on the grid.
//!
//! A unit occupies exactly one cell; cell and unit reference each other
//! by index, and the grid owns both.

/// Default per-turn movement budget.
pub const DEFAULT_SPEED: i32 = 24;

/// Default fog-of-war vision range.
pub const DEFAULT_VISION_RANGE: i32 = 3;

#[derive(Clone, Debug)]
pub struct HexUnit {
    /// Arena index of the occupied cell.
    pub location: usize,
    /// Facing angle in degrees, persisted with the map.
    pub orientation: f32,
    pub speed: i32,
    pub vision_range: i32,
}

impl HexUnit {
    pub fn new() -> HexUnit {
        HexUnit {
            location: 0,
            orientation: 0.0,
            speed: DEFAULT_SPEED,
            vision_range: DEFAULT_VISION_RANGE,
        }
    }

    /// The movement attributes pathfinding needs, detached from the
    /// unit so a search can borrow the grid mutably.
    pub fn traveler(&self) -> Traveler {
        Traveler { speed: self.speed }
    }
}

impl Default for HexUnit {
    fn default() -> Self {
        Self::new()
    }
}

/// Movement attributes used by the path search.
#[derive(Clone, Copy, Debug)]
pub struct Traveler {
    pub speed: i32,
}
