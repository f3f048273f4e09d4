//! Hex coordinate math.
//!
//! Cube coordinates stored as (x, z) with the third axis derived
//! (y = -x - z), plus the six edge directions of the grid. Distances
//! optionally account for east-west map wrapping.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance from a cell center to any corner, in world units.
pub const OUTER_RADIUS: f32 = 10.0;

/// Distance from a cell center to the midpoint of an edge: outer * sqrt(3)/2.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * 0.866_025_4;

/// The six edge directions of a hex cell, clockwise from north-east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
}

impl HexDirection {
    /// All six directions in enumeration order.
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::NE,
            HexDirection::E,
            HexDirection::SE,
            HexDirection::SW,
            HexDirection::W,
            HexDirection::NW,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> HexDirection {
        Self::all()[index % 6]
    }

    pub fn opposite(self) -> HexDirection {
        Self::from_index(self.index() + 3)
    }

    pub fn next(self) -> HexDirection {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> HexDirection {
        Self::from_index(self.index() + 5)
    }

    pub fn next2(self) -> HexDirection {
        Self::from_index(self.index() + 2)
    }

    pub fn previous2(self) -> HexDirection {
        Self::from_index(self.index() + 4)
    }
}

/// Cube coordinates of one hex cell. Only x and z are stored; the y
/// axis is derived so the x + y + z == 0 invariant always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoordinates {
    pub x: i32,
    pub z: i32,
}

impl HexCoordinates {
    pub fn new(x: i32, z: i32) -> HexCoordinates {
        HexCoordinates { x, z }
    }

    pub fn y(self) -> i32 {
        -self.x - self.z
    }

    /// Convert offset (column, row) grid coordinates, undoing the row
    /// stagger of the rectangular layout.
    pub fn from_offset(x: i32, z: i32) -> HexCoordinates {
        HexCoordinates::new(x - z / 2, z)
    }

    /// The offset column this coordinate occupies.
    pub fn offset_x(self) -> i32 {
        self.x + self.z / 2
    }

    /// Hex distance: half the summed absolute cube deltas.
    pub fn distance_to(self, other: HexCoordinates) -> i32 {
        (self.xy_delta(other) + (self.z - other.z).abs()) / 2
    }

    /// Hex distance on a map that wraps east-west every `wrap_size`
    /// columns. Tries the unshifted position first, then the shifted
    /// copy on whichever side is closer.
    pub fn wrapped_distance_to(self, other: HexCoordinates, wrap_size: i32) -> i32 {
        if wrap_size <= 0 {
            return self.distance_to(other);
        }
        let mut xy = self.xy_delta(other);
        let east = HexCoordinates::new(other.x + wrap_size, other.z);
        let xy_wrapped = self.xy_delta(east);
        if xy_wrapped < xy {
            xy = xy_wrapped;
        } else {
            let west = HexCoordinates::new(other.x - wrap_size, other.z);
            let xy_wrapped = self.xy_delta(west);
            if xy_wrapped < xy {
                xy = xy_wrapped;
            }
        }
        (xy + (self.z - other.z).abs()) / 2
    }

    fn xy_delta(self, other: HexCoordinates) -> i32 {
        (self.x - other.x).abs() + (self.y() - other.y()).abs()
    }

    /// Convert a world-space position to the coordinates of the cell
    /// containing it, rounding cube axes and reconstructing the one
    /// with the largest rounding error.
    pub fn from_position(px: f32, pz: f32) -> HexCoordinates {
        let mut x = px / (INNER_RADIUS * 2.0);
        let mut y = -x;
        let offset = pz / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;

        let mut ix = x.round() as i32;
        let iy = y.round() as i32;
        let mut iz = (-x - y).round() as i32;

        if ix + iy + iz != 0 {
            let dx = (x - ix as f32).abs();
            let dy = (y - iy as f32).abs();
            let dz = (-x - y - iz as f32).abs();
            if dx > dy && dx > dz {
                ix = -iy - iz;
            } else if dz > dy {
                iz = -ix - iy;
            }
        }

        HexCoordinates::new(ix, iz)
    }
}

/// World-space center of the cell at offset coordinates (x, z).
pub fn cell_center(x: i32, z: i32) -> (f32, f32) {
    let px = (x as f32 + z as f32 * 0.5 - (z / 2) as f32) * (INNER_RADIUS * 2.0);
    let pz = z as f32 * (OUTER_RADIUS * 1.5);
    (px, pz)
}

impl fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}
