//! Terrain typing from the climate's moisture picture.

use crate::grid::HexGrid;

/// Assign a terrain type to every cell from its final moisture.
///
/// Dry land turns to sand, then grass variants up to dense forest on
/// the wettest ground. Everything underwater reads as mud.
pub fn set_terrain_types(grid: &mut HexGrid, moisture: &[f32]) {
    for (i, cell) in grid.cells.iter_mut().enumerate() {
        if cell.is_underwater() {
            cell.terrain_type_index = 2;
            continue;
        }
        let m = moisture[i];
        cell.terrain_type_index = if m < 0.05 {
            4
        } else if m < 0.12 {
            0
        } else if m < 0.28 {
            3
        } else if m < 0.85 {
            1
        } else {
            2
        };
    }
}
