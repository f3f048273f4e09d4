//! ASCII rendering of a hex grid for the CLI.
//!
//! Odd rows are indented by one column so the brick-pattern offset of
//! the hex layout survives in plain text. North is the top line.

use crate::cell::HexCell;
use crate::grid::HexGrid;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsciiMode {
    /// Show terrain characters with water and rivers
    Terrain,
    /// Show elevation gradient
    Height,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Height => "Height",
        }
    }
}

/// Get ASCII character for one cell's terrain
pub fn terrain_char(cell: &HexCell) -> char {
    if cell.is_underwater() {
        '~'
    } else if cell.has_river() {
        '='
    } else {
        match cell.terrain_type_index {
            0 => 'd', // sand
            1 => '"', // grass
            2 => 'T', // mud / dense growth
            3 => '^', // stone
            4 => '_', // snow / barren
            _ => '?',
        }
    }
}

/// Get ASCII character for elevation (gradient over the usual -2..8)
pub fn height_char(elevation: i32) -> char {
    const CHARS: &[char] = &['~', '.', '-', '=', '+', '*', '#', '%', '^', 'A', 'M'];
    let idx = (elevation + 2).clamp(0, CHARS.len() as i32 - 1) as usize;
    CHARS[idx]
}

/// Render a grid to an ASCII string
pub fn render_map(grid: &HexGrid, mode: AsciiMode) -> String {
    render_with(grid, |cell| match mode {
        AsciiMode::Terrain => terrain_char(cell),
        AsciiMode::Height => height_char(cell.elevation),
    })
}

/// Render a grid with a path overlaid as `o`, endpoints as `A` and `B`.
pub fn render_path(grid: &HexGrid, path: &[usize]) -> String {
    render_with(grid, |cell| {
        if let Some(position) = path.iter().position(|&p| p == cell.index) {
            if position == 0 {
                'A'
            } else if position == path.len() - 1 {
                'B'
            } else {
                'o'
            }
        } else {
            terrain_char(cell)
        }
    })
}

fn render_with<F: Fn(&HexCell) -> char>(grid: &HexGrid, cell_char: F) -> String {
    let width = grid.cell_count_x as usize;
    let mut result = String::with_capacity((2 * width + 2) * grid.cell_count_z as usize);
    for z in (0..grid.cell_count_z).rev() {
        if z & 1 == 1 {
            result.push(' ');
        }
        for x in 0..grid.cell_count_x {
            let cell = &grid.cells[(x + z * grid.cell_count_x) as usize];
            result.push(cell_char(cell));
            result.push(' ');
        }
        result.push('\n');
    }
    result
}

/// Generate legend for terrain characters
pub fn terrain_legend() -> String {
    "=== TERRAIN LEGEND ===\n\
     ~ water        = river\n\
     d sand         \" grass       T dense growth\n\
     ^ stone        _ barren\n"
        .to_string()
}
