//! Fog of war: range-limited visibility searches.
//!
//! Visibility is a per-cell counter so overlapping viewers stack; a
//! cell is visible while the counter is positive, and the first sight
//! of a cell marks it explored for good. The search is a BFS on the
//! grid's shared frontier, capped by the viewer's range plus its view
//! elevation, and never reaches past the unexplorable map border.
//!
//! Elevation and water changes invalidate every cached count at once;
//! the grid records that as a dirty flag and the next visibility
//! operation rebuilds all counters from the units.

use crate::coords::HexDirection;
use crate::grid::HexGrid;

/// Cells visible from `from` with the given range. Uses the shared
/// frontier; do not call while another search is mid-flight.
pub fn visible_cells(grid: &mut HexGrid, from: usize, range: i32) -> Vec<usize> {
    let mut visible = Vec::new();

    grid.search_frontier_phase += 2;
    let phase = grid.search_frontier_phase;
    let wrap_size = grid.wrap_size();
    let from_coordinates = grid.cells[from].coordinates;
    // Height advantage extends the effective range.
    let range = range + grid.cells[from].view_elevation();

    let HexGrid {
        cells,
        search_frontier,
        ..
    } = grid;
    search_frontier.clear();

    cells[from].search_phase = phase;
    cells[from].distance = 0;
    cells[from].search_heuristic = 0;
    search_frontier.enqueue(cells, from);

    while search_frontier.count() > 0 {
        let Some(current) = search_frontier.dequeue(cells) else {
            break;
        };
        cells[current].search_phase += 1;
        visible.push(current);

        for direction in HexDirection::all() {
            let Some(neighbor) = cells[current].neighbor(direction) else {
                continue;
            };
            if cells[neighbor].search_phase > phase || !cells[neighbor].explorable {
                continue;
            }

            let distance = cells[current].distance + 1;
            if distance + cells[neighbor].view_elevation() > range
                || distance
                    > from_coordinates.wrapped_distance_to(cells[neighbor].coordinates, wrap_size)
            {
                continue;
            }

            if cells[neighbor].search_phase < phase {
                cells[neighbor].search_phase = phase;
                cells[neighbor].distance = distance;
                cells[neighbor].search_heuristic = 0;
                search_frontier.enqueue(cells, neighbor);
            } else if distance < cells[neighbor].distance {
                let old_priority = cells[neighbor].search_priority();
                cells[neighbor].distance = distance;
                search_frontier.change(cells, neighbor, old_priority);
            }
        }
    }
    visible
}

/// Register a viewer. Returns the cells that just became visible — the
/// hook for an external render layer to refresh.
pub fn increase_visibility(grid: &mut HexGrid, from: usize, range: i32) -> Vec<usize> {
    let mut revealed = Vec::new();
    for index in visible_cells(grid, from, range) {
        let cell = &mut grid.cells[index];
        cell.visibility += 1;
        if cell.visibility == 1 {
            cell.explored = true;
            revealed.push(index);
        }
    }
    revealed
}

/// Unregister a viewer. Returns the cells that just became invisible.
/// Counters never drop below zero.
pub fn decrease_visibility(grid: &mut HexGrid, from: usize, range: i32) -> Vec<usize> {
    let mut hidden = Vec::new();
    for index in visible_cells(grid, from, range) {
        let cell = &mut grid.cells[index];
        if cell.visibility > 0 {
            cell.visibility -= 1;
            if cell.visibility == 0 {
                hidden.push(index);
            }
        }
    }
    hidden
}

/// Zero every counter and re-apply each unit's vision. Explored flags
/// survive — exploration is permanent.
pub fn reset_visibility(grid: &mut HexGrid) {
    for cell in &mut grid.cells {
        cell.visibility = 0;
    }
    grid.visibility_reset_dirty = false;
    for i in 0..grid.units.len() {
        let location = grid.units[i].location;
        let range = grid.units[i].vision_range;
        increase_visibility(grid, location, range);
    }
}

/// Rebuild visibility if a terrain change invalidated it.
pub fn flush_pending_reset(grid: &mut HexGrid) {
    if grid.visibility_reset_dirty {
        reset_visibility(grid);
    }
}
