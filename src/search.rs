//! Turn-based path search over the grid.
//!
//! A* with the grid's shared bucket queue: edge costs come from roads,
//! slopes, features, and walls; the admissible heuristic is the wrapped
//! hex distance to the goal. Distances are turn-based — a traveler's
//! speed caps movement per turn, and entering a new turn rounds the
//! label up to the turn boundary before adding the step cost.
//!
//! "No path" is a normal outcome, reported as `false` / `None`.

use crate::cell::{edge_type, HexCell, HexEdgeType};
use crate::coords::HexDirection;
use crate::grid::HexGrid;
use crate::unit::Traveler;

/// Cost of entering `to` from `from` across `direction`, or `None` when
/// the edge is impassable (cliff, or a wall without a road through it).
pub fn move_cost(from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32> {
    let edge = edge_type(from.elevation, to.elevation);
    if edge == HexEdgeType::Cliff {
        return None;
    }
    if from.has_road_through_edge(direction) {
        return Some(1);
    }
    if from.walled != to.walled {
        return None;
    }
    let base = if edge == HexEdgeType::Flat { 5 } else { 10 };
    Some(base + to.urban_level + to.farm_level + to.plant_level)
}

/// A land traveler can stand here: dry and unoccupied.
pub fn is_valid_destination(cell: &HexCell) -> bool {
    !cell.is_underwater() && cell.unit.is_none()
}

/// Search for a path and remember it on the grid. Any previous path is
/// discarded first (last request wins). Returns whether a path exists;
/// retrieve it with [`get_path`] and its cost with [`path_cost`].
pub fn find_path(grid: &mut HexGrid, from: usize, to: usize, traveler: Traveler) -> bool {
    clear_path(grid);
    grid.current_path_from = from;
    grid.current_path_to = to;
    grid.current_path_exists = search(grid, from, to, traveler);
    if grid.current_path_exists {
        grid.current_path_cost = grid.cells[to].distance;
    }
    grid.current_path_exists
}

fn search(grid: &mut HexGrid, from: usize, to: usize, traveler: Traveler) -> bool {
    let speed = traveler.speed;
    grid.search_frontier_phase += 2;
    let phase = grid.search_frontier_phase;
    let wrap_size = grid.wrap_size();
    let to_coordinates = grid.cells[to].coordinates;

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
            // Count and buckets disagree; abort rather than spin.
            break;
        };
        cells[current].search_phase += 1;

        if current == to {
            return true;
        }

        let current_turn = (cells[current].distance - 1) / speed;

        for direction in HexDirection::all() {
            let Some(neighbor) = cells[current].neighbor(direction) else {
                continue;
            };
            if cells[neighbor].search_phase > phase {
                continue; // settled
            }
            if !is_valid_destination(&cells[neighbor]) {
                continue;
            }
            let Some(cost) = move_cost(&cells[current], &cells[neighbor], direction) else {
                continue;
            };

            let mut distance = cells[current].distance + cost;
            let turn = (distance - 1) / speed;
            if turn > current_turn {
                // The step does not fit in the current turn; the
                // remainder of the turn is forfeit.
                distance = turn * speed + cost;
            }

            if cells[neighbor].search_phase < phase {
                cells[neighbor].search_phase = phase;
                cells[neighbor].distance = distance;
                cells[neighbor].path_from = current;
                cells[neighbor].search_heuristic = cells[neighbor]
                    .coordinates
                    .wrapped_distance_to(to_coordinates, wrap_size);
                search_frontier.enqueue(cells, neighbor);
            } else if distance < cells[neighbor].distance {
                let old_priority = cells[neighbor].search_priority();
                cells[neighbor].distance = distance;
                cells[neighbor].path_from = current;
                search_frontier.change(cells, neighbor, old_priority);
            }
        }
    }
    false
}

/// The current path as arena indices from start to goal, or `None`.
pub fn get_path(grid: &HexGrid) -> Option<Vec<usize>> {
    if !grid.current_path_exists {
        return None;
    }
    let mut path = Vec::new();
    let mut current = grid.current_path_to;
    while current != grid.current_path_from {
        path.push(current);
        current = grid.cells[current].path_from;
    }
    path.push(grid.current_path_from);
    path.reverse();
    Some(path)
}

/// Turn-based cost of the current path, or `None` without one.
pub fn path_cost(grid: &HexGrid) -> Option<i32> {
    if grid.current_path_exists {
        Some(grid.current_path_cost)
    } else {
        None
    }
}

pub fn clear_path(grid: &mut HexGrid) {
    grid.current_path_exists = false;
    grid.current_path_cost = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::HexCoordinates;
    use std::collections::VecDeque;

    fn traveler(speed: i32) -> Traveler {
        Traveler { speed }
    }

    fn index_of(grid: &HexGrid, x: i32, z: i32) -> usize {
        grid.cell_index_at(HexCoordinates::from_offset(x, z)).unwrap()
    }

    /// Plain BFS hop count over passable cells, for optimality checks.
    fn bfs_hops(grid: &HexGrid, from: usize, to: usize) -> Option<usize> {
        let mut seen = vec![false; grid.cell_count()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back((from, 0));
        while let Some((current, hops)) = queue.pop_front() {
            if current == to {
                return Some(hops);
            }
            for direction in HexDirection::all() {
                if let Some(neighbor) = grid.cells[current].neighbor(direction) {
                    if !seen[neighbor] && is_valid_destination(&grid.cells[neighbor]) {
                        seen[neighbor] = true;
                        queue.push_back((neighbor, hops + 1));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn test_path_on_uniform_grid_matches_hex_distance() {
        let mut grid = HexGrid::new(3, 3, false);
        let from = index_of(&grid, 0, 0);
        let to = index_of(&grid, 2, 2);
        let expected_steps = grid.distance_between(from, to);

        let walker = crate::unit::HexUnit::new();
        assert!(find_path(&mut grid, from, to, walker.traveler()));
        let path = get_path(&grid).unwrap();
        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        assert_eq!(path.len() as i32, expected_steps + 1);
        assert_eq!(path_cost(&grid), Some(expected_steps * 5));
    }

    #[test]
    fn test_paths_are_optimal_against_bfs() {
        let mut grid = HexGrid::new(5, 5, false);
        for from in 0..grid.cell_count() {
            for to in 0..grid.cell_count() {
                let hops = bfs_hops(&grid, from, to).unwrap();
                assert!(find_path(&mut grid, from, to, traveler(100)));
                let path = get_path(&grid).unwrap();
                assert_eq!(path.len(), hops + 1, "from {} to {}", from, to);
            }
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let mut grid = HexGrid::new(5, 5, false);
        assert!(find_path(&mut grid, 12, 12, traveler(24)));
        assert_eq!(get_path(&grid), Some(vec![12]));
        assert_eq!(path_cost(&grid), Some(0));
    }

    #[test]
    fn test_underwater_cells_never_appear_on_a_path() {
        let mut grid = HexGrid::new(5, 5, false);
        // Flood the middle column, leaving a gap nowhere.
        for z in 0..5 {
            let i = index_of(&grid, 2, z);
            grid.set_water_level(i, 2);
        }
        let from = index_of(&grid, 0, 2);
        let to = index_of(&grid, 4, 2);
        assert!(!find_path(&mut grid, from, to, traveler(24)));
        assert_eq!(get_path(&grid), None);

        // Drain one crossing; the path must use exactly that cell.
        let ford = index_of(&grid, 2, 4);
        grid.set_water_level(ford, 0);
        assert!(find_path(&mut grid, from, to, traveler(24)));
        let path = get_path(&grid).unwrap();
        for &step in &path {
            assert!(!grid.cells[step].is_underwater());
        }
        assert!(path.contains(&ford));
    }

    #[test]
    fn test_cliffs_block_movement() {
        let mut grid = HexGrid::new(5, 5, false);
        // Wall of elevation 3 across the middle row.
        for x in 0..5 {
            let i = index_of(&grid, x, 2);
            grid.set_elevation(i, 3);
        }
        let from = index_of(&grid, 2, 0);
        let to = index_of(&grid, 2, 4);
        assert!(!find_path(&mut grid, from, to, traveler(24)));
    }

    #[test]
    fn test_roads_are_cheap_and_slopes_expensive() {
        let mut grid = HexGrid::new(5, 5, false);
        let a = index_of(&grid, 1, 2);
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();

        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), Some(5));

        grid.set_elevation(b, 1);
        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), Some(10));

        grid.add_road(a, HexDirection::E);
        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), Some(1));
    }

    #[test]
    fn test_features_add_cost_and_walls_block() {
        let mut grid = HexGrid::new(5, 5, false);
        let a = index_of(&grid, 1, 2);
        let b = grid.cells[a].neighbor(HexDirection::E).unwrap();

        grid.cells[b].urban_level = 2;
        grid.cells[b].farm_level = 1;
        grid.cells[b].plant_level = 1;
        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), Some(9));

        grid.set_walled(b, true);
        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), None);

        // A road through the wall line opens it again.
        grid.add_road(a, HexDirection::E);
        assert_eq!(move_cost(&grid.cells[a], &grid.cells[b], HexDirection::E), Some(1));
    }

    #[test]
    fn test_occupied_cells_are_not_entered() {
        let mut grid = HexGrid::new(5, 5, false);
        let blocker = index_of(&grid, 2, 2);
        grid.add_unit(crate::unit::HexUnit::new(), blocker, 0.0).unwrap();

        let from = index_of(&grid, 0, 2);
        let to = index_of(&grid, 4, 2);
        assert!(find_path(&mut grid, from, to, traveler(24)));
        let path = get_path(&grid).unwrap();
        assert!(!path.contains(&blocker));
    }

    #[test]
    fn test_turn_boundary_rounds_distance_up() {
        // Speed 8 with uniform step cost 5: the second step does not
        // fit into turn 0, so its label jumps to 8 + 5.
        let mut grid = HexGrid::new(5, 5, false);
        let from = index_of(&grid, 0, 2);
        let mid = index_of(&grid, 2, 2);
        let to = index_of(&grid, 3, 2);

        assert!(find_path(&mut grid, from, mid, traveler(8)));
        assert_eq!(path_cost(&grid), Some(13));

        assert!(find_path(&mut grid, from, to, traveler(8)));
        assert_eq!(path_cost(&grid), Some(21));
    }

    #[test]
    fn test_new_search_supersedes_previous_path() {
        let mut grid = HexGrid::new(5, 5, false);
        let a = index_of(&grid, 0, 0);
        let b = index_of(&grid, 4, 4);
        let c = index_of(&grid, 4, 0);

        assert!(find_path(&mut grid, a, b, traveler(24)));
        assert!(find_path(&mut grid, a, c, traveler(24)));
        let path = get_path(&grid).unwrap();
        assert_eq!(path.last(), Some(&c));

        clear_path(&mut grid);
        assert_eq!(get_path(&grid), None);
        assert_eq!(path_cost(&grid), None);
    }

    #[test]
    fn test_wrapping_map_paths_across_the_seam() {
        let mut grid = HexGrid::new(10, 5, true);
        let from = index_of(&grid, 0, 2);
        let to = index_of(&grid, 9, 2);
        assert!(find_path(&mut grid, from, to, traveler(100)));
        let path = get_path(&grid).unwrap();
        // One step across the seam, not nine across the map.
        assert_eq!(path.len(), 2);
    }
}
