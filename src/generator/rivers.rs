//! River carving.
//!
//! Origins are drawn from a weighted lottery favoring wet, high cells.
//! Each river flows greedily downhill with a weighted random choice
//! among the valid descending directions (downhill strongly preferred,
//! sharp turns discouraged), merges into rivers it meets, and, when it
//! stalls in a hollow, turns the hollow into a lake so no river is ever
//! left dangling mid-slope.

use rand::Rng;

use crate::coords::HexDirection;
use crate::grid::HexGrid;

use super::{GenerationConfig, GenerationContext};

/// Carve rivers until the budget or the origin lottery runs dry.
/// Returns the unspent budget (a shortfall is a warning, not an error).
pub fn create_rivers(
    grid: &mut HexGrid,
    ctx: &mut GenerationContext,
    config: &GenerationConfig,
    moisture: &[f32],
    land_cells: i32,
) -> i32 {
    let mut river_origins = Vec::new();
    for i in 0..grid.cell_count() {
        let cell = &grid.cells[i];
        if cell.is_underwater() {
            continue;
        }
        let weight = moisture[i] * (cell.elevation - config.water_level) as f32
            / (config.elevation_maximum - config.water_level) as f32;
        // Multiple lottery tickets for promising origins.
        if weight > 0.75 {
            river_origins.push(i);
            river_origins.push(i);
        }
        if weight > 0.5 {
            river_origins.push(i);
        }
        if weight > 0.25 {
            river_origins.push(i);
        }
    }

    let mut river_budget =
        (land_cells as f32 * config.river_percentage as f32 * 0.01).round() as i32;

    while river_budget > 0 && !river_origins.is_empty() {
        let index = ctx.rng.gen_range(0..river_origins.len());
        let origin = river_origins.swap_remove(index);

        if grid.cells[origin].has_river() {
            continue;
        }
        let next_to_river_or_water = HexDirection::all().iter().any(|&direction| {
            grid.cells[origin].neighbor(direction).is_some_and(|n| {
                grid.cells[n].has_river() || grid.cells[n].is_underwater()
            })
        });
        if !next_to_river_or_water {
            river_budget -= create_river(grid, ctx, config, origin);
        }
    }

    if river_budget > 0 {
        eprintln!("Warning: failed to use up {} river budget", river_budget);
    }
    river_budget
}

/// Flow one river from `origin` to water, a merge, or a new lake.
/// Returns the number of cells it claimed.
fn create_river(
    grid: &mut HexGrid,
    ctx: &mut GenerationContext,
    config: &GenerationConfig,
    origin: usize,
) -> i32 {
    let mut length = 1;
    let mut cell = origin;
    let mut direction = HexDirection::NE;
    let mut flow_directions: Vec<HexDirection> = Vec::new();

    while !grid.cells[cell].is_underwater() {
        let mut min_neighbor_elevation = i32::MAX;
        flow_directions.clear();

        for d in HexDirection::all() {
            let Some(neighbor) = grid.cells[cell].neighbor(d) else {
                continue;
            };
            if grid.cells[neighbor].elevation < min_neighbor_elevation {
                min_neighbor_elevation = grid.cells[neighbor].elevation;
            }
            if neighbor == origin || grid.cells[neighbor].incoming_river.is_some() {
                continue;
            }
            let delta = grid.cells[neighbor].elevation - grid.cells[cell].elevation;
            if delta > 0 {
                continue;
            }
            // Merge into a river we bump into.
            if grid.cells[neighbor].outgoing_river.is_some() {
                grid.set_outgoing_river(cell, d);
                return length;
            }
            // Weight: downhill thrice, straight-ish once more, base once.
            if delta < 0 {
                flow_directions.push(d);
                flow_directions.push(d);
                flow_directions.push(d);
            }
            if length == 1 || (d != direction.next2() && d != direction.previous2()) {
                flow_directions.push(d);
            }
            flow_directions.push(d);
        }

        if flow_directions.is_empty() {
            if length == 1 {
                // Nowhere to go from the origin itself.
                return 0;
            }
            let elevation = grid.cells[cell].elevation;
            if min_neighbor_elevation >= elevation {
                // Landlocked: flood the hollow into a lake.
                grid.set_water_level(cell, min_neighbor_elevation);
                if min_neighbor_elevation == elevation {
                    grid.set_elevation(cell, min_neighbor_elevation - 1);
                }
            } else {
                // Lower neighbors exist but already carry rivers; pond
                // here so the river still ends in water.
                grid.set_water_level(cell, elevation);
                grid.set_elevation(cell, elevation - 1);
            }
            break;
        }

        direction = flow_directions[ctx.rng.gen_range(0..flow_directions.len())];
        grid.set_outgoing_river(cell, direction);
        length += 1;

        if min_neighbor_elevation >= grid.cells[cell].elevation
            && ctx.chance(config.extra_lake_probability)
        {
            let elevation = grid.cells[cell].elevation;
            grid.set_water_level(cell, elevation);
            grid.set_elevation(cell, elevation - 1);
        }

        cell = grid.cells[cell]
            .neighbor(direction)
            .expect("river flowed into a chosen neighbor");
    }
    length
}

#[cfg(test)]
mod tests {
    use super::super::{generate, GenerationConfig};
    use crate::grid::HexGrid;

    fn river_heavy_map(seed: u64) -> HexGrid {
        let mut grid = HexGrid::default();
        let config = GenerationConfig {
            use_fixed_seed: true,
            seed,
            river_percentage: 20,
            ..GenerationConfig::default()
        };
        generate(&mut grid, 30, 20, false, &config).unwrap();
        grid
    }

    #[test]
    fn test_rivers_never_flow_uphill() {
        let grid = river_heavy_map(11);
        for cell in &grid.cells {
            let Some(direction) = cell.outgoing_river else {
                continue;
            };
            let neighbor = cell.neighbor(direction).expect("river edge has a neighbor");
            let downstream = &grid.cells[neighbor];
            assert!(
                downstream.elevation <= cell.elevation
                    || downstream.elevation == cell.water_level,
                "river flows uphill at cell {}",
                cell.index
            );
        }
    }

    #[test]
    fn test_river_links_are_mutual_and_single() {
        let grid = river_heavy_map(12);
        for cell in &grid.cells {
            if let Some(direction) = cell.outgoing_river {
                let neighbor = cell.neighbor(direction).unwrap();
                assert_eq!(
                    grid.cells[neighbor].incoming_river,
                    Some(direction.opposite()),
                    "outgoing river at {} has no matching incoming",
                    cell.index
                );
            }
            if let Some(direction) = cell.incoming_river {
                let neighbor = cell.neighbor(direction).unwrap();
                assert_eq!(grid.cells[neighbor].outgoing_river, Some(direction.opposite()));
            }
        }
    }

    #[test]
    fn test_rivers_terminate_in_water_or_flow_on() {
        let grid = river_heavy_map(13);
        let mut river_cells = 0;
        for cell in &grid.cells {
            if cell.has_river() {
                river_cells += 1;
            }
            // A river that arrives but does not leave must have hit water.
            if cell.incoming_river.is_some() && cell.outgoing_river.is_none() {
                assert!(cell.is_underwater(), "dangling river at cell {}", cell.index);
            }
        }
        assert!(river_cells > 0, "expected some rivers on a 20%-river map");
    }

    #[test]
    fn test_no_rivers_when_percentage_is_zero() {
        let mut grid = HexGrid::default();
        let config = GenerationConfig {
            use_fixed_seed: true,
            seed: 5,
            river_percentage: 0,
            ..GenerationConfig::default()
        };
        generate(&mut grid, 20, 15, false, &config).unwrap();
        assert!(grid.cells.iter().all(|c| !c.has_river()));
    }
}
