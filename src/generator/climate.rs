//! Climate simulation: evaporation, clouds, precipitation, runoff.
//!
//! A fixed number of cycles move moisture between cells. Water cells
//! evaporate into clouds, clouds precipitate and are blown onward with
//! a bias away from the wind direction, and surface moisture runs off
//! downhill (or seeps sideways) to neighbors. The result is a moisture
//! value per cell that drives river placement and terrain typing.

use crate::coords::HexDirection;
use crate::grid::HexGrid;

use super::GenerationConfig;

/// Cycles of the moisture loop. More stops changing the picture much.
const CLIMATE_CYCLES: u32 = 40;

#[derive(Clone, Copy, Debug, Default)]
struct ClimateData {
    clouds: f32,
    moisture: f32,
}

/// Run the climate loop and return the final moisture per cell.
pub fn simulate(grid: &HexGrid, config: &GenerationConfig) -> Vec<f32> {
    let cell_count = grid.cell_count();
    let mut climate = vec![
        ClimateData {
            clouds: 0.0,
            moisture: config.starting_moisture,
        };
        cell_count
    ];
    let mut next_climate = vec![ClimateData::default(); cell_count];

    for _ in 0..CLIMATE_CYCLES {
        for cell_index in 0..cell_count {
            evolve_climate(grid, config, cell_index, &mut climate, &mut next_climate);
        }
        std::mem::swap(&mut climate, &mut next_climate);
    }

    climate.iter().map(|data| data.moisture).collect()
}

fn evolve_climate(
    grid: &HexGrid,
    config: &GenerationConfig,
    cell_index: usize,
    climate: &mut [ClimateData],
    next_climate: &mut [ClimateData],
) {
    let cell = &grid.cells[cell_index];
    let mut cell_climate = climate[cell_index];

    if cell.is_underwater() {
        cell_climate.moisture = 1.0;
        cell_climate.clouds += config.evaporation_factor;
    } else {
        let evaporation = cell_climate.moisture * config.evaporation_factor;
        cell_climate.moisture -= evaporation;
        cell_climate.clouds += evaporation;
    }

    let precipitation = cell_climate.clouds * config.precipitation_factor;
    cell_climate.clouds -= precipitation;
    cell_climate.moisture += precipitation;

    // Thin air over high ground forces clouds to rain out.
    let cloud_maximum =
        1.0 - cell.view_elevation() as f32 / (config.elevation_maximum as f32 + 1.0);
    if cell_climate.clouds > cloud_maximum {
        cell_climate.moisture += cell_climate.clouds - cloud_maximum;
        cell_climate.clouds = cloud_maximum;
    }

    let main_dispersal_direction = config.wind_direction.opposite();
    let cloud_dispersal = cell_climate.clouds * (1.0 / (5.0 + config.wind_strength));
    let runoff = cell_climate.moisture * config.runoff_factor * (1.0 / 6.0);
    let seepage = cell_climate.moisture * config.seepage_factor * (1.0 / 6.0);

    for direction in HexDirection::all() {
        let Some(neighbor_index) = cell.neighbor(direction) else {
            continue;
        };
        let mut neighbor_climate = next_climate[neighbor_index];

        if direction == main_dispersal_direction {
            neighbor_climate.clouds += cloud_dispersal * config.wind_strength;
        } else {
            neighbor_climate.clouds += cloud_dispersal;
        }

        let elevation_delta =
            grid.cells[neighbor_index].view_elevation() - cell.view_elevation();
        if elevation_delta < 0 {
            cell_climate.moisture -= runoff;
            neighbor_climate.moisture += runoff;
        } else if elevation_delta == 0 {
            cell_climate.moisture -= seepage;
            neighbor_climate.moisture += seepage;
        }

        next_climate[neighbor_index] = neighbor_climate;
    }

    let mut next_cell_climate = next_climate[cell_index];
    next_cell_climate.moisture += cell_climate.moisture;
    if next_cell_climate.moisture > 1.0 {
        next_cell_climate.moisture = 1.0;
    }
    next_climate[cell_index] = next_cell_climate;
    climate[cell_index] = ClimateData::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn island_grid() -> (HexGrid, GenerationConfig) {
        let config = GenerationConfig::default();
        let mut grid = HexGrid::new(10, 10, false);
        for cell in &mut grid.cells {
            cell.water_level = config.water_level;
        }
        // A dry plateau in the middle of the sea.
        for z in 3..7 {
            for x in 3..7 {
                let i = (x + z * 10) as usize;
                grid.cells[i].elevation = 4;
            }
        }
        (grid, config)
    }

    #[test]
    fn test_moisture_stays_in_unit_range() {
        let (grid, config) = island_grid();
        let moisture = simulate(&grid, &config);
        for &m in &moisture {
            assert!((0.0..=1.0).contains(&m), "moisture {} out of range", m);
        }
    }

    #[test]
    fn test_underwater_cells_are_saturated() {
        let (grid, config) = island_grid();
        let moisture = simulate(&grid, &config);
        for (i, cell) in grid.cells.iter().enumerate() {
            if cell.is_underwater() {
                assert_eq!(moisture[i], 1.0);
            }
        }
    }

    #[test]
    fn test_land_near_water_is_wetter_than_starting_moisture() {
        let (grid, config) = island_grid();
        let moisture = simulate(&grid, &config);
        // Coastal plateau cell, adjacent to open sea.
        let coastal = 33usize;
        assert!(!grid.cells[coastal].is_underwater());
        assert!(moisture[coastal] > config.starting_moisture);
    }
}
