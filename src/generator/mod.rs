//! Procedural map generation.
//!
//! The pipeline runs in fixed stages over a freshly created grid:
//! regions, land raising/sinking, erosion, climate, rivers, terrain
//! typing. Land chunks grow as budgeted priority floods seeded from
//! random region cells, reusing the grid's shared search frontier with
//! a jittered heuristic so the shapes come out organic rather than
//! circular. Budgets that cannot be spent within the retry guard are
//! reported as warnings and the partial map is kept.

pub mod climate;
pub mod erosion;
pub mod params;
pub mod rivers;
pub mod terrain;

pub use params::GenerationConfig;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::coords::HexDirection;
use crate::grid::{HexGrid, MapError};

/// Retry guard for the land budget loop.
const LAND_GUARD_LIMIT: u32 = 10_000;

/// Randomness for a single generation run. Owns its own seeded RNG;
/// nothing about generation is process-global.
pub struct GenerationContext {
    pub seed: u64,
    pub rng: ChaCha8Rng,
}

impl GenerationContext {
    pub fn new(seed: u64) -> GenerationContext {
        GenerationContext {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Roll against a probability in [0, 1].
    pub fn chance(&mut self, probability: f32) -> bool {
        self.rng.gen::<f32>() < probability
    }
}

/// Rectangular slice of the grid that land chunks are seeded into.
#[derive(Clone, Copy, Debug)]
pub struct MapRegion {
    pub x_min: i32,
    pub x_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

/// What a generation run did, for logging and tests.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    /// Seed actually used (drawn fresh unless the config fixed it).
    pub seed: u64,
    /// Cells the land budget managed to turn into land.
    pub land_cells: i32,
    /// Land budget left unspent after the retry guard, if any.
    pub unspent_land_budget: i32,
    /// River budget left unspent after origins ran out, if any.
    pub unspent_river_budget: i32,
}

/// Generate a complete map into `grid`. Replaces the current map; on a
/// dimension error the old map is untouched.
pub fn generate(
    grid: &mut HexGrid,
    x: i32,
    z: i32,
    wrapping: bool,
    config: &GenerationConfig,
) -> Result<GenerationReport, MapError> {
    let seed = if config.use_fixed_seed {
        config.seed
    } else {
        rand::random()
    };
    let mut ctx = GenerationContext::new(seed);

    grid.create_map(x, z, wrapping)?;

    for i in 0..grid.cell_count() {
        grid.cells[i].water_level = config.water_level;
    }

    let regions = create_regions(grid, &mut ctx, config);
    let (land_cells, unspent_land_budget) = create_land(grid, &mut ctx, config, &regions);
    erosion::erode_land(grid, &mut ctx, config);
    let moisture = climate::simulate(grid, config);
    let unspent_river_budget = rivers::create_rivers(grid, &mut ctx, config, &moisture, land_cells);
    terrain::set_terrain_types(grid, &moisture);

    Ok(GenerationReport {
        seed,
        land_cells,
        unspent_land_budget,
        unspent_river_budget,
    })
}

/// Carve the map into 1-4 seeding regions, kept off the map borders
/// and separated by the region border.
fn create_regions(grid: &HexGrid, ctx: &mut GenerationContext, config: &GenerationConfig) -> Vec<MapRegion> {
    // Wrapping maps have no east-west edge to keep clear.
    let border_x = if grid.wrapping {
        config.region_border
    } else {
        config.map_border_x
    };
    let border_z = config.map_border_z;
    let count_x = grid.cell_count_x;
    let count_z = grid.cell_count_z;

    let mut regions = Vec::new();
    match config.region_count {
        2 => {
            if ctx.chance(0.5) {
                regions.push(MapRegion {
                    x_min: border_x,
                    x_max: count_x / 2 - config.region_border,
                    z_min: border_z,
                    z_max: count_z - border_z,
                });
                regions.push(MapRegion {
                    x_min: count_x / 2 + config.region_border,
                    x_max: count_x - border_x,
                    z_min: border_z,
                    z_max: count_z - border_z,
                });
            } else {
                regions.push(MapRegion {
                    x_min: border_x,
                    x_max: count_x - border_x,
                    z_min: border_z,
                    z_max: count_z / 2 - config.region_border,
                });
                regions.push(MapRegion {
                    x_min: border_x,
                    x_max: count_x - border_x,
                    z_min: count_z / 2 + config.region_border,
                    z_max: count_z - border_z,
                });
            }
        }
        3 => {
            for third in 0..3 {
                regions.push(MapRegion {
                    x_min: count_x * third / 3 + if third > 0 { config.region_border } else { border_x },
                    x_max: count_x * (third + 1) / 3
                        - if third < 2 { config.region_border } else { border_x },
                    z_min: border_z,
                    z_max: count_z - border_z,
                });
            }
        }
        4 => {
            for &(left, bottom) in &[(true, true), (false, true), (false, false), (true, false)] {
                regions.push(MapRegion {
                    x_min: if left { border_x } else { count_x / 2 + config.region_border },
                    x_max: if left { count_x / 2 - config.region_border } else { count_x - border_x },
                    z_min: if bottom { border_z } else { count_z / 2 + config.region_border },
                    z_max: if bottom { count_z / 2 - config.region_border } else { count_z - border_z },
                });
            }
        }
        _ => {
            regions.push(MapRegion {
                x_min: border_x,
                x_max: count_x - border_x,
                z_min: border_z,
                z_max: count_z - border_z,
            });
        }
    }
    regions
}

/// Spend the land budget by raising (sometimes sinking) random chunks
/// until it runs out or the retry guard trips.
fn create_land(
    grid: &mut HexGrid,
    ctx: &mut GenerationContext,
    config: &GenerationConfig,
    regions: &[MapRegion],
) -> (i32, i32) {
    let cell_count = grid.cell_count() as f32;
    let mut land_budget = (cell_count * config.land_percentage as f32 * 0.01).round() as i32;
    let mut land_cells = land_budget;

    let mut guard = 0;
    'spending: while guard < LAND_GUARD_LIMIT {
        guard += 1;
        let sink = ctx.chance(config.sink_probability);
        for region in regions {
            let chunk_size = ctx.rng.gen_range(config.chunk_size_min..=config.chunk_size_max);
            if sink {
                land_budget = sink_terrain(grid, ctx, config, region, chunk_size, land_budget);
            } else {
                land_budget = raise_terrain(grid, ctx, config, region, chunk_size, land_budget);
                if land_budget == 0 {
                    break 'spending;
                }
            }
        }
    }
    if land_budget > 0 {
        eprintln!("Warning: failed to use up {} land budget", land_budget);
        land_cells -= land_budget;
    }
    (land_cells, land_budget)
}

/// Grow one chunk upward from a random seed cell: a budgeted priority
/// flood over the shared frontier, jittered to roughen the outline.
fn raise_terrain(
    grid: &mut HexGrid,
    ctx: &mut GenerationContext,
    config: &GenerationConfig,
    region: &MapRegion,
    chunk_size: i32,
    mut budget: i32,
) -> i32 {
    grid.search_frontier_phase += 1;
    let phase = grid.search_frontier_phase;
    let wrap_size = grid.wrap_size();
    let first = random_cell(grid, ctx, region);

    let rise = if ctx.chance(config.high_rise_probability) { 2 } else { 1 };

    let HexGrid {
        cells,
        search_frontier,
        ..
    } = grid;
    cells[first].search_phase = phase;
    cells[first].distance = 0;
    cells[first].search_heuristic = 0;
    search_frontier.enqueue(cells, first);
    let center = cells[first].coordinates;

    let mut size = 0;
    while size < chunk_size && search_frontier.count() > 0 {
        let Some(current) = search_frontier.dequeue(cells) else {
            break;
        };
        let original_elevation = cells[current].elevation;
        let new_elevation = original_elevation + rise;
        if new_elevation > config.elevation_maximum {
            // Clamp by skipping this cell; the chunk keeps growing.
            continue;
        }
        cells[current].elevation = new_elevation;
        if original_elevation < config.water_level
            && new_elevation >= config.water_level
        {
            budget -= 1;
            if budget == 0 {
                break;
            }
        }
        size += 1;

        for direction in HexDirection::all() {
            let Some(neighbor) = cells[current].neighbor(direction) else {
                continue;
            };
            if cells[neighbor].search_phase < phase {
                cells[neighbor].search_phase = phase;
                cells[neighbor].distance =
                    cells[neighbor].coordinates.wrapped_distance_to(center, wrap_size);
                cells[neighbor].search_heuristic =
                    if ctx.chance(config.jitter_probability) { 1 } else { 0 };
                search_frontier.enqueue(cells, neighbor);
            }
        }
    }
    search_frontier.clear();
    budget
}

/// Mirror image of [`raise_terrain`]: lowers a chunk, refunding budget
/// for every cell that sinks below the water level.
fn sink_terrain(
    grid: &mut HexGrid,
    ctx: &mut GenerationContext,
    config: &GenerationConfig,
    region: &MapRegion,
    chunk_size: i32,
    mut budget: i32,
) -> i32 {
    grid.search_frontier_phase += 1;
    let phase = grid.search_frontier_phase;
    let wrap_size = grid.wrap_size();
    let first = random_cell(grid, ctx, region);

    let sink = if ctx.chance(config.high_rise_probability) { 2 } else { 1 };

    let HexGrid {
        cells,
        search_frontier,
        ..
    } = grid;
    cells[first].search_phase = phase;
    cells[first].distance = 0;
    cells[first].search_heuristic = 0;
    search_frontier.enqueue(cells, first);
    let center = cells[first].coordinates;

    let mut size = 0;
    while size < chunk_size && search_frontier.count() > 0 {
        let Some(current) = search_frontier.dequeue(cells) else {
            break;
        };
        let original_elevation = cells[current].elevation;
        let new_elevation = original_elevation - sink;
        if new_elevation < config.elevation_minimum {
            continue;
        }
        cells[current].elevation = new_elevation;
        if original_elevation >= config.water_level
            && new_elevation < config.water_level
        {
            budget += 1;
        }
        size += 1;

        for direction in HexDirection::all() {
            let Some(neighbor) = cells[current].neighbor(direction) else {
                continue;
            };
            if cells[neighbor].search_phase < phase {
                cells[neighbor].search_phase = phase;
                cells[neighbor].distance =
                    cells[neighbor].coordinates.wrapped_distance_to(center, wrap_size);
                cells[neighbor].search_heuristic =
                    if ctx.chance(config.jitter_probability) { 1 } else { 0 };
                search_frontier.enqueue(cells, neighbor);
            }
        }
    }
    search_frontier.clear();
    budget
}

fn random_cell(grid: &HexGrid, ctx: &mut GenerationContext, region: &MapRegion) -> usize {
    let x = if region.x_max > region.x_min {
        ctx.rng.gen_range(region.x_min..region.x_max)
    } else {
        region.x_min
    };
    let z = if region.z_max > region.z_min {
        ctx.rng.gen_range(region.z_min..region.z_max)
    } else {
        region.z_min
    };
    (x + z * grid.cell_count_x) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_config(seed: u64) -> GenerationConfig {
        GenerationConfig {
            use_fixed_seed: true,
            seed,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_generation_rejects_bad_dimensions() {
        let mut grid = HexGrid::default();
        assert!(generate(&mut grid, 7, 5, false, &fixed_config(1)).is_err());
    }

    #[test]
    fn test_land_budget_is_mostly_spent() {
        // 20x15 at 50% land: allow a 10% shortfall for partial budgets.
        let mut grid = HexGrid::default();
        let config = fixed_config(12345);
        let report = generate(&mut grid, 20, 15, false, &config).unwrap();

        let land = grid
            .cells
            .iter()
            .filter(|c| c.elevation >= config.water_level)
            .count();
        let minimum = (20.0 * 15.0 * 0.5 * 0.9) as usize;
        assert!(land >= minimum, "only {} of {} land cells", land, minimum);
        assert!(report.land_cells as usize >= minimum);
    }

    #[test]
    fn test_elevation_stays_clamped() {
        let mut grid = HexGrid::default();
        let config = fixed_config(99);
        generate(&mut grid, 20, 15, false, &config).unwrap();
        for cell in &grid.cells {
            assert!(cell.elevation >= config.elevation_minimum);
            assert!(cell.elevation <= config.elevation_maximum);
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let config = fixed_config(2024);
        let mut a = HexGrid::default();
        let mut b = HexGrid::default();
        let ra = generate(&mut a, 20, 15, false, &config).unwrap();
        let rb = generate(&mut b, 20, 15, false, &config).unwrap();
        assert_eq!(ra.seed, rb.seed);
        for (ca, cb) in a.cells.iter().zip(&b.cells) {
            assert_eq!(ca.elevation, cb.elevation);
            assert_eq!(ca.terrain_type_index, cb.terrain_type_index);
            assert_eq!(ca.incoming_river, cb.incoming_river);
            assert_eq!(ca.outgoing_river, cb.outgoing_river);
        }
    }

    #[test]
    fn test_multiple_regions_fit_on_the_map() {
        for region_count in 1..=4 {
            let config = GenerationConfig {
                region_count,
                ..fixed_config(7)
            };
            let mut grid = HexGrid::default();
            generate(&mut grid, 40, 30, false, &config).unwrap();
        }
    }

    #[test]
    fn test_wrapping_map_generates() {
        let mut grid = HexGrid::default();
        generate(&mut grid, 40, 30, true, &fixed_config(3)).unwrap();
        assert!(grid.wrapping);
    }
}
