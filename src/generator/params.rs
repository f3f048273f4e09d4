//! Map generation parameters.

use serde::{Deserialize, Serialize};

use crate::coords::HexDirection;

/// Everything that shapes one generated map. Serializable so presets
/// can be kept in JSON files and loaded by the CLI.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chance that a frontier cell gets a +1 heuristic, roughening
    /// chunk outlines (0.0-0.5).
    pub jitter_probability: f32,
    /// Smallest raised/sunk chunk, in cells.
    pub chunk_size_min: i32,
    /// Largest raised/sunk chunk, in cells.
    pub chunk_size_max: i32,
    /// Share of cells that should end up at or above water level (5-95).
    pub land_percentage: i32,
    /// Global water level (1-5).
    pub water_level: i32,
    /// Chance a chunk rises two levels instead of one.
    pub high_rise_probability: f32,
    /// Chance a chunk sinks instead of rising.
    pub sink_probability: f32,
    pub elevation_minimum: i32,
    pub elevation_maximum: i32,
    /// Land-free margin at the west/east map edges (ignored when wrapping).
    pub map_border_x: i32,
    /// Land-free margin at the south/north map edges.
    pub map_border_z: i32,
    /// Gap between regions, and the x margin on wrapping maps.
    pub region_border: i32,
    /// Number of separate landmass regions (1-4).
    pub region_count: i32,
    /// Share of erodible cells that erosion smooths away (0-100).
    pub erosion_percentage: i32,

    /// Moisture all land starts with.
    pub starting_moisture: f32,
    pub evaporation_factor: f32,
    pub precipitation_factor: f32,
    pub runoff_factor: f32,
    pub seepage_factor: f32,
    /// Direction the wind blows from.
    pub wind_direction: HexDirection,
    /// How strongly dispersal favors the wind direction (1-10).
    pub wind_strength: f32,

    /// Share of land cells carrying a river (0-20).
    pub river_percentage: i32,
    /// Chance a river digs an extra lake where the terrain allows one.
    pub extra_lake_probability: f32,

    /// Reuse `seed` instead of drawing a fresh one.
    pub use_fixed_seed: bool,
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            jitter_probability: 0.25,
            chunk_size_min: 30,
            chunk_size_max: 100,
            land_percentage: 50,
            water_level: 3,
            high_rise_probability: 0.25,
            sink_probability: 0.2,
            elevation_minimum: -2,
            elevation_maximum: 8,
            map_border_x: 5,
            map_border_z: 5,
            region_border: 5,
            region_count: 1,
            erosion_percentage: 50,
            starting_moisture: 0.1,
            evaporation_factor: 0.5,
            precipitation_factor: 0.25,
            runoff_factor: 0.25,
            seepage_factor: 0.125,
            wind_direction: HexDirection::NW,
            wind_strength: 4.0,
            river_percentage: 10,
            extra_lake_probability: 0.25,
            use_fixed_seed: false,
            seed: 0,
        }
    }
}
