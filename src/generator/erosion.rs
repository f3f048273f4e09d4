//! Erosion: diffusion smoothing of freshly raised terrain.
//!
//! A cell is erodible when some neighbor sits at least two levels
//! lower. Each erosion step moves exactly one elevation unit from an
//! erodible cell to a random lower target, so the total elevation is
//! conserved and cliffs soften into slopes. The loop runs until the
//! erodible population falls to the configured share of its starting
//! size, which bounds the work and guarantees termination.

use rand::Rng;

use crate::coords::HexDirection;
use crate::grid::HexGrid;

use super::{GenerationConfig, GenerationContext};

pub fn erode_land(grid: &mut HexGrid, ctx: &mut GenerationContext, config: &GenerationConfig) {
    let mut erodible: Vec<usize> = (0..grid.cell_count())
        .filter(|&i| is_erodible(grid, i))
        .collect();

    let target_erodible_count =
        (erodible.len() as i32 * (100 - config.erosion_percentage) / 100) as usize;

    while erodible.len() > target_erodible_count {
        let index = ctx.rng.gen_range(0..erodible.len());
        let cell = erodible[index];
        let Some(target) = erosion_target(grid, ctx, cell) else {
            // Stale entry; drop it.
            erodible.swap_remove(index);
            continue;
        };

        grid.cells[cell].elevation -= 1;
        grid.cells[target].elevation += 1;

        if !is_erodible(grid, cell) {
            erodible.swap_remove(index);
        }

        // Lowering the cell can make its uphill neighbors erodible.
        for direction in HexDirection::all() {
            let Some(neighbor) = grid.cells[cell].neighbor(direction) else {
                continue;
            };
            if grid.cells[neighbor].elevation == grid.cells[cell].elevation + 2
                && !erodible.contains(&neighbor)
            {
                erodible.push(neighbor);
            }
        }

        if is_erodible(grid, target) && !erodible.contains(&target) {
            erodible.push(target);
        }

        // Raising the target can flatten its neighbors' drop.
        for direction in HexDirection::all() {
            let Some(neighbor) = grid.cells[target].neighbor(direction) else {
                continue;
            };
            if neighbor != cell
                && grid.cells[neighbor].elevation == grid.cells[target].elevation + 1
                && !is_erodible(grid, neighbor)
            {
                if let Some(position) = erodible.iter().position(|&c| c == neighbor) {
                    erodible.swap_remove(position);
                }
            }
        }
    }
}

fn is_erodible(grid: &HexGrid, index: usize) -> bool {
    let erodible_limit = grid.cells[index].elevation - 2;
    HexDirection::all().iter().any(|&direction| {
        grid.cells[index]
            .neighbor(direction)
            .is_some_and(|n| grid.cells[n].elevation <= erodible_limit)
    })
}

/// Uniformly random neighbor at least two levels lower.
fn erosion_target(grid: &HexGrid, ctx: &mut GenerationContext, index: usize) -> Option<usize> {
    let erodible_limit = grid.cells[index].elevation - 2;
    let candidates: Vec<usize> = HexDirection::all()
        .iter()
        .filter_map(|&direction| grid.cells[index].neighbor(direction))
        .filter(|&n| grid.cells[n].elevation <= erodible_limit)
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[ctx.rng.gen_range(0..candidates.len())])
    }
}
