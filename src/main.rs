use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use hexworld::ascii::{self, AsciiMode};
use hexworld::coords::HexCoordinates;
use hexworld::generator::{self, GenerationConfig};
use hexworld::grid::HexGrid;
use hexworld::persist;
use hexworld::search;
use hexworld::unit::Traveler;

#[derive(Parser, Debug)]
#[command(name = "hexworld")]
#[command(about = "Generate, inspect, and route across procedural hex maps")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new map
    Generate {
        /// Width of the map in cells (multiple of 5)
        #[arg(short = 'W', long, default_value = "40")]
        width: i32,

        /// Height of the map in cells (multiple of 5)
        #[arg(short = 'H', long, default_value = "30")]
        height: i32,

        /// Random seed (uses random seed if not specified)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Wrap the map east-west
        #[arg(long)]
        wrapping: bool,

        /// JSON file with generation parameters
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the generated map to a save file
        #[arg(short = 'o', long)]
        save: Option<PathBuf>,

        /// Print the generated map as ASCII
        #[arg(long)]
        preview: bool,

        /// Preview elevation instead of terrain
        #[arg(long)]
        heights: bool,
    },

    /// Load a save file and print it as ASCII
    Show {
        /// Save file to load
        file: PathBuf,

        /// Show elevation instead of terrain
        #[arg(long)]
        heights: bool,
    },

    /// Load a save file and find a route between two cells
    Path {
        /// Save file to load
        file: PathBuf,

        /// Start cell offset coordinates, as x,z
        #[arg(long, value_delimiter = ',', num_args = 2)]
        from: Vec<i32>,

        /// Destination cell offset coordinates, as x,z
        #[arg(long, value_delimiter = ',', num_args = 2)]
        to: Vec<i32>,

        /// Movement budget per turn
        #[arg(long, default_value = "24")]
        speed: i32,
    },
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::Generate {
            width,
            height,
            seed,
            wrapping,
            config,
            save,
            preview,
            heights,
        } => generate(width, height, seed, wrapping, config, save, preview, heights),
        Command::Show { file, heights } => show(file, heights),
        Command::Path {
            file,
            from,
            to,
            speed,
        } => route(file, &from, &to, speed),
    }
}

#[allow(clippy::too_many_arguments)]
fn generate(
    width: i32,
    height: i32,
    seed: Option<u64>,
    wrapping: bool,
    config_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    preview: bool,
    heights: bool,
) -> Result<(), Box<dyn Error>> {
    let mut config = match config_path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = seed {
        config.use_fixed_seed = true;
        config.seed = seed;
    }

    println!("Map size: {}x{} (wrapping: {})", width, height, wrapping);
    println!("Generating map...");
    let mut grid = HexGrid::default();
    let report = generator::generate(&mut grid, width, height, wrapping, &config)?;

    println!("Seed: {}", report.seed);
    let total = grid.cell_count() as f64;
    println!(
        "Land: {} cells ({:.1}%)",
        report.land_cells,
        100.0 * report.land_cells as f64 / total
    );
    let river_cells = grid.cells.iter().filter(|c| c.has_river()).count();
    println!("Rivers: {} cells", river_cells);

    if preview {
        let mode = if heights {
            AsciiMode::Height
        } else {
            AsciiMode::Terrain
        };
        print!("{}", ascii::render_map(&grid, mode));
        if mode == AsciiMode::Terrain {
            print!("{}", ascii::terrain_legend());
        }
    }

    if let Some(path) = save_path {
        persist::save_file(&grid, &path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn show(file: PathBuf, heights: bool) -> Result<(), Box<dyn Error>> {
    let mut grid = HexGrid::default();
    persist::load_file(&mut grid, &file)?;
    println!(
        "Map {}x{} (wrapping: {}), {} units",
        grid.cell_count_x,
        grid.cell_count_z,
        grid.wrapping,
        grid.units.len()
    );
    let mode = if heights {
        AsciiMode::Height
    } else {
        AsciiMode::Terrain
    };
    print!("{}", ascii::render_map(&grid, mode));
    Ok(())
}

fn route(file: PathBuf, from: &[i32], to: &[i32], speed: i32) -> Result<(), Box<dyn Error>> {
    let mut grid = HexGrid::default();
    persist::load_file(&mut grid, &file)?;

    let from = cell_at_offset(&grid, from)?;
    let to = cell_at_offset(&grid, to)?;

    if !search::find_path(&mut grid, from, to, Traveler { speed }) {
        println!("No path.");
        return Ok(());
    }
    let path = search::get_path(&grid).ok_or("path vanished after a successful search")?;
    let cost = search::path_cost(&grid).ok_or("path vanished after a successful search")?;
    println!(
        "Path: {} cells, cost {} ({} turns at speed {})",
        path.len(),
        cost,
        (cost - 1) / speed + 1,
        speed
    );
    print!("{}", ascii::render_path(&grid, &path));
    Ok(())
}

fn cell_at_offset(grid: &HexGrid, offset: &[i32]) -> Result<usize, Box<dyn Error>> {
    let coordinates = HexCoordinates::from_offset(offset[0], offset[1]);
    grid.cell_index_at(coordinates)
        .ok_or_else(|| format!("offset coordinates {},{} are outside the map", offset[0], offset[1]).into())
}
