//! Versioned binary save format.
//!
//! Everything is little-endian. The stream starts with an `i32` format
//! version; older versions simply omit trailing fields, so the loader
//! reads what the version provides and falls back to defaults for the
//! rest. The version check happens before any grid mutation, so a
//! rejected save leaves the current map intact.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::coords::{HexCoordinates, HexDirection};
use crate::grid::{HexGrid, MapError};
use crate::unit::HexUnit;

/// Format version written by [`save`].
pub const CURRENT_VERSION: i32 = 5;

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_f32<W: Write>(writer: &mut W, value: f32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// River edge as one byte: direction + 128, or 0 for no river.
fn river_byte(river: Option<HexDirection>) -> u8 {
    match river {
        Some(direction) => direction.index() as u8 + 128,
        None => 0,
    }
}

fn river_from_byte(byte: u8) -> Option<HexDirection> {
    if byte >= 128 {
        Some(HexDirection::from_index((byte - 128) as usize))
    } else {
        None
    }
}

fn road_byte(roads: &[bool; 6]) -> u8 {
    let mut mask = 0u8;
    for (i, &road) in roads.iter().enumerate() {
        if road {
            mask |= 1 << i;
        }
    }
    mask
}

/// Write the whole map in the current format version.
pub fn save<W: Write>(grid: &HexGrid, writer: &mut W) -> io::Result<()> {
    write_i32(writer, CURRENT_VERSION)?;
    write_i32(writer, grid.cell_count_x)?;
    write_i32(writer, grid.cell_count_z)?;
    writer.write_all(&[grid.wrapping as u8])?;

    for cell in &grid.cells {
        writer.write_all(&[
            cell.terrain_type_index,
            (cell.elevation + 127) as u8,
            cell.water_level as u8,
            cell.urban_level as u8,
            cell.farm_level as u8,
            cell.plant_level as u8,
            cell.special_index,
            cell.walled as u8,
            river_byte(cell.incoming_river),
            river_byte(cell.outgoing_river),
            road_byte(&cell.roads),
            cell.explored as u8,
        ])?;
    }

    write_i32(writer, grid.units.len() as i32)?;
    for unit in &grid.units {
        let coordinates = grid.cells[unit.location].coordinates;
        write_i32(writer, coordinates.x)?;
        write_i32(writer, coordinates.z)?;
        write_f32(writer, unit.orientation)?;
    }
    Ok(())
}

/// Read a map saved with this or any earlier format version, replacing
/// the grid's current map. Visibility is rebuilt from the loaded units.
pub fn load<R: Read>(grid: &mut HexGrid, reader: &mut R) -> Result<(), MapError> {
    let version = read_i32(reader)?;
    if !(0..=CURRENT_VERSION).contains(&version) {
        return Err(MapError::UnknownVersion(version));
    }

    let (x, z) = if version >= 1 {
        (read_i32(reader)?, read_i32(reader)?)
    } else {
        (20, 15)
    };
    let wrapping = version >= 5 && read_u8(reader)? != 0;
    grid.create_map(x, z, wrapping)?;

    for i in 0..grid.cell_count() {
        let cell = &mut grid.cells[i];
        cell.terrain_type_index = read_u8(reader)?;
        let elevation = read_u8(reader)? as i32;
        // Version 4 shifted elevation so negative levels fit in a byte.
        cell.elevation = if version >= 4 {
            elevation - 127
        } else {
            elevation
        };
        cell.water_level = read_u8(reader)? as i32;
        cell.urban_level = read_u8(reader)? as i32;
        cell.farm_level = read_u8(reader)? as i32;
        cell.plant_level = read_u8(reader)? as i32;
        cell.special_index = read_u8(reader)?;
        cell.walled = read_u8(reader)? != 0;
        cell.incoming_river = river_from_byte(read_u8(reader)?);
        cell.outgoing_river = river_from_byte(read_u8(reader)?);
        let roads = read_u8(reader)?;
        for d in 0..6 {
            cell.roads[d] = roads & (1 << d) != 0;
        }
        cell.explored = version >= 3 && read_u8(reader)? != 0;
    }

    if version >= 2 {
        let unit_count = read_i32(reader)?;
        for _ in 0..unit_count {
            let ux = read_i32(reader)?;
            let uz = read_i32(reader)?;
            let orientation = read_f32(reader)?;
            let coordinates = HexCoordinates::new(ux, uz);
            match grid.cell_index_at(coordinates) {
                Some(location) => {
                    if grid.add_unit(HexUnit::new(), location, orientation).is_none() {
                        eprintln!("Warning: dropping unit on invalid cell {}", coordinates);
                    }
                }
                None => {
                    eprintln!("Warning: dropping unit outside the map at {}", coordinates);
                }
            }
        }
    }
    Ok(())
}

pub fn save_file<P: AsRef<Path>>(grid: &HexGrid, path: P) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    save(grid, &mut writer)?;
    writer.flush()
}

pub fn load_file<P: AsRef<Path>>(grid: &mut HexGrid, path: P) -> Result<(), MapError> {
    let mut reader = BufReader::new(File::open(path)?);
    load(grid, &mut reader)
}
