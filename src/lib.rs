//! Hex map world core: cube-coordinate grid, turn-based pathfinding,
//! fog-of-war visibility, procedural map generation, and a versioned
//! binary save format.

pub mod ascii;
pub mod cell;
pub mod coords;
pub mod generator;
pub mod grid;
pub mod persist;
pub mod queue;
pub mod search;
pub mod unit;
pub mod visibility;
