//! Core types for the signal simulation
//!
//! Positions, orientations and identifiers shared by every other module.
//! These are plain value types so they can be used as map keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Duration of one tick in milliseconds
pub const MILLIS_PER_TICK: u64 = 50;

/// Width of a region (in cells) along the x and z axes
pub const REGION_SIZE: i32 = 16;

/// The colour shown by a vehicle signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LightPhase {
    Red,
    Orange,
    Green,
}

impl LightPhase {
    /// All phases in display order
    pub const ALL: [LightPhase; 3] = [LightPhase::Red, LightPhase::Orange, LightPhase::Green];
}

impl fmt::Display for LightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightPhase::Red => "RED",
            LightPhase::Orange => "ORANGE",
            LightPhase::Green => "GREEN",
        };
        f.write_str(name)
    }
}

/// Orientation of a cell sub-state or of a placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Facing {
    pub const CARDINALS: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Unit step (dx, dy, dz) one cell in this direction
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Facing::North => (0, 0, -1),
            Facing::South => (0, 0, 1),
            Facing::East => (1, 0, 0),
            Facing::West => (-1, 0, 0),
            Facing::Up => (0, 1, 0),
            Facing::Down => (0, -1, 0),
        }
    }

    pub fn opposite(&self) -> Facing {
        match self {
            Facing::North => Facing::South,
            Facing::South => Facing::North,
            Facing::East => Facing::West,
            Facing::West => Facing::East,
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
        }
    }

    /// Normalized lowercase label, e.g. `"north"`
    pub fn label(&self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }

    /// Parse a free-text direction label such as `"North"` or `"southbound"`.
    ///
    /// Only horizontal directions are recognised, the first cardinal name found
    /// in the label wins.
    pub fn from_label(label: &str) -> Option<Facing> {
        let lower = label.to_lowercase();
        Facing::CARDINALS
            .into_iter()
            .filter_map(|facing| lower.find(facing.label()).map(|at| (at, facing)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, facing)| facing)
    }

    /// Index into the 16-step rotation used by rotatable cell sub-states
    /// (0 = south, 4 = west, 8 = north, 12 = east)
    pub fn rotation_step(&self) -> Option<u8> {
        match self {
            Facing::South => Some(0),
            Facing::West => Some(4),
            Facing::North => Some(8),
            Facing::East => Some(12),
            Facing::Up | Facing::Down => None,
        }
    }

    /// Nearest cardinal for a 16-step rotation value
    pub fn from_rotation_step(step: u8) -> Facing {
        match ((step % 16) + 2) / 4 % 4 {
            0 => Facing::South,
            1 => Facing::West,
            2 => Facing::North,
            _ => Facing::East,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which synchronized approach a side belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionGroup {
    NorthSouth,
    EastWest,
    Unknown,
}

impl DirectionGroup {
    /// Classify a side's direction label by substring match
    pub fn classify(label: &str) -> DirectionGroup {
        let dir = label.to_lowercase();
        if dir.contains("north") || dir.contains("south") || dir == "ns" {
            DirectionGroup::NorthSouth
        } else if dir.contains("east") || dir.contains("west") || dir == "ew" {
            DirectionGroup::EastWest
        } else {
            DirectionGroup::Unknown
        }
    }
}

/// A wrapper type for intersection IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntersectionId(pub Uuid);

impl IntersectionId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The column of cells that the host world loads and unloads as a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    pub world: String,
    pub x: i32,
    pub z: i32,
}

/// A single cell in a named world
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPosition {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    pub fn region(&self) -> RegionKey {
        RegionKey {
            world: self.world.clone(),
            x: self.x.div_euclid(REGION_SIZE),
            z: self.z.div_euclid(REGION_SIZE),
        }
    }

    /// The neighbouring cell one step toward `facing`
    pub fn step(&self, facing: Facing) -> CellPosition {
        let (dx, dy, dz) = facing.offset();
        CellPosition::new(self.world.clone(), self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.world, self.x, self.y, self.z)
    }
}

/// A cell position plus the direction a placed object faces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPosition {
    pub cell: CellPosition,
    pub facing: Facing,
}

impl ObjectPosition {
    pub fn new(cell: CellPosition, facing: Facing) -> Self {
        Self { cell, facing }
    }
}

impl fmt::Display for ObjectPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.cell, self.facing.label().to_uppercase())
    }
}

/// Position of any light element, used as the applied-state cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementPosition {
    Cell(CellPosition),
    Object(ObjectPosition),
}

impl ElementPosition {
    pub fn cell(&self) -> &CellPosition {
        match self {
            ElementPosition::Cell(cell) => cell,
            ElementPosition::Object(object) => &object.cell,
        }
    }

    pub fn region(&self) -> RegionKey {
        self.cell().region()
    }
}

impl fmt::Display for ElementPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementPosition::Cell(cell) => cell.fmt(f),
            ElementPosition::Object(object) => object.fmt(f),
        }
    }
}
