//! The host world the signals are drawn into
//!
//! The engine never owns the world. Everything it needs is expressed through
//! the [`World`] trait, so the same engine can drive a live game server or the
//! in-memory [`MemoryWorld`] used by tests and the headless binary.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::element::CellState;
use super::error::WorldError;
use super::types::{CellPosition, ElementPosition, Facing, ObjectPosition, RegionKey};

/// Identifier of a live placed object in the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Exact (sub-cell) coordinates of a placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExactCoords {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
}

impl ExactCoords {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
        }
    }

    /// Centre of a cell
    pub fn centre_of(cell: &CellPosition) -> Self {
        Self::new(
            f64::from(cell.x) + 0.5,
            f64::from(cell.y) + 0.5,
            f64::from(cell.z) + 0.5,
        )
    }

    /// True when every axis differs by less than `tolerance`
    pub fn is_near(&self, other: &ExactCoords, tolerance: f64) -> bool {
        (self.x.0 - other.x.0).abs() < tolerance
            && (self.y.0 - other.y.0).abs() < tolerance
            && (self.z.0 - other.z.0).abs() < tolerance
    }

    /// The cell these coordinates fall in
    pub fn cell(&self, world: &str) -> CellPosition {
        CellPosition::new(
            world,
            self.x.0.floor() as i32,
            self.y.0.floor() as i32,
            self.z.0.floor() as i32,
        )
    }
}

/// What a placed object shows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub item: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ContentRef {
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            data: BTreeMap::new(),
        }
    }
}

/// The mutable visual part of a placed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectDisplay {
    pub content: Option<ContentRef>,
    /// One of 8 rotation steps of the content
    pub rotation: u8,
    pub visible: bool,
}

/// A live placed object as reported by the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub world: String,
    pub exact: ExactCoords,
    pub facing: Facing,
    pub glowing: bool,
    pub locked: bool,
    pub display: ObjectDisplay,
}

impl PlacedObject {
    /// Block-aligned cell the object is indexed under
    pub fn cell(&self) -> CellPosition {
        self.exact.cell(&self.world)
    }
}

/// Request to create a new placed object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpawn {
    pub position: ObjectPosition,
    pub at: ExactCoords,
    pub glowing: bool,
    pub visible: bool,
    pub locked: bool,
}

/// Operations the engine needs from the host world
pub trait World {
    /// Whether the region is loaded and may be read or written
    fn is_region_active(&self, region: &RegionKey) -> bool;

    fn cell(&self, position: &CellPosition) -> Option<CellState>;

    fn set_cell(&mut self, position: &CellPosition, state: &CellState) -> Result<(), WorldError>;

    /// All placed objects whose block-aligned cell lies in the region.
    /// Objects are not indexed by position, callers filter the result.
    fn objects_in_region(&self, region: &RegionKey) -> Vec<PlacedObject>;

    fn object(&self, id: ObjectId) -> Option<PlacedObject>;

    fn spawn_object(&mut self, spawn: &ObjectSpawn) -> Result<ObjectId, WorldError>;

    fn set_object_locked(&mut self, id: ObjectId, locked: bool) -> Result<(), WorldError>;

    fn set_object_display(&mut self, id: ObjectId, display: &ObjectDisplay) -> Result<(), WorldError>;
}

/// Counters of mutating calls made against a [`MemoryWorld`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub cell_writes: usize,
    pub object_writes: usize,
    pub spawns: usize,
    /// Content replaced while the object was not locked (it would have dropped)
    pub dropped_content: usize,
}

impl WriteStats {
    /// Cell writes plus object display writes
    pub fn total_writes(&self) -> usize {
        self.cell_writes + self.object_writes
    }
}

/// In-memory world used by the tests and the headless runner.
///
/// Every region is active unless explicitly deactivated.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    cells: HashMap<CellPosition, CellState>,
    objects: BTreeMap<ObjectId, PlacedObject>,
    inactive_regions: HashSet<RegionKey>,
    next_object_id: u64,
    fail_spawns: bool,
    pub stats: WriteStats,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_region_active(&mut self, region: RegionKey, active: bool) {
        if active {
            self.inactive_regions.remove(&region);
        } else {
            self.inactive_regions.insert(region);
        }
    }

    pub fn inactive_region_count(&self) -> usize {
        self.inactive_regions.len()
    }

    /// Make every future spawn fail
    pub fn set_fail_spawns(&mut self, fail: bool) {
        self.fail_spawns = fail;
    }

    /// Place a cell without counting it as a write (world setup)
    pub fn insert_cell(&mut self, position: CellPosition, state: CellState) {
        self.cells.insert(position, state);
    }

    /// Place an object without counting it as a write (world setup)
    pub fn insert_object(
        &mut self,
        world: impl Into<String>,
        exact: ExactCoords,
        facing: Facing,
        glowing: bool,
        locked: bool,
        display: ObjectDisplay,
    ) -> ObjectId {
        let id = self.next_id();
        self.objects.insert(
            id,
            PlacedObject {
                id,
                world: world.into(),
                exact,
                facing,
                glowing,
                locked,
                display,
            },
        );
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<PlacedObject> {
        self.objects.remove(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects whose block-aligned cell is `cell`
    pub fn objects_at(&self, cell: &CellPosition) -> Vec<&PlacedObject> {
        self.objects.values().filter(|o| &o.cell() == cell).collect()
    }

    pub fn reset_stats(&mut self) {
        self.stats = WriteStats::default();
    }

    fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        id
    }
}

impl World for MemoryWorld {
    fn is_region_active(&self, region: &RegionKey) -> bool {
        !self.inactive_regions.contains(region)
    }

    fn cell(&self, position: &CellPosition) -> Option<CellState> {
        self.cells.get(position).cloned()
    }

    fn set_cell(&mut self, position: &CellPosition, state: &CellState) -> Result<(), WorldError> {
        if !self.is_region_active(&position.region()) {
            return Err(WorldError::Rejected {
                position: ElementPosition::Cell(position.clone()),
                reason: "region is not active".to_string(),
            });
        }
        self.cells.insert(position.clone(), state.clone());
        self.stats.cell_writes += 1;
        Ok(())
    }

    fn objects_in_region(&self, region: &RegionKey) -> Vec<PlacedObject> {
        self.objects
            .values()
            .filter(|o| &o.cell().region() == region)
            .cloned()
            .collect()
    }

    fn object(&self, id: ObjectId) -> Option<PlacedObject> {
        self.objects.get(&id).cloned()
    }

    fn spawn_object(&mut self, spawn: &ObjectSpawn) -> Result<ObjectId, WorldError> {
        if self.fail_spawns {
            return Err(WorldError::SpawnFailed {
                position: ElementPosition::Object(spawn.position.clone()),
                reason: "spawning disabled".to_string(),
            });
        }
        let world = spawn.position.cell.world.clone();
        let id = self.insert_object(
            world,
            spawn.at,
            spawn.position.facing,
            spawn.glowing,
            spawn.locked,
            ObjectDisplay {
                content: None,
                rotation: 0,
                visible: spawn.visible,
            },
        );
        self.stats.spawns += 1;
        Ok(id)
    }

    fn set_object_locked(&mut self, id: ObjectId, locked: bool) -> Result<(), WorldError> {
        let object = self.objects.get_mut(&id).ok_or(WorldError::UnknownObject(id))?;
        object.locked = locked;
        Ok(())
    }

    fn set_object_display(&mut self, id: ObjectId, display: &ObjectDisplay) -> Result<(), WorldError> {
        let object = self.objects.get_mut(&id).ok_or(WorldError::UnknownObject(id))?;
        if !object.locked && object.display.content.is_some() && object.display.content != display.content {
            self.stats.dropped_content += 1;
        }
        object.display = display.clone();
        self.stats.object_writes += 1;
        Ok(())
    }
}
