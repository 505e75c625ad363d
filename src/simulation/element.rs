//! Light elements: the world objects a signal is drawn on
//!
//! An element is either a fixed cell (material + sub-state) or a placed object
//! anchored to a cell face. Both capture a visual state once and push it back
//! onto the live world on demand.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::WorldError;
use super::types::{CellPosition, ElementPosition, Facing, ObjectPosition, RegionKey};
use super::world::{ContentRef, ExactCoords, ObjectDisplay, ObjectId, ObjectSpawn, PlacedObject, World};

/// Maximum per-axis distance for an exact-coordinate object match
pub const EXACT_MATCH_TOLERANCE: f64 = 0.1;

const FACING_PROPERTY: &str = "facing";
const ROTATION_PROPERTY: &str = "rotation";

/// Captured visual state of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellState {
    pub material: String,
    /// Encoded sub-state, e.g. `facing=north` or `rotation=8`
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Owner/skin reference for materials that carry one
    #[serde(default)]
    pub owner: Option<String>,
}

impl CellState {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            properties: BTreeMap::new(),
            owner: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// A copy whose directional sub-state points toward `facing`.
    ///
    /// States without a directional property are returned unchanged.
    pub fn oriented(&self, facing: Facing) -> CellState {
        let mut state = self.clone();
        if state.properties.contains_key(FACING_PROPERTY) {
            state
                .properties
                .insert(FACING_PROPERTY.to_string(), facing.label().to_string());
        } else if state.properties.contains_key(ROTATION_PROPERTY) {
            if let Some(step) = facing.rotation_step() {
                state
                    .properties
                    .insert(ROTATION_PROPERTY.to_string(), step.to_string());
            }
        }
        state
    }

    /// Orientation encoded in the sub-state, if any
    pub fn extract_facing(&self) -> Option<Facing> {
        if let Some(value) = self.properties.get(FACING_PROPERTY) {
            return parse_facing(value);
        }
        self.properties
            .get(ROTATION_PROPERTY)
            .and_then(|value| value.parse::<u8>().ok())
            .map(Facing::from_rotation_step)
    }

    /// `material[key=value,...]`
    pub fn encoded(&self) -> String {
        if self.properties.is_empty() {
            return self.material.clone();
        }
        let props: Vec<String> = self
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}[{}]", self.material, props.join(","))
    }
}

fn parse_facing(value: &str) -> Option<Facing> {
    [
        Facing::North,
        Facing::East,
        Facing::South,
        Facing::West,
        Facing::Up,
        Facing::Down,
    ]
    .into_iter()
    .find(|facing| facing.label().eq_ignore_ascii_case(value))
}

/// Captured state of a placed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedObjectState {
    pub content: Option<ContentRef>,
    pub rotation: u8,
    pub facing: Facing,
    pub visible: bool,
    pub glowing: bool,
    /// Locked objects never drop their content when it is replaced
    pub fixed: bool,
    /// Sub-cell coordinates at capture time, used for precise matching
    #[serde(default)]
    pub exact: Option<ExactCoords>,
}

impl PlacedObjectState {
    pub fn capture(object: &PlacedObject) -> Self {
        Self {
            content: object.display.content.clone(),
            rotation: object.display.rotation,
            facing: object.facing,
            visible: object.display.visible,
            glowing: object.glowing,
            fixed: object.locked,
            exact: Some(object.exact),
        }
    }

    pub fn display(&self) -> ObjectDisplay {
        ObjectDisplay {
            content: self.content.clone(),
            rotation: self.rotation,
            visible: self.visible,
        }
    }
}

/// Result of pushing an element onto the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The region was not active; nothing was written
    Skipped,
}

/// One light surface of a signal.
///
/// `Clone` is a deep copy: elements shared between a side's phase lists and
/// its position index never alias once cloned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightElement {
    Cell {
        position: CellPosition,
        state: CellState,
    },
    PlacedObject {
        position: ObjectPosition,
        state: PlacedObjectState,
    },
}

impl LightElement {
    pub fn cell(position: CellPosition, state: CellState) -> Self {
        LightElement::Cell { position, state }
    }

    pub fn placed_object(position: ObjectPosition, state: PlacedObjectState) -> Self {
        LightElement::PlacedObject { position, state }
    }

    /// Capture the current state of a cell
    pub fn capture_cell(world: &dyn World, position: &CellPosition) -> Option<Self> {
        world
            .cell(position)
            .map(|state| LightElement::cell(position.clone(), state))
    }

    /// Capture the current state of a live placed object
    pub fn capture_object(world: &dyn World, id: ObjectId) -> Option<Self> {
        world.object(id).map(|object| {
            let position = ObjectPosition::new(object.cell(), object.facing);
            LightElement::placed_object(position, PlacedObjectState::capture(&object))
        })
    }

    pub fn element_type(&self) -> &'static str {
        match self {
            LightElement::Cell { .. } => "cell",
            LightElement::PlacedObject { .. } => "placed_object",
        }
    }

    pub fn position(&self) -> ElementPosition {
        match self {
            LightElement::Cell { position, .. } => ElementPosition::Cell(position.clone()),
            LightElement::PlacedObject { position, .. } => ElementPosition::Object(position.clone()),
        }
    }

    pub fn is_placed_object(&self) -> bool {
        matches!(self, LightElement::PlacedObject { .. })
    }

    /// Push this element's state onto the world.
    ///
    /// For cells, a `direction` label (e.g. `"North"`) turns any directional
    /// sub-state toward that cardinal. Placed objects keep their own
    /// orientation.
    pub fn apply(&self, world: &mut dyn World, direction: Option<&str>) -> Result<ApplyOutcome, WorldError> {
        match self {
            LightElement::Cell { position, state } => {
                let facing = direction.and_then(Facing::from_label);
                apply_cell(world, position, state, facing)
            }
            LightElement::PlacedObject { position, state } => apply_object(world, position, state),
        }
    }

    /// Push this element's state but take the orientation from `other`
    pub fn apply_with_facing_from(
        &self,
        world: &mut dyn World,
        other: &LightElement,
    ) -> Result<ApplyOutcome, WorldError> {
        let facing = other.extract_facing();
        match self {
            LightElement::Cell { position, state } => apply_cell(world, position, state, facing),
            LightElement::PlacedObject { position, state } => match facing {
                Some(facing) if facing != position.facing => {
                    let turned = ObjectPosition::new(position.cell.clone(), facing);
                    apply_object(world, &turned, state)
                }
                _ => apply_object(world, position, state),
            },
        }
    }

    pub fn extract_facing(&self) -> Option<Facing> {
        match self {
            LightElement::Cell { state, .. } => state.extract_facing(),
            LightElement::PlacedObject { position, .. } => Some(position.facing),
        }
    }

    /// This element's appearance moved onto `target`'s location.
    ///
    /// Returns `None` when the two are different kinds of element: a cell
    /// appearance cannot be shown on a placed object or the other way round.
    pub fn relocated_onto(&self, target: &LightElement) -> Option<LightElement> {
        match (self, target) {
            (LightElement::Cell { state, .. }, LightElement::Cell { position, .. }) => {
                Some(LightElement::cell(position.clone(), state.clone()))
            }
            (
                LightElement::PlacedObject { state, .. },
                LightElement::PlacedObject {
                    position,
                    state: target_state,
                },
            ) => Some(LightElement::placed_object(
                position.clone(),
                PlacedObjectState {
                    content: state.content.clone(),
                    rotation: state.rotation,
                    visible: state.visible,
                    facing: position.facing,
                    glowing: target_state.glowing,
                    fixed: target_state.fixed,
                    exact: target_state.exact,
                },
            )),
            _ => None,
        }
    }
}

fn apply_cell(
    world: &mut dyn World,
    position: &CellPosition,
    state: &CellState,
    facing: Option<Facing>,
) -> Result<ApplyOutcome, WorldError> {
    if !world.is_region_active(&position.region()) {
        return Ok(ApplyOutcome::Skipped);
    }
    let target = match facing {
        Some(facing) => state.oriented(facing),
        None => state.clone(),
    };
    world.set_cell(position, &target)?;
    Ok(ApplyOutcome::Applied)
}

fn apply_object(
    world: &mut dyn World,
    position: &ObjectPosition,
    state: &PlacedObjectState,
) -> Result<ApplyOutcome, WorldError> {
    if !world.is_region_active(&position.cell.region()) {
        return Ok(ApplyOutcome::Skipped);
    }
    let id = match locate_object(world, position, state) {
        Some(id) => id,
        None => spawn_object(world, position, state)?,
    };
    show_state(world, id, state)?;
    Ok(ApplyOutcome::Applied)
}

/// Find the live object an element refers to.
///
/// Search order: exact coordinates, then the block-aligned cell, then the
/// cell in front of and behind it along the facing. Every pass requires the
/// same facing and glow kind.
pub fn locate_object(world: &dyn World, position: &ObjectPosition, state: &PlacedObjectState) -> Option<ObjectId> {
    let facing = position.facing;
    let forward = position.cell.step(facing);
    let behind = position.cell.step(facing.opposite());

    let mut regions: Vec<RegionKey> = Vec::with_capacity(3);
    for cell in [&position.cell, &forward, &behind] {
        let region = cell.region();
        if !regions.contains(&region) && world.is_region_active(&region) {
            regions.push(region);
        }
    }

    let candidates: Vec<PlacedObject> = regions
        .iter()
        .flat_map(|region| world.objects_in_region(region))
        .filter(|o| o.world == position.cell.world && o.facing == facing && o.glowing == state.glowing)
        .collect();

    if let Some(exact) = &state.exact {
        if let Some(found) = candidates
            .iter()
            .find(|o| o.exact.is_near(exact, EXACT_MATCH_TOLERANCE))
        {
            return Some(found.id);
        }
    }

    let found = [&position.cell, &forward, &behind]
        .into_iter()
        .find_map(|cell| candidates.iter().find(|o| &o.cell() == cell))
        .map(|found| found.id);
    found
}

fn spawn_object(
    world: &mut dyn World,
    position: &ObjectPosition,
    state: &PlacedObjectState,
) -> Result<ObjectId, WorldError> {
    let spawn = ObjectSpawn {
        position: position.clone(),
        at: state
            .exact
            .unwrap_or_else(|| ExactCoords::centre_of(&position.cell)),
        glowing: state.glowing,
        visible: state.visible,
        // Locked until the captured content is in place
        locked: true,
    };
    let id = world.spawn_object(&spawn)?;
    info!("Spawned placed object at {} facing {}", position, position.facing);
    Ok(id)
}

/// Write content/rotation/visibility with the object locked, then restore the
/// captured locked flag.
fn show_state(world: &mut dyn World, id: ObjectId, state: &PlacedObjectState) -> Result<(), WorldError> {
    world.set_object_locked(id, true)?;
    let shown = world.set_object_display(id, &state.display());
    let restored = world.set_object_locked(id, state.fixed);
    debug!("Applied placed object state to {:?} (locked={})", id, state.fixed);
    shown.and(restored)
}
