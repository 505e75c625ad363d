//! A ready-made crossroads for the headless runner and tests
//!
//! Four approaches around a centre cell, each drawn with a different kind of
//! light so every code path gets exercised:
//!
//! - North: captured cell elements, with pedestrian elements
//! - East: placed objects (glowing lamps on a pole face)
//! - South: captured cell elements
//! - West: plain cells, with plain-cell pedestrian lights

use super::element::{CellState, LightElement};
use super::intersection::Intersection;
use super::side::Side;
use super::timing::TimingConfiguration;
use super::types::{CellPosition, Facing, IntersectionId, LightPhase};
use super::world::{ContentRef, ExactCoords, MemoryWorld, ObjectDisplay};

/// Height of the red lamp; orange and green hang below it
pub const LAMP_TOP_Y: i32 = 67;

/// Distance from the centre to each pole
pub const POLE_OFFSET: i32 = 3;

/// Material shown by a light that is switched off
pub const NEUTRAL_MATERIAL: &str = "lamp_off";

/// Content shown by a placed-object light that is switched off
pub const NEUTRAL_CONTENT: &str = "lamp_cover";

pub fn lamp_material(phase: LightPhase) -> &'static str {
    match phase {
        LightPhase::Red => "lamp_red",
        LightPhase::Orange => "lamp_orange",
        LightPhase::Green => "lamp_green",
    }
}

/// Vertical slot of each phase on a pole
pub fn lamp_height(phase: LightPhase) -> i32 {
    match phase {
        LightPhase::Red => LAMP_TOP_Y,
        LightPhase::Orange => LAMP_TOP_Y - 1,
        LightPhase::Green => LAMP_TOP_Y - 2,
    }
}

/// Pole base for an approach around a centre
pub fn pole_position(world: &str, centre_x: i32, centre_z: i32, facing: Facing) -> CellPosition {
    let (dx, _, dz) = facing.offset();
    CellPosition::new(world, centre_x + dx * POLE_OFFSET, 0, centre_z + dz * POLE_OFFSET)
}

fn lamp_cell(pole: &CellPosition, phase: LightPhase) -> CellPosition {
    CellPosition::new(pole.world.clone(), pole.x, lamp_height(phase), pole.z)
}

fn lamp_state(phase: LightPhase, facing: Facing) -> CellState {
    CellState::new(lamp_material(phase)).with_property("facing", facing.label())
}

/// Place a crossroads into `world` and return its fully-configured intersection
pub fn build_crossroads(world: &mut MemoryWorld, name: &str, centre_x: i32, centre_z: i32) -> Intersection {
    let world_name = "overworld";
    let mut intersection = Intersection::new(IntersectionId::new_random(), name);
    intersection.timing = TimingConfiguration::default();

    // North: captured cells plus pedestrian elements
    let pole = pole_position(world_name, centre_x, centre_z, Facing::North);
    let mut north = Side::new("North");
    for phase in LightPhase::ALL {
        let cell = lamp_cell(&pole, phase);
        world.insert_cell(cell.clone(), lamp_state(phase, Facing::North));
        if let Some(element) = LightElement::capture_cell(world, &cell) {
            north.add_light_element(phase, element);
        }
    }
    let walk = CellPosition::new(world_name, pole.x + 1, LAMP_TOP_Y - 3, pole.z);
    let dont_walk = CellPosition::new(world_name, pole.x + 1, LAMP_TOP_Y - 2, pole.z);
    world.insert_cell(walk.clone(), CellState::new("walk_figure").with_property("facing", "north"));
    world.insert_cell(dont_walk.clone(), CellState::new("raised_hand").with_property("facing", "north"));
    if let Some(element) = LightElement::capture_cell(world, &walk) {
        north.add_pedestrian_green_element(element);
    }
    if let Some(element) = LightElement::capture_cell(world, &dont_walk) {
        north.add_pedestrian_red_element(element);
    }
    intersection.add_side(north);

    // East: glowing placed objects hanging on the pole face
    let pole = pole_position(world_name, centre_x, centre_z, Facing::East);
    let mut east = Side::new("East");
    for phase in LightPhase::ALL {
        let cell = lamp_cell(&pole, phase);
        let display = ObjectDisplay {
            content: Some(ContentRef::new(lamp_material(phase))),
            rotation: 0,
            visible: true,
        };
        let id = world.insert_object(
            world_name,
            ExactCoords::centre_of(&cell),
            Facing::East,
            true,
            true,
            display,
        );
        if let Some(element) = LightElement::capture_object(world, id) {
            east.add_light_element(phase, element);
        }
    }
    // One lamp carries the "off" cover that the neutral element is captured from
    let cover_cell = CellPosition::new(world_name, pole.x, LAMP_TOP_Y + 1, pole.z);
    let cover = world.insert_object(
        world_name,
        ExactCoords::centre_of(&cover_cell),
        Facing::East,
        true,
        true,
        ObjectDisplay {
            content: Some(ContentRef::new(NEUTRAL_CONTENT)),
            rotation: 0,
            visible: true,
        },
    );
    intersection.neutral_element = LightElement::capture_object(world, cover);
    intersection.add_side(east);

    // South: captured cells
    let pole = pole_position(world_name, centre_x, centre_z, Facing::South);
    let mut south = Side::new("South");
    for phase in LightPhase::ALL {
        let cell = lamp_cell(&pole, phase);
        world.insert_cell(cell.clone(), lamp_state(phase, Facing::South));
        if let Some(element) = LightElement::capture_cell(world, &cell) {
            south.add_light_element(phase, element);
        }
    }
    intersection.add_side(south);

    // West: plain cells, including the pedestrian heads
    let pole = pole_position(world_name, centre_x, centre_z, Facing::West);
    let mut west = Side::new("West");
    for phase in LightPhase::ALL {
        let cell = lamp_cell(&pole, phase);
        let state = lamp_state(phase, Facing::West);
        world.insert_cell(cell.clone(), state.clone());
        west.add_light_cell(phase, cell, state);
    }
    let walk = CellPosition::new(world_name, pole.x, LAMP_TOP_Y - 3, pole.z + 1);
    let dont_walk = CellPosition::new(world_name, pole.x, LAMP_TOP_Y - 2, pole.z + 1);
    let walk_state = CellState::new("walk_figure").with_property("facing", "west");
    let dont_walk_state = CellState::new("raised_hand").with_property("facing", "west");
    world.insert_cell(walk.clone(), walk_state.clone());
    world.insert_cell(dont_walk.clone(), dont_walk_state.clone());
    west.add_pedestrian_green_cell(walk, walk_state);
    west.add_pedestrian_red_cell(dont_walk, dont_walk_state);
    intersection.add_side(west);

    intersection.neutral_state = Some(CellState::new(NEUTRAL_MATERIAL).with_property("facing", "north"));
    intersection
}
