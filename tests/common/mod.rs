//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use traffic_signals::simulation::{
    Animator, CellPosition, CellState, ContentRef, ExactCoords, Facing, Intersection, IntersectionId, LightElement,
    LightPhase, ManualClock, MemoryWorld, ObjectDisplay, ObjectId, SignalConfig, Side, TimingConfiguration,
};

pub const WORLD: &str = "overworld";

/// Lamp height of each phase on a pole
pub fn lamp_y(phase: LightPhase) -> i32 {
    match phase {
        LightPhase::Red => 3,
        LightPhase::Orange => 2,
        LightPhase::Green => 1,
    }
}

pub fn material(phase: LightPhase) -> &'static str {
    match phase {
        LightPhase::Red => "lamp_red",
        LightPhase::Orange => "lamp_orange",
        LightPhase::Green => "lamp_green",
    }
}

pub fn neutral_state() -> CellState {
    CellState::new("lamp_off").with_property("facing", "north")
}

/// Place a cell in the world and capture it as an element
pub fn cell_lamp(world: &mut MemoryWorld, position: CellPosition, state: CellState) -> LightElement {
    world.insert_cell(position.clone(), state);
    LightElement::capture_cell(world, &position).expect("cell was just placed")
}

/// A side with one captured cell per phase on a pole at (x, z)
pub fn cell_side(world: &mut MemoryWorld, label: &str, x: i32, z: i32) -> Side {
    let facing = Facing::from_label(label).unwrap_or(Facing::North);
    let mut side = Side::new(label);
    for phase in LightPhase::ALL {
        let state = CellState::new(material(phase)).with_property("facing", facing.label());
        let element = cell_lamp(world, CellPosition::new(WORLD, x, lamp_y(phase), z), state);
        side.add_light_element(phase, element);
    }
    side
}

/// A glowing placed object showing `content`
pub fn object_lamp(world: &mut MemoryWorld, cell: &CellPosition, facing: Facing, content: &str) -> ObjectId {
    world.insert_object(
        WORLD,
        ExactCoords::centre_of(cell),
        facing,
        true,
        true,
        ObjectDisplay {
            content: Some(ContentRef::new(content)),
            rotation: 2,
            visible: true,
        },
    )
}

/// A side with one captured placed object per phase on a pole at (x, z)
pub fn object_side(world: &mut MemoryWorld, label: &str, x: i32, z: i32) -> Side {
    let facing = Facing::from_label(label).unwrap_or(Facing::East);
    let mut side = Side::new(label);
    for phase in LightPhase::ALL {
        let cell = CellPosition::new(WORLD, x, lamp_y(phase), z);
        let id = object_lamp(world, &cell, facing, material(phase));
        let element = LightElement::capture_object(world, id).expect("object was just placed");
        side.add_light_element(phase, element);
    }
    side
}

pub fn pole(x: i32, z: i32, phase: LightPhase) -> CellPosition {
    CellPosition::new(WORLD, x, lamp_y(phase), z)
}

/// Pole positions of the four approaches around the origin
pub const NORTH: (i32, i32) = (0, -3);
pub const SOUTH: (i32, i32) = (0, 3);
pub const EAST: (i32, i32) = (3, 0);
pub const WEST: (i32, i32) = (-3, 0);

/// North, South, East, West with three cell lamps each, default timing
pub fn four_way_cells(world: &mut MemoryWorld) -> Intersection {
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Test Crossing");
    intersection.timing = TimingConfiguration::new(200, 60, 140, 20);
    intersection.add_side(cell_side(world, "North", NORTH.0, NORTH.1));
    intersection.add_side(cell_side(world, "South", SOUTH.0, SOUTH.1));
    intersection.add_side(cell_side(world, "East", EAST.0, EAST.1));
    intersection.add_side(cell_side(world, "West", WEST.0, WEST.1));
    intersection.neutral_state = Some(neutral_state());
    intersection
}

pub fn animator(clock: &Arc<ManualClock>) -> Animator {
    Animator::new(SignalConfig::default(), clock.clone())
}
