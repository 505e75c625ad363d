//! Animator tests
//!
//! Run the animator against a `MemoryWorld` on a manual clock and count the
//! writes that reach the world.

mod common;

use std::sync::Arc;

use common::*;
use traffic_signals::simulation::{
    Animator, AppliedState, CellPosition, CellState, DirectSink, ElementPosition, Facing, Intersection, IntersectionId,
    LightElement, LightPhase, ManualClock, MemoryWorld, ObjectPosition, SignalAspect, SignalConfig, Side, TickReport,
    TimingConfiguration, World, WorldSink, WorldWrite, WriteFeedback, WriteReceipt,
};

fn run(animator: &mut Animator, world: &mut MemoryWorld) -> TickReport {
    animator.tick(&mut DirectSink::new(world))
}

fn lit(phase: LightPhase) -> Option<AppliedState> {
    Some(AppliedState::Lit(SignalAspect::Vehicle(phase)))
}

#[test]
fn test_first_tick_draws_every_light() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    assert!(animator.is_running());
    assert_eq!(animator.active_cycle_count(), 1);

    let report = run(&mut animator, &mut world);
    assert_eq!(report.transitions, 1);
    assert_eq!(report.writes, 12);
    assert_eq!(world.stats.cell_writes, 12);
    assert_eq!(animator.cached_position_count(), 12);

    // North/south green, east/west red
    let north_green = ElementPosition::Cell(pole(NORTH.0, NORTH.1, LightPhase::Green));
    let east_red = ElementPosition::Cell(pole(EAST.0, EAST.1, LightPhase::Red));
    let east_green = ElementPosition::Cell(pole(EAST.0, EAST.1, LightPhase::Green));
    assert_eq!(animator.applied_state(&north_green), lit(LightPhase::Green));
    assert_eq!(animator.applied_state(&east_red), lit(LightPhase::Red));
    assert_eq!(animator.applied_state(&east_green), Some(AppliedState::Neutral));

    let shown = world.cell(&pole(EAST.0, EAST.1, LightPhase::Green)).unwrap();
    assert_eq!(shown.material, "lamp_off");
}

#[test]
fn test_ticks_without_transition_write_nothing() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);
    world.reset_stats();

    for _ in 0..5 {
        clock.advance_ticks(10);
        let report = run(&mut animator, &mut world);
        assert_eq!(report, TickReport::default());
    }
    assert_eq!(world.stats.total_writes(), 0);
}

/// Only lights whose appearance changed are written on a transition
#[test]
fn test_transition_writes_only_changed_lights() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);
    world.reset_stats();

    // Green -> orange for north/south: green off and orange on, twice
    clock.advance_ticks(200);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.transitions, 1);
    assert_eq!(report.writes, 4);
    assert_eq!(report.unchanged, 8);
    assert_eq!(world.stats.cell_writes, 4);

    // Same instant again: nothing to do
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 0);
    assert_eq!(world.stats.cell_writes, 4);
}

#[test]
fn test_walk_window_transition_without_pedestrian_lights_writes_nothing() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);
    world.reset_stats();

    clock.advance_ticks(140);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.transitions, 1);
    assert_eq!(report.writes, 0);
    assert_eq!(report.unchanged, 12);
}

#[test]
fn test_neutral_takes_orientation_of_replaced_light() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);

    let south_red = world.cell(&pole(SOUTH.0, SOUTH.1, LightPhase::Red)).unwrap();
    assert_eq!(south_red.material, "lamp_off");
    assert_eq!(south_red.extract_facing(), Some(Facing::South));

    let west_green = world.cell(&pole(WEST.0, WEST.1, LightPhase::Green)).unwrap();
    assert_eq!(west_green.extract_facing(), Some(Facing::West));
}

#[test]
fn test_unregister_and_reregister_reapplies_everything() {
    let mut world = MemoryWorld::new();
    let intersection = Arc::new(four_way_cells(&mut world));
    let id = intersection.id;
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![intersection.clone()]);
    run(&mut animator, &mut world);

    clock.advance_ticks(200);
    run(&mut animator, &mut world);
    assert_eq!(animator.cycle(&id).unwrap().phase_index(), 1);

    assert!(animator.unregister_intersection(&id).is_some());
    assert_eq!(animator.active_cycle_count(), 0);
    assert_eq!(animator.cached_position_count(), 0);
    assert!(animator.cycle(&id).is_none());

    animator.register_intersection(intersection).unwrap();
    assert_eq!(animator.cycle(&id).unwrap().phase_index(), 0);

    world.reset_stats();
    let report = run(&mut animator, &mut world);
    assert_eq!(report.transitions, 1);
    assert_eq!(report.writes, 12);
    assert_eq!(world.stats.cell_writes, 12);
}

#[test]
fn test_unregister_leaves_other_intersections_alone() {
    let mut world = MemoryWorld::new();
    let first = Arc::new(four_way_cells(&mut world));

    let mut second = Intersection::new(IntersectionId::new_random(), "Second");
    second.add_side(cell_side(&mut world, "North", 100, -3));
    second.add_side(cell_side(&mut world, "South", 100, 3));
    second.neutral_state = Some(neutral_state());
    let second = Arc::new(second);

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![first.clone(), second.clone()]);
    run(&mut animator, &mut world);
    assert_eq!(animator.cached_position_count(), 18);

    animator.unregister_intersection(&first.id);
    assert_eq!(animator.active_cycle_count(), 1);
    assert_eq!(animator.cached_position_count(), 6);
    assert!(animator.cycle(&second.id).is_some());
}

#[test]
fn test_incomplete_registration_is_rejected() {
    let mut world = MemoryWorld::new();
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(Vec::new());

    let mut lonely = Intersection::new(IntersectionId::new_random(), "Lonely");
    lonely.add_side(cell_side(&mut world, "North", 0, 0));
    lonely.neutral_state = Some(neutral_state());
    assert!(animator.register_intersection(Arc::new(lonely)).is_err());

    let mut unlit = four_way_cells(&mut world);
    unlit.neutral_state = None;
    assert!(animator.register_intersection(Arc::new(unlit)).is_err());

    let mut partial = four_way_cells(&mut world);
    partial.sides[1] = Side::new("South");
    assert!(animator.register_intersection(Arc::new(partial)).is_err());

    assert_eq!(animator.active_cycle_count(), 0);
    assert_eq!(animator.cached_position_count(), 0);
}

#[test]
fn test_start_skips_incomplete_intersections() {
    let mut world = MemoryWorld::new();
    let complete = four_way_cells(&mut world);
    let mut incomplete = four_way_cells(&mut world);
    incomplete.neutral_state = None;

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(complete), Arc::new(incomplete)]);
    assert_eq!(animator.active_cycle_count(), 1);
}

#[test]
fn test_stop_clears_cycles_and_cache() {
    let mut world = MemoryWorld::new();
    let intersection = Arc::new(four_way_cells(&mut world));
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![intersection.clone()]);
    run(&mut animator, &mut world);

    animator.stop();
    assert!(!animator.is_running());
    assert_eq!(animator.active_cycle_count(), 0);
    assert_eq!(animator.cached_position_count(), 0);

    // A fresh start draws everything again
    animator.start(vec![intersection]);
    world.reset_stats();
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 12);
}

#[test]
fn test_reload_config_restarts_with_new_interval() {
    let mut world = MemoryWorld::new();
    let intersection = Arc::new(four_way_cells(&mut world));
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![intersection]);
    run(&mut animator, &mut world);
    assert_eq!(animator.tick_interval(), 10);

    let mut config = SignalConfig::default();
    config.animation.tick_interval = 4;
    animator.reload_config(config);

    assert!(animator.is_running());
    assert_eq!(animator.tick_interval(), 4);
    assert_eq!(animator.active_cycle_count(), 1);
    assert_eq!(animator.cached_position_count(), 0);
}

/// Lights in an unloaded region are skipped and picked up by the next transition
#[test]
fn test_inactive_region_retried_at_next_transition() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let north_region = pole(NORTH.0, NORTH.1, LightPhase::Red).region();
    world.set_region_active(north_region.clone(), false);

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);

    let report = run(&mut animator, &mut world);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.writes, 9);
    let north_green = ElementPosition::Cell(pole(NORTH.0, NORTH.1, LightPhase::Green));
    assert_eq!(animator.applied_state(&north_green), None);

    world.set_region_active(north_region, true);
    world.reset_stats();

    // No transition, no retry
    clock.advance_ticks(10);
    assert_eq!(run(&mut animator, &mut world).writes, 0);

    // North rewrites all three lamps, south only the two that changed
    clock.advance_ticks(190);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 5);
    assert_eq!(world.stats.cell_writes, 5);
    assert_eq!(animator.applied_state(&north_green), Some(AppliedState::Neutral));
}

/// Element lists win over plain cells per phase; plain cells fill the gaps
#[test]
fn test_elements_take_precedence_over_plain_cells() {
    let mut world = MemoryWorld::new();
    let element_green = pole(0, -3, LightPhase::Green);
    let plain_green = CellPosition::new(WORLD, 0, 10, -3);
    let plain_orange = pole(0, -3, LightPhase::Orange);
    let plain_red = pole(0, -3, LightPhase::Red);

    let mut north = Side::new("North");
    let green_state = CellState::new("lamp_green").with_property("facing", "north");
    north.add_light_element(LightPhase::Green, cell_lamp(&mut world, element_green.clone(), green_state));
    for (phase, cell) in [
        (LightPhase::Green, plain_green.clone()),
        (LightPhase::Orange, plain_orange.clone()),
        (LightPhase::Red, plain_red.clone()),
    ] {
        let state = CellState::new(material(phase)).with_property("facing", "north");
        world.insert_cell(cell.clone(), state.clone());
        north.add_light_cell(phase, cell, state);
    }

    let mut intersection = Intersection::new(IntersectionId::new_random(), "Mixed");
    intersection.add_side(north);
    intersection.add_side(cell_side(&mut world, "South", 0, 3));
    intersection.neutral_state = Some(neutral_state());

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 6);

    assert_eq!(
        animator.applied_state(&ElementPosition::Cell(element_green)),
        lit(LightPhase::Green)
    );
    assert_eq!(animator.applied_state(&ElementPosition::Cell(plain_green.clone())), None);
    assert_eq!(world.cell(&plain_green).unwrap().material, "lamp_green");
    assert_eq!(
        animator.applied_state(&ElementPosition::Cell(plain_red.clone())),
        Some(AppliedState::Neutral)
    );
    assert_eq!(world.cell(&plain_red).unwrap().material, "lamp_off");
    assert_eq!(
        animator.applied_state(&ElementPosition::Cell(plain_orange)),
        Some(AppliedState::Neutral)
    );
}

#[test]
fn test_pedestrian_lights_swap_with_cross_traffic() {
    let mut world = MemoryWorld::new();
    let mut intersection = four_way_cells(&mut world);
    let walk = CellPosition::new(WORLD, 1, 0, -3);
    let dont_walk = CellPosition::new(WORLD, 1, 1, -3);
    let walk_element = cell_lamp(&mut world, walk.clone(), CellState::new("walk_figure"));
    let dont_walk_element = cell_lamp(&mut world, dont_walk.clone(), CellState::new("raised_hand"));
    intersection.sides[0].add_pedestrian_green_element(walk_element);
    intersection.sides[0].add_pedestrian_red_element(dont_walk_element);

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);

    let walk_pos = ElementPosition::Cell(walk.clone());
    let dont_walk_pos = ElementPosition::Cell(dont_walk.clone());

    // North has vehicle green: its pedestrians wait
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 14);
    assert_eq!(animator.applied_state(&walk_pos), Some(AppliedState::Neutral));
    assert_eq!(
        animator.applied_state(&dont_walk_pos),
        Some(AppliedState::Lit(SignalAspect::DontWalk))
    );
    assert_eq!(world.cell(&dont_walk).unwrap().material, "raised_hand");

    // Orange, gap, then east/west green
    for ticks in [200, 60, 20] {
        clock.advance_ticks(ticks);
        run(&mut animator, &mut world);
    }
    assert_eq!(
        animator.applied_state(&walk_pos),
        Some(AppliedState::Lit(SignalAspect::Walk))
    );
    assert_eq!(animator.applied_state(&dont_walk_pos), Some(AppliedState::Neutral));
    assert_eq!(world.cell(&walk).unwrap().material, "walk_figure");
    assert_eq!(world.cell(&dont_walk).unwrap().material, "lamp_off");

    // The walk window ends before east/west green does
    world.reset_stats();
    clock.advance_ticks(140);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 2);
    assert_eq!(animator.applied_state(&walk_pos), Some(AppliedState::Neutral));
    assert_eq!(
        animator.applied_state(&dont_walk_pos),
        Some(AppliedState::Lit(SignalAspect::DontWalk))
    );
}

/// Placed-object lights with only a cell neutral cannot be switched off
#[test]
fn test_missing_neutral_freezes_lights() {
    let mut world = MemoryWorld::new();
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Frames only");
    intersection.add_side(object_side(&mut world, "North", 0, -3));
    intersection.add_side(object_side(&mut world, "East", 3, 0));
    intersection.neutral_state = Some(neutral_state());

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);

    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 2);
    assert_eq!(report.frozen, 4);
    assert_eq!(world.stats.object_writes, 2);

    // Every non-lit light stays frozen and uncached
    let north_red = ElementPosition::Object(ObjectPosition::new(
        pole(0, -3, LightPhase::Red),
        Facing::North,
    ));
    assert_eq!(animator.applied_state(&north_red), None);

    clock.advance_ticks(200);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.frozen, 4);
    assert_eq!(report.writes, 1);
}

#[test]
fn test_placed_object_neutral_relocated_onto_each_light() {
    let mut world = MemoryWorld::new();
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Frames");
    intersection.add_side(object_side(&mut world, "North", 0, -3));
    intersection.add_side(object_side(&mut world, "East", 3, 0));
    let cover_cell = CellPosition::new(WORLD, 50, 1, 50);
    let cover = object_lamp(&mut world, &cover_cell, Facing::South, "lamp_cover");
    intersection.neutral_element = LightElement::capture_object(&world, cover);
    let objects_before = world.object_count();

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 6);
    assert_eq!(report.frozen, 0);

    // Lights were found in place, not respawned, and kept their facing
    assert_eq!(world.object_count(), objects_before);
    assert_eq!(world.stats.spawns, 0);
    assert_eq!(world.stats.dropped_content, 0);

    let north_red = world.objects_at(&pole(0, -3, LightPhase::Red));
    assert_eq!(north_red.len(), 1);
    assert_eq!(north_red[0].facing, Facing::North);
    assert!(north_red[0].locked);
    assert_eq!(north_red[0].display.content.as_ref().unwrap().item, "lamp_cover");

    let north_green = world.objects_at(&pole(0, -3, LightPhase::Green));
    assert_eq!(north_green[0].display.content.as_ref().unwrap().item, "lamp_green");
}

#[test]
fn test_spawn_failure_is_isolated_to_one_light() {
    let mut world = MemoryWorld::new();
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Broken frame");
    intersection.add_side(object_side(&mut world, "North", 0, -3));
    intersection.add_side(cell_side(&mut world, "East", 3, 0));
    intersection.neutral_state = Some(neutral_state());
    let cover_cell = CellPosition::new(WORLD, 50, 1, 50);
    let cover = object_lamp(&mut world, &cover_cell, Facing::South, "lamp_cover");
    intersection.neutral_element = LightElement::capture_object(&world, cover);

    // The north green lamp disappeared and cannot be recreated
    let green = world.objects_at(&pole(0, -3, LightPhase::Green))[0].id;
    world.remove_object(green);
    world.set_fail_spawns(true);

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.failed, 1);
    assert_eq!(report.writes, 5);

    let green_pos = ElementPosition::Object(ObjectPosition::new(
        pole(0, -3, LightPhase::Green),
        Facing::North,
    ));
    assert_eq!(animator.applied_state(&green_pos), None);

    // Once spawning works again the next transition restores it
    world.set_fail_spawns(false);
    clock.advance_ticks(200);
    let report = run(&mut animator, &mut world);
    assert_eq!(report.failed, 0);
    assert_eq!(world.stats.spawns, 1);
    assert_eq!(animator.applied_state(&green_pos), Some(AppliedState::Neutral));
}

/// Records writes instead of executing them
#[derive(Default)]
struct QueueSink {
    writes: Vec<WorldWrite>,
}

impl WorldSink for QueueSink {
    fn submit(&mut self, write: WorldWrite) -> WriteReceipt {
        self.writes.push(write);
        WriteReceipt::Queued
    }
}

#[test]
fn test_failed_queued_write_is_forgotten() {
    let mut world = MemoryWorld::new();
    let intersection = four_way_cells(&mut world);
    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);

    let mut sink = QueueSink::default();
    let report = animator.tick(&mut sink);
    assert_eq!(report.writes, 12);
    assert_eq!(sink.writes.len(), 12);
    assert_eq!(animator.cached_position_count(), 12);

    let east_red = ElementPosition::Cell(pole(EAST.0, EAST.1, LightPhase::Red));
    animator.record_feedback(WriteFeedback {
        target: east_red.clone(),
        applied: false,
    });
    assert_eq!(animator.applied_state(&east_red), None);

    // Successful feedback changes nothing
    let north_green = ElementPosition::Cell(pole(NORTH.0, NORTH.1, LightPhase::Green));
    animator.record_feedback(WriteFeedback {
        target: north_green.clone(),
        applied: true,
    });
    assert_eq!(animator.applied_state(&north_green), lit(LightPhase::Green));

    // East red did not change on this transition but is written again
    sink.writes.clear();
    clock.advance_ticks(200);
    animator.tick(&mut sink);
    assert_eq!(sink.writes.len(), 5);
    assert!(sink.writes.iter().any(|w| w.target() == east_red));
}

#[test]
fn test_unknown_direction_uses_position_order() {
    let mut world = MemoryWorld::new();
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Unlabelled");
    intersection.timing = TimingConfiguration::new(200, 60, 140, 20);
    intersection.add_side(cell_side(&mut world, "Main Street", 0, -3));
    intersection.add_side(cell_side(&mut world, "Harbour Road", 3, 0));
    intersection.neutral_state = Some(neutral_state());

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);

    // Two sides make one group: the first half is green, the rest stays red
    assert_eq!(
        animator.applied_state(&ElementPosition::Cell(pole(0, -3, LightPhase::Green))),
        lit(LightPhase::Green)
    );
    assert_eq!(
        animator.applied_state(&ElementPosition::Cell(pole(3, 0, LightPhase::Red))),
        lit(LightPhase::Red)
    );
}

#[test]
fn test_demo_crossroads_draws_cleanly() {
    let mut world = MemoryWorld::new();
    let intersection = traffic_signals::simulation::demo::build_crossroads(&mut world, "Demo", 0, 0);
    assert!(intersection.is_complete());
    assert!(intersection.has_elements());

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);

    let report = run(&mut animator, &mut world);
    assert_eq!(report.writes, 16);
    assert_eq!(report.failed, 0);
    assert_eq!(report.frozen, 0);
    assert_eq!(world.stats.spawns, 0);
    assert_eq!(world.stats.object_writes, 3);
    assert_eq!(world.stats.dropped_content, 0);
}

/// Lamps captured facing a different way than their side's label are turned
/// toward the label both when lit and when switched off
#[test]
fn test_neutral_follows_side_direction_not_captured_facing() {
    let mut world = MemoryWorld::new();
    let mut north = Side::new("North");
    for phase in LightPhase::ALL {
        let state = CellState::new(material(phase)).with_property("facing", "east");
        north.add_light_element(phase, cell_lamp(&mut world, pole(NORTH.0, NORTH.1, phase), state));
    }
    let mut intersection = Intersection::new(IntersectionId::new_random(), "Skewed");
    intersection.timing = TimingConfiguration::new(200, 60, 140, 20);
    intersection.add_side(north);
    intersection.add_side(cell_side(&mut world, "South", SOUTH.0, SOUTH.1));
    intersection.neutral_state = Some(neutral_state());

    let clock = Arc::new(ManualClock::new());
    let mut animator = animator(&clock);
    animator.start(vec![Arc::new(intersection)]);
    run(&mut animator, &mut world);

    let green = world.cell(&pole(NORTH.0, NORTH.1, LightPhase::Green)).unwrap();
    assert_eq!(green.material, "lamp_green");
    assert_eq!(green.extract_facing(), Some(Facing::North));
    let red = world.cell(&pole(NORTH.0, NORTH.1, LightPhase::Red)).unwrap();
    assert_eq!(red.material, "lamp_off");
    assert_eq!(red.extract_facing(), Some(Facing::North));

    clock.advance_ticks(200);
    run(&mut animator, &mut world);
    let green = world.cell(&pole(NORTH.0, NORTH.1, LightPhase::Green)).unwrap();
    assert_eq!(green.material, "lamp_off");
    assert_eq!(green.extract_facing(), Some(Facing::North));
}
