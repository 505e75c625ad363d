//! Traffic light animator
//!
//! Holds one [`PhaseCycle`] per registered intersection and, whenever a cycle
//! reports a change, works out what every light of that intersection should
//! show. A cache of what was last written to each position means a
//! transition only writes the lights whose appearance actually changed.
//!
//! The animator does not write to the world itself. It hands [`WorldWrite`]s
//! to a [`WorldSink`], which either executes them immediately
//! ([`DirectSink`]) or forwards them to the thread that owns the world.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::config::SignalConfig;
use super::cycle::{Clock, CyclePhase, PhaseCycle};
use super::element::{ApplyOutcome, LightElement};
use super::error::{RegistrationError, WorldError};
use super::intersection::Intersection;
use super::side::{PedestrianLights, PhaseLights, Side};
use super::types::{CellPosition, DirectionGroup, ElementPosition, Facing, IntersectionId, LightPhase};
use super::world::World;

/// The meaning of a lit light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalAspect {
    Vehicle(LightPhase),
    Walk,
    DontWalk,
}

/// What the animator last wrote to a position.
///
/// A position missing from the cache has never been written (or its last
/// write did not land), which always forces the next write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppliedState {
    Lit(SignalAspect),
    Neutral,
}

/// One world mutation computed by the animator
#[derive(Debug, Clone, PartialEq)]
pub enum WorldWrite {
    /// Show a light's own captured state, turned toward `direction` if given
    Show {
        element: LightElement,
        direction: Option<String>,
    },
    /// Show `element` (the neutral appearance, already placed at the
    /// light's position) with the orientation of the light it replaces.
    /// A cell turned toward `direction` when lit is turned the same way here.
    ShowFacingFrom {
        element: LightElement,
        facing_source: LightElement,
        direction: Option<String>,
    },
}

impl WorldWrite {
    /// Position of the light being written
    pub fn target(&self) -> ElementPosition {
        match self {
            WorldWrite::Show { element, .. } => element.position(),
            WorldWrite::ShowFacingFrom { facing_source, .. } => facing_source.position(),
        }
    }

    pub fn execute(&self, world: &mut dyn World) -> Result<ApplyOutcome, WorldError> {
        match self {
            WorldWrite::Show { element, direction } => element.apply(world, direction.as_deref()),
            WorldWrite::ShowFacingFrom {
                element,
                facing_source,
                direction,
            } => {
                let label = direction.as_deref().filter(|label| Facing::from_label(label).is_some());
                match label {
                    Some(label) if !element.is_placed_object() => element.apply(world, Some(label)),
                    _ => element.apply_with_facing_from(world, facing_source),
                }
            }
        }
    }
}

/// What became of a submitted write
#[derive(Debug)]
pub enum WriteReceipt {
    /// Executed immediately
    Done(Result<ApplyOutcome, WorldError>),
    /// Accepted for execution elsewhere; the outcome arrives later as
    /// [`WriteFeedback`]
    Queued,
    /// Could not be handed over at all
    Dropped,
}

/// Destination for world writes
pub trait WorldSink {
    fn submit(&mut self, write: WorldWrite) -> WriteReceipt;
}

/// Executes writes inline against a world
pub struct DirectSink<'w> {
    world: &'w mut dyn World,
}

impl<'w> DirectSink<'w> {
    pub fn new(world: &'w mut dyn World) -> Self {
        Self { world }
    }
}

impl WorldSink for DirectSink<'_> {
    fn submit(&mut self, write: WorldWrite) -> WriteReceipt {
        WriteReceipt::Done(write.execute(self.world))
    }
}

/// Outcome of a queued write, reported back by the world thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFeedback {
    pub target: ElementPosition,
    pub applied: bool,
}

/// Counters for one animator tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Intersections whose displayed state changed
    pub transitions: usize,
    /// Writes executed or queued
    pub writes: usize,
    /// Lights already showing the right thing
    pub unchanged: usize,
    /// Writes skipped because the region was not active
    pub skipped: usize,
    /// Writes that failed or could not be handed over
    pub failed: usize,
    /// Lights left alone because no matching neutral appearance exists
    pub frozen: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Diagnostic {
    UnknownDirection,
    MissingNeutral,
}

#[derive(Debug)]
struct TrackedIntersection {
    intersection: Arc<Intersection>,
    cycle: PhaseCycle,
}

/// Drives every registered intersection
pub struct Animator {
    config: SignalConfig,
    clock: Arc<dyn Clock>,
    tracked: HashMap<IntersectionId, TrackedIntersection>,
    applied: HashMap<ElementPosition, AppliedState>,
    reported: HashSet<(IntersectionId, usize, Diagnostic)>,
    running: bool,
}

impl Animator {
    pub fn new(config: SignalConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            tracked: HashMap::new(),
            applied: HashMap::new(),
            reported: HashSet::new(),
            running: false,
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Ticks between two animator runs
    pub fn tick_interval(&self) -> u32 {
        self.config.animation.tick_interval
    }

    /// Build a cycle for every complete intersection and mark the animator running
    pub fn start<I>(&mut self, intersections: I)
    where
        I: IntoIterator<Item = Arc<Intersection>>,
    {
        if self.running {
            warn!("Animator is already running");
            return;
        }
        let now = self.clock.now_millis();
        for intersection in intersections {
            if !intersection.is_complete() {
                debug!("Skipping incomplete intersection '{}'", intersection.name);
                continue;
            }
            let cycle = PhaseCycle::new(&intersection, now);
            self.tracked.insert(
                intersection.id,
                TrackedIntersection {
                    intersection,
                    cycle,
                },
            );
        }
        self.running = true;
        info!(
            "Traffic light animator started (tick interval: {} ticks, {} intersections)",
            self.tick_interval(),
            self.tracked.len()
        );
    }

    /// Drop every cycle and the applied-state cache
    pub fn stop(&mut self) {
        self.tracked.clear();
        self.applied.clear();
        self.reported.clear();
        self.running = false;
        info!("Traffic light animator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Replace the configuration, restarting with the same intersections if running
    pub fn reload_config(&mut self, config: SignalConfig) {
        if self.running {
            let intersections: Vec<Arc<Intersection>> = self
                .tracked
                .values()
                .map(|t| Arc::clone(&t.intersection))
                .collect();
            self.stop();
            self.config = config;
            self.start(intersections);
        } else {
            self.config = config;
        }
    }

    /// Start animating an intersection.
    ///
    /// Incomplete intersections are rejected and nothing changes. Registering
    /// an intersection that is already tracked restarts its cycle and forgets
    /// everything written for it.
    pub fn register_intersection(&mut self, intersection: Arc<Intersection>) -> Result<(), RegistrationError> {
        intersection.validate()?;
        if let Some(previous) = self.tracked.remove(&intersection.id) {
            self.forget(&previous.intersection);
        }
        self.forget(&intersection);
        let cycle = PhaseCycle::new(&intersection, self.clock.now_millis());
        info!("Registered intersection for animation: {}", intersection.name);
        self.tracked.insert(
            intersection.id,
            TrackedIntersection {
                intersection,
                cycle,
            },
        );
        Ok(())
    }

    /// Stop animating an intersection and purge its cache entries
    pub fn unregister_intersection(&mut self, id: &IntersectionId) -> Option<Arc<Intersection>> {
        let tracked = self.tracked.remove(id)?;
        self.forget(&tracked.intersection);
        info!("Unregistered intersection from animation: {}", tracked.intersection.name);
        Some(tracked.intersection)
    }

    fn forget(&mut self, intersection: &Intersection) {
        for position in intersection.all_positions() {
            self.applied.remove(&position);
        }
        self.reported.retain(|(id, _, _)| *id != intersection.id);
    }

    pub fn cycle(&self, id: &IntersectionId) -> Option<&PhaseCycle> {
        self.tracked.get(id).map(|t| &t.cycle)
    }

    pub fn active_cycle_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn intersections(&self) -> impl Iterator<Item = &Arc<Intersection>> {
        self.tracked.values().map(|t| &t.intersection)
    }

    /// What was last written at a position, `None` if never
    pub fn applied_state(&self, position: &ElementPosition) -> Option<AppliedState> {
        self.applied.get(position).copied()
    }

    pub fn cached_position_count(&self) -> usize {
        self.applied.len()
    }

    /// Apply the outcome of a queued write. A write that did not land is
    /// forgotten so the next transition writes it again.
    pub fn record_feedback(&mut self, feedback: WriteFeedback) {
        if !feedback.applied {
            self.applied.remove(&feedback.target);
        }
    }

    /// Advance every cycle and redraw the intersections that changed
    pub fn tick(&mut self, sink: &mut dyn WorldSink) -> TickReport {
        let now = self.clock.now_millis();
        let mut painter = Painter {
            applied: &mut self.applied,
            reported: &mut self.reported,
            sink,
            report: TickReport::default(),
        };

        for tracked in self.tracked.values_mut() {
            if tracked.cycle.tick(now) {
                painter.report.transitions += 1;
                painter.update_intersection(&tracked.intersection, tracked.cycle.current_phase());
            }
        }

        painter.report
    }
}

/// Per-tick view over the animator's cache while writes are issued
struct Painter<'a> {
    applied: &'a mut HashMap<ElementPosition, AppliedState>,
    reported: &'a mut HashSet<(IntersectionId, usize, Diagnostic)>,
    sink: &'a mut dyn WorldSink,
    report: TickReport,
}

impl Painter<'_> {
    fn update_intersection(&mut self, intersection: &Intersection, phase: CyclePhase) {
        let side_count = intersection.sides.len();
        debug!(
            "=== Updating intersection {} === phase {} (group {}, sub-phase {})",
            intersection.name, phase.phase_index, phase.active_group, phase.sub_phase
        );

        for (index, side) in intersection.sides.iter().enumerate() {
            let direction_group = side.direction_group();
            if direction_group == DirectionGroup::Unknown
                && self.first_report(intersection.id, index, Diagnostic::UnknownDirection)
            {
                warn!(
                    "Side {} ('{}') of '{}' has an unrecognised direction, using position order",
                    index, side.direction, intersection.name
                );
            }
            let group = CyclePhase::group_for(direction_group, index, side_count);
            let light = phase.phase_for_group(group);
            let walk = phase.pedestrian_green_for_group(group);
            debug!("  side {} ({}) -> group {} {} walk={}", index, side.direction, group, light, walk);

            self.update_side(intersection, index, side, light);
            if let Some(pedestrian) = side.pedestrian_lights() {
                self.update_pedestrians(intersection, index, side, pedestrian, walk);
            }
        }
    }

    fn update_side(&mut self, intersection: &Intersection, index: usize, side: &Side, active: LightPhase) {
        for phase in LightPhase::ALL {
            let aspect = SignalAspect::Vehicle(phase);
            let lit = phase == active;
            match side.lights_for(phase) {
                PhaseLights::Elements(elements) => {
                    for element in elements {
                        self.update_light(intersection, index, element, lit, aspect, Some(&side.direction));
                    }
                }
                PhaseLights::Cells(cells) => {
                    for cell in cells {
                        if let Some(element) = plain_cell(side, cell) {
                            self.update_light(intersection, index, &element, lit, aspect, Some(&side.direction));
                        }
                    }
                }
                PhaseLights::None => {}
            }
        }
    }

    /// Walk lights show during `walk`, don't-walk lights the rest of the time.
    /// Both keep their captured orientation.
    fn update_pedestrians(
        &mut self,
        intersection: &Intersection,
        index: usize,
        side: &Side,
        lights: PedestrianLights<'_>,
        walk: bool,
    ) {
        match lights {
            PedestrianLights::Elements { green, red } => {
                for element in green {
                    self.update_light(intersection, index, element, walk, SignalAspect::Walk, None);
                }
                for element in red {
                    self.update_light(intersection, index, element, !walk, SignalAspect::DontWalk, None);
                }
            }
            PedestrianLights::Cells { green, red } => {
                for cell in green {
                    if let Some(element) = plain_cell(side, cell) {
                        self.update_light(intersection, index, &element, walk, SignalAspect::Walk, None);
                    }
                }
                for cell in red {
                    if let Some(element) = plain_cell(side, cell) {
                        self.update_light(intersection, index, &element, !walk, SignalAspect::DontWalk, None);
                    }
                }
            }
        }
    }

    fn update_light(
        &mut self,
        intersection: &Intersection,
        index: usize,
        element: &LightElement,
        lit: bool,
        aspect: SignalAspect,
        direction: Option<&str>,
    ) {
        let target = element.position();
        let desired = if lit {
            AppliedState::Lit(aspect)
        } else {
            AppliedState::Neutral
        };

        if self.applied.get(&target) == Some(&desired) {
            self.report.unchanged += 1;
            return;
        }

        let write = if lit {
            WorldWrite::Show {
                element: element.clone(),
                direction: direction.map(str::to_string),
            }
        } else {
            match intersection.neutral_for(element) {
                Some(neutral) => WorldWrite::ShowFacingFrom {
                    element: neutral,
                    facing_source: element.clone(),
                    direction: direction.map(str::to_string),
                },
                None => {
                    self.report.frozen += 1;
                    if self.first_report(intersection.id, index, Diagnostic::MissingNeutral) {
                        warn!(
                            "Intersection '{}' has no neutral {} appearance for side '{}', leaving its lights as they are",
                            intersection.name,
                            element.element_type(),
                            intersection.sides[index].direction
                        );
                    }
                    return;
                }
            }
        };

        debug!("  setting {} to {:?}", target, desired);
        match self.sink.submit(write) {
            WriteReceipt::Done(Ok(ApplyOutcome::Applied)) | WriteReceipt::Queued => {
                self.applied.insert(target, desired);
                self.report.writes += 1;
            }
            WriteReceipt::Done(Ok(ApplyOutcome::Skipped)) => {
                self.report.skipped += 1;
            }
            WriteReceipt::Done(Err(e)) => {
                warn!("Failed to update light at {}: {}", target, e);
                self.report.failed += 1;
            }
            WriteReceipt::Dropped => {
                self.report.failed += 1;
            }
        }
    }

    fn first_report(&mut self, id: IntersectionId, index: usize, diagnostic: Diagnostic) -> bool {
        self.reported.insert((id, index, diagnostic))
    }
}

/// A plain cell light as an element, using its captured state
fn plain_cell(side: &Side, cell: &CellPosition) -> Option<LightElement> {
    side.cell_state(cell)
        .map(|state| LightElement::cell(cell.clone(), state.clone()))
}
