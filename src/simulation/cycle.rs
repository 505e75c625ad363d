//! Phase cycle state machine
//!
//! Sides are split into direction groups. Each group in turn runs green,
//! orange and an all-red gap, so a cycle has `groups * 3` sub-phases. The
//! cycle is pure state over elapsed time and timing and never touches the
//! world.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::intersection::{Intersection, SUB_PHASES_PER_GROUP};
use super::timing::{ticks_to_millis, TimingConfiguration};
use super::types::{DirectionGroup, LightPhase, MILLIS_PER_TICK};

/// Source of the current time in milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time since the clock was created
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to (tests and the headless runner)
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ticks(&self, ticks: u64) {
        self.advance_millis(ticks * MILLIS_PER_TICK);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Snapshot of where a cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePhase {
    pub phase_index: usize,
    pub active_group: usize,
    pub sub_phase: usize,
    pub group_count: usize,
    /// Whether the pedestrian walk window of this green is still open
    pub walk_open: bool,
}

impl CyclePhase {
    /// Colour of the group whose turn it is
    pub fn active_light(&self) -> LightPhase {
        match self.sub_phase {
            0 => LightPhase::Green,
            1 => LightPhase::Orange,
            _ => LightPhase::Red,
        }
    }

    /// Colour for a direction group; any group not on turn is red
    pub fn phase_for_group(&self, group: usize) -> LightPhase {
        if group == self.active_group {
            self.active_light()
        } else {
            LightPhase::Red
        }
    }

    /// Pedestrians of a group walk while the crossing group has green
    pub fn pedestrian_green_for_group(&self, group: usize) -> bool {
        self.walk_open && self.sub_phase == 0 && group <= 1 && self.active_group == 1 - group
    }

    pub fn ns_phase(&self) -> LightPhase {
        self.phase_for_group(0)
    }

    pub fn ew_phase(&self) -> LightPhase {
        self.phase_for_group(1)
    }

    pub fn ns_pedestrian_green(&self) -> bool {
        self.pedestrian_green_for_group(0)
    }

    pub fn ew_pedestrian_green(&self) -> bool {
        self.pedestrian_green_for_group(1)
    }

    /// Position-order group: the first half (rounded up) is group 0
    pub fn side_group(index: usize, side_count: usize) -> usize {
        if index < side_count.div_ceil(2) {
            0
        } else {
            1
        }
    }

    /// Group for a side: north/south sides are group 0, east/west group 1,
    /// anything else falls back to position order.
    pub fn group_for(direction: DirectionGroup, index: usize, side_count: usize) -> usize {
        match direction {
            DirectionGroup::NorthSouth => 0,
            DirectionGroup::EastWest => 1,
            DirectionGroup::Unknown => Self::side_group(index, side_count),
        }
    }

    pub fn is_all_red(&self) -> bool {
        self.sub_phase == 2 || self.active_group > 1
    }
}

/// Per-intersection phase state driven by the animator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCycle {
    timing: TimingConfiguration,
    side_count: usize,
    group_count: usize,
    phase_index: usize,
    last_change_ms: u64,
    walk_open: bool,
    drawn: bool,
}

impl PhaseCycle {
    pub fn new(intersection: &Intersection, now_ms: u64) -> Self {
        Self::with_layout(intersection.timing, intersection.sides.len(), now_ms)
    }

    pub fn with_layout(timing: TimingConfiguration, side_count: usize, now_ms: u64) -> Self {
        Self {
            timing,
            side_count,
            group_count: side_count.div_ceil(2).max(1),
            phase_index: 0,
            last_change_ms: now_ms,
            walk_open: timing.pedestrian_ticks > 0,
            drawn: false,
        }
    }

    pub fn timing(&self) -> &TimingConfiguration {
        &self.timing
    }

    pub fn side_count(&self) -> usize {
        self.side_count
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn total_sub_phases(&self) -> usize {
        self.group_count * SUB_PHASES_PER_GROUP
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn sub_phase(&self) -> usize {
        self.phase_index % SUB_PHASES_PER_GROUP
    }

    pub fn active_group(&self) -> usize {
        (self.phase_index / SUB_PHASES_PER_GROUP) % self.group_count
    }

    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }

    /// Duration of the current sub-phase in milliseconds
    pub fn current_duration_ms(&self) -> u64 {
        self.timing.millis_for_sub_phase(self.sub_phase())
    }

    pub fn should_advance(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_change_ms) >= self.current_duration_ms()
    }

    /// Move to the next sub-phase, wrapping after the last one
    pub fn advance(&mut self, now_ms: u64) {
        self.phase_index = (self.phase_index + 1) % self.total_sub_phases();
        self.last_change_ms = now_ms;
        self.walk_open = self.sub_phase() == 0 && self.timing.pedestrian_ticks > 0;
    }

    /// Milliseconds left in the current sub-phase
    pub fn millis_until_advance(&self, now_ms: u64) -> u64 {
        self.current_duration_ms()
            .saturating_sub(now_ms.saturating_sub(self.last_change_ms))
    }

    /// Advance if due. Returns true when what should be displayed changed.
    ///
    /// The first call after construction always reports a change so the
    /// initial state gets drawn. At most one sub-phase is advanced per call.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.drawn {
            self.drawn = true;
            return true;
        }
        if self.should_advance(now_ms) {
            self.advance(now_ms);
            return true;
        }
        if self.walk_open && self.walk_window_elapsed(now_ms) {
            self.walk_open = false;
            return true;
        }
        false
    }

    fn walk_window_elapsed(&self, now_ms: u64) -> bool {
        let window = self.timing.pedestrian_ticks.min(self.timing.green_ticks);
        self.sub_phase() == 0 && now_ms.saturating_sub(self.last_change_ms) >= ticks_to_millis(window)
    }

    pub fn current_phase(&self) -> CyclePhase {
        CyclePhase {
            phase_index: self.phase_index,
            active_group: self.active_group(),
            sub_phase: self.sub_phase(),
            group_count: self.group_count,
            walk_open: self.walk_open,
        }
    }
}
