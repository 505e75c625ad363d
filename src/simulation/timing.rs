//! Phase durations for an intersection

use serde::{Deserialize, Serialize};

use super::types::MILLIS_PER_TICK;

/// Durations (in ticks) of each part of a signal cycle.
///
/// A configuration where green, orange and gap are all zero is accepted;
/// the cycle then advances on every tick and shows nothing meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimingConfiguration {
    pub green_ticks: u32,
    pub orange_ticks: u32,
    pub pedestrian_ticks: u32,
    pub all_red_gap_ticks: u32,
}

impl TimingConfiguration {
    pub fn new(green_ticks: u32, orange_ticks: u32, pedestrian_ticks: u32, all_red_gap_ticks: u32) -> Self {
        Self {
            green_ticks,
            orange_ticks,
            pedestrian_ticks,
            all_red_gap_ticks,
        }
    }

    /// Duration in ticks of a sub-phase (0 = green, 1 = orange, 2 = all-red gap)
    pub fn ticks_for_sub_phase(&self, sub_phase: usize) -> u32 {
        match sub_phase % 3 {
            0 => self.green_ticks,
            1 => self.orange_ticks,
            _ => self.all_red_gap_ticks,
        }
    }

    /// Duration in milliseconds of a sub-phase
    pub fn millis_for_sub_phase(&self, sub_phase: usize) -> u64 {
        ticks_to_millis(self.ticks_for_sub_phase(sub_phase))
    }

    /// Length of one group's green + orange + gap
    pub fn group_cycle_ticks(&self) -> u64 {
        u64::from(self.green_ticks) + u64::from(self.orange_ticks) + u64::from(self.all_red_gap_ticks)
    }
}

impl Default for TimingConfiguration {
    fn default() -> Self {
        Self::new(200, 60, 140, 20)
    }
}

pub fn ticks_to_millis(ticks: u32) -> u64 {
    u64::from(ticks) * MILLIS_PER_TICK
}
