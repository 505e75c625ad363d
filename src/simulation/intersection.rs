//! Intersection model
//!
//! An intersection groups its sides, timing and "lights off" appearance. It
//! also still carries a self-contained phase counter from before the
//! animator existed. The animator drives [`PhaseCycle`](super::cycle::PhaseCycle)
//! instead and never reads those fields.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::element::{CellState, LightElement};
use super::error::RegistrationError;
use super::side::Side;
use super::timing::TimingConfiguration;
use super::types::{ElementPosition, IntersectionId, LightPhase};

/// Sub-phases per direction group: green, orange, all-red gap
pub const SUB_PHASES_PER_GROUP: usize = 3;

/// A signalled intersection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intersection {
    pub id: IntersectionId,
    pub name: String,
    #[serde(default)]
    pub sides: Vec<Side>,
    #[serde(default)]
    pub timing: TimingConfiguration,
    /// Plain-cell "off" appearance
    #[serde(default)]
    pub neutral_state: Option<CellState>,
    /// "Off" appearance for element-based lights
    #[serde(default)]
    pub neutral_element: Option<LightElement>,
    #[serde(default)]
    pub current_phase_index: usize,
    #[serde(default)]
    pub last_phase_change_ms: u64,
}

impl Intersection {
    pub fn new(id: IntersectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sides: Vec::new(),
            timing: TimingConfiguration::default(),
            neutral_state: None,
            neutral_element: None,
            current_phase_index: 0,
            last_phase_change_ms: 0,
        }
    }

    pub fn add_side(&mut self, side: Side) {
        self.sides.push(side);
    }

    /// Remove the side with this direction label, returning it
    pub fn remove_side(&mut self, direction: &str) -> Option<Side> {
        let index = self.sides.iter().position(|s| s.direction == direction)?;
        Some(self.sides.remove(index))
    }

    /// Ready to be animated: at least two sides, every side complete in
    /// either representation, and a neutral appearance.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`is_complete`](Self::is_complete) but says what is missing
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let incomplete = |reason| RegistrationError::Incomplete {
            id: self.id,
            name: self.name.clone(),
            reason,
        };
        if self.sides.len() < 2 {
            return Err(incomplete("fewer than two sides"));
        }
        if !self.sides.iter().all(Side::is_operational) {
            return Err(incomplete("a side is missing lights for some phase"));
        }
        if self.neutral_state.is_none() && self.neutral_element.is_none() {
            return Err(incomplete("no neutral appearance"));
        }
        Ok(())
    }

    pub fn has_elements(&self) -> bool {
        self.sides.iter().any(Side::has_elements) || self.neutral_element.is_some()
    }

    /// The neutral appearance to show on `target`, placed at its position.
    ///
    /// Cells use the neutral element when it is a cell, else the plain-cell
    /// neutral state. Placed objects need a placed-object neutral element.
    pub fn neutral_for(&self, target: &LightElement) -> Option<LightElement> {
        if let Some(relocated) = self
            .neutral_element
            .as_ref()
            .and_then(|neutral| neutral.relocated_onto(target))
        {
            return Some(relocated);
        }
        match (target, &self.neutral_state) {
            (LightElement::Cell { position, .. }, Some(state)) => {
                Some(LightElement::cell(position.clone(), state.clone()))
            }
            _ => None,
        }
    }

    /// Every position written by any side
    pub fn all_positions(&self) -> HashSet<ElementPosition> {
        self.sides.iter().flat_map(Side::all_positions).collect()
    }

    /// Rebuild derived indexes after deserialization
    pub fn reindex(&mut self) {
        for side in &mut self.sides {
            side.reindex();
        }
    }

    // ==================== Self-contained phase counter ====================

    /// Number of direction groups (half the sides, rounded up)
    pub fn group_count(&self) -> usize {
        self.sides.len().div_ceil(2).max(1)
    }

    pub fn total_phases(&self) -> usize {
        self.group_count() * SUB_PHASES_PER_GROUP
    }

    pub fn advance_phase(&mut self, now_ms: u64) {
        self.current_phase_index = (self.current_phase_index + 1) % self.total_phases();
        self.last_phase_change_ms = now_ms;
    }

    pub fn should_advance_phase(&self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_phase_change_ms);
        elapsed >= self.timing.millis_for_sub_phase(self.current_phase_index % SUB_PHASES_PER_GROUP)
    }

    /// Sides of the group whose turn it is, by configuration order
    pub fn active_sides(&self) -> &[Side] {
        let per_group = self.sides.len().div_ceil(2);
        if self.sides.len() < 2 || per_group == 0 {
            return &[];
        }
        let group = self.current_phase_index / SUB_PHASES_PER_GROUP;
        let start = (group * per_group).min(self.sides.len());
        let end = (start + per_group).min(self.sides.len());
        &self.sides[start..end]
    }

    /// Colour shown by the active sides
    pub fn current_light_phase(&self) -> LightPhase {
        match self.current_phase_index % SUB_PHASES_PER_GROUP {
            0 => LightPhase::Green,
            1 => LightPhase::Orange,
            _ => LightPhase::Red,
        }
    }
}
