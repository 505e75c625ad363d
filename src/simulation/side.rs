//! One approach of an intersection
//!
//! A side carries its lights in two representations. The element lists
//! (cells and placed objects) are the current one; plain cell lists with a
//! captured state per position are kept for intersections configured before
//! elements existed. For a given phase the element list wins whenever it is
//! non-empty, see [`Side::lights_for`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::element::{CellState, LightElement};
use super::types::{CellPosition, DirectionGroup, ElementPosition, LightPhase};

/// Lights to drive for one phase, resolved from whichever representation is present
#[derive(Debug, Clone, Copy)]
pub enum PhaseLights<'a> {
    Elements(&'a [LightElement]),
    Cells(&'a [CellPosition]),
    None,
}

/// Pedestrian walk / don't-walk lights, resolved like [`PhaseLights`]
#[derive(Debug, Clone, Copy)]
pub enum PedestrianLights<'a> {
    Elements {
        green: &'a [LightElement],
        red: &'a [LightElement],
    },
    Cells {
        green: &'a [CellPosition],
        red: &'a [CellPosition],
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Side {
    pub direction: String,

    #[serde(default)]
    light_elements: HashMap<LightPhase, Vec<LightElement>>,
    /// Latest element registered at each position
    #[serde(skip)]
    element_index: HashMap<ElementPosition, LightElement>,
    #[serde(default)]
    pedestrian_green_elements: Vec<LightElement>,
    #[serde(default)]
    pedestrian_red_elements: Vec<LightElement>,

    #[serde(default)]
    light_cells: HashMap<LightPhase, Vec<CellPosition>>,
    #[serde(default, with = "cell_state_list")]
    cell_states: HashMap<CellPosition, CellState>,
    #[serde(default)]
    pedestrian_green_cells: Vec<CellPosition>,
    #[serde(default)]
    pedestrian_red_cells: Vec<CellPosition>,
}

impl Side {
    pub fn new(direction: impl Into<String>) -> Self {
        Self {
            direction: direction.into(),
            ..Self::default()
        }
    }

    pub fn direction_group(&self) -> DirectionGroup {
        DirectionGroup::classify(&self.direction)
    }

    // ==================== Element-based lights ====================

    pub fn add_light_element(&mut self, phase: LightPhase, element: LightElement) {
        self.element_index.insert(element.position(), element.clone());
        self.light_elements.entry(phase).or_default().push(element);
    }

    /// Replace every element of one phase
    pub fn set_light_elements(&mut self, phase: LightPhase, elements: Vec<LightElement>) {
        for old in self.light_elements.remove(&phase).unwrap_or_default() {
            self.element_index.remove(&old.position());
        }
        for element in &elements {
            self.element_index.insert(element.position(), element.clone());
        }
        self.light_elements.insert(phase, elements);
    }

    pub fn light_elements(&self, phase: LightPhase) -> &[LightElement] {
        self.light_elements
            .get(&phase)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_pedestrian_green_element(&mut self, element: LightElement) {
        self.element_index.insert(element.position(), element.clone());
        self.pedestrian_green_elements.push(element);
    }

    pub fn add_pedestrian_red_element(&mut self, element: LightElement) {
        self.element_index.insert(element.position(), element.clone());
        self.pedestrian_red_elements.push(element);
    }

    pub fn pedestrian_green_elements(&self) -> &[LightElement] {
        &self.pedestrian_green_elements
    }

    pub fn pedestrian_red_elements(&self) -> &[LightElement] {
        &self.pedestrian_red_elements
    }

    /// The element registered at a position, if any
    pub fn element_at(&self, position: &ElementPosition) -> Option<&LightElement> {
        self.element_index.get(position)
    }

    /// Every element across phases and pedestrian lists
    pub fn all_elements(&self) -> impl Iterator<Item = &LightElement> {
        LightPhase::ALL
            .into_iter()
            .flat_map(move |phase| self.light_elements(phase).iter())
            .chain(self.pedestrian_green_elements.iter())
            .chain(self.pedestrian_red_elements.iter())
    }

    pub fn has_elements(&self) -> bool {
        self.light_elements.values().any(|elements| !elements.is_empty())
    }

    /// At least one element for every phase
    pub fn is_elements_complete(&self) -> bool {
        LightPhase::ALL
            .iter()
            .all(|phase| !self.light_elements(*phase).is_empty())
    }

    pub fn has_pedestrian_elements(&self) -> bool {
        !self.pedestrian_green_elements.is_empty() && !self.pedestrian_red_elements.is_empty()
    }

    // ==================== Plain-cell lights ====================

    pub fn add_light_cell(&mut self, phase: LightPhase, position: CellPosition, state: CellState) {
        self.light_cells.entry(phase).or_default().push(position.clone());
        self.cell_states.insert(position, state);
    }

    pub fn add_pedestrian_green_cell(&mut self, position: CellPosition, state: CellState) {
        self.pedestrian_green_cells.push(position.clone());
        self.cell_states.insert(position, state);
    }

    pub fn add_pedestrian_red_cell(&mut self, position: CellPosition, state: CellState) {
        self.pedestrian_red_cells.push(position.clone());
        self.cell_states.insert(position, state);
    }

    pub fn light_cells(&self, phase: LightPhase) -> &[CellPosition] {
        self.light_cells
            .get(&phase)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Captured state of a plain cell light
    pub fn cell_state(&self, position: &CellPosition) -> Option<&CellState> {
        self.cell_states.get(position)
    }

    /// Every plain cell across phases and pedestrian lists, without duplicates
    pub fn all_cells(&self) -> Vec<CellPosition> {
        let mut seen = HashSet::new();
        LightPhase::ALL
            .into_iter()
            .flat_map(|phase| self.light_cells(phase).iter())
            .chain(self.pedestrian_green_cells.iter())
            .chain(self.pedestrian_red_cells.iter())
            .filter(|cell| seen.insert(*cell))
            .cloned()
            .collect()
    }

    /// At least one plain cell for every phase
    pub fn is_complete(&self) -> bool {
        LightPhase::ALL
            .iter()
            .all(|phase| !self.light_cells(*phase).is_empty())
    }

    pub fn has_pedestrian_lights(&self) -> bool {
        !self.pedestrian_green_cells.is_empty() && !self.pedestrian_red_cells.is_empty()
    }

    // ==================== Resolution ====================

    /// Complete by either representation
    pub fn is_operational(&self) -> bool {
        self.is_elements_complete() || self.is_complete()
    }

    /// The lights to drive for `phase`: elements when that phase has any,
    /// otherwise the plain cells.
    pub fn lights_for(&self, phase: LightPhase) -> PhaseLights<'_> {
        let elements = self.light_elements(phase);
        if !elements.is_empty() {
            return PhaseLights::Elements(elements);
        }
        let cells = self.light_cells(phase);
        if !cells.is_empty() {
            return PhaseLights::Cells(cells);
        }
        PhaseLights::None
    }

    pub fn pedestrian_lights(&self) -> Option<PedestrianLights<'_>> {
        if self.has_pedestrian_elements() {
            Some(PedestrianLights::Elements {
                green: &self.pedestrian_green_elements,
                red: &self.pedestrian_red_elements,
            })
        } else if self.has_pedestrian_lights() {
            Some(PedestrianLights::Cells {
                green: &self.pedestrian_green_cells,
                red: &self.pedestrian_red_cells,
            })
        } else {
            None
        }
    }

    /// Every position this side can write to
    pub fn all_positions(&self) -> HashSet<ElementPosition> {
        let mut positions: HashSet<ElementPosition> =
            self.all_elements().map(LightElement::position).collect();
        positions.extend(self.all_cells().into_iter().map(ElementPosition::Cell));
        positions
    }

    /// Rebuild the position index after deserialization
    pub(crate) fn reindex(&mut self) {
        let index: HashMap<ElementPosition, LightElement> = self
            .all_elements()
            .map(|element| (element.position(), element.clone()))
            .collect();
        self.element_index = index;
    }
}

/// Cell states keyed by a struct don't map onto JSON objects, store them as pairs
mod cell_state_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    use super::{CellPosition, CellState};

    pub fn serialize<S: Serializer>(map: &HashMap<CellPosition, CellState>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pairs: Vec<(&CellPosition, &CellState)> = map.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HashMap<CellPosition, CellState>, D::Error> {
        let pairs: Vec<(CellPosition, CellState)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
