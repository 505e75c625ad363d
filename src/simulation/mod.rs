//! Traffic signal engine
//!
//! Everything here runs against the [`World`] trait, so the engine can be
//! exercised from the console and from tests with [`MemoryWorld`] without a
//! live host.

mod animator;
mod config;
mod cycle;
pub mod demo;
mod element;
mod error;
mod intersection;
mod registry;
mod scheduler;
mod side;
mod timing;
mod types;
mod world;

pub use animator::{
    Animator, AppliedState, DirectSink, SignalAspect, TickReport, WorldSink, WorldWrite, WriteFeedback,
    WriteReceipt,
};
pub use config::{AnimationConfig, SignalConfig, DEFAULT_TICK_INTERVAL};
pub use cycle::{Clock, CyclePhase, ManualClock, PhaseCycle, SystemClock};
pub use element::{locate_object, ApplyOutcome, CellState, LightElement, PlacedObjectState, EXACT_MATCH_TOLERANCE};
pub use error::{ConfigError, RegistrationError, WorldError};
pub use intersection::{Intersection, SUB_PHASES_PER_GROUP};
pub use registry::IntersectionRegistry;
pub use scheduler::SignalService;
pub use side::{PedestrianLights, PhaseLights, Side};
pub use timing::{ticks_to_millis, TimingConfiguration};
pub use types::{
    CellPosition, DirectionGroup, ElementPosition, Facing, IntersectionId, LightPhase, ObjectPosition, RegionKey,
    MILLIS_PER_TICK, REGION_SIZE,
};
pub use world::{
    ContentRef, ExactCoords, MemoryWorld, ObjectDisplay, ObjectId, ObjectSpawn, PlacedObject, World, WriteStats,
};
