//! Traffic Signals Library
//!
//! Cycles the lights of signalled intersections through green, orange and
//! red, writing only the lights whose appearance changed.

pub mod simulation;
