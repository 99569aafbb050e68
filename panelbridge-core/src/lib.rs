//! Board-agnostic core logic for the display/touch bridge
//!
//! This crate contains all bridge logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware capability traits (panel bus, touch controller, UI engine)
//! - Screen geometry and display rotation remaps
//! - Touch calibration transform, sampler and interactive procedure
//! - Calibration persistence
//! - Dirty-rectangle flush protocol
//! - Millisecond tick accounting for the UI engine clock
//! - The cooperative bridge loop tying them together
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bridge;
pub mod calibration;
pub mod config;
pub mod flush;
pub mod geometry;
pub mod tick;
pub mod touch;
pub mod traits;

pub use bridge::{Bridge, BridgeError, IterationReport};
pub use calibration::{ensure_calibration, CalibrationError, CalibrationOutcome, CalibrationStore};
pub use config::BridgeConfig;
pub use flush::{DisplayFlusher, FlushComplete, FlushError};
pub use geometry::{DirtyRect, PanelSize, Rotation, ScreenPoint};
pub use tick::TickScheduler;
pub use touch::{CalibrationTransform, TouchReading, TouchSampler, TouchState};
