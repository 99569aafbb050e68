//! Hardware and engine capability traits
//!
//! These traits define the interface between the bridge logic and the
//! hardware drivers on one side and the UI engine on the other.

pub mod engine;
pub mod panel;
pub mod touch;

pub use engine::{DisplayPort, GraphicsEngine};
pub use panel::PanelBus;
pub use touch::{RawTouchSample, TouchController};
