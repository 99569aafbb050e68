//! UI engine capability traits
//!
//! The retained-mode UI engine is an external collaborator. Instead of
//! registering global flush and input callbacks, the bridge hands the engine
//! a [`DisplayPort`] on every call to [`GraphicsEngine::task_handler`].

use crate::flush::{FlushComplete, FlushError};
use crate::geometry::DirtyRect;
use crate::touch::TouchReading;

/// Capabilities the bridge lends to the engine for one task-handler run
pub trait DisplayPort {
    /// Stream a rendered region to the panel
    ///
    /// `pixels` holds exactly `area.area()` RGB565 words in row-major order.
    /// The buffer is only borrowed for the duration of the call. On
    /// `Ok(FlushComplete)` the engine may reuse it; on error the region was
    /// not committed and stays dirty on the engine side.
    fn flush(&mut self, area: DirtyRect, pixels: &[u16]) -> Result<FlushComplete, FlushError>;

    /// Latest pointer state
    fn poll_input(&mut self) -> TouchReading;
}

/// Retained-mode UI engine driven by the bridge loop
pub trait GraphicsEngine {
    /// Advance the engine's internal clock by `elapsed_ms`
    fn tick_inc(&mut self, elapsed_ms: u32);

    /// Run timers, input processing and rendering for this iteration
    ///
    /// Any flush failure is returned to the caller unchanged.
    fn task_handler<P: DisplayPort>(&mut self, port: &mut P) -> Result<(), FlushError>;
}
