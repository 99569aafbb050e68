//! Bridge loop
//!
//! One iteration samples touch, latches the reading for the engine's input
//! poll, advances the engine clock and lets the engine render. The engine
//! reaches the panel only through the [`DisplayPort`] lent to it for that
//! iteration.

use panelbridge_hal::Monotonic;

use crate::config::BridgeConfig;
use crate::flush::{DisplayFlusher, FlushComplete, FlushError};
use crate::geometry::DirtyRect;
use crate::tick::TickScheduler;
use crate::touch::{CalibrationTransform, TouchReading, TouchSampler};
use crate::traits::{DisplayPort, GraphicsEngine, PanelBus, TouchController};

/// What happened during one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IterationReport {
    /// Reading handed to the engine's input poll
    pub touch: TouchReading,
    /// Milliseconds fed to the engine clock
    pub elapsed_ms: u32,
    /// Engine clock after this iteration
    pub tick_ms: u64,
    /// Flush failure raised by the engine, if any
    pub flush_error: Option<FlushError>,
}

/// Fatal bridge errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Flushes kept failing; the panel no longer matches the engine
    DisplayHalted,
}

/// Composition root owning every bridge component
pub struct Bridge<T, P, C, E> {
    sampler: TouchSampler<T>,
    flusher: DisplayFlusher<P>,
    ticks: TickScheduler<C>,
    engine: E,
}

impl<T, P, C, E> Bridge<T, P, C, E>
where
    T: TouchController,
    P: PanelBus,
    C: Monotonic,
    E: GraphicsEngine,
{
    pub fn new(
        sampler: TouchSampler<T>,
        flusher: DisplayFlusher<P>,
        ticks: TickScheduler<C>,
        engine: E,
    ) -> Self {
        Self {
            sampler,
            flusher,
            ticks,
            engine,
        }
    }

    /// Wire up the components for `config`
    pub fn from_config(
        touch: T,
        transform: CalibrationTransform,
        panel: P,
        clock: C,
        engine: E,
        config: &BridgeConfig,
    ) -> Self {
        let size = config.logical_size();
        Self::new(
            TouchSampler::new(touch, transform, size),
            DisplayFlusher::with_failure_limit(panel, size, config.max_flush_failures),
            TickScheduler::new(clock, config.tick_period_ms),
            engine,
        )
    }

    /// Run one loop iteration
    ///
    /// A single flush failure is reported and the loop may continue; once
    /// the flusher has halted every call returns
    /// [`BridgeError::DisplayHalted`]. Never sleeps.
    pub fn run_iteration(&mut self) -> Result<IterationReport, BridgeError> {
        if self.flusher.is_halted() {
            return Err(BridgeError::DisplayHalted);
        }

        let touch = self.sampler.sample();
        let before = self.ticks.tick_ms();

        let mut port = BridgePort {
            flusher: &mut self.flusher,
            touch,
        };
        let flush_error = self.ticks.service_tick(&mut self.engine, &mut port).err();

        if self.flusher.is_halted() {
            return Err(BridgeError::DisplayHalted);
        }

        let tick_ms = self.ticks.tick_ms();
        Ok(IterationReport {
            touch,
            elapsed_ms: (tick_ms - before) as u32,
            tick_ms,
            flush_error,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn sampler_mut(&mut self) -> &mut TouchSampler<T> {
        &mut self.sampler
    }

    pub fn flusher_mut(&mut self) -> &mut DisplayFlusher<P> {
        &mut self.flusher
    }

    pub fn ticks(&self) -> &TickScheduler<C> {
        &self.ticks
    }
}

/// Port lent to the engine for one task-handler run
struct BridgePort<'a, P> {
    flusher: &'a mut DisplayFlusher<P>,
    touch: TouchReading,
}

impl<P: PanelBus> DisplayPort for BridgePort<'_, P> {
    fn flush(&mut self, area: DirtyRect, pixels: &[u16]) -> Result<FlushComplete, FlushError> {
        self.flusher.flush(area, pixels)
    }

    fn poll_input(&mut self) -> TouchReading {
        self.touch
    }
}
