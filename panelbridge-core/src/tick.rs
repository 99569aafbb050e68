//! Tick scheduler
//!
//! Keeps the UI engine's clock in step with wall-clock time. Elapsed time
//! is handed over in whole tick periods only; the remainder stays pending
//! until the next call, so loop jitter never accumulates as drift.

use panelbridge_hal::Monotonic;

use crate::flush::FlushError;
use crate::traits::{DisplayPort, GraphicsEngine};

/// Engine clock accounting
pub struct TickScheduler<C> {
    clock: C,
    period_ms: u32,
    /// Wall-clock time up to which ticks have been handed out
    last_advance_ms: u64,
    /// Total ticks handed to the engine
    tick_ms: u64,
}

impl<C: Monotonic> TickScheduler<C> {
    /// Start accounting from the clock's current reading
    ///
    /// A zero period is treated as 1 ms.
    pub fn new(clock: C, period_ms: u32) -> Self {
        let last_advance_ms = clock.now_ms();
        Self {
            clock,
            period_ms: period_ms.max(1),
            last_advance_ms,
            tick_ms: 0,
        }
    }

    /// Advance the tick counter by the whole periods elapsed since the last
    /// advance
    ///
    /// Returns the advance in milliseconds, 0 while less than one period
    /// is pending. Never sleeps.
    pub fn advance(&mut self) -> u32 {
        let now = self.clock.now_ms();
        let pending = now.saturating_sub(self.last_advance_ms);

        let period = self.period_ms as u64;
        let max_step = (u32::MAX as u64 / period) * period;
        let delta = ((pending / period) * period).min(max_step);

        self.last_advance_ms += delta;
        self.tick_ms += delta;
        delta as u32
    }

    /// Feed elapsed time to the engine, then run its task handler
    ///
    /// The engine's clock is only touched for a non-zero advance. Flush
    /// failures raised by the task handler are passed through; the advance
    /// has been applied either way.
    pub fn service_tick<E, P>(&mut self, engine: &mut E, port: &mut P) -> Result<u32, FlushError>
    where
        E: GraphicsEngine,
        P: DisplayPort,
    {
        let delta = self.advance();
        if delta > 0 {
            engine.tick_inc(delta);
        }
        engine.task_handler(port)?;
        Ok(delta)
    }

    /// Total milliseconds handed to the engine
    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::flush::FlushComplete;
    use crate::geometry::DirtyRect;
    use crate::touch::TouchReading;
    use core::cell::Cell;
    use heapless::Vec;
    use proptest::prelude::*;

    /// Clock moved by hand
    #[derive(Default)]
    pub(crate) struct ManualClock {
        now: Cell<u64>,
    }

    impl ManualClock {
        pub(crate) fn at(ms: u64) -> Self {
            Self { now: Cell::new(ms) }
        }

        pub(crate) fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Monotonic for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum EngineCall {
        Tick(u32),
        Handler,
    }

    #[derive(Default)]
    struct CallLog {
        calls: Vec<EngineCall, 16>,
        fail: bool,
    }

    impl GraphicsEngine for CallLog {
        fn tick_inc(&mut self, elapsed_ms: u32) {
            self.calls.push(EngineCall::Tick(elapsed_ms)).unwrap();
        }

        fn task_handler<P: DisplayPort>(&mut self, _port: &mut P) -> Result<(), FlushError> {
            self.calls.push(EngineCall::Handler).unwrap();
            if self.fail {
                Err(FlushError::Bus)
            } else {
                Ok(())
            }
        }
    }

    struct NullPort;

    impl DisplayPort for NullPort {
        fn flush(&mut self, _area: DirtyRect, _pixels: &[u16]) -> Result<FlushComplete, FlushError> {
            Ok(FlushComplete::new())
        }

        fn poll_input(&mut self) -> TouchReading {
            TouchReading::RELEASED
        }
    }

    #[test]
    fn test_three_ms_apart() {
        let clock = ManualClock::at(1_000);
        let mut ticks = TickScheduler::new(&clock, 1);

        assert_eq!(ticks.advance(), 0);
        clock.advance(3);
        assert_eq!(ticks.advance(), 3);
        assert_eq!(ticks.tick_ms(), 3);
    }

    #[test]
    fn test_remainder_carries_over() {
        let clock = ManualClock::at(0);
        let mut ticks = TickScheduler::new(&clock, 5);

        clock.advance(7);
        assert_eq!(ticks.advance(), 5);
        clock.advance(2);
        assert_eq!(ticks.advance(), 0);
        clock.advance(1);
        assert_eq!(ticks.advance(), 5);
        assert_eq!(ticks.tick_ms(), 10);
    }

    #[test]
    fn test_zero_period_is_one_ms() {
        let clock = ManualClock::at(0);
        let ticks = TickScheduler::new(&clock, 0);
        assert_eq!(ticks.period_ms(), 1);
    }

    #[test]
    fn test_tick_inc_before_task_handler() {
        let clock = ManualClock::at(0);
        let mut ticks = TickScheduler::new(&clock, 1);
        let mut engine = CallLog::default();

        clock.advance(4);
        assert_eq!(ticks.service_tick(&mut engine, &mut NullPort), Ok(4));
        assert_eq!(
            engine.calls.as_slice(),
            &[EngineCall::Tick(4), EngineCall::Handler]
        );
    }

    #[test]
    fn test_no_tick_inc_without_elapsed_time() {
        let clock = ManualClock::at(0);
        let mut ticks = TickScheduler::new(&clock, 1);
        let mut engine = CallLog::default();

        assert_eq!(ticks.service_tick(&mut engine, &mut NullPort), Ok(0));
        assert_eq!(engine.calls.as_slice(), &[EngineCall::Handler]);
    }

    #[test]
    fn test_flush_error_passes_through() {
        let clock = ManualClock::at(0);
        let mut ticks = TickScheduler::new(&clock, 1);
        let mut engine = CallLog {
            fail: true,
            ..Default::default()
        };

        clock.advance(2);
        assert_eq!(
            ticks.service_tick(&mut engine, &mut NullPort),
            Err(FlushError::Bus)
        );
        assert_eq!(ticks.tick_ms(), 2);
    }

    proptest! {
        #[test]
        fn prop_ticks_monotonic_and_track_wall_clock(
            period in 1u32..20,
            steps in proptest::collection::vec(0u64..50, 1..100),
        ) {
            let clock = ManualClock::at(12_345);
            let mut ticks = TickScheduler::new(&clock, period);
            let mut previous = ticks.tick_ms();
            let mut sum = 0u64;
            let mut elapsed = 0u64;

            for step in steps {
                clock.advance(step);
                elapsed += step;
                sum += ticks.advance() as u64;

                prop_assert!(ticks.tick_ms() >= previous);
                previous = ticks.tick_ms();
            }

            prop_assert_eq!(sum, ticks.tick_ms());
            prop_assert!(sum <= elapsed);
            prop_assert!(elapsed - sum < period as u64);
        }
    }
}
