//! Display flusher
//!
//! Streams a rendered dirty rectangle to the panel through the windowed
//! write protocol. A flush either commits the whole rectangle or fails;
//! repeated failures latch the flusher into a halted state so the loop can
//! stop instead of leaving the panel silently out of sync.

use crate::config::DEFAULT_MAX_FLUSH_FAILURES;
use crate::geometry::{DirtyRect, PanelSize};
use crate::traits::PanelBus;

/// Pixels per bus write when filling with a solid color
const FILL_CHUNK: usize = 64;

/// Completion signal for one flush
///
/// Only the flusher creates these, after the panel transaction is closed.
/// Holding one means the pixel buffer may be reused.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct FlushComplete {
    _private: (),
}

impl FlushComplete {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

/// Flush errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError {
    /// Rectangle is unordered or extends past the panel
    OutOfBounds,
    /// Pixel buffer does not match the rectangle's area
    BufferSize { expected: usize, actual: usize },
    /// Panel bus failed mid-transaction
    Bus,
}

/// Dirty-rectangle flusher
pub struct DisplayFlusher<P> {
    panel: P,
    /// Logical panel size rectangles are checked against
    size: PanelSize,
    consecutive_failures: u8,
    max_failures: u8,
}

impl<P: PanelBus> DisplayFlusher<P> {
    /// Create a flusher with the default failure limit
    pub fn new(panel: P, size: PanelSize) -> Self {
        Self::with_failure_limit(panel, size, DEFAULT_MAX_FLUSH_FAILURES)
    }

    /// Create a flusher that halts after `max_failures` consecutive failures
    pub fn with_failure_limit(panel: P, size: PanelSize, max_failures: u8) -> Self {
        Self {
            panel,
            size,
            consecutive_failures: 0,
            max_failures: max_failures.max(1),
        }
    }

    /// Stream `pixels` into `rect`
    ///
    /// `pixels` is row-major, left to right then top to bottom, and must
    /// hold exactly `rect.area()` words. Shape errors are reported before
    /// any bus traffic. The buffer is not retained past the call.
    pub fn flush(&mut self, rect: DirtyRect, pixels: &[u16]) -> Result<FlushComplete, FlushError> {
        if let Err(e) = self.check(rect, pixels.len()) {
            return Err(self.failed(e));
        }

        let width = rect.width() as usize;
        let streamed = self.open(rect).and_then(|()| {
            pixels
                .chunks_exact(width)
                .try_for_each(|row| self.panel.write_pixels(row))
        });
        self.close(streamed)
    }

    /// Fill `rect` with a solid color
    pub fn fill(&mut self, rect: DirtyRect, color: u16) -> Result<FlushComplete, FlushError> {
        if let Err(e) = self.check(rect, rect.area()) {
            return Err(self.failed(e));
        }

        let chunk = [color; FILL_CHUNK];
        let mut remaining = rect.area();
        let streamed = self.open(rect).and_then(|()| {
            while remaining > 0 {
                let n = remaining.min(FILL_CHUNK);
                self.panel.write_pixels(&chunk[..n])?;
                remaining -= n;
            }
            Ok(())
        });
        self.close(streamed)
    }

    /// Too many consecutive failures; the panel state can no longer be
    /// trusted
    pub fn is_halted(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }

    /// Consecutive failures so far
    pub fn failures(&self) -> u8 {
        self.consecutive_failures
    }

    /// Logical panel size
    pub fn size(&self) -> PanelSize {
        self.size
    }

    /// Access the panel, e.g. for power or rotation commands
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    fn check(&self, rect: DirtyRect, len: usize) -> Result<(), FlushError> {
        if !rect.fits(self.size) {
            return Err(FlushError::OutOfBounds);
        }
        let expected = rect.area();
        if len != expected {
            return Err(FlushError::BufferSize {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    // Only called after `check`, so the extent fits the u16 panel size
    fn open(&mut self, rect: DirtyRect) -> Result<(), P::Error> {
        self.panel
            .set_window(rect.x1, rect.y1, rect.width() as u16, rect.height() as u16)
    }

    /// End the transaction even when streaming failed
    fn close(&mut self, streamed: Result<(), P::Error>) -> Result<FlushComplete, FlushError> {
        let ended = self.panel.end_write();
        match (streamed, ended) {
            (Ok(()), Ok(())) => {
                self.consecutive_failures = 0;
                Ok(FlushComplete::new())
            }
            _ => Err(self.failed(FlushError::Bus)),
        }
    }

    fn failed(&mut self, error: FlushError) -> FlushError {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        error
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use heapless::Vec;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum PanelOp {
        Window(u16, u16, u16, u16),
        Write(usize),
        End,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct BusFault;

    /// Panel bus that records every operation and pixel
    #[derive(Default)]
    pub(crate) struct RecordingPanel {
        pub(crate) ops: Vec<PanelOp, 128>,
        pub(crate) pixels: Vec<u16, 2048>,
        /// Fail the n-th `write_pixels` call (0-based)
        pub(crate) fail_write: Option<usize>,
        writes: usize,
    }

    impl RecordingPanel {
        pub(crate) fn windows(&self) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, PanelOp::Window(..)))
                .count()
        }

        pub(crate) fn ends(&self) -> usize {
            self.ops.iter().filter(|op| **op == PanelOp::End).count()
        }

        pub(crate) fn clear(&mut self) {
            self.ops.clear();
            self.pixels.clear();
        }
    }

    impl PanelBus for RecordingPanel {
        type Error = BusFault;

        fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), BusFault> {
            self.ops.push(PanelOp::Window(x, y, width, height)).unwrap();
            Ok(())
        }

        fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), BusFault> {
            let n = self.writes;
            self.writes += 1;
            if self.fail_write == Some(n) {
                return Err(BusFault);
            }
            self.ops.push(PanelOp::Write(pixels.len())).unwrap();
            self.pixels.extend_from_slice(pixels).unwrap();
            Ok(())
        }

        fn end_write(&mut self) -> Result<(), BusFault> {
            self.ops.push(PanelOp::End).unwrap();
            Ok(())
        }
    }

    const SIZE: PanelSize = PanelSize::new(32, 24);

    /// Pixel value encoding its own panel coordinate
    fn tag(x: u16, y: u16) -> u16 {
        y * SIZE.width + x
    }

    fn tagged(rect: DirtyRect) -> Vec<u16, 2048> {
        let mut pixels = Vec::new();
        for y in rect.y1..=rect.y2 {
            for x in rect.x1..=rect.x2 {
                pixels.push(tag(x, y)).unwrap();
            }
        }
        pixels
    }

    #[test]
    fn test_flush_10x10() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(0, 0, 9, 9);
        let pixels = tagged(rect);
        assert_eq!(pixels.len(), 100);

        let done = flusher.flush(rect, &pixels);
        assert_eq!(done, Ok(FlushComplete::new()));

        let panel = flusher.panel_mut();
        assert_eq!(panel.windows(), 1);
        assert_eq!(panel.ops[0], PanelOp::Window(0, 0, 10, 10));
        assert_eq!(panel.pixels.as_slice(), pixels.as_slice());
        assert_eq!(panel.ends(), 1);
        assert_eq!(*panel.ops.last().unwrap(), PanelOp::End);
    }

    #[test]
    fn test_rows_streamed_top_to_bottom() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(4, 2, 6, 5);
        flusher.flush(rect, &tagged(rect)).unwrap();

        let panel = flusher.panel_mut();
        assert_eq!(
            panel.ops.as_slice(),
            &[
                PanelOp::Window(4, 2, 3, 4),
                PanelOp::Write(3),
                PanelOp::Write(3),
                PanelOp::Write(3),
                PanelOp::Write(3),
                PanelOp::End,
            ]
        );
        assert_eq!(&panel.pixels[..3], &[tag(4, 2), tag(5, 2), tag(6, 2)]);
    }

    #[test]
    fn test_out_of_bounds_before_bus() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(30, 0, 32, 0);
        assert_eq!(flusher.flush(rect, &[0; 3]), Err(FlushError::OutOfBounds));

        let unordered = DirtyRect::new(5, 5, 4, 5);
        assert_eq!(flusher.flush(unordered, &[]), Err(FlushError::OutOfBounds));
        assert!(flusher.panel_mut().ops.is_empty());
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(0, 0, 9, 9);
        assert_eq!(
            flusher.flush(rect, &[0; 99]),
            Err(FlushError::BufferSize {
                expected: 100,
                actual: 99
            })
        );
        assert!(flusher.panel_mut().ops.is_empty());
    }

    #[test]
    fn test_bus_failure_closes_transaction() {
        let panel = RecordingPanel {
            fail_write: Some(1),
            ..Default::default()
        };
        let mut flusher = DisplayFlusher::new(panel, SIZE);
        let rect = DirtyRect::new(0, 0, 3, 3);

        assert_eq!(flusher.flush(rect, &tagged(rect)), Err(FlushError::Bus));
        assert_eq!(flusher.failures(), 1);

        let panel = flusher.panel_mut();
        assert_eq!(
            panel.ops.as_slice(),
            &[PanelOp::Window(0, 0, 4, 4), PanelOp::Write(4), PanelOp::End]
        );
    }

    #[test]
    fn test_repeated_failures_halt() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(0, 0, 1, 1);

        for _ in 0..DEFAULT_MAX_FLUSH_FAILURES - 1 {
            assert!(flusher.flush(rect, &[0; 3]).is_err());
            assert!(!flusher.is_halted());
        }
        // Success resets the count
        flusher.flush(rect, &[0; 4]).unwrap();
        assert_eq!(flusher.failures(), 0);

        for _ in 0..DEFAULT_MAX_FLUSH_FAILURES {
            assert!(flusher.flush(rect, &[0; 3]).is_err());
        }
        assert!(flusher.is_halted());
    }

    #[test]
    fn test_fill() {
        let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
        let rect = DirtyRect::new(0, 0, 31, 2);
        flusher.fill(rect, 0xF800).unwrap();

        let panel = flusher.panel_mut();
        assert_eq!(panel.windows(), 1);
        assert_eq!(panel.ends(), 1);
        assert_eq!(panel.pixels.len(), 96);
        assert!(panel.pixels.iter().all(|p| *p == 0xF800));
        assert_eq!(panel.ops[1], PanelOp::Write(FILL_CHUNK));
    }

    proptest! {
        #[test]
        fn prop_flush_visits_rect_row_major(
            x1 in 0u16..32, y1 in 0u16..24, w in 1u16..=32, h in 1u16..=24,
        ) {
            let x2 = (x1 + w - 1).min(SIZE.width - 1);
            let y2 = (y1 + h - 1).min(SIZE.height - 1);
            let rect = DirtyRect::new(x1, y1, x2, y2);
            let pixels = tagged(rect);

            let mut flusher = DisplayFlusher::new(RecordingPanel::default(), SIZE);
            prop_assert!(flusher.flush(rect, &pixels).is_ok());

            let panel = flusher.panel_mut();
            prop_assert_eq!(panel.windows(), 1);
            prop_assert_eq!(panel.ends(), 1);
            prop_assert_eq!(
                panel.ops[0],
                PanelOp::Window(x1, y1, rect.width() as u16, rect.height() as u16)
            );

            // Every pixel once, in window addressing order
            let mut expected = 0usize;
            for y in y1..=y2 {
                for x in x1..=x2 {
                    prop_assert_eq!(panel.pixels[expected], tag(x, y));
                    expected += 1;
                }
            }
            prop_assert_eq!(panel.pixels.len(), expected);
        }
    }
}
