//! Calibration prompt drawn on the panel
//!
//! Each target is a small white crosshair on a black screen. Progress is
//! logged over RTT.

use defmt::*;
use embassy_time::{block_for, Duration};

use panelbridge_core::calibration::CalibrationPrompt;
use panelbridge_core::touch::FitError;
use panelbridge_core::traits::{PanelBus, RawTouchSample};
use panelbridge_core::{DirtyRect, DisplayFlusher, PanelSize, ScreenPoint};

const BLACK: u16 = 0x0000;
const WHITE: u16 = 0xFFFF;

/// Crosshair half length
const ARM_PX: i32 = 10;

pub struct PanelPrompt<P> {
    flusher: DisplayFlusher<P>,
    shown: Option<DirtyRect>,
}

impl<P: PanelBus> PanelPrompt<P> {
    pub fn new(flusher: DisplayFlusher<P>) -> Self {
        Self {
            flusher,
            shown: None,
        }
    }

    /// Blank the whole screen
    pub fn clear(&mut self) {
        let full = self.flusher.size().full_rect();
        self.fill(full, BLACK);
        self.shown = None;
    }

    fn fill(&mut self, rect: DirtyRect, color: u16) {
        if let Err(e) = self.flusher.fill(rect, color) {
            warn!("Calibration draw failed: {}", e);
        }
    }
}

impl<P: PanelBus> CalibrationPrompt for PanelPrompt<P> {
    fn show_target(&mut self, index: usize, point: ScreenPoint) {
        match self.shown.take() {
            Some(previous) => self.fill(previous, BLACK),
            None => self.clear(),
        }

        let size = self.flusher.size();
        let horizontal = clamped(point.x - ARM_PX, point.y - 1, point.x + ARM_PX, point.y + 1, size);
        let vertical = clamped(point.x - 1, point.y - ARM_PX, point.x + 1, point.y + ARM_PX, size);
        self.fill(horizontal, WHITE);
        self.fill(vertical, WHITE);
        self.shown = Some(horizontal.union(&vertical));

        info!("Touch target {} at ({}, {})", index + 1, point.x, point.y);
    }

    fn target_captured(&mut self, index: usize, sample: RawTouchSample) {
        info!("Target {} captured: raw ({}, {})", index + 1, sample.x, sample.y);
    }

    fn sample_rejected(&mut self, index: usize) {
        warn!("Contact lost on target {}, touch it again", index + 1);
    }

    fn fit_rejected(&mut self, error: FitError) {
        warn!("Calibration rejected ({}), starting over", error);
    }

    fn pause(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}

/// Rectangle from signed corners, clipped to the screen
fn clamped(x1: i32, y1: i32, x2: i32, y2: i32, size: PanelSize) -> DirtyRect {
    let max_x = size.width.saturating_sub(1) as i32;
    let max_y = size.height.saturating_sub(1) as i32;
    DirtyRect::new(
        x1.clamp(0, max_x) as u16,
        y1.clamp(0, max_y) as u16,
        x2.clamp(0, max_x) as u16,
        y2.clamp(0, max_y) as u16,
    )
}
