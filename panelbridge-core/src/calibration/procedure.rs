//! Interactive touch calibration
//!
//! The user touches four reference targets near the screen corners, in the
//! fixed order top-left, top-right, bottom-right, bottom-left. Each target
//! is the average of [`SAMPLES_PER_TARGET`] consecutive readings. The four
//! averages are fitted into a [`CalibrationTransform`]; a fit that misses
//! any target by more than [`MAX_CALIBRATION_ERROR_PX`] restarts the run.

use crate::geometry::{PanelSize, Rotation, ScreenPoint};
use crate::touch::{CalibrationTransform, FitError};
use crate::traits::{RawTouchSample, TouchController};

/// Inset of the reference targets from the screen edges
pub const CALIBRATION_MARGIN_PX: u16 = 20;

/// Consecutive readings averaged per target
pub const SAMPLES_PER_TARGET: usize = 8;

/// Largest accepted miss of a reference point after fitting
pub const MAX_CALIBRATION_ERROR_PX: u32 = 8;

/// Delay between touch polls during calibration
const POLL_INTERVAL_MS: u32 = 10;

/// Consecutive "released" readings that count as a lifted finger
const RELEASE_READS: u8 = 3;

/// Reference targets for a screen of `size`, in calibration order
pub fn reference_targets(size: PanelSize) -> [ScreenPoint; 4] {
    let left = CALIBRATION_MARGIN_PX.min(size.width.saturating_sub(1)) as i32;
    let top = CALIBRATION_MARGIN_PX.min(size.height.saturating_sub(1)) as i32;
    let right = (size.width as i32 - 1 - CALIBRATION_MARGIN_PX as i32).max(left);
    let bottom = (size.height as i32 - 1 - CALIBRATION_MARGIN_PX as i32).max(top);

    [
        ScreenPoint::new(left, top),
        ScreenPoint::new(right, top),
        ScreenPoint::new(right, bottom),
        ScreenPoint::new(left, bottom),
    ]
}

/// User-facing side of the calibration run
///
/// Implemented by the firmware to draw targets on the panel and log
/// progress. `pause` is the only way the procedure waits.
pub trait CalibrationPrompt {
    /// Ask the user to touch target `index` at `point`
    fn show_target(&mut self, index: usize, point: ScreenPoint);

    /// Target `index` was captured as the averaged `sample`
    fn target_captured(&mut self, index: usize, sample: RawTouchSample);

    /// Contact was lost while sampling target `index`; it will be retried
    fn sample_rejected(&mut self, index: usize);

    /// The captured targets did not produce a usable transform; the whole
    /// sequence restarts
    fn fit_rejected(&mut self, error: FitError);

    /// Wait roughly `ms` milliseconds
    fn pause(&mut self, ms: u32);
}

/// Four-point calibration run for one screen size and rotation
#[derive(Debug, Clone, Copy)]
pub struct CalibrationProcedure {
    rotation: Rotation,
    targets: [ScreenPoint; 4],
}

impl CalibrationProcedure {
    /// Procedure for a screen of `size` logical pixels under `rotation`
    pub fn new(size: PanelSize, rotation: Rotation) -> Self {
        Self {
            rotation,
            targets: reference_targets(size),
        }
    }

    /// Reference targets in calibration order
    pub fn targets(&self) -> &[ScreenPoint; 4] {
        &self.targets
    }

    /// Run until a valid transform is measured
    ///
    /// Blocks for as long as the user takes. Lost contact retries the
    /// current target only; a rejected fit restarts from the first target.
    pub fn run<T, P>(&self, touch: &mut T, prompt: &mut P) -> CalibrationTransform
    where
        T: TouchController,
        P: CalibrationPrompt,
    {
        loop {
            let mut samples = [RawTouchSample::released(); 4];

            for (index, target) in self.targets.iter().enumerate() {
                prompt.show_target(index, *target);
                let sample = self.capture(touch, prompt, index);
                prompt.target_captured(index, sample);
                samples[index] = sample;
            }

            match self.evaluate(&samples) {
                Ok(transform) => return transform,
                Err(e) => prompt.fit_rejected(e),
            }
        }
    }

    /// Fit captured samples and check them against the targets
    pub fn evaluate(&self, samples: &[RawTouchSample; 4]) -> Result<CalibrationTransform, FitError> {
        let transform = CalibrationTransform::fit(&self.targets, samples, self.rotation)?;

        let max_error_px = transform.max_error(&self.targets, samples);
        if max_error_px > MAX_CALIBRATION_ERROR_PX {
            return Err(FitError::ExcessError { max_error_px });
        }

        Ok(transform)
    }

    /// Average one press, retrying until the finger stays down long enough
    fn capture<T, P>(&self, touch: &mut T, prompt: &mut P, index: usize) -> RawTouchSample
    where
        T: TouchController,
        P: CalibrationPrompt,
    {
        'press: loop {
            let mut sample = touch.read_raw();
            while !sample.valid {
                prompt.pause(POLL_INTERVAL_MS);
                sample = touch.read_raw();
            }

            let mut sum_x = sample.x as u32;
            let mut sum_y = sample.y as u32;
            let mut sum_z = sample.z as u32;

            for _ in 1..SAMPLES_PER_TARGET {
                prompt.pause(POLL_INTERVAL_MS);
                let sample = touch.read_raw();
                if !sample.valid {
                    prompt.sample_rejected(index);
                    self.wait_release(touch, prompt);
                    continue 'press;
                }
                sum_x += sample.x as u32;
                sum_y += sample.y as u32;
                sum_z += sample.z as u32;
            }

            self.wait_release(touch, prompt);

            return RawTouchSample::touched(
                average(sum_x),
                average(sum_y),
                average(sum_z),
            );
        }
    }

    fn wait_release<T, P>(&self, touch: &mut T, prompt: &mut P)
    where
        T: TouchController,
        P: CalibrationPrompt,
    {
        let mut released = 0;
        while released < RELEASE_READS {
            if touch.read_raw().valid {
                released = 0;
            } else {
                released += 1;
            }
            prompt.pause(POLL_INTERVAL_MS);
        }
    }
}

fn average(sum: u32) -> u16 {
    let n = SAMPLES_PER_TARGET as u32;
    ((sum + n / 2) / n) as u16
}
