//! Sensor-to-screen calibration transform
//!
//! Each screen axis is a linear function of one sensor axis, in Q16.16
//! fixed point (Cortex-M0+ has no FPU):
//!
//! ```text
//! screen.x = scale_x * (swap ? raw.y : raw.x) + offset_x
//! screen.y = scale_y * (swap ? raw.x : raw.y) + offset_y
//! ```
//!
//! Negative scales express mirrored axes, `swap_axes` expresses a quarter
//! turn between sensor and screen. Together they cover every rotation the
//! panel supports, so the rotation remap is data inside the transform rather
//! than arithmetic in the sampler.

use serde::{Deserialize, Serialize};

use crate::geometry::{AxisRemap, PanelSize, Remap, Rotation, ScreenPoint};
use crate::traits::RawTouchSample;

/// 1.0 in Q16.16
pub const Q16_ONE: i32 = 1 << 16;

/// Calibration fit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FitError {
    /// Reference samples do not span both axes (e.g. same point touched twice)
    Degenerate,
    /// The fitted transform misses a reference point by more than allowed
    ExcessError {
        /// Worst per-axis miss in pixels
        max_error_px: u32,
    },
}

/// Linear map for one screen axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMap {
    /// Pixels per sensor unit (Q16.16)
    pub scale_q16: i32,
    /// Pixel offset (Q16.16)
    pub offset_q16: i32,
}

impl AxisMap {
    pub const IDENTITY: AxisMap = AxisMap {
        scale_q16: Q16_ONE,
        offset_q16: 0,
    };

    /// Sensor value to pixel, rounded to nearest
    pub fn apply(&self, raw: i32) -> i32 {
        let value = self.scale_q16 as i64 * raw as i64 + self.offset_q16 as i64;
        round_q16(value)
    }

    /// Pixel back to sensor value, rounded to nearest
    pub fn invert(&self, screen: i32) -> Option<i32> {
        if self.scale_q16 == 0 {
            return None;
        }
        let numerator = ((screen as i64) << 16) - self.offset_q16 as i64;
        i32::try_from(div_round(numerator, self.scale_q16 as i64)).ok()
    }

    /// Compose with a mirror/offset remap of the output
    fn remapped(&self, remap: AxisRemap) -> AxisMap {
        let offset = (remap.offset as i64) << 16;
        if remap.negate {
            AxisMap {
                scale_q16: self.scale_q16.saturating_neg(),
                offset_q16: clamp_i32(offset - self.offset_q16 as i64),
            }
        } else {
            AxisMap {
                scale_q16: self.scale_q16,
                offset_q16: clamp_i32(offset + self.offset_q16 as i64),
            }
        }
    }

    /// Fit `screen = scale * raw + offset` through two clusters of samples
    ///
    /// `low`/`high` are sums of two samples each on the low and high side
    /// of the axis; the offset uses all four.
    fn fit(
        raw_low_sum: i64,
        raw_high_sum: i64,
        screen_low_sum: i64,
        screen_high_sum: i64,
    ) -> Result<AxisMap, FitError> {
        let raw_span = raw_high_sum - raw_low_sum;
        if raw_span == 0 {
            return Err(FitError::Degenerate);
        }
        let scale = ((screen_high_sum - screen_low_sum) << 16) / raw_span;
        if scale == 0 || scale > i32::MAX as i64 || scale < -(i32::MAX as i64) {
            return Err(FitError::Degenerate);
        }

        let raw_sum = raw_low_sum + raw_high_sum;
        let screen_sum = screen_low_sum + screen_high_sum;
        let offset = div_round((screen_sum << 16) - scale * raw_sum, 4);
        let offset = i32::try_from(offset).map_err(|_| FitError::Degenerate)?;

        Ok(AxisMap {
            scale_q16: scale as i32,
            offset_q16: offset,
        })
    }
}

/// Mapping from raw touch samples to screen points
///
/// Immutable once built; the sampler replaces it wholesale after a
/// calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTransform {
    /// Display rotation the screen coordinates are expressed in
    pub rotation: Rotation,
    /// Screen x follows sensor y (and screen y follows sensor x)
    pub swap_axes: bool,
    pub x: AxisMap,
    pub y: AxisMap,
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl CalibrationTransform {
    /// Sensor units are pixels, no rotation
    pub const fn identity() -> Self {
        Self {
            rotation: Rotation::Deg0,
            swap_axes: false,
            x: AxisMap::IDENTITY,
            y: AxisMap::IDENTITY,
        }
    }

    /// Transform a raw sample; the result may lie off the panel
    pub fn apply(&self, sample: &RawTouchSample) -> ScreenPoint {
        let (a, b) = if self.swap_axes {
            (sample.y as i32, sample.x as i32)
        } else {
            (sample.x as i32, sample.y as i32)
        };
        ScreenPoint::new(self.x.apply(a), self.y.apply(b))
    }

    /// Sensor coordinates `(x, y)` that map onto `point`
    ///
    /// `None` if either axis has a zero scale.
    pub fn inverse(&self, point: ScreenPoint) -> Option<(i32, i32)> {
        let a = self.x.invert(point.x)?;
        let b = self.y.invert(point.y)?;
        Some(if self.swap_axes { (b, a) } else { (a, b) })
    }

    /// Compose with a coordinate remap applied after this transform
    pub fn remapped(&self, remap: &Remap) -> Self {
        let (x, y) = if remap.swap {
            (self.y, self.x)
        } else {
            (self.x, self.y)
        };
        Self {
            rotation: self.rotation,
            swap_axes: self.swap_axes != remap.swap,
            x: x.remapped(remap.x),
            y: y.remapped(remap.y),
        }
    }

    /// Re-express this transform for a different display rotation
    ///
    /// Goes through the native panel frame, so a calibration recorded under
    /// one rotation stays valid after the rotation setting changes.
    pub fn rerotate(&self, to: Rotation, native: PanelSize) -> Self {
        if self.rotation == to {
            return *self;
        }
        let mut transform = self
            .remapped(&self.rotation.to_native(native))
            .remapped(&to.from_native(native));
        transform.rotation = to;
        transform
    }

    /// Derive a transform from four reference points
    ///
    /// `targets` and `samples` are in reference order: top-left, top-right,
    /// bottom-right, bottom-left. Whether the sensor axes are swapped
    /// relative to the screen is decided from which sensor axis changes
    /// more along each screen edge.
    pub fn fit(
        targets: &[ScreenPoint; 4],
        samples: &[RawTouchSample; 4],
        rotation: Rotation,
    ) -> Result<Self, FitError> {
        let sx = samples.map(|s| s.x as i64);
        let sy = samples.map(|s| s.y as i64);

        // Sensor travel along the screen's horizontal and vertical edges
        let across_x_by_x = ((sx[1] - sx[0]) + (sx[2] - sx[3])).abs();
        let across_x_by_y = ((sy[1] - sy[0]) + (sy[2] - sy[3])).abs();
        let across_y_by_x = ((sx[3] - sx[0]) + (sx[2] - sx[1])).abs();
        let across_y_by_y = ((sy[3] - sy[0]) + (sy[2] - sy[1])).abs();
        let swap_axes = across_x_by_y + across_y_by_x > across_x_by_x + across_y_by_y;

        let (ra, rb) = if swap_axes { (sy, sx) } else { (sx, sy) };
        let tx = targets.map(|p| p.x as i64);
        let ty = targets.map(|p| p.y as i64);

        // Left edge is TL + BL, right edge TR + BR
        let x = AxisMap::fit(ra[0] + ra[3], ra[1] + ra[2], tx[0] + tx[3], tx[1] + tx[2])?;
        // Top edge is TL + TR, bottom edge BL + BR
        let y = AxisMap::fit(rb[0] + rb[1], rb[3] + rb[2], ty[0] + ty[1], ty[3] + ty[2])?;

        Ok(Self {
            rotation,
            swap_axes,
            x,
            y,
        })
    }

    /// Worst per-axis distance in pixels between mapped samples and targets
    pub fn max_error(&self, targets: &[ScreenPoint], samples: &[RawTouchSample]) -> u32 {
        targets
            .iter()
            .zip(samples)
            .map(|(target, sample)| {
                let mapped = self.apply(sample);
                let dx = (mapped.x - target.x).unsigned_abs();
                let dy = (mapped.y - target.y).unsigned_abs();
                dx.max(dy)
            })
            .max()
            .unwrap_or(0)
    }
}

/// Round a Q16.16 value to the nearest integer
fn round_q16(value: i64) -> i32 {
    clamp_i32((value + (1 << 15)) >> 16)
}

/// Signed division rounding half away from zero
fn div_round(numerator: i64, denominator: i64) -> i64 {
    let half = denominator.abs() / 2;
    if (numerator < 0) != (denominator < 0) {
        (numerator - half * denominator.signum()) / denominator
    } else {
        (numerator + half * denominator.signum()) / denominator
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
