//! Touch sampler
//!
//! Polls the touch controller once and reports either a calibrated screen
//! point or "released". No state crosses polls apart from the transform.

use crate::geometry::{PanelSize, ScreenPoint};
use crate::touch::transform::CalibrationTransform;
use crate::traits::TouchController;

/// Pointer state for one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchState {
    #[default]
    Released,
    Pressed,
}

/// Result of one poll
///
/// `point` is only meaningful when `state` is [`TouchState::Pressed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchReading {
    pub state: TouchState,
    pub point: ScreenPoint,
}

impl TouchReading {
    pub const RELEASED: TouchReading = TouchReading {
        state: TouchState::Released,
        point: ScreenPoint::new(0, 0),
    };

    pub const fn pressed(point: ScreenPoint) -> Self {
        Self {
            state: TouchState::Pressed,
            point,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state == TouchState::Pressed
    }
}

/// Calibrated touch sampler
///
/// Owns the touch controller and the active [`CalibrationTransform`].
pub struct TouchSampler<T> {
    controller: T,
    transform: CalibrationTransform,
    /// Logical screen size under the transform's rotation
    size: PanelSize,
}

impl<T: TouchController> TouchSampler<T> {
    /// Create a sampler for a screen of `size` logical pixels
    pub fn new(controller: T, transform: CalibrationTransform, size: PanelSize) -> Self {
        Self {
            controller,
            transform,
            size,
        }
    }

    /// Poll the controller once
    ///
    /// No contact, or a calibrated point off the screen, reads as released.
    /// Off-screen points are noise and are not clamped to the edge.
    pub fn sample(&mut self) -> TouchReading {
        let raw = self.controller.read_raw();
        if !raw.valid {
            return TouchReading::RELEASED;
        }

        let point = self.transform.apply(&raw);
        if self.size.contains(point) {
            TouchReading::pressed(point)
        } else {
            TouchReading::RELEASED
        }
    }

    /// Active transform
    pub fn transform(&self) -> &CalibrationTransform {
        &self.transform
    }

    /// Swap in a new transform as a whole
    pub fn replace_transform(&mut self, transform: CalibrationTransform) {
        self.transform = transform;
    }

    /// Logical screen size
    pub fn size(&self) -> PanelSize {
        self.size
    }

    /// Access the controller, e.g. to run a calibration
    pub fn controller_mut(&mut self) -> &mut T {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RawTouchSample;

    /// Mock controller returning the same reading every poll
    struct FixedTouch {
        sample: RawTouchSample,
        reads: u32,
    }

    impl FixedTouch {
        fn new(sample: RawTouchSample) -> Self {
            Self { sample, reads: 0 }
        }
    }

    impl TouchController for FixedTouch {
        fn read_raw(&mut self) -> RawTouchSample {
            self.reads += 1;
            self.sample
        }
    }

    const SCREEN: PanelSize = PanelSize::new(320, 240);

    #[test]
    fn test_origin_with_identity() {
        let touch = FixedTouch::new(RawTouchSample::touched(0, 0, 200));
        let mut sampler = TouchSampler::new(touch, CalibrationTransform::identity(), SCREEN);

        let reading = sampler.sample();
        assert_eq!(reading.state, TouchState::Pressed);
        assert_eq!(reading.point, ScreenPoint::new(0, 0));
    }

    #[test]
    fn test_no_contact_is_released() {
        let touch = FixedTouch::new(RawTouchSample::released());
        let mut sampler = TouchSampler::new(touch, CalibrationTransform::identity(), SCREEN);

        assert_eq!(sampler.sample().state, TouchState::Released);
        assert_eq!(sampler.controller_mut().reads, 1);
    }

    #[test]
    fn test_off_screen_is_released_not_clamped() {
        let touch = FixedTouch::new(RawTouchSample::touched(320, 10, 200));
        let mut sampler = TouchSampler::new(touch, CalibrationTransform::identity(), SCREEN);
        assert_eq!(sampler.sample(), TouchReading::RELEASED);

        let touch = FixedTouch::new(RawTouchSample::touched(4000, 4000, 200));
        let mut sampler = TouchSampler::new(touch, CalibrationTransform::identity(), SCREEN);
        assert_eq!(sampler.sample().state, TouchState::Released);
    }

    #[test]
    fn test_negative_mapping_is_released() {
        let mut transform = CalibrationTransform::identity();
        transform.x.offset_q16 = -50 << 16;
        let touch = FixedTouch::new(RawTouchSample::touched(10, 10, 200));
        let mut sampler = TouchSampler::new(touch, transform, SCREEN);
        assert_eq!(sampler.sample().state, TouchState::Released);
    }

    #[test]
    fn test_replace_transform() {
        let touch = FixedTouch::new(RawTouchSample::touched(100, 100, 200));
        let mut sampler = TouchSampler::new(touch, CalibrationTransform::identity(), SCREEN);
        assert_eq!(sampler.sample().point, ScreenPoint::new(100, 100));

        let mut shifted = CalibrationTransform::identity();
        shifted.y.offset_q16 = 20 << 16;
        sampler.replace_transform(shifted);
        assert_eq!(sampler.sample().point, ScreenPoint::new(100, 120));
        assert_eq!(sampler.transform(), &shifted);
    }
}
