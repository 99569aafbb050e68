//! Touch controller trait

/// One uncalibrated reading from the touch controller
///
/// `x` and `y` are in sensor units (12-bit ADC counts on resistive
/// controllers). When `valid` is false the panel is not being touched and
/// the coordinates carry no meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawTouchSample {
    pub x: u16,
    pub y: u16,
    /// Contact pressure reported by the controller (0 = none)
    pub z: u16,
    pub valid: bool,
}

impl RawTouchSample {
    /// A reading with contact at the given sensor coordinates
    pub const fn touched(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z, valid: true }
    }

    /// A "not touched" reading
    pub const fn released() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            valid: false,
        }
    }
}

/// Touch controller polled once per loop iteration
///
/// A read takes one bus transaction and never waits for contact.
pub trait TouchController {
    /// Read the current contact state and position
    fn read_raw(&mut self) -> RawTouchSample;
}

impl<T: TouchController + ?Sized> TouchController for &mut T {
    fn read_raw(&mut self) -> RawTouchSample {
        (**self).read_raw()
    }
}
