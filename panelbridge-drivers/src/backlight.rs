//! GPIO backlight
//!
//! Panel backlight switched by a GPIO pin, directly or through a transistor.

use panelbridge_hal::OutputPin;

/// GPIO backlight
///
/// The pin can be configured as active-high (default) or active-low.
pub struct Backlight<P> {
    pin: P,
    /// If true, backlight ON = pin LOW
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> Backlight<P> {
    /// Create a backlight, initially off
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut backlight = Self {
            pin,
            inverted,
            on: false,
        };
        backlight.set_on(false);
        backlight
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
        self.pin.set_level(on != self.inverted);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
