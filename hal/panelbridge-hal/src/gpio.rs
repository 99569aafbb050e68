//! Digital pin abstractions
//!
//! Carries the panel's data/command and chip-select lines, the backlight
//! enable, and the four lines of the bit-banged touch controller bus.

/// Push-pull output line
pub trait OutputPin {
    /// Drive the line to logic 1
    fn set_high(&mut self);

    /// Drive the line to logic 0
    fn set_low(&mut self);

    /// Drive the line to `high`
    fn set_level(&mut self, high: bool) {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Level the line is currently driven to
    fn is_set_high(&self) -> bool;
}

/// Sampled input line
pub trait InputPin {
    /// Line currently reads logic 1
    fn is_high(&self) -> bool;

    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl<T: OutputPin + ?Sized> OutputPin for &mut T {
    fn set_high(&mut self) {
        (**self).set_high()
    }

    fn set_low(&mut self) {
        (**self).set_low()
    }

    fn is_set_high(&self) -> bool {
        (**self).is_set_high()
    }
}

impl<T: InputPin + ?Sized> InputPin for &T {
    fn is_high(&self) -> bool {
        (**self).is_high()
    }
}
