//! XPT2046 resistive touch controller
//!
//! Bit-banged SPI: the controller sits on its own pins, separate from the
//! panel's hardware SPI. Each read measures pressure first and only samples
//! position when the panel is pressed firmly enough.

use embedded_hal::delay::DelayNs;

use panelbridge_core::traits::{RawTouchSample, TouchController};
use panelbridge_hal::{InputPin, OutputPin};

/// Control bytes (12-bit, differential, power-down between conversions)
mod cmd {
    pub const X: u8 = 0xD0;
    pub const Y: u8 = 0x90;
    pub const Z1: u8 = 0xB0;
    pub const Z2: u8 = 0xC0;
}

/// Largest 12-bit conversion
const ADC_MAX: u16 = 4095;

/// Default pressure below which the panel reads as released
pub const DEFAULT_Z_THRESHOLD: u16 = 400;

/// Clock half period (tCH and tCL are 200 ns minimum)
const HALF_PERIOD_NS: u32 = 250;

/// XPT2046 driver over GPIO
pub struct Xpt2046<CLK, MOSI, MISO, CS, D> {
    clk: CLK,
    mosi: MOSI,
    miso: MISO,
    cs: CS,
    delay: D,
    z_threshold: u16,
}

impl<CLK, MOSI, MISO, CS, D> Xpt2046<CLK, MOSI, MISO, CS, D>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    CS: OutputPin,
    D: DelayNs,
{
    pub fn new(mut clk: CLK, mut mosi: MOSI, miso: MISO, mut cs: CS, delay: D) -> Self {
        clk.set_low();
        mosi.set_low();
        cs.set_high();
        Self {
            clk,
            mosi,
            miso,
            cs,
            delay,
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }

    /// Change the pressure threshold
    pub fn set_z_threshold(&mut self, threshold: u16) {
        self.z_threshold = threshold;
    }

    /// Contact pressure, 0 when released
    fn pressure(&mut self) -> u16 {
        let z1 = self.convert(cmd::Z1);
        let z2 = self.convert(cmd::Z2);
        (z1 + ADC_MAX).saturating_sub(z2)
    }

    /// Median of three conversions
    fn position(&mut self, command: u8) -> u16 {
        let a = self.convert(command);
        let b = self.convert(command);
        let c = self.convert(command);
        median3(a, b, c)
    }

    /// One 8-bit command out, one 12-bit conversion in
    fn convert(&mut self, command: u8) -> u16 {
        for bit in (0..8).rev() {
            self.mosi.set_level(command & (1 << bit) != 0);
            self.clk.set_high();
            self.delay.delay_ns(HALF_PERIOD_NS);
            self.clk.set_low();
            self.delay.delay_ns(HALF_PERIOD_NS);
        }
        self.mosi.set_low();

        let mut value = 0u16;
        for _ in 0..12 {
            self.clk.set_high();
            self.delay.delay_ns(HALF_PERIOD_NS);
            self.clk.set_low();
            self.delay.delay_ns(HALF_PERIOD_NS);
            value = (value << 1) | self.miso.is_high() as u16;
        }
        value
    }
}

impl<CLK, MOSI, MISO, CS, D> TouchController for Xpt2046<CLK, MOSI, MISO, CS, D>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    CS: OutputPin,
    D: DelayNs,
{
    fn read_raw(&mut self) -> RawTouchSample {
        self.cs.set_low();

        let z = self.pressure();
        let sample = if z < self.z_threshold {
            RawTouchSample::released()
        } else {
            let x = self.position(cmd::X);
            let y = self.position(cmd::Y);
            RawTouchSample::touched(x, y, z)
        };

        self.cs.set_high();
        sample
    }
}

fn median3(a: u16, b: u16, c: u16) -> u16 {
    a.max(b).min(a.min(b).max(c))
}
