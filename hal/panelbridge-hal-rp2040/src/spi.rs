//! Blocking SPI master
//!
//! The panel is the only device on the bus and the bridge runs in a single
//! execution context, so blocking transfers are used throughout.

use embassy_rp::spi::{self, Blocking, Instance, Spi};

use panelbridge_hal::spi::SpiConfig;

/// embassy-rp SPI configuration for a `panelbridge-hal` config
pub fn rp_config(config: &SpiConfig) -> spi::Config {
    let mut rp = spi::Config::default();
    rp.frequency = config.frequency;
    rp.polarity = if config.mode.idles_high() {
        spi::Polarity::IdleHigh
    } else {
        spi::Polarity::IdleLow
    };
    rp.phase = if config.mode.samples_on_second_edge() {
        spi::Phase::CaptureOnSecondTransition
    } else {
        spi::Phase::CaptureOnFirstTransition
    };
    rp
}

/// Transmit-only blocking SPI bus
pub struct RpSpi<'d, T: Instance>(Spi<'d, T, Blocking>);

impl<'d, T: Instance> RpSpi<'d, T> {
    pub fn new(spi: Spi<'d, T, Blocking>) -> Self {
        Self(spi)
    }
}

impl<T: Instance> panelbridge_hal::SpiBus for RpSpi<'_, T> {
    type Error = spi::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.blocking_write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}
