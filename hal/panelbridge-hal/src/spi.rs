//! SPI master abstraction
//!
//! The panel link is transmit-only (no MISO on the display header), so the
//! bus only moves bytes out. Chip select is not part of the bus; the driver
//! holds its own CS line low across a whole window write.

/// Transmit-only SPI master
pub trait SpiBus {
    type Error;

    /// Send `data`, blocking until every byte has been queued
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until the last queued byte has left the shift register
    ///
    /// Must be called before raising CS or toggling DC.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: SpiBus + ?Sized> SpiBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// Clock settings for the panel link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    pub mode: Mode,
}

impl SpiConfig {
    /// Panel write clock
    pub const PANEL_DEFAULT_HZ: u32 = 40_000_000;

    pub const fn new(frequency: u32) -> Self {
        Self {
            frequency,
            mode: Mode::Mode0,
        }
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::new(Self::PANEL_DEFAULT_HZ)
    }
}

/// SPI clock mode (CPOL/CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Clock line idles high (CPOL=1)
    pub const fn idles_high(self) -> bool {
        matches!(self, Mode::Mode2 | Mode::Mode3)
    }

    /// Data is sampled on the second clock edge (CPHA=1)
    pub const fn samples_on_second_edge(self) -> bool {
        matches!(self, Mode::Mode1 | Mode::Mode3)
    }
}
