//! Board wiring for a Raspberry Pi Pico driving an ILI9341/XPT2046 module
//!
//! | Signal        | GPIO |
//! |---------------|------|
//! | LCD DC        | 16   |
//! | LCD CS        | 17   |
//! | LCD SCK       | 18   |
//! | LCD MOSI      | 19   |
//! | LCD RESET     | 20   |
//! | Backlight     | 21   |
//! | Touch CLK     | 10   |
//! | Touch MOSI    | 11   |
//! | Touch MISO    | 12   |
//! | Touch CS      | 13   |

use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::Spi;
use embassy_rp::Peripherals;
use embassy_time::Delay;

use panelbridge_drivers::backlight::Backlight;
use panelbridge_drivers::display::Ili9341;
use panelbridge_drivers::touch::Xpt2046;
use panelbridge_hal::spi::SpiConfig;
use panelbridge_hal_rp2040::flash::Rp2040Flash;
use panelbridge_hal_rp2040::gpio::{RpInput, RpOutput};
use panelbridge_hal_rp2040::spi::{rp_config, RpSpi};

/// Panel SPI clock
const PANEL_SPI_HZ: u32 = 40_000_000;

pub type Pin = RpOutput<'static>;
pub type Panel = Ili9341<RpSpi<'static, SPI0>, Pin, Pin>;
pub type Touch = Xpt2046<Pin, Pin, RpInput<'static>, Pin, Delay>;

/// Everything the firmware drives
///
/// Pins reset to inputs when dropped, so the board is kept alive for the
/// whole program.
pub struct Board {
    pub panel: Panel,
    pub panel_reset: Pin,
    pub backlight: Backlight<Pin>,
    pub touch: Touch,
    pub flash: Rp2040Flash<'static>,
}

impl Board {
    pub fn new(p: Peripherals) -> Self {
        let spi_config = rp_config(&SpiConfig::new(PANEL_SPI_HZ));
        let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);

        let panel = Ili9341::new(
            RpSpi::new(spi),
            RpOutput::new(p.PIN_16, false),
            RpOutput::new(p.PIN_17, true),
        );

        let touch = Xpt2046::new(
            RpOutput::new(p.PIN_10, false),
            RpOutput::new(p.PIN_11, false),
            RpInput::new(p.PIN_12, false),
            RpOutput::new(p.PIN_13, true),
            Delay,
        );

        Self {
            panel,
            panel_reset: RpOutput::new(p.PIN_20, true),
            backlight: Backlight::new_active_high(RpOutput::new(p.PIN_21, false)),
            touch,
            flash: Rp2040Flash::new(p.FLASH, p.DMA_CH0),
        }
    }
}
