//! ILI9341 TFT Display Driver
//!
//! Driver for 240x320 ILI9341 panels over 4-wire SPI (separate D/C line).
//! Pixels are RGB565, sent big-endian.

use embedded_hal::delay::DelayNs;

use panelbridge_core::geometry::{PanelSize, Rotation};
use panelbridge_core::traits::PanelBus;
use panelbridge_hal::{OutputPin, SpiBus};

/// Native panel size (portrait)
pub const NATIVE_SIZE: PanelSize = PanelSize::new(240, 320);

/// ILI9341 commands
#[allow(dead_code)]
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const PASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const PIXFMT: u8 = 0x3A;
    pub const FRMCTR1: u8 = 0xB1;
    pub const DFUNCTR: u8 = 0xB6;
    pub const PWCTR1: u8 = 0xC0;
    pub const PWCTR2: u8 = 0xC1;
    pub const VMCTR1: u8 = 0xC5;
    pub const VMCTR2: u8 = 0xC7;
    pub const GAMMASET: u8 = 0x26;
}

/// MADCTL flags
mod madctl {
    pub const MY: u8 = 0x80; // Row address order
    pub const MX: u8 = 0x40; // Column address order
    pub const MV: u8 = 0x20; // Row/column exchange
    pub const BGR: u8 = 0x08;
}

/// Pixels converted per SPI write
const PIXEL_CHUNK: usize = 32;

/// MADCTL value putting the panel's origin top-left under `rotation`
pub const fn madctl_for(rotation: Rotation) -> u8 {
    match rotation {
        Rotation::Deg0 => madctl::MX | madctl::BGR,
        Rotation::Deg90 => madctl::MV | madctl::BGR,
        Rotation::Deg180 => madctl::MY | madctl::BGR,
        Rotation::Deg270 => madctl::MX | madctl::MY | madctl::MV | madctl::BGR,
    }
}

/// Pulse the panel's reset line
pub fn hardware_reset<RST: OutputPin, D: DelayNs>(rst: &mut RST, delay: &mut D) {
    rst.set_high();
    delay.delay_ms(5);
    rst.set_low();
    delay.delay_ms(20);
    rst.set_high();
    delay.delay_ms(150);
}

/// ILI9341 driver
pub struct Ili9341<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
    rotation: Rotation,
}

impl<SPI, DC, CS> Ili9341<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create a new ILI9341 driver
    pub fn new(spi: SPI, dc: DC, mut cs: CS) -> Self {
        cs.set_high();
        Self {
            spi,
            dc,
            cs,
            rotation: Rotation::Deg0,
        }
    }

    /// Initialize the display
    pub fn init<D: DelayNs>(&mut self, delay: &mut D, rotation: Rotation) -> Result<(), SPI::Error> {
        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);

        // Power and VCOM setup
        self.command(cmd::PWCTR1, &[0x23])?;
        self.command(cmd::PWCTR2, &[0x10])?;
        self.command(cmd::VMCTR1, &[0x3E, 0x28])?;
        self.command(cmd::VMCTR2, &[0x86])?;

        self.command(cmd::PIXFMT, &[0x55])?; // 16 bits per pixel
        self.command(cmd::FRMCTR1, &[0x00, 0x18])?; // 79 Hz
        self.command(cmd::DFUNCTR, &[0x08, 0x82, 0x27])?;
        self.command(cmd::GAMMASET, &[0x01])?;

        self.set_rotation(rotation)?;

        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(120);
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(20);

        Ok(())
    }

    /// Change the scan direction
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), SPI::Error> {
        self.command(cmd::MADCTL, &[madctl_for(rotation)])?;
        self.rotation = rotation;
        Ok(())
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Logical size under the current rotation
    pub fn size(&self) -> PanelSize {
        self.rotation.logical_size(NATIVE_SIZE)
    }

    /// Turn display on/off
    pub fn set_display_on(&mut self, on: bool) -> Result<(), SPI::Error> {
        if on {
            self.command(cmd::DISPON, &[])
        } else {
            self.command(cmd::DISPOFF, &[])
        }
    }

    /// Send one command with its parameters as a complete transaction
    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), SPI::Error> {
        self.cs.set_low();
        let result = self.send(command, params);
        self.cs.set_high();
        result
    }

    /// Command byte with D/C low, then parameters with D/C high
    ///
    /// Leaves D/C high so pixel data can follow.
    fn send(&mut self, command: u8, params: &[u8]) -> Result<(), SPI::Error> {
        self.dc.set_low();
        self.spi.write(&[command])?;
        self.spi.flush()?;
        self.dc.set_high();
        if !params.is_empty() {
            self.spi.write(params)?;
        }
        Ok(())
    }
}

impl<SPI, DC, CS> PanelBus for Ili9341<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    type Error = SPI::Error;

    fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), SPI::Error> {
        let x1 = x + width.saturating_sub(1);
        let y1 = y + height.saturating_sub(1);

        self.cs.set_low();
        self.send(cmd::CASET, &[(x >> 8) as u8, x as u8, (x1 >> 8) as u8, x1 as u8])?;
        self.spi.flush()?;
        self.send(cmd::PASET, &[(y >> 8) as u8, y as u8, (y1 >> 8) as u8, y1 as u8])?;
        self.spi.flush()?;
        // CS stays low; pixels follow RAMWR
        self.send(cmd::RAMWR, &[])
    }

    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), SPI::Error> {
        let mut bytes = [0u8; PIXEL_CHUNK * 2];
        for chunk in pixels.chunks(PIXEL_CHUNK) {
            for (pixel, out) in chunk.iter().zip(bytes.chunks_exact_mut(2)) {
                out.copy_from_slice(&pixel.to_be_bytes());
            }
            self.spi.write(&bytes[..chunk.len() * 2])?;
        }
        Ok(())
    }

    fn end_write(&mut self) -> Result<(), SPI::Error> {
        let result = self.spi.flush();
        self.cs.set_high();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Dc(bool),
        Cs(bool),
        Byte(u8),
    }

    type Log = RefCell<Vec<Event, 1024>>;

    struct MockSpi<'a> {
        log: &'a Log,
        fail: bool,
    }

    impl SpiBus for MockSpi<'_> {
        type Error = ();

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            let mut log = self.log.borrow_mut();
            for &b in data {
                log.push(Event::Byte(b)).unwrap();
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    struct MockPin<'a> {
        log: &'a Log,
        is_dc: bool,
        high: bool,
    }

    impl OutputPin for MockPin<'_> {
        fn set_high(&mut self) {
            self.high = true;
            self.record();
        }

        fn set_low(&mut self) {
            self.high = false;
            self.record();
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    impl MockPin<'_> {
        fn record(&self) {
            let event = if self.is_dc {
                Event::Dc(self.high)
            } else {
                Event::Cs(self.high)
            };
            self.log.borrow_mut().push(event).unwrap();
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn driver(log: &Log) -> Ili9341<MockSpi<'_>, MockPin<'_>, MockPin<'_>> {
        let panel = Ili9341::new(
            MockSpi { log, fail: false },
            MockPin {
                log,
                is_dc: true,
                high: false,
            },
            MockPin {
                log,
                is_dc: false,
                high: false,
            },
        );
        log.borrow_mut().clear();
        panel
    }

    /// Bytes sent while D/C was low
    fn commands(log: &Log) -> Vec<u8, 64> {
        let mut dc = true;
        let mut out = Vec::new();
        for event in log.borrow().iter() {
            match *event {
                Event::Dc(level) => dc = level,
                Event::Byte(b) if !dc => out.push(b).unwrap(),
                _ => {}
            }
        }
        out
    }

    /// Bytes sent while D/C was high
    fn data(log: &Log) -> Vec<u8, 512> {
        let mut dc = true;
        let mut out = Vec::new();
        for event in log.borrow().iter() {
            match *event {
                Event::Dc(level) => dc = level,
                Event::Byte(b) if dc => out.push(b).unwrap(),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_madctl_per_rotation() {
        assert_eq!(madctl_for(Rotation::Deg0), 0x48);
        assert_eq!(madctl_for(Rotation::Deg90), 0x28);
        assert_eq!(madctl_for(Rotation::Deg180), 0x88);
        assert_eq!(madctl_for(Rotation::Deg270), 0xE8);
    }

    #[test]
    fn test_init_ends_with_display_on() {
        let log = Log::default();
        let mut panel = driver(&log);
        panel.init(&mut NoDelay, Rotation::Deg90).unwrap();

        let cmds = commands(&log);
        assert_eq!(cmds[0], cmd::SWRESET);
        assert!(cmds.contains(&cmd::MADCTL));
        assert_eq!(&cmds[cmds.len() - 2..], &[cmd::SLPOUT, cmd::DISPON]);
        assert_eq!(panel.size(), PanelSize::new(320, 240));
        // Every command transaction released CS
        assert_eq!(*log.borrow().last().unwrap(), Event::Cs(true));
    }

    #[test]
    fn test_window_then_pixels() {
        let log = Log::default();
        let mut panel = driver(&log);

        panel.set_window(10, 300, 3, 2).unwrap();
        panel.write_pixels(&[0xF800, 0x07E0, 0x001F]).unwrap();
        panel.write_pixels(&[0xFFFF, 0x0000, 0x1234]).unwrap();
        panel.end_write().unwrap();

        assert_eq!(
            commands(&log).as_slice(),
            &[cmd::CASET, cmd::PASET, cmd::RAMWR]
        );
        let data = data(&log);
        // CASET 10..=12, PASET 300..=301
        assert_eq!(&data[..4], &[0, 10, 0, 12]);
        assert_eq!(&data[4..8], &[0x01, 0x2C, 0x01, 0x2D]);
        // Big-endian RGB565, in write order
        assert_eq!(
            &data[8..],
            &[0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F, 0xFF, 0xFF, 0x00, 0x00, 0x12, 0x34]
        );

        // CS held low from the window until the end of the transaction
        let log = log.borrow();
        let cs: Vec<bool, 8> = log
            .iter()
            .filter_map(|e| match e {
                Event::Cs(level) => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(cs.as_slice(), &[false, true]);
    }

    #[test]
    fn test_long_rows_are_chunked() {
        let log = Log::default();
        let mut panel = driver(&log);
        let row = [0xABCDu16; PIXEL_CHUNK * 2 + 5];

        panel.set_window(0, 0, row.len() as u16, 1).unwrap();
        panel.write_pixels(&row).unwrap();
        panel.end_write().unwrap();

        let data = data(&log);
        assert_eq!(data.len(), 8 + row.len() * 2);
        assert!(data[8..].chunks(2).all(|px| px == [0xAB, 0xCD]));
    }

    #[test]
    fn test_bus_error_propagates() {
        let log = Log::default();
        let mut panel = driver(&log);
        panel.spi.fail = true;
        assert_eq!(panel.set_window(0, 0, 1, 1), Err(()));
        assert_eq!(panel.set_rotation(Rotation::Deg180), Err(()));
        assert_eq!(panel.rotation(), Rotation::Deg0);
    }
}
