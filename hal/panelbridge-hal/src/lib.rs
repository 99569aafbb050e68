//! Hardware traits for the display/touch bridge
//!
//! Everything above this crate (`panelbridge-core`, `panelbridge-drivers`,
//! the UI engine) is written against these traits only and builds and tests
//! on the host. `panelbridge-hal-rp2040` implements them on embassy-rp.
//!
//! ```text
//!  panelbridge-core      panelbridge-drivers
//!          \                   /
//!           panelbridge-hal (traits)
//!                    |
//!          panelbridge-hal-rp2040
//! ```
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`]: panel control lines, backlight,
//!   bit-banged touch bus
//! - [`spi::SpiBus`]: transmit-only panel link
//! - [`flash::FlashStorage`]: calibration record and demo text
//! - [`clock::Monotonic`]: millisecond clock for tick accounting

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod flash;
pub mod gpio;
pub mod spi;

pub use clock::Monotonic;
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin};
pub use spi::SpiBus;
