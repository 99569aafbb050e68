//! RP2040-specific HAL for the bridge firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `panelbridge-hal` traits on top of embassy-rp:
//!
//! - GPIO output/input wrappers
//! - Blocking SPI master for the panel
//! - Millisecond clock from the embassy time driver
//! - Flash storage partitions (implement `panelbridge_hal::FlashStorage`)

#![no_std]

pub mod clock;
pub mod flash;
pub mod gpio;
pub mod spi;

// Re-export shared traits from panelbridge-hal for convenience
pub use panelbridge_hal::{FlashStorage as FlashStorageTrait, StorageKey};
