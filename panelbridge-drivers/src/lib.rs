//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in panelbridge-core, written against the panelbridge-hal pin and bus
//! traits:
//!
//! - Display panels (ILI9341 over 4-wire SPI)
//! - Touch controllers (XPT2046 over a bit-banged bus)
//! - Backlight (GPIO)

#![no_std]
#![deny(unsafe_code)]

pub mod backlight;
pub mod display;
pub mod touch;
