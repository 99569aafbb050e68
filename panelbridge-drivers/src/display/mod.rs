//! Display panel drivers

pub mod ili9341;

pub use ili9341::{hardware_reset, Ili9341};
