//! One-shot storage demo
//!
//! Replaces the demo text on its own flash partition, reads it back and
//! logs the first line. Shares nothing with the calibration store.

use defmt::*;
use panelbridge_hal::{FlashError, FlashStorage, StorageKey};

/// Text written at every boot
pub const DEMO_TEXT: &[u8] = b"Hello, hi from SD card!\n";

/// Run the demo on `storage`
pub fn run<S: FlashStorage>(storage: &mut S) -> Result<(), FlashError> {
    if storage.exists(StorageKey::DemoText) {
        info!("Demo text exists. Removing...");
        storage.remove(StorageKey::DemoText)?;
    }

    storage.write(StorageKey::DemoText, DEMO_TEXT)?;
    info!("Wrote demo text ({} bytes)", DEMO_TEXT.len());

    let mut buffer = [0u8; 64];
    let len = storage.read(StorageKey::DemoText, &mut buffer)?;
    let line = first_line(&buffer[..len]);

    match core::str::from_utf8(line) {
        Ok(text) => info!("Read from storage: {}", text),
        Err(_) => warn!("Read from storage: {=[u8]:x}", line),
    }
    Ok(())
}

/// Bytes up to (not including) the first newline
fn first_line(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == b'\n') {
        Some(end) => &data[..end],
        None => data,
    }
}
