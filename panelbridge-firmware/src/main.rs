//! Panelbridge - SPI display and resistive touch bridge firmware
//!
//! Main firmware binary for RP2040 boards with an ILI9341 panel and an
//! XPT2046 touch controller. Setup runs once (backlight, panel, touch
//! calibration, storage demo, UI), then a single cooperative loop drives
//! the bridge.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use panelbridge_core::calibration::CalibrationSource;
use panelbridge_core::{
    ensure_calibration, Bridge, BridgeError, CalibrationOutcome, CalibrationStore, DisplayFlusher,
};
use panelbridge_drivers::display::hardware_reset;
use panelbridge_hal_rp2040::clock::EmbassyClock;
use panelbridge_hal_rp2040::flash::{CALIBRATION_RANGE, DEMO_RANGE};
use panelbridge_ui::{UiEngine, UiEvent};

use crate::board::Board;
use crate::config::{BRIDGE_CONFIG, DRAW_BUFFER_PIXELS};
use crate::prompt::PanelPrompt;

mod board;
mod config;
mod demo;
mod prompt;

// UI draw buffer (must live forever for the engine)
static DRAW_BUFFER: StaticCell<[u16; DRAW_BUFFER_PIXELS]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Panelbridge firmware starting...");

    let config = BRIDGE_CONFIG;
    if let Err(e) = config.validate() {
        error!("Invalid bridge configuration: {}", e);
        halt().await;
    }

    let p = embassy_rp::init(Default::default());
    let mut board = Board::new(p);
    info!("Peripherals initialized");

    board.backlight.set_on(true);
    info!("Backlight enabled");

    let mut delay = Delay;
    hardware_reset(&mut board.panel_reset, &mut delay);
    if let Err(e) = board.panel.init(&mut delay, config.rotation) {
        error!("Display init failed: {}", Debug2Format(&e));
        halt().await;
    }
    let size = config.logical_size();
    info!("Display initialized ({}x{}, {})", size.width, size.height, config.rotation);

    // Touch calibration
    let transform = {
        let mut store = CalibrationStore::new(board.flash.partition(CALIBRATION_RANGE));
        let mut prompt = PanelPrompt::new(DisplayFlusher::new(&mut board.panel, size));

        if config.force_calibration {
            info!("Re-running calibration as requested...");
        }
        let outcome = ensure_calibration(&mut store, &mut board.touch, &mut prompt, &config);
        prompt.clear();
        report_calibration(&outcome);
        outcome.transform
    };

    // Storage demo on its own partition
    match demo::run(&mut board.flash.partition(DEMO_RANGE)) {
        Ok(()) => info!("Storage demo complete"),
        Err(e) => warn!("Storage demo failed: {}", e),
    }

    // UI engine
    let buffer = DRAW_BUFFER.init([0u16; DRAW_BUFFER_PIXELS]);
    let engine = match UiEngine::new(size, buffer) {
        Ok(engine) => engine,
        Err(e) => {
            error!("UI init failed: {}", e);
            halt().await
        }
    };
    info!("UI initialized ({} line draw buffer)", config.draw_buffer_lines);

    let Board {
        panel,
        touch,
        panel_reset: _panel_reset,
        backlight: _backlight,
        flash: _flash,
    } = board;

    let mut bridge = Bridge::from_config(touch, transform, panel, EmbassyClock, engine, &config);
    info!("Bridge running");

    loop {
        match bridge.run_iteration() {
            Ok(report) => {
                if let Some(e) = report.flush_error {
                    warn!("Flush failed: {}", e);
                }
            }
            Err(BridgeError::DisplayHalted) => {
                error!(
                    "Display halted after {} consecutive flush failures",
                    config.max_flush_failures
                );
                halt().await;
            }
        }

        while let Some(event) = bridge.engine_mut().take_event() {
            match event {
                UiEvent::Clicked => info!("Button clicked"),
            }
        }

        Timer::after_millis(config.loop_delay_ms as u64).await;
    }
}

/// Log where the touch calibration came from
fn report_calibration(outcome: &CalibrationOutcome) {
    if let Some(e) = outcome.load_error {
        info!("No usable stored calibration: {}", e);
    }

    match outcome.source {
        CalibrationSource::Stored => info!("Touch calibration loaded from flash"),
        CalibrationSource::StoredRerotated => {
            info!("Touch calibration loaded from flash and re-rotated")
        }
        CalibrationSource::Interactive { persisted: Ok(()) } => {
            info!("Touch calibration saved")
        }
        CalibrationSource::Interactive { persisted: Err(e) } => {
            warn!(
                "Touch calibration not saved ({}), it will not survive a restart",
                e
            )
        }
    }
}

/// Park the firmware after an unrecoverable error
async fn halt() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}
