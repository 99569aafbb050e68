//! Board configuration
//!
//! `bridge.toml` is validated by the build script and baked in as
//! [`BRIDGE_CONFIG`]. Edit it and rebuild to customize.

use panelbridge_core::geometry::{PanelSize, Rotation};
use panelbridge_core::BridgeConfig;

include!(concat!(env!("OUT_DIR"), "/bridge_config.rs"));

/// Draw buffer capacity in pixels (full-width lines)
pub const DRAW_BUFFER_PIXELS: usize = BRIDGE_CONFIG.draw_buffer_pixels();
