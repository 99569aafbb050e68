//! Bridge configuration
//!
//! Board-agnostic settings for the display/touch bridge. The firmware bakes
//! a validated `bridge.toml` into a [`BridgeConfig`] constant at build time.

use serde::{Deserialize, Serialize};

use crate::geometry::{PanelSize, Rotation};

/// Default panel: 240x320 native portrait
pub const DEFAULT_NATIVE_SIZE: PanelSize = PanelSize::new(240, 320);

/// Default UI engine tick period
pub const DEFAULT_TICK_PERIOD_MS: u32 = 1;

/// Default pause between loop iterations
pub const DEFAULT_LOOP_DELAY_MS: u32 = 5;

/// Default consecutive flush failures before the loop halts
pub const DEFAULT_MAX_FLUSH_FAILURES: u8 = 3;

/// Default draw buffer height in lines
pub const DEFAULT_DRAW_BUFFER_LINES: u16 = 10;

/// Bridge configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Panel size in its native scan orientation
    pub native: PanelSize,
    /// Display rotation used by the UI and the touch transform
    pub rotation: Rotation,
    /// Smallest clock advance handed to the UI engine
    pub tick_period_ms: u32,
    /// Pause between loop iterations (paced by the firmware, not the bridge)
    pub loop_delay_ms: u32,
    /// Consecutive flush failures tolerated before halting
    pub max_flush_failures: u8,
    /// Draw buffer height; the buffer holds this many full-width lines
    pub draw_buffer_lines: u16,
    /// Run touch calibration at boot even when one is stored
    pub force_calibration: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::default_const()
    }
}

impl BridgeConfig {
    /// Defaults usable in const context
    pub const fn default_const() -> Self {
        Self {
            native: DEFAULT_NATIVE_SIZE,
            rotation: Rotation::Deg90,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            loop_delay_ms: DEFAULT_LOOP_DELAY_MS,
            max_flush_failures: DEFAULT_MAX_FLUSH_FAILURES,
            draw_buffer_lines: DEFAULT_DRAW_BUFFER_LINES,
            force_calibration: false,
        }
    }

    /// Screen size seen by the UI and the touch sampler
    pub const fn logical_size(&self) -> PanelSize {
        self.rotation.logical_size(self.native)
    }

    /// Draw buffer capacity in pixels
    pub const fn draw_buffer_pixels(&self) -> usize {
        self.logical_size().width as usize * self.draw_buffer_lines as usize
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.native.width == 0 || self.native.height == 0 {
            return Err(ConfigError::EmptyPanel);
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.max_flush_failures == 0 {
            return Err(ConfigError::ZeroFailureLimit);
        }
        if self.draw_buffer_lines == 0 || self.draw_buffer_lines > self.logical_size().height {
            return Err(ConfigError::DrawBufferLines);
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Panel width or height is zero
    EmptyPanel,
    /// Tick period must be at least 1 ms
    ZeroTickPeriod,
    /// Failure limit must be at least 1
    ZeroFailureLimit,
    /// Draw buffer must hold between one line and a full screen
    DrawBufferLines,
}
