//! Retained-mode UI engine for Panelbridge
//!
//! This crate provides:
//! - `UiEngine`, a [`GraphicsEngine`](panelbridge_core::traits::GraphicsEngine)
//!   that keeps a scene, tracks dirty regions and renders them through a
//!   partial draw buffer
//! - `StripTarget`, an `embedded-graphics` draw target over one horizontal
//!   strip of the screen
//! - `Button`, the only widget the demo screen needs
//!
//! # Architecture
//!
//! The engine never talks to hardware. Each `task_handler` call receives a
//! `DisplayPort` from the bridge: input is read through `poll_input`,
//! rendered strips leave through `flush`. Redraw and input polling are paced
//! by the engine's own clock, which the bridge advances with `tick_inc`.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod engine;
pub mod strip;
pub mod widget;

// Re-export key types
pub use engine::{UiEngine, UiError, UiEvent, INPUT_PERIOD_MS, REFRESH_PERIOD_MS};
pub use strip::StripTarget;
pub use widget::{Button, ButtonInput, ButtonState};
