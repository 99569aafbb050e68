//! Demo UI engine
//!
//! One screen: a background and a centred "Click Me" button. The engine
//! keeps a short list of dirty regions and redraws them at most every
//! [`REFRESH_PERIOD_MS`] of engine time. Regions taller than the draw buffer
//! are rendered and flushed as horizontal strips.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::{Deque, Vec};

use panelbridge_core::flush::FlushError;
use panelbridge_core::geometry::{DirtyRect, PanelSize};
use panelbridge_core::traits::{DisplayPort, GraphicsEngine};

use crate::strip::StripTarget;
use crate::widget::{Button, ButtonInput, BACKGROUND};

/// Minimum engine time between redraws
pub const REFRESH_PERIOD_MS: u64 = 30;

/// Minimum engine time between input reads
pub const INPUT_PERIOD_MS: u64 = 30;

/// Dirty regions tracked before collapsing to a full redraw
const MAX_DIRTY: usize = 8;

/// Events raised for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiEvent {
    /// The button was clicked
    Clicked,
}

/// Engine construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiError {
    /// Draw buffer cannot hold one full screen line
    BufferTooSmall { needed: usize, actual: usize },
}

/// Scene contents
struct Scene {
    button: Button,
}

impl Scene {
    fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(BACKGROUND)?;
        self.button.draw(target)
    }
}

/// Retained-mode engine over a partial draw buffer
pub struct UiEngine<'a> {
    buffer: &'a mut [u16],
    size: PanelSize,
    scene: Scene,
    dirty: Vec<DirtyRect, MAX_DIRTY>,
    events: Deque<UiEvent, 4>,
    clock_ms: u64,
    last_refresh_ms: Option<u64>,
    last_input_ms: Option<u64>,
}

impl<'a> UiEngine<'a> {
    /// Create the engine for a screen of `size` logical pixels
    ///
    /// `buffer` must hold at least one full line. The whole screen starts
    /// dirty.
    pub fn new(size: PanelSize, buffer: &'a mut [u16]) -> Result<Self, UiError> {
        let needed = size.width as usize;
        if needed == 0 || buffer.len() < needed {
            return Err(UiError::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }

        let mut engine = Self {
            buffer,
            size,
            scene: Scene {
                button: Button::centered(size, "Click Me"),
            },
            dirty: Vec::new(),
            events: Deque::new(),
            clock_ms: 0,
            last_refresh_ms: None,
            last_input_ms: None,
        };
        engine.invalidate_all();
        Ok(engine)
    }

    /// Mark a region for redraw
    pub fn invalidate(&mut self, rect: DirtyRect) {
        let Some(rect) = rect.intersection(&self.size.full_rect()) else {
            return;
        };
        if self.dirty.iter().any(|d| d.intersection(&rect) == Some(rect)) {
            return;
        }
        if self.dirty.push(rect).is_err() {
            self.invalidate_all();
        }
    }

    /// Mark the whole screen for redraw
    pub fn invalidate_all(&mut self) {
        self.dirty.clear();
        // Cannot fail on an empty list
        let _ = self.dirty.push(self.size.full_rect());
    }

    /// Next pending event
    pub fn take_event(&mut self) -> Option<UiEvent> {
        self.events.pop_front()
    }

    /// Regions still waiting for a successful flush
    pub fn pending_redraw(&self) -> &[DirtyRect] {
        &self.dirty
    }

    /// Engine clock
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Lines rendered per flush
    pub fn strip_lines(&self, width: u32) -> u16 {
        let lines = self.buffer.len() / (width.max(1) as usize);
        lines.min(u16::MAX as usize) as u16
    }

    pub fn button(&self) -> &Button {
        &self.scene.button
    }

    fn due(&self, last: Option<u64>, period: u64) -> bool {
        last.map_or(true, |t| self.clock_ms.saturating_sub(t) >= period)
    }

    fn read_input<P: DisplayPort>(&mut self, port: &mut P) {
        let reading = port.poll_input();
        match self.scene.button.handle_input(&reading) {
            ButtonInput::Unchanged => {}
            ButtonInput::Changed => self.invalidate(self.scene.button.rect()),
            ButtonInput::Clicked => {
                self.invalidate(self.scene.button.rect());
                // Oldest event is dropped if the application falls behind
                if self.events.is_full() {
                    self.events.pop_front();
                }
                let _ = self.events.push_back(UiEvent::Clicked);
            }
        }
    }

    /// Render and flush every dirty region
    ///
    /// A region is dropped from the list only once all its strips are
    /// flushed.
    fn refresh<P: DisplayPort>(&mut self, port: &mut P) -> Result<(), FlushError> {
        while let Some(rect) = self.dirty.first().copied() {
            self.render(rect, port)?;
            self.dirty.remove(0);
        }
        Ok(())
    }

    fn render<P: DisplayPort>(&mut self, rect: DirtyRect, port: &mut P) -> Result<(), FlushError> {
        let lines = self.strip_lines(rect.width()).max(1);
        let available = self.buffer.len();

        for y1 in (rect.y1..=rect.y2).step_by(lines as usize) {
            let y2 = rect.y2.min(y1.saturating_add(lines - 1));
            let strip = DirtyRect::new(rect.x1, y1, rect.x2, y2);

            let Some(mut target) = StripTarget::new(self.buffer, strip) else {
                return Err(FlushError::BufferSize {
                    expected: strip.area(),
                    actual: available,
                });
            };
            self.scene.draw(&mut target).unwrap_or_else(|never| match never {});

            let _done = port.flush(strip, target.pixels())?;
        }
        Ok(())
    }
}

impl GraphicsEngine for UiEngine<'_> {
    fn tick_inc(&mut self, elapsed_ms: u32) {
        self.clock_ms += elapsed_ms as u64;
    }

    fn task_handler<P: DisplayPort>(&mut self, port: &mut P) -> Result<(), FlushError> {
        if self.due(self.last_input_ms, INPUT_PERIOD_MS) {
            self.last_input_ms = Some(self.clock_ms);
            self.read_input(port);
        }

        if !self.dirty.is_empty() && self.due(self.last_refresh_ms, REFRESH_PERIOD_MS) {
            self.last_refresh_ms = Some(self.clock_ms);
            self.refresh(port)?;
        }

        Ok(())
    }
}
