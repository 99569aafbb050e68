//! Widgets
//!
//! A push button with click detection: a click is a press that starts on
//! the button and ends with the finger lifted while still on it. Sliding
//! off cancels the press.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use panelbridge_core::geometry::{DirtyRect, PanelSize};
use panelbridge_core::touch::TouchReading;

/// Screen background
pub const BACKGROUND: Rgb565 = Rgb565::new(2, 4, 6);
/// Button fill when idle
pub const BUTTON_IDLE: Rgb565 = Rgb565::new(4, 24, 26);
/// Button fill while pressed
pub const BUTTON_PRESSED: Rgb565 = Rgb565::new(2, 12, 13);
/// Button label
pub const LABEL: Rgb565 = Rgb565::WHITE;

const BUTTON_WIDTH: u16 = 100;
const BUTTON_HEIGHT: u16 = 40;
const CORNER_RADIUS: u32 = 6;

/// Button state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    #[default]
    Idle,
    Pressed,
}

/// Outcome of feeding one input reading to a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonInput {
    /// Nothing changed
    Unchanged,
    /// State changed, needs a redraw
    Changed,
    /// Released on the button
    Clicked,
}

/// Push button with a text label
#[derive(Debug, Clone)]
pub struct Button {
    rect: DirtyRect,
    label: &'static str,
    state: ButtonState,
}

impl Button {
    pub fn new(rect: DirtyRect, label: &'static str) -> Self {
        Self {
            rect,
            label,
            state: ButtonState::Idle,
        }
    }

    /// Standard-size button centred on a screen of `size`
    ///
    /// Shrinks to fit screens smaller than the standard size.
    pub fn centered(size: PanelSize, label: &'static str) -> Self {
        let width = BUTTON_WIDTH.min(size.width.max(1));
        let height = BUTTON_HEIGHT.min(size.height.max(1));
        let x = (size.width - width) / 2;
        let y = (size.height - height) / 2;
        Self::new(DirtyRect::new(x, y, x + width - 1, y + height - 1), label)
    }

    pub fn rect(&self) -> DirtyRect {
        self.rect
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Update from one input reading
    pub fn handle_input(&mut self, reading: &TouchReading) -> ButtonInput {
        let on_button = reading.is_pressed() && self.rect.contains(reading.point);

        match (self.state, reading.is_pressed()) {
            (ButtonState::Idle, true) if on_button => {
                self.state = ButtonState::Pressed;
                ButtonInput::Changed
            }
            (ButtonState::Pressed, true) if !on_button => {
                // Slid off: cancel
                self.state = ButtonState::Idle;
                ButtonInput::Changed
            }
            (ButtonState::Pressed, false) => {
                self.state = ButtonState::Idle;
                ButtonInput::Clicked
            }
            _ => ButtonInput::Unchanged,
        }
    }

    /// Draw the button
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let fill = match self.state {
            ButtonState::Idle => BUTTON_IDLE,
            ButtonState::Pressed => BUTTON_PRESSED,
        };

        let top_left = Point::new(self.rect.x1 as i32, self.rect.y1 as i32);
        let size = Size::new(self.rect.width(), self.rect.height());
        let bounds = Rectangle::new(top_left, size);

        RoundedRectangle::with_equal_corners(bounds, Size::new(CORNER_RADIUS, CORNER_RADIUS))
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(target)?;

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            self.label,
            bounds.center(),
            MonoTextStyle::new(&FONT_6X10, LABEL),
            text_style,
        )
        .draw(target)?;

        Ok(())
    }
}
