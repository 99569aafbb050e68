//! Strip draw target
//!
//! Renders into a slice of the draw buffer that backs one horizontal strip
//! of the screen. Drawing uses screen coordinates; anything outside the
//! strip is clipped.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use panelbridge_core::geometry::DirtyRect;

/// Draw target covering `area`, backed by a row-major RGB565 buffer
pub struct StripTarget<'a> {
    buffer: &'a mut [u16],
    area: DirtyRect,
}

impl<'a> StripTarget<'a> {
    /// Wrap the first `area.area()` words of `buffer`
    ///
    /// Returns `None` if the buffer is too short.
    pub fn new(buffer: &'a mut [u16], area: DirtyRect) -> Option<Self> {
        let len = area.area();
        if len == 0 || buffer.len() < len {
            return None;
        }
        Some(Self {
            buffer: &mut buffer[..len],
            area,
        })
    }

    /// Rendered pixels, ready to flush
    pub fn pixels(&self) -> &[u16] {
        self.buffer
    }

    pub fn area(&self) -> DirtyRect {
        self.area
    }

    fn index(&self, point: Point) -> Option<usize> {
        let x = point.x - self.area.x1 as i32;
        let y = point.y - self.area.y1 as i32;
        let width = self.area.width() as i32;
        let height = self.area.height() as i32;
        if x < 0 || y < 0 || x >= width || y >= height {
            return None;
        }
        Some((y * width + x) as usize)
    }
}

impl Dimensions for StripTarget<'_> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.area.x1 as i32, self.area.y1 as i32),
            Size::new(self.area.width(), self.area.height()),
        )
    }
}

impl DrawTarget for StripTarget<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(idx) = self.index(point) {
                self.buffer[idx] = RawU16::from(color).into_inner();
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let raw = RawU16::from(color).into_inner();
        let clipped = area.intersection(&self.bounding_box());
        for point in clipped.points() {
            if let Some(idx) = self.index(point) {
                self.buffer[idx] = raw;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(RawU16::from(color).into_inner());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    fn raw(color: Rgb565) -> u16 {
        RawU16::from(color).into_inner()
    }

    #[test]
    fn test_buffer_too_short() {
        let mut buffer = [0u16; 10];
        assert!(StripTarget::new(&mut buffer, DirtyRect::new(0, 0, 3, 2)).is_none());
        assert!(StripTarget::new(&mut buffer, DirtyRect::new(0, 0, 4, 1)).is_some());
    }

    #[test]
    fn test_draws_in_screen_coordinates() {
        let mut buffer = [0u16; 32];
        let mut target = StripTarget::new(&mut buffer, DirtyRect::new(10, 20, 17, 21)).unwrap();

        Pixel(Point::new(10, 20), Rgb565::RED).draw(&mut target).unwrap();
        Pixel(Point::new(17, 21), Rgb565::BLUE).draw(&mut target).unwrap();
        // Outside: clipped
        Pixel(Point::new(9, 20), Rgb565::GREEN).draw(&mut target).unwrap();
        Pixel(Point::new(10, 22), Rgb565::GREEN).draw(&mut target).unwrap();

        let pixels = target.pixels();
        assert_eq!(pixels.len(), 16);
        assert_eq!(pixels[0], raw(Rgb565::RED));
        assert_eq!(pixels[15], raw(Rgb565::BLUE));
        assert_eq!(pixels.iter().filter(|p| **p == raw(Rgb565::GREEN)).count(), 0);
    }

    #[test]
    fn test_fill_clips_to_strip() {
        let mut buffer = [0u16; 16];
        let mut target = StripTarget::new(&mut buffer, DirtyRect::new(0, 4, 3, 7)).unwrap();

        Rectangle::new(Point::new(2, 0), Size::new(10, 6))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(&mut target)
            .unwrap();

        let white = raw(Rgb565::WHITE);
        let pixels = target.pixels();
        // Rows y=4 and y=5, columns 2 and 3
        for (i, px) in pixels.iter().enumerate() {
            let (x, y) = (i % 4, 4 + i / 4);
            let inside = x >= 2 && y <= 5;
            assert_eq!(*px == white, inside, "pixel ({}, {})", x, y);
        }
    }
}
