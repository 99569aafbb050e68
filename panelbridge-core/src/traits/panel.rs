//! Panel bus trait
//!
//! A windowed-write pixel protocol: open an addressing window, stream the
//! window's pixels in the panel's addressing order, close the transaction.

/// Windowed pixel writes to a display panel
///
/// Pixels are raw RGB565 words. After `set_window(x, y, w, h)` the panel
/// expects exactly `w * h` pixels, left-to-right then top-to-bottom,
/// possibly split across several `write_pixels` calls.
pub trait PanelBus {
    /// Error type for bus operations
    type Error;

    /// Open a write transaction targeting the given region
    fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error>;

    /// Stream the next pixels of the open window
    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error>;

    /// Close the write transaction
    fn end_write(&mut self) -> Result<(), Self::Error>;
}

impl<T: PanelBus + ?Sized> PanelBus for &mut T {
    type Error = T::Error;

    fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
        (**self).set_window(x, y, width, height)
    }

    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error> {
        (**self).write_pixels(pixels)
    }

    fn end_write(&mut self) -> Result<(), Self::Error> {
        (**self).end_write()
    }
}
