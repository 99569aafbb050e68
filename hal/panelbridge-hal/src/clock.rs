//! Monotonic time source
//!
//! The bridge never sleeps; it only asks how much time has passed.

/// Millisecond wall clock
///
/// Readings must never go backwards. The origin is arbitrary (boot time on
/// real hardware), only differences between readings are meaningful.
pub trait Monotonic {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
