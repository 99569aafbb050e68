//! Screen geometry
//!
//! Pixel coordinates, dirty rectangles and the fixed coordinate remaps for
//! each supported display rotation.

use serde::{Deserialize, Serialize};

/// Panel dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelSize {
    pub width: u16,
    pub height: u16,
}

impl PanelSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check whether a point lies on the panel
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.x < self.width as i32
            && point.y < self.height as i32
    }

    /// Rectangle covering the whole panel
    pub fn full_rect(&self) -> DirtyRect {
        DirtyRect::new(
            0,
            0,
            self.width.saturating_sub(1),
            self.height.saturating_sub(1),
        )
    }
}

/// A point in panel pixel coordinates
///
/// Signed so that transformed touch samples falling off the panel can be
/// represented before they are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with inclusive corners
///
/// `x1..=x2` by `y1..=y2`, so a single pixel has `x1 == x2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRect {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl DirtyRect {
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create from origin and size; `None` for an empty size
    pub fn from_origin_size(x: u16, y: u16, width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x1: x,
            y1: y,
            x2: x.checked_add(width - 1)?,
            y2: y.checked_add(height - 1)?,
        })
    }

    /// Corners are ordered (`x1 <= x2`, `y1 <= y2`)
    pub fn is_ordered(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Width in pixels (0 if the corners are out of order)
    pub fn width(&self) -> u32 {
        if self.x2 < self.x1 {
            0
        } else {
            u32::from(self.x2 - self.x1) + 1
        }
    }

    /// Height in pixels (0 if the corners are out of order)
    pub fn height(&self) -> u32 {
        if self.y2 < self.y1 {
            0
        } else {
            u32::from(self.y2 - self.y1) + 1
        }
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Ordered and entirely on a panel of the given size
    pub fn fits(&self, size: PanelSize) -> bool {
        self.is_ordered() && self.x2 < size.width && self.y2 < size.height
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &DirtyRect) -> DirtyRect {
        DirtyRect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Overlapping part of both, if any
    pub fn intersection(&self, other: &DirtyRect) -> Option<DirtyRect> {
        let rect = DirtyRect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        rect.is_ordered().then_some(rect)
    }

    /// Check whether a point lies inside
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x1 as i32
            && point.x <= self.x2 as i32
            && point.y >= self.y1 as i32
            && point.y <= self.y2 as i32
    }
}

/// Display rotation relative to the panel's native scan order
///
/// Rotations are clockwise. Deg90 and Deg270 exchange width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation from the quarter-turn count (0-3)
    pub fn from_quarter_turns(turns: u8) -> Option<Self> {
        match turns {
            0 => Some(Rotation::Deg0),
            1 => Some(Rotation::Deg90),
            2 => Some(Rotation::Deg180),
            3 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Quarter-turn count (0-3)
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// Logical screen size seen by the UI under this rotation
    pub const fn logical_size(self, native: PanelSize) -> PanelSize {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => native,
            Rotation::Deg90 | Rotation::Deg270 => PanelSize::new(native.height, native.width),
        }
    }

    /// Mapping from logical (rotated) coordinates to native coordinates
    ///
    /// With native size (W, H):
    /// - Deg0: (x, y)
    /// - Deg90: (W-1-y, x)
    /// - Deg180: (W-1-x, H-1-y)
    /// - Deg270: (y, H-1-x)
    pub fn to_native(self, native: PanelSize) -> Remap {
        let w = native.width as i32 - 1;
        let h = native.height as i32 - 1;
        match self {
            Rotation::Deg0 => Remap::IDENTITY,
            Rotation::Deg90 => Remap {
                swap: true,
                x: AxisRemap::flipped(w),
                y: AxisRemap::straight(0),
            },
            Rotation::Deg180 => Remap {
                swap: false,
                x: AxisRemap::flipped(w),
                y: AxisRemap::flipped(h),
            },
            Rotation::Deg270 => Remap {
                swap: true,
                x: AxisRemap::straight(0),
                y: AxisRemap::flipped(h),
            },
        }
    }

    /// Mapping from native coordinates to logical (rotated) coordinates
    ///
    /// Exact inverse of [`Rotation::to_native`].
    pub fn from_native(self, native: PanelSize) -> Remap {
        let w = native.width as i32 - 1;
        let h = native.height as i32 - 1;
        match self {
            Rotation::Deg0 => Remap::IDENTITY,
            Rotation::Deg90 => Remap {
                swap: true,
                x: AxisRemap::straight(0),
                y: AxisRemap::flipped(w),
            },
            Rotation::Deg180 => Remap {
                swap: false,
                x: AxisRemap::flipped(w),
                y: AxisRemap::flipped(h),
            },
            Rotation::Deg270 => Remap {
                swap: true,
                x: AxisRemap::flipped(h),
                y: AxisRemap::straight(0),
            },
        }
    }
}

/// One output axis of a [`Remap`]: `out = ±in + offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRemap {
    pub negate: bool,
    pub offset: i32,
}

impl AxisRemap {
    pub const fn straight(offset: i32) -> Self {
        Self {
            negate: false,
            offset,
        }
    }

    pub const fn flipped(offset: i32) -> Self {
        Self {
            negate: true,
            offset,
        }
    }

    fn apply(&self, value: i32) -> i32 {
        if self.negate {
            self.offset - value
        } else {
            self.offset + value
        }
    }
}

/// Axis swap plus per-axis mirror and offset
///
/// `out.x = ±(swap ? in.y : in.x) + x.offset`, likewise for y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Remap {
    pub swap: bool,
    pub x: AxisRemap,
    pub y: AxisRemap,
}

impl Remap {
    pub const IDENTITY: Remap = Remap {
        swap: false,
        x: AxisRemap::straight(0),
        y: AxisRemap::straight(0),
    };

    pub fn apply(&self, point: ScreenPoint) -> ScreenPoint {
        let (a, b) = if self.swap {
            (point.y, point.x)
        } else {
            (point.x, point.y)
        };
        ScreenPoint::new(self.x.apply(a), self.y.apply(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATIVE: PanelSize = PanelSize::new(240, 320);

    #[test]
    fn test_rect_dimensions() {
        let rect = DirtyRect::new(0, 0, 9, 9);
        assert_eq!(rect.width(), 10);
        assert_eq!(rect.height(), 10);
        assert_eq!(rect.area(), 100);

        let single = DirtyRect::new(5, 7, 5, 7);
        assert_eq!(single.area(), 1);
    }

    #[test]
    fn test_full_range_rect_dimensions() {
        let rect = DirtyRect::new(0, 0, u16::MAX, u16::MAX);
        assert_eq!(rect.width(), 65_536);
        assert_eq!(rect.height(), 65_536);
        assert_eq!(rect.area(), 65_536 * 65_536);

        let row = DirtyRect::new(0, 3, u16::MAX, 3);
        assert_eq!(row.width(), 65_536);
        assert_eq!(row.area(), 65_536);
    }

    #[test]
    fn test_rect_fits() {
        let size = PanelSize::new(320, 240);
        assert!(DirtyRect::new(0, 0, 319, 239).fits(size));
        assert!(!DirtyRect::new(0, 0, 320, 239).fits(size));
        assert!(!DirtyRect::new(0, 0, 319, 240).fits(size));
        assert!(!DirtyRect::new(10, 0, 9, 5).fits(size));
    }

    #[test]
    fn test_rect_from_origin_size() {
        assert_eq!(
            DirtyRect::from_origin_size(10, 20, 5, 2),
            Some(DirtyRect::new(10, 20, 14, 21))
        );
        assert_eq!(DirtyRect::from_origin_size(0, 0, 0, 10), None);
    }

    #[test]
    fn test_rect_intersection() {
        let a = DirtyRect::new(0, 0, 10, 10);
        let b = DirtyRect::new(5, 5, 20, 20);
        assert_eq!(a.intersection(&b), Some(DirtyRect::new(5, 5, 10, 10)));

        let c = DirtyRect::new(11, 0, 20, 10);
        assert_eq!(a.intersection(&c), None);
        assert_eq!(a.union(&c), DirtyRect::new(0, 0, 20, 10));
    }

    #[test]
    fn test_logical_size() {
        assert_eq!(Rotation::Deg0.logical_size(NATIVE), NATIVE);
        assert_eq!(
            Rotation::Deg90.logical_size(NATIVE),
            PanelSize::new(320, 240)
        );
        assert_eq!(Rotation::Deg180.logical_size(NATIVE), NATIVE);
    }

    #[test]
    fn test_rotation_corners() {
        // Logical top-left lands on a different native corner per rotation
        let origin = ScreenPoint::new(0, 0);
        assert_eq!(Rotation::Deg0.to_native(NATIVE).apply(origin), origin);
        assert_eq!(
            Rotation::Deg90.to_native(NATIVE).apply(origin),
            ScreenPoint::new(239, 0)
        );
        assert_eq!(
            Rotation::Deg180.to_native(NATIVE).apply(origin),
            ScreenPoint::new(239, 319)
        );
        assert_eq!(
            Rotation::Deg270.to_native(NATIVE).apply(origin),
            ScreenPoint::new(0, 319)
        );
    }

    #[test]
    fn test_rotation_remaps_are_inverse() {
        for turns in 0..4 {
            let rotation = Rotation::from_quarter_turns(turns).unwrap();
            let logical = rotation.logical_size(NATIVE);
            for point in [
                ScreenPoint::new(0, 0),
                ScreenPoint::new(logical.width as i32 - 1, 0),
                ScreenPoint::new(17, 123),
                ScreenPoint::new(logical.width as i32 - 1, logical.height as i32 - 1),
            ] {
                let native = rotation.to_native(NATIVE).apply(point);
                assert!(NATIVE.contains(native));
                assert_eq!(rotation.from_native(NATIVE).apply(native), point);
            }
        }
    }
}
