#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod bitmap;

use serde::{Deserialize, Serialize};

pub use bitmap::Bitmap;

/// World units covered by one CSS pixel of rendered content.
pub const WORLD_UNITS_PER_PIXEL: f32 = 0.0025;

/// Monotonic host clock reading in milliseconds.
///
/// Everything time-driven (throttling, asset timeouts) is fed an explicit
/// `Millis` by the host loop, so runs replay deterministically.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    /// Start of any host timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` milliseconds.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Integer pixel dimensions of measured content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel-space rectangle, shaped like a DOM bounding client rect.
///
/// Y grows downward, so `top <= bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Top edge.
    pub top: f32,
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Width (`right - left`).
    pub width: f32,
    /// Height (`bottom - top`).
    pub height: f32,
}

impl PixelRect {
    /// Build a rect from its top-left corner and size.
    pub fn from_origin_size(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Inclusive containment test: points on the edge count as inside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        y >= self.top && y <= self.bottom && x >= self.left && x <= self.right
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        (
            self.left + self.width * 0.5,
            self.top + self.height * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_since_saturates() {
        let t = Millis(100);
        assert_eq!(t.advance(50).since(t), 50);
        assert_eq!(t.since(t.advance(50)), 0);
    }

    #[test]
    fn rect_contains_is_inclusive() {
        let rect = PixelRect::from_origin_size(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right, 40.0);
        assert_eq!(rect.bottom, 60.0);
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(40.0, 60.0));
        assert!(!rect.contains(40.1, 30.0));
        assert_eq!(rect.center(), (25.0, 40.0));
    }

    #[test]
    fn empty_size() {
        assert!(PixelSize::new(0, 10).is_empty());
        assert!(!PixelSize::new(1, 1).is_empty());
    }
}
