use crate::error::{TwibbonError, TwibbonResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Logical compositing surface dimensions in pixels.
///
/// All transform and drag math lives in this coordinate space, independent of
/// the size the surface is displayed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The stock editor surface, 800x800.
    pub const DEFAULT: Self = Self {
        width: 800,
        height: 800,
    };

    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> TwibbonResult<Self> {
        if width == 0 || height == 0 {
            return Err(TwibbonError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Geometric center of the surface.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::DEFAULT
    }
}
