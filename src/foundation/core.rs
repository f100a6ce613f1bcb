pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Stable identifier of an overlay layer.
///
/// Ids are handed out by the store from a monotonic counter and are never reused, not even
/// after the layer they named is removed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position expressed in percent of the canvas, each axis in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Percent2 {
    /// Horizontal offset from the left edge.
    pub horizontal: f64,
    /// Vertical offset from the top edge.
    pub vertical: f64,
}

impl Percent2 {
    /// Canvas midpoint.
    pub const CENTER: Self = Self {
        horizontal: 50.0,
        vertical: 50.0,
    };

    /// Create a position, clamping both axes into `[0, 100]`.
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal: clamp_percent(horizontal),
            vertical: clamp_percent(vertical),
        }
    }

    /// Resolve to pixel coordinates on a `width x height` canvas.
    pub fn to_pixels(self, width: u32, height: u32) -> Point {
        Point::new(
            f64::from(width) * self.horizontal / 100.0,
            f64::from(height) * self.vertical / 100.0,
        )
    }
}

impl Default for Percent2 {
    fn default() -> Self {
        Self::CENTER
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { 50.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
