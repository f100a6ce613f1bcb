use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::assets::color::Rgba8;

/// Smallest and largest brush size offered to the user, in pixels.
pub const BRUSH_SIZE_RANGE: (f64, f64) = (1.0, 100.0);

/// One continuous freehand gesture.
///
/// Points are in native canvas pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingStroke {
    /// Ordered pointer samples.
    pub points: Vec<Point>,
    /// Stroke color.
    pub color: Rgba8,
    /// Brush width in pixels, `> 0`.
    pub brush_size: f64,
}

/// Current brush configuration of drawing mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingSettings {
    /// Whether pointer gestures draw strokes.
    pub enabled: bool,
    /// Brush width in pixels.
    pub brush_size: f64,
    /// Brush color.
    pub color: Rgba8,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            brush_size: 10.0,
            color: Rgba8::WHITE,
        }
    }
}

impl DrawingSettings {
    /// Clamp a requested brush size into the offered range.
    pub fn clamp_brush_size(size: f64) -> f64 {
        if size.is_finite() {
            size.clamp(BRUSH_SIZE_RANGE.0, BRUSH_SIZE_RANGE.1)
        } else {
            BRUSH_SIZE_RANGE.0
        }
    }

    /// Start capturing a gesture with the current brush.
    pub fn begin_stroke(&self) -> StrokeBuilder {
        StrokeBuilder::new(self.color, self.brush_size)
    }
}

/// Accumulates the samples of one in-progress gesture.
#[derive(Clone, Debug)]
pub struct StrokeBuilder {
    points: Vec<Point>,
    color: Rgba8,
    brush_size: f64,
}

impl StrokeBuilder {
    /// Start a gesture with an explicit brush.
    pub fn new(color: Rgba8, brush_size: f64) -> Self {
        Self {
            points: Vec::new(),
            color,
            brush_size: DrawingSettings::clamp_brush_size(brush_size),
        }
    }

    /// Add a pointer sample; repeated identical samples are collapsed.
    pub fn push(&mut self, p: Point) {
        if !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    /// Number of samples so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Return `true` when no sample was captured.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Complete the gesture. Gestures without samples produce no stroke.
    pub fn finish(self) -> Option<DrawingStroke> {
        if self.points.is_empty() {
            return None;
        }
        Some(DrawingStroke {
            points: self.points,
            color: self.color,
            brush_size: self.brush_size,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/drawing.rs"]
mod tests;
