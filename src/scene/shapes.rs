use kurbo::BezPath;
use serde::{Deserialize, Serialize};

/// Side length of the box every catalog path is authored in, centered on the origin.
pub const REFERENCE_UNIT: f64 = 100.0;

/// Fixed catalog of vector shapes.
///
/// Names that are not part of the catalog deserialize to [`ShapeType::Unknown`], which has no
/// path and draws nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    /// Axis-aligned square.
    Square,
    /// Circle.
    Circle,
    /// Upward-pointing triangle.
    Triangle,
    /// Square rotated by 45 degrees.
    Diamond,
    /// Five-pointed star.
    Star,
    /// Pointy-top hexagon.
    Hexagon,
    /// Heart.
    Heart,
    /// Right-pointing arrow.
    Arrow,
    /// Unrecognized catalog name.
    #[serde(other)]
    Unknown,
}

impl ShapeType {
    /// All drawable catalog entries, in display order.
    pub const CATALOG: [ShapeType; 8] = [
        ShapeType::Square,
        ShapeType::Circle,
        ShapeType::Triangle,
        ShapeType::Diamond,
        ShapeType::Star,
        ShapeType::Hexagon,
        ShapeType::Heart,
        ShapeType::Arrow,
    ];

    /// Catalog name as used in scene documents.
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Square => "square",
            ShapeType::Circle => "circle",
            ShapeType::Triangle => "triangle",
            ShapeType::Diamond => "diamond",
            ShapeType::Star => "star",
            ShapeType::Hexagon => "hexagon",
            ShapeType::Heart => "heart",
            ShapeType::Arrow => "arrow",
            ShapeType::Unknown => "unknown",
        }
    }

    fn svg_path(self) -> Option<&'static str> {
        Some(match self {
            ShapeType::Square => "M-50,-50 L50,-50 L50,50 L-50,50 Z",
            ShapeType::Circle => "M-50,0 A50,50 0 1,0 50,0 A50,50 0 1,0 -50,0 Z",
            ShapeType::Triangle => "M0,-50 L50,50 L-50,50 Z",
            ShapeType::Diamond => "M0,-50 L50,0 L0,50 L-50,0 Z",
            ShapeType::Star => {
                "M0,-50 L11.76,-16.18 L47.55,-15.45 L19.02,6.18 L29.39,40.45 \
                 L0,20 L-29.39,40.45 L-19.02,6.18 L-47.55,-15.45 L-11.76,-16.18 Z"
            }
            ShapeType::Hexagon => "M0,-50 L43.3,-25 L43.3,25 L0,50 L-43.3,25 L-43.3,-25 Z",
            ShapeType::Heart => "M0,35 C-60,-5 -40,-55 0,-25 C40,-55 60,-5 0,35 Z",
            ShapeType::Arrow => "M-50,-15 L10,-15 L10,-40 L50,0 L10,40 L10,15 L-50,15 Z",
            ShapeType::Unknown => return None,
        })
    }
}

/// Resolve a shape against the catalog, in reference-unit coordinates.
///
/// Returns `None` for shapes without a catalog entry.
pub fn shape_path(shape: ShapeType) -> Option<BezPath> {
    let svg = shape.svg_path()?;
    match BezPath::from_svg(svg) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(shape = shape.name(), error = %e, "shape catalog path failed to parse");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shapes.rs"]
mod tests;
