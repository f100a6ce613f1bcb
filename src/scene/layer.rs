use serde::{Deserialize, Serialize};

use crate::assets::color::Rgba8;
use crate::foundation::core::{LayerId, Percent2};
use crate::scene::shapes::ShapeType;

/// Text written into a freshly added text layer.
pub const DEFAULT_TEXT: &str = "Edit text";
/// Family used by freshly added text layers.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
/// Glow intensity used when glow is enabled without an explicit intensity.
pub const DEFAULT_GLOW_INTENSITY: f64 = 20.0;
/// Largest accepted glow intensity (blur radius in pixels).
pub const MAX_GLOW_INTENSITY: f64 = 50.0;

/// Soft shadow drawn around a layer, centered under it (no offset).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    /// Whether the glow is drawn at all.
    pub enabled: bool,
    /// Shadow color.
    #[serde(default = "glow_default_color")]
    pub color: Rgba8,
    /// Blur radius in pixels, `0..=MAX_GLOW_INTENSITY`.
    #[serde(default = "glow_default_intensity")]
    pub intensity: f64,
}

fn glow_default_color() -> Rgba8 {
    Rgba8::WHITE
}

fn glow_default_intensity() -> f64 {
    DEFAULT_GLOW_INTENSITY
}

impl Glow {
    /// An enabled glow with default color and intensity.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            color: glow_default_color(),
            intensity: glow_default_intensity(),
        }
    }

    /// Return `true` when this glow produces any visible shadow.
    pub fn is_visible(&self) -> bool {
        self.enabled && self.intensity.is_finite() && self.intensity > 0.0 && self.color.a > 0
    }
}

/// Transform frame shared by every overlay layer kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerFrame {
    /// Stable layer id.
    pub id: LayerId,
    /// Anchor position in percent of the canvas.
    pub position: Percent2,
    /// Rotation in degrees, `[-180, 180]`.
    pub rotation: f64,
    /// Layer opacity; clamped into `[0, 1]` at draw time.
    pub opacity: f64,
    /// Optional glow.
    pub glow: Option<Glow>,
}

impl LayerFrame {
    fn new(id: LayerId) -> Self {
        Self {
            id,
            position: Percent2::CENTER,
            rotation: 0.0,
            opacity: 1.0,
            glow: None,
        }
    }
}

/// A text overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    /// Shared transform frame.
    pub frame: LayerFrame,
    /// Text content; the empty string draws nothing.
    pub text: String,
    /// Font family name, resolved through the compositor's font book.
    pub font_family: String,
    /// CSS-style numeric weight (100..=900).
    pub font_weight: u16,
    /// Font size in pixels, `> 0`.
    pub font_size: f64,
    /// Fill color.
    pub color: Rgba8,
}

impl TextLayer {
    /// A new text layer with editor defaults.
    pub fn new(id: LayerId) -> Self {
        Self {
            frame: LayerFrame::new(id),
            text: DEFAULT_TEXT.to_owned(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_weight: 400,
            font_size: 32.0,
            color: Rgba8::WHITE,
        }
    }

    /// CSS font shorthand (`"<weight> <size>px <family>"`).
    pub fn font_string(&self) -> String {
        format!(
            "{} {}px {}",
            self.font_weight, self.font_size, self.font_family
        )
    }
}

/// A vector shape overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeLayer {
    /// Shared transform frame.
    pub frame: LayerFrame,
    /// Catalog entry.
    pub shape_type: ShapeType,
    /// Size in percent of the shorter canvas edge, `> 0`.
    pub scale: f64,
    /// Fill or stroke color.
    pub color: Rgba8,
    /// Fill the path when `true`, otherwise stroke it.
    pub is_filled: bool,
    /// Stroke width in reference units, `>= 0` (only used when not filled).
    pub stroke_width: f64,
}

impl ShapeLayer {
    /// A new shape layer with editor defaults.
    pub fn new(id: LayerId, shape_type: ShapeType) -> Self {
        Self {
            frame: LayerFrame::new(id),
            shape_type,
            scale: 25.0,
            color: Rgba8::WHITE,
            is_filled: true,
            stroke_width: 2.0,
        }
    }
}

/// Discriminant of [`OverlayLayer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// [`TextLayer`].
    Text,
    /// [`ShapeLayer`].
    Shape,
}

/// An overlay layer composited between background and foreground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayLayer {
    /// Text overlay.
    Text(TextLayer),
    /// Shape overlay.
    Shape(ShapeLayer),
}

impl OverlayLayer {
    /// Layer id.
    pub fn id(&self) -> LayerId {
        self.frame().id
    }

    /// Discriminant.
    pub fn kind(&self) -> LayerKind {
        match self {
            OverlayLayer::Text(_) => LayerKind::Text,
            OverlayLayer::Shape(_) => LayerKind::Shape,
        }
    }

    /// Shared frame.
    pub fn frame(&self) -> &LayerFrame {
        match self {
            OverlayLayer::Text(t) => &t.frame,
            OverlayLayer::Shape(s) => &s.frame,
        }
    }

    pub(crate) fn frame_mut(&mut self) -> &mut LayerFrame {
        match self {
            OverlayLayer::Text(t) => &mut t.frame,
            OverlayLayer::Shape(s) => &mut s.frame,
        }
    }

    /// Copy of this layer under a different id.
    pub(crate) fn with_id(&self, id: LayerId) -> Self {
        let mut out = self.clone();
        out.frame_mut().id = id;
        out
    }
}

/// Field-level partial update of a layer. `None` leaves a field unchanged.
///
/// Fields that do not exist on the target layer's kind, and values outside a field's domain,
/// are ignored field by field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    /// New anchor position.
    pub position: Option<Percent2>,
    /// New rotation in degrees.
    pub rotation: Option<f64>,
    /// New opacity.
    pub opacity: Option<f64>,
    /// New glow (a glow with `enabled: false` switches it off).
    pub glow: Option<Glow>,
    /// Text content (text layers).
    pub text: Option<String>,
    /// Font family (text layers).
    pub font_family: Option<String>,
    /// Font weight (text layers).
    pub font_weight: Option<u16>,
    /// Font size in pixels (text layers).
    pub font_size: Option<f64>,
    /// Fill or stroke color (both kinds).
    pub color: Option<Rgba8>,
    /// Catalog entry (shape layers).
    pub shape_type: Option<ShapeType>,
    /// Scale in percent (shape layers).
    pub scale: Option<f64>,
    /// Fill toggle (shape layers).
    pub is_filled: Option<bool>,
    /// Stroke width (shape layers).
    pub stroke_width: Option<f64>,
}

impl LayerPatch {
    /// Apply to `layer`, returning the names of fields that were rejected.
    pub fn apply(&self, layer: &mut OverlayLayer) -> Vec<&'static str> {
        let mut rejected = Vec::new();

        {
            let frame = layer.frame_mut();
            if let Some(p) = self.position {
                frame.position = Percent2::new(p.horizontal, p.vertical);
            }
            if let Some(r) = self.rotation {
                if r.is_finite() {
                    frame.rotation = r.clamp(-180.0, 180.0);
                } else {
                    rejected.push("rotation");
                }
            }
            if let Some(o) = self.opacity {
                if o.is_finite() {
                    frame.opacity = o;
                } else {
                    rejected.push("opacity");
                }
            }
            if let Some(g) = &self.glow {
                let mut g = g.clone();
                if !g.intensity.is_finite() {
                    g.intensity = DEFAULT_GLOW_INTENSITY;
                }
                g.intensity = g.intensity.clamp(0.0, MAX_GLOW_INTENSITY);
                frame.glow = Some(g);
            }
        }

        match layer {
            OverlayLayer::Text(t) => {
                if let Some(s) = &self.text {
                    t.text = s.clone();
                }
                if let Some(f) = &self.font_family {
                    t.font_family = f.clone();
                }
                if let Some(w) = self.font_weight {
                    t.font_weight = w.clamp(1, 1000);
                }
                if let Some(sz) = self.font_size {
                    if sz.is_finite() && sz > 0.0 {
                        t.font_size = sz;
                    } else {
                        rejected.push("font_size");
                    }
                }
                if let Some(c) = self.color {
                    t.color = c;
                }
                for (set, name) in [
                    (self.shape_type.is_some(), "shape_type"),
                    (self.scale.is_some(), "scale"),
                    (self.is_filled.is_some(), "is_filled"),
                    (self.stroke_width.is_some(), "stroke_width"),
                ] {
                    if set {
                        rejected.push(name);
                    }
                }
            }
            OverlayLayer::Shape(s) => {
                if let Some(st) = self.shape_type {
                    s.shape_type = st;
                }
                if let Some(sc) = self.scale {
                    if sc.is_finite() && sc > 0.0 {
                        s.scale = sc;
                    } else {
                        rejected.push("scale");
                    }
                }
                if let Some(c) = self.color {
                    s.color = c;
                }
                if let Some(f) = self.is_filled {
                    s.is_filled = f;
                }
                if let Some(w) = self.stroke_width {
                    if w.is_finite() && w >= 0.0 {
                        s.stroke_width = w;
                    } else {
                        rejected.push("stroke_width");
                    }
                }
                for (set, name) in [
                    (self.text.is_some(), "text"),
                    (self.font_family.is_some(), "font_family"),
                    (self.font_weight.is_some(), "font_weight"),
                    (self.font_size.is_some(), "font_size"),
                ] {
                    if set {
                        rejected.push(name);
                    }
                }
            }
        }

        rejected
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layer.rs"]
mod tests;
