use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::foundation::core::LayerId;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::scene::drawing::DrawingStroke;
use crate::scene::enhance::{EnhancementField, ImageEnhancements};
use crate::scene::layer::{LayerKind, LayerPatch};
use crate::scene::shapes::ShapeType;
use crate::scene::store::SceneStore;

/// One layer of a [`SceneDocument`]: the kind to add plus fields to patch onto its defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Layer kind.
    pub kind: LayerKind,
    /// Fields overriding the new layer's defaults.
    #[serde(flatten)]
    pub patch: LayerPatch,
}

/// Headless description of the editable part of a scene.
///
/// ```json
/// {
///   "layers": [
///     { "kind": "text", "text": "SUMMER", "font_size": 96, "position": { "horizontal": 50, "vertical": 30 } },
///     { "kind": "shape", "shape_type": "star", "scale": 40, "is_filled": false }
///   ],
///   "enhancements": { "fade": 20 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDocument {
    /// Overlay layers, bottom first.
    pub layers: Vec<LayerSpec>,
    /// Freehand strokes in canvas pixels, oldest first.
    pub strokes: Vec<DrawingStroke>,
    /// Global enhancement parameters.
    pub enhancements: ImageEnhancements,
    /// Checkerboard background mode.
    pub transparent_background: bool,
}

impl SceneDocument {
    /// Parse a document from JSON text.
    pub fn from_json(s: &str) -> UnderlayResult<Self> {
        let doc = serde_json::from_str(s).context("parse scene document JSON")?;
        Ok(doc)
    }

    /// Read and parse a document file.
    pub fn load(path: &Path) -> UnderlayResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read scene document '{}'", path.display()))?;
        Self::from_json(&s)
    }

    /// Populate `store` through its mutators, returning the ids of the added layers.
    ///
    /// Layers are appended after any existing ones. Strokes with no points or a non-positive
    /// brush are rejected before anything is applied.
    pub fn apply_to(&self, store: &mut SceneStore) -> UnderlayResult<Vec<LayerId>> {
        for (i, s) in self.strokes.iter().enumerate() {
            if s.points.is_empty() || !(s.brush_size.is_finite() && s.brush_size > 0.0) {
                return Err(UnderlayError::validation(format!(
                    "stroke {i} needs at least one point and a positive brush size"
                )));
            }
        }

        let mut ids = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            let id = match spec.kind {
                LayerKind::Text => store.add_text_layer(),
                LayerKind::Shape => {
                    store.add_shape_layer(spec.patch.shape_type.unwrap_or(ShapeType::Square))
                }
            };
            store.update_layer(id, &spec.patch)?;
            ids.push(id);
        }
        for s in &self.strokes {
            store.append_stroke(s.clone());
        }
        for field in [
            EnhancementField::Brightness,
            EnhancementField::Contrast,
            EnhancementField::Saturation,
            EnhancementField::Fade,
        ] {
            store.set_enhancement(field, self.enhancements.get(field));
        }
        store.set_transparent_background(self.transparent_background);
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
