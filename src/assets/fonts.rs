use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Registry of font families available to text layers, keyed case-insensitively by family name.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    fonts: HashMap<String, FontEntry>,
}

/// A registered font family.
#[derive(Clone, Debug)]
pub struct FontEntry {
    /// Family name as registered.
    pub family: String,
    /// Raw font file bytes (TTF/OTF).
    pub bytes: Arc<Vec<u8>>,
}

impl FontBook {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register font bytes under `family`, replacing any previous entry.
    pub fn register(&mut self, family: impl Into<String>, bytes: Vec<u8>) {
        let family = family.into();
        self.fonts.insert(
            family_key(&family),
            FontEntry {
                family,
                bytes: Arc::new(bytes),
            },
        );
    }

    /// Read a font file from disk and register it under `family`.
    pub fn register_file(
        &mut self,
        family: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> UnderlayResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            UnderlayError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.register(family, bytes);
        Ok(())
    }

    /// Look up a family, falling back to `fallback` when given.
    pub fn resolve(&self, family: &str, fallback: Option<&str>) -> Option<&FontEntry> {
        self.fonts
            .get(&family_key(family))
            .or_else(|| fallback.and_then(|f| self.fonts.get(&family_key(f))))
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.fonts.values().map(|e| e.family.as_str()).collect();
        out.sort_unstable();
        out
    }
}

fn family_key(family: &str) -> String {
    family.trim().trim_matches(['"', '\'']).to_ascii_lowercase()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Shaped text ready for glyph rasterization.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
}

impl ShapedText {
    /// Laid-out box size in pixels.
    pub(crate) fn size(&self) -> (f64, f64) {
        (f64::from(self.layout.width()), f64::from(self.layout.height()))
    }
}

struct RegisteredFamily {
    parley_name: String,
    font: vello_cpu::peniko::FontData,
}

/// Stateful helper for building Parley text layouts from registered font bytes.
///
/// Font bytes are registered with Parley once per family; later layouts reuse the collection.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashMap<String, RegisteredFamily>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    fn ensure_registered(&mut self, entry: &FontEntry) -> UnderlayResult<&RegisteredFamily> {
        let key = family_key(&entry.family);
        if !self.registered.contains_key(&key) {
            let families = self.font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(entry.bytes.as_ref().clone()),
                None,
            );
            let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                UnderlayError::render(format!(
                    "font bytes for '{}' contain no usable families",
                    entry.family
                ))
            })?;
            let parley_name = self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| UnderlayError::render("registered font family has no name"))?
                .to_string();
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(entry.bytes.as_ref().clone()),
                0,
            );
            self.registered
                .insert(key.clone(), RegisteredFamily { parley_name, font });
        }
        self.registered
            .get(&key)
            .ok_or_else(|| UnderlayError::render("font registration vanished"))
    }

    /// Shape a single line of text with the given family, weight and pixel size.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        entry: &FontEntry,
        weight: u16,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> UnderlayResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(UnderlayError::validation(
                "text size must be finite and > 0",
            ));
        }

        let (family_name, font) = {
            let reg = self.ensure_registered(entry)?;
            (reg.parley_name.clone(), reg.font.clone())
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Single(parley::style::FontFamily::Named(
                std::borrow::Cow::Owned(family_name),
            )),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(weight)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(ShapedText { layout, font })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
