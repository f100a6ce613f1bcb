use crate::assets::image_ref::encode_png_rgba8;
use crate::foundation::core::Point;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Largest edge a surface may have (the CPU rasterizer addresses pixels with `u16`).
pub const MAX_SURFACE_DIMENSION: u32 = u16::MAX as u32;

/// A CPU drawing target: premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> UnderlayResult<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        })
    }

    /// Resize to `width x height` and clear to transparent.
    ///
    /// The backing allocation is reused when it is large enough.
    pub fn resize_and_clear(&mut self, width: u32, height: u32) -> UnderlayResult<()> {
        check_dims(width, height)?;
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(byte_len(width, height), 0);
        Ok(())
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_rgba8_straight(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Encode as PNG (straight alpha).
    pub fn encode_png(&self) -> UnderlayResult<Vec<u8>> {
        encode_png_rgba8(&self.to_rgba8_straight(), self.width, self.height)
    }
}

fn check_dims(width: u32, height: u32) -> UnderlayResult<()> {
    if width == 0 || height == 0 {
        return Err(UnderlayError::validation(
            "surface width/height must be non-zero",
        ));
    }
    if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
        return Err(UnderlayError::validation(format!(
            "surface {width}x{height} exceeds {MAX_SURFACE_DIMENSION} px per edge"
        )));
    }
    Ok(())
}

fn byte_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * 4
}

/// The on-screen preview target.
///
/// Drawing always happens at the background's native resolution; the viewport only decides
/// the display scale used to present it.
#[derive(Debug)]
pub struct PreviewSurface {
    surface: Surface,
    viewport: (f64, f64),
    painted_revision: Option<u64>,
}

impl PreviewSurface {
    /// A preview presented inside a `width x height` viewport (display pixels).
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            surface: Surface::default(),
            viewport: (viewport_width.max(0.0), viewport_height.max(0.0)),
            painted_revision: None,
        }
    }

    /// Change the viewport. The drawn pixels are unaffected.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(0.0), height.max(0.0));
    }

    /// The native-resolution pixels.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Store revision of the last completed paint.
    pub fn painted_revision(&self) -> Option<u64> {
        self.painted_revision
    }

    pub(crate) fn mark_painted(&mut self, revision: u64) {
        self.painted_revision = Some(revision);
    }

    /// Contain-fit scale from canvas pixels to display pixels, never enlarging.
    pub fn display_scale(&self) -> f64 {
        let (w, h) = (self.surface.width(), self.surface.height());
        if w == 0 || h == 0 {
            return 1.0;
        }
        let sx = self.viewport.0 / f64::from(w);
        let sy = self.viewport.1 / f64::from(h);
        sx.min(sy).min(1.0)
    }

    /// Size of the presented image in display pixels.
    pub fn display_size(&self) -> (f64, f64) {
        let s = self.display_scale();
        (
            f64::from(self.surface.width()) * s,
            f64::from(self.surface.height()) * s,
        )
    }

    /// Map a point in display pixels (relative to the presented image) to canvas pixels.
    pub fn display_to_canvas(&self, p: Point) -> Point {
        let s = self.display_scale();
        if s <= 0.0 {
            return p;
        }
        Point::new(p.x / s, p.y / s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
