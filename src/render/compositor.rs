use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::assets::color::Rgba8;
use crate::assets::fonts::{FontBook, TextBrushRgba8, TextLayoutEngine};
use crate::assets::image_ref::DecodedImage;
use crate::foundation::core::{Affine, BezPath, LayerId, Point};
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::render::blur::{blur_rgba8_premul, shadow_sigma};
use crate::render::composite::{over_in_place, tint_by_alpha};
use crate::render::filter::{apply_enhancements, fill_checkerboard};
use crate::render::surface::Surface;
use crate::scene::drawing::DrawingStroke;
use crate::scene::layer::{LayerFrame, OverlayLayer, ShapeLayer, TextLayer};
use crate::scene::shapes::{REFERENCE_UNIT, shape_path};
use crate::scene::snapshot::SceneSnapshot;

/// Stroke width used for outlined shapes whose width is zero.
pub const FALLBACK_SHAPE_STROKE_WIDTH: f64 = 2.0;

/// Options for [`Compositor`].
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Edge length of one checkerboard cell in pixels.
    pub checker_cell: u32,
    /// Checkerboard light cell color.
    pub checker_light: Rgba8,
    /// Checkerboard dark cell color.
    pub checker_dark: Rgba8,
    /// Family used when a text layer's family is not registered.
    pub fallback_font_family: Option<String>,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            checker_cell: 16,
            checker_light: Rgba8::WHITE,
            checker_dark: Rgba8::rgb(0xCC, 0xCC, 0xCC),
            fallback_font_family: None,
        }
    }
}

impl CompositorOpts {
    /// Set the fallback font family.
    pub fn with_fallback_font_family(mut self, family: impl Into<String>) -> Self {
        self.fallback_font_family = Some(family.into());
        self
    }

    /// Set the checkerboard cell size.
    pub fn with_checker_cell(mut self, cell: u32) -> Self {
        self.checker_cell = cell.max(1);
        self
    }
}

/// Summary of one [`Compositor::draw`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Canvas width (background native width).
    pub width: u32,
    /// Canvas height (background native height).
    pub height: u32,
    /// Overlay layers that put pixels on the canvas.
    pub layers_drawn: usize,
    /// Layers that failed and were left out, in draw order.
    pub layers_skipped: Vec<LayerId>,
    /// Whether a foreground cutout was composited.
    pub foreground_drawn: bool,
    /// Freehand strokes drawn.
    pub strokes_drawn: usize,
}

/// Turns scene snapshots into pixels.
///
/// Draw order is background, overlay layers in sequence order, foreground cutout, then
/// freehand strokes. Output depends only on the snapshot and the registered fonts.
pub struct Compositor {
    opts: CompositorOpts,
    fonts: FontBook,
    text: TextLayoutEngine,
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("opts", &self.opts)
            .field("fonts", &self.fonts.families())
            .finish_non_exhaustive()
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositorOpts::default())
    }
}

/// Render context borrowed for one layer; the context is reset when the scope ends,
/// including on early return.
struct DrawScope<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
}

impl<'a> DrawScope<'a> {
    fn begin(ctx: &'a mut vello_cpu::RenderContext) -> Self {
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        Self { ctx }
    }

    /// Rasterize everything recorded so far into `dst` (cleared first).
    fn finish_into(&mut self, dst: &mut vello_cpu::Pixmap) {
        dst.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(dst);
    }
}

impl Drop for DrawScope<'_> {
    fn drop(&mut self) {
        self.ctx.reset();
    }
}

impl Deref for DrawScope<'_> {
    type Target = vello_cpu::RenderContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for DrawScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Compositor {
    /// A compositor with no registered fonts.
    pub fn new(opts: CompositorOpts) -> Self {
        Self {
            opts,
            fonts: FontBook::new(),
            text: TextLayoutEngine::new(),
            ctx: None,
            scratch: None,
        }
    }

    /// Replace the font registry.
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    /// Font registry used by text layers.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Mutable font registry.
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Options in effect.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Draw `snapshot` into `target`, resizing it to the background's native size.
    ///
    /// Fails only when there is no decodable background. Faults while drawing a single
    /// overlay layer or the foreground are logged and that element is skipped.
    #[tracing::instrument(skip_all, fields(revision = snapshot.revision()))]
    pub fn draw(
        &mut self,
        snapshot: &SceneSnapshot,
        target: &mut Surface,
    ) -> UnderlayResult<DrawReport> {
        let bg = snapshot
            .background()
            .ok_or_else(|| UnderlayError::validation("scene has no background image"))?
            .decode()?;
        let (width, height) = (bg.width, bg.height);
        target.resize_and_clear(width, height)?;

        if snapshot.transparent_background() {
            fill_checkerboard(
                target.data_mut(),
                width,
                self.opts.checker_cell,
                self.opts.checker_light,
                self.opts.checker_dark,
            );
        } else {
            apply_enhancements(&bg.rgba8_premul, target.data_mut(), snapshot.enhancements())?;
        }

        let mut report = DrawReport {
            width,
            height,
            ..DrawReport::default()
        };

        for layer in snapshot.layers() {
            match self.draw_layer(layer, target) {
                Ok(true) => report.layers_drawn += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(layer = %layer.id(), error = %e, "layer draw failed; skipped");
                    report.layers_skipped.push(layer.id());
                }
            }
        }

        if let Some(fg) = snapshot.foreground() {
            match fg.decode().and_then(|fg| self.draw_foreground(&fg, target)) {
                Ok(()) => report.foreground_drawn = true,
                Err(e) => tracing::warn!(error = %e, "foreground draw failed; skipped"),
            }
        }

        match self.draw_strokes(snapshot.strokes(), target) {
            Ok(n) => report.strokes_drawn = n,
            Err(e) => tracing::warn!(error = %e, "stroke draw failed; skipped"),
        }
        tracing::debug!(
            width,
            height,
            drawn = report.layers_drawn,
            skipped = report.layers_skipped.len(),
            "composited scene"
        );
        Ok(report)
    }

    fn take_ctx(&mut self, width: u16, height: u16) -> vello_cpu::RenderContext {
        match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        }
    }

    fn take_scratch(&mut self, width: u16, height: u16) -> vello_cpu::Pixmap {
        match self.scratch.take() {
            Some(pm) if pm.width() == width && pm.height() == height => pm,
            _ => vello_cpu::Pixmap::new(width, height),
        }
    }

    /// Run `record` with a reset render context and a scratch pixmap matching `target`, then
    /// hand the scratch pixels to `composite` when `record` reports that it drew.
    fn render_pass<F, C>(&mut self, target: &mut Surface, record: F, composite: C) -> UnderlayResult<bool>
    where
        F: FnOnce(&mut Self, &mut DrawScope<'_>, &mut vello_cpu::Pixmap) -> UnderlayResult<bool>,
        C: FnOnce(&mut Surface, &[u8]) -> UnderlayResult<()>,
    {
        let (w, h) = surface_dims_u16(target)?;
        let mut ctx = self.take_ctx(w, h);
        let mut pm = self.take_scratch(w, h);
        let out = {
            let mut scope = DrawScope::begin(&mut ctx);
            record(&mut *self, &mut scope, &mut pm)
        };
        self.ctx = Some(ctx);
        let res = match out {
            Ok(true) => composite(target, pm.data_as_u8_slice()).map(|()| true),
            other => other,
        };
        self.scratch = Some(pm);
        res
    }

    fn draw_layer(&mut self, layer: &OverlayLayer, target: &mut Surface) -> UnderlayResult<bool> {
        let (w, h) = (target.width(), target.height());
        let frame = layer.frame();
        let base = frame_transform(frame, w, h);
        let opacity = clamp_opacity(frame.opacity);

        self.render_pass(
            target,
            |this, scope, pm| {
                let drew = match layer {
                    OverlayLayer::Shape(s) => record_shape(scope, s, base, w, h)?,
                    OverlayLayer::Text(t) => this.record_text(scope, t, base)?,
                };
                if drew {
                    scope.finish_into(pm);
                }
                Ok(drew)
            },
            |target, px| composite_layer(target, px, frame, opacity),
        )
    }

    fn record_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        t: &TextLayer,
        base: Affine,
    ) -> UnderlayResult<bool> {
        if t.text.is_empty() {
            return Ok(false);
        }
        let entry = self
            .fonts
            .resolve(&t.font_family, self.opts.fallback_font_family.as_deref())
            .ok_or_else(|| {
                UnderlayError::render(format!(
                    "no font registered for family '{}' (wanted {})",
                    t.font_family,
                    t.font_string()
                ))
            })?
            .clone();
        let brush = TextBrushRgba8 {
            r: t.color.r,
            g: t.color.g,
            b: t.color.b,
            a: t.color.a,
        };
        let shaped =
            self.text
                .layout_line(&t.text, &entry, t.font_weight, t.font_size as f32, brush)?;
        let (tw, th) = shaped.size();
        let local = base * text_anchor_offset(tw, th);
        ctx.set_transform(affine_to_cpu(local));

        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&shaped.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(true)
    }

    fn draw_foreground(&mut self, fg: &DecodedImage, target: &mut Surface) -> UnderlayResult<()> {
        if (fg.width, fg.height) == (target.width(), target.height()) {
            return over_opaque(target, &fg.rgba8_premul);
        }
        let (w, h) = (f64::from(target.width()), f64::from(target.height()));
        let paint = image_paint(fg)?;
        self.render_pass(
            target,
            |_, ctx, pm| {
                let sx = w / f64::from(fg.width);
                let sy = h / f64::from(fg.height);
                ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(fg.width),
                    f64::from(fg.height),
                ));
                ctx.finish_into(pm);
                Ok(true)
            },
            over_opaque,
        )
        .map(|_| ())
    }

    fn draw_strokes(&mut self, strokes: &[DrawingStroke], target: &mut Surface) -> UnderlayResult<usize> {
        if strokes.is_empty() {
            return Ok(0);
        }
        let mut count = 0;
        self.render_pass(
            target,
            |_, ctx, pm| {
                for s in strokes {
                    if record_stroke(ctx, s) {
                        count += 1;
                    }
                }
                if count == 0 {
                    return Ok(false);
                }
                ctx.finish_into(pm);
                Ok(true)
            },
            over_opaque,
        )?;
        Ok(count)
    }
}

/// Translate-then-rotate frame of a layer on a `width x height` canvas.
pub fn frame_transform(frame: &LayerFrame, width: u32, height: u32) -> Affine {
    let origin = frame.position.to_pixels(width, height);
    Affine::translate(origin.to_vec2()) * Affine::rotate(frame.rotation.to_radians())
}

/// Uniform factor mapping the shape catalog's reference unit onto the canvas.
pub fn shape_scale(scale_percent: f64, width: u32, height: u32) -> f64 {
    f64::from(width.min(height)) * scale_percent / 100.0 / REFERENCE_UNIT
}

/// Offset that centers a `w x h` text box on the layer origin.
pub fn text_anchor_offset(w: f64, h: f64) -> Affine {
    Affine::translate((-w / 2.0, -h / 2.0))
}

fn clamp_opacity(o: f64) -> f32 {
    if o.is_finite() { o.clamp(0.0, 1.0) as f32 } else { 0.0 }
}

fn record_shape(
    ctx: &mut vello_cpu::RenderContext,
    s: &ShapeLayer,
    base: Affine,
    width: u32,
    height: u32,
) -> UnderlayResult<bool> {
    let Some(path) = shape_path(s.shape_type) else {
        tracing::warn!(layer = %s.frame.id, shape = ?s.shape_type, "shape type has no catalog entry; nothing drawn");
        return Ok(false);
    };
    let k = shape_scale(s.scale, width, height);
    if !(k.is_finite() && k > 0.0) {
        return Err(UnderlayError::render(format!("invalid shape scale {}", s.scale)));
    }
    ctx.set_transform(affine_to_cpu(base * Affine::scale(k)));
    ctx.set_paint(s.color.to_cpu_color());
    let cpu_path = bezpath_to_cpu(&path);
    if s.is_filled {
        ctx.fill_path(&cpu_path);
    } else {
        let w = if s.stroke_width > 0.0 {
            s.stroke_width
        } else {
            FALLBACK_SHAPE_STROKE_WIDTH
        };
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(w).with_join(vello_cpu::kurbo::Join::Miter));
        ctx.stroke_path(&cpu_path);
    }
    Ok(true)
}

fn record_stroke(ctx: &mut vello_cpu::RenderContext, s: &DrawingStroke) -> bool {
    let Some(&first) = s.points.first() else {
        return false;
    };
    if !(s.brush_size.is_finite() && s.brush_size > 0.0) {
        return false;
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(s.color.to_cpu_color());
    if s.points.len() == 1 {
        let dot = kurbo::Shape::to_path(&kurbo::Circle::new(first, s.brush_size / 2.0), 0.1);
        ctx.fill_path(&bezpath_to_cpu(&dot));
        return true;
    }
    let mut path = BezPath::new();
    path.move_to(first);
    for &p in &s.points[1..] {
        path.line_to(p);
    }
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(s.brush_size)
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round),
    );
    ctx.stroke_path(&bezpath_to_cpu(&path));
    true
}

/// Composite one rendered layer: glow shadow first, then the layer, both at `opacity`.
fn composite_layer(
    target: &mut Surface,
    layer_px: &[u8],
    frame: &LayerFrame,
    opacity: f32,
) -> UnderlayResult<()> {
    if opacity <= 0.0 {
        return Ok(());
    }
    if let Some(glow) = frame.glow.as_ref().filter(|g| g.is_visible()) {
        let silhouette = tint_by_alpha(layer_px, glow.color.to_premul());
        let shadow = blur_rgba8_premul(
            &silhouette,
            target.width(),
            target.height(),
            shadow_sigma(glow.intensity),
        )?;
        over_in_place(target.data_mut(), &shadow, opacity)?;
    }
    over_in_place(target.data_mut(), layer_px, opacity)
}

fn over_opaque(target: &mut Surface, px: &[u8]) -> UnderlayResult<()> {
    over_in_place(target.data_mut(), px, 1.0)
}

fn surface_dims_u16(s: &Surface) -> UnderlayResult<(u16, u16)> {
    let w: u16 = s
        .width()
        .try_into()
        .map_err(|_| UnderlayError::render("surface width exceeds u16"))?;
    let h: u16 = s
        .height()
        .try_into()
        .map_err(|_| UnderlayError::render("surface height exceeds u16"))?;
    Ok((w, h))
}

fn image_paint(img: &DecodedImage) -> UnderlayResult<vello_cpu::Image> {
    let (w, h) = (
        u16::try_from(img.width).map_err(|_| UnderlayError::render("image width exceeds u16"))?,
        u16::try_from(img.height).map_err(|_| UnderlayError::render("image height exceeds u16"))?,
    );
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = img
        .rgba8_premul
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
