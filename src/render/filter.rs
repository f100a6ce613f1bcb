use crate::assets::color::Rgba8;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::scene::enhance::ImageEnhancements;

/// Copy `src` into `dst` through the background enhancement filter.
///
/// Channels go through brightness, contrast and saturation in that order, clamped to
/// `[0, 1]` after every stage, on straight-alpha values. `fade` then scales the alpha. Both
/// buffers are premultiplied RGBA8.
pub fn apply_enhancements(src: &[u8], dst: &mut [u8], e: &ImageEnhancements) -> UnderlayResult<()> {
    if src.len() != dst.len() || !src.len().is_multiple_of(4) {
        return Err(UnderlayError::render(
            "apply_enhancements expects equal-length rgba8 buffers",
        ));
    }
    let opacity = e.background_opacity();
    if e.is_color_neutral() && opacity >= 1.0 {
        dst.copy_from_slice(src);
        return Ok(());
    }

    let brightness = (e.brightness != 100.0).then_some((e.brightness / 100.0) as f32);
    let contrast = (e.contrast != 100.0).then_some((e.contrast / 100.0) as f32);
    let saturate = (e.saturation != 100.0).then(|| saturate_matrix((e.saturation / 100.0) as f32));

    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = f32::from(s[3]) / 255.0;
        if pa <= 0.0 {
            d.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let mut rgb = [
            f32::from(s[0]) / 255.0 / pa,
            f32::from(s[1]) / 255.0 / pa,
            f32::from(s[2]) / 255.0 / pa,
        ];
        if let Some(k) = brightness {
            for c in &mut rgb {
                *c = (*c * k).clamp(0.0, 1.0);
            }
        }
        if let Some(k) = contrast {
            for c in &mut rgb {
                *c = ((*c - 0.5) * k + 0.5).clamp(0.0, 1.0);
            }
        }
        if let Some(m) = &saturate {
            let [r, g, b] = rgb;
            for (i, row) in m.iter().enumerate() {
                rgb[i] = (row[0] * r + row[1] * g + row[2] * b).clamp(0.0, 1.0);
            }
        }
        let a = (pa * opacity).clamp(0.0, 1.0);
        d[0] = (rgb[0].min(1.0) * a * 255.0).round() as u8;
        d[1] = (rgb[1].min(1.0) * a * 255.0).round() as u8;
        d[2] = (rgb[2].min(1.0) * a * 255.0).round() as u8;
        d[3] = (a * 255.0).round() as u8;
    }
    Ok(())
}

/// Luminance-preserving saturation matrix (the CSS `saturate()` definition).
fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

/// Fill `dst` with an opaque two-color checkerboard of `cell`-pixel squares.
pub fn fill_checkerboard(dst: &mut [u8], width: u32, cell: u32, light: Rgba8, dark: Rgba8) {
    let cell = cell.max(1);
    let light = light.to_premul();
    let dark = dark.to_premul();
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        let even = ((x / cell) + (y / cell)).is_multiple_of(2);
        px.copy_from_slice(if even { &light } else { &dark });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
