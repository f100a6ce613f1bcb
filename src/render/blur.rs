use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Standard deviation of the gaussian matching a canvas-style shadow blur of `blur_px`.
pub fn shadow_sigma(blur_px: f64) -> f32 {
    (blur_px.max(0.0) / 2.0) as f32
}

/// Kernel half-width covering three standard deviations.
pub fn kernel_radius(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Pixel-space rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x0: u32,
    /// Top edge (inclusive).
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

/// Bounding box of pixels with non-zero alpha, `None` for a fully transparent buffer.
pub fn coverage_bounds(src: &[u8], width: u32, height: u32) -> Option<PixelRect> {
    let mut r: Option<PixelRect> = None;
    for y in 0..height {
        let row = &src[(y as usize * width as usize) * 4..((y as usize + 1) * width as usize) * 4];
        let mut first = None;
        let mut last = 0;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] != 0 {
                first.get_or_insert(x as u32);
                last = x as u32;
            }
        }
        let Some(first) = first else { continue };
        let b = r.get_or_insert(PixelRect {
            x0: first,
            y0: y,
            x1: last + 1,
            y1: y + 1,
        });
        b.x0 = b.x0.min(first);
        b.x1 = b.x1.max(last + 1);
        b.y1 = y + 1;
    }
    r
}

/// Gaussian blur of premultiplied RGBA8. Pixels outside the buffer count as transparent.
///
/// Only the covered area grown by the kernel radius is processed; the rest stays transparent.
pub fn blur_rgba8_premul(src: &[u8], width: u32, height: u32, sigma: f32) -> UnderlayResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| UnderlayError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(UnderlayError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    let full_radius = kernel_radius(sigma);
    if full_radius == 0 {
        return Ok(src.to_vec());
    }
    // Taps further out than the canvas extent can never land on a pixel.
    let radius = full_radius.min(width.max(height));
    let Some(b) = coverage_bounds(src, width, height) else {
        return Ok(vec![0; expected_len]);
    };
    let region = PixelRect {
        x0: b.x0.saturating_sub(radius),
        y0: b.y0.saturating_sub(radius),
        x1: (b.x1 + radius).min(width),
        y1: (b.y1 + radius).min(height),
    };

    let kernel = gaussian_kernel_q16(radius, sigma, radius < full_radius)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    horizontal_pass(src, &mut tmp, width, region, &kernel);
    vertical_pass(&tmp, &mut out, width, region, &kernel);
    Ok(out)
}

/// Q16 gaussian weights for `-radius..=radius`.
///
/// A `truncated` kernel keeps the normalization of the untruncated gaussian, so clipping the
/// window does not brighten the result.
fn gaussian_kernel_q16(radius: u32, sigma: f32, truncated: bool) -> UnderlayResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(UnderlayError::validation("blur sigma must be finite and > 0"));
    }
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = if truncated {
        f64::from(sigma) * std::f64::consts::TAU.sqrt()
    } else {
        weights_f.iter().sum()
    };
    if sum <= 0.0 {
        return Err(UnderlayError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Keep a full kernel summing to exactly 1.0 in q16.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 && !truncated {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, region: PixelRect, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            let mut acc = [0u64; 4];
            let (lo, hi) = tap_range(i64::from(x), radius, w);
            for (ki, &kw) in k.iter().enumerate().take(hi).skip(lo) {
                let sx = i64::from(x) + ki as i64 - radius;
                let idx = ((i64::from(y) * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((i64::from(y) * w + i64::from(x)) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, region: PixelRect, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    let h = (src.len() / 4) as i64 / w;
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            let mut acc = [0u64; 4];
            let (lo, hi) = tap_range(i64::from(y), radius, h);
            for (ki, &kw) in k.iter().enumerate().take(hi).skip(lo) {
                let sy = i64::from(y) + ki as i64 - radius;
                let idx = ((sy * w + i64::from(x)) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((i64::from(y) * w + i64::from(x)) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

/// Kernel indices `lo..hi` whose taps around `pos` fall inside `0..len`.
fn tap_range(pos: i64, radius: i64, len: i64) -> (usize, usize) {
    let lo = (radius - pos).max(0);
    let hi = (len - pos + radius).clamp(lo, 2 * radius + 1);
    (lo as usize, hi as usize)
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
