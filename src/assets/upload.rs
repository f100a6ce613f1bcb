use anyhow::Context;

use crate::assets::image_ref::{DecodedImage, ImageRef};
use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Longest edge, in pixels, above which uploads are downscaled.
pub const DEFAULT_MAX_UPLOAD_DIMENSION: u32 = 1920;

/// Options for the upload boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadOpts {
    /// Longest permitted edge. `None` keeps the source resolution.
    pub max_dimension: Option<u32>,
}

impl Default for UploadOpts {
    fn default() -> Self {
        let max_dimension = match std::env::var("UNDERLAY_MAX_UPLOAD_DIM")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_MAX_UPLOAD_DIMENSION),
        };
        Self { max_dimension }
    }
}

impl UploadOpts {
    /// Return options with a different downscale threshold.
    pub fn with_max_dimension(mut self, max_dimension: Option<u32>) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

/// Raster formats accepted at the upload boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFormat {
    /// JPEG (also what HEIC/HEIF arrives as after upstream transcoding).
    Jpeg,
    /// PNG.
    Png,
    /// WEBP.
    WebP,
}

/// Identify the format of uploaded bytes, rejecting anything outside the whitelist.
pub fn sniff_format(bytes: &[u8]) -> UnderlayResult<UploadFormat> {
    if is_heif(bytes) {
        return Err(UnderlayError::upload_format(
            "HEIC/HEIF images must be converted to JPEG before upload",
        ));
    }
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => Ok(UploadFormat::Jpeg),
        Ok(image::ImageFormat::Png) => Ok(UploadFormat::Png),
        Ok(image::ImageFormat::WebP) => Ok(UploadFormat::WebP),
        Ok(other) => Err(UnderlayError::upload_format(format!(
            "unsupported image format {other:?}; expected JPG, PNG or WEBP"
        ))),
        Err(_) => Err(UnderlayError::upload_format(
            "unrecognized file type; expected JPG, PNG or WEBP",
        )),
    }
}

fn is_heif(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &bytes[8..12],
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1" | b"msf1"
    )
}

/// Target size after applying the downscale threshold, preserving aspect ratio.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        ((f64::from(short) * f64::from(max_dimension)) / f64::from(long))
            .round()
            .max(1.0) as u32
    };
    if width > height && width > max_dimension {
        (max_dimension, scale(height, width))
    } else if height > max_dimension {
        (scale(width, height), max_dimension)
    } else {
        (width, height)
    }
}

/// Validate, decode and normalize uploaded image bytes.
///
/// Fails with [`UnderlayError::UploadFormat`] for anything outside the whitelist; the caller
/// must not mutate the scene in that case.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn accept_upload(bytes: &[u8], opts: &UploadOpts) -> UnderlayResult<ImageRef> {
    let format = sniff_format(bytes)?;
    let dyn_img = image::load_from_memory(bytes)
        .with_context(|| format!("decode {format:?} upload"))
        .map_err(|e| UnderlayError::upload_format(format!("{e:#}")))?;
    let mut rgba = dyn_img.to_rgba8();
    let (w, h) = rgba.dimensions();

    if let Some(max) = opts.max_dimension {
        let (nw, nh) = fit_dimensions(w, h, max);
        if (nw, nh) != (w, h) {
            tracing::debug!(from = ?(w, h), to = ?(nw, nh), "downscaling upload");
            rgba = image::imageops::resize(&rgba, nw, nh, image::imageops::FilterType::Triangle);
        }
    }

    let (width, height) = rgba.dimensions();
    let decoded = DecodedImage::from_rgba8_straight(width, height, rgba.into_raw())?;
    Ok(ImageRef::from_decoded(decoded))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/upload.rs"]
mod tests;
