use std::fmt;
use std::sync::{Arc, OnceLock};

use anyhow::Context;

use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Decoded raster in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_rgba8_straight(width: u32, height: u32, mut rgba: Vec<u8>) -> UnderlayResult<Self> {
        check_len(width, height, rgba.len())?;
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Build from already premultiplied RGBA8 bytes.
    pub fn from_rgba8_premul(width: u32, height: u32, rgba: Vec<u8>) -> UnderlayResult<Self> {
        check_len(width, height, rgba.len())?;
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Straight-alpha copy of the pixels, as expected by image encoders.
    pub fn to_rgba8_straight(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> UnderlayResult<Vec<u8>> {
        encode_png_rgba8(&self.to_rgba8_straight(), self.width, self.height)
    }
}

fn check_len(width: u32, height: u32, len: usize) -> UnderlayResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| UnderlayError::validation("image size overflow"))?;
    if expected != len || width == 0 || height == 0 {
        return Err(UnderlayError::validation(format!(
            "image buffer of {len} bytes does not match {width}x{height} rgba8"
        )));
    }
    Ok(())
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> UnderlayResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    DecodedImage::from_rgba8_straight(width, height, rgba.into_raw())
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub(crate) fn encode_png_rgba8(rgba: &[u8], width: u32, height: u32) -> UnderlayResult<Vec<u8>> {
    use image::ImageEncoder;

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(rgba, width, height, image::ExtendedColorType::Rgba8)
        .context("encode png")?;
    Ok(out)
}

/// Cheap, clonable handle to an image held by the scene.
///
/// A handle wraps either already decoded pixels or encoded bytes that are decoded once, on
/// first use. Two handles name the same image only when one is a clone of the other.
#[derive(Clone)]
pub struct ImageRef {
    inner: Arc<ImageInner>,
}

struct ImageInner {
    encoded: Option<Arc<[u8]>>,
    decoded: OnceLock<Result<DecodedImage, String>>,
}

impl ImageRef {
    /// Wrap decoded pixels.
    pub fn from_decoded(image: DecodedImage) -> Self {
        let decoded = OnceLock::new();
        let _ = decoded.set(Ok(image));
        Self {
            inner: Arc::new(ImageInner {
                encoded: None,
                decoded,
            }),
        }
    }

    /// Wrap encoded bytes; decoding is deferred to the first [`ImageRef::decode`] call.
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            inner: Arc::new(ImageInner {
                encoded: Some(bytes.into()),
                decoded: OnceLock::new(),
            }),
        }
    }

    /// Decode (or return the cached decode of) this image.
    pub fn decode(&self) -> UnderlayResult<DecodedImage> {
        let res = self.inner.decoded.get_or_init(|| match &self.inner.encoded {
            Some(bytes) => decode_image(bytes).map_err(|e| e.to_string()),
            None => Err("image handle has no pixel source".to_owned()),
        });
        res.clone().map_err(UnderlayError::validation)
    }

    /// Original encoded bytes, when this handle was built from them.
    pub fn encoded_bytes(&self) -> Option<&[u8]> {
        self.inner.encoded.as_deref()
    }

    /// Encoded form suitable for handing to an external process.
    pub fn to_encoded(&self) -> UnderlayResult<Vec<u8>> {
        match self.encoded_bytes() {
            Some(b) => Ok(b.to_vec()),
            None => self.decode()?.encode_png(),
        }
    }

    /// Return `true` when both handles refer to the same underlying image.
    pub fn same_image(&self, other: &ImageRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.decoded.get() {
            Some(Ok(img)) => format!("{}x{}", img.width, img.height),
            Some(Err(_)) => "undecodable".to_owned(),
            None => "pending".to_owned(),
        };
        f.debug_struct("ImageRef")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .field("decoded", &state)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image_ref.rs"]
mod tests;
