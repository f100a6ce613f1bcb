//! Colors, images, fonts and the upload boundary.

/// Straight-alpha RGBA8 colors.
pub mod color;
/// Font registry and text shaping.
pub mod fonts;
/// Lazily decoded image handles.
pub mod image_ref;
/// Upload validation and downscaling.
pub mod upload;
