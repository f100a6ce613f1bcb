//! Underlay is a layered photo compositing engine.
//!
//! A scene is a background photo, a stack of text and shape overlays, a foreground cutout of
//! the photographed subject and freehand strokes on top. The crate is organised around:
//!
//! - a [`SceneStore`] that owns all mutable editor state and hands out [`SceneSnapshot`]s
//! - a [`SegmentationAdapter`] that produces the foreground cutout through a [`Segmenter`]
//! - a [`Compositor`] that rasterizes snapshots, driven for previews by a [`RenderScheduler`]
//! - an [`ExportPipeline`] that flattens a snapshot to PNG at the photo's resolution
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Colors, images, fonts and the upload boundary.
pub mod assets;
/// Flattening scenes to PNG.
pub mod export;
/// Shared primitives.
pub mod foundation;
/// CPU rendering.
pub mod render;
/// Scene model and store.
pub mod scene;
/// Foreground segmentation boundary.
pub mod segment;

pub use crate::foundation::core::{Affine, BezPath, LayerId, Percent2, Point, Rect, Vec2};
pub use crate::foundation::error::{UnderlayError, UnderlayResult};

pub use crate::assets::color::Rgba8;
pub use crate::assets::fonts::FontBook;
pub use crate::assets::image_ref::{DecodedImage, ImageRef};
pub use crate::assets::upload::{UploadOpts, accept_upload};
pub use crate::export::{ExportOpts, ExportPipeline, ExportedImage, SaveTarget};
pub use crate::render::compositor::{Compositor, CompositorOpts, DrawReport};
pub use crate::render::scheduler::{ManualRefresh, RefreshSource, RefreshToken, RenderScheduler};
pub use crate::render::surface::{PreviewSurface, Surface};
pub use crate::scene::document::SceneDocument;
pub use crate::scene::enhance::{EnhancementField, ImageEnhancements};
pub use crate::scene::layer::{LayerKind, LayerPatch, OverlayLayer};
pub use crate::scene::shapes::ShapeType;
pub use crate::scene::snapshot::SceneSnapshot;
pub use crate::scene::store::SceneStore;
pub use crate::segment::{CommandSegmenter, CommitStatus, SegmentationAdapter, Segmenter};
