use std::sync::Arc;

use crate::assets::image_ref::ImageRef;
use crate::scene::drawing::DrawingStroke;
use crate::scene::enhance::ImageEnhancements;
use crate::scene::layer::OverlayLayer;
use crate::scene::store::ImageTriple;

/// Immutable point-in-time read of a [`SceneStore`](crate::SceneStore).
///
/// Cloning is cheap: collections are shared with the store until it mutates them.
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    revision: u64,
    images: Option<ImageTriple>,
    layers: Arc<Vec<OverlayLayer>>,
    strokes: Arc<Vec<DrawingStroke>>,
    enhancements: ImageEnhancements,
    transparent_background: bool,
}

impl SceneSnapshot {
    pub(crate) fn new(
        revision: u64,
        images: Option<ImageTriple>,
        layers: Arc<Vec<OverlayLayer>>,
        strokes: Arc<Vec<DrawingStroke>>,
        enhancements: ImageEnhancements,
        transparent_background: bool,
    ) -> Self {
        Self {
            revision,
            images,
            layers,
            strokes,
            enhancements,
            transparent_background,
        }
    }

    /// Store revision this snapshot was taken at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Image triple, absent before the first upload.
    pub fn images(&self) -> Option<&ImageTriple> {
        self.images.as_ref()
    }

    /// Background reference.
    pub fn background(&self) -> Option<&ImageRef> {
        self.images.as_ref().map(|i| &i.background)
    }

    /// Foreground cutout reference.
    pub fn foreground(&self) -> Option<&ImageRef> {
        self.images.as_ref().and_then(|i| i.foreground.as_ref())
    }

    /// Overlay layers in z-order.
    pub fn layers(&self) -> &[OverlayLayer] {
        &self.layers
    }

    /// Completed strokes, oldest first.
    pub fn strokes(&self) -> &[DrawingStroke] {
        &self.strokes
    }

    /// Enhancement parameters.
    pub fn enhancements(&self) -> &ImageEnhancements {
        &self.enhancements
    }

    /// Checkerboard mode.
    pub fn transparent_background(&self) -> bool {
        self.transparent_background
    }

    /// Return `true` when both snapshots share their layer and stroke storage.
    pub fn shares_collections_with(&self, other: &SceneSnapshot) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers) && Arc::ptr_eq(&self.strokes, &other.strokes)
    }
}
