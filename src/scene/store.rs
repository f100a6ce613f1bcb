use std::sync::Arc;
use std::sync::mpsc;

use crate::assets::color::Rgba8;
use crate::assets::image_ref::ImageRef;
use crate::foundation::core::LayerId;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::scene::drawing::{DrawingSettings, DrawingStroke};
use crate::scene::enhance::{EnhancementField, ImageEnhancements};
use crate::scene::layer::{LayerPatch, OverlayLayer, ShapeLayer, TextLayer};
use crate::scene::shapes::ShapeType;
use crate::scene::snapshot::SceneSnapshot;

/// The three image references of a scene.
///
/// `foreground`, when present, was produced from exactly the `original` currently set.
#[derive(Clone, Debug)]
pub struct ImageTriple {
    /// Uploaded source.
    pub original: ImageRef,
    /// Bottom layer; starts out as `original`.
    pub background: ImageRef,
    /// Segmented cutout drawn above the overlays.
    pub foreground: Option<ImageRef>,
}

/// Which part of the scene a mutation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreChange {
    /// Image triple.
    Images,
    /// Overlay layer sequence or a layer's fields.
    Layers,
    /// Drawing stroke stack.
    Strokes,
    /// Global enhancements or the transparent-background flag.
    Enhancements,
    /// Processing/converting flags, last error or drawing settings.
    Flags,
    /// Everything (reset).
    All,
}

impl StoreChange {
    /// Return `true` when the change alters rendered pixels.
    pub fn affects_pixels(self) -> bool {
        !matches!(self, StoreChange::Flags)
    }
}

/// Notification broadcast to subscribers after every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreEvent {
    /// Store revision after the mutation.
    pub revision: u64,
    /// What changed.
    pub change: StoreChange,
}

/// Tag of one in-flight segmentation request.
///
/// A ticket is only honoured while the store's original image is still the one it was
/// issued for.
#[derive(Clone, Debug)]
pub struct SegmentationTicket {
    request: u64,
    generation: u64,
    original: ImageRef,
}

impl SegmentationTicket {
    /// The image to segment.
    pub fn image(&self) -> &ImageRef {
        &self.original
    }

    /// Upload generation the ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Single source of truth for the editing session.
///
/// Every mutation bumps [`SceneStore::revision`] and notifies subscribers. Layer and stroke
/// collections are shared with snapshots and copied on the first write after a snapshot.
#[derive(Debug)]
pub struct SceneStore {
    images: Option<ImageTriple>,
    upload_generation: u64,
    segmentation_seq: u64,
    pending_segmentation: Option<u64>,
    layers: Arc<Vec<OverlayLayer>>,
    strokes: Arc<Vec<DrawingStroke>>,
    enhancements: ImageEnhancements,
    transparent_background: bool,
    drawing: DrawingSettings,
    processing: bool,
    converting: bool,
    last_error: Option<String>,
    next_layer_id: u64,
    revision: u64,
    listeners: Vec<mpsc::Sender<StoreEvent>>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// An empty store: no images, no layers, neutral enhancements.
    pub fn new() -> Self {
        Self {
            images: None,
            upload_generation: 0,
            segmentation_seq: 0,
            pending_segmentation: None,
            layers: Arc::new(Vec::new()),
            strokes: Arc::new(Vec::new()),
            enhancements: ImageEnhancements::default(),
            transparent_background: false,
            drawing: DrawingSettings::default(),
            processing: false,
            converting: false,
            last_error: None,
            next_layer_id: 1,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Dropped receivers are pruned on the next broadcast.
    pub fn subscribe(&mut self) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    fn touch(&mut self, change: StoreChange) {
        self.revision += 1;
        let ev = StoreEvent {
            revision: self.revision,
            change,
        };
        self.listeners.retain(|tx| tx.send(ev).is_ok());
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current image triple, if an image was uploaded.
    pub fn images(&self) -> Option<&ImageTriple> {
        self.images.as_ref()
    }

    /// Overlay layers in z-order.
    pub fn layers(&self) -> &[OverlayLayer] {
        &self.layers
    }

    /// Look up a layer.
    pub fn layer(&self, id: LayerId) -> Option<&OverlayLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Completed strokes, oldest first.
    pub fn strokes(&self) -> &[DrawingStroke] {
        &self.strokes
    }

    /// Global enhancement parameters.
    pub fn enhancements(&self) -> &ImageEnhancements {
        &self.enhancements
    }

    /// Whether the background is replaced by a checkerboard.
    pub fn transparent_background(&self) -> bool {
        self.transparent_background
    }

    /// Drawing-mode settings.
    pub fn drawing_settings(&self) -> &DrawingSettings {
        &self.drawing
    }

    /// Whether segmentation is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Whether an upload is being transcoded/normalized upstream.
    pub fn is_converting(&self) -> bool {
        self.converting
    }

    /// Message of the last failed async step, cleared by the next upload.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Take an immutable, structurally shared read of everything the compositor needs.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot::new(
            self.revision,
            self.images.clone(),
            Arc::clone(&self.layers),
            Arc::clone(&self.strokes),
            self.enhancements,
            self.transparent_background,
        )
    }

    /// Install a new uploaded image as original and background.
    ///
    /// Drops any foreground cutout and clears the transparent-background flag. Outstanding
    /// segmentation tickets become stale.
    pub fn set_original_image(&mut self, image: ImageRef) {
        self.upload_generation += 1;
        self.images = Some(ImageTriple {
            original: image.clone(),
            background: image,
            foreground: None,
        });
        self.transparent_background = false;
        self.last_error = None;
        self.touch(StoreChange::Images);
    }

    /// Install a foreground cutout for the current original. Ignored without an original.
    pub fn set_foreground_cutout(&mut self, cutout: ImageRef) {
        let Some(images) = self.images.as_mut() else {
            tracing::warn!("foreground cutout set without an original image; ignored");
            return;
        };
        images.foreground = Some(cutout);
        self.touch(StoreChange::Images);
    }

    /// Append a text layer with editor defaults.
    pub fn add_text_layer(&mut self) -> LayerId {
        let id = self.alloc_id();
        Arc::make_mut(&mut self.layers).push(OverlayLayer::Text(TextLayer::new(id)));
        self.touch(StoreChange::Layers);
        id
    }

    /// Append a shape layer with editor defaults.
    pub fn add_shape_layer(&mut self, shape_type: ShapeType) -> LayerId {
        let id = self.alloc_id();
        Arc::make_mut(&mut self.layers).push(OverlayLayer::Shape(ShapeLayer::new(id, shape_type)));
        self.touch(StoreChange::Layers);
        id
    }

    fn alloc_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }

    fn position_of(&self, id: LayerId) -> UnderlayResult<usize> {
        self.layers.iter().position(|l| l.id() == id).ok_or_else(|| {
            tracing::warn!(layer = %id, "mutation targets unknown layer; ignored");
            UnderlayError::LayerReference(id)
        })
    }

    /// Patch fields of a layer. Unknown ids are a logged no-op.
    ///
    /// Fields that do not apply to the layer's kind, or carry out-of-domain values, are
    /// skipped individually.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> UnderlayResult<()> {
        let idx = self.position_of(id)?;
        let layer = &mut Arc::make_mut(&mut self.layers)[idx];
        let rejected = patch.apply(layer);
        if !rejected.is_empty() {
            tracing::debug!(layer = %id, ?rejected, "layer patch fields skipped");
        }
        self.touch(StoreChange::Layers);
        Ok(())
    }

    /// Remove a layer. Its id is never handed out again.
    pub fn remove_layer(&mut self, id: LayerId) -> UnderlayResult<()> {
        let idx = self.position_of(id)?;
        Arc::make_mut(&mut self.layers).remove(idx);
        self.touch(StoreChange::Layers);
        Ok(())
    }

    /// Append a copy of a layer under a fresh id.
    pub fn duplicate_layer(&mut self, id: LayerId) -> UnderlayResult<LayerId> {
        let idx = self.position_of(id)?;
        let new_id = self.alloc_id();
        let copy = self.layers[idx].with_id(new_id);
        Arc::make_mut(&mut self.layers).push(copy);
        self.touch(StoreChange::Layers);
        Ok(new_id)
    }

    /// Move a layer to `index` in z-order (clamped to the last slot).
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> UnderlayResult<()> {
        let idx = self.position_of(id)?;
        let layers = Arc::make_mut(&mut self.layers);
        let layer = layers.remove(idx);
        let index = index.min(layers.len());
        layers.insert(index, layer);
        self.touch(StoreChange::Layers);
        Ok(())
    }

    /// Push a completed stroke.
    pub fn append_stroke(&mut self, stroke: DrawingStroke) {
        Arc::make_mut(&mut self.strokes).push(stroke);
        self.touch(StoreChange::Strokes);
    }

    /// Pop the most recent stroke. No-op on an empty stack.
    pub fn undo_stroke(&mut self) -> Option<DrawingStroke> {
        if self.strokes.is_empty() {
            return None;
        }
        let popped = Arc::make_mut(&mut self.strokes).pop();
        self.touch(StoreChange::Strokes);
        popped
    }

    /// Empty the stroke stack.
    pub fn clear_strokes(&mut self) {
        if self.strokes.is_empty() {
            return;
        }
        Arc::make_mut(&mut self.strokes).clear();
        self.touch(StoreChange::Strokes);
    }

    /// Set one enhancement parameter (clamped into its domain).
    pub fn set_enhancement(&mut self, field: EnhancementField, value: f64) {
        if self.enhancements.set(field, value) {
            self.touch(StoreChange::Enhancements);
        }
    }

    /// Toggle checkerboard background mode.
    pub fn set_transparent_background(&mut self, on: bool) {
        if self.transparent_background != on {
            self.transparent_background = on;
            self.touch(StoreChange::Enhancements);
        }
    }

    /// Mark segmentation as running or finished.
    pub fn set_processing_flag(&mut self, on: bool) {
        self.processing = on;
        self.touch(StoreChange::Flags);
    }

    /// Mark upstream conversion as running or finished.
    pub fn set_converting_flag(&mut self, on: bool) {
        self.converting = on;
        self.touch(StoreChange::Flags);
    }

    /// Record a user-visible error message.
    pub fn set_last_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.touch(StoreChange::Flags);
    }

    /// Turn drawing mode on or off.
    pub fn set_drawing_enabled(&mut self, on: bool) {
        self.drawing.enabled = on;
        self.touch(StoreChange::Flags);
    }

    /// Set the brush size (clamped to 1..=100).
    pub fn set_brush_size(&mut self, size: f64) {
        self.drawing.brush_size = DrawingSettings::clamp_brush_size(size);
        self.touch(StoreChange::Flags);
    }

    /// Set the brush color.
    pub fn set_brush_color(&mut self, color: Rgba8) {
        self.drawing.color = color;
        self.touch(StoreChange::Flags);
    }

    /// Clear images, layers, strokes, enhancements and flags.
    ///
    /// Subscribers and the id counter survive; outstanding segmentation tickets go stale.
    pub fn reset(&mut self) {
        self.upload_generation += 1;
        self.images = None;
        self.layers = Arc::new(Vec::new());
        self.strokes = Arc::new(Vec::new());
        self.enhancements = ImageEnhancements::default();
        self.transparent_background = false;
        self.drawing = DrawingSettings::default();
        self.processing = false;
        self.converting = false;
        self.pending_segmentation = None;
        self.last_error = None;
        self.touch(StoreChange::All);
    }

    /// Issue a ticket for segmenting the current original and raise the processing flag.
    ///
    /// Returns `None` when no image is loaded.
    pub fn begin_segmentation(&mut self) -> Option<SegmentationTicket> {
        let original = self.images.as_ref()?.original.clone();
        self.segmentation_seq += 1;
        self.pending_segmentation = Some(self.segmentation_seq);
        self.set_processing_flag(true);
        Some(SegmentationTicket {
            request: self.segmentation_seq,
            generation: self.upload_generation,
            original,
        })
    }

    /// Close out a ticket; lowers the processing flag unless a newer request is in flight.
    pub(crate) fn settle_segmentation(&mut self, ticket: &SegmentationTicket) {
        if self.pending_segmentation == Some(ticket.request) {
            self.pending_segmentation = None;
            self.set_processing_flag(false);
        }
    }

    /// Return `true` while the ticket still targets the current original.
    pub fn is_current(&self, ticket: &SegmentationTicket) -> bool {
        ticket.generation == self.upload_generation
            && self
                .images
                .as_ref()
                .is_some_and(|i| i.original.same_image(&ticket.original))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/store.rs"]
mod tests;
