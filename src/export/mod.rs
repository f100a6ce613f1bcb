//! Flattening a scene into a single PNG at the background's native resolution.
//!
//! Export decodes every source image up front and fails with [`UnderlayError::Export`]
//! before anything is drawn or saved when one of them is unusable.

use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::render::compositor::{Compositor, DrawReport};
use crate::render::surface::Surface;
use crate::scene::snapshot::SceneSnapshot;

/// Save destinations for exported files.
pub mod save;

pub use save::{FileSaveTarget, MemorySaveTarget, SaveTarget};

/// Filename offered to the save action when none is configured.
pub const DEFAULT_EXPORT_FILENAME: &str = "underlay.png";

/// Export configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOpts {
    /// Filename handed to the [`SaveTarget`].
    pub filename: String,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            filename: DEFAULT_EXPORT_FILENAME.to_owned(),
        }
    }
}

impl ExportOpts {
    /// Return options with a different filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// A flattened, encoded scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    /// Width in pixels (the background's native width).
    pub width: u32,
    /// Height in pixels (the background's native height).
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
    /// What the compositor drew.
    pub report: DrawReport,
}

/// Renders snapshots onto export-only surfaces and hands the result to a save action.
#[derive(Clone, Debug, Default)]
pub struct ExportPipeline {
    opts: ExportOpts,
}

impl ExportPipeline {
    /// Create a pipeline.
    pub fn new(opts: ExportOpts) -> Self {
        Self { opts }
    }

    /// Export configuration.
    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Flatten `snapshot` to PNG.
    ///
    /// The surface is sized to the background image, never to any preview viewport.
    #[tracing::instrument(skip_all, fields(revision = snapshot.revision()))]
    pub fn export(
        &self,
        compositor: &mut Compositor,
        snapshot: &SceneSnapshot,
    ) -> UnderlayResult<ExportedImage> {
        let bg = snapshot
            .background()
            .ok_or_else(|| UnderlayError::export("nothing to export: no background image"))?
            .decode()
            .map_err(|e| UnderlayError::export(format!("background: {e}")))?;
        if let Some(fg) = snapshot.foreground() {
            fg.decode()
                .map_err(|e| UnderlayError::export(format!("foreground: {e}")))?;
        }

        let mut surface = Surface::default();
        let report = compositor
            .draw(snapshot, &mut surface)
            .map_err(|e| UnderlayError::export(format!("composite: {e}")))?;
        debug_assert_eq!((surface.width(), surface.height()), (bg.width, bg.height));

        let png = surface
            .encode_png()
            .map_err(|e| UnderlayError::export(format!("encode: {e}")))?;
        tracing::debug!(width = bg.width, height = bg.height, bytes = png.len(), "exported scene");
        Ok(ExportedImage {
            width: surface.width(),
            height: surface.height(),
            png,
            report,
        })
    }

    /// Export `snapshot` and save it through `target` under the configured filename.
    ///
    /// Nothing reaches `target` when export fails. The encoded blob is released once the
    /// save returns, whether or not it succeeded.
    pub fn export_and_save(
        &self,
        compositor: &mut Compositor,
        snapshot: &SceneSnapshot,
        target: &mut dyn SaveTarget,
    ) -> UnderlayResult<(u32, u32)> {
        let exported = self.export(compositor, snapshot)?;
        let dims = (exported.width, exported.height);
        let blob = ExportBlob(exported.png);
        target.save(&self.opts.filename, &blob.0)?;
        Ok(dims)
    }
}

/// Encoded bytes held only for the duration of one save.
struct ExportBlob(Vec<u8>);

impl Drop for ExportBlob {
    fn drop(&mut self) {
        tracing::debug!(bytes = self.0.len(), "released export blob");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
