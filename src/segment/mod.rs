//! Segmentation boundary: turning an uploaded photo into a foreground cutout.
//!
//! The segmentation algorithm itself is external. [`Segmenter`] is the async contract it is
//! wrapped behind; [`SegmentationAdapter`] ties a segmenter to a [`SceneStore`] so that
//! results only ever land on the upload they were requested for.

use std::cell::RefCell;
use std::future::Future;

use crate::assets::image_ref::ImageRef;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::scene::store::{SceneStore, SegmentationTicket};

/// External command based segmenter.
pub mod command;

pub use command::CommandSegmenter;

/// Async foreground extraction: photo in, same-sized cutout with transparent background out.
pub trait Segmenter {
    /// Produce a cutout for `image`.
    fn segment(&self, image: &ImageRef) -> impl Future<Output = UnderlayResult<ImageRef>>;
}

/// Outcome of committing a segmentation result to the store.
#[derive(Debug)]
pub enum CommitStatus {
    /// The cutout became the scene's foreground.
    Applied,
    /// The original image changed while the request was in flight; the result was dropped.
    Stale,
    /// Segmentation failed; the foreground is unchanged and the store carries the message.
    Failed(UnderlayError),
}

impl CommitStatus {
    /// Return `true` for [`CommitStatus::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitStatus::Applied)
    }
}

/// Runs a [`Segmenter`] against the store's current original image.
#[derive(Debug)]
pub struct SegmentationAdapter<S> {
    segmenter: S,
}

impl<S: Segmenter> SegmentationAdapter<S> {
    /// Wrap a segmenter.
    pub fn new(segmenter: S) -> Self {
        Self { segmenter }
    }

    /// Borrow the wrapped segmenter.
    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Issue a ticket for the current original and raise the processing flag.
    pub fn request(&self, store: &mut SceneStore) -> Option<SegmentationTicket> {
        store.begin_segmentation()
    }

    /// Await the segmenter for `ticket`. The store is not touched.
    ///
    /// Every failure, including a result that does not decode, comes back as
    /// [`UnderlayError::Segmentation`].
    pub async fn run(&self, ticket: &SegmentationTicket) -> UnderlayResult<ImageRef> {
        let cutout = self
            .segmenter
            .segment(ticket.image())
            .await
            .map_err(as_segmentation_error)?;
        let decoded = cutout.decode().map_err(as_segmentation_error)?;
        if let Ok(src) = ticket.image().decode()
            && (src.width, src.height) != (decoded.width, decoded.height)
        {
            tracing::debug!(
                src_w = src.width,
                src_h = src.height,
                cut_w = decoded.width,
                cut_h = decoded.height,
                "cutout size differs from original; it will be stretched"
            );
        }
        Ok(cutout)
    }

    /// Request, run and commit in one go against a shared store.
    ///
    /// The store is only borrowed around the synchronous steps so other mutations can
    /// interleave while the segmenter is pending. Returns `None` when no image is loaded.
    pub async fn segment(&self, store: &RefCell<SceneStore>) -> Option<CommitStatus> {
        let ticket = self.request(&mut store.borrow_mut())?;
        let result = self.run(&ticket).await;
        Some(commit(&mut store.borrow_mut(), &ticket, result))
    }
}

/// Apply a finished segmentation to `store`.
///
/// Stale tickets leave the store untouched apart from the processing flag of that request.
#[tracing::instrument(skip_all, fields(generation = ticket.generation()))]
pub fn commit(
    store: &mut SceneStore,
    ticket: &SegmentationTicket,
    result: UnderlayResult<ImageRef>,
) -> CommitStatus {
    store.settle_segmentation(ticket);
    if !store.is_current(ticket) {
        tracing::debug!("discarding segmentation result for a replaced image");
        return CommitStatus::Stale;
    }
    match result {
        Ok(cutout) => {
            store.set_foreground_cutout(cutout);
            CommitStatus::Applied
        }
        Err(e) => {
            let e = as_segmentation_error(e);
            tracing::warn!(error = %e, "segmentation failed; background stays usable");
            store.set_last_error(e.to_string());
            CommitStatus::Failed(e)
        }
    }
}

fn as_segmentation_error(e: UnderlayError) -> UnderlayError {
    match e {
        UnderlayError::Segmentation(_) => e,
        other => UnderlayError::segmentation(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/adapter.rs"]
mod tests;
