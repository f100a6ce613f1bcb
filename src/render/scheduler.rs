use std::sync::mpsc;

use crate::foundation::error::UnderlayResult;
use crate::render::compositor::{Compositor, DrawReport};
use crate::render::surface::PreviewSurface;
use crate::scene::store::{SceneStore, StoreEvent};

/// Handle of one requested display refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RefreshToken(pub u64);

/// The host's "call me at the next display refresh" primitive.
pub trait RefreshSource {
    /// Ask for a callback at the next refresh opportunity.
    fn request_refresh(&mut self) -> RefreshToken;
    /// Withdraw a request that has not fired yet.
    fn cancel_refresh(&mut self, token: RefreshToken);
}

/// A [`RefreshSource`] driven by hand (tests, headless hosts).
///
/// Requests queue up until [`ManualRefresh::fire`] hands them out.
#[derive(Debug, Default)]
pub struct ManualRefresh {
    next: u64,
    pending: Vec<RefreshToken>,
    cancelled: u64,
}

impl ManualRefresh {
    /// An idle refresh source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that have neither fired nor been cancelled.
    pub fn pending(&self) -> &[RefreshToken] {
        &self.pending
    }

    /// Number of cancelled requests so far.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Pop the oldest pending request, as a display refresh would.
    pub fn fire(&mut self) -> Option<RefreshToken> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl RefreshSource for ManualRefresh {
    fn request_refresh(&mut self) -> RefreshToken {
        self.next += 1;
        let t = RefreshToken(self.next);
        self.pending.push(t);
        t
    }

    fn cancel_refresh(&mut self, token: RefreshToken) {
        let before = self.pending.len();
        self.pending.retain(|&t| t != token);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

/// Counters kept by [`RenderScheduler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Store events received.
    pub events: u64,
    /// Refreshes requested from the host.
    pub requests: u64,
    /// Events absorbed by an already pending request.
    pub coalesced: u64,
    /// Paints completed.
    pub paints: u64,
    /// Refresh callbacks that did not match the pending request.
    pub stale_fires: u64,
}

/// What a refresh callback did.
#[derive(Debug, PartialEq, Eq)]
pub enum FireOutcome {
    /// The latest snapshot was drawn onto the preview surface.
    Painted(DrawReport),
    /// The token was not the pending request (cancelled or superseded).
    Stale,
    /// No preview surface is attached.
    NoSurface,
    /// The store holds no image yet.
    NoImage,
}

/// Drives preview paints from store change notifications.
///
/// At most one refresh request is outstanding at any time; any number of mutations before it
/// fires collapse into a single paint of the state current at fire time.
#[derive(Debug)]
pub struct RenderScheduler<R: RefreshSource> {
    events: mpsc::Receiver<StoreEvent>,
    refresh: R,
    pending: Option<RefreshToken>,
    compositor: Compositor,
    surface: Option<PreviewSurface>,
    stats: SchedulerStats,
}

impl<R: RefreshSource> RenderScheduler<R> {
    /// Subscribe to `store` and paint with `compositor` on `refresh` callbacks.
    pub fn new(store: &mut SceneStore, refresh: R, compositor: Compositor) -> Self {
        Self {
            events: store.subscribe(),
            refresh,
            pending: None,
            compositor,
            surface: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Attach the preview surface and schedule a first paint.
    pub fn attach_surface(&mut self, surface: PreviewSurface) {
        self.surface = Some(surface);
        self.request();
    }

    /// Detach the preview surface, cancelling any pending paint.
    pub fn destroy_surface(&mut self) -> Option<PreviewSurface> {
        if let Some(t) = self.pending.take() {
            self.refresh.cancel_refresh(t);
        }
        self.surface.take()
    }

    /// The attached preview surface.
    pub fn surface(&self) -> Option<&PreviewSurface> {
        self.surface.as_ref()
    }

    /// Mutable access to the attached preview surface (viewport changes).
    pub fn surface_mut(&mut self) -> Option<&mut PreviewSurface> {
        self.surface.as_mut()
    }

    /// The refresh source.
    pub fn refresh_source(&self) -> &R {
        &self.refresh
    }

    /// Mutable refresh source (hosts fire callbacks through it).
    pub fn refresh_source_mut(&mut self) -> &mut R {
        &mut self.refresh
    }

    /// The compositor used for preview paints.
    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    /// Counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Pending refresh request, if any.
    pub fn pending(&self) -> Option<RefreshToken> {
        self.pending
    }

    /// Drain store events and make sure a refresh is requested if pixels may have changed.
    ///
    /// Returns the number of events drained.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        let mut dirty = false;
        for ev in self.events.try_iter() {
            n += 1;
            dirty |= ev.change.affects_pixels();
        }
        self.stats.events += n as u64;
        if dirty && self.surface.is_some() {
            self.request();
        }
        n
    }

    fn request(&mut self) {
        if self.pending.is_some() {
            self.stats.coalesced += 1;
            return;
        }
        self.pending = Some(self.refresh.request_refresh());
        self.stats.requests += 1;
    }

    /// Refresh callback: paint the store's current state if `token` is the pending request.
    pub fn on_refresh(
        &mut self,
        token: RefreshToken,
        store: &SceneStore,
    ) -> UnderlayResult<FireOutcome> {
        if self.pending != Some(token) {
            self.stats.stale_fires += 1;
            tracing::debug!(token = token.0, "ignoring stale refresh");
            return Ok(FireOutcome::Stale);
        }
        self.pending = None;

        // The snapshot below already reflects everything queued so far.
        self.stats.events += self.events.try_iter().count() as u64;

        let Some(surface) = self.surface.as_mut() else {
            return Ok(FireOutcome::NoSurface);
        };
        let snapshot = store.snapshot();
        if snapshot.background().is_none() {
            return Ok(FireOutcome::NoImage);
        }
        let report = self.compositor.draw(&snapshot, surface.surface_mut())?;
        surface.mark_painted(snapshot.revision());
        self.stats.paints += 1;
        Ok(FireOutcome::Painted(report))
    }
}

impl RenderScheduler<ManualRefresh> {
    /// Pump events and fire every pending refresh, as one display frame would.
    pub fn run_frame(&mut self, store: &SceneStore) -> UnderlayResult<Vec<FireOutcome>> {
        self.pump();
        let mut out = Vec::new();
        while let Some(t) = self.refresh.fire() {
            out.push(self.on_refresh(t, store)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
