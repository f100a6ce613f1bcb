//! CPU rendering: surfaces, pixel kernels, the scene compositor and the paint scheduler.

/// Gaussian blur used for glow.
pub mod blur;
/// Premultiplied source-over compositing.
pub mod composite;
/// Scene compositor.
pub mod compositor;
/// Background enhancement filter and checkerboard.
pub mod filter;
/// Coalesced preview paint scheduling.
pub mod scheduler;
/// Drawing targets.
pub mod surface;
