//! Scene model: overlay layers, drawing strokes, enhancements and the mutable store.

/// JSON scene documents.
pub mod document;
/// Freehand strokes and brush settings.
pub mod drawing;
/// Global background enhancement parameters.
pub mod enhance;
/// Overlay layer types and field patches.
pub mod layer;
/// Vector shape catalog.
pub mod shapes;
/// Immutable scene snapshot.
pub mod snapshot;
/// Mutable scene store.
pub mod store;
