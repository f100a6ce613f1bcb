//! Shared primitives: geometry re-exports, ids, the error type and pixel math.

/// Geometry re-exports and identifiers.
pub mod core;
/// Crate-wide error taxonomy.
pub mod error;
pub(crate) mod math;
