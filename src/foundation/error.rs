use crate::foundation::core::LayerId;

/// Convenience result type used across the engine.
pub type UnderlayResult<T> = Result<T, UnderlayError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum UnderlayError {
    /// Uploaded bytes are not one of the accepted raster formats.
    #[error("upload format error: {0}")]
    UploadFormat(String),

    /// The external segmentation step failed.
    #[error("segmentation error: {0}")]
    Segmentation(String),

    /// Decoding or encoding failed while flattening for export.
    #[error("export error: {0}")]
    Export(String),

    /// A mutation targeted a layer id that is not in the store.
    #[error("layer reference error: no layer with id {0}")]
    LayerReference(LayerId),

    /// Invalid numeric input or surface geometry.
    #[error("validation error: {0}")]
    Validation(String),

    /// A draw fault while rendering a single layer.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UnderlayError {
    /// Build a [`UnderlayError::UploadFormat`] value.
    pub fn upload_format(msg: impl Into<String>) -> Self {
        Self::UploadFormat(msg.into())
    }

    /// Build a [`UnderlayError::Segmentation`] value.
    pub fn segmentation(msg: impl Into<String>) -> Self {
        Self::Segmentation(msg.into())
    }

    /// Build a [`UnderlayError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`UnderlayError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`UnderlayError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
