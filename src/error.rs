use thiserror::Error;

use crate::imaging::ImagingError;
use crate::layer::LayerId;

/// Errors raised by a drawing surface adapter
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Failed to create drawing surface: {0}")]
    Create(String),

    #[error("Failed to decode scene: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to process embedded image: {0}")]
    Image(#[from] ImagingError),

    #[error("Drawing surface has been disposed")]
    Disposed,
}

/// Errors surfaced by the canvas store to the UI
#[derive(Debug, Error)]
pub enum EditorError {
    /// The registry must always keep at least one layer
    #[error("Cannot delete the last layer!")]
    LastLayer,

    #[error("Layer {0} does not exist")]
    LayerNotFound(LayerId),

    #[error("Please select a layer to add the image to")]
    NoActiveSurface,

    /// The layer's surface is mounted but its content has not been applied yet
    #[error("{0} is still loading")]
    LayerLoading(LayerId),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

pub type EditorResult<T> = Result<T, EditorError>;
