//! Error types for mesh rendering and animation.

use thiserror::Error;

/// Errors that can occur while building, rendering or encoding a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("unsupported movie format '{0}' (expected one of: gif, mp4)")]
    UnsupportedFormat(String),

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("{name} has shape {actual:?}, expected at least {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("frame encoder failed: {0}")]
    Encoder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeshError>;
