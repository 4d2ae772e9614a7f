use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias for operations that may fail with [`VectorizeError`].
pub type VectorizeResult<T> = std::result::Result<T, VectorizeError>;

/// Fatal conditions that abort the vectorization pipeline.
///
/// Non-fatal conditions are never returned as errors; they are recorded as
/// warnings in [`Diagnostics`](crate::Diagnostics). Cancellation is not an
/// error either, see [`Outcome::Cancelled`](crate::Outcome::Cancelled).
#[derive(Debug, Error)]
pub enum VectorizeError {
    /// Image loading or decoding error from the bitmap reader.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system or stream I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A buffer could not be grown.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// Bitmaps carry either one (gray) or three (RGB) planes.
    #[error("Unsupported plane count {0}; expected 1 or 3")]
    UnsupportedPlanes(u32),
    /// Raw pixel buffer does not match the declared dimensions.
    #[error("Pixel buffer holds {found} bytes but {width}x{height}x{planes} needs {expected}")]
    BufferMismatch {
        width: u32,
        height: u32,
        planes: u32,
        expected: usize,
        found: usize,
    },
    /// A fitting option is outside its accepted range.
    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
    /// A color string could not be parsed.
    #[error("Invalid color `{0}`; expected six hex digits like #ff8800")]
    InvalidColor(String),
}

impl VectorizeError {
    pub(crate) fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        VectorizeError::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}
