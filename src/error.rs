//! Unified error types for the artwork cache.

use std::fmt;
use std::path::PathBuf;

/// Artwork cache errors.
///
/// Lookups never surface these; they degrade to "no artwork". Only
/// construction, migration and cache sizing report them to the caller.
#[derive(Debug)]
pub enum ArtworkError {
    /// Error reading or decoding an image file
    ImageLoad(String),
    /// Error encoding an image for the disk cache
    ImageEncode(String),
    /// Filesystem error outside of image decoding
    Io(String),
    /// A legacy file could not be copied into the new artwork root
    Migration { path: PathBuf, message: String },
    /// A cache was asked to hold zero entries
    InvalidCapacity,
}

impl fmt::Display for ArtworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkError::ImageLoad(msg) => write!(f, "Failed to load artwork: {}", msg),
            ArtworkError::ImageEncode(msg) => write!(f, "Failed to encode artwork: {}", msg),
            ArtworkError::Io(msg) => write!(f, "Artwork I/O error: {}", msg),
            ArtworkError::Migration { path, message } => write!(
                f,
                "Failed to migrate legacy artwork {}: {}",
                path.display(),
                message
            ),
            ArtworkError::InvalidCapacity => write!(f, "Cache capacity must be non-zero"),
        }
    }
}

impl std::error::Error for ArtworkError {}

impl From<image::ImageError> for ArtworkError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => ArtworkError::ImageEncode(e.to_string()),
            image::ImageError::IoError(e) => ArtworkError::Io(e.to_string()),
            other => ArtworkError::ImageLoad(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ArtworkError {
    fn from(err: std::io::Error) -> Self {
        ArtworkError::Io(err.to_string())
    }
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, ArtworkError>;
