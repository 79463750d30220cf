//! Disk tier of the artwork cache.
//!
//! Resolves an `(id, size)` pair to a decoded image, scaling and persisting
//! renditions that are not on disk yet. Artwork is an optional enhancement,
//! so every failure here degrades to `None` instead of an error.

use crate::cache_path::CachePathResolver;
use crate::codec::ArtworkCodec;
use crate::config::{MIN_CONVERTIBLE_DIMENSION, MIN_SCALED_SIZE};
use crate::error::{ArtworkError, Result};
use image::DynamicImage;
use log::{debug, info, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Disk-backed store of originals and scaled renditions.
pub struct ArtworkStore {
    paths: CachePathResolver,
    codec: Box<dyn ArtworkCodec>,
}

impl ArtworkStore {
    pub fn new(paths: CachePathResolver, codec: Box<dyn ArtworkCodec>) -> Self {
        Self { paths, codec }
    }

    pub fn paths(&self) -> &CachePathResolver {
        &self.paths
    }

    /// Returns the image for `id` at `size` (0 = original), or `None`.
    ///
    /// A rendition already on disk is decoded as is. Otherwise the original
    /// is located (converting a pending sidecar first), scaled, and the
    /// result is written back so the next call is a plain disk read.
    pub fn resolve(&self, id: &str, size: u32) -> Option<DynamicImage> {
        if size != 0 && size < MIN_SCALED_SIZE {
            return None;
        }

        let path = self.paths.path_for(id, size);
        if path.is_file() {
            return self.decode_quietly(&path);
        }

        let original_path = self.paths.path_for(id, 0);
        if !original_path.is_file() && !self.convert_unconverted(id) {
            return None;
        }

        if size == 0 {
            return self.decode_quietly(&original_path);
        }

        let original = self.decode_quietly(&original_path)?;
        let scaled = self.codec.scale(&original, size);
        if let Err(e) = self.persist(&scaled, &path) {
            warn!(
                "Failed to cache {}x{} rendition at {}: {}",
                size,
                size,
                path.display(),
                e
            );
        }
        Some(scaled)
    }

    /// Whether the canonical original of `id` is on disk.
    pub fn has_original(&self, id: &str) -> bool {
        self.paths.path_for(id, 0).is_file()
    }

    /// Deletes every scaled rendition of `id`, keeping the original.
    ///
    /// Returns the number of files removed.
    pub fn remove_renditions(&self, id: &str) -> usize {
        let entries = match fs::read_dir(self.paths.root()) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.filter_map(|entry| entry.ok()) {
            let Some(size) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
                .filter(|size| *size > 0)
            else {
                continue;
            };

            let path = self.paths.path_for(id, size);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Converts a pending sidecar download of `id` into the canonical original.
    ///
    /// Best effort: undersized sidecars are deleted, other failures are
    /// logged. Returns whether an original now exists.
    fn convert_unconverted(&self, id: &str) -> bool {
        let sidecar = self.paths.unconverted_path_for(id);
        if !sidecar.is_file() {
            return false;
        }

        let image = match self.codec.decode(&sidecar) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to decode unconverted artwork {}: {}", sidecar.display(), e);
                return false;
            }
        };

        if image.width() < MIN_CONVERTIBLE_DIMENSION || image.height() < MIN_CONVERTIBLE_DIMENSION {
            info!(
                "Discarding {}x{} artwork for {}: below {}x{}",
                image.width(),
                image.height(),
                id,
                MIN_CONVERTIBLE_DIMENSION,
                MIN_CONVERTIBLE_DIMENSION
            );
            remove_quietly(&sidecar);
            return false;
        }

        let original_path = self.paths.path_for(id, 0);
        match self.persist(&image, &original_path) {
            Ok(()) => {
                debug!("Converted {} to {}", sidecar.display(), original_path.display());
                remove_quietly(&sidecar);
                true
            }
            Err(e) => {
                warn!("Failed to convert unconverted artwork for {}: {}", id, e);
                false
            }
        }
    }

    /// Encodes `image` and writes it to `path` atomically.
    fn persist(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let bytes = self.codec.encode(image)?;
        let parent = path.parent().ok_or_else(|| {
            ArtworkError::Io(format!("{} has no parent directory", path.display()))
        })?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| ArtworkError::from(e.error))?;
        Ok(())
    }

    fn decode_quietly(&self, path: &Path) -> Option<DynamicImage> {
        match self.codec.decode(path) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("Ignoring unreadable artwork {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
