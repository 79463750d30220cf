//! Image decoding, encoding and scaling used by the artwork store.
//!
//! Image formats are opaque to the cache; everything goes through
//! [`ArtworkCodec`] so hosts and tests can swap the implementation.

use crate::config::JPEG_QUALITY;
use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Decodes, encodes and scales artwork.
pub trait ArtworkCodec: Send + Sync {
    /// Decodes the image stored at `path`, whatever its format.
    fn decode(&self, path: &Path) -> Result<DynamicImage>;

    /// Encodes `image` in the on-disk artwork format.
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>>;

    /// Scales `image` to a `size`×`size` square.
    fn scale(&self, image: &DynamicImage, size: u32) -> DynamicImage;
}

/// Default codec backed by the `image` crate, storing JPEG files.
#[derive(Debug, Clone, Copy)]
pub struct JpegArtworkCodec {
    quality: u8,
}

impl JpegArtworkCodec {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl Default for JpegArtworkCodec {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl ArtworkCodec for JpegArtworkCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        // Sidecar downloads carry no meaningful extension, so sniff the format.
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Ok(image)
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        // JPEG has no alpha channel.
        let rgb = image.to_rgb8();
        let mut cursor = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut cursor, self.quality).encode_image(&rgb)?;
        Ok(cursor.into_inner())
    }

    fn scale(&self, image: &DynamicImage, size: u32) -> DynamicImage {
        image.resize_exact(size, size, FilterType::Triangle)
    }
}
