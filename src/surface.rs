//! Decoded, ready-to-paint artwork surfaces.
//!
//! Two handles expose a [`Surface`]:
//! - `&Surface`, borrowed from a surface cache. The cache frees it on eviction.
//! - [`OwnedSurface`], returned by uncached lookups. The caller owns it and
//!   hands it back through `ArtworkManager::release_image` (or drops it).

use crate::config::SURFACE_BYTES_PER_PIXEL;
use image::{DynamicImage, RgbaImage};
use std::ops::Deref;

/// RGBA8 pixel buffer that can be freed before the value itself goes away.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    pixels: Option<RgbaImage>,
}

impl Surface {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Some(pixels),
        }
    }

    /// A surface that never held pixels.
    pub fn placeholder() -> Self {
        Self { pixels: None }
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.width())
    }

    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.height())
    }

    /// Size of the held buffer in bytes; 0 once freed.
    pub fn byte_size(&self) -> usize {
        self.width() as usize * self.height() as usize * SURFACE_BYTES_PER_PIXEL
    }

    pub fn is_released(&self) -> bool {
        self.pixels.is_none()
    }

    /// Frees the pixel buffer. Returns the bytes freed, 0 if nothing was held.
    pub(crate) fn free(&mut self) -> usize {
        let bytes = self.byte_size();
        self.pixels = None;
        bytes
    }
}

impl From<DynamicImage> for Surface {
    fn from(image: DynamicImage) -> Self {
        Surface::new(image.into_rgba8())
    }
}

/// Surface owned by the caller of an uncached lookup.
///
/// Deliberately has no public way to be built from a cached `&Surface`, so a
/// cache-owned buffer can never reach `release_image`.
#[derive(Debug, Default)]
pub struct OwnedSurface(Surface);

impl OwnedSurface {
    pub(crate) fn new(surface: Surface) -> Self {
        Self(surface)
    }

    pub fn placeholder() -> Self {
        Self(Surface::placeholder())
    }

    pub(crate) fn surface_mut(&mut self) -> &mut Surface {
        &mut self.0
    }
}

impl Deref for OwnedSurface {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.0
    }
}
