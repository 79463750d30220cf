//! Per-size cache of decoded surfaces.
//!
//! Caches decoded RGBA8 surfaces for one pixel size using an LRU policy.
//! The capacity is derived from a memory budget so large thumbnails get
//! fewer slots than small ones.

use crate::config::SURFACE_BYTES_PER_PIXEL;
use crate::error::Result;
use crate::lru_cache::{LruCache, Release};
use crate::surface::Surface;
use log::debug;

/// Release hook that frees the pixel buffer of evicted surfaces.
#[derive(Debug, Default)]
pub struct FreeSurface {
    released: u64,
    released_bytes: u64,
}

impl FreeSurface {
    pub fn released(&self) -> u64 {
        self.released
    }

    pub fn released_bytes(&self) -> u64 {
        self.released_bytes
    }
}

impl Release<Surface> for FreeSurface {
    fn release(&mut self, mut surface: Surface) {
        let bytes = surface.free();
        self.released += 1;
        self.released_bytes += bytes as u64;
    }
}

/// Number of `size`×`size` surfaces that fit in `budget_bytes`, at least 1.
///
/// Size 0 (unscaled originals) has no known footprint and gets a single slot.
pub fn capacity_for_size(size: u32, budget_bytes: usize) -> usize {
    if size == 0 {
        return 1;
    }
    let side = size as usize;
    let bytes_per_image = SURFACE_BYTES_PER_PIXEL
        .saturating_mul(side)
        .saturating_mul(side);
    (budget_bytes / bytes_per_image).max(1)
}

/// LRU cache of surfaces keyed by artwork id, for one pixel size.
pub struct SurfaceCache {
    size: u32,
    surfaces: LruCache<String, Surface, FreeSurface>,
}

impl SurfaceCache {
    /// Creates a cache for `size` whose capacity fits `budget_bytes`.
    pub fn new(size: u32, budget_bytes: usize) -> Result<Self> {
        Self::with_capacity(size, capacity_for_size(size, budget_bytes))
    }

    pub fn with_capacity(size: u32, capacity: usize) -> Result<Self> {
        debug!("Surface cache for size {} holds {} entries", size, capacity);
        Ok(Self {
            size,
            surfaces: LruCache::with_release(capacity, FreeSurface::default())?,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Retrieves a surface and marks it most recently used.
    pub fn get(&mut self, id: &str) -> Option<&Surface> {
        self.surfaces.try_get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.surfaces.contains(id)
    }

    /// Stores a surface, freeing whichever surface it displaces.
    pub fn put(&mut self, id: String, surface: Surface) {
        debug!(
            "Surface cache PUT: {} at size {} ({}x{})",
            id,
            self.size,
            surface.width(),
            surface.height()
        );
        self.surfaces.add(id, surface);
    }

    /// Stores a surface and returns the cached reference.
    pub fn insert(&mut self, id: &str, surface: Surface) -> Option<&Surface> {
        self.put(id.to_owned(), surface);
        self.surfaces.peek(id)
    }

    /// Frees the surface cached for `id`, if any.
    pub fn evict(&mut self, id: &str) -> bool {
        self.surfaces.remove(id)
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.surfaces.resize(capacity)
    }

    /// Frees every cached surface.
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.surfaces.capacity()
    }

    /// Surfaces freed by this cache so far.
    pub fn released(&self) -> u64 {
        self.surfaces.release_hook().released()
    }

    pub fn released_bytes(&self) -> u64 {
        self.surfaces.release_hook().released_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn surface(side: u32) -> Surface {
        Surface::new(RgbaImage::new(side, side))
    }

    #[test]
    fn capacity_follows_the_memory_budget() {
        let mib = 1024 * 1024;
        assert_eq!(capacity_for_size(48, mib), 113);
        assert_eq!(capacity_for_size(128, mib), 16);
        assert_eq!(capacity_for_size(512, mib), 1);
        assert_eq!(capacity_for_size(2048, mib), 1);
        assert_eq!(capacity_for_size(0, mib), 1);
    }

    #[test]
    fn capacity_one_evicts_previous_surface() {
        let mut cache = SurfaceCache::with_capacity(48, 1).unwrap();
        cache.put("x".to_string(), surface(48));
        assert_eq!(cache.released(), 0);

        cache.put("y".to_string(), surface(48));

        assert!(!cache.contains("x"));
        assert!(cache.contains("y"));
        assert_eq!(cache.released(), 1);
        assert_eq!(cache.released_bytes(), 48 * 48 * 4);
    }

    #[test]
    fn recently_read_surface_survives_eviction() {
        let mut cache = SurfaceCache::with_capacity(32, 3).unwrap();
        for id in ["a", "b", "c"] {
            cache.put(id.to_string(), surface(32));
        }

        assert!(cache.get("a").is_some());
        cache.put("d".to_string(), surface(32));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.released(), 1);
    }

    #[test]
    fn clear_frees_every_surface() {
        let mut cache = SurfaceCache::with_capacity(16, 4).unwrap();
        for id in ["a", "b", "c"] {
            cache.put(id.to_string(), surface(16));
        }

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.released(), 3);
    }

    #[test]
    fn insert_returns_the_cached_surface() {
        let mut cache = SurfaceCache::new(20, 1024 * 1024).unwrap();
        let cached = cache.insert("a", surface(20)).unwrap();
        assert_eq!(cached.width(), 20);
        assert!(!cached.is_released());
    }
}
