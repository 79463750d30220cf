//! Artwork lookup façade.
//!
//! Threading model:
//! - Every call is synchronous and runs on the calling thread. Nothing here
//!   spawns work; hosts decode large originals on their own worker threads.
//! - The manager is `Send` but not internally synchronized. Hosts that share
//!   it wrap it in `Arc<Mutex<ArtworkManager>>`.

use crate::cache_path::CachePathResolver;
use crate::codec::{ArtworkCodec, JpegArtworkCodec};
use crate::config::{ArtworkConfig, MIN_SCALED_SIZE};
use crate::error::{ArtworkError, Result};
use crate::lru_cache::{LruCache, Release};
use crate::migration::{self, MigrationReport};
use crate::release_policy::ReleasePolicy;
use crate::store::ArtworkStore;
use crate::surface::{OwnedSurface, Surface};
use crate::surface_cache::{SurfaceCache, capacity_for_size};
use log::{debug, warn};
use std::collections::HashMap;

/// Release hook for the size map: dropping a size frees all of its surfaces.
#[derive(Debug, Default)]
struct TeardownSizeCache {
    /// Surfaces freed by caches that have been torn down.
    released: u64,
}

impl Release<SurfaceCache> for TeardownSizeCache {
    fn release(&mut self, mut cache: SurfaceCache) {
        debug!(
            "Dropping surface cache for size {} ({} surfaces)",
            cache.size(),
            cache.len()
        );
        cache.clear();
        self.released += cache.released();
    }
}

/// Resolves artwork ids to decoded surfaces through a memory and a disk tier.
pub struct ArtworkManager {
    config: ArtworkConfig,
    store: ArtworkStore,
    caches: LruCache<u32, SurfaceCache, TeardownSizeCache>,
    capacity_overrides: HashMap<u32, usize>,
    release_policy: ReleasePolicy,
}

impl ArtworkManager {
    /// Creates a manager using the JPEG codec and migrates legacy artwork.
    pub fn new(config: ArtworkConfig) -> Result<Self> {
        Self::with_codec(config, Box::new(JpegArtworkCodec::default()))
    }

    /// Creates a manager with a custom codec and migrates legacy artwork.
    ///
    /// Migration is the only failure the manager reports; the host decides
    /// whether to continue without artwork.
    pub fn with_codec(config: ArtworkConfig, codec: Box<dyn ArtworkCodec>) -> Result<Self> {
        let caches = LruCache::with_release(config.max_cached_sizes, TeardownSizeCache::default())?;
        let manager = Self {
            store: ArtworkStore::new(CachePathResolver::new(&config.root), codec),
            caches,
            capacity_overrides: HashMap::new(),
            release_policy: ReleasePolicy::new(config.release_sweep_interval),
            config,
        };
        manager.migrate_legacy_artwork()?;
        Ok(manager)
    }

    /// Replaces the policy applied to manual releases.
    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    pub fn config(&self) -> &ArtworkConfig {
        &self.config
    }

    pub fn release_policy(&self) -> &ReleasePolicy {
        &self.release_policy
    }

    /// Copies the legacy artwork directory into the root if the root is new.
    pub fn migrate_legacy_artwork(&self) -> Result<MigrationReport> {
        migration::migrate_legacy_artwork(
            self.config.legacy_root.as_deref(),
            self.store.paths(),
            self.config.migration_policy,
        )
    }

    /// Decodes the unscaled original. The caller owns the result.
    pub fn lookup_original(&self, id: &str) -> Option<OwnedSurface> {
        self.lookup_scaled(id, 0)
    }

    /// Decodes `id` at `size`, scaling and persisting it if needed.
    /// The caller owns the result.
    pub fn lookup_scaled(&self, id: &str, size: u32) -> Option<OwnedSurface> {
        if !is_valid_request(id, size) {
            return None;
        }
        let image = self.store.resolve(id, size)?;
        Some(OwnedSurface::new(Surface::from(image)))
    }

    /// Looks `id` up in the surface cache for `size`, filling it on a miss.
    ///
    /// The surface stays owned by the cache and is freed when evicted. A
    /// size only gets a cache once there is a surface to put in it, so
    /// missing artwork never displaces another size's cache.
    pub fn lookup_scaled_cached(&mut self, id: &str, size: u32) -> Option<&Surface> {
        if !is_valid_request(id, size) {
            return None;
        }

        if self.caches.peek(&size).is_some_and(|cache| cache.contains(id)) {
            return self.caches.try_get_mut(&size)?.get(id);
        }

        let image = self.store.resolve(id, size)?;
        self.ensure_cache(size)?;
        self.caches
            .try_get_mut(&size)?
            .insert(id, Surface::from(image))
    }

    /// Frees a surface returned by an uncached lookup.
    ///
    /// Releasing an already released or placeholder surface does nothing.
    pub fn release_image(&mut self, image: &mut OwnedSurface) {
        if image.is_released() {
            return;
        }
        image.surface_mut().free();
        self.release_policy.record_release();
    }

    /// Forgets `id` in every surface cache and, unless `memory_only`, deletes
    /// its scaled renditions from disk. The original is kept.
    pub fn clear_cache_for(&mut self, id: &str, memory_only: bool) {
        for cache in self.caches.values_mut() {
            cache.evict(id);
        }
        if !memory_only {
            let removed = self.store.remove_renditions(id);
            debug!("Removed {} cached renditions of {}", removed, id);
        }
    }

    /// Overrides the number of surfaces kept for `size`.
    pub fn set_cache_capacity(&mut self, size: u32, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(ArtworkError::InvalidCapacity);
        }
        self.capacity_overrides.insert(size, capacity);
        if let Some(cache) = self.caches.values_mut().find(|cache| cache.size() == size) {
            cache.set_capacity(capacity)?;
        }
        Ok(())
    }

    pub fn has_original(&self, id: &str) -> bool {
        !id.is_empty() && self.store.has_original(id)
    }

    /// Sizes that currently have a surface cache.
    pub fn cached_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.caches.keys().copied().collect();
        sizes.sort_unstable();
        sizes
    }

    /// Surfaces freed so far by eviction, removal or size teardown.
    pub fn released_surfaces(&self) -> u64 {
        let live: u64 = self.caches.values().map(SurfaceCache::released).sum();
        live + self.caches.release_hook().released
    }

    /// Number of surfaces cached for `size`.
    pub fn cached_len(&self, size: u32) -> usize {
        self.caches.peek(&size).map_or(0, SurfaceCache::len)
    }

    fn ensure_cache(&mut self, size: u32) -> Option<()> {
        if self.caches.contains(&size) {
            return Some(());
        }

        let capacity = self
            .capacity_overrides
            .get(&size)
            .copied()
            .unwrap_or_else(|| capacity_for_size(size, self.config.surface_budget_bytes));
        match SurfaceCache::with_capacity(size, capacity) {
            Ok(cache) => {
                self.caches.add(size, cache);
                Some(())
            }
            Err(e) => {
                warn!("Failed to create surface cache for size {}: {}", size, e);
                None
            }
        }
    }
}

/// Empty ids mean "no artwork"; sizes between 1 and the minimum are too small.
fn is_valid_request(id: &str, size: u32) -> bool {
    !id.is_empty() && (size == 0 || size >= MIN_SCALED_SIZE)
}
