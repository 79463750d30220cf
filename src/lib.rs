//! Artwork cache and retrieval for media players.
//!
//! Resolves an artwork id and a pixel size to a decoded RGBA surface. Scaled
//! renditions are persisted next to the canonical original on disk, and
//! decoded surfaces are kept in one bounded LRU cache per size.
//!
//! ```no_run
//! use artwork_cache::{ArtworkConfig, ArtworkManager};
//!
//! let config = ArtworkConfig::new("/home/me/.cache/player/album-art")
//!     .with_legacy_root("/home/me/.player/covers");
//! let mut artwork = ArtworkManager::new(config)?;
//!
//! // Borrowed from the cache, freed on eviction.
//! if let Some(thumb) = artwork.lookup_scaled_cached("artist-album", 48) {
//!     println!("{}x{}", thumb.width(), thumb.height());
//! }
//!
//! // Owned by the caller.
//! if let Some(mut cover) = artwork.lookup_original("artist-album") {
//!     artwork.release_image(&mut cover);
//! }
//! # Ok::<(), artwork_cache::ArtworkError>(())
//! ```

pub mod cache_path;
pub mod codec;
pub mod config;
pub mod error;
pub mod lru_cache;
pub mod manager;
pub mod migration;
pub mod release_policy;
pub mod store;
pub mod surface;
pub mod surface_cache;

pub use cache_path::CachePathResolver;
pub use codec::{ArtworkCodec, JpegArtworkCodec};
pub use config::{ArtworkConfig, MigrationPolicy};
pub use error::{ArtworkError, Result};
pub use lru_cache::{LruCache, NoRelease, Release};
pub use manager::ArtworkManager;
pub use migration::MigrationReport;
pub use release_policy::ReleasePolicy;
pub use store::ArtworkStore;
pub use surface::{OwnedSurface, Surface};
pub use surface_cache::SurfaceCache;
