//! Artwork cache configuration constants and host-facing settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of the canonical original and of every scaled rendition.
pub const ARTWORK_EXTENSION: &str = "jpg";

/// Extension of a downloaded image that has not been converted yet.
pub const UNCONVERTED_EXTENSION: &str = "cover";

/// Smallest scaled size that is served. Sizes `1..MIN_SCALED_SIZE` are rejected.
pub const MIN_SCALED_SIZE: u32 = 10;

/// Unconverted images smaller than this on either side are discarded.
pub const MIN_CONVERTIBLE_DIMENSION: u32 = 50;

/// Decoded surfaces are RGBA8.
pub const SURFACE_BYTES_PER_PIXEL: usize = 4;

/// Memory budget of one size's surface cache.
pub const DEFAULT_SURFACE_BUDGET_BYTES: usize = 1024 * 1024;

/// Distinct sizes kept in memory before the least recently used size is dropped.
pub const DEFAULT_MAX_CACHED_SIZES: usize = 16;

/// Manual releases between two sweeps.
pub const DEFAULT_RELEASE_SWEEP_INTERVAL: u32 = 100;

/// Quality of JPEG files written to the disk cache.
pub const JPEG_QUALITY: u8 = 90;

/// What a bulk legacy migration does when a single file cannot be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPolicy {
    /// Stop, remove the partially populated root and report the error.
    #[default]
    Abort,
    /// Log the failure and keep copying the remaining files.
    SkipFailed,
}

/// Settings for an [`ArtworkManager`](crate::ArtworkManager).
///
/// Only `root` is required when deserializing; everything else falls back to
/// the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// Directory holding originals and scaled renditions.
    pub root: PathBuf,
    /// Flat directory used by older versions, migrated once into `root`.
    #[serde(default)]
    pub legacy_root: Option<PathBuf>,
    #[serde(default = "default_surface_budget_bytes")]
    pub surface_budget_bytes: usize,
    #[serde(default = "default_max_cached_sizes")]
    pub max_cached_sizes: usize,
    #[serde(default = "default_release_sweep_interval")]
    pub release_sweep_interval: u32,
    #[serde(default)]
    pub migration_policy: MigrationPolicy,
}

impl ArtworkConfig {
    /// Creates a configuration rooted at `root` with default limits.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            legacy_root: None,
            surface_budget_bytes: DEFAULT_SURFACE_BUDGET_BYTES,
            max_cached_sizes: DEFAULT_MAX_CACHED_SIZES,
            release_sweep_interval: DEFAULT_RELEASE_SWEEP_INTERVAL,
            migration_policy: MigrationPolicy::default(),
        }
    }

    /// Sets the legacy directory to migrate from on first start.
    pub fn with_legacy_root(mut self, legacy_root: impl AsRef<Path>) -> Self {
        self.legacy_root = Some(legacy_root.as_ref().to_path_buf());
        self
    }

    pub fn with_migration_policy(mut self, policy: MigrationPolicy) -> Self {
        self.migration_policy = policy;
        self
    }
}

fn default_surface_budget_bytes() -> usize {
    DEFAULT_SURFACE_BUDGET_BYTES
}

fn default_max_cached_sizes() -> usize {
    DEFAULT_MAX_CACHED_SIZES
}

fn default_release_sweep_interval() -> u32 {
    DEFAULT_RELEASE_SWEEP_INTERVAL
}
