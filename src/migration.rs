//! One-time migration of the legacy flat artwork directory.

use crate::cache_path::CachePathResolver;
use crate::config::MigrationPolicy;
use crate::error::{ArtworkError, Result};
use log::{debug, error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a legacy migration run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Files copied into the new root.
    pub migrated: usize,
    /// Files that failed to copy under [`MigrationPolicy::SkipFailed`].
    pub failed: usize,
    /// The new root already existed, nothing was done.
    pub skipped: bool,
}

/// Copies every file of `legacy_root` into a freshly created artwork root.
///
/// Legacy files are named `<id>.<ext>`. JPEG files become the canonical
/// original of `id`; any other format becomes its unconverted sidecar and is
/// converted on first lookup. Either way the destination goes through
/// [`CachePathResolver`], so ids that need escaping stay reachable.
///
/// Does nothing when the root already exists, which makes repeated runs free.
/// A missing legacy directory just creates an empty root. Under
/// [`MigrationPolicy::Abort`] the first failing file stops the run and the
/// partially populated root is removed, so the next start retries.
pub fn migrate_legacy_artwork(
    legacy_root: Option<&Path>,
    paths: &CachePathResolver,
    policy: MigrationPolicy,
) -> Result<MigrationReport> {
    migrate_with(legacy_root, paths, policy, |from, to| fs::copy(from, to))
}

fn migrate_with<F>(
    legacy_root: Option<&Path>,
    paths: &CachePathResolver,
    policy: MigrationPolicy,
    mut copy: F,
) -> Result<MigrationReport>
where
    F: FnMut(&Path, &Path) -> io::Result<u64>,
{
    let root = paths.root();
    if root.exists() {
        debug!("Artwork root {} exists, skipping migration", root.display());
        return Ok(MigrationReport {
            skipped: true,
            ..MigrationReport::default()
        });
    }

    fs::create_dir_all(root).map_err(|e| migration_error(root, e))?;

    let mut report = MigrationReport::default();
    let Some(legacy_root) = legacy_root.filter(|dir| dir.is_dir()) else {
        return Ok(report);
    };

    let entries = fs::read_dir(legacy_root).map_err(|e| migration_error(legacy_root, e))?;
    for entry in entries {
        let result = entry
            .map_err(|e| migration_error(legacy_root, e))
            .and_then(|entry| {
                let source = entry.path();
                if !source.is_file() {
                    return Ok(false);
                }
                copy(&source, &destination_for(paths, &source))
                    .map(|_| true)
                    .map_err(|e| migration_error(&source, e))
            });

        match result {
            Ok(true) => report.migrated += 1,
            Ok(false) => {}
            Err(e) if policy == MigrationPolicy::SkipFailed => {
                warn!("{}", e);
                report.failed += 1;
            }
            Err(e) => {
                error!("{}; aborting artwork migration", e);
                if let Err(cleanup) = fs::remove_dir_all(root) {
                    warn!(
                        "Failed to remove partially migrated {}: {}",
                        root.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
        }
    }

    info!(
        "Migrated {} artwork files from {} to {}",
        report.migrated,
        legacy_root.display(),
        root.display()
    );
    Ok(report)
}

/// Where a legacy `<id>.<ext>` file lands in the new layout.
fn destination_for(paths: &CachePathResolver, source: &Path) -> PathBuf {
    let id = source
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let is_jpeg = source
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));

    if is_jpeg {
        paths.path_for(&id, 0)
    } else {
        paths.unconverted_path_for(&id)
    }
}

fn migration_error(path: &Path, err: io::Error) -> ArtworkError {
    ArtworkError::Migration {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
