use artwork_cache::{
    ArtworkCodec, ArtworkConfig, ArtworkManager, JpegArtworkCodec, MigrationPolicy, Result,
    Surface, SurfaceCache,
};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[derive(Default)]
struct Calls {
    decode: AtomicUsize,
    scale: AtomicUsize,
}

/// JPEG codec that counts decode and scale calls.
struct CountingCodec {
    inner: JpegArtworkCodec,
    calls: Arc<Calls>,
}

impl ArtworkCodec for CountingCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        self.calls.decode.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(path)
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        self.inner.encode(image)
    }

    fn scale(&self, image: &DynamicImage, size: u32) -> DynamicImage {
        self.calls.scale.fetch_add(1, Ordering::SeqCst);
        self.inner.scale(image, size)
    }
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    calls: Arc<Calls>,
    manager: ArtworkManager,
}

fn fixture() -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("artwork");
    let calls = Arc::new(Calls::default());
    let codec = CountingCodec {
        inner: JpegArtworkCodec::default(),
        calls: calls.clone(),
    };
    let manager = ArtworkManager::with_codec(ArtworkConfig::new(&root), Box::new(codec)).unwrap();
    Fixture {
        _dir: dir,
        root,
        calls,
        manager,
    }
}

fn write_image(path: &Path, side: u32, format: ImageFormat) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    DynamicImage::new_rgb8(side, side)
        .save_with_format(path, format)
        .unwrap();
}

#[test]
fn missing_original_without_sidecar_is_no_artwork() {
    let f = fixture();

    assert!(f.manager.lookup_original("abc").is_none());
    assert_eq!(f.calls.decode.load(Ordering::SeqCst), 0);
}

#[test]
fn sidecar_is_converted_scaled_and_persisted() {
    let f = fixture();
    let sidecar = f.root.join("abc.cover");
    write_image(&sidecar, 80, ImageFormat::Png);

    let image = f.manager.lookup_scaled("abc", 50).unwrap();

    assert_eq!((image.width(), image.height()), (50, 50));
    assert!(!sidecar.exists());
    assert!(f.root.join("abc.jpg").is_file());
    assert!(f.root.join("50").join("abc.jpg").is_file());
}

#[test]
fn undersized_sidecar_is_discarded() {
    let f = fixture();
    let sidecar = f.root.join("abc.cover");
    write_image(&sidecar, 30, ImageFormat::Png);

    assert!(f.manager.lookup_scaled("abc", 50).is_none());
    assert!(!sidecar.exists());
    assert!(!f.root.join("abc.jpg").exists());
}

#[test]
fn capacity_one_cache_frees_previous_surface() {
    let mut cache = SurfaceCache::with_capacity(48, 1).unwrap();
    let surface = || Surface::from(DynamicImage::new_rgb8(48, 48));

    cache.put("x".to_string(), surface());
    cache.put("y".to_string(), surface());

    assert!(!cache.contains("x"));
    assert!(cache.contains("y"));
    assert_eq!(cache.released(), 1);
}

#[test]
fn second_lookup_is_served_from_disk_without_scaling() {
    let f = fixture();
    write_image(&f.root.join("abc.jpg"), 200, ImageFormat::Jpeg);

    let first = f.manager.lookup_scaled("abc", 64).unwrap();
    assert_eq!(f.calls.scale.load(Ordering::SeqCst), 1);

    let second = f.manager.lookup_scaled("abc", 64).unwrap();
    assert_eq!(f.calls.scale.load(Ordering::SeqCst), 1);
    assert_eq!(second.width(), first.width());

    f.manager.lookup_original("abc").unwrap();
    f.manager.lookup_original("abc").unwrap();
    assert_eq!(f.calls.scale.load(Ordering::SeqCst), 1);
}

#[test]
fn unwritable_size_directory_still_returns_scaled_image() {
    let f = fixture();
    write_image(&f.root.join("abc.jpg"), 200, ImageFormat::Jpeg);
    // A plain file where the size directory should go.
    fs::write(f.root.join("40"), b"not a directory").unwrap();

    let image = f.manager.lookup_scaled("abc", 40).unwrap();

    assert_eq!((image.width(), image.height()), (40, 40));
    assert!(f.root.join("40").is_file());
    assert!(f.manager.lookup_scaled("abc", 40).is_some());
    assert_eq!(f.calls.scale.load(Ordering::SeqCst), 2);
}

#[test]
fn tiny_sizes_never_touch_disk() {
    let mut f = fixture();
    write_image(&f.root.join("abc.jpg"), 200, ImageFormat::Jpeg);

    for size in 1..10 {
        assert!(f.manager.lookup_scaled("abc", size).is_none());
        assert!(f.manager.lookup_scaled_cached("abc", size).is_none());
    }

    assert_eq!(f.calls.decode.load(Ordering::SeqCst), 0);
    assert!(f.manager.cached_sizes().is_empty());
}

#[test]
fn cached_lookups_decode_once_until_evicted() {
    let mut f = fixture();
    write_image(&f.root.join("abc.jpg"), 200, ImageFormat::Jpeg);
    f.manager.set_cache_capacity(48, 1).unwrap();

    for _ in 0..5 {
        let surface = f.manager.lookup_scaled_cached("abc", 48).unwrap();
        assert_eq!(surface.width(), 48);
    }
    // One decode of the original, nothing after.
    assert_eq!(f.calls.decode.load(Ordering::SeqCst), 1);

    write_image(&f.root.join("other.jpg"), 200, ImageFormat::Jpeg);
    f.manager.lookup_scaled_cached("other", 48).unwrap();
    f.manager.lookup_scaled_cached("abc", 48).unwrap();

    // "abc" was evicted by "other" and comes back from its disk rendition.
    assert_eq!(f.calls.decode.load(Ordering::SeqCst), 3);
    assert_eq!(f.calls.scale.load(Ordering::SeqCst), 2);
}

#[test]
fn legacy_directory_is_migrated_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("covers");
    let root = dir.path().join("album-art");
    write_image(&legacy.join("abc.jpg"), 120, ImageFormat::Jpeg);
    write_image(&legacy.join("def.jpg"), 120, ImageFormat::Jpeg);

    let config = ArtworkConfig::new(&root)
        .with_legacy_root(&legacy)
        .with_migration_policy(MigrationPolicy::Abort);
    let manager = ArtworkManager::new(config.clone()).unwrap();

    assert!(manager.has_original("abc"));
    assert!(manager.has_original("def"));
    let image = manager.lookup_original("abc").unwrap();
    assert_eq!((image.width(), image.height()), (120, 120));

    write_image(&legacy.join("ghi.jpg"), 120, ImageFormat::Jpeg);
    let report = manager.migrate_legacy_artwork().unwrap();
    assert!(report.skipped);

    let restarted = ArtworkManager::new(config).unwrap();
    assert!(!restarted.has_original("ghi"));
}

#[test]
fn legacy_ids_with_spaces_survive_migration() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("covers");
    let root = dir.path().join("album-art");
    write_image(&legacy.join("Some Artist - Album.jpg"), 120, ImageFormat::Jpeg);

    let manager = ArtworkManager::new(ArtworkConfig::new(&root).with_legacy_root(&legacy)).unwrap();

    assert!(manager.has_original("Some Artist - Album"));
    let image = manager.lookup_scaled("Some Artist - Album", 60).unwrap();
    assert_eq!(image.width(), 60);
}
