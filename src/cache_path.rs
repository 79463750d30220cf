//! Deterministic on-disk layout of the artwork cache.
//!
//! ```text
//! <root>/<id>.jpg          canonical original
//! <root>/<size>/<id>.jpg   scaled rendition
//! <root>/<id>.cover        unconverted download, pending conversion
//! ```

use crate::config::{ARTWORK_EXTENSION, UNCONVERTED_EXTENSION};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Maps `(id, size)` pairs to paths under a single root. Performs no I/O.
#[derive(Debug, Clone)]
pub struct CachePathResolver {
    root: PathBuf,
}

impl CachePathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the rendition of `id` at `size`; size 0 is the canonical original.
    pub fn path_for(&self, id: &str, size: u32) -> PathBuf {
        let file_name = format!("{}.{}", escape_id(id), ARTWORK_EXTENSION);
        if size == 0 {
            self.root.join(file_name)
        } else {
            self.size_dir(size).join(file_name)
        }
    }

    /// Path of a downloaded image for `id` that was never converted.
    pub fn unconverted_path_for(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", escape_id(id), UNCONVERTED_EXTENSION))
    }

    /// Directory holding every rendition of one size.
    pub fn size_dir(&self, size: u32) -> PathBuf {
        self.root.join(size.to_string())
    }
}

/// Percent-escapes every byte outside `[A-Za-z0-9._-]`.
///
/// `%` is escaped too, so two different ids never share a file name.
fn escape_id(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                escaped.push(byte as char)
            }
            _ => {
                let _ = write!(escaped, "%{:02X}", byte);
            }
        }
    }
    escaped
}
