use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

/// The filesystem primitives the resolver needs: read a file, and probe whether a
/// path is a readable file.
///
/// Injectable so that tests (and editors holding unsaved buffers) can resolve
/// against a virtual filesystem.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Read the whole file as UTF-8 text.
    async fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` exists and is a regular file.
    ///
    /// The default implementation attempts a full read.
    async fn is_file(&self, path: &Path) -> bool {
        self.read(path).await.is_ok()
    }
}

/// Reads from the real filesystem through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

#[async_trait]
impl SourceReader for OsFileSystem {
    /// Invalid UTF-8 (images, fonts) is decoded lossily instead of failing.
    async fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// A regular file that can be opened for reading.
    async fn is_file(&self, path: &Path) -> bool {
        let is_regular = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        is_regular && tokio::fs::File::open(path).await.is_ok()
    }
}

/// An in-memory filesystem keyed by absolute path.
///
/// Directories are implicit: only files are stored.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. The path is normalized lexically.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(normalize_path(path.as_ref()), contents.into());
    }

    /// Remove a file, returning its previous contents.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<String> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(&normalize_path(path.as_ref()))
    }
}

#[async_trait]
impl SourceReader for MemoryFileSystem {
    async fn read(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, matching how Node's `path.resolve` behaves.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past a root or prefix.
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join `path` onto `base` (unless already absolute) and normalize the result.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// The process working directory, or `/` if it cannot be determined.
pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
}
