use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CacheError;
use crate::graph::ComponentGraph;

use super::GraphCache;

/// Current cache format version. Bump when the graph struct layout changes: bincode
/// encodes positionally, so an old entry would otherwise decode into garbage or fail.
pub const CACHE_VERSION: u32 = 1;

/// Extension of cache entry files inside the cache directory.
pub const CACHE_EXT: &str = "bin";

/// Envelope wrapping the serialized graph with its format version and key.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CacheEnvelope {
    pub version: u32,
    pub key: String,
    pub graph: ComponentGraph,
}

/// A persistent [`GraphCache`]: one bincode file per key under a directory.
#[derive(Debug, Clone)]
pub struct DiskGraphCache {
    dir: PathBuf,
}

impl DiskGraphCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<key>.bin`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{CACHE_EXT}"))
    }
}

/// Save an envelope atomically: write to a temp file in the same directory, then rename.
fn save_entry(dir: &Path, target: &Path, envelope: &CacheEnvelope) -> Result<(), CacheError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    bincode::serde::encode_into_std_write(envelope, &mut tmp, bincode::config::standard())?;
    tmp.as_file().flush()?;
    tmp.persist(target)?;
    Ok(())
}

/// Load an entry. Returns None if:
/// - The entry file doesn't exist
/// - The version or key doesn't match
/// - Deserialization fails (corrupt entry)
fn load_entry(target: &Path, key: &str) -> Option<ComponentGraph> {
    let bytes = std::fs::read(target).ok()?;
    let result =
        bincode::serde::decode_from_slice::<CacheEnvelope, _>(&bytes, bincode::config::standard());
    match result {
        Ok((envelope, _)) if envelope.version == CACHE_VERSION && envelope.key == key => {
            Some(envelope.graph)
        }
        Ok(_) => {
            tracing::debug!("ignoring stale cache entry {}", target.display());
            None
        }
        Err(e) => {
            tracing::debug!("ignoring corrupt cache entry {}: {e}", target.display());
            None
        }
    }
}

#[async_trait]
impl GraphCache for DiskGraphCache {
    async fn get(&self, key: &str) -> Option<ComponentGraph> {
        let target = self.entry_path(key);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || load_entry(&target, &key))
            .await
            .ok()
            .flatten()
    }

    async fn set(&self, key: &str, graph: &ComponentGraph) -> Result<(), CacheError> {
        let dir = self.dir.clone();
        let target = self.entry_path(key);
        let envelope = CacheEnvelope {
            version: CACHE_VERSION,
            key: key.to_owned(),
            graph: graph.clone(),
        };
        tokio::task::spawn_blocking(move || save_entry(&dir, &target, &envelope)).await?
    }
}
