pub mod envelope;

pub use envelope::DiskGraphCache;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::graph::ComponentGraph;

/// Storage for previously computed graphs, keyed by [`content_key`] of the entry file.
///
/// The key covers the entry file's bytes only: editing a dependency without touching the
/// entry still hits the cache. Callers that need fresh results after such edits must
/// clear or bypass the cache.
#[async_trait]
pub trait GraphCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<ComponentGraph>;

    async fn set(&self, key: &str, graph: &ComponentGraph) -> Result<(), CacheError>;
}

/// SHA-256 of the given content, lowercase hex.
pub fn content_key(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Process-local cache; share it between calls through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryGraphCache {
    store: RwLock<HashMap<String, Arc<ComponentGraph>>>,
}

impl MemoryGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

#[async_trait]
impl GraphCache for MemoryGraphCache {
    async fn get(&self, key: &str) -> Option<ComponentGraph> {
        let store = self.store.read().await;
        store.get(key).map(|graph| graph.as_ref().clone())
    }

    async fn set(&self, key: &str, graph: &ComponentGraph) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.insert(key.to_owned(), Arc::new(graph.clone()));
        Ok(())
    }
}

/// Never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGraphCache;

#[async_trait]
impl GraphCache for NoopGraphCache {
    async fn get(&self, _key: &str) -> Option<ComponentGraph> {
        None
    }

    async fn set(&self, _key: &str, _graph: &ComponentGraph) -> Result<(), CacheError> {
        Ok(())
    }
}
