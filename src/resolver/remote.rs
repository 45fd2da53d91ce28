use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

/// What the graph builder knows when it asks a [`RemoteResolver`] about a specifier.
#[derive(Debug, Clone, Copy)]
pub struct RemoteContext<'a> {
    /// Absolute path of the module containing the import.
    pub importer: &'a Path,
    /// Absolute path of the traversal's entry file.
    pub entry: &'a Path,
    pub repo_root: Option<&'a Path>,
}

/// Caller-supplied resolution for package and remote specifiers.
///
/// Returning an `http(s)://` URL marks the import as resolved remote content. Returning a
/// path makes the builder try to read it and, on success, traverse it like any local
/// module. Returning `None` leaves the specifier external.
#[async_trait]
pub trait RemoteResolver: Send + Sync {
    async fn resolve(&self, specifier: &str, context: &RemoteContext<'_>) -> Option<String>;
}

/// A fixed specifier → path/URL table, e.g. from the `[remote]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticRemoteResolver {
    targets: HashMap<String, String>,
}

impl StaticRemoteResolver {
    pub fn new(targets: HashMap<String, String>) -> Self {
        Self { targets }
    }

    pub fn insert(&mut self, specifier: impl Into<String>, target: impl Into<String>) {
        self.targets.insert(specifier.into(), target.into());
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl RemoteResolver for StaticRemoteResolver {
    async fn resolve(&self, specifier: &str, _context: &RemoteContext<'_>) -> Option<String> {
        self.targets.get(specifier).cloned()
    }
}
