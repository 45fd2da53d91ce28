use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a resolution call.
///
/// Everything recoverable (unparseable modules, unresolved specifiers, malformed
/// alias configs) is absorbed into the returned graph instead.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The entry file could not be read; there is nothing to traverse.
    #[error("cannot read entry file {path}: {source}")]
    EntryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A candidate that existed at probe time could not be read at visit time.
    #[error("{path} (imported by {importer}) existed when probed but could not be read: {source}")]
    InconsistentRead {
        path: PathBuf,
        importer: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a module's source could not be turned into import records.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported extension: {0:?}")]
    Unsupported(String),

    #[error("parser produced no syntax tree for {0}")]
    NoTree(PathBuf),

    #[error("failed to load grammar: {0}")]
    Grammar(String),
}

/// Failures inside a [`GraphCache`](crate::cache::GraphCache) implementation.
///
/// The graph builder logs these and carries on uncached.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to persist cache entry: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("cache task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
