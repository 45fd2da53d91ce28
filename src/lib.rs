//! Resolve the transitive import graph of a TypeScript/JavaScript component entry file.
//!
//! Starting from one entry module, every static import, re-export and literal dynamic
//! import is resolved (path aliases, relative and absolute paths, an optional remote
//! hook) and local modules are visited depth-first. Unresolvable imports are recorded
//! as externals instead of failing the call.

pub mod cache;
pub mod error;
pub mod fs;
pub mod graph;
pub mod parser;
pub mod resolver;

pub use cache::{DiskGraphCache, GraphCache, MemoryGraphCache, NoopGraphCache, content_key};
pub use error::{CacheError, ExtractError, ResolveError};
pub use fs::{MemoryFileSystem, OsFileSystem, SourceReader};
pub use graph::builder::{ResolveOptions, resolve_component_graph, resolve_entry_path};
pub use graph::node::{ExternalReference, ImportEdge, ModuleNode, ResolvedTarget};
pub use graph::{ComponentGraph, collect_external_specifiers};
pub use parser::{ExtractedImports, ImportExtractor, TreeSitterExtractor};
pub use resolver::{
    AliasConfig, AliasRule, RemoteContext, RemoteResolver, SpecifierKind, StaticRemoteResolver,
    classify,
};
