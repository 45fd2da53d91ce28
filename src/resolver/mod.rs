//! Specifier resolution: classification, path aliases, filesystem probing and the
//! remote/package hook.

pub mod aliases;
pub mod file_resolver;
pub mod remote;
pub mod specifier;
pub mod tsconfig;

pub use aliases::{AliasConfig, AliasRule};
pub use file_resolver::{DEFAULT_EXTENSIONS, ImportResolver, ResolutionOutcome, find_existing_file};
pub use remote::{RemoteContext, RemoteResolver, StaticRemoteResolver};
pub use specifier::{SpecifierKind, classify, is_remote_specifier};
