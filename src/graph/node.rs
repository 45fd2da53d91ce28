use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parser::{ImportKind, RawImport};

/// Where an import edge points once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedTarget {
    /// A local file that was traversed.
    File(PathBuf),
    /// A URL handed back by the remote resolver. Never traversed.
    Url(String),
}

impl ResolvedTarget {
    pub fn as_file(&self) -> Option<&PathBuf> {
        match self {
            Self::File(path) => Some(path),
            Self::Url(_) => None,
        }
    }
}

impl std::fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// One static or dynamic import found in a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// The specifier as written in source.
    pub specifier: String,
    /// `None` when the import is external.
    pub resolved: Option<ResolvedTarget>,
    pub default_import: Option<String>,
    pub namespace_import: Option<String>,
    pub named_imports: Vec<String>,
    /// True for `import('...')` calls.
    pub is_dynamic: bool,
}

impl ImportEdge {
    pub fn new(raw: RawImport, resolved: Option<ResolvedTarget>) -> Self {
        Self {
            is_dynamic: raw.kind == ImportKind::Dynamic,
            specifier: raw.specifier,
            resolved,
            default_import: raw.default_import,
            namespace_import: raw.namespace_import,
            named_imports: raw.named_imports,
        }
    }

    pub fn resolved_path(&self) -> Option<&PathBuf> {
        self.resolved.as_ref().and_then(ResolvedTarget::as_file)
    }
}

/// One file visited during traversal. Created exactly once per absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Same as `file_path`; kept as the graph key.
    pub id: PathBuf,
    pub file_path: PathBuf,
    /// File contents at visit time.
    pub source: String,
    /// In source order.
    pub imports: Vec<ImportEdge>,
    pub is_entry: bool,
    /// Distance from the entry at first visit (entry = 0). Diagnostics only.
    pub depth: usize,
    pub warnings: Vec<String>,
}

impl ModuleNode {
    pub fn new(file_path: PathBuf, source: String, depth: usize) -> Self {
        Self {
            id: file_path.clone(),
            file_path,
            source,
            imports: Vec::new(),
            is_entry: depth == 0,
            depth,
            warnings: Vec::new(),
        }
    }
}

/// An import occurrence that could not be resolved to a local file.
///
/// Each importing occurrence is recorded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub specifier: String,
    /// Absolute path of the importing module.
    pub imported_by: PathBuf,
    pub reason: String,
}
