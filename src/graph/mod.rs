pub mod builder;
pub mod node;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use node::{ExternalReference, ModuleNode};

/// The result of one traversal: every local module reachable from the entry, keyed by
/// absolute path, plus the imports that stayed external.
///
/// Invariants: every path in `order` has exactly one entry in `nodes`, and
/// `order[0] == entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentGraph {
    /// Absolute path of the root module.
    pub entry: PathBuf,
    pub nodes: HashMap<PathBuf, ModuleNode>,
    /// First-visit (pre-order DFS) order. Not a dependency-safe build order.
    pub order: Vec<PathBuf>,
    /// In discovery order.
    pub externals: Vec<ExternalReference>,
}

impl ComponentGraph {
    /// The root module.
    ///
    /// # Panics
    /// Only if the graph was constructed by hand in violation of its invariants.
    pub fn entry_node(&self) -> &ModuleNode {
        &self.nodes[&self.entry]
    }

    pub fn node(&self, path: &Path) -> Option<&ModuleNode> {
        self.nodes.get(path)
    }

    /// Modules in first-visit order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.order.iter().filter_map(|path| self.nodes.get(path))
    }

    pub fn module_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of import edges across all modules.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.imports.len()).sum()
    }

    /// All warnings, paired with the module they belong to, in first-visit order.
    pub fn warnings(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.modules()
            .flat_map(|n| n.warnings.iter().map(move |w| (n.file_path.as_path(), w.as_str())))
    }
}

/// The specifiers a bundler should leave unbundled for this graph.
///
/// Union of `preset`, every external reference, and every edge that did not resolve.
pub fn collect_external_specifiers(graph: &ComponentGraph, preset: &[String]) -> BTreeSet<String> {
    let mut external: BTreeSet<String> = preset.iter().cloned().collect();

    external.extend(graph.externals.iter().map(|r| r.specifier.clone()));

    for node in graph.nodes.values() {
        for edge in &node.imports {
            if edge.resolved.is_none() && !edge.specifier.is_empty() {
                external.insert(edge.specifier.clone());
            }
        }
    }

    external
}
