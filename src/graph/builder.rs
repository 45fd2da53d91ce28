use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::cache::{GraphCache, content_key};
use crate::error::ResolveError;
use crate::fs::{OsFileSystem, SourceReader, absolutize, current_dir};
use crate::parser::{ImportExtractor, TreeSitterExtractor};
use crate::resolver::specifier::is_relative_specifier;
use crate::resolver::{AliasConfig, DEFAULT_EXTENSIONS, ImportResolver, RemoteResolver, ResolutionOutcome};

use super::ComponentGraph;
use super::node::{ExternalReference, ImportEdge, ModuleNode, ResolvedTarget};

/// Caller-owned configuration for one or more resolution calls.
///
/// Nothing here is global: two calls with different options never share state except
/// through an explicitly shared `cache`.
#[derive(Clone)]
pub struct ResolveOptions {
    /// Base for non-relative entry paths, non-relative remote results and supplied aliases.
    pub repo_root: Option<PathBuf>,
    /// Working directory for `./entry` style paths. Defaults to the process cwd.
    pub cwd: Option<PathBuf>,
    /// Probed in order, e.g. `".ts"`.
    pub extensions: Vec<String>,
    pub aliases: AliasConfig,
    pub reader: Arc<dyn SourceReader>,
    pub extractor: Arc<dyn ImportExtractor>,
    /// `None` disables caching.
    pub cache: Option<Arc<dyn GraphCache>>,
    /// `None` leaves every package and URL specifier external.
    pub remote_resolver: Option<Arc<dyn RemoteResolver>>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            repo_root: None,
            cwd: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect(),
            aliases: AliasConfig::default(),
            reader: Arc::new(OsFileSystem),
            extractor: Arc::new(TreeSitterExtractor),
            cache: None,
            remote_resolver: None,
        }
    }
}

impl std::fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("repo_root", &self.repo_root)
            .field("cwd", &self.cwd)
            .field("extensions", &self.extensions)
            .field("aliases", &self.aliases.rules().len())
            .field("cache", &self.cache.is_some())
            .field("remote_resolver", &self.remote_resolver.is_some())
            .finish()
    }
}

impl ResolveOptions {
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(root.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_aliases(mut self, aliases: AliasConfig) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn SourceReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ImportExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn GraphCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_remote_resolver(mut self, resolver: Arc<dyn RemoteResolver>) -> Self {
        self.remote_resolver = Some(resolver);
        self
    }

    /// Discover alias rules from config files above `start_dir` (through this options'
    /// reader) and merge them after the rules already present.
    pub async fn with_discovered_aliases(mut self, start_dir: &Path) -> Self {
        let discovered = AliasConfig::discover(self.reader.as_ref(), start_dir).await;
        self.aliases = std::mem::take(&mut self.aliases).merge(discovered);
        self
    }
}

/// Turn the entry argument into an absolute path.
///
/// Absolute paths are used as-is; `./x` and `../x` resolve against `cwd`; anything else
/// resolves against `repo_root` when given, otherwise `cwd`.
pub fn resolve_entry_path(entry: &Path, repo_root: Option<&Path>, cwd: &Path) -> PathBuf {
    if entry.is_absolute() {
        return entry.to_path_buf();
    }
    if is_relative_specifier(&entry.to_string_lossy()) {
        return absolutize(cwd, entry);
    }
    match repo_root {
        Some(root) => absolutize(root, entry),
        None => absolutize(cwd, entry),
    }
}

/// Resolve the full component graph reachable from `entry`.
///
/// With a cache configured, the entry file's content hash is looked up first and a hit
/// is returned without traversal. Otherwise the traversal is a depth-first, pre-order
/// walk: every import of a module is resolved in source order, and each newly found
/// local module is visited completely before the next import is looked at.
///
/// # Errors
/// - [`ResolveError::EntryUnreadable`] if the entry file cannot be read.
/// - [`ResolveError::InconsistentRead`] if a file that passed the existence probe
///   cannot be read when visited.
pub async fn resolve_component_graph(
    entry: impl AsRef<Path>,
    options: &ResolveOptions,
) -> Result<ComponentGraph, ResolveError> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => current_dir(),
    };
    let repo_root = options.repo_root.as_deref().map(|root| absolutize(&cwd, root));
    let entry_path = resolve_entry_path(entry.as_ref(), repo_root.as_deref(), &cwd);

    // Cache lookup: keyed on the entry file's own bytes only.
    let cache_key = match &options.cache {
        Some(_) => match options.reader.read(&entry_path).await {
            Ok(source) => Some(content_key(source.as_bytes())),
            Err(e) => {
                tracing::debug!("not caching {}: {e}", entry_path.display());
                None
            }
        },
        None => None,
    };
    if let (Some(cache), Some(key)) = (&options.cache, &cache_key) {
        if let Some(graph) = cache.get(key).await {
            tracing::debug!("cache hit for {} ({key})", entry_path.display());
            return Ok(graph);
        }
    }

    let resolver = ImportResolver {
        reader: options.reader.as_ref(),
        aliases: &options.aliases,
        extensions: &options.extensions,
        remote: options.remote_resolver.as_deref(),
        entry: &entry_path,
        repo_root: repo_root.as_deref(),
        cwd: &cwd,
    };
    let mut traversal = Traversal {
        reader: options.reader.as_ref(),
        extractor: options.extractor.as_ref(),
        resolver,
        nodes: HashMap::new(),
        order: Vec::new(),
        externals: Vec::new(),
    };
    traversal.visit(entry_path.clone(), 0, None).await?;

    // `traversal.resolver` still borrows `entry_path`.
    let graph = ComponentGraph {
        entry: entry_path.clone(),
        nodes: traversal.nodes,
        order: traversal.order,
        externals: traversal.externals,
    };
    tracing::debug!(
        "resolved {} modules, {} externals from {}",
        graph.nodes.len(),
        graph.externals.len(),
        graph.entry.display()
    );

    if let (Some(cache), Some(key)) = (&options.cache, &cache_key) {
        if let Err(e) = cache.set(key, &graph).await {
            tracing::warn!("failed to write graph cache entry {key}: {e}");
        }
    }

    Ok(graph)
}

type VisitFuture<'s> = Pin<Box<dyn Future<Output = Result<(), ResolveError>> + Send + 's>>;

/// Mutable state of one traversal. `nodes` doubles as the recursion guard.
struct Traversal<'a> {
    reader: &'a dyn SourceReader,
    extractor: &'a dyn ImportExtractor,
    resolver: ImportResolver<'a>,
    nodes: HashMap<PathBuf, ModuleNode>,
    order: Vec<PathBuf>,
    externals: Vec<ExternalReference>,
}

impl<'a> Traversal<'a> {
    /// Visit `path` unless already visited.
    ///
    /// The node is registered before its imports are resolved, so a cycle back to it
    /// finds the in-progress node instead of re-entering.
    fn visit(&mut self, path: PathBuf, depth: usize, importer: Option<PathBuf>) -> VisitFuture<'_> {
        Box::pin(async move {
            if self.nodes.contains_key(&path) {
                return Ok(());
            }

            let source = match self.reader.read(&path).await {
                Ok(source) => source,
                Err(source) => {
                    return Err(match importer {
                        None => ResolveError::EntryUnreadable { path, source },
                        Some(importer) => ResolveError::InconsistentRead { path, importer, source },
                    });
                }
            };

            let mut node = ModuleNode::new(path.clone(), source, depth);
            let raw_imports = match self.extractor.extract(&path, &node.source) {
                Ok(extracted) => {
                    node.warnings.extend(extracted.warnings);
                    extracted.imports
                }
                Err(e) => {
                    tracing::debug!("no imports scanned in {}: {e}", path.display());
                    node.warnings.push(format!("imports not scanned: {e}"));
                    Vec::new()
                }
            };

            self.nodes.insert(path.clone(), node);
            self.order.push(path.clone());

            for raw in raw_imports {
                match self.resolver.resolve(&raw.specifier, &path).await {
                    ResolutionOutcome::Resolved(target) => {
                        tracing::debug!(
                            "{}: {:?} -> {}",
                            path.display(),
                            raw.specifier,
                            target.display()
                        );
                        let edge = ImportEdge::new(raw, Some(ResolvedTarget::File(target.clone())));
                        self.push_edge(&path, edge);
                        self.visit(target, depth + 1, Some(path.clone())).await?;
                    }
                    ResolutionOutcome::Remote(url) => {
                        tracing::debug!("{}: {:?} -> {url}", path.display(), raw.specifier);
                        self.push_edge(&path, ImportEdge::new(raw, Some(ResolvedTarget::Url(url))));
                    }
                    ResolutionOutcome::Unresolved(reason) => {
                        tracing::debug!("{}: {:?} external: {reason}", path.display(), raw.specifier);
                        self.externals.push(ExternalReference {
                            specifier: raw.specifier.clone(),
                            imported_by: path.clone(),
                            reason,
                        });
                        self.push_edge(&path, ImportEdge::new(raw, None));
                    }
                }
            }

            Ok(())
        })
    }

    fn push_edge(&mut self, importer: &Path, edge: ImportEdge) {
        if let Some(node) = self.nodes.get_mut(importer) {
            node.imports.push(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryGraphCache;
    use crate::fs::MemoryFileSystem;
    use crate::resolver::StaticRemoteResolver;

    fn options(fs: Arc<MemoryFileSystem>) -> ResolveOptions {
        ResolveOptions::default()
            .with_reader(fs)
            .with_cwd("/work")
    }

    #[test]
    fn test_resolve_entry_path_rules() {
        let cwd = Path::new("/work");
        let root = Path::new("/repo");
        assert_eq!(resolve_entry_path(Path::new("/abs/a.ts"), Some(root), cwd), PathBuf::from("/abs/a.ts"));
        assert_eq!(resolve_entry_path(Path::new("./a.ts"), Some(root), cwd), PathBuf::from("/work/a.ts"));
        assert_eq!(resolve_entry_path(Path::new("src/a.ts"), Some(root), cwd), PathBuf::from("/repo/src/a.ts"));
        assert_eq!(resolve_entry_path(Path::new("src/a.ts"), None, cwd), PathBuf::from("/work/src/a.ts"));
    }

    #[tokio::test]
    async fn test_diamond_visits_shared_module_once() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import './b'; import './c';");
        fs.insert("/p/b.ts", "import './d';");
        fs.insert("/p/c.ts", "import './d';");
        fs.insert("/p/d.ts", "export const d = 1;");

        let graph = resolve_component_graph("/p/a.ts", &options(fs)).await.unwrap();
        let order: Vec<_> = graph.order.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(order, vec!["/p/a.ts", "/p/b.ts", "/p/d.ts", "/p/c.ts"]);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.nodes[Path::new("/p/d.ts")].depth, 2);
        // c's edge to d resolves even though d was already visited.
        assert_eq!(
            graph.nodes[Path::new("/p/c.ts")].imports[0].resolved_path(),
            Some(&PathBuf::from("/p/d.ts"))
        );
    }

    #[tokio::test]
    async fn test_cycle_terminates_with_edges_both_ways() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import { b } from './b'; export const a = 1;");
        fs.insert("/p/b.ts", "import { a } from './a'; export const b = 2;");

        let graph = resolve_component_graph("/p/a.ts", &options(fs)).await.unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.order.len(), 2);
        let a = &graph.nodes[Path::new("/p/a.ts")];
        let b = &graph.nodes[Path::new("/p/b.ts")];
        assert_eq!(a.imports.len(), 1);
        assert_eq!(b.imports.len(), 1);
        assert_eq!(a.imports[0].resolved_path(), Some(&PathBuf::from("/p/b.ts")));
        assert_eq!(b.imports[0].resolved_path(), Some(&PathBuf::from("/p/a.ts")));
        assert!(a.is_entry);
        assert!(!b.is_entry);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_fatal() {
        let fs = Arc::new(MemoryFileSystem::new());
        let err = resolve_component_graph("/p/missing.ts", &options(fs)).await.unwrap_err();
        assert!(matches!(err, ResolveError::EntryUnreadable { .. }));
    }

    /// Claims every path is a file but can only read some: simulates a file vanishing
    /// between probe and read.
    struct VanishingReader(MemoryFileSystem);

    #[async_trait::async_trait]
    impl SourceReader for VanishingReader {
        async fn read(&self, path: &Path) -> std::io::Result<String> {
            self.0.read(path).await
        }

        async fn is_file(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "ts")
        }
    }

    #[tokio::test]
    async fn test_probe_read_race_is_fatal() {
        let inner = MemoryFileSystem::new();
        inner.insert("/p/a.ts", "import './gone';");
        let options = ResolveOptions::default()
            .with_reader(Arc::new(VanishingReader(inner)))
            .with_cwd("/work");

        let err = resolve_component_graph("/p/a.ts", &options).await.unwrap_err();
        match err {
            ResolveError::InconsistentRead { path, importer, .. } => {
                assert_eq!(path, PathBuf::from("/p/gone.ts"));
                assert_eq!(importer, PathBuf::from("/p/a.ts"));
            }
            other => panic!("expected InconsistentRead, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_asset_imports_are_nodes_with_warning() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import './theme.css';");
        fs.insert("/p/theme.css", ":host { color: red; }");

        let graph = resolve_component_graph("/p/a.ts", &options(fs)).await.unwrap();
        let css = &graph.nodes[Path::new("/p/theme.css")];
        assert!(css.imports.is_empty());
        assert_eq!(css.warnings.len(), 1);
        assert!(graph.externals.is_empty());
    }

    #[tokio::test]
    async fn test_remote_url_edge_is_resolved_but_not_traversed() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import { html } from 'lit';");
        let mut remote = StaticRemoteResolver::default();
        remote.insert("lit", "https://esm.sh/lit@3");

        let options = options(fs).with_remote_resolver(Arc::new(remote));
        let graph = resolve_component_graph("/p/a.ts", &options).await.unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.externals.is_empty());
        assert_eq!(
            graph.entry_node().imports[0].resolved,
            Some(ResolvedTarget::Url("https://esm.sh/lit@3".into()))
        );
    }

    #[tokio::test]
    async fn test_same_external_from_two_importers_recorded_twice() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import 'lit'; import './b';");
        fs.insert("/p/b.ts", "import 'lit';");

        let graph = resolve_component_graph("/p/a.ts", &options(fs)).await.unwrap();
        let importers: Vec<_> = graph.externals.iter().map(|e| e.imported_by.clone()).collect();
        assert_eq!(importers, vec![PathBuf::from("/p/a.ts"), PathBuf::from("/p/b.ts")]);
    }

    #[tokio::test]
    async fn test_cache_hit_is_stale_when_only_dependencies_change() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import './b';");
        fs.insert("/p/b.ts", "");
        let cache = Arc::new(MemoryGraphCache::new());
        let options = options(fs.clone()).with_cache(cache.clone());

        let first = resolve_component_graph("/p/a.ts", &options).await.unwrap();
        assert_eq!(cache.len().await, 1);

        // Removing a dependency does not change the entry's hash, so the cached graph wins.
        fs.remove("/p/b.ts");
        let second = resolve_component_graph("/p/a.ts", &options).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import './b'; import 'lit'; const m = import('./c');");
        fs.insert("/p/b.ts", "export * from './c';");
        fs.insert("/p/c.ts", "import 'lit';");
        let options = options(fs);

        let first = resolve_component_graph("/p/a.ts", &options).await.unwrap();
        let second = resolve_component_graph("/p/a.ts", &options).await.unwrap();
        assert_eq!(first, second);
        assert!(first.entry_node().imports[2].is_dynamic);
    }

    #[tokio::test]
    async fn test_longer_alias_wins_over_shorter_prefix() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/p/a.ts", "import { x } from '@ui/core/button';");
        fs.insert("/p/ui/core/button.ts", "");
        fs.insert("/p/core-lib/button.ts", "");
        let aliases = AliasConfig::from_mapping(
            [("@ui", "ui"), ("@ui/core", "core-lib")],
            Some(Path::new("/p")),
            Path::new("/work"),
        );

        let graph = resolve_component_graph("/p/a.ts", &options(fs).with_aliases(aliases))
            .await
            .unwrap();
        assert_eq!(
            graph.entry_node().imports[0].resolved_path(),
            Some(&PathBuf::from("/p/core-lib/button.ts"))
        );
    }

    #[tokio::test]
    async fn test_discovered_aliases_follow_supplied_ones() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert(
            "/p/tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@lib/*": ["vendor/lib/*"], "@app/*": ["app/*"] } } }"#,
        );
        fs.insert("/p/src/a.ts", "import '@lib/x'; import '@app/y';");
        fs.insert("/p/vendor/lib/x.ts", "");
        fs.insert("/p/override/x.ts", "");
        fs.insert("/p/app/y.ts", "");
        let supplied = AliasConfig::from_mapping([("@lib", "override")], Some(Path::new("/p")), Path::new("/work"));

        let options = options(fs)
            .with_aliases(supplied)
            .with_discovered_aliases(Path::new("/p/src"))
            .await;
        let graph = resolve_component_graph("/p/src/a.ts", &options).await.unwrap();
        let targets: Vec<_> = graph.entry_node().imports.iter().map(|e| e.resolved_path().cloned()).collect();
        assert_eq!(
            targets,
            vec![Some(PathBuf::from("/p/override/x.ts")), Some(PathBuf::from("/p/app/y.ts"))]
        );
    }

    /// Records every context it is asked about and answers `pkg` with a local path.
    #[derive(Default)]
    struct RecordingRemote {
        calls: std::sync::Mutex<Vec<(String, PathBuf, PathBuf, Option<PathBuf>)>>,
    }

    #[async_trait::async_trait]
    impl RemoteResolver for RecordingRemote {
        async fn resolve(&self, specifier: &str, context: &crate::resolver::RemoteContext<'_>) -> Option<String> {
            self.calls.lock().unwrap().push((
                specifier.to_owned(),
                context.importer.to_path_buf(),
                context.entry.to_path_buf(),
                context.repo_root.map(Path::to_path_buf),
            ));
            (specifier == "pkg").then(|| "vendor/pkg.ts".to_owned())
        }
    }

    #[tokio::test]
    async fn test_remote_resolver_sees_importer_entry_and_root() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("/repo/src/a.ts", "import './b';");
        fs.insert("/repo/src/b.ts", "import { p } from 'pkg';");
        fs.insert("/repo/vendor/pkg.ts", "import 'left-pad';");
        let remote = Arc::new(RecordingRemote::default());
        let options = options(fs)
            .with_repo_root("/repo")
            .with_remote_resolver(remote.clone());

        let graph = resolve_component_graph("src/a.ts", &options).await.unwrap();

        let calls = remote.calls.lock().unwrap().clone();
        assert_eq!(
            calls[0],
            (
                "pkg".to_owned(),
                PathBuf::from("/repo/src/b.ts"),
                PathBuf::from("/repo/src/a.ts"),
                Some(PathBuf::from("/repo")),
            )
        );
        // The path answer is read and traversed like a local module.
        assert_eq!(
            graph.order,
            vec![
                PathBuf::from("/repo/src/a.ts"),
                PathBuf::from("/repo/src/b.ts"),
                PathBuf::from("/repo/vendor/pkg.ts"),
            ]
        );
        assert_eq!(graph.nodes[Path::new("/repo/vendor/pkg.ts")].depth, 2);
        assert_eq!(calls[1].0, "left-pad");
        assert_eq!(calls[1].1, PathBuf::from("/repo/vendor/pkg.ts"));
        assert_eq!(graph.externals.len(), 1);
        assert_eq!(graph.externals[0].imported_by, PathBuf::from("/repo/vendor/pkg.ts"));
    }
}
