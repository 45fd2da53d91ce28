use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::fs::{SourceReader, absolutize};

use super::aliases::AliasConfig;
use super::remote::{RemoteContext, RemoteResolver};
use super::specifier::{SpecifierKind, classify, is_remote_specifier};

/// Extensions probed, in order, when a specifier does not name a file directly.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"];

/// The outcome of resolving a single import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A local file confirmed readable; the builder traverses it.
    Resolved(PathBuf),
    /// The remote resolver mapped the specifier to a URL. Not traversed.
    Remote(String),
    /// The specifier could not be resolved. `String` contains a human-readable reason.
    Unresolved(String),
}

/// Everything needed to resolve specifiers during one traversal.
pub struct ImportResolver<'a> {
    pub reader: &'a dyn SourceReader,
    pub aliases: &'a AliasConfig,
    pub extensions: &'a [String],
    pub remote: Option<&'a dyn RemoteResolver>,
    pub entry: &'a Path,
    pub repo_root: Option<&'a Path>,
    pub cwd: &'a Path,
}

impl ImportResolver<'_> {
    /// Resolve `specifier` as imported from `importer`.
    ///
    /// Order: alias substitution, then relative/absolute paths, probing the filesystem
    /// for a concrete file. Anything not found locally (and every package or URL
    /// specifier) goes to the remote resolver, if one is configured.
    pub async fn resolve(&self, specifier: &str, importer: &Path) -> ResolutionOutcome {
        let importer_dir = importer.parent().unwrap_or(Path::new("/"));

        let local_base = match self.aliases.resolve(specifier) {
            Some((rule, path)) => {
                tracing::debug!(
                    "alias {}{} matched {:?} -> {}",
                    rule.alias,
                    if rule.wildcard { "/*" } else { "" },
                    specifier,
                    path.display()
                );
                Some(path)
            }
            None => match classify(specifier, self.repo_root) {
                SpecifierKind::Relative => Some(absolutize(importer_dir, Path::new(specifier))),
                SpecifierKind::Absolute => Some(absolutize(self.cwd, Path::new(specifier))),
                SpecifierKind::Remote | SpecifierKind::BarePackage => None,
            },
        };

        let reason = match &local_base {
            Some(base) => {
                if let Some(found) = find_existing_file(self.reader, base, self.extensions).await {
                    return ResolutionOutcome::Resolved(found);
                }
                format!("no file found for {:?} at {}", specifier, base.display())
            }
            None => format!("Unable to resolve {specifier:?} locally; marking external."),
        };

        match self.remote {
            Some(remote) => self.resolve_remote(remote, specifier, importer, reason).await,
            None => ResolutionOutcome::Unresolved(reason),
        }
    }

    async fn resolve_remote(
        &self,
        remote: &dyn RemoteResolver,
        specifier: &str,
        importer: &Path,
        local_reason: String,
    ) -> ResolutionOutcome {
        let context = RemoteContext {
            importer,
            entry: self.entry,
            repo_root: self.repo_root,
        };

        let Some(target) = remote.resolve(specifier, &context).await else {
            return ResolutionOutcome::Unresolved(format!(
                "{local_reason} Remote resolver returned nothing."
            ));
        };

        if is_remote_specifier(&target) {
            return ResolutionOutcome::Remote(target);
        }

        let path = absolutize(self.repo_root.unwrap_or(self.cwd), Path::new(&target));
        match self.reader.read(&path).await {
            Ok(_) => ResolutionOutcome::Resolved(path),
            Err(e) => ResolutionOutcome::Unresolved(format!(
                "Remote resolver returned {} for {specifier:?}, which could not be read: {e}",
                path.display()
            )),
        }
    }
}

/// Build the ordered candidate list for a path-like specifier:
/// the literal path when it already has an extension, then each extension appended,
/// then `index` + each extension inside the path as a directory.
pub fn candidate_paths(base: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(extensions.len() * 2 + 1);

    if base.extension().is_some() {
        candidates.push(base.to_path_buf());
    }
    for ext in extensions {
        let mut with_ext = OsString::from(base.as_os_str());
        with_ext.push(ext);
        candidates.push(PathBuf::from(with_ext));
    }
    for ext in extensions {
        candidates.push(base.join(format!("index{ext}")));
    }

    candidates
}

/// Return the first candidate that exists as a file.
pub async fn find_existing_file(
    reader: &dyn SourceReader,
    base: &Path,
    extensions: &[String],
) -> Option<PathBuf> {
    for candidate in candidate_paths(base, extensions) {
        if reader.is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::resolver::remote::StaticRemoteResolver;

    fn exts() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    fn resolver<'a>(
        fs: &'a MemoryFileSystem,
        aliases: &'a AliasConfig,
        extensions: &'a [String],
        remote: Option<&'a dyn RemoteResolver>,
    ) -> ImportResolver<'a> {
        ImportResolver {
            reader: fs,
            aliases,
            extensions,
            remote,
            entry: Path::new("/repo/src/a.ts"),
            repo_root: Some(Path::new("/repo")),
            cwd: Path::new("/cwd"),
        }
    }

    #[test]
    fn test_candidate_order() {
        let candidates = candidate_paths(Path::new("/r/button"), &[".ts".into(), ".js".into()]);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/r/button.ts"),
                PathBuf::from("/r/button.js"),
                PathBuf::from("/r/button/index.ts"),
                PathBuf::from("/r/button/index.js"),
            ]
        );
    }

    #[test]
    fn test_candidates_with_extension_try_literal_first() {
        let candidates = candidate_paths(Path::new("/r/button.styles"), &[".ts".into()]);
        assert_eq!(candidates[0], PathBuf::from("/r/button.styles"));
        assert_eq!(candidates[1], PathBuf::from("/r/button.styles.ts"));
    }

    #[tokio::test]
    async fn test_relative_prefers_file_over_directory_index() {
        let fs = MemoryFileSystem::new();
        fs.insert("/repo/src/b.tsx", "");
        fs.insert("/repo/src/b/index.ts", "");
        let aliases = AliasConfig::default();
        let exts = exts();
        let r = resolver(&fs, &aliases, &exts, None);
        assert_eq!(
            r.resolve("./b", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Resolved(PathBuf::from("/repo/src/b.tsx"))
        );
    }

    #[tokio::test]
    async fn test_directory_index_fallback() {
        let fs = MemoryFileSystem::new();
        fs.insert("/repo/lib/index.js", "");
        let aliases = AliasConfig::default();
        let exts = exts();
        let r = resolver(&fs, &aliases, &exts, None);
        assert_eq!(
            r.resolve("../lib", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Resolved(PathBuf::from("/repo/lib/index.js"))
        );
    }

    #[tokio::test]
    async fn test_missing_relative_is_unresolved() {
        let fs = MemoryFileSystem::new();
        let aliases = AliasConfig::default();
        let exts = exts();
        let r = resolver(&fs, &aliases, &exts, None);
        match r.resolve("./nope", Path::new("/repo/src/a.ts")).await {
            ResolutionOutcome::Unresolved(reason) => assert!(reason.contains("./nope")),
            other => panic!("expected Unresolved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_alias_substitution_is_probed() {
        let fs = MemoryFileSystem::new();
        fs.insert("/repo/vendor/lib/x.ts", "");
        let aliases = AliasConfig::from_mapping([("@lib/*", "vendor/lib")], Some(Path::new("/repo")), Path::new("/cwd"));
        let exts = exts();
        let r = resolver(&fs, &aliases, &exts, None);
        assert_eq!(
            r.resolve("@lib/x", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Resolved(PathBuf::from("/repo/vendor/lib/x.ts"))
        );
    }

    #[tokio::test]
    async fn test_bare_package_without_remote_is_external() {
        let fs = MemoryFileSystem::new();
        let aliases = AliasConfig::default();
        let exts = exts();
        let r = resolver(&fs, &aliases, &exts, None);
        assert!(matches!(
            r.resolve("left-pad", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Unresolved(_)
        ));
    }

    #[tokio::test]
    async fn test_remote_url_is_not_read() {
        let fs = MemoryFileSystem::new();
        let aliases = AliasConfig::default();
        let exts = exts();
        let mut remote = StaticRemoteResolver::default();
        remote.insert("lit", "https://esm.sh/lit");
        let r = resolver(&fs, &aliases, &exts, Some(&remote));
        assert_eq!(
            r.resolve("lit", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Remote("https://esm.sh/lit".into())
        );
    }

    #[tokio::test]
    async fn test_remote_local_path_resolves_against_repo_root() {
        let fs = MemoryFileSystem::new();
        fs.insert("/repo/node_modules/lit/index.js", "");
        let aliases = AliasConfig::default();
        let exts = exts();
        let mut remote = StaticRemoteResolver::default();
        remote.insert("lit", "node_modules/lit/index.js");
        remote.insert("ghost", "node_modules/ghost/index.js");
        let r = resolver(&fs, &aliases, &exts, Some(&remote));
        assert_eq!(
            r.resolve("lit", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Resolved(PathBuf::from("/repo/node_modules/lit/index.js"))
        );
        assert!(matches!(
            r.resolve("ghost", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Unresolved(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_local_falls_back_to_remote() {
        let fs = MemoryFileSystem::new();
        let aliases = AliasConfig::default();
        let exts = exts();
        let mut remote = StaticRemoteResolver::default();
        remote.insert("./generated", "https://cdn.example/generated.js");
        let r = resolver(&fs, &aliases, &exts, Some(&remote));
        assert_eq!(
            r.resolve("./generated", Path::new("/repo/src/a.ts")).await,
            ResolutionOutcome::Remote("https://cdn.example/generated.js".into())
        );
    }
}
