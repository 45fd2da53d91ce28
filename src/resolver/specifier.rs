use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// The category of an import specifier, decided from the string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `./x`, `../x`
    Relative,
    /// `/abs/x` (or a path already under the repo root)
    Absolute,
    /// `http://...`, `https://...`
    Remote,
    /// Everything else: `react`, `@scope/pkg/sub`, and alias prefixes such as `@lib/x`
    /// before alias substitution.
    BarePackage,
}

fn remote_pattern() -> &'static Regex {
    static REMOTE: OnceLock<Regex> = OnceLock::new();
    REMOTE.get_or_init(|| Regex::new(r"(?i)^https?://").expect("invalid remote specifier regex"))
}

/// Returns `true` for `http(s)://` URLs, case-insensitively.
pub fn is_remote_specifier(specifier: &str) -> bool {
    remote_pattern().is_match(specifier)
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Classify a specifier. Pure: no I/O, and every string lands in exactly one kind.
///
/// Alias rules are not consulted here; the graph builder substitutes aliases first
/// and classifies the result.
pub fn classify(specifier: &str, repo_root: Option<&Path>) -> SpecifierKind {
    if is_relative_specifier(specifier) {
        return SpecifierKind::Relative;
    }
    if Path::new(specifier).is_absolute() {
        return SpecifierKind::Absolute;
    }
    if is_remote_specifier(specifier) {
        return SpecifierKind::Remote;
    }
    if let Some(root) = repo_root {
        let root = root.to_string_lossy();
        if !root.is_empty() && specifier.starts_with(root.as_ref()) {
            return SpecifierKind::Absolute;
        }
    }
    SpecifierKind::BarePackage
}
