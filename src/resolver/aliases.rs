use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fs::{SourceReader, absolutize};

use super::tsconfig;

/// One path-alias mapping: `@lib/*` → `<abs>/vendor/lib`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    /// Prefix without the trailing `/*` marker.
    pub alias: String,
    /// Absolute target directory (or file, for exact rules).
    pub target: PathBuf,
    /// Whether the configured key ended in `/*`, allowing `alias/rest` → `target/rest`.
    pub wildcard: bool,
}

impl AliasRule {
    /// Substitute this rule into `specifier`, or `None` if it does not match.
    ///
    /// Exact rules match only the identical string. Wildcard rules match the identical
    /// string (→ target) or `alias/rest` (→ `target/rest`).
    pub fn apply(&self, specifier: &str) -> Option<PathBuf> {
        if specifier == self.alias {
            return Some(self.target.clone());
        }
        if !self.wildcard {
            return None;
        }
        let rest = if self.alias.ends_with('/') {
            specifier.strip_prefix(self.alias.as_str())?
        } else {
            specifier
                .strip_prefix(self.alias.as_str())?
                .strip_prefix('/')?
        };
        let rest = rest.trim_start_matches(['/', '\\']);
        if rest.is_empty() {
            Some(self.target.clone())
        } else {
            Some(absolutize(&self.target, Path::new(rest)))
        }
    }
}

/// An ordered, de-duplicated list of alias rules, owned by the caller and passed into
/// each resolution call.
///
/// Order: longer alias first; on equal length, exact rules before wildcard rules;
/// otherwise discovery order. The first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    rules: Vec<AliasRule>,
}

impl AliasConfig {
    /// Build from rules in discovery order, applying dedup and precedence sorting.
    pub fn from_rules(rules: impl IntoIterator<Item = AliasRule>) -> Self {
        let mut seen: HashSet<(String, bool, PathBuf)> = HashSet::new();
        let mut unique: Vec<AliasRule> = rules
            .into_iter()
            .filter(|r| seen.insert((r.alias.clone(), r.wildcard, r.target.clone())))
            .collect();

        // Stable sort: equal keys keep discovery order, so the closer config wins.
        unique.sort_by(|a, b| {
            b.alias
                .len()
                .cmp(&a.alias.len())
                .then(a.wildcard.cmp(&b.wildcard))
        });
        Self { rules: unique }
    }

    /// Build from a caller-supplied `alias → target` mapping.
    ///
    /// `key` yields an exact rule and a prefix rule for `key/...`; `key/*` yields only the
    /// prefix rule. Relative targets resolve against `repo_root` when given, else `cwd`.
    pub fn from_mapping<'a>(
        mapping: impl IntoIterator<Item = (&'a str, &'a str)>,
        repo_root: Option<&Path>,
        cwd: &Path,
    ) -> Self {
        let base = repo_root.unwrap_or(cwd);
        let mut rules = Vec::new();
        for (key, target) in mapping {
            let target_base = target.strip_suffix("/*").unwrap_or(target);
            let target = absolutize(base, Path::new(target_base));
            match key.strip_suffix("/*") {
                Some(prefix) => rules.push(AliasRule {
                    alias: prefix.to_owned(),
                    target,
                    wildcard: true,
                }),
                None => {
                    let prefix = key.trim_end_matches('/');
                    rules.push(AliasRule {
                        alias: key.to_owned(),
                        target: target.clone(),
                        wildcard: false,
                    });
                    rules.push(AliasRule {
                        alias: prefix.to_owned(),
                        target,
                        wildcard: true,
                    });
                }
            }
        }
        Self::from_rules(rules)
    }

    /// Walk upward from `start_dir` collecting rules from every recognised config file.
    ///
    /// See [`tsconfig::collect_alias_rules`] for the walk itself.
    pub async fn discover(reader: &dyn SourceReader, start_dir: &Path) -> Self {
        Self::from_rules(tsconfig::collect_alias_rules(reader, start_dir).await)
    }

    /// Combine two configs. Rules of `self` come first in discovery order, so they win
    /// exact-duplicate ties against `other`.
    pub fn merge(self, other: AliasConfig) -> Self {
        Self::from_rules(self.rules.into_iter().chain(other.rules))
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the first matching rule to `specifier`.
    pub fn resolve(&self, specifier: &str) -> Option<(&AliasRule, PathBuf)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(specifier).map(|path| (rule, path)))
    }
}
