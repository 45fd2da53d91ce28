use std::collections::HashSet;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use serde::Deserialize;
use serde_json::Value;

use crate::fs::{SourceReader, absolutize, normalize_path};

use super::aliases::AliasRule;

/// Config filenames looked for in every directory of the upward walk, in this order.
pub const CONFIG_FILENAMES: &[&str] = &["tsconfig.json", "tsconfig.base.json", "jsconfig.json"];

/// The subset of a tsconfig/jsconfig file the alias loader reads.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    compiler_options: Option<CompilerOptions>,
    /// Only string values are followed; TypeScript 5 array form is ignored.
    extends: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct CompilerOptions {
    paths: Option<serde_json::Map<String, Value>>,
}

/// Walk from `start_dir` up to the filesystem root and collect alias rules from every
/// recognised config file, following each file's `extends` chain before moving up.
///
/// Rules come back in discovery order, not yet de-duplicated or sorted. A config file is
/// processed at most once per walk, which also breaks circular `extends` chains.
pub async fn collect_alias_rules(reader: &dyn SourceReader, start_dir: &Path) -> Vec<AliasRule> {
    let mut collected = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    for dir in start_dir.ancestors() {
        for file_name in CONFIG_FILENAMES {
            let candidate = dir.join(file_name);
            if reader.is_file(&candidate).await {
                collect_config_chain(reader, candidate, &mut collected, &mut visited).await;
            }
        }
    }

    collected
}

/// Process one config file and then each file its `extends` chain names.
async fn collect_config_chain(
    reader: &dyn SourceReader,
    config_path: PathBuf,
    collected: &mut Vec<AliasRule>,
    visited: &mut HashSet<PathBuf>,
) {
    let mut next = Some(config_path);

    while let Some(path) = next.take() {
        let path = normalize_path(&path);
        if !visited.insert(path.clone()) {
            tracing::debug!("alias config {} already visited", path.display());
            return;
        }

        let Some(config) = read_config_file(reader, &path).await else {
            return;
        };
        let config_dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();

        if let Some(paths) = config.compiler_options.and_then(|c| c.paths) {
            collected.extend(rules_from_paths(&paths, &config_dir));
        }

        if let Some(Value::String(extends)) = config.extends {
            next = resolve_extends_path(reader, &extends, &config_dir).await;
            if next.is_none() {
                tracing::debug!(
                    "alias config {} extends {:?}, which was not found",
                    path.display(),
                    extends
                );
            }
        }
    }
}

/// Convert a `compilerOptions.paths` object into rules.
///
/// For an array of targets only the first string target is used.
fn rules_from_paths(paths: &serde_json::Map<String, Value>, config_dir: &Path) -> Vec<AliasRule> {
    let mut rules = Vec::new();
    for (key, value) in paths {
        let target = match value {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        };
        let Some(target) = target else {
            continue;
        };

        let wildcard = key.ends_with("/*");
        let alias = key.strip_suffix("/*").unwrap_or(key);
        let target_base = target.strip_suffix("/*").unwrap_or(target);

        rules.push(AliasRule {
            alias: alias.to_owned(),
            target: absolutize(config_dir, Path::new(target_base)),
            wildcard,
        });
    }
    rules
}

/// Read and parse a config file. Unreadable or malformed files yield `None`.
async fn read_config_file(reader: &dyn SourceReader, path: &Path) -> Option<ConfigFile> {
    let content = match reader.read(path).await {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("skipping alias config {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str::<ConfigFile>(&strip_jsonc(&content)) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::debug!("skipping malformed alias config {}: {e}", path.display());
            None
        }
    }
}

/// Resolve an `extends` value relative to the config's directory, trying the value as
/// written and then with `.json` appended.
async fn resolve_extends_path(
    reader: &dyn SourceReader,
    extends: &str,
    base_dir: &Path,
) -> Option<PathBuf> {
    let normalized = absolutize(base_dir, Path::new(extends));
    let mut candidates = vec![normalized.clone()];
    if !extends.ends_with(".json") {
        let mut with_json = normalized.into_os_string();
        with_json.push(".json");
        candidates.push(PathBuf::from(with_json));
    }

    for candidate in candidates {
        if reader.is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Strip `//` and `/* */` comments and trailing commas, leaving string literals intact.
///
/// TypeScript tooling accepts both in config files; `serde_json` accepts neither.
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                out.push('"');
                while let Some(c) = chars.next() {
                    out.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ',' => {
                // Drop the comma when only whitespace/comments separate it from a closer.
                if !matches!(next_significant(chars.clone()), Some('}') | Some(']')) {
                    out.push(',');
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

/// The next character that is neither whitespace nor inside a comment.
fn next_significant(mut chars: Peekable<Chars<'_>>) -> Option<char> {
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => {
                chars.find(|&c| c == '\n')?;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            other => return Some(other),
        }
    }
    None
}
