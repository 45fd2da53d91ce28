use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILENAME: &str = "component-graph.toml";

/// Configuration loaded from `component-graph.toml` at the repo root.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ComponentGraphConfig {
    /// Extensions probed in order. Empty means the built-in list.
    pub extensions: Vec<String>,
    /// Pre-supplied `alias -> target` mapping, merged before discovered rules.
    pub aliases: BTreeMap<String, String>,
    /// Walk up for tsconfig/jsconfig files. Absent means true.
    pub discover_aliases: Option<bool>,
    /// Fixed `specifier -> path or URL` answers for the remote hook.
    pub remote: BTreeMap<String, String>,
    /// Enables the on-disk graph cache. Relative paths resolve against the repo root.
    pub cache_dir: Option<PathBuf>,
}

impl ComponentGraphConfig {
    /// Load configuration from `component-graph.toml` in the given root directory.
    ///
    /// Returns a default configuration if the file does not exist, and logs a warning
    /// before falling back to defaults if it cannot be read or parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("failed to parse {CONFIG_FILENAME}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("failed to read {CONFIG_FILENAME}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn discover_aliases(&self) -> bool {
        self.discover_aliases.unwrap_or(true)
    }
}
