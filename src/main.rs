mod cli;
mod config;
mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use component_graph::fs::absolutize;
use component_graph::{
    AliasConfig, DiskGraphCache, OsFileSystem, ResolveOptions, StaticRemoteResolver,
    collect_external_specifiers, resolve_component_graph, resolve_entry_path,
};

use cli::{Cli, Commands, ResolveArgs};
use config::ComponentGraphConfig;

/// Logs go to stderr; `-v` raises the default level unless RUST_LOG says otherwise.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge CLI flags over `component-graph.toml` into resolution options.
///
/// Returns the options together with the absolute entry path and the repo root used
/// for display.
async fn build_options(entry: &Path, args: &ResolveArgs) -> Result<(ResolveOptions, PathBuf, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to determine the current directory")?;
    let repo_root = args.repo_root.as_deref().map(|root| absolutize(&cwd, root));
    let root = repo_root.clone().unwrap_or_else(|| cwd.clone());
    let config = ComponentGraphConfig::load(&root);

    let extensions = if !args.extensions.is_empty() {
        args.extensions.clone()
    } else {
        config.extensions.clone()
    };

    // CLI aliases come first so they win ties against the config file.
    let supplied = args
        .aliases
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(config.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let aliases = AliasConfig::from_mapping(supplied, repo_root.as_deref(), &cwd);

    let mut options = ResolveOptions::default()
        .with_reader(Arc::new(OsFileSystem))
        .with_cwd(cwd.clone())
        .with_aliases(aliases);
    if let Some(root) = &repo_root {
        options = options.with_repo_root(root.clone());
    }
    if !extensions.is_empty() {
        options = options.with_extensions(extensions);
    }

    let entry_path = resolve_entry_path(entry, repo_root.as_deref(), &cwd);
    if !args.no_discover_aliases && config.discover_aliases() {
        let start_dir = entry_path.parent().unwrap_or(root.as_path()).to_path_buf();
        options = options.with_discovered_aliases(&start_dir).await;
    }

    let mut remote = StaticRemoteResolver::default();
    for (specifier, target) in config.remote.iter().chain(args.remote.iter().map(|(k, v)| (k, v))) {
        remote.insert(specifier.clone(), target.clone());
    }
    if !remote.is_empty() {
        options = options.with_remote_resolver(Arc::new(remote));
    }

    if let Some(dir) = args.cache_dir.as_ref().or(config.cache_dir.as_ref()) {
        let dir = absolutize(&root, dir);
        tracing::debug!("graph cache at {}", dir.display());
        options = options.with_cache(Arc::new(DiskGraphCache::new(dir)));
    }

    Ok((options, entry_path, root))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve {
            entry,
            resolve,
            format,
        } => {
            let (options, entry_path, root) = build_options(&entry, &resolve).await?;
            let graph = resolve_component_graph(&entry_path, &options)
                .await
                .with_context(|| format!("failed to resolve {}", entry.display()))?;
            output::format_graph(&graph, &format, &root);
        }

        Commands::Externals {
            entry,
            resolve,
            preset,
            format,
        } => {
            let (options, entry_path, _root) = build_options(&entry, &resolve).await?;
            let graph = resolve_component_graph(&entry_path, &options)
                .await
                .with_context(|| format!("failed to resolve {}", entry.display()))?;
            let externals = collect_external_specifiers(&graph, &preset);
            output::format_externals(&externals, &format);
        }

        Commands::Aliases { dir, format } => {
            let cwd = std::env::current_dir().context("failed to determine the current directory")?;
            let dir = absolutize(&cwd, &dir);
            let aliases = AliasConfig::discover(&OsFileSystem, &dir).await;
            output::format_aliases(aliases.rules(), &format, &dir);
        }
    }

    Ok(())
}
