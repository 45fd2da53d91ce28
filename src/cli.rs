use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Resolve the transitive import graph of a TypeScript/JavaScript component.
///
/// component-graph follows static imports, re-exports and literal dynamic imports from an
/// entry file, applying tsconfig path aliases, and reports every local module reached
/// plus the imports that stay external.
#[derive(Parser, Debug)]
#[command(
    name = "component-graph",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log every resolution decision to stderr (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Compact one-line-per-result format (default).
    #[default]
    Compact,
    /// Structured JSON suitable for programmatic consumption.
    Json,
}

/// Flags shared by every command that runs a resolution.
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Repository root: base for non-relative entry paths, aliases and remote paths.
    /// Also where `component-graph.toml` is looked up (defaults to the current directory).
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// Extra path alias, e.g. `--alias @ui=src/ui`. Repeatable; wins over discovered aliases.
    #[arg(long = "alias", value_name = "ALIAS=TARGET", value_parser = parse_key_value)]
    pub aliases: Vec<(String, String)>,

    /// Fixed answer for the remote hook, e.g. `--remote lit=https://esm.sh/lit`. Repeatable.
    #[arg(long = "remote", value_name = "SPECIFIER=TARGET", value_parser = parse_key_value)]
    pub remote: Vec<(String, String)>,

    /// Do not read tsconfig.json / jsconfig.json files for path aliases.
    #[arg(long)]
    pub no_discover_aliases: bool,

    /// Cache resolved graphs on disk, keyed by the entry file's content hash.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Extension probed for extensionless specifiers (repeatable, in order, e.g. `--ext .ts`).
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the component graph reachable from an entry file and print it.
    Resolve {
        /// Entry module (absolute, `./relative` to the cwd, or relative to --repo-root).
        entry: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Print the specifiers a bundler should leave unbundled for an entry file.
    Externals {
        /// Entry module.
        entry: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Specifier always treated as external (repeatable).
        #[arg(long = "preset", value_name = "SPECIFIER")]
        preset: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Print the alias rules discovered from tsconfig/jsconfig files above a directory.
    Aliases {
        /// Directory the upward walk starts from.
        dir: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}

/// Parse `KEY=VALUE`, splitting on the first `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("lit=https://esm.sh/lit?a=b"),
            Ok(("lit".to_owned(), "https://esm.sh/lit?a=b".to_owned()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_cli_parses_repeatable_flags() {
        let cli = Cli::parse_from([
            "component-graph",
            "externals",
            "src/a.ts",
            "--alias",
            "@ui=src/ui",
            "--preset",
            "react",
            "--preset",
            "react-dom",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Externals { resolve, preset, .. } => {
                assert_eq!(resolve.aliases, vec![("@ui".to_owned(), "src/ui".to_owned())]);
                assert_eq!(preset, vec!["react", "react-dom"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
