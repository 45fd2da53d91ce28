use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use component_graph::{AliasRule, ComponentGraph, ExternalReference, ImportEdge, ResolvedTarget};

use crate::cli::OutputFormat;

/// Path relative to `root` when it lives under it, otherwise as-is.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn edge_kind(edge: &ImportEdge) -> &'static str {
    if edge.is_dynamic { "dynamic" } else { "static" }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error serialising output: {e}"),
    }
}

/// JSON view of a graph: modules in visit order, without source text.
#[derive(Serialize)]
struct GraphJson<'a> {
    entry: &'a Path,
    modules: Vec<ModuleJson<'a>>,
    externals: &'a [ExternalReference],
}

#[derive(Serialize)]
struct ModuleJson<'a> {
    path: &'a Path,
    depth: usize,
    is_entry: bool,
    imports: &'a [ImportEdge],
    warnings: &'a [String],
}

/// Format and print a resolved graph to stdout.
///
/// Compact format: one `mod` line per module in first-visit order, indented by depth,
/// followed by its `->` edges, then one `ext` line per external reference.
/// Warnings go to stderr so stdout stays parseable.
pub fn format_graph(graph: &ComponentGraph, format: &OutputFormat, root: &Path) {
    match format {
        OutputFormat::Compact => {
            for node in graph.modules() {
                let indent = "  ".repeat(node.depth);
                println!("{indent}mod {}", display_path(&node.file_path, root));
                for edge in &node.imports {
                    let target = match &edge.resolved {
                        Some(ResolvedTarget::File(path)) => display_path(path, root),
                        Some(ResolvedTarget::Url(url)) => url.clone(),
                        None => "(external)".to_owned(),
                    };
                    println!("{indent}  -> {} {} {}", edge.specifier, target, edge_kind(edge));
                }
            }
            for ext in &graph.externals {
                println!(
                    "ext {} {}",
                    ext.specifier,
                    display_path(&ext.imported_by, root)
                );
            }
            println!(
                "{} modules, {} imports, {} external references",
                graph.module_count(),
                graph.edge_count(),
                graph.externals.len()
            );
        }

        OutputFormat::Json => {
            let view = GraphJson {
                entry: &graph.entry,
                modules: graph
                    .modules()
                    .map(|node| ModuleJson {
                        path: &node.file_path,
                        depth: node.depth,
                        is_entry: node.is_entry,
                        imports: &node.imports,
                        warnings: &node.warnings,
                    })
                    .collect(),
                externals: &graph.externals,
            };
            print_json(&view);
        }
    }

    for (path, warning) in graph.warnings() {
        eprintln!("warning: {}: {warning}", display_path(path, root));
    }
}

/// Format and print an external specifier set.
pub fn format_externals(externals: &BTreeSet<String>, format: &OutputFormat) {
    match format {
        OutputFormat::Compact => {
            for specifier in externals {
                println!("{specifier}");
            }
        }
        OutputFormat::Json => print_json(externals),
    }
}

/// Format and print alias rules in match order.
pub fn format_aliases(rules: &[AliasRule], format: &OutputFormat, root: &Path) {
    match format {
        OutputFormat::Compact => {
            for rule in rules {
                let alias = if rule.wildcard {
                    format!("{}/*", rule.alias.trim_end_matches('/'))
                } else {
                    rule.alias.clone()
                };
                println!("alias {alias} {}", display_path(&rule.target, root));
            }
            println!("{} alias rules", rules.len());
        }
        OutputFormat::Json => print_json(rules),
    }
}
