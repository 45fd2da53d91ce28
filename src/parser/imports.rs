use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Which syntactic form an import record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    /// ESM static import: `import { X } from './module'` or `import './side-effect'`
    Static,
    /// Re-export with a source: `export { X } from './module'`, `export * from './module'`
    ReExport,
    /// Dynamic import with a string literal: `import('./module')`
    Dynamic,
}

/// One import found in a module's source, before any resolution.
///
/// Binding names are informational only. Dynamic imports and re-exports carry the
/// specifier alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// The module specifier exactly as written, without quotes.
    pub specifier: String,
    pub kind: ImportKind,
    /// `React` in `import React from 'react'`.
    pub default_import: Option<String>,
    /// `path` in `import * as path from 'path'`.
    pub namespace_import: Option<String>,
    /// Local binding names from `import { a, b as c }` (here `a`, `c`).
    pub named_imports: Vec<String>,
}

impl RawImport {
    fn bare(specifier: String, kind: ImportKind) -> Self {
        Self {
            specifier,
            kind,
            default_import: None,
            namespace_import: None,
            named_imports: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helper utilities
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Strip the quotes from a `string` node. Returns `None` for anything else.
fn string_literal_value(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let raw = node_text(node, source);
    if raw.len() < 2 {
        return None;
    }
    Some(raw[1..raw.len() - 1].to_owned())
}

// ---------------------------------------------------------------------------
// Import clause extraction
// ---------------------------------------------------------------------------

/// Fill in binding names from the `import_clause` of an import_statement.
///
/// Handles:
/// - Named: `import { useState, useEffect } from 'react'`
/// - Default: `import React from 'react'`
/// - Namespace: `import * as path from 'path'`
/// - Combined: `import React, { useState } from 'react'`
fn extract_import_clause(clause_node: Node, source: &[u8], record: &mut RawImport) {
    let mut cursor = clause_node.walk();
    for child in clause_node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                record.default_import = Some(node_text(child, source).to_owned());
            }
            "named_imports" => {
                extract_named_imports(child, source, &mut record.named_imports);
            }
            "namespace_import" => {
                record.namespace_import = extract_namespace_import_name(child, source);
            }
            _ => {}
        }
    }
}

/// The identifier of a `namespace_import` node (`* as identifier`) has no field name.
fn extract_namespace_import_name(ns_node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = ns_node.walk();
    for child in ns_node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_owned());
        }
    }
    None
}

/// Collect local binding names from a `named_imports` node.
///
/// In `import { foo as bar }` tree-sitter puts `foo` in the `name` field and `bar` in
/// `alias`; the local binding is `bar`.
fn extract_named_imports(named_imports_node: Node, source: &[u8], names: &mut Vec<String>) {
    let mut cursor = named_imports_node.walk();
    for child in named_imports_node.children(&mut cursor) {
        if child.kind() != "import_specifier" {
            continue;
        }
        let local = child
            .child_by_field_name("alias")
            .or_else(|| child.child_by_field_name("name"));
        if let Some(node) = local {
            names.push(node_text(node, source).to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// Per-node classification
// ---------------------------------------------------------------------------

fn import_from_statement(node: Node, source: &[u8]) -> Option<RawImport> {
    let specifier = string_literal_value(node.child_by_field_name("source")?, source)?;
    let mut record = RawImport::bare(specifier, ImportKind::Static);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "import_clause" {
            extract_import_clause(child, source, &mut record);
        }
    }
    Some(record)
}

fn import_from_reexport(node: Node, source: &[u8]) -> Option<RawImport> {
    let specifier = string_literal_value(node.child_by_field_name("source")?, source)?;
    Some(RawImport::bare(specifier, ImportKind::ReExport))
}

fn import_from_call(node: Node, source: &[u8]) -> Option<RawImport> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "import" {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    let specifier = string_literal_value(first, source)?;
    Some(RawImport::bare(specifier, ImportKind::Dynamic))
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

/// Extract static imports, re-exports and dynamic `import()` calls in document order.
///
/// The walk is a pre-order traversal of the whole tree, so dynamic imports nested
/// inside functions, classes or exported declarations are found too.
pub fn extract_imports(tree: &Tree, source: &[u8]) -> Vec<RawImport> {
    let mut imports = Vec::new();
    let mut cursor = tree.walk();

    loop {
        let node = cursor.node();
        let found = match node.kind() {
            "import_statement" => import_from_statement(node, source),
            "export_statement" => import_from_reexport(node, source),
            "call_expression" => import_from_call(node, source),
            _ => None,
        };
        if let Some(record) = found {
            imports.push(record);
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return imports;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
