use tree_sitter::Language;

/// Return the tree-sitter [`Language`] for the given file extension, or `None` if the extension
/// is not a script module we scan for imports.
///
/// # Grammar selection rules
/// - `.ts`/`.mts`/`.cts` -> TypeScript grammar (`LANGUAGE_TYPESCRIPT`)
/// - `.tsx`              -> TSX grammar        (`LANGUAGE_TSX`)
///   These MUST be different: the TypeScript grammar cannot parse JSX, and the TSX grammar
///   breaks angle-bracket type assertions (`<T>expr`).
/// - `.js`/`.jsx`/`.mjs`/`.cjs` -> JavaScript grammar (`LANGUAGE`), which accepts JSX.
pub fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        "ts" | "mts" | "cts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "js" | "jsx" | "mjs" | "cjs" => Some(tree_sitter_javascript::LANGUAGE.into()),
        _ => None,
    }
}
