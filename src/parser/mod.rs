pub mod imports;
pub mod languages;

use std::cell::RefCell;
use std::path::Path;

use tree_sitter::{Parser, Tree};

use crate::error::ExtractError;

use imports::extract_imports;
pub use imports::{ImportKind, RawImport};
use languages::language_for_extension;

// Thread-local Parser instances, one per grammar. Each is initialised lazily on first use.
thread_local! {
    static PARSER_TS: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static PARSER_TSX: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static PARSER_JS: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// Import records extracted from one module, plus any non-fatal diagnostics.
#[derive(Debug, Default)]
pub struct ExtractedImports {
    pub imports: Vec<RawImport>,
    /// e.g. "syntax errors found; import list may be incomplete".
    pub warnings: Vec<String>,
}

/// Turns module source text into raw import records.
///
/// The graph builder depends only on this capability, never on a syntax-tree shape.
pub trait ImportExtractor: Send + Sync {
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports, ExtractError>;
}

/// The default extractor: tree-sitter TypeScript / TSX / JavaScript grammars.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterExtractor;

impl TreeSitterExtractor {
    fn parse(path: &Path, ext: &str, source: &[u8]) -> Result<Tree, ExtractError> {
        let slot = match ext {
            "ts" | "mts" | "cts" => &PARSER_TS,
            "tsx" => &PARSER_TSX,
            "js" | "jsx" | "mjs" | "cjs" => &PARSER_JS,
            _ => return Err(ExtractError::Unsupported(ext.to_owned())),
        };
        let language =
            language_for_extension(ext).ok_or_else(|| ExtractError::Unsupported(ext.to_owned()))?;

        slot.with(|cell| {
            let mut guard = cell.borrow_mut();
            if guard.is_none() {
                let mut parser = Parser::new();
                parser
                    .set_language(&language)
                    .map_err(|e| ExtractError::Grammar(e.to_string()))?;
                *guard = Some(parser);
            }
            guard
                .as_mut()
                .and_then(|parser| parser.parse(source, None))
                .ok_or_else(|| ExtractError::NoTree(path.to_path_buf()))
        })
    }
}

impl ImportExtractor for TreeSitterExtractor {
    /// # Errors
    /// Returns an error if:
    /// - The file extension is not a script module (`.css`, `.json`, ...)
    /// - `tree-sitter` returns `None` (parser could not produce any tree)
    ///
    /// Recoverable syntax errors do not fail extraction: whatever imports the error-
    /// recovering tree still contains are returned with a warning.
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports, ExtractError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let tree = Self::parse(path, ext, source.as_bytes())?;

        let imports = extract_imports(&tree, source.as_bytes());
        let mut warnings = Vec::new();
        if tree.root_node().has_error() {
            warnings.push(format!(
                "syntax errors in {}; import list may be incomplete",
                path.display()
            ));
        }

        Ok(ExtractedImports { imports, warnings })
    }
}
