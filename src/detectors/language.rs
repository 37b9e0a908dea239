//! detectors/language.rs
//!
//! Grammar selection for JavaScript-family sources.

use std::fmt;
use std::path::Path;

use tree_sitter::Language;

/// The tree-sitter grammar used to read a file.
///
/// TSX is a superset of JavaScript, JSX and most TypeScript, so it is the
/// default. Plain TypeScript files need their own grammar because TSX
/// rejects angle-bracket casts such as `<T>value`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Dialect {
    #[default]
    Tsx,
    TypeScript,
}

/* ============================================================
   Public API
   ============================================================ */

impl Dialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => Dialect::TypeScript,
            _ => Dialect::Tsx,
        }
    }

    pub fn grammar(self) -> Language {
        match self {
            Dialect::Tsx => tree_sitter_typescript::language_tsx(),
            Dialect::TypeScript => tree_sitter_typescript::language_typescript(),
        }
    }
}

/// Test files that sit next to `path` keep its extension; anything that is
/// not recognisably JavaScript-family falls back to `js`.
pub fn test_extension(path: &Path) -> &str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext @ ("js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts")) => ext,
        _ => "js",
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::Tsx => "tsx",
            Dialect::TypeScript => "typescript",
        };
        f.write_str(s)
    }
}
