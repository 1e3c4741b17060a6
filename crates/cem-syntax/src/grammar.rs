//! Supported grammars and their tree-sitter languages.

use std::path::Path;

use tree_sitter::Language;

/// A grammar the toolchain can parse and query.
///
/// TSX is a distinct tree-sitter language but shares the TypeScript query
/// sources; the query manager compiles them separately per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    TypeScript,
    Tsx,
    Javascript,
    Html,
    Css,
}

impl Grammar {
    /// The compiled tree-sitter language for this grammar.
    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Javascript => tree_sitter_javascript::LANGUAGE.into(),
            Self::Html => tree_sitter_html::LANGUAGE.into(),
            Self::Css => tree_sitter_css::LANGUAGE.into(),
        }
    }

    /// Maps a file path to its grammar by extension.
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::Javascript),
            "html" | "htm" => Some(Self::Html),
            "css" => Some(Self::Css),
            _ => None,
        }
    }

    /// The grammar whose bundled query sources this grammar uses.
    pub fn query_source(self) -> Self {
        match self {
            Self::Tsx => Self::TypeScript,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Javascript => "javascript",
            Self::Html => "html",
            Self::Css => "css",
        }
    }

    /// Grammars analyzed as manifest modules.
    pub fn is_script(self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx | Self::Javascript)
    }
}
