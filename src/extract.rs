//! Single-declaration extraction shared by the site build and the on-demand
//! source view, so both always cut and tag text the same way.

use crate::highlight::{HighlightedToken, Highlighter};
use crate::scanner::{Declaration, Scanner, SourceFile};
use serde::Serialize;

/// A declaration looked up by name in raw text, with its highlighted body.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub declaration: Option<Declaration>,
    /// Empty when the declaration was not found.
    pub tokens: Vec<HighlightedToken>,
}

impl Extraction {
    pub fn is_found(&self) -> bool {
        self.declaration.is_some()
    }
}

/// Scans `raw` as the file at `path` and extracts the declaration called `name`.
///
/// The whole file is scanned so that declaration boundaries match the ones
/// a full build would produce. If the name occurs more than once the last
/// declaration wins, as it does in dependency resolution and in the build
/// report.
pub fn extract(raw: &str, path: &str, name: &str, highlighter: &Highlighter<'_>) -> Extraction {
    let file = SourceFile::new(path, raw);
    let declaration = Scanner::new(&file)
        .scan()
        .into_iter()
        .rev()
        .find(|declaration| declaration.name == name);

    let tokens = declaration
        .as_ref()
        .map(|declaration| highlight_declaration(declaration, highlighter))
        .unwrap_or_default();

    Extraction {
        declaration,
        tokens,
    }
}

/// Highlights the full body of an already extracted declaration.
pub fn highlight_declaration(
    declaration: &Declaration,
    highlighter: &Highlighter<'_>,
) -> Vec<HighlightedToken> {
    highlighter.highlight(&declaration.body_text)
}
