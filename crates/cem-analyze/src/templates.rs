//! Tagged-template-literal indexing.
//!
//! Records the byte ranges of every `html`/`css` tagged template in a
//! module. The LSP session uses this index to dispatch cursor positions
//! inside templates to the embedded HTML language service.

use tree_sitter::Tree;

use cem_syntax::{run_query, Grammar, QueryManager};

use crate::imports::ImportMap;

/// Module specifiers whose `html`/`css` exports we recognize as template
/// tags. Bare (un-imported) tags of the same names are accepted too.
const RECOGNIZED_TAG_SOURCES: &[&str] = &["lit", "lit-html", "lit-element"];

fn is_recognized_source(specifier: &str) -> bool {
    RECOGNIZED_TAG_SOURCES.contains(&specifier)
        || specifier.starts_with("@lit/")
        || specifier.starts_with("@lit-labs/")
        || specifier.starts_with("lit/")
        || specifier.starts_with("lit-html/")
}

/// Embedded language of a tagged template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Html,
    Css,
}

/// Byte range and starting position of one tagged template's content
/// (between, not including, the backticks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRange {
    pub kind: TemplateKind,
    /// Content start, bytes into the module source.
    pub start: usize,
    /// Content end (exclusive).
    pub end: usize,
    /// Zero-based line of the content start.
    pub start_row: usize,
    /// Zero-based byte column of the content start.
    pub start_column: usize,
}

impl TemplateRange {
    /// True when a byte offset falls inside the template content.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// Scans a parsed module for recognized tagged templates.
pub fn extract_templates(
    queries: &QueryManager,
    grammar: Grammar,
    tree: &Tree,
    source: &[u8],
    imports: &ImportMap,
) -> Vec<TemplateRange> {
    let query = queries.get(grammar, "taggedTemplates");
    let mut templates = Vec::new();

    for hit in run_query(&query, tree.root_node(), source) {
        let Some(tag) = hit.text("template.tag", source) else {
            continue;
        };
        let kind = match tag {
            "html" => TemplateKind::Html,
            "css" => TemplateKind::Css,
            _ => continue,
        };
        // Imported under the same name from an unrelated package: not a
        // template tag we understand.
        if let Some(import) = imports.get(tag) {
            if !is_recognized_source(&import.specifier) {
                continue;
            }
        }
        let Some(body) = hit.node("template.body") else {
            continue;
        };

        // The template_string node spans the backticks; content is inside.
        let start = body.start_byte() + 1;
        let end = body.end_byte().saturating_sub(1);
        if end < start {
            continue;
        }
        let start_point = body.start_position();
        templates.push(TemplateRange {
            kind,
            start,
            end,
            start_row: start_point.row,
            start_column: start_point.column + 1,
        });
    }

    templates.sort_by_key(|t| t.start);
    templates
}

/// Finds the template containing a byte offset.
pub fn template_at(templates: &[TemplateRange], offset: usize) -> Option<&TemplateRange> {
    templates.iter().find(|t| t.contains(offset))
}
