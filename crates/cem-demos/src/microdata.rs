//! Microdata extraction from demo HTML.
//!
//! Recognized annotations:
//! - `<meta itemprop="demo-url" content="...">`
//! - `<meta itemprop="demo-for" content="tag-a tag-b">`
//! - `<meta itemprop="description" content="...">`
//! - `<script type="text/markdown" itemprop="description">...</script>`

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use cem_syntax::{run_query, Grammar, ParserPool, QueryManager};

/// The custom-element tag-name production.
pub static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][\w.-]*-[\w.-]*$").expect("tag name pattern"));

/// True when `name` is a well-formed custom-element tag name.
pub fn is_custom_element_tag(name: &str) -> bool {
    TAG_NAME.is_match(name)
}

/// Everything one demo HTML document declares about itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DemoDoc {
    /// Explicit canonical URL from `demo-url` microdata.
    pub demo_url: Option<String>,
    /// Tags claimed via `demo-for` microdata.
    pub demo_for: Vec<String>,
    /// Plain or markdown description.
    pub description: Option<String>,
    /// Custom-element tags appearing in the document content.
    pub content_tags: Vec<String>,
}

impl DemoDoc {
    /// Parses a demo HTML document.
    pub fn parse(pool: &ParserPool, queries: &QueryManager, html: &str) -> Self {
        let mut doc = Self::default();
        let bytes = html.as_bytes();
        let Some(tree) = pool.parse(Grammar::Html, bytes) else {
            return doc;
        };

        let tags_query = queries.get(Grammar::Html, "customElements");
        for hit in run_query(&tags_query, tree.root_node(), bytes) {
            let (Some(name), Some(start_tag)) =
                (hit.text("tag.name", bytes), hit.node("tag.start"))
            else {
                continue;
            };

            if name == "meta" {
                let attrs = attributes_of(start_tag, bytes);
                let itemprop = attrs.iter().find(|(k, _)| k == "itemprop");
                let content = attrs.iter().find(|(k, _)| k == "content");
                if let (Some((_, itemprop)), Some((_, content))) = (itemprop, content) {
                    match itemprop.as_str() {
                        "demo-url" => doc.demo_url = Some(content.clone()),
                        "demo-for" => {
                            doc.demo_for = content
                                .split_whitespace()
                                .map(str::to_string)
                                .collect();
                        }
                        "description" => {
                            doc.description.get_or_insert_with(|| content.clone());
                        }
                        _ => {}
                    }
                }
                continue;
            }

            if is_custom_element_tag(name) && !doc.content_tags.iter().any(|t| t == name) {
                doc.content_tags.push(name.to_string());
            }
        }

        // Markdown descriptions override plain meta content.
        let script_query = queries.get(Grammar::Html, "microdata");
        for hit in run_query(&script_query, tree.root_node(), bytes) {
            let (Some(start_tag), Some(text)) = (
                hit.node("script.start"),
                hit.text("script.text", bytes),
            ) else {
                continue;
            };
            let attrs = attributes_of(start_tag, bytes);
            let is_markdown = attrs
                .iter()
                .any(|(k, v)| k == "type" && v == "text/markdown");
            let is_description = attrs.iter().any(|(k, v)| k == "itemprop" && v == "description");
            if is_markdown && is_description {
                doc.description = Some(unindent(text));
            }
        }

        doc
    }
}

/// `(name, value)` pairs of a start tag, with quotes stripped.
fn attributes_of(start_tag: Node, source: &[u8]) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut cursor = start_tag.walk();
    for child in start_tag.children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let mut name = None;
        let mut value = String::new();
        let mut attr_cursor = child.walk();
        for part in child.children(&mut attr_cursor) {
            match part.kind() {
                "attribute_name" => {
                    name = part.utf8_text(source).ok().map(str::to_string);
                }
                "quoted_attribute_value" | "attribute_value" => {
                    value = part
                        .utf8_text(source)
                        .unwrap_or_default()
                        .trim_matches(['"', '\''])
                        .to_string();
                }
                _ => {}
            }
        }
        if let Some(name) = name {
            attributes.push((name, value));
        }
    }
    attributes
}

/// Strips the common leading indentation of an embedded markdown block.
fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
