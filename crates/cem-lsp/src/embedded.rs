//! Embedded-language cursor resolution.
//!
//! A position in a TS/JS document may fall inside an `html` tagged
//! template. The template's byte range comes from the module's secondary
//! index; the template body is reparsed as HTML and the outer position is
//! translated to an inner offset so hover, completion, and references can
//! dispatch against it as if it were an HTML document.

use tower_lsp_server::ls_types::Position;

use cem_analyze::{template_at, TemplateKind, TemplateRange};
use cem_syntax::{Grammar, ParserPool};

use crate::document::position_to_byte;

/// An HTML fragment with a cursor offset inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedHtml {
    pub html: String,
    pub offset: usize,
    /// Byte offset of the fragment start within the outer document, for
    /// mapping inner positions back out.
    pub document_offset: usize,
}

/// Resolves a position in a script document to the embedded HTML template
/// containing it, if any.
pub fn embedded_html_at(
    text: &str,
    templates: &[TemplateRange],
    position: Position,
) -> Option<EmbeddedHtml> {
    let byte = position_to_byte(text, position);
    let template = template_at(templates, byte)?;
    if template.kind != TemplateKind::Html {
        return None;
    }
    let html = text.get(template.start..template.end)?.to_string();
    Some(EmbeddedHtml {
        html,
        offset: byte - template.start,
        document_offset: template.start,
    })
}

/// What the cursor is on inside an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlTarget {
    /// On a tag name (opening, closing, or self-closing).
    Tag { tag: String },
    /// On an attribute name inside a start tag.
    Attribute { tag: String, attribute: String },
    /// Inside an attribute value.
    Value {
        tag: String,
        attribute: String,
        value: String,
    },
}

/// Tree-based classification of the node under a cursor, for hover.
pub fn html_target_at(pool: &ParserPool, html: &str, offset: usize) -> Option<HtmlTarget> {
    let bytes = html.as_bytes();
    let tree = pool.parse(Grammar::Html, bytes)?;
    let node = tree
        .root_node()
        .descendant_for_byte_range(offset, offset)?;

    match node.kind() {
        "tag_name" => Some(HtmlTarget::Tag {
            tag: node.utf8_text(bytes).ok()?.to_string(),
        }),
        "attribute_name" => {
            let tag = enclosing_tag_name(node, bytes)?;
            Some(HtmlTarget::Attribute {
                tag,
                attribute: node.utf8_text(bytes).ok()?.to_string(),
            })
        }
        "attribute_value" | "quoted_attribute_value" => {
            let attribute_node = ancestor_of_kind(node, "attribute")?;
            let mut cursor = attribute_node.walk();
            let attribute = attribute_node
                .children(&mut cursor)
                .find(|c| c.kind() == "attribute_name")
                .and_then(|c| c.utf8_text(bytes).ok())?
                .to_string();
            let tag = enclosing_tag_name(node, bytes)?;
            Some(HtmlTarget::Value {
                tag,
                attribute,
                value: node
                    .utf8_text(bytes)
                    .ok()?
                    .trim_matches(['"', '\''])
                    .to_string(),
            })
        }
        _ => None,
    }
}

fn ancestor_of_kind<'t>(
    node: tree_sitter::Node<'t>,
    kind: &str,
) -> Option<tree_sitter::Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

fn enclosing_tag_name(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let start_tag = ancestor_of_kind(node, "start_tag")
        .or_else(|| ancestor_of_kind(node, "self_closing_tag"))?;
    let mut cursor = start_tag.walk();
    start_tag
        .children(&mut cursor)
        .find(|c| c.kind() == "tag_name")
        .and_then(|c| c.utf8_text(source).ok())
        .map(str::to_string)
}

/// Where completion was requested inside an HTML fragment.
///
/// Text-based rather than tree-based: mid-typing fragments rarely parse,
/// and completion must work exactly then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Right after `<`, possibly mid-way through a tag name.
    TagName { prefix: String },
    /// Inside a start tag, typing an attribute name.
    AttributeName { tag: String, prefix: String },
    /// Inside an attribute value's quotes.
    AttributeValue { tag: String, attribute: String },
}

/// Classifies the completion context at `offset`.
pub fn completion_context(html: &str, offset: usize) -> Option<CompletionContext> {
    let before = html.get(..offset)?;
    let open = before.rfind('<')?;
    let tag_text = &before[open + 1..];
    if tag_text.contains('>') {
        // The last tag is already closed; we are in text content.
        return None;
    }
    if tag_text.starts_with('/') {
        return Some(CompletionContext::TagName {
            prefix: tag_text[1..].to_string(),
        });
    }

    // Still inside the tag name: no whitespace yet.
    let Some(name_end) = tag_text.find(char::is_whitespace) else {
        return Some(CompletionContext::TagName {
            prefix: tag_text.to_string(),
        });
    };
    let tag = tag_text[..name_end].to_string();
    let rest = &tag_text[name_end..];

    // Count unescaped quotes to decide whether we are inside a value.
    let mut quote: Option<char> = None;
    let mut attribute = String::new();
    let mut current_token = String::new();
    for c in rest.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                    current_token.clear();
                }
            }
            None => match c {
                '"' | '\'' => {
                    attribute = current_token
                        .trim_end_matches('=')
                        .trim()
                        .to_string();
                    quote = Some(c);
                }
                c if c.is_whitespace() => current_token.clear(),
                _ => current_token.push(c),
            },
        }
    }

    if quote.is_some() {
        return Some(CompletionContext::AttributeValue { tag, attribute });
    }
    Some(CompletionContext::AttributeName {
        tag,
        prefix: current_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool() -> ParserPool {
        ParserPool::new()
    }

    #[test]
    fn target_on_tag_name() {
        let html = "<my-button variant=\"primary\"></my-button>";
        let offset = html.find("my-button").unwrap() + 2;
        assert_eq!(
            html_target_at(&pool(), html, offset),
            Some(HtmlTarget::Tag {
                tag: "my-button".into()
            })
        );
    }

    #[test]
    fn target_on_attribute_name() {
        let html = "<my-button variant=\"primary\"></my-button>";
        let offset = html.find("variant").unwrap() + 3;
        assert_eq!(
            html_target_at(&pool(), html, offset),
            Some(HtmlTarget::Attribute {
                tag: "my-button".into(),
                attribute: "variant".into()
            })
        );
    }

    #[test]
    fn target_in_attribute_value() {
        let html = "<my-button variant=\"primary\"></my-button>";
        let offset = html.find("primary").unwrap() + 2;
        assert_eq!(
            html_target_at(&pool(), html, offset),
            Some(HtmlTarget::Value {
                tag: "my-button".into(),
                attribute: "variant".into(),
                value: "primary".into()
            })
        );
    }

    #[test]
    fn embedded_position_translation() {
        let text = "import { html } from 'lit';\nconst t = html`<my-button variant=\"primary\"></my-button>`;\n";
        let templates = vec![TemplateRange {
            kind: TemplateKind::Html,
            start: text.find('`').unwrap() + 1,
            end: text.rfind('`').unwrap(),
            start_row: 1,
            start_column: text.lines().nth(1).unwrap().find('`').unwrap() + 1,
        }];

        // Cursor on `variant` in line 1.
        let character = text.lines().nth(1).unwrap().find("variant").unwrap() as u32;
        let embedded =
            embedded_html_at(text, &templates, Position::new(1, character + 2)).unwrap();
        assert!(embedded.html.starts_with("<my-button"));
        let target = html_target_at(&pool(), &embedded.html, embedded.offset);
        assert_eq!(
            target,
            Some(HtmlTarget::Attribute {
                tag: "my-button".into(),
                attribute: "variant".into()
            })
        );
    }

    #[test]
    fn position_outside_templates_is_none() {
        let text = "const x = 1;\nconst t = html`<a-b></a-b>`;";
        let templates = vec![TemplateRange {
            kind: TemplateKind::Html,
            start: text.find('`').unwrap() + 1,
            end: text.rfind('`').unwrap(),
            start_row: 1,
            start_column: 15,
        }];
        assert!(embedded_html_at(text, &templates, Position::new(0, 3)).is_none());
    }

    #[test]
    fn completion_tag_start() {
        assert_eq!(
            completion_context("<div><my-", 9),
            Some(CompletionContext::TagName {
                prefix: "my-".into()
            })
        );
        assert_eq!(
            completion_context("<", 1),
            Some(CompletionContext::TagName { prefix: String::new() })
        );
    }

    #[test]
    fn completion_attribute_name() {
        let html = "<my-button var";
        assert_eq!(
            completion_context(html, html.len()),
            Some(CompletionContext::AttributeName {
                tag: "my-button".into(),
                prefix: "var".into()
            })
        );
    }

    #[test]
    fn completion_attribute_value() {
        let html = "<my-button variant=\"pri";
        assert_eq!(
            completion_context(html, html.len()),
            Some(CompletionContext::AttributeValue {
                tag: "my-button".into(),
                attribute: "variant".into()
            })
        );
    }

    #[test]
    fn completion_outside_tag_is_none() {
        let html = "<my-button></my-button> text";
        assert_eq!(completion_context(html, html.len()), None);
    }

    #[test]
    fn completion_after_closed_attribute_value() {
        let html = "<my-button variant=\"primary\" dis";
        assert_eq!(
            completion_context(html, html.len()),
            Some(CompletionContext::AttributeName {
                tag: "my-button".into(),
                prefix: "dis".into()
            })
        );
    }
}
