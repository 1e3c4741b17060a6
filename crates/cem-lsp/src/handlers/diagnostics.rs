//! Diagnostics handler.
//!
//! Three rules over HTML documents and embedded templates:
//! - unknown custom-element tag within a configured workspace namespace
//! - unknown attribute on a known element
//! - attribute value outside an enumerated `values` set

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp_server::ls_types::{Diagnostic, Range, Uri};

use cem_analyze::{TemplateKind, TemplateRange};
use cem_core::ClassDeclaration;
use cem_syntax::{run_query, Grammar};

use crate::config::DiagnosticsConfig;
use crate::document::{byte_to_position, DocumentLanguage, ServerState};

/// Standard attributes legal on any element.
static GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey", "autocapitalize", "autofocus", "class", "contenteditable", "dir", "draggable",
    "enterkeyhint", "hidden", "id", "inert", "inputmode", "is", "itemid", "itemprop", "itemref",
    "itemscope", "itemtype", "lang", "nonce", "part", "popover", "role", "slot", "spellcheck",
    "style", "tabindex", "title", "translate",
];

static CUSTOM_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][\w.-]*-[\w.-]*$").expect("tag pattern"));

fn is_global_attribute(name: &str) -> bool {
    GLOBAL_ATTRIBUTES.contains(&name)
        || name.starts_with("data-")
        || name.starts_with("aria-")
        || name.starts_with("on")
        // Template-binding sigils from lit-html.
        || name.starts_with('.')
        || name.starts_with('@')
        || name.starts_with('?')
}

pub async fn handle_diagnostics(
    state: Arc<ServerState>,
    uri: &Uri,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    let Some(doc) = state.documents.get(uri) else {
        return Vec::new();
    };

    let mut diagnostics = Vec::new();
    match doc.language {
        DocumentLanguage::Html => {
            scan_fragment(&state, &doc.text, 0, &doc.text, config, &mut diagnostics);
        }
        DocumentLanguage::Script => {
            let templates = state.session.templates_for(&doc.path);
            for template in templates.iter().filter(|t| t.kind == TemplateKind::Html) {
                scan_template(&state, &doc.text, template, config, &mut diagnostics);
            }
        }
    }
    diagnostics
}

fn scan_template(
    state: &ServerState,
    full_text: &str,
    template: &TemplateRange,
    config: &DiagnosticsConfig,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(fragment) = full_text.get(template.start..template.end) else {
        return;
    };
    scan_fragment(state, fragment, template.start, full_text, config, diagnostics);
}

/// Parses a fragment as HTML and applies the three rules to every start
/// tag.
fn scan_fragment(
    state: &ServerState,
    fragment: &str,
    fragment_offset: usize,
    full_text: &str,
    config: &DiagnosticsConfig,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let bytes = fragment.as_bytes();
    let pool = state.session.analyzer().pool();
    let Some(tree) = pool.parse(Grammar::Html, bytes) else {
        return;
    };
    let query = state
        .session
        .analyzer()
        .queries()
        .get(Grammar::Html, "customElements");

    for hit in run_query(&query, tree.root_node(), bytes) {
        let (Some(tag_node), Some(start_tag)) = (hit.node("tag.name"), hit.node("tag.start"))
        else {
            continue;
        };
        let tag = tag_node.utf8_text(bytes).unwrap_or_default();
        if !CUSTOM_TAG.is_match(tag) {
            continue;
        }

        let range = |node: tree_sitter::Node| {
            Range::new(
                byte_to_position(full_text, fragment_offset + node.start_byte()),
                byte_to_position(full_text, fragment_offset + node.end_byte()),
            )
        };

        let Some((_, class)) = state.element_for_tag(tag) else {
            if in_namespace(tag, config) {
                diagnostics.push(Diagnostic {
                    range: range(tag_node),
                    severity: Some(config.unknown_tag_severity),
                    source: Some("cem".into()),
                    code: Some(tower_lsp_server::ls_types::NumberOrString::String(
                        "unknown-tag".into(),
                    )),
                    message: format!("unknown custom element '<{tag}>'"),
                    ..Diagnostic::default()
                });
            }
            continue;
        };

        check_attributes(&class, start_tag, bytes, tag, config, &range, diagnostics);
    }
}

fn check_attributes(
    class: &ClassDeclaration,
    start_tag: tree_sitter::Node,
    bytes: &[u8],
    tag: &str,
    config: &DiagnosticsConfig,
    range: &dyn Fn(tree_sitter::Node) -> Range,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut cursor = start_tag.walk();
    for child in start_tag.children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let mut name_node = None;
        let mut value_node = None;
        let mut attr_cursor = child.walk();
        for part in child.children(&mut attr_cursor) {
            match part.kind() {
                "attribute_name" => name_node = Some(part),
                "quoted_attribute_value" | "attribute_value" => value_node = Some(part),
                _ => {}
            }
        }
        let Some(name_node) = name_node else { continue };
        let name = name_node.utf8_text(bytes).unwrap_or_default();

        // A manifest-declared attribute wins over the global heuristics, so
        // declared names like `open` still get value checking.
        let Some(attribute) = class.attribute(name) else {
            if is_global_attribute(name) {
                continue;
            }
            diagnostics.push(Diagnostic {
                range: range(name_node),
                severity: Some(config.unknown_attribute_severity),
                source: Some("cem".into()),
                code: Some(tower_lsp_server::ls_types::NumberOrString::String(
                    "unknown-attribute".into(),
                )),
                message: format!("'<{tag}>' has no attribute '{name}'"),
                ..Diagnostic::default()
            });
            continue;
        };

        if attribute.values.is_empty() {
            continue;
        }
        let Some(value_node) = value_node else { continue };
        let value = value_node
            .utf8_text(bytes)
            .unwrap_or_default()
            .trim_matches(['"', '\'']);
        // Bound values are evaluated at runtime, not enumerable here.
        if value.contains("${") {
            continue;
        }
        if !attribute.values.iter().any(|allowed| allowed == value) {
            diagnostics.push(Diagnostic {
                range: range(value_node),
                severity: Some(config.invalid_value_severity),
                source: Some("cem".into()),
                code: Some(tower_lsp_server::ls_types::NumberOrString::String(
                    "invalid-attribute-value".into(),
                )),
                message: format!(
                    "'{value}' is not a value of '{name}' (expected one of: {})",
                    attribute.values.join(", ")
                ),
                ..Diagnostic::default()
            });
        }
    }
}

fn in_namespace(tag: &str, config: &DiagnosticsConfig) -> bool {
    config
        .namespaces
        .iter()
        .any(|namespace| tag.starts_with(namespace.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_attribute_recognition() {
        assert!(is_global_attribute("class"));
        assert!(is_global_attribute("data-test"));
        assert!(is_global_attribute("aria-label"));
        assert!(is_global_attribute("onclick"));
        assert!(is_global_attribute(".prop"));
        assert!(is_global_attribute("@click"));
        assert!(!is_global_attribute("variant"));
    }

    #[test]
    fn namespace_scoping() {
        let config = DiagnosticsConfig {
            namespaces: vec!["rh-".into()],
            ..DiagnosticsConfig::default()
        };
        assert!(in_namespace("rh-button", &config));
        assert!(!in_namespace("pf-button", &config));
        assert!(!in_namespace("rh-button", &DiagnosticsConfig::default()));
    }
}
