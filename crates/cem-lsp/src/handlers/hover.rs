//! Hover handler.
//!
//! Renders a markdown block for the manifest entity under the cursor: a
//! custom-element tag, an attribute name, or an attribute value.

use std::sync::Arc;

use tower_lsp_server::ls_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use cem_core::{Attribute, ClassDeclaration, Deprecation};

use crate::document::{position_to_byte, DocumentLanguage, ServerState};
use crate::embedded::{embedded_html_at, html_target_at, HtmlTarget};

pub async fn handle_hover(state: Arc<ServerState>, params: HoverParams) -> Option<Hover> {
    let uri = &params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    let doc = state.documents.get(uri)?;
    let target = match doc.language {
        DocumentLanguage::Html => {
            let offset = position_to_byte(&doc.text, position);
            html_target_at(state.session.analyzer().pool(), &doc.text, offset)?
        }
        DocumentLanguage::Script => {
            let templates = state.session.templates_for(&doc.path);
            let embedded = embedded_html_at(&doc.text, &templates, position)?;
            html_target_at(state.session.analyzer().pool(), &embedded.html, embedded.offset)?
        }
    };
    drop(doc);

    let markdown = match &target {
        HtmlTarget::Tag { tag } => {
            let (module, class) = state.element_for_tag(tag)?;
            render_element(tag, &module.path, &class)
        }
        HtmlTarget::Attribute { tag, attribute } => {
            let (_, class) = state.element_for_tag(tag)?;
            render_attribute(tag, class.attribute(attribute)?)
        }
        HtmlTarget::Value {
            tag,
            attribute,
            value,
        } => {
            let (_, class) = state.element_for_tag(tag)?;
            render_value(class.attribute(attribute)?, value)
        }
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: None,
    })
}

fn render_element(tag: &str, module_path: &str, class: &ClassDeclaration) -> String {
    let mut markdown = format!("# `<{tag}>`\n\n");

    if let Some(deprecated) = &class.deprecated {
        markdown.push_str(&deprecation_line(deprecated));
    }
    if let Some(summary) = &class.summary {
        markdown.push_str(summary);
        markdown.push_str("\n\n");
    }
    if let Some(description) = &class.description {
        markdown.push_str(description);
        markdown.push_str("\n\n");
    }

    if !class.attributes.is_empty() {
        markdown.push_str("**Attributes**:\n");
        for attribute in &class.attributes {
            match &attribute.type_text {
                Some(type_text) => markdown
                    .push_str(&format!("- `{}`: `{}`\n", attribute.name, type_text)),
                None => markdown.push_str(&format!("- `{}`\n", attribute.name)),
            }
        }
        markdown.push('\n');
    }
    if !class.slots.is_empty() {
        markdown.push_str("**Slots**:\n");
        for slot in &class.slots {
            let name = if slot.name.is_empty() { "(default)" } else { &slot.name };
            markdown.push_str(&format!("- `{name}`\n"));
        }
        markdown.push('\n');
    }

    markdown.push_str(&format!("*Declared in `{module_path}`*\n"));
    markdown
}

fn render_attribute(tag: &str, attribute: &Attribute) -> String {
    let mut markdown = format!("## `{}`\n\n", attribute.name);

    if let Some(deprecated) = &attribute.deprecated {
        markdown.push_str(&deprecation_line(deprecated));
    }
    if let Some(description) = &attribute.description {
        markdown.push_str(description);
        markdown.push_str("\n\n");
    }
    if let Some(type_text) = &attribute.type_text {
        markdown.push_str(&format!("**Type**: `{type_text}`\n\n"));
    }
    if let Some(default) = &attribute.default {
        markdown.push_str(&format!("**Default**: `{default}`\n\n"));
    }
    if attribute.reflects {
        markdown.push_str("Reflects to the DOM attribute.\n\n");
    }
    markdown.push_str(&format!("*Attribute of `<{tag}>`*\n"));
    markdown
}

fn render_value(attribute: &Attribute, value: &str) -> String {
    let mut markdown = format!("`{value}`\n\n");
    if !attribute.values.is_empty() {
        let known = attribute.values.iter().any(|v| v == value);
        if !known {
            markdown.push_str(&format!(
                "Not a known value of `{}`.\n\n",
                attribute.name
            ));
        }
        markdown.push_str("**Allowed values**:\n");
        for allowed in &attribute.values {
            markdown.push_str(&format!("- `{allowed}`\n"));
        }
    } else if let Some(type_text) = &attribute.type_text {
        markdown.push_str(&format!("**Type**: `{type_text}`\n"));
    }
    markdown
}

fn deprecation_line(deprecated: &Deprecation) -> String {
    match deprecated.message() {
        Some(message) => format!("⚠️ **Deprecated**: {message}\n\n"),
        None => "⚠️ **Deprecated**\n\n".to_string(),
    }
}
