//! Completion handler.
//!
//! Contexts: tag start (all registered tag names), attribute name (the
//! element's attributes), attribute value (the `values` enumeration).

use std::sync::Arc;

use tower_lsp_server::ls_types::{
    CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse, Documentation,
    MarkupContent, MarkupKind,
};

use cem_core::Attribute;

use crate::document::{position_to_byte, DocumentLanguage, ServerState};
use crate::embedded::{completion_context, embedded_html_at, CompletionContext};

pub async fn handle_completion(
    state: Arc<ServerState>,
    params: CompletionParams,
) -> Option<CompletionResponse> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    let doc = state.documents.get(uri)?;
    let context = match doc.language {
        DocumentLanguage::Html => {
            let offset = position_to_byte(&doc.text, position);
            completion_context(&doc.text, offset)?
        }
        DocumentLanguage::Script => {
            let templates = state.session.templates_for(&doc.path);
            let embedded = embedded_html_at(&doc.text, &templates, position)?;
            completion_context(&embedded.html, embedded.offset)?
        }
    };
    drop(doc);

    let items = match context {
        CompletionContext::TagName { prefix } => tag_items(&state, &prefix),
        CompletionContext::AttributeName { tag, prefix } => attribute_items(&state, &tag, &prefix),
        CompletionContext::AttributeValue { tag, attribute } => {
            value_items(&state, &tag, &attribute)
        }
    };

    if items.is_empty() {
        return None;
    }
    Some(CompletionResponse::Array(items))
}

fn tag_items(state: &ServerState, prefix: &str) -> Vec<CompletionItem> {
    let mut tags: Vec<String> = state
        .tag_index
        .iter()
        .map(|entry| entry.key().clone())
        .filter(|tag| tag.starts_with(prefix))
        .collect();
    tags.sort();

    tags.into_iter()
        .map(|tag| {
            let documentation = state
                .element_for_tag(&tag)
                .and_then(|(_, class)| class.summary.or(class.description))
                .map(markdown);
            CompletionItem {
                label: tag.clone(),
                kind: Some(CompletionItemKind::CLASS),
                insert_text: Some(tag),
                documentation,
                ..CompletionItem::default()
            }
        })
        .collect()
}

fn attribute_items(state: &ServerState, tag: &str, prefix: &str) -> Vec<CompletionItem> {
    let Some((_, class)) = state.element_for_tag(tag) else {
        return Vec::new();
    };
    class
        .attributes
        .iter()
        .filter(|attribute| attribute.name.starts_with(prefix))
        .map(|attribute| CompletionItem {
            label: attribute.name.clone(),
            kind: Some(CompletionItemKind::FIELD),
            detail: attribute.type_text.clone(),
            insert_text: Some(attribute_insert_text(attribute)),
            documentation: attribute.description.clone().map(markdown),
            ..CompletionItem::default()
        })
        .collect()
}

/// Boolean attributes insert bare; everything else opens a value.
fn attribute_insert_text(attribute: &Attribute) -> String {
    if attribute.type_text.as_deref() == Some("boolean") {
        attribute.name.clone()
    } else {
        format!("{}=\"\"", attribute.name)
    }
}

fn value_items(state: &ServerState, tag: &str, attribute: &str) -> Vec<CompletionItem> {
    let Some((_, class)) = state.element_for_tag(tag) else {
        return Vec::new();
    };
    let Some(attribute) = class.attribute(attribute) else {
        return Vec::new();
    };
    attribute
        .values
        .iter()
        .map(|value| CompletionItem {
            label: value.clone(),
            kind: Some(CompletionItemKind::ENUM_MEMBER),
            insert_text: Some(value.clone()),
            ..CompletionItem::default()
        })
        .collect()
}

fn markdown(value: String) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}
