//! References handler.
//!
//! Scans every open HTML document and every open TS/JS document (inside
//! tagged template ranges only) for occurrences of the tag under the
//! cursor. The scan is bounded by a configurable deadline and returns
//! partial results when it expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tower_lsp_server::ls_types::{Location, Position, Range, ReferenceParams, Uri};

use cem_analyze::TemplateRange;

use crate::config::ReferencesConfig;
use crate::document::{byte_to_position, position_to_byte, DocumentLanguage, ServerState};
use crate::embedded::{embedded_html_at, html_target_at, HtmlTarget};

pub async fn handle_references(
    state: Arc<ServerState>,
    params: ReferenceParams,
    config: &ReferencesConfig,
) -> Option<Vec<Location>> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    let tag = tag_at(&state, uri, position)?;
    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);

    let mut locations = Vec::new();
    for entry in state.documents.iter() {
        if Instant::now() > deadline {
            tracing::debug!("reference scan timed out, returning partial results");
            break;
        }
        let doc_uri = entry.key().clone();
        let doc = entry.value();
        match doc.language {
            DocumentLanguage::Html => {
                collect_occurrences(&doc.text, &tag, 0, &doc.text, &doc_uri, &mut locations);
            }
            DocumentLanguage::Script => {
                let templates = state.session.templates_for(&doc.path);
                for template in templates_html(&templates) {
                    let Some(fragment) = doc.text.get(template.start..template.end) else {
                        continue;
                    };
                    collect_occurrences(
                        fragment,
                        &tag,
                        template.start,
                        &doc.text,
                        &doc_uri,
                        &mut locations,
                    );
                }
            }
        }
    }

    if locations.is_empty() {
        return None;
    }
    Some(locations)
}

fn tag_at(state: &ServerState, uri: &Uri, position: Position) -> Option<String> {
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
    match target {
        HtmlTarget::Tag { tag } => Some(tag),
        HtmlTarget::Attribute { tag, .. } | HtmlTarget::Value { tag, .. } => Some(tag),
    }
}

fn templates_html(templates: &[TemplateRange]) -> impl Iterator<Item = &TemplateRange> {
    templates
        .iter()
        .filter(|t| t.kind == cem_analyze::TemplateKind::Html)
}

/// Finds `<tag` and `</tag` occurrences in a fragment and maps them to
/// locations in the enclosing document.
fn collect_occurrences(
    fragment: &str,
    tag: &str,
    fragment_offset: usize,
    full_text: &str,
    uri: &Uri,
    locations: &mut Vec<Location>,
) {
    let mut search_from = 0;
    while let Some(found) = fragment[search_from..].find('<') {
        let open = search_from + found;
        let after = &fragment[open + 1..];
        let name_start = if after.starts_with('/') { open + 2 } else { open + 1 };
        search_from = open + 1;

        let Some(rest) = fragment.get(name_start..) else {
            break;
        };
        if !rest.starts_with(tag) {
            continue;
        }
        // The match must end the tag name exactly.
        let boundary = rest[tag.len()..].chars().next();
        if boundary.is_some_and(|c| !c.is_whitespace() && c != '>' && c != '/') {
            continue;
        }

        let start = fragment_offset + name_start;
        locations.push(Location {
            uri: uri.clone(),
            range: Range::new(
                byte_to_position(full_text, start),
                byte_to_position(full_text, start + tag.len()),
            ),
        });
    }
}
