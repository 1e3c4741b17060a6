//! CSS custom-property extraction from `css` tagged templates.
//!
//! Element styles consume custom properties through `var(--name, fallback)`
//! and define defaults through `--name: value` declarations. Both surface
//! as `CssProperty` entries on the owning class, with JSDoc-declared
//! properties taking precedence during merge.

use cem_core::CssProperty;
use cem_syntax::{run_query, Grammar, ParserPool, QueryManager};

use crate::node_util::text;

/// Extracts custom-property facts from one css template body.
pub fn extract_css_properties(
    pool: &ParserPool,
    queries: &QueryManager,
    css_source: &str,
) -> Vec<CssProperty> {
    let bytes = css_source.as_bytes();
    let Some(tree) = pool.parse(Grammar::Css, bytes) else {
        return Vec::new();
    };
    let query = queries.get(Grammar::Css, "customProperties");

    let mut properties: Vec<CssProperty> = Vec::new();
    let mut push = |prop: CssProperty| {
        if !properties.iter().any(|p| p.name == prop.name) {
            properties.push(prop);
        }
    };

    for hit in run_query(&query, tree.root_node(), bytes) {
        // `var(--name, fallback)` consumption sites.
        if hit.text("var.function", bytes) == Some("var") {
            if let Some(arguments) = hit.node("var.arguments") {
                let mut cursor = arguments.walk();
                let mut named = arguments.named_children(&mut cursor);
                let Some(first) = named.next() else {
                    continue;
                };
                let name = text(first, bytes);
                if !name.starts_with("--") {
                    continue;
                }
                let fallback = named
                    .map(|n| text(n, bytes))
                    .collect::<Vec<_>>()
                    .join(" ");
                push(CssProperty {
                    name: CssProperty::canonical_name(&name),
                    default: (!fallback.is_empty()).then_some(fallback),
                    ..CssProperty::default()
                });
            }
            continue;
        }

        // `--name: value` definition sites.
        if let Some(name) = hit.text("property.name", bytes) {
            if !name.starts_with("--") {
                continue;
            }
            let initial = hit
                .node("property.declaration")
                .map(|decl| text(decl, bytes))
                .and_then(|decl_text| {
                    decl_text
                        .split_once(':')
                        .map(|(_, v)| v.trim().trim_end_matches(';').trim().to_string())
                })
                .filter(|v| !v.is_empty());
            push(CssProperty {
                name: CssProperty::canonical_name(name),
                initial,
                ..CssProperty::default()
            });
        }
    }

    properties
}
