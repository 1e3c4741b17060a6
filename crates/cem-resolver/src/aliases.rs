//! Type-alias extraction and expansion.
//!
//! An alias map is file- or package-local: `type Side = 'top' | 'right'`
//! records `Side -> "'top' | 'right'"`. Expansion substitutes aliases
//! recursively, expands template-literal types, and breaks cycles by
//! returning the alias name itself when a resolution chain re-enters it.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use cem_syntax::{run_query, Grammar, ParserPool, QueryManager};

use crate::template::{expand_template, is_template};

/// Alias name to raw definition text.
pub type AliasMap = HashMap<String, String>;

/// Identifiers that are never expanded.
const PRIMITIVES: &[&str] = &[
    "string", "number", "boolean", "any", "unknown", "never", "null", "undefined", "void",
    "object", "symbol", "bigint", "true", "false",
];

pub fn is_primitive(ident: &str) -> bool {
    PRIMITIVES.contains(&ident)
}

/// Primitives broad enough to collapse a template-literal type to `string`.
pub fn is_broad_primitive(ident: &str) -> bool {
    matches!(ident, "string" | "any" | "number" | "boolean" | "unknown")
}

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("identifier pattern"));

/// Extracts every `type X = ...` alias from TS/TSX source.
pub fn extract_aliases(
    pool: &ParserPool,
    queries: &QueryManager,
    grammar: Grammar,
    source: &[u8],
) -> AliasMap {
    let mut map = AliasMap::new();
    let Some(tree) = pool.parse(grammar, source) else {
        return map;
    };
    let query = queries.get(grammar, "typeAliases");
    for hit in run_query(&query, tree.root_node(), source) {
        let (Some(name), Some(definition)) = (
            hit.text("alias.name", source),
            hit.text("alias.definition", source),
        ) else {
            continue;
        };
        map.insert(name.to_string(), definition.trim().to_string());
    }
    map
}

static TYPEDEF: Lazy<Regex> = Lazy::new(|| {
    // @typedef {('a'|'b')} Name  /  @typedef {string} Name
    Regex::new(r"@typedef\s*\{([^}]*)\}\s*([A-Za-z_$][A-Za-z0-9_$]*)").expect("typedef pattern")
});

/// JSDoc `@typedef` fallback for JavaScript sources without declaration
/// files.
pub fn extract_jsdoc_typedefs(source: &str) -> AliasMap {
    let mut map = AliasMap::new();
    for capture in TYPEDEF.captures_iter(source) {
        let definition = capture[1].trim();
        let name = capture[2].to_string();
        // Strip one level of grouping parens common in JSDoc unions.
        let definition = definition
            .strip_prefix('(')
            .and_then(|d| d.strip_suffix(')'))
            .unwrap_or(definition);
        map.insert(name, definition.trim().to_string());
    }
    map
}

/// Expands `name` through `map` to its fully expanded string definition.
///
/// Unknown names come back unchanged, which keeps unresolved references
/// verbatim in the manifest.
pub fn expand_alias(name: &str, map: &AliasMap) -> String {
    let mut visited = HashSet::new();
    expand_ident(name, map, &mut visited)
}

/// Expands a raw definition string through `map`.
pub fn expand_definition(definition: &str, map: &AliasMap) -> String {
    let mut visited = HashSet::new();
    expand_text(definition, map, &mut visited)
}

fn expand_ident(name: &str, map: &AliasMap, visited: &mut HashSet<String>) -> String {
    if is_primitive(name) {
        return name.to_string();
    }
    let Some(definition) = map.get(name) else {
        return name.to_string();
    };
    if visited.contains(name) {
        // Cycle: yield the alias name itself and let the caller keep it.
        return name.to_string();
    }
    visited.insert(name.to_string());
    let expanded = expand_text(definition, map, visited);
    visited.remove(name);
    expanded
}

pub(crate) fn expand_text(text: &str, map: &AliasMap, visited: &mut HashSet<String>) -> String {
    let trimmed = text.trim();

    if is_template(trimmed) {
        return expand_template(trimmed, map, visited);
    }

    if let Some(parts) = split_top_level_union(trimmed) {
        let expanded: Vec<String> = parts
            .iter()
            .map(|part| expand_text(part, map, visited))
            .collect();
        return expanded.join(" | ");
    }

    if IDENT.find(trimmed).is_some_and(|m| m.as_str() == trimmed) {
        return expand_ident(trimmed, map, visited);
    }

    // Structured type (generic, object, tuple): substitute alias identifiers
    // in place, leaving everything else verbatim.
    let mut out = String::with_capacity(trimmed.len());
    let mut last = 0;
    for m in IDENT.find_iter(trimmed) {
        out.push_str(&trimmed[last..m.start()]);
        let ident = m.as_str();
        // Skip property names (`{ kind: ... }`) and quoted contexts.
        let is_property = trimmed[m.end()..].trim_start().starts_with(':')
            && !trimmed[..m.start()].trim_end().ends_with(['|', '<', '(', ',']);
        if !is_property && !is_primitive(ident) && map.contains_key(ident) {
            out.push_str(&expand_ident(ident, map, visited));
        } else {
            out.push_str(ident);
        }
        last = m.end();
    }
    out.push_str(&trimmed[last..]);
    out
}

/// Splits a union on top-level `|`, returning `None` when the text is not a
/// union at its top level.
pub(crate) fn split_top_level_union(text: &str) -> Option<Vec<String>> {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut parts = Vec::new();
    let mut start = 0;

    let bytes = text.char_indices().collect::<Vec<_>>();
    let mut i = 0;
    while i < bytes.len() {
        let (offset, c) = bytes[i];
        if let Some(quote) = in_string {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
        } else {
            match c {
                '\'' | '"' | '`' => in_string = Some(c),
                '(' | '<' | '{' | '[' => depth += 1,
                ')' | '>' | '}' | ']' => depth -= 1,
                '|' if depth == 0 => {
                    parts.push(text[start..offset].trim().to_string());
                    start = offset + c.len_utf8();
                }
                _ => {}
            }
        }
        i += 1;
    }

    if parts.is_empty() {
        return None;
    }
    parts.push(text[start..].trim().to_string());
    parts.retain(|p| !p.is_empty());
    Some(parts)
}

/// Interprets an expanded definition as a union of quoted string literals,
/// yielding the unquoted values.
pub fn union_literals(expanded: &str) -> Option<Vec<String>> {
    let parts = match split_top_level_union(expanded) {
        Some(parts) => parts,
        None => vec![expanded.trim().to_string()],
    };
    let mut values = Vec::with_capacity(parts.len());
    for part in parts {
        let unquoted = part
            .strip_prefix('\'')
            .and_then(|p| p.strip_suffix('\''))
            .or_else(|| part.strip_prefix('"').and_then(|p| p.strip_suffix('"')))?;
        values.push(unquoted.to_string());
    }
    Some(values)
}
