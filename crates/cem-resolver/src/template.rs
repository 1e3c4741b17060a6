//! Template-literal type expansion.
//!
//! A template-literal type like `` `${Side}-${Align}` `` expands to the
//! cross product of its placeholder unions, emitted as a single union of
//! quoted literals. A broad placeholder collapses the whole template to
//! `string`; an unresolvable one reconstructs the original template
//! verbatim.

use std::collections::HashSet;

use crate::aliases::{expand_text, is_broad_primitive, union_literals, AliasMap};

/// True when the definition text is a backtick-delimited template type.
pub fn is_template(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('`') && trimmed.ends_with('`') && trimmed.len() >= 2
}

/// One run of a parsed template: literal text or a `${...}` placeholder.
#[derive(Debug, PartialEq, Eq)]
enum Run {
    Static(String),
    Placeholder(String),
}

/// Splits the template body into alternating static and placeholder runs.
/// Returns `None` on an unterminated placeholder.
fn parse_runs(body: &str) -> Option<Vec<Run>> {
    let mut runs = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            runs.push(Run::Static(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = find_closing_brace(after)?;
        runs.push(Run::Placeholder(after[..end].trim().to_string()));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        runs.push(Run::Static(rest.to_string()));
    }
    Some(runs)
}

fn find_closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Expands a template-literal type through the alias map.
pub(crate) fn expand_template(
    template: &str,
    map: &AliasMap,
    visited: &mut HashSet<String>,
) -> String {
    let body = template.trim().trim_matches('`');
    let Some(runs) = parse_runs(body) else {
        return template.trim().to_string();
    };

    // Resolve each placeholder to its literal values up front; any failure
    // decides the whole template.
    let mut resolved: Vec<ResolvedRun> = Vec::with_capacity(runs.len());
    for run in runs {
        match run {
            Run::Static(text) => resolved.push(ResolvedRun::Static(text)),
            Run::Placeholder(expr) => {
                let expanded = expand_text(&expr, map, visited);
                let flattened = expanded.trim();
                if is_broad_primitive(flattened) {
                    return "string".to_string();
                }
                match union_literals(flattened) {
                    Some(values) => resolved.push(ResolvedRun::Values(values)),
                    // Unresolvable placeholder: reconstruct the original.
                    None => return template.trim().to_string(),
                }
            }
        }
    }

    let mut products = vec![String::new()];
    for run in resolved {
        match run {
            ResolvedRun::Static(text) => {
                for product in &mut products {
                    product.push_str(&text);
                }
            }
            ResolvedRun::Values(values) => {
                let mut next = Vec::with_capacity(products.len() * values.len());
                for product in &products {
                    for value in &values {
                        next.push(format!("{product}{value}"));
                    }
                }
                products = next;
            }
        }
    }

    products
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

enum ResolvedRun {
    Static(String),
    Values(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::expand_alias;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, &str)]) -> AliasMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn cross_product_expansion() {
        let aliases = map(&[
            ("Side", "'top' | 'right'"),
            ("Align", "'start' | 'end'"),
            ("Placement", "`${Side}-${Align}`"),
        ]);
        assert_eq!(
            expand_alias("Placement", &aliases),
            "'top-start' | 'top-end' | 'right-start' | 'right-end'"
        );
    }

    #[test]
    fn broad_placeholder_collapses_to_string() {
        let aliases = map(&[("Any", "string"), ("T", "`prefix-${Any}`")]);
        assert_eq!(expand_alias("T", &aliases), "string");
    }

    #[test]
    fn unresolvable_placeholder_reconstructs_verbatim() {
        let aliases = map(&[("T", "`lead-${Unknown}`")]);
        assert_eq!(expand_alias("T", &aliases), "`lead-${Unknown}`");
    }

    #[test]
    fn static_only_template() {
        let aliases = AliasMap::new();
        let mut visited = HashSet::new();
        assert_eq!(
            expand_template("`fixed`", &aliases, &mut visited),
            "'fixed'"
        );
    }

    #[test]
    fn single_placeholder_no_static() {
        let aliases = map(&[("Size", "'sm' | 'lg'")]);
        let mut visited = HashSet::new();
        assert_eq!(
            expand_template("`${Size}`", &aliases, &mut visited),
            "'sm' | 'lg'"
        );
    }

    #[test]
    fn every_member_of_expansion_is_quoted() {
        let aliases = map(&[
            ("A", "'x' | 'y'"),
            ("B", "'1' | '2'"),
            ("T", "`${A}:${B}`"),
        ]);
        let expanded = expand_alias("T", &aliases);
        for member in expanded.split('|') {
            let member = member.trim();
            assert!(member.starts_with('\'') && member.ends_with('\''), "{member}");
        }
        assert_eq!(expanded.split('|').count(), 4);
    }

    #[test]
    fn unterminated_placeholder_is_left_alone() {
        let aliases = AliasMap::new();
        let mut visited = HashSet::new();
        assert_eq!(
            expand_template("`${Oops`", &aliases, &mut visited),
            "`${Oops`"
        );
    }
}
