//! The URL-template mini-language.
//!
//! `{{.name}}` interpolates a captured parameter; functions compose
//! left-to-right via `|`: `{{.element | alias | slug}}`. The function set
//! is fixed: `alias` (configured tag-to-alias map), `slug` (lowercase,
//! non-alphanumeric runs to `-`), `lower`, `upper`. Nothing else is
//! recognized.

use std::collections::HashMap;

use cem_core::{CemError, Result};

/// A template function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Alias,
    Slug,
    Lower,
    Upper,
}

impl Func {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "alias" => Some(Self::Alias),
            "slug" => Some(Self::Slug),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            _ => None,
        }
    }

    fn apply(self, value: &str, aliases: &HashMap<String, String>) -> String {
        match self {
            Self::Alias => aliases.get(value).cloned().unwrap_or_else(|| value.to_string()),
            Self::Slug => slug(value),
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
        }
    }
}

fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_dash = false;
    for c in value.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Interpolation { param: String, funcs: Vec<Func> },
}

/// A compiled URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    pieces: Vec<Piece>,
}

impl UrlTemplate {
    /// Compiles a template. Unknown functions and malformed
    /// interpolations are configuration errors carrying the template text.
    pub fn compile(template: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                pieces.push(Piece::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                CemError::config(format!("unterminated interpolation in '{template}'"))
            })?;
            let inner = after[..end].trim();

            let mut parts = inner.split('|').map(str::trim);
            let param = parts
                .next()
                .and_then(|p| p.strip_prefix('.'))
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    CemError::config(format!(
                        "interpolation '{{{{{inner}}}}}' must name a parameter as '.name'"
                    ))
                })?;

            let mut funcs = Vec::new();
            for func_name in parts {
                let func = Func::parse(func_name).ok_or_else(|| {
                    CemError::config(format!(
                        "unknown template function '{func_name}' in '{template}'"
                    ))
                })?;
                funcs.push(func);
            }

            pieces.push(Piece::Interpolation {
                param: param.to_string(),
                funcs,
            });
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Literal(rest.to_string()));
        }

        Ok(Self { pieces })
    }

    /// Renders the template with captured parameters and the configured
    /// alias map. Missing parameters render empty.
    ///
    /// Rendered paths ending in `/index.html` (or a rendered `index`
    /// directory segment) collapse to the parent directory.
    pub fn render(
        &self,
        params: &HashMap<String, String>,
        aliases: &HashMap<String, String>,
    ) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Interpolation { param, funcs } => {
                    let mut value = params.get(param).cloned().unwrap_or_default();
                    for func in funcs {
                        value = func.apply(&value, aliases);
                    }
                    out.push_str(&urlencoding::encode(&value));
                }
            }
        }
        collapse_index(&out)
    }
}

/// `/index.html` and `/index/` endings collapse to the parent directory,
/// the canonical form for statically generated demo sites.
fn collapse_index(url: &str) -> String {
    if let Some(parent) = url.strip_suffix("/index.html") {
        return format!("{parent}/");
    }
    if let Some(parent) = url.strip_suffix("/index/") {
        return format!("{parent}/");
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn interpolates_with_alias() {
        // Scenario: pattern /components/:element/demo/:demo.html against
        // /components/button/demo/primary.html.
        let template = UrlTemplate::compile(
            "https://site.com/components/{{.element | alias}}/demo/{{.demo}}/",
        )
        .unwrap();
        let url = template.render(
            &params(&[("element", "button"), ("demo", "primary")]),
            &params(&[("button", "button-alias")]),
        );
        assert_eq!(url, "https://site.com/components/button-alias/demo/primary/");
    }

    #[test]
    fn index_demo_collapses_to_parent() {
        let template = UrlTemplate::compile(
            "https://ux.redhat.com/elements/{{.element | alias | slug}}/demo/{{.demo}}/",
        )
        .unwrap();
        let url = template.render(
            &params(&[("element", "accordion"), ("demo", "index")]),
            &params(&[("accordion", "rh-accordion")]),
        );
        assert_eq!(url, "https://ux.redhat.com/elements/rh-accordion/demo/");
    }

    #[test]
    fn index_html_collapses_to_parent() {
        let template = UrlTemplate::compile("https://x.io/{{.a}}/index.html").unwrap();
        assert_eq!(
            template.render(&params(&[("a", "card")]), &HashMap::new()),
            "https://x.io/card/"
        );
    }

    #[test]
    fn functions_compose_left_to_right() {
        let template = UrlTemplate::compile("{{.name | alias | upper}}").unwrap();
        let url = template.render(
            &params(&[("name", "button")]),
            &params(&[("button", "fancy-button")]),
        );
        assert_eq!(url, "FANCY-BUTTON");
    }

    #[test]
    fn slug_function() {
        let template = UrlTemplate::compile("{{.title | slug}}").unwrap();
        assert_eq!(
            template.render(&params(&[("title", "My Demo Page!")]), &HashMap::new()),
            "my-demo-page"
        );
    }

    #[test]
    fn alias_without_mapping_passes_through() {
        let template = UrlTemplate::compile("{{.element | alias}}").unwrap();
        assert_eq!(
            template.render(&params(&[("element", "plain")]), &HashMap::new()),
            "plain"
        );
    }

    #[test]
    fn missing_parameter_renders_empty() {
        let template = UrlTemplate::compile("x/{{.gone}}/y").unwrap();
        assert_eq!(template.render(&HashMap::new(), &HashMap::new()), "x//y");
    }

    #[test]
    fn unknown_function_is_config_error() {
        let err = UrlTemplate::compile("{{.a | camel}}").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("camel"));
    }

    #[test]
    fn malformed_interpolations_are_config_errors() {
        assert!(UrlTemplate::compile("{{.a}").is_err());
        assert!(UrlTemplate::compile("{{a}}").is_err());
        assert!(UrlTemplate::compile("{{.}}").is_err());
    }
}
