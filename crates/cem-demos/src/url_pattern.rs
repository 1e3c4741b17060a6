//! Path patterns with `:name` parameter segments.

use std::collections::HashMap;

use cem_core::{CemError, Result};

/// One compiled segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `:name` with an optional literal suffix (`:demo.html`).
    Param { name: String, suffix: String },
}

/// A compiled URL pattern like `/elements/:tag/demo/:demo.html`.
///
/// Executing it against a path yields the captured parameter values, or
/// `None` when the path does not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPattern {
    segments: Vec<Segment>,
}

impl UrlPattern {
    /// Compiles a pattern. An empty pattern or an empty parameter name is
    /// a configuration error.
    pub fn compile(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(CemError::config("url pattern must not be empty"));
        }

        let mut segments = Vec::new();
        for raw in trimmed.trim_matches('/').split('/') {
            if let Some(rest) = raw.strip_prefix(':') {
                // A parameter ends at the first character that cannot be
                // part of a name; the remainder is a literal suffix.
                let split = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                let (name, suffix) = rest.split_at(split);
                if name.is_empty() {
                    return Err(CemError::config(format!(
                        "url pattern '{pattern}' has an unnamed parameter"
                    )));
                }
                segments.push(Segment::Param {
                    name: name.to_string(),
                    suffix: suffix.to_string(),
                });
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self { segments })
    }

    /// Matches `path` against the pattern, yielding captured parameters.
    pub fn execute(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param { name, suffix } => {
                    let value = part.strip_suffix(suffix.as_str())?;
                    if value.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }

    /// Names of the pattern's parameters, in order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn captures_parameters() {
        let pattern = UrlPattern::compile("/components/:element/demo/:demo.html").unwrap();
        let params = pattern
            .execute("/components/button/demo/primary.html")
            .unwrap();
        assert_eq!(params["element"], "button");
        assert_eq!(params["demo"], "primary");
    }

    #[test]
    fn literal_mismatch_fails() {
        let pattern = UrlPattern::compile("/components/:element/demo/:demo.html").unwrap();
        assert!(pattern.execute("/elements/button/demo/primary.html").is_none());
    }

    #[test]
    fn length_mismatch_fails() {
        let pattern = UrlPattern::compile("/a/:x").unwrap();
        assert!(pattern.execute("/a/b/c").is_none());
        assert!(pattern.execute("/a").is_none());
    }

    #[test]
    fn suffix_must_be_present() {
        let pattern = UrlPattern::compile("/demo/:demo.html").unwrap();
        assert!(pattern.execute("/demo/primary.htm").is_none());
        assert_eq!(pattern.execute("/demo/index.html").unwrap()["demo"], "index");
    }

    #[test]
    fn relative_paths_match() {
        let pattern = UrlPattern::compile("/elements/:tag/demo/:demo.html").unwrap();
        let params = pattern
            .execute("elements/rh-accordion/demo/index.html")
            .unwrap();
        assert_eq!(params["tag"], "rh-accordion");
    }

    #[test]
    fn empty_pattern_is_config_error() {
        assert!(UrlPattern::compile("  ").unwrap_err().is_fatal());
    }

    #[test]
    fn unnamed_parameter_is_config_error() {
        let err = UrlPattern::compile("/a/:.html").unwrap_err();
        assert!(err.to_string().contains("unnamed parameter"));
    }

    #[test]
    fn param_names_in_order() {
        let pattern = UrlPattern::compile("/x/:a/y/:b.html").unwrap();
        assert_eq!(pattern.param_names(), vec!["a", "b"]);
    }
}
