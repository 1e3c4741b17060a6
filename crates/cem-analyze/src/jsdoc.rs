//! JSDoc block parsing.
//!
//! Tag parsing is line-sensitive: a tag owns everything up to the next tag
//! or the end of the block. Names may be hyphenated (`--my-prop`,
//! `icon-label`); the `name - description` convention separates names from
//! prose.

use cem_core::{
    Attribute, CssPart, CssProperty, CssState, Deprecation, Event, Slot,
};

/// Everything a JSDoc block can contribute to a declaration.
#[derive(Debug, Default, PartialEq)]
pub struct JsdocInfo {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub slots: Vec<Slot>,
    pub css_parts: Vec<CssPart>,
    pub css_properties: Vec<CssProperty>,
    pub css_states: Vec<CssState>,
    pub events: Vec<Event>,
    pub attributes: Vec<Attribute>,
    pub deprecated: Option<Deprecation>,
    pub status: Option<String>,
    /// Tag name from a manifest-linking `@customElement my-tag` tag.
    pub custom_element_tag: Option<String>,
}

impl JsdocInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// True for `/** ... */` blocks (single-line `//` and plain `/* */`
/// comments contribute nothing).
pub fn is_jsdoc(comment: &str) -> bool {
    comment.starts_with("/**") && comment.ends_with("*/")
}

/// Parses a raw `/** ... */` comment into its contributions.
pub fn parse_block(comment: &str) -> JsdocInfo {
    let mut info = JsdocInfo::default();
    if !is_jsdoc(comment) {
        return info;
    }

    let body = comment
        .trim_start_matches("/**")
        .trim_end_matches("*/");
    let lines: Vec<String> = body.lines().map(strip_gutter).collect();

    // Leading prose before the first tag is the description.
    let mut description_lines = Vec::new();
    let mut tags: Vec<(String, String)> = Vec::new();

    for line in &lines {
        if let Some(rest) = line.strip_prefix('@') {
            let (tag, first) = match rest.split_once(char::is_whitespace) {
                Some((tag, first)) => (tag.to_string(), first.trim().to_string()),
                None => (rest.trim().to_string(), String::new()),
            };
            tags.push((tag, first));
        } else if let Some((_, body)) = tags.last_mut() {
            // Continuation line of the previous tag.
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
        } else {
            description_lines.push(line.clone());
        }
    }

    let description = join_prose(&description_lines);
    if !description.is_empty() {
        info.description = Some(description);
    }

    for (tag, body) in tags {
        let body = body.trim().to_string();
        match tag.as_str() {
            "summary" => info.summary = Some(body),
            "deprecated" => info.deprecated = Some(Deprecation::from_tag_body(&body)),
            "status" => info.status = non_empty(body),
            "customElement" | "custom-element" => {
                info.custom_element_tag = non_empty(body);
            }
            "slot" => {
                let (name, description) = split_name_desc(&body);
                info.slots.push(Slot { name, description });
            }
            "csspart" => {
                let (name, description) = split_name_desc(&body);
                if !name.is_empty() {
                    info.css_parts.push(CssPart { name, description });
                }
            }
            "cssstate" => {
                let (name, description) = split_name_desc(&body);
                if !name.is_empty() {
                    info.css_states.push(CssState { name, description });
                }
            }
            "cssprop" | "cssproperty" => {
                if let Some(prop) = parse_css_property(&body) {
                    info.css_properties.push(prop);
                }
            }
            "fires" | "event" => {
                let (name, description) = split_name_desc(&body);
                if !name.is_empty() {
                    info.events.push(Event {
                        name,
                        type_text: None,
                        description,
                        deprecated: None,
                    });
                }
            }
            "attr" | "attribute" => {
                let (name, description) = split_name_desc(&body);
                if !name.is_empty() {
                    info.attributes.push(Attribute {
                        name,
                        description,
                        ..Attribute::default()
                    });
                }
            }
            _ => {}
        }
    }

    info
}

/// Removes the ` * ` gutter of one block line.
fn strip_gutter(line: &str) -> String {
    let trimmed = line.trim_start();
    let without_star = trimmed.strip_prefix('*').unwrap_or(trimmed);
    without_star.strip_prefix(' ').unwrap_or(without_star).to_string()
}

fn join_prose(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

/// Splits `name - description` (or `name description`). A leading bare `-`
/// names the default slot.
fn split_name_desc(body: &str) -> (String, Option<String>) {
    let body = body.trim();
    if body.is_empty() {
        return (String::new(), None);
    }
    // `- description` with no name: the default slot.
    if let Some(rest) = body.strip_prefix("- ") {
        return (String::new(), non_empty(rest.to_string()));
    }
    if body == "-" {
        return (String::new(), None);
    }

    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_string(), rest.trim()),
        None => (body.to_string(), ""),
    };
    let rest = rest.strip_prefix("- ").unwrap_or(rest).trim();
    let rest = if rest == "-" { "" } else { rest };
    (name, non_empty(rest.to_string()))
}

/// Parses a `@cssprop` body: `--name - desc` or `[--name=default] - desc`.
fn parse_css_property(body: &str) -> Option<CssProperty> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    // Skip an optional `{syntax}` annotation before the name.
    let (syntax, body) = if let Some(rest) = body.strip_prefix('{') {
        let end = rest.find('}')?;
        (
            non_empty(rest[..end].to_string()),
            rest[end + 1..].trim_start(),
        )
    } else {
        (None, body)
    };

    let (raw_name, default, rest) = if let Some(rest) = body.strip_prefix('[') {
        let end = rest.find(']')?;
        let inner = &rest[..end];
        let (name, default) = match inner.split_once('=') {
            Some((name, default)) => (name.trim(), non_empty(default.trim().to_string())),
            None => (inner.trim(), None),
        };
        (name.to_string(), default, rest[end + 1..].trim())
    } else {
        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name.to_string(), rest.trim()),
            None => (body.to_string(), ""),
        };
        (name, None, rest)
    };

    if !raw_name.starts_with("--") {
        return None;
    }

    let rest = rest.strip_prefix("- ").unwrap_or(rest).trim();
    Some(CssProperty {
        name: CssProperty::canonical_name(&raw_name),
        description: non_empty(rest.to_string()),
        syntax,
        default,
        ..CssProperty::default()
    })
}
