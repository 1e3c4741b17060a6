//! DTCG design-token integration.
//!
//! Loads a Design Tokens Community Group JSON tree and annotates CSS
//! custom properties whose names carry the configured prefix with token
//! metadata. Properties outside the token tree are left untouched.

use std::path::Path;

use serde_json::Value;

use cem_core::{CemError, CssProperty, Package, Result, TokenAnnotation};
use cem_workspace::WorkspaceContext;

/// A loaded DTCG token tree.
pub struct DesignTokens {
    root: Value,
}

impl DesignTokens {
    /// Parses DTCG JSON. The top level must be an object of token groups.
    pub fn load(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        if !root.is_object() {
            return Err(CemError::config("design token spec must be a JSON object"));
        }
        Ok(Self { root })
    }

    pub fn from_file(ctx: &WorkspaceContext, path: &Path) -> Result<Self> {
        Self::load(&ctx.read_to_string(path)?)
    }

    /// Resolves the token addressed by a CSS custom property name, given
    /// the configured prefix (`--rh` + `--rh-color-brand-red` addresses
    /// `color.brand.red`).
    pub fn lookup(&self, property_name: &str, prefix: &str) -> Option<TokenAnnotation> {
        let remainder = property_name
            .strip_prefix(prefix)?
            .trim_start_matches('-');
        if remainder.is_empty() {
            return None;
        }
        let token = find_token(self.root.as_object()?, remainder)?;

        let category = remainder.split('-').next().map(str::to_string);
        Some(TokenAnnotation {
            category,
            value: token.get("$value").map(render_value),
            description: token
                .get("$description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Annotates every property carrying the prefix; the rest stay
    /// untouched.
    pub fn annotate(&self, properties: &mut [CssProperty], prefix: &str) {
        for property in properties {
            if let Some(annotation) = self.lookup(&property.name, prefix) {
                property.token = Some(annotation);
            }
        }
    }

    /// Annotates every custom element of a package in place.
    pub fn annotate_package(&self, package: &mut Package, prefix: &str) {
        for module in &mut package.modules {
            for declaration in &mut module.declarations {
                if let cem_core::Declaration::Class(class) = declaration {
                    self.annotate(&mut class.css_properties, prefix);
                }
            }
        }
    }
}

/// Walks the token tree matching dash-joined group names against the
/// dash-joined property remainder. Group keys may themselves contain
/// dashes, so each level tries every key that is a prefix of what's left.
fn find_token<'a>(
    group: &'a serde_json::Map<String, Value>,
    remainder: &str,
) -> Option<&'a serde_json::Map<String, Value>> {
    for (key, child) in group {
        if key.starts_with('$') {
            continue;
        }
        let Some(child) = child.as_object() else {
            continue;
        };
        if key == remainder && child.contains_key("$value") {
            return Some(child);
        }
        if let Some(rest) = remainder
            .strip_prefix(key.as_str())
            .and_then(|r| r.strip_prefix('-'))
        {
            if let Some(found) = find_token(child, rest) {
                return Some(found);
            }
        }
    }
    None
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
