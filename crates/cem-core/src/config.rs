//! Generate-side configuration.
//!
//! The CLI/config-file shell deserializes into these types and hands them to
//! the session; flags override file values before the `Config` reaches us.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Root configuration consumed by the generate session and its
/// collaborators. All fields default sensibly when absent.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// URL prefix for source links (`https://github.com/org/repo/tree/main`).
    #[serde(default)]
    pub source_control_root_url: Option<String>,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub warnings: WarningsConfig,
}

/// Configuration for manifest generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    /// Include globs, workspace-relative.
    #[serde(default = "default_files")]
    pub files: Vec<String>,
    /// Exclude globs subtracted from the includes.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Manifest output path; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Disables the built-in declaration-file excludes.
    #[serde(default)]
    pub no_default_excludes: bool,
    #[serde(default)]
    pub design_tokens: DesignTokensConfig,
    #[serde(default)]
    pub demo_discovery: DemoDiscoveryConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            files: default_files(),
            exclude: Vec::new(),
            output: None,
            no_default_excludes: false,
            design_tokens: DesignTokensConfig::default(),
            demo_discovery: DemoDiscoveryConfig::default(),
        }
    }
}

fn default_files() -> Vec<String> {
    vec!["**/*.{js,ts,tsx}".into()]
}

/// Exclude globs applied unless `noDefaultExcludes` is set.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/*.d.ts", "**/node_modules/**"];

/// DTCG design-token integration inputs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DesignTokensConfig {
    /// Path to the DTCG token JSON.
    #[serde(default)]
    pub spec: Option<PathBuf>,
    /// CSS custom-property prefix selecting the annotated properties.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl DesignTokensConfig {
    pub fn is_configured(&self) -> bool {
        self.spec.is_some() && self.prefix.is_some()
    }
}

/// Demo discovery inputs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DemoDiscoveryConfig {
    /// Glob selecting demo HTML files.
    #[serde(default)]
    pub file_glob: Option<String>,
    /// Path pattern with `:name` parameter segments.
    #[serde(default)]
    pub url_pattern: Option<String>,
    /// URL template interpolating captured parameters.
    #[serde(default)]
    pub url_template: Option<String>,
    /// `tagName -> alias` map applied by the template `alias` function.
    #[serde(default)]
    pub alias: HashMap<String, String>,
}

impl DemoDiscoveryConfig {
    pub fn is_configured(&self) -> bool {
        self.file_glob.is_some()
    }
}

/// Downstream-validator warning controls.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WarningsConfig {
    /// Warning category or rule IDs to silence.
    #[serde(default)]
    pub disable: Vec<String>,
}

impl WarningsConfig {
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disable.iter().any(|d| d == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.generate.files, vec!["**/*.{js,ts,tsx}".to_string()]);
        assert!(config.generate.exclude.is_empty());
        assert!(!config.generate.no_default_excludes);
        assert!(!config.generate.design_tokens.is_configured());
        assert!(!config.generate.demo_discovery.is_configured());
    }

    #[test]
    fn deserializes_recognized_keys() {
        let json = r#"{
            "sourceControlRootUrl": "https://github.com/acme/elements/tree/main",
            "generate": {
                "files": ["elements/**/*.ts"],
                "exclude": ["**/*.spec.ts"],
                "output": "custom-elements.json",
                "demoDiscovery": {
                    "fileGlob": "elements/*/demo/*.html",
                    "urlPattern": "/elements/:element/demo/:demo.html",
                    "urlTemplate": "https://ux.example.com/elements/{{.element | alias}}/demo/{{.demo}}/",
                    "alias": { "acme-button": "button" }
                },
                "designTokens": {
                    "spec": "node_modules/@acme/tokens/tokens.json",
                    "prefix": "--acme"
                }
            },
            "warnings": { "disable": ["missing-summary"] }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.source_control_root_url.as_deref(),
            Some("https://github.com/acme/elements/tree/main")
        );
        assert_eq!(config.generate.files, vec!["elements/**/*.ts".to_string()]);
        assert!(config.generate.demo_discovery.is_configured());
        assert_eq!(
            config.generate.demo_discovery.alias.get("acme-button"),
            Some(&"button".to_string())
        );
        assert!(config.generate.design_tokens.is_configured());
        assert!(config.warnings.is_disabled("missing-summary"));
        assert!(!config.warnings.is_disabled("unknown-attr"));
    }
}
