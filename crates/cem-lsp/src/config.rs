use serde::Deserialize;
use tower_lsp_server::ls_types::DiagnosticSeverity;

/// Root configuration for the cem language server.
///
/// Provided by the client via initialization options or
/// `workspace/didChangeConfiguration`; every field has a working default.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LspConfig {
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub references: ReferencesConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Generate-side configuration forwarded to the session.
    #[serde(default)]
    pub generate: cem_core::Config,
}

/// Severities and scoping for the three diagnostic rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsConfig {
    /// Tag-name prefixes the workspace owns; unknown-tag diagnostics fire
    /// only inside these namespaces. Empty disables the unknown-tag rule.
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default = "default_unknown_tag_severity")]
    pub unknown_tag_severity: DiagnosticSeverity,
    #[serde(default = "default_unknown_attribute_severity")]
    pub unknown_attribute_severity: DiagnosticSeverity,
    #[serde(default = "default_invalid_value_severity")]
    pub invalid_value_severity: DiagnosticSeverity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            unknown_tag_severity: default_unknown_tag_severity(),
            unknown_attribute_severity: default_unknown_attribute_severity(),
            invalid_value_severity: default_invalid_value_severity(),
        }
    }
}

fn default_unknown_tag_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

fn default_unknown_attribute_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

fn default_invalid_value_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::ERROR
}

/// Bounds for reference scanning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesConfig {
    /// Reference scans return partial results past this deadline.
    #[serde(default = "default_reference_timeout")]
    pub timeout_ms: u64,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_reference_timeout(),
        }
    }
}

fn default_reference_timeout() -> u64 {
    5000
}

/// Re-analysis pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Debounce between the first change and re-analysis; a newer change
    /// supersedes the pending run.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

fn default_debounce() -> u64 {
    150
}
