//! Canonical manifest entity types and their JSON codec.
//!
//! The manifest is a schema-versioned description of every custom element
//! declared in a source tree. Tagged unions are encoded with a `kind`
//! discriminator, optional fields are omitted when absent, and ordering is
//! deterministic: declarations and members in source order, demos in
//! discovery order.

use serde::{Deserialize, Serialize};

/// Schema version stamped on every generated package.
pub const SCHEMA_VERSION: &str = "2.1.0";

/// Top-level manifest value. One `Package` per workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Semver string identifying the manifest schema.
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

impl Package {
    /// Creates an empty package stamped with the current schema version.
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.into(),
            modules: Vec::new(),
            deprecated: None,
        }
    }

    /// Returns true when `schema_version` parses as semver.
    pub fn schema_version_valid(&self) -> bool {
        semver::Version::parse(&self.schema_version).is_ok()
    }

    /// Full deep copy for mutation-safe observers.
    ///
    /// `Clone` already copies the whole tree; this name documents intent at
    /// call sites handing snapshots across the session boundary.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// Iterates every custom-element declaration with its owning module.
    pub fn custom_elements(&self) -> impl Iterator<Item = (&Module, &ClassDeclaration)> {
        self.modules.iter().flat_map(|module| {
            module.declarations.iter().filter_map(move |decl| match decl {
                Declaration::Class(class) if class.is_custom_element() => Some((module, class)),
                _ => None,
            })
        })
    }

    /// Checks the structural invariants of the package and returns a
    /// description of every violation found.
    ///
    /// Checked rules:
    /// - `module.path` is unique within the package
    /// - declaration names are unique within a module
    /// - custom-element tag names are unique across the package
    /// - every custom element carries a non-empty tag name
    /// - CSS custom property names are canonical (`--` prefix, lowercase)
    /// - demo URLs, when present, are absolute
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen_paths = std::collections::HashSet::new();
        let mut seen_tags: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();

        for module in &self.modules {
            if !seen_paths.insert(module.path.as_str()) {
                violations.push(format!("duplicate module path '{}'", module.path));
            }

            let mut seen_names = std::collections::HashSet::new();
            for decl in &module.declarations {
                if !seen_names.insert(decl.name()) {
                    violations.push(format!(
                        "duplicate declaration '{}' in module '{}'",
                        decl.name(),
                        module.path
                    ));
                }

                let Declaration::Class(class) = decl else {
                    continue;
                };
                if class.custom_element {
                    match class.tag_name.as_deref() {
                        None | Some("") => violations.push(format!(
                            "custom element '{}' in '{}' has no tag name",
                            class.name, module.path
                        )),
                        Some(tag) => {
                            if let Some(first) = seen_tags.get(tag) {
                                violations.push(format!(
                                    "tag '{tag}' declared in both '{first}' and '{}'",
                                    module.path
                                ));
                            } else {
                                seen_tags.insert(tag, module.path.as_str());
                            }
                        }
                    }
                }
                for prop in &class.css_properties {
                    if !prop.name.starts_with("--") {
                        violations.push(format!(
                            "css property '{}' on '{}' is missing the '--' prefix",
                            prop.name, class.name
                        ));
                    } else if prop.name != prop.name.to_lowercase() {
                        violations.push(format!(
                            "css property '{}' on '{}' is not lowercase",
                            prop.name, class.name
                        ));
                    }
                }
                for demo in &class.demos {
                    if !is_absolute_url(&demo.url) {
                        violations.push(format!(
                            "demo url '{}' on '{}' is not absolute",
                            demo.url, class.name
                        ));
                    }
                }
            }
        }

        violations
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

/// A demo URL is emitted absolute or not at all. Absolute here means either
/// a full URL with a scheme or a root-relative path (microdata overrides may
/// pin a site-absolute path such as `/explicit/url/`).
fn is_absolute_url(url: &str) -> bool {
    url.contains("://") || url.starts_with('/')
}

/// A source file appearing in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Currently always `"javascript-module"`.
    pub kind: ModuleKind,
    /// Workspace-relative path, forward slashes.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<Export>,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            kind: ModuleKind::JavascriptModule,
            path: path.into(),
            summary: None,
            description: None,
            declarations: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Finds a declaration by name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    #[serde(rename = "javascript-module")]
    JavascriptModule,
}

/// A top-level entity within a module.
///
/// Custom elements are class declarations with `customElement: true` and a
/// populated web-component surface; the flat encoding keeps the JSON codec
/// trivial and the merge logic exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(FunctionDeclaration),
    Variable(VariableDeclaration),
    Mixin(MixinDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Class(d) => &d.name,
            Self::Function(d) => &d.name,
            Self::Variable(d) => &d.name,
            Self::Mixin(d) => &d.name,
        }
    }

    /// Returns the class payload when this declaration is a custom element.
    pub fn as_custom_element(&self) -> Option<&ClassDeclaration> {
        match self {
            Self::Class(class) if class.is_custom_element() => Some(class),
            _ => None,
        }
    }
}

/// A class declaration, optionally carrying the custom-element surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    /// Non-standard lifecycle annotation from the `@status` JSDoc tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// True when this class is registered as a custom element.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub custom_element: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_properties: Vec<CssProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_parts: Vec<CssPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_states: Vec<CssState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub demos: Vec<Demo>,
}

impl ClassDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_custom_element(&self) -> bool {
        self.custom_element
    }

    /// Looks up an attribute by its DOM attribute name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "return")]
    pub return_type: Option<TypeText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// A variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// A class mixin: a function returning a class extending its parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MixinDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// A function or mixin parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Wrapper for a rendered type string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TypeText {
    pub text: String,
}

/// A class member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Member {
    Field(FieldMember),
    Method(MethodMember),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Method(m) => &m.name,
        }
    }

    pub fn privacy(&self) -> Privacy {
        match self {
            Self::Field(f) => f.privacy,
            Self::Method(m) => m.privacy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Privacy::is_public")]
    pub privacy: Privacy,
    #[serde(default, skip_serializing_if = "std::ops::Not::not", rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MethodMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Privacy::is_public")]
    pub privacy: Privacy,
    #[serde(default, skip_serializing_if = "std::ops::Not::not", rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "return")]
    pub return_type: Option<TypeText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Protected,
    Private,
}

impl Privacy {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

/// An observed DOM attribute on a custom element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    /// Backing DOM property, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reflects: bool,
    /// Enumerated legal values, when derivable from the type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// A named or default (`""`) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A CSS custom property consumed by the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CssProperty {
    /// Canonical name: lowercase, `--` prefix preserved.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    /// Design-token metadata attached by the token integration pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenAnnotation>,
}

impl CssProperty {
    /// Canonicalizes a raw property name: lowercase with the `--` prefix
    /// preserved (and added when missing).
    pub fn canonical_name(raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("--") {
            lowered
        } else {
            format!("--{}", lowered.trim_start_matches('-'))
        }
    }
}

/// Design-token metadata resolved from a DTCG token tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A shadow part exposed for styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CssPart {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A custom state exposed via `:state()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CssState {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An event fired by the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
}

/// A demo page attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Demo {
    /// Absolute, canonical URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,
}

/// A link into the source control browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub href: String,
}

/// A reference to a declaration in this or another module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// A module export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Export {
    /// `export class X` / `export { X }`.
    Js {
        name: String,
        declaration: Reference,
    },
    /// A `customElements.define` registration.
    CustomElementDefinition {
        /// The registered tag name.
        name: String,
        declaration: Reference,
    },
}

/// Deprecation marker: either a bare flag or an explanatory message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deprecation {
    Flag(bool),
    Reason(String),
}

impl Deprecation {
    /// Builds a marker from a JSDoc `@deprecated` tag body.
    pub fn from_tag_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            Self::Flag(true)
        } else {
            Self::Reason(trimmed.to_string())
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Flag(_) => None,
            Self::Reason(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_package() -> Package {
        let mut class = ClassDeclaration::new("MyButton");
        class.custom_element = true;
        class.tag_name = Some("my-button".into());
        class.summary = Some("A button.".into());
        class.superclass = Some(Reference {
            name: "LitElement".into(),
            module: None,
            package: Some("lit".into()),
        });
        class.members.push(Member::Field(FieldMember {
            name: "variant".into(),
            type_text: Some("'primary' | 'secondary'".into()),
            default: Some("'primary'".into()),
            ..FieldMember::default()
        }));
        class.attributes.push(Attribute {
            name: "variant".into(),
            field_name: Some("variant".into()),
            type_text: Some("'primary' | 'secondary'".into()),
            default: Some("'primary'".into()),
            reflects: true,
            values: vec!["primary".into(), "secondary".into()],
            ..Attribute::default()
        });
        class.slots.push(Slot {
            name: String::new(),
            description: Some("Button label".into()),
        });
        class.css_properties.push(CssProperty {
            name: "--my-button-color".into(),
            default: Some("rebeccapurple".into()),
            ..CssProperty::default()
        });
        class.demos.push(Demo {
            url: "https://example.com/components/button/demo/".into(),
            ..Demo::default()
        });

        let mut module = Module::new("src/my-button.ts");
        module.declarations.push(Declaration::Class(class));
        module.exports.push(Export::CustomElementDefinition {
            name: "my-button".into(),
            declaration: Reference {
                name: "MyButton".into(),
                module: Some("src/my-button.ts".into()),
                package: None,
            },
        });

        let mut package = Package::new();
        package.modules.push(module);
        package
    }

    #[test]
    fn json_round_trip() {
        let package = sample_package();
        let json = serde_json::to_string_pretty(&package).unwrap();
        let decoded: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(package, decoded);
    }

    #[test]
    fn null_fields_are_omitted() {
        let package = sample_package();
        let json = serde_json::to_string(&package).unwrap();
        assert!(!json.contains("null"));
        // Public privacy and false flags are defaults and stay out of the JSON.
        assert!(!json.contains("\"privacy\""));
        assert!(!json.contains("\"static\""));
    }

    #[test]
    fn kind_discriminators() {
        let package = sample_package();
        let value = serde_json::to_value(&package).unwrap();
        let module = &value["modules"][0];
        assert_eq!(module["kind"], "javascript-module");
        assert_eq!(module["declarations"][0]["kind"], "class");
        assert_eq!(module["declarations"][0]["customElement"], true);
        assert_eq!(module["declarations"][0]["members"][0]["kind"], "field");
        assert_eq!(module["exports"][0]["kind"], "custom-element-definition");
    }

    #[test]
    fn schema_version_parses_as_semver() {
        assert!(Package::new().schema_version_valid());
    }

    #[test]
    fn invariants_hold_for_sample() {
        assert!(sample_package().check_invariants().is_empty());
    }

    #[test]
    fn duplicate_tag_is_a_violation() {
        let mut package = sample_package();
        let mut other = ClassDeclaration::new("OtherButton");
        other.custom_element = true;
        other.tag_name = Some("my-button".into());
        let mut module = Module::new("src/other-button.ts");
        module.declarations.push(Declaration::Class(other));
        package.modules.push(module);

        let violations = package.check_invariants();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("tag 'my-button'"));
    }

    #[test]
    fn custom_element_without_tag_is_a_violation() {
        let mut package = Package::new();
        let mut class = ClassDeclaration::new("Nameless");
        class.custom_element = true;
        let mut module = Module::new("src/nameless.ts");
        module.declarations.push(Declaration::Class(class));
        package.modules.push(module);

        let violations = package.check_invariants();
        assert!(violations[0].contains("no tag name"));
    }

    #[test]
    fn css_property_canonicalization() {
        assert_eq!(CssProperty::canonical_name("--My-Color"), "--my-color");
        assert_eq!(CssProperty::canonical_name("my-color"), "--my-color");
        assert_eq!(CssProperty::canonical_name("  --spacing  "), "--spacing");
    }

    #[test]
    fn deprecation_encoding() {
        let flag = Deprecation::Flag(true);
        assert_eq!(serde_json::to_string(&flag).unwrap(), "true");
        let reason = Deprecation::from_tag_body("  use my-new-button instead ");
        assert_eq!(
            serde_json::to_string(&reason).unwrap(),
            "\"use my-new-button instead\""
        );
        assert_eq!(reason.message(), Some("use my-new-button instead"));
    }

    #[test]
    fn custom_elements_iterator() {
        let package = sample_package();
        let tags: Vec<_> = package
            .custom_elements()
            .map(|(_, c)| c.tag_name.clone().unwrap())
            .collect();
        assert_eq!(tags, vec!["my-button".to_string()]);
    }

    #[test]
    fn deep_clone_is_equal_and_independent() {
        let package = sample_package();
        let mut copy = package.deep_clone();
        assert_eq!(package, copy);
        copy.modules[0].path = "src/elsewhere.ts".into();
        assert_ne!(package, copy);
    }
}
