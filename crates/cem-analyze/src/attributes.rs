//! Decorator parsing and attribute inference.
//!
//! A decorated field (`@property(...)`, `@attribute(...)`) marks itself as
//! an attribute. The attribute name defaults to the hyphenated property
//! name unless the decorator options name one explicitly or suppress the
//! attribute altogether.

use tree_sitter::Node;

/// A parsed decorator call site.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDecorator {
    pub name: String,
    /// First string argument (`@customElement('my-button')`).
    pub string_arg: Option<String>,
    pub options: DecoratorOptions,
}

/// Recognized keys of a `@property({...})` options object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecoratorOptions {
    pub attribute: AttributeOption,
    pub reflect: bool,
    /// Converter hint (`type: String`), kept as source text.
    pub type_hint: Option<String>,
}

/// The `attribute` option of a property decorator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeOption {
    /// Absent: the attribute name derives from the field name.
    #[default]
    Default,
    /// `attribute: 'explicit-name'`.
    Named(String),
    /// `attribute: false`: no observed attribute.
    Suppressed,
}

/// Parses one `decorator` node.
pub fn parse_decorator(node: Node, source: &[u8]) -> Option<ParsedDecorator> {
    debug_assert_eq!(node.kind(), "decorator");
    let inner = node.named_child(0)?;

    match inner.kind() {
        "identifier" => Some(ParsedDecorator {
            name: text(inner, source),
            string_arg: None,
            options: DecoratorOptions::default(),
        }),
        "call_expression" => {
            let function = inner.child_by_field_name("function")?;
            // Member-expression decorators (`@foo.bar()`) are not attribute
            // decorators; keep the full text as the name.
            let name = text(function, source);
            let arguments = inner.child_by_field_name("arguments");

            let mut string_arg = None;
            let mut options = DecoratorOptions::default();
            if let Some(arguments) = arguments {
                let mut cursor = arguments.walk();
                for arg in arguments.named_children(&mut cursor) {
                    match arg.kind() {
                        "string" => {
                            string_arg.get_or_insert_with(|| string_value(arg, source));
                        }
                        "object" => options = parse_options(arg, source),
                        _ => {}
                    }
                }
            }
            Some(ParsedDecorator {
                name,
                string_arg,
                options,
            })
        }
        _ => None,
    }
}

/// Collects every decorator attached to a class or member node.
pub fn decorators_of(node: Node, source: &[u8]) -> Vec<ParsedDecorator> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Some(parsed) = parse_decorator(child, source) {
                decorators.push(parsed);
            }
        }
    }
    // Decorators on an exported class hang off the export statement.
    if decorators.is_empty() {
        if let Some(parent) = node.parent() {
            if parent.kind() == "export_statement" {
                let mut cursor = parent.walk();
                for child in parent.children(&mut cursor) {
                    if child.kind() == "decorator" {
                        if let Some(parsed) = parse_decorator(child, source) {
                            decorators.push(parsed);
                        }
                    }
                }
            }
        }
    }
    decorators
}

fn parse_options(object: Node, source: &[u8]) -> DecoratorOptions {
    let mut options = DecoratorOptions::default();
    let mut cursor = object.walk();
    for pair in object.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let (Some(key), Some(value)) = (
            pair.child_by_field_name("key"),
            pair.child_by_field_name("value"),
        ) else {
            continue;
        };
        match text(key, source).trim_matches(['\'', '"']) {
            "attribute" => {
                options.attribute = match value.kind() {
                    "false" => AttributeOption::Suppressed,
                    "string" => AttributeOption::Named(string_value(value, source)),
                    _ => AttributeOption::Default,
                };
            }
            "reflect" => options.reflect = value.kind() == "true",
            "type" => options.type_hint = Some(text(value, source)),
            _ => {}
        }
    }
    options
}

/// Extracts the fragment of a `string` node without its quotes.
pub fn string_value(node: Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "string_fragment" {
            return text(child, source);
        }
    }
    // Empty string literal: no fragment child.
    String::new()
}

/// camelCase to kebab-case, the default property-to-attribute rule.
pub fn hyphenate(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}
