//! Class and custom-element extraction.

use std::collections::HashMap;

use tree_sitter::{Node, Tree};

use cem_core::{
    Attribute, ClassDeclaration, ErrorSink, FieldMember, Member, MethodMember, Parameter,
    Privacy, Reference, SourceReference, TypeText,
};
use cem_resolver::{expand_definition, package_name_of, union_literals};
use cem_syntax::run_query;

use crate::analyzer::FileContext;
use crate::attributes::{decorators_of, hyphenate, AttributeOption, ParsedDecorator};
use crate::jsdoc::{parse_block, JsdocInfo};
use crate::node_util::{
    accessibility_of, has_modifier, preceding_jsdoc, text, type_annotation_text,
};

/// Decorator names that register a class as a custom element.
const CUSTOM_ELEMENT_DECORATORS: &[&str] = &["customElement"];

/// Decorator names that mark a field as attribute-backed.
const PROPERTY_DECORATORS: &[&str] = &["property", "attribute", "observedAttribute"];

/// Extracts every class declaration of a parsed module.
///
/// `defines` maps class names to tag names gathered from
/// `customElements.define` call sites in the same file.
pub fn extract_classes(
    file: &FileContext<'_>,
    tree: &Tree,
    defines: &HashMap<String, String>,
    sink: &mut ErrorSink,
) -> Vec<(usize, ClassDeclaration)> {
    let query = file.queries.get(file.grammar, "classes");
    let mut classes = Vec::new();

    for hit in run_query(&query, tree.root_node(), file.source) {
        let (Some(name), Some(node)) = (
            hit.text("class.name", file.source),
            hit.node("class.definition"),
        ) else {
            continue;
        };
        classes.push((node.start_byte(), analyze_class(file, node, name, defines, sink)));
    }

    classes.sort_by_key(|(offset, _)| *offset);
    classes
}

/// Byte spans of every class declaration, for associating embedded
/// templates with their owning class.
pub fn class_spans(
    file: &FileContext<'_>,
    tree: &Tree,
) -> Vec<(String, std::ops::Range<usize>)> {
    let query = file.queries.get(file.grammar, "classes");
    run_query(&query, tree.root_node(), file.source)
        .iter()
        .filter_map(|hit| {
            let name = hit.text("class.name", file.source)?;
            let node = hit.node("class.definition")?;
            Some((name.to_string(), node.byte_range()))
        })
        .collect()
}

fn analyze_class(
    file: &FileContext<'_>,
    node: Node,
    name: &str,
    defines: &HashMap<String, String>,
    sink: &mut ErrorSink,
) -> ClassDeclaration {
    let mut class = ClassDeclaration::new(name);

    let jsdoc = preceding_jsdoc(node, file.source)
        .map(|c| parse_block(&c))
        .unwrap_or_default();

    // Custom-element identity: decorator, define call, or linking JSDoc.
    let decorators = decorators_of(node, file.source);
    let decorator_tag = decorators
        .iter()
        .find(|d| CUSTOM_ELEMENT_DECORATORS.contains(&d.name.as_str()))
        .and_then(|d| d.string_arg.clone());
    let tag_name = decorator_tag
        .or_else(|| defines.get(name).cloned())
        .or_else(|| jsdoc.custom_element_tag.clone());

    if let Some(tag) = tag_name {
        class.custom_element = true;
        class.tag_name = Some(tag);
    }

    class.summary = jsdoc.summary.clone();
    class.description = jsdoc.description.clone();
    class.deprecated = jsdoc.deprecated.clone();
    class.status = jsdoc.status.clone();
    class.slots = jsdoc.slots.clone();
    class.css_parts = jsdoc.css_parts.clone();
    class.css_states = jsdoc.css_states.clone();
    class.events = jsdoc.events.clone();
    class.css_properties = jsdoc.css_properties.clone();
    class.superclass = superclass_of(file, node);
    class.source = source_reference(file, node);

    let (members, attributes) = collect_members(file, node, sink);
    class.members = members;
    class.attributes = merge_attributes(attributes, &jsdoc);
    class
}

/// Walks a class (or class-expression) body, yielding members in source
/// order and the attributes inferred from decorated fields.
pub(crate) fn collect_members(
    file: &FileContext<'_>,
    class_node: Node,
    sink: &mut ErrorSink,
) -> (Vec<Member>, Vec<Attribute>) {
    let mut members = Vec::new();
    let mut attributes = Vec::new();

    if let Some(body) = class_node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "public_field_definition" | "field_definition" => {
                    if let Some((field, attribute)) = analyze_field(file, member, sink) {
                        if let Some(attribute) = attribute {
                            attributes.push(attribute);
                        }
                        members.push(Member::Field(field));
                    }
                }
                "method_definition" => {
                    if let Some(method) = analyze_method(file, member) {
                        members.push(Member::Method(method));
                    }
                }
                _ => {}
            }
        }
    }

    (members, attributes)
}

/// Decorated-field attributes in source order, then JSDoc-only `@attr`
/// entries. A JSDoc entry matching a field attribute by name contributes
/// its description instead of a second attribute.
fn merge_attributes(mut attributes: Vec<Attribute>, jsdoc: &JsdocInfo) -> Vec<Attribute> {
    for doc_attr in &jsdoc.attributes {
        if let Some(existing) = attributes.iter_mut().find(|a| a.name == doc_attr.name) {
            if existing.description.is_none() {
                existing.description = doc_attr.description.clone();
            }
        } else {
            attributes.push(doc_attr.clone());
        }
    }
    attributes
}

fn analyze_field(
    file: &FileContext<'_>,
    node: Node,
    sink: &mut ErrorSink,
) -> Option<(FieldMember, Option<Attribute>)> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| node.child_by_field_name("property"))?;
    let name = text(name_node, file.source);
    if name.is_empty() {
        return None;
    }

    let privacy = privacy_of(node, &name, file.source);
    let description = preceding_jsdoc(node, file.source).map(|c| parse_block(&c));
    let raw_type = type_annotation_text(node, file.source);
    let default = node
        .child_by_field_name("value")
        .map(|v| text(v, file.source));

    let (type_text, values) = match &raw_type {
        Some(raw) => {
            let (expanded, values) = resolve_type(file, raw, sink);
            (Some(expanded), values)
        }
        None => (None, Vec::new()),
    };

    let field = FieldMember {
        name: name.clone(),
        privacy,
        is_static: has_modifier(node, "static"),
        description: description
            .as_ref()
            .and_then(|d| d.description.clone()),
        type_text: type_text.clone(),
        default: default.clone(),
        inherited_from: None,
        deprecated: description.as_ref().and_then(|d| d.deprecated.clone()),
    };

    let attribute = infer_attribute(file, node, &field, type_text, values, default);
    Some((field, attribute))
}

/// Builds the attribute backed by a decorated field, when the decorator
/// options do not suppress it.
fn infer_attribute(
    file: &FileContext<'_>,
    node: Node,
    field: &FieldMember,
    type_text: Option<String>,
    values: Vec<String>,
    default: Option<String>,
) -> Option<Attribute> {
    let decorators = decorators_of(node, file.source);
    let decorator = decorators
        .iter()
        .find(|d| PROPERTY_DECORATORS.contains(&d.name.as_str()))?;

    // Non-public fields never back an attribute.
    if !field.privacy.is_public() {
        return None;
    }

    let name = match &decorator.options.attribute {
        AttributeOption::Suppressed => return None,
        AttributeOption::Named(name) => name.clone(),
        AttributeOption::Default => hyphenate(&field.name),
    };

    let type_text = type_text.or_else(|| converter_type(decorator));

    Some(Attribute {
        name,
        field_name: Some(field.name.clone()),
        description: field.description.clone(),
        type_text,
        default,
        reflects: decorator.options.reflect,
        values,
        deprecated: field.deprecated.clone(),
    })
}

/// Falls back to the decorator's converter hint (`type: String`) when the
/// field carries no annotation.
fn converter_type(decorator: &ParsedDecorator) -> Option<String> {
    decorator.options.type_hint.as_deref().map(|hint| {
        match hint {
            "String" => "string",
            "Number" => "number",
            "Boolean" => "boolean",
            "Array" => "unknown[]",
            "Object" => "object",
            other => other,
        }
        .to_string()
    })
}

fn analyze_method(file: &FileContext<'_>, node: Node) -> Option<MethodMember> {
    let name_node = node.child_by_field_name("name")?;
    let name = text(name_node, file.source);
    if name.is_empty() || name == "constructor" {
        return None;
    }

    let jsdoc = preceding_jsdoc(node, file.source).map(|c| parse_block(&c));
    let mut parameters = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let optional = param.kind() == "optional_parameter";
            if !matches!(param.kind(), "required_parameter" | "optional_parameter" | "identifier") {
                continue;
            }
            let pattern = param
                .child_by_field_name("pattern")
                .unwrap_or(param);
            parameters.push(Parameter {
                name: text(pattern, file.source),
                type_text: type_annotation_text(param, file.source),
                description: None,
                optional,
            });
        }
    }

    let return_type = node
        .child_by_field_name("return_type")
        .and_then(|annotation| annotation.named_child(0))
        .map(|inner| TypeText {
            text: text(inner, file.source),
        });

    Some(MethodMember {
        name: name.clone(),
        privacy: privacy_of(node, &name, file.source),
        is_static: has_modifier(node, "static"),
        description: jsdoc.as_ref().and_then(|d| d.description.clone()),
        parameters,
        return_type,
        inherited_from: None,
        deprecated: jsdoc.and_then(|d| d.deprecated),
    })
}

fn privacy_of(node: Node, name: &str, source: &[u8]) -> Privacy {
    if name.starts_with('#') {
        return Privacy::Private;
    }
    match accessibility_of(node, source).as_deref() {
        Some("private") => Privacy::Private,
        Some("protected") => Privacy::Protected,
        _ => Privacy::Public,
    }
}

/// Resolves a raw type annotation to its expanded form and derivable value
/// enumeration. Imported aliases go through the external resolver; local
/// aliases expand through the file's own alias map.
pub(crate) fn resolve_type(
    file: &FileContext<'_>,
    raw: &str,
    sink: &mut ErrorSink,
) -> (String, Vec<String>) {
    let trimmed = raw.trim();

    let expanded = match (file.imports.get(trimmed), file.resolver) {
        (Some(import), Some(resolver)) if package_name_of(&import.specifier).is_some() => {
            match resolver.resolve(&import.specifier, &import.imported, file.cancel) {
                Ok(expanded) => expanded,
                Err(error) => {
                    // Warning-level: the manifest keeps the unresolved name.
                    sink.push(error);
                    trimmed.to_string()
                }
            }
        }
        _ => expand_definition(trimmed, file.aliases),
    };

    let values = union_literals(&expanded).unwrap_or_default();
    (expanded, values)
}

fn superclass_of(file: &FileContext<'_>, class_node: Node) -> Option<Reference> {
    let heritage = crate::node_util::find_kind(class_node, "class_heritage")?;
    let name_node = crate::node_util::find_kind(heritage, "identifier")?;
    let name = text(name_node, file.source);

    let mut reference = Reference {
        name: name.clone(),
        module: None,
        package: None,
    };
    if let Some(import) = file.imports.get(&name) {
        if let Some((package, _)) = package_name_of(&import.specifier) {
            reference.package = Some(package);
        } else {
            reference.module = Some(import.specifier.clone());
        }
    }
    Some(reference)
}

/// Builds a source link when the workspace configures a source-control
/// root URL.
pub(crate) fn source_reference(file: &FileContext<'_>, node: Node) -> Option<SourceReference> {
    let root = file.source_root_url?;
    let line = node.start_position().row + 1;
    Some(SourceReference {
        href: format!("{}/{}#L{line}", root.trim_end_matches('/'), file.path),
    })
}

/// Gathers `customElements.define("tag", Class)` registrations of a file,
/// mapping class name to tag name. Registrations whose class argument is
/// not a plain identifier map from the tag to itself under an empty name.
pub fn extract_defines(file: &FileContext<'_>, tree: &Tree) -> HashMap<String, String> {
    let query = file.queries.get(file.grammar, "defineCalls");
    let mut defines = HashMap::new();

    for hit in run_query(&query, tree.root_node(), file.source) {
        if hit.text("define.object", file.source) != Some("customElements")
            || hit.text("define.property", file.source) != Some("define")
        {
            continue;
        }
        let Some(tag) = hit.text("define.tag", file.source) else {
            continue;
        };
        let Some(call) = hit.node("define.call") else {
            continue;
        };
        // Second argument: the registered class.
        let class_name = call
            .child_by_field_name("arguments")
            .and_then(|arguments| {
                let mut cursor = arguments.walk();
                arguments
                    .named_children(&mut cursor)
                    .find(|a| a.kind() == "identifier")
                    .map(|a| text(a, file.source))
            })
            .unwrap_or_default();
        defines.insert(class_name, tag.to_string());
    }

    defines
}
