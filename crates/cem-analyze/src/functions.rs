//! Function, variable, and mixin declarations.
//!
//! Only exported top-level bindings appear in the manifest. A function (or
//! arrow) returning a class expression that extends one of its own
//! parameters is a mixin.

use tree_sitter::{Node, Tree};

use cem_core::{
    Declaration, ErrorSink, FunctionDeclaration, MixinDeclaration, Parameter, TypeText,
    VariableDeclaration,
};

use crate::analyzer::FileContext;
use crate::classes::{collect_members, source_reference};
use crate::jsdoc::parse_block;
use crate::node_util::{collect_kind, preceding_jsdoc, text, type_annotation_text};

/// Extracts exported function/variable/mixin declarations with their
/// source offsets.
pub fn extract_functions(
    file: &FileContext<'_>,
    tree: &Tree,
    sink: &mut ErrorSink,
) -> Vec<(usize, Declaration)> {
    let mut declarations = Vec::new();
    let root = tree.root_node();

    let mut cursor = root.walk();
    for top in root.named_children(&mut cursor) {
        if top.kind() != "export_statement" {
            continue;
        }
        let Some(declaration) = top.child_by_field_name("declaration") else {
            continue;
        };
        match declaration.kind() {
            "function_declaration" => {
                if let Some(decl) = analyze_function(file, declaration, sink) {
                    declarations.push((top.start_byte(), decl));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut decl_cursor = declaration.walk();
                for declarator in declaration.named_children(&mut decl_cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(decl) = analyze_declarator(file, declarator, sink) {
                        declarations.push((top.start_byte(), decl));
                    }
                }
            }
            _ => {}
        }
    }

    declarations
}

fn analyze_function(
    file: &FileContext<'_>,
    node: Node,
    sink: &mut ErrorSink,
) -> Option<Declaration> {
    let name = text(node.child_by_field_name("name")?, file.source);
    let parameters = parameters_of(file, node);
    let jsdoc = preceding_jsdoc(node, file.source).map(|c| parse_block(&c));

    if let Some(body) = node.child_by_field_name("body") {
        if let Some(mixin_class) = returned_mixin_class(body, &parameters, file.source) {
            let (members, _) = collect_members(file, mixin_class, sink);
            return Some(Declaration::Mixin(MixinDeclaration {
                name,
                summary: jsdoc.as_ref().and_then(|d| d.summary.clone()),
                description: jsdoc.as_ref().and_then(|d| d.description.clone()),
                parameters,
                members,
                source: source_reference(file, node),
                deprecated: jsdoc.and_then(|d| d.deprecated),
            }));
        }
    }

    let return_type = node
        .child_by_field_name("return_type")
        .and_then(|annotation| annotation.named_child(0))
        .map(|inner| TypeText {
            text: text(inner, file.source),
        });

    Some(Declaration::Function(FunctionDeclaration {
        name,
        summary: jsdoc.as_ref().and_then(|d| d.summary.clone()),
        description: jsdoc.as_ref().and_then(|d| d.description.clone()),
        parameters,
        return_type,
        source: source_reference(file, node),
        deprecated: jsdoc.and_then(|d| d.deprecated),
    }))
}

fn analyze_declarator(
    file: &FileContext<'_>,
    declarator: Node,
    sink: &mut ErrorSink,
) -> Option<Declaration> {
    let name_node = declarator.child_by_field_name("name")?;
    if name_node.kind() != "identifier" {
        // Destructuring exports carry no single manifest name.
        return None;
    }
    let name = text(name_node, file.source);
    let jsdoc = preceding_jsdoc(declarator_anchor(declarator), file.source).map(|c| parse_block(&c));
    let value = declarator.child_by_field_name("value");

    // `export const Mixin = (base) => class extends base { ... }`.
    if let Some(value) = value {
        if value.kind() == "arrow_function" || value.kind() == "function_expression" {
            let parameters = parameters_of(file, value);
            if let Some(body) = value.child_by_field_name("body") {
                if let Some(mixin_class) = returned_mixin_class(body, &parameters, file.source) {
                    let (members, _) = collect_members(file, mixin_class, sink);
                    return Some(Declaration::Mixin(MixinDeclaration {
                        name,
                        summary: jsdoc.as_ref().and_then(|d| d.summary.clone()),
                        description: jsdoc.as_ref().and_then(|d| d.description.clone()),
                        parameters,
                        members,
                        source: source_reference(file, declarator),
                        deprecated: jsdoc.and_then(|d| d.deprecated),
                    }));
                }
            }
            return Some(Declaration::Function(FunctionDeclaration {
                name,
                summary: jsdoc.as_ref().and_then(|d| d.summary.clone()),
                description: jsdoc.as_ref().and_then(|d| d.description.clone()),
                parameters: parameters_of(file, value),
                return_type: None,
                source: source_reference(file, declarator),
                deprecated: jsdoc.and_then(|d| d.deprecated),
            }));
        }
    }

    Some(Declaration::Variable(VariableDeclaration {
        name,
        summary: jsdoc.as_ref().and_then(|d| d.summary.clone()),
        description: jsdoc.as_ref().and_then(|d| d.description.clone()),
        type_text: type_annotation_text(declarator, file.source),
        default: value.map(|v| text(v, file.source)),
        source: source_reference(file, declarator),
        deprecated: jsdoc.and_then(|d| d.deprecated),
    }))
}

/// JSDoc for `export const x = ...` sits above the export statement, two
/// levels up from the declarator.
fn declarator_anchor(declarator: Node) -> Node {
    declarator
        .parent()
        .filter(|p| matches!(p.kind(), "lexical_declaration" | "variable_declaration"))
        .unwrap_or(declarator)
}

fn parameters_of(file: &FileContext<'_>, callable: Node) -> Vec<Parameter> {
    let Some(params) = callable.child_by_field_name("parameters") else {
        // Single-parameter arrow without parens.
        if let Some(param) = callable.child_by_field_name("parameter") {
            return vec![Parameter {
                name: text(param, file.source),
                type_text: None,
                description: None,
                optional: false,
            }];
        }
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let optional = param.kind() == "optional_parameter";
        if !matches!(
            param.kind(),
            "required_parameter" | "optional_parameter" | "identifier"
        ) {
            continue;
        }
        let pattern = param.child_by_field_name("pattern").unwrap_or(param);
        out.push(Parameter {
            name: text(pattern, file.source),
            type_text: type_annotation_text(param, file.source),
            description: None,
            optional,
        });
    }
    out
}

/// Finds a class expression inside `body` whose heritage names one of the
/// surrounding callable's parameters.
fn returned_mixin_class<'t>(
    body: Node<'t>,
    parameters: &[Parameter],
    source: &[u8],
) -> Option<Node<'t>> {
    let mut candidates = Vec::new();
    collect_kind(body, "class", &mut candidates);
    collect_kind(body, "class_declaration", &mut candidates);

    candidates.into_iter().find(|class| {
        let Some(heritage) = crate::node_util::find_kind(*class, "class_heritage") else {
            return false;
        };
        let mut idents = Vec::new();
        collect_kind(heritage, "identifier", &mut idents);
        idents.iter().any(|ident| {
            let name = ident.utf8_text(source).unwrap_or_default();
            parameters.iter().any(|p| p.name == name)
        })
    })
}
