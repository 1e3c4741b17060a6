//! Small tree-walking helpers shared by the analyzers.

use tree_sitter::Node;

/// Source text of a node, empty on invalid UTF-8.
pub(crate) fn text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}

/// Depth-first search for the first node of `kind`.
pub(crate) fn find_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_kind(child, kind) {
            return Some(found);
        }
    }
    None
}

/// Depth-first collection of every node of `kind`.
pub(crate) fn collect_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_kind(child, kind, out);
    }
}

/// The JSDoc comment immediately preceding `node`, if any.
///
/// Walks past decorators and the export statement wrapper so a block above
/// `@customElement(...) export class X` still attaches to the class.
pub(crate) fn preceding_jsdoc(node: Node, source: &[u8]) -> Option<String> {
    let mut anchor = node;
    if let Some(parent) = node.parent() {
        if parent.kind() == "export_statement" {
            anchor = parent;
        }
    }
    let mut prev = anchor.prev_sibling();
    while let Some(candidate) = prev {
        match candidate.kind() {
            "comment" => {
                let body = text(candidate, source);
                if body.starts_with("/**") {
                    return Some(body);
                }
                // Plain comments between the block and the node hide it.
                return None;
            }
            "decorator" => {
                prev = candidate.prev_sibling();
            }
            _ => return None,
        }
    }
    None
}

/// First named child of the `type_annotation` attached to `node`, as text.
/// The annotation node itself includes the leading `:`.
pub(crate) fn type_annotation_text(node: Node, source: &[u8]) -> Option<String> {
    let annotation = node.child_by_field_name("type")?;
    let inner = annotation.named_child(0)?;
    Some(text(inner, source))
}

/// True when `node` has a bare `static` modifier token.
pub(crate) fn has_modifier(node: Node, modifier: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == modifier)
}

/// Accessibility modifier text (`private`, `protected`, `public`), if any.
pub(crate) fn accessibility_of(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| c.kind() == "accessibility_modifier")
        .map(|c| text(c, source))
}
