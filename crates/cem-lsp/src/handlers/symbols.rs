//! Document-symbol handler.
//!
//! Surfaces the manifest's view of a script document: declarations at the
//! top level, members nested under their class.

use std::sync::Arc;

use tower_lsp_server::ls_types::{
    DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse, Position, Range, SymbolKind,
};

use cem_core::{Declaration, Member, Module};

use crate::document::{DocumentLanguage, ServerState};

pub async fn handle_document_symbol(
    state: Arc<ServerState>,
    params: DocumentSymbolParams,
) -> Option<DocumentSymbolResponse> {
    let uri = &params.text_document.uri;
    let doc = state.documents.get(uri)?;
    if doc.language != DocumentLanguage::Script {
        return None;
    }
    let module = state.session.module_by_path(&doc.path)?;
    drop(doc);

    let symbols = module_symbols(&module);
    if symbols.is_empty() {
        return None;
    }
    Some(DocumentSymbolResponse::Nested(symbols))
}

fn module_symbols(module: &Module) -> Vec<DocumentSymbol> {
    module
        .declarations
        .iter()
        .map(|declaration| match declaration {
            Declaration::Class(class) => {
                let detail = class.tag_name.as_ref().map(|tag| format!("<{tag}>"));
                symbol(
                    &class.name,
                    detail,
                    SymbolKind::CLASS,
                    class.members.iter().map(member_symbol).collect(),
                )
            }
            Declaration::Function(function) => {
                symbol(&function.name, None, SymbolKind::FUNCTION, Vec::new())
            }
            Declaration::Variable(variable) => {
                symbol(&variable.name, variable.type_text.clone(), SymbolKind::VARIABLE, Vec::new())
            }
            Declaration::Mixin(mixin) => symbol(
                &mixin.name,
                Some("mixin".into()),
                SymbolKind::FUNCTION,
                mixin.members.iter().map(member_symbol).collect(),
            ),
        })
        .collect()
}

fn member_symbol(member: &Member) -> DocumentSymbol {
    match member {
        Member::Field(field) => symbol(
            &field.name,
            field.type_text.clone(),
            SymbolKind::FIELD,
            Vec::new(),
        ),
        Member::Method(method) => symbol(&method.name, None, SymbolKind::METHOD, Vec::new()),
    }
}

/// The manifest records no precise member ranges; symbols anchor to the
/// document start and rely on names for navigation.
#[allow(deprecated)]
fn symbol(
    name: &str,
    detail: Option<String>,
    kind: SymbolKind,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    let range = Range::new(Position::new(0, 0), Position::new(0, 0));
    DocumentSymbol {
        name: name.to_string(),
        detail,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children: (!children.is_empty()).then_some(children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{ClassDeclaration, FieldMember};

    #[test]
    fn class_symbols_nest_members() {
        let mut class = ClassDeclaration::new("MyButton");
        class.tag_name = Some("my-button".into());
        class.members.push(Member::Field(FieldMember {
            name: "variant".into(),
            ..FieldMember::default()
        }));
        let mut module = Module::new("src/my-button.ts");
        module.declarations.push(Declaration::Class(class));

        let symbols = module_symbols(&module);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "MyButton");
        assert_eq!(symbols[0].detail.as_deref(), Some("<my-button>"));
        let children = symbols[0].children.as_ref().unwrap();
        assert_eq!(children[0].name, "variant");
    }
}
