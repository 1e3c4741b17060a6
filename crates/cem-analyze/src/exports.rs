//! Module export extraction.

use std::collections::HashMap;

use tree_sitter::Tree;

use cem_core::{Export, Reference};
use cem_syntax::run_query;

use crate::analyzer::FileContext;
use crate::node_util::{find_kind, text};

/// Extracts `js` exports from export statements and
/// `custom-element-definition` exports from `customElements.define` call
/// sites.
pub fn extract_exports(
    file: &FileContext<'_>,
    tree: &Tree,
    defines: &HashMap<String, String>,
) -> Vec<Export> {
    let mut exports = Vec::new();
    let query = file.queries.get(file.grammar, "exports");

    for hit in run_query(&query, tree.root_node(), file.source) {
        let Some(statement) = hit.node("export.statement") else {
            continue;
        };

        // `export class X` / `export function f` / `export const x`.
        if let Some(declaration) = statement.child_by_field_name("declaration") {
            match declaration.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let mut cursor = declaration.walk();
                    for declarator in declaration.named_children(&mut cursor) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        if let Some(name_node) = declarator.child_by_field_name("name") {
                            if name_node.kind() == "identifier" {
                                push_js(&mut exports, file, text(name_node, file.source));
                            }
                        }
                    }
                }
                _ => {
                    if let Some(name_node) = declaration.child_by_field_name("name") {
                        push_js(&mut exports, file, text(name_node, file.source));
                    }
                }
            }
            continue;
        }

        // `export default <expr>`.
        let is_default = {
            let mut cursor = statement.walk();
            statement.children(&mut cursor).any(|c| c.kind() == "default")
        };
        if is_default {
            let name = statement
                .child_by_field_name("value")
                .filter(|v| v.kind() == "identifier")
                .map_or_else(|| "default".to_string(), |v| text(v, file.source));
            exports.push(Export::Js {
                name: "default".into(),
                declaration: Reference {
                    name,
                    module: Some(file.path.to_string()),
                    package: None,
                },
            });
            continue;
        }

        // `export { A, B as C }` (optionally `from './module'`).
        if let Some(clause) = find_kind(statement, "export_clause") {
            let mut cursor = clause.walk();
            for spec in clause.named_children(&mut cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let Some(name_node) = spec.child_by_field_name("name") else {
                    continue;
                };
                let exported = spec
                    .child_by_field_name("alias")
                    .map_or_else(|| text(name_node, file.source), |a| text(a, file.source));
                exports.push(Export::Js {
                    name: exported,
                    declaration: Reference {
                        name: text(name_node, file.source),
                        module: Some(file.path.to_string()),
                        package: None,
                    },
                });
            }
        }
    }

    // Registration sites export the tag.
    let mut define_exports: Vec<_> = defines.iter().collect();
    define_exports.sort();
    for (class_name, tag) in define_exports {
        exports.push(Export::CustomElementDefinition {
            name: tag.clone(),
            declaration: Reference {
                name: class_name.clone(),
                module: Some(file.path.to_string()),
                package: None,
            },
        });
    }

    exports
}

fn push_js(exports: &mut Vec<Export>, file: &FileContext<'_>, name: String) {
    if name.is_empty() {
        return;
    }
    exports.push(Export::Js {
        name: name.clone(),
        declaration: Reference {
            name,
            module: Some(file.path.to_string()),
            package: None,
        },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FileContext;
    use crate::imports::ImportMap;
    use cem_resolver::AliasMap;
    use cem_syntax::{Grammar, ParserPool, QueryManager};
    use tokio_util::sync::CancellationToken;

    fn exports_of(source: &str, defines: &[(&str, &str)]) -> Vec<Export> {
        let pool = ParserPool::new();
        let queries = QueryManager::new();
        let imports = ImportMap::new();
        let aliases = AliasMap::new();
        let cancel = CancellationToken::new();
        let tree = pool.parse(Grammar::TypeScript, source.as_bytes()).unwrap();
        let file = FileContext {
            grammar: Grammar::TypeScript,
            path: "src/mod.ts",
            source: source.as_bytes(),
            pool: &pool,
            queries: &queries,
            imports: &imports,
            aliases: &aliases,
            resolver: None,
            source_root_url: None,
            cancel: &cancel,
        };
        let defines = defines
            .iter()
            .map(|(class, tag)| ((*class).to_string(), (*tag).to_string()))
            .collect();
        extract_exports(&file, &tree, &defines)
    }

    fn js_names(exports: &[Export]) -> Vec<&str> {
        exports
            .iter()
            .filter_map(|e| match e {
                Export::Js { name, .. } => Some(name.as_str()),
                Export::CustomElementDefinition { .. } => None,
            })
            .collect()
    }

    #[test]
    fn exported_declarations() {
        let exports = exports_of(
            "export class A {}\nexport function f() {}\nexport const x = 1, y = 2;",
            &[],
        );
        assert_eq!(js_names(&exports), vec!["A", "f", "x", "y"]);
    }

    #[test]
    fn export_clause_with_rename() {
        let exports = exports_of("const a = 1;\nexport { a as alias };", &[]);
        let Export::Js { name, declaration } = &exports[0] else {
            panic!()
        };
        assert_eq!(name, "alias");
        assert_eq!(declaration.name, "a");
        assert_eq!(declaration.module.as_deref(), Some("src/mod.ts"));
    }

    #[test]
    fn default_export() {
        let exports = exports_of("const a = 1;\nexport default a;", &[]);
        let Export::Js { name, declaration } = &exports[0] else {
            panic!()
        };
        assert_eq!(name, "default");
        assert_eq!(declaration.name, "a");
    }

    #[test]
    fn define_registration_exports_the_tag() {
        let exports = exports_of("class B {}", &[("B", "b-el")]);
        assert_eq!(exports.len(), 1);
        let Export::CustomElementDefinition { name, declaration } = &exports[0] else {
            panic!()
        };
        assert_eq!(name, "b-el");
        assert_eq!(declaration.name, "B");
    }

    #[test]
    fn no_exports_for_private_module() {
        let exports = exports_of("const internal = 1;", &[]);
        assert!(exports.is_empty());
    }
}
