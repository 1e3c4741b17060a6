//! Import maps: which local binding came from which module specifier.

use std::collections::HashMap;

use tree_sitter::{Node, Tree};

use cem_syntax::{run_query, Grammar, QueryManager};

/// One imported binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Local binding name used in this file.
    pub local: String,
    /// Exported name in the source module (differs under `as` renames).
    pub imported: String,
    /// Raw module specifier text.
    pub specifier: String,
}

/// Local binding name -> import record for a single file.
pub type ImportMap = HashMap<String, ImportedName>;

/// Extracts the import map of a parsed TS/JS file.
pub fn extract_imports(
    queries: &QueryManager,
    grammar: Grammar,
    tree: &Tree,
    source: &[u8],
) -> ImportMap {
    let mut map = ImportMap::new();
    let query = queries.get(grammar, "imports");

    for hit in run_query(&query, tree.root_node(), source) {
        let Some(specifier) = hit.text("import.source", source) else {
            continue;
        };
        let Some(statement) = hit.node("import.statement") else {
            continue;
        };
        collect_bindings(statement, source, specifier, &mut map);
    }
    map
}

fn collect_bindings(statement: Node, source: &[u8], specifier: &str, map: &mut ImportMap) {
    let mut cursor = statement.walk();
    for child in statement.children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for clause_child in child.children(&mut clause_cursor) {
            match clause_child.kind() {
                // Default import: `import Foo from '...'`.
                "identifier" => {
                    let local = text(clause_child, source);
                    map.insert(
                        local.clone(),
                        ImportedName {
                            local,
                            imported: "default".into(),
                            specifier: specifier.into(),
                        },
                    );
                }
                "named_imports" => {
                    let mut named_cursor = clause_child.walk();
                    for spec in clause_child.children(&mut named_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let imported = spec.child_by_field_name("name");
                        let alias = spec.child_by_field_name("alias");
                        let (Some(imported), local) = (imported, alias) else {
                            continue;
                        };
                        let imported = text(imported, source);
                        let local = local.map_or_else(|| imported.clone(), |n| text(n, source));
                        map.insert(
                            local.clone(),
                            ImportedName {
                                local,
                                imported,
                                specifier: specifier.into(),
                            },
                        );
                    }
                }
                "namespace_import" => {
                    // `import * as ns` — the identifier has no field name.
                    let mut ns_cursor = clause_child.walk();
                    for ns_child in clause_child.children(&mut ns_cursor) {
                        if ns_child.kind() == "identifier" {
                            let local = text(ns_child, source);
                            map.insert(
                                local.clone(),
                                ImportedName {
                                    local,
                                    imported: "*".into(),
                                    specifier: specifier.into(),
                                },
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}
