//! Module merging and package-level invariant enforcement.

use std::collections::HashMap;

use cem_core::{CemError, Declaration, Module, Package};

/// Replaces modules by path, preserving the positions of existing modules
/// and appending new ones in their given order.
pub fn merge_modules(package: &mut Package, modules: Vec<Module>) {
    let positions: HashMap<String, usize> = package
        .modules
        .iter()
        .enumerate()
        .map(|(index, module)| (module.path.clone(), index))
        .collect();

    for module in modules {
        match positions.get(&module.path) {
            Some(&index) => package.modules[index] = module,
            None => package.modules.push(module),
        }
    }
}

/// Removes the module at `path`, shifting later modules up.
pub fn remove_module(package: &mut Package, path: &str) -> bool {
    let before = package.modules.len();
    package.modules.retain(|module| module.path != path);
    package.modules.len() != before
}

/// Enforces package-wide tag uniqueness: the first claimant in module
/// order keeps the tag, later claimants are demoted to plain classes and
/// reported.
pub fn enforce_tag_uniqueness(package: &mut Package) -> Vec<CemError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for module in &mut package.modules {
        for declaration in &mut module.declarations {
            let Declaration::Class(class) = declaration else {
                continue;
            };
            let Some(tag) = class.tag_name.clone() else {
                continue;
            };
            match seen.get(&tag) {
                None => {
                    seen.insert(tag, module.path.clone());
                }
                Some(first) => {
                    errors.push(CemError::InvariantViolation(format!(
                        "tag '{tag}' already declared in '{first}'; ignoring declaration '{}' in '{}'",
                        class.name, module.path
                    )));
                    class.tag_name = None;
                    class.custom_element = false;
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::ClassDeclaration;
    use pretty_assertions::assert_eq;

    fn module_with_tag(path: &str, class: &str, tag: &str) -> Module {
        let mut declaration = ClassDeclaration::new(class);
        declaration.custom_element = true;
        declaration.tag_name = Some(tag.into());
        let mut module = Module::new(path);
        module.declarations.push(Declaration::Class(declaration));
        module
    }

    fn paths(package: &Package) -> Vec<&str> {
        package.modules.iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn replace_preserves_position() {
        let mut package = Package::new();
        package.modules = vec![
            Module::new("src/a.ts"),
            Module::new("src/b.ts"),
            Module::new("src/c.ts"),
        ];

        let mut replacement = Module::new("src/b.ts");
        replacement.summary = Some("updated".into());
        merge_modules(&mut package, vec![replacement]);

        assert_eq!(paths(&package), vec!["src/a.ts", "src/b.ts", "src/c.ts"]);
        assert_eq!(package.modules[1].summary.as_deref(), Some("updated"));
    }

    #[test]
    fn new_modules_append() {
        let mut package = Package::new();
        package.modules = vec![Module::new("src/a.ts")];
        merge_modules(&mut package, vec![Module::new("src/z.ts")]);
        assert_eq!(paths(&package), vec!["src/a.ts", "src/z.ts"]);
    }

    #[test]
    fn remove_shifts_later_modules() {
        let mut package = Package::new();
        package.modules = vec![Module::new("src/a.ts"), Module::new("src/b.ts")];
        assert!(remove_module(&mut package, "src/a.ts"));
        assert_eq!(paths(&package), vec!["src/b.ts"]);
        assert!(!remove_module(&mut package, "src/a.ts"));
    }

    #[test]
    fn first_tag_claimant_wins() {
        let mut package = Package::new();
        package.modules = vec![
            module_with_tag("src/a.ts", "AButton", "x-button"),
            module_with_tag("src/b.ts", "BButton", "x-button"),
        ];

        let errors = enforce_tag_uniqueness(&mut package);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("x-button"));

        let Declaration::Class(first) = &package.modules[0].declarations[0] else {
            panic!()
        };
        let Declaration::Class(second) = &package.modules[1].declarations[0] else {
            panic!()
        };
        assert_eq!(first.tag_name.as_deref(), Some("x-button"));
        assert!(second.tag_name.is_none());
        assert!(!second.custom_element);
        assert!(package.check_invariants().is_empty());
    }
}
