//! Superclass member inheritance within a package.
//!
//! When a class extends another class declared in the same package, the
//! superclass's public members surface on the subclass marked with
//! `inheritedFrom`, unless the subclass overrides them. External
//! superclasses (installed packages) contribute nothing; their members are
//! not part of this manifest.

use std::collections::HashMap;

use cem_core::{ClassDeclaration, Declaration, Member, Package, Reference};

/// Resolves in-package inheritance for every class declaration.
///
/// Chains are followed transitively; cycles terminate because each class
/// is resolved at most once.
pub fn resolve_inheritance(package: &mut Package) {
    // Snapshot of every class by name with its module path.
    let classes: HashMap<String, (String, ClassDeclaration)> = package
        .modules
        .iter()
        .flat_map(|module| {
            module.declarations.iter().filter_map(move |declaration| {
                let Declaration::Class(class) = declaration else {
                    return None;
                };
                Some((class.name.clone(), (module.path.clone(), class.clone())))
            })
        })
        .collect();

    for module in &mut package.modules {
        for declaration in &mut module.declarations {
            let Declaration::Class(class) = declaration else {
                continue;
            };
            let mut inherited = Vec::new();
            let mut visited = vec![class.name.clone()];
            let mut current = class.superclass.clone();

            while let Some(superclass) = current {
                // External superclasses are outside this manifest.
                if superclass.package.is_some() {
                    break;
                }
                if visited.contains(&superclass.name) {
                    break;
                }
                visited.push(superclass.name.clone());

                let Some((super_path, super_class)) = classes.get(&superclass.name) else {
                    break;
                };
                for member in &super_class.members {
                    if !member.privacy().is_public() {
                        continue;
                    }
                    let overridden = class.members.iter().any(|m| m.name() == member.name())
                        || inherited
                            .iter()
                            .any(|m: &Member| m.name() == member.name());
                    if overridden {
                        continue;
                    }
                    inherited.push(mark_inherited(
                        member.clone(),
                        Reference {
                            name: super_class.name.clone(),
                            module: Some(super_path.clone()),
                            package: None,
                        },
                    ));
                }
                current = super_class.superclass.clone();
            }

            class.members.extend(inherited);
        }
    }
}

fn mark_inherited(mut member: Member, from: Reference) -> Member {
    match &mut member {
        Member::Field(field) => field.inherited_from = Some(from),
        Member::Method(method) => method.inherited_from = Some(from),
    }
    member
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{FieldMember, MethodMember, Module, Privacy};
    use pretty_assertions::assert_eq;

    fn class_with(name: &str, members: Vec<Member>, superclass: Option<&str>) -> ClassDeclaration {
        let mut class = ClassDeclaration::new(name);
        class.members = members;
        class.superclass = superclass.map(|s| Reference {
            name: s.into(),
            module: None,
            package: None,
        });
        class
    }

    fn field(name: &str) -> Member {
        Member::Field(FieldMember {
            name: name.into(),
            ..FieldMember::default()
        })
    }

    fn package_of(entries: Vec<(&str, ClassDeclaration)>) -> Package {
        let mut package = Package::new();
        for (path, class) in entries {
            let mut module = Module::new(path);
            module.declarations.push(Declaration::Class(class));
            package.modules.push(module);
        }
        package
    }

    fn members_of<'a>(package: &'a Package, class: &str) -> &'a [Member] {
        package
            .modules
            .iter()
            .flat_map(|m| &m.declarations)
            .find_map(|d| match d {
                Declaration::Class(c) if c.name == class => Some(c.members.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn inherits_public_members() {
        let base = class_with("Base", vec![field("shared")], None);
        let derived = class_with("Derived", vec![field("own")], Some("Base"));
        let mut package = package_of(vec![("src/base.ts", base), ("src/derived.ts", derived)]);

        resolve_inheritance(&mut package);

        let members = members_of(&package, "Derived");
        assert_eq!(members.len(), 2);
        let Member::Field(inherited) = &members[1] else { panic!() };
        assert_eq!(inherited.name, "shared");
        assert_eq!(
            inherited.inherited_from.as_ref().unwrap().module.as_deref(),
            Some("src/base.ts")
        );
    }

    #[test]
    fn overrides_are_not_duplicated() {
        let base = class_with("Base", vec![field("render")], None);
        let derived = class_with("Derived", vec![field("render")], Some("Base"));
        let mut package = package_of(vec![("src/base.ts", base), ("src/derived.ts", derived)]);

        resolve_inheritance(&mut package);
        assert_eq!(members_of(&package, "Derived").len(), 1);
    }

    #[test]
    fn private_members_stay_put() {
        let mut secret = FieldMember {
            name: "internal".into(),
            ..FieldMember::default()
        };
        secret.privacy = Privacy::Private;
        let base = class_with("Base", vec![Member::Field(secret)], None);
        let derived = class_with("Derived", Vec::new(), Some("Base"));
        let mut package = package_of(vec![("src/base.ts", base), ("src/derived.ts", derived)]);

        resolve_inheritance(&mut package);
        assert!(members_of(&package, "Derived").is_empty());
    }

    #[test]
    fn transitive_chains_resolve() {
        let a = class_with("A", vec![field("root")], None);
        let b = class_with("B", Vec::new(), Some("A"));
        let c = class_with("C", Vec::new(), Some("B"));
        let mut package = package_of(vec![
            ("src/a.ts", a),
            ("src/b.ts", b),
            ("src/c.ts", c),
        ]);

        resolve_inheritance(&mut package);
        let members = members_of(&package, "C");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name(), "root");
    }

    #[test]
    fn external_superclasses_contribute_nothing() {
        let mut derived = class_with("Widget", Vec::new(), None);
        derived.superclass = Some(Reference {
            name: "LitElement".into(),
            module: None,
            package: Some("lit".into()),
        });
        let mut package = package_of(vec![("src/widget.ts", derived)]);

        resolve_inheritance(&mut package);
        assert!(members_of(&package, "Widget").is_empty());
    }

    #[test]
    fn superclass_cycles_terminate() {
        let a = class_with("A", vec![field("x")], Some("B"));
        let b = class_with("B", vec![field("y")], Some("A"));
        let mut package = package_of(vec![("src/a.ts", a), ("src/b.ts", b)]);

        resolve_inheritance(&mut package);
        // Each class gains the other's member exactly once.
        assert_eq!(members_of(&package, "A").len(), 2);
        assert_eq!(members_of(&package, "B").len(), 2);
    }

    #[test]
    fn method_inheritance_marks_origin() {
        let base = class_with(
            "Base",
            vec![Member::Method(MethodMember {
                name: "focus".into(),
                ..MethodMember::default()
            })],
            None,
        );
        let derived = class_with("Derived", Vec::new(), Some("Base"));
        let mut package = package_of(vec![("src/base.ts", base), ("src/derived.ts", derived)]);

        resolve_inheritance(&mut package);
        let Member::Method(method) = &members_of(&package, "Derived")[0] else {
            panic!()
        };
        assert_eq!(method.inherited_from.as_ref().unwrap().name, "Base");
    }
}
