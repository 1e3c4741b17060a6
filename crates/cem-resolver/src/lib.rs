//! External type resolution for cem.
//!
//! Resolves an import specifier plus an exported type name to a fully
//! expanded string definition suitable for embedding in the manifest as an
//! attribute type. Workspace siblings are consulted before `node_modules`;
//! template-literal types expand to unions of quoted literals; cyclic alias
//! graphs terminate by yielding the re-entered alias name.

pub mod aliases;
pub mod resolver;
pub mod template;

pub use aliases::{
    expand_alias, expand_definition, extract_aliases, extract_jsdoc_typedefs, is_primitive,
    union_literals, AliasMap,
};
pub use resolver::{package_name_of, TypeResolver};
pub use template::is_template;
