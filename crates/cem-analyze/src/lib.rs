//! Per-file module analyzers for cem.
//!
//! Each source file runs through one pipeline: parse with a pooled
//! tree-sitter parser, extract the class hierarchy and custom-element
//! identity, walk fields and methods, convert JSDoc blocks into slots, CSS
//! custom properties, shadow parts, and events, and index every tagged
//! template literal for the language server's embedded-language dispatch.

pub mod analyzer;
pub mod attributes;
pub mod classes;
pub mod css;
pub mod exports;
pub mod functions;
pub mod imports;
pub mod jsdoc;
mod node_util;
pub mod templates;

pub use analyzer::{Analyzer, FileContext, ModuleAnalysis};
pub use attributes::{hyphenate, AttributeOption, DecoratorOptions, ParsedDecorator};
pub use imports::{ImportMap, ImportedName};
pub use jsdoc::{parse_block, JsdocInfo};
pub use templates::{template_at, TemplateKind, TemplateRange};
