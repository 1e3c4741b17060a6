//! Core abstractions for cem.
//!
//! This crate provides the foundations shared by every subsystem of the
//! toolchain:
//!
//! - **Manifest model**: the canonical entity types of the custom-elements
//!   manifest, their `kind`-tagged JSON codec, and invariant checks
//! - **Error types**: unified error handling with fatal/non-fatal split and
//!   an error sink joining per-file failures across a run
//! - **Configuration**: the recognized generate/demo/token keys

pub mod config;
pub mod error;
pub mod manifest;

pub use config::{Config, DemoDiscoveryConfig, DesignTokensConfig, GenerateConfig, WarningsConfig};
pub use error::{CemError, ErrorSink, Result};
pub use manifest::{
    Attribute, ClassDeclaration, CssPart, CssProperty, CssState, Declaration, Demo, Deprecation,
    Event, Export, FieldMember, FunctionDeclaration, Member, MethodMember, MixinDeclaration,
    Module, ModuleKind, Package, Parameter, Privacy, Reference, Slot, SourceReference,
    TokenAnnotation, TypeText, VariableDeclaration, SCHEMA_VERSION,
};
