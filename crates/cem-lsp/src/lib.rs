//! The cem language server.
//!
//! A long-lived session on top of the generation engine: it maintains the
//! in-memory manifest, watches source files, re-analyzes only affected
//! modules on change, keeps a tag-name index, and answers hover,
//! completion, references, document-symbol, and diagnostic requests —
//! including cursor positions inside `html` tagged template literals.

pub mod config;
pub mod document;
pub mod embedded;
pub mod handlers;
pub mod lifecycle;
pub mod server;

pub use config::LspConfig;
pub use document::{DocumentLanguage, DocumentState, ServerState, TagRecord};
pub use server::Backend;
