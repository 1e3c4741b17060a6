//! Workspace plumbing for cem.
//!
//! Resolves the package root (including npm multi-package workspaces),
//! expands configured source globs, reads files, and provides debounced
//! file-watching primitives.

pub mod context;
pub mod scan;
pub mod watch;

pub use context::WorkspaceContext;
pub use scan::{source_files, SourceGlobs};
pub use watch::{FileWatcher, WatchEvent, WatchKind, DEBOUNCE_WINDOW};
