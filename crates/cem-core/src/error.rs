use std::path::PathBuf;

use thiserror::Error;

/// Core error types for cem.
///
/// Fatal errors (configuration, I/O on required files) propagate to the
/// caller. Non-fatal errors (a single file failing to parse, an unresolvable
/// import) are collected and reported alongside the result they degrade.
#[derive(Error, Debug)]
pub enum CemError {
    /// Tree-sitter failed to produce a tree for a source file.
    ///
    /// Reported and skipped; never aborts a generate run.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// Invalid glob, URL pattern, URL template, or malformed config value.
    ///
    /// Fatal at startup.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// An import or type could not be resolved through the workspace or
    /// `node_modules`. Warning-level; the unresolved reference is kept
    /// verbatim in the manifest.
    #[error("cannot resolve '{name}' from '{specifier}'")]
    NotFound { specifier: String, name: String },

    /// Two declarations claim the same tag name, or a manifest entity
    /// breaks a structural rule. The first claimant (by source-path order)
    /// wins deterministically.
    #[error("manifest invariant violated: {0}")]
    InvariantViolation(String),

    /// The operation observed its cancellation handle.
    #[error("operation cancelled")]
    Cancelled,

    /// File read or write failure, fatal for the affected file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A runtime-constructed tree-sitter query failed to compile.
    /// Carries the offending query text for the caller.
    #[error("query '{name}' failed to compile: {message}")]
    Query {
        name: String,
        message: String,
        text: String,
    },
}

impl CemError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true for errors that abort the whole operation rather than
    /// degrading a single entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Cancelled)
    }
}

/// Convenience type alias for `Result<T, CemError>`.
pub type Result<T> = std::result::Result<T, CemError>;

/// Collects non-fatal errors across a multi-file operation.
///
/// A per-file failure does not abort a generate run; it lands here and is
/// returned to the caller next to the manifest.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<CemError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a non-fatal error.
    pub fn push(&mut self, error: CemError) {
        tracing::warn!("{error}");
        self.errors.push(error);
    }

    /// Absorbs every error from another sink.
    pub fn join(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn into_errors(self) -> Vec<CemError> {
        self.errors
    }

    pub fn errors(&self) -> &[CemError] {
        &self.errors
    }
}
