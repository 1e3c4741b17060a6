//! Source-file enumeration from configured globs.

use std::path::PathBuf;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use cem_core::config::DEFAULT_EXCLUDES;
use cem_core::{CemError, GenerateConfig, Result};

use crate::context::WorkspaceContext;

/// Compiled include/exclude matcher.
pub struct SourceGlobs {
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceGlobs {
    /// Compiles the configured globs. An invalid glob is a fatal
    /// configuration error carrying the offending pattern.
    pub fn compile(config: &GenerateConfig) -> Result<Self> {
        let include = build_set(&config.files)?;

        let mut exclude_patterns: Vec<String> = config.exclude.clone();
        if !config.no_default_excludes {
            exclude_patterns.extend(DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()));
        }
        let exclude = build_set(&exclude_patterns)?;

        Ok(Self { include, exclude })
    }

    /// True when a workspace-relative path is selected.
    pub fn matches(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|e| CemError::config(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CemError::config(format!("glob set failed to build: {e}")))
}

/// Enumerates the source files selected by the config, workspace-relative
/// and lexicographically sorted. The sort order fixes the module order of
/// the emitted package.
pub fn source_files(ctx: &WorkspaceContext, config: &GenerateConfig) -> Result<Vec<PathBuf>> {
    let globs = SourceGlobs::compile(config)?;

    let mut files: Vec<PathBuf> = WalkDir::new(ctx.root())
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules" && e.file_name() != ".git")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = ctx.relative(e.path());
            globs.matches(&relative).then(|| PathBuf::from(relative))
        })
        .collect();

    files.sort();
    tracing::debug!(count = files.len(), "source files enumerated");
    Ok(files)
}
