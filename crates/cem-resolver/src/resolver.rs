//! Import-specifier resolution across workspace siblings and node_modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use cem_core::{CemError, Result};
use cem_syntax::{Grammar, ParserPool, QueryManager};
use cem_workspace::WorkspaceContext;

use crate::aliases::{expand_alias, extract_aliases, extract_jsdoc_typedefs, AliasMap};

/// Splits an import specifier into its package name and optional subpath.
///
/// Relative and absolute specifiers are local and yield `None`.
pub fn package_name_of(specifier: &str) -> Option<(String, Option<String>)> {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }
    let mut segments = specifier.splitn(if specifier.starts_with('@') { 3 } else { 2 }, '/');
    let name = if specifier.starts_with('@') {
        let scope = segments.next()?;
        let pkg = segments.next()?;
        format!("{scope}/{pkg}")
    } else {
        segments.next()?.to_string()
    };
    if name.is_empty() {
        return None;
    }
    let subpath = segments.next().filter(|s| !s.is_empty()).map(String::from);
    Some((name, subpath))
}

/// Resolves imported type names to fully expanded string definitions.
///
/// Workspace siblings win over installed dependencies. Results — including
/// misses — are cached by the full import specifier; sibling scans are
/// additionally cached by package name because the scan is package-wide.
pub struct TypeResolver {
    ctx: WorkspaceContext,
    pool: ParserPool,
    queries: Arc<QueryManager>,
    /// Full specifier -> alias map of the resolved target (None = miss).
    by_specifier: DashMap<String, Option<Arc<AliasMap>>>,
    /// Package name -> merged alias map of a scanned workspace sibling.
    sibling_scans: DashMap<String, Arc<AliasMap>>,
}

impl TypeResolver {
    pub fn new(ctx: WorkspaceContext, pool: ParserPool, queries: Arc<QueryManager>) -> Self {
        Self {
            ctx,
            pool,
            queries,
            by_specifier: DashMap::new(),
            sibling_scans: DashMap::new(),
        }
    }

    pub fn workspace(&self) -> &WorkspaceContext {
        &self.ctx
    }

    /// Resolves `type_name` imported from `specifier` to its fully
    /// expanded definition.
    ///
    /// Returns `CemError::NotFound` when neither a workspace sibling nor
    /// `node_modules` yields the import, or when the resolved target does
    /// not declare the name.
    pub fn resolve(
        &self,
        specifier: &str,
        type_name: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }
        let Some(aliases) = self.alias_map_for(specifier, cancel)? else {
            return Err(CemError::NotFound {
                specifier: specifier.to_string(),
                name: type_name.to_string(),
            });
        };
        if !aliases.contains_key(type_name) {
            return Err(CemError::NotFound {
                specifier: specifier.to_string(),
                name: type_name.to_string(),
            });
        }
        Ok(expand_alias(type_name, &aliases))
    }

    /// The alias map backing a specifier, computed once and cached. Cached
    /// misses prevent re-walking the filesystem for known-absent imports.
    fn alias_map_for(
        &self,
        specifier: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<AliasMap>>> {
        if let Some(cached) = self.by_specifier.get(specifier) {
            return Ok(cached.clone());
        }

        let resolved = self.resolve_uncached(specifier, cancel)?;
        self.by_specifier
            .insert(specifier.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn resolve_uncached(
        &self,
        specifier: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<AliasMap>>> {
        let Some((package, subpath)) = package_name_of(specifier) else {
            // Local import; the analyzer handles file-local aliases itself.
            return Ok(None);
        };

        if let Some(dir) = self.ctx.sibling(&package) {
            let dir = dir.to_path_buf();
            let map = self.sibling_aliases(&package, &dir, cancel)?;
            if !map.is_empty() {
                return Ok(Some(map));
            }
        }

        Ok(self
            .node_modules_target(&package, subpath.as_deref())
            .map(|target| self.aliases_of_file(&target)))
    }

    /// Scans every `.ts`/`.tsx` of a sibling package (declaration files
    /// excluded) and merges the alias maps. Cached by package name.
    fn sibling_aliases(
        &self,
        package: &str,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Arc<AliasMap>> {
        if let Some(cached) = self.sibling_scans.get(package) {
            return Ok(Arc::clone(&cached));
        }

        let mut merged = AliasMap::new();
        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules")
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if cancel.is_cancelled() {
                return Err(CemError::Cancelled);
            }
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.ends_with(".d.ts") {
                continue;
            }
            let Some(grammar @ (Grammar::TypeScript | Grammar::Tsx)) = Grammar::for_path(path)
            else {
                continue;
            };
            let Ok(source) = std::fs::read(path) else {
                continue;
            };
            merged.extend(extract_aliases(&self.pool, &self.queries, grammar, &source));
        }

        tracing::debug!(package, aliases = merged.len(), "sibling package scanned");
        let merged = Arc::new(merged);
        self.sibling_scans
            .insert(package.to_string(), Arc::clone(&merged));
        Ok(merged)
    }

    /// Locates the file backing `package[/subpath]` under `node_modules`,
    /// preferring declaration files.
    fn node_modules_target(&self, package: &str, subpath: Option<&str>) -> Option<PathBuf> {
        let dir = self.ctx.root().join("node_modules").join(package);
        if !dir.is_dir() {
            return None;
        }

        match subpath {
            Some(sub) => {
                if let Some(target) = self.export_map_target(&dir, sub) {
                    return Some(target);
                }
                for candidate in [
                    format!("{sub}.d.ts"),
                    format!("{sub}/index.d.ts"),
                    format!("{sub}.js"),
                ] {
                    let path = dir.join(candidate);
                    if path.is_file() {
                        return Some(path);
                    }
                }
                None
            }
            None => {
                let manifest = read_manifest(&dir)?;
                for key in ["types", "typings", "main"] {
                    if let Some(rel) = manifest.get(key).and_then(|v| v.as_str()) {
                        let path = dir.join(rel);
                        if path.is_file() {
                            return Some(path);
                        }
                    }
                }
                for fallback in ["index.d.ts", "index.js"] {
                    let path = dir.join(fallback);
                    if path.is_file() {
                        return Some(path);
                    }
                }
                None
            }
        }
    }

    /// Resolves `./{sub}` through the package's export map when present.
    fn export_map_target(&self, dir: &Path, sub: &str) -> Option<PathBuf> {
        let manifest = read_manifest(dir)?;
        let exports = manifest.get("exports")?;
        let entry = exports.get(format!("./{sub}"))?;
        let rel = export_target(entry)?;
        let path = dir.join(rel.trim_start_matches("./"));
        path.is_file().then_some(path)
    }

    fn aliases_of_file(&self, path: &Path) -> Arc<AliasMap> {
        let Ok(source) = std::fs::read(path) else {
            return Arc::new(AliasMap::new());
        };
        let is_declaration_or_ts = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".d.ts") || n.ends_with(".ts") || n.ends_with(".tsx"));

        let map = if is_declaration_or_ts {
            extract_aliases(&self.pool, &self.queries, Grammar::TypeScript, &source)
        } else {
            // JavaScript target: JSDoc @typedef comments are the only type
            // information available.
            extract_jsdoc_typedefs(&String::from_utf8_lossy(&source))
        };
        Arc::new(map)
    }

    pub fn cached_specifiers(&self) -> usize {
        self.by_specifier.len()
    }
}

/// Picks the concrete file target out of an export-map entry, preferring
/// declaration conditions.
fn export_target(entry: &serde_json::Value) -> Option<String> {
    match entry {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => {
            for key in ["types", "import", "default"] {
                if let Some(target) = map.get(key).and_then(export_target) {
                    return Some(target);
                }
            }
            None
        }
        _ => None,
    }
}

fn read_manifest(dir: &Path) -> Option<serde_json::Value> {
    let bytes = std::fs::read(dir.join("package.json")).ok()?;
    serde_json::from_slice(&bytes).ok()
}
