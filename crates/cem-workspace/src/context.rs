//! Workspace root resolution and sibling-package enumeration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cem_core::{CemError, Result};

/// A resolved workspace: one package root plus, in a multi-package
/// workspace, the map of sibling packages by name.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    root: PathBuf,
    siblings: HashMap<String, PathBuf>,
}

impl WorkspaceContext {
    /// Resolves the workspace around `hint`.
    ///
    /// Walks up from `hint` to the nearest directory containing a
    /// `package.json`; that directory is the root. When the root manifest
    /// carries a `workspaces` array, each member glob is expanded and every
    /// member's `package.json` name is recorded in the sibling map.
    pub fn discover(hint: &Path) -> Result<Self> {
        let start = if hint.is_file() {
            hint.parent().unwrap_or(hint)
        } else {
            hint
        };
        let root = find_package_root(start).unwrap_or_else(|| start.to_path_buf());
        let siblings = enumerate_siblings(&root);
        tracing::debug!(
            root = %root.display(),
            siblings = siblings.len(),
            "workspace discovered"
        );
        Ok(Self { root, siblings })
    }

    /// Builds a context rooted at an exact directory, skipping discovery.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let siblings = enumerate_siblings(&root);
        Self { root, siblings }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sibling packages of a multi-package workspace, name to directory.
    pub fn siblings(&self) -> &HashMap<String, PathBuf> {
        &self.siblings
    }

    /// Directory of the sibling package `name`, if the workspace has one.
    pub fn sibling(&self, name: &str) -> Option<&Path> {
        self.siblings.get(name).map(PathBuf::as_path)
    }

    /// Reads a file, workspace-relative or absolute.
    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let full = self.absolute(path);
        std::fs::read(&full).map_err(|e| CemError::io(full, e))
    }

    /// Reads a file as UTF-8 text, replacing invalid sequences.
    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_file(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolves `path` against the workspace root.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Workspace-relative form of `path` with forward slashes, the shape
    /// recorded as `module.path` in the manifest.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let mut out = String::new();
        for component in rel.components() {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&component.as_os_str().to_string_lossy());
        }
        out
    }
}

fn find_package_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join("package.json").is_file() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Reads the npm `workspaces` marker from the root manifest and maps each
/// member package by its declared name. Members without a readable name are
/// skipped.
fn enumerate_siblings(root: &Path) -> HashMap<String, PathBuf> {
    let mut siblings = HashMap::new();
    let Ok(bytes) = std::fs::read(root.join("package.json")) else {
        return siblings;
    };
    let Ok(manifest) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return siblings;
    };
    let Some(globs) = manifest.get("workspaces").and_then(|w| w.as_array()) else {
        return siblings;
    };

    for glob in globs.iter().filter_map(|g| g.as_str()) {
        for dir in expand_member_glob(root, glob) {
            let Ok(bytes) = std::fs::read(dir.join("package.json")) else {
                continue;
            };
            let Ok(manifest) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
                continue;
            };
            if let Some(name) = manifest.get("name").and_then(|n| n.as_str()) {
                siblings.insert(name.to_string(), dir);
            }
        }
    }
    siblings
}

/// Expands one npm workspace member glob (`packages/*`, `elements/card`)
/// into existing member directories.
fn expand_member_glob(root: &Path, glob: &str) -> Vec<PathBuf> {
    if !glob.contains('*') {
        let dir = root.join(glob);
        return if dir.is_dir() { vec![dir] } else { Vec::new() };
    }

    let Ok(matcher) = globset::GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
    else {
        tracing::warn!(glob, "ignoring invalid workspace member glob");
        return Vec::new();
    };

    walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(glob.split('/').count())
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| {
            e.path()
                .strip_prefix(root)
                .is_ok_and(|rel| matcher.is_match(rel))
        })
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn discovers_root_by_walking_up() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("package.json"), r#"{"name": "root"}"#);
        fs::create_dir_all(tmp.path().join("src/deep")).unwrap();

        let ctx = WorkspaceContext::discover(&tmp.path().join("src/deep")).unwrap();
        assert_eq!(ctx.root(), tmp.path());
    }

    #[test]
    fn enumerates_workspace_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("package.json"),
            r#"{"name": "root", "workspaces": ["packages/*"]}"#,
        );
        write(
            &tmp.path().join("packages/button/package.json"),
            r#"{"name": "@acme/button"}"#,
        );
        write(
            &tmp.path().join("packages/card/package.json"),
            r#"{"name": "@acme/card"}"#,
        );

        let ctx = WorkspaceContext::discover(tmp.path()).unwrap();
        assert_eq!(ctx.siblings().len(), 2);
        assert_eq!(
            ctx.sibling("@acme/button"),
            Some(tmp.path().join("packages/button").as_path())
        );
        assert!(ctx.sibling("@acme/missing").is_none());
    }

    #[test]
    fn single_package_has_no_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("package.json"), r#"{"name": "solo"}"#);
        let ctx = WorkspaceContext::discover(tmp.path()).unwrap();
        assert!(ctx.siblings().is_empty());
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("package.json"), r#"{"name": "x"}"#);
        let ctx = WorkspaceContext::discover(tmp.path()).unwrap();
        let abs = tmp.path().join("src").join("my-button.ts");
        assert_eq!(ctx.relative(&abs), "src/my-button.ts");
    }

    #[test]
    fn read_file_reports_path_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = WorkspaceContext::rooted(tmp.path());
        let err = ctx.read_file(Path::new("missing.ts")).unwrap_err();
        assert!(err.to_string().contains("missing.ts"));
    }
}
