//! Manifest serialization to the configured output.

use std::io::Write;
use std::path::Path;

use cem_core::{CemError, Package, Result};

/// Serializes a package as the canonical manifest JSON: two-space
/// indentation, deterministic key order, trailing newline.
pub fn to_json(package: &Package) -> Result<String> {
    let mut json = serde_json::to_string_pretty(package)?;
    json.push('\n');
    Ok(json)
}

/// Writes the manifest to `output`, or to `writer` (stdout in the CLI
/// shell) when no output path is configured.
pub fn write_manifest(
    package: &Package,
    output: Option<&Path>,
    writer: &mut dyn Write,
) -> Result<()> {
    let json = to_json(package)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| CemError::io(parent, e))?;
            }
            std::fs::write(path, json).map_err(|e| CemError::io(path, e))
        }
        None => writer
            .write_all(json.as_bytes())
            .map_err(|e| CemError::io("<stdout>", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::Module;

    fn package() -> Package {
        let mut package = Package::new();
        package.modules.push(Module::new("src/a.ts"));
        package
    }

    #[test]
    fn json_ends_with_newline_and_round_trips() {
        let json = to_json(&package()).unwrap();
        assert!(json.ends_with('\n'));
        let decoded: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, package());
    }

    #[test]
    fn writes_to_file_creating_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/custom-elements.json");
        write_manifest(&package(), Some(&path), &mut Vec::new()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"schemaVersion\""));
    }

    #[test]
    fn falls_back_to_writer() {
        let mut buffer = Vec::new();
        write_manifest(&package(), None, &mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("src/a.ts"));
    }
}
