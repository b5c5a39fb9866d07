//! Minimal project structure expected by the CI build.

use super::dependencies::{write_json, ManifestError, PACKAGE_JSON};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_BUILD_SCRIPT: &str = "echo \"No build script specified\"";
pub const TEST_INIT_CONTENT: &str = "# Test initialization\n";

/// Adds a placeholder `scripts.build` to `package.json`.
///
/// Returns `Ok(None)` when there is no manifest or it already declares a
/// build script.
pub fn ensure_build_script(root: &Path) -> Result<Option<PathBuf>, ManifestError> {
    let manifest = root.join(PACKAGE_JSON);
    if !manifest.is_file() {
        return Ok(None);
    }

    let path = manifest.display().to_string();
    let content = std::fs::read_to_string(&manifest).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    let mut doc: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.clone(),
        source,
    })?;

    let scripts = doc
        .as_object_mut()
        .ok_or_else(|| ManifestError::Shape {
            path: path.clone(),
            reason: "top level is not an object".to_string(),
        })?
        .entry("scripts")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ManifestError::Shape {
            path: path.clone(),
            reason: "\"scripts\" is not an object".to_string(),
        })?;

    if scripts.contains_key("build") {
        return Ok(None);
    }
    scripts.insert(
        "build".to_string(),
        Value::String(PLACEHOLDER_BUILD_SCRIPT.to_string()),
    );

    write_json(&manifest, &doc)?;
    Ok(Some(manifest))
}

/// Creates `tests/__init__.py` when there is no `tests` directory.
pub fn ensure_test_package(root: &Path) -> std::io::Result<Option<PathBuf>> {
    let tests_dir = root.join("tests");
    if tests_dir.exists() {
        return Ok(None);
    }

    std::fs::create_dir_all(&tests_dir)?;
    let init = tests_dir.join("__init__.py");
    std::fs::write(&init, TEST_INIT_CONTENT)?;
    Ok(Some(init))
}
