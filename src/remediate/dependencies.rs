//! Missing-module detection and manifest updates.

use super::command::CommandRunner;
use crate::project::ProjectKind;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PACKAGE_JSON: &str = "package.json";
pub const REQUIREMENTS_TXT: &str = "requirements.txt";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {path}: {reason}")]
    Shape { path: String, reason: String },
}

/// What happened to one missing module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyResolution {
    pub name: String,
    pub installed: bool,
    pub declared: bool,
}

impl DependencyResolution {
    pub fn succeeded(&self) -> bool {
        self.installed || self.declared
    }
}

fn node_missing_module_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)cannot find module ['"]([^'"]+)['"]"#)
            .expect("Invalid node missing module regex")
    })
}

fn python_missing_module_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"No module named ['"]([^'"]+)['"]"#)
            .expect("Invalid python missing module regex")
    })
}

/// Maps a Node import specifier to the package that provides it.
/// Relative and absolute specifiers have no package.
fn node_package_name(specifier: &str) -> Option<String> {
    if specifier.starts_with('.') || specifier.starts_with('/') || specifier.is_empty() {
        return None;
    }

    let mut parts = specifier.split('/');
    let first = parts.next()?;
    if first.starts_with('@') {
        let second = parts.next().filter(|s| !s.is_empty())?;
        Some(format!("{}/{}", first, second))
    } else {
        Some(first.to_string())
    }
}

fn python_package_name(module: &str) -> Option<String> {
    module
        .split('.')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Distinct top-level module names reported missing, in order of first
/// appearance.
pub fn missing_modules(transcript: &str, project: ProjectKind) -> Vec<String> {
    let (re, to_name): (&Regex, fn(&str) -> Option<String>) = match project {
        ProjectKind::Nodejs => (node_missing_module_regex(), node_package_name),
        ProjectKind::Python => (python_missing_module_regex(), python_package_name),
        _ => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(transcript) {
        if let Some(name) = caps.get(1).and_then(|m| to_name(m.as_str())) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Adds `name` to `dependencies` with a wildcard version unless present.
/// Returns whether the manifest changed. Unrelated fields keep their order.
pub fn declare_node_dependency(manifest: &Path, name: &str) -> Result<bool, ManifestError> {
    let path = manifest.display().to_string();
    let content = std::fs::read_to_string(manifest).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    let mut doc: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.clone(),
        source,
    })?;

    let root = doc.as_object_mut().ok_or_else(|| ManifestError::Shape {
        path: path.clone(),
        reason: "top level is not an object".to_string(),
    })?;
    let deps = root
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ManifestError::Shape {
            path: path.clone(),
            reason: "\"dependencies\" is not an object".to_string(),
        })?;

    if deps.contains_key(name) {
        return Ok(false);
    }
    deps.insert(name.to_string(), Value::String("*".to_string()));

    write_json(manifest, &doc)?;
    Ok(true)
}

pub(crate) fn write_json(path: &Path, doc: &Value) -> Result<(), ManifestError> {
    let display = path.display().to_string();
    let json = serde_json::to_string_pretty(doc).map_err(|source| ManifestError::Parse {
        path: display.clone(),
        source,
    })?;
    std::fs::write(path, format!("{}\n", json)).map_err(|source| ManifestError::Io {
        path: display,
        source,
    })
}

fn canonical_requirement(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

/// The distribution name of one requirements line, if it has one.
fn requirement_name(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let end = line
        .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '[' | ';' | ' ' | '@'))
        .unwrap_or(line.len());
    Some(&line[..end])
}

/// Appends `name` unless an exact or versioned entry already covers it.
/// Returns whether the file changed.
pub fn declare_python_requirement(requirements: &Path, name: &str) -> Result<bool, ManifestError> {
    let path = requirements.display().to_string();
    let content = std::fs::read_to_string(requirements).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;

    let wanted = canonical_requirement(name);
    if content
        .lines()
        .filter_map(requirement_name)
        .any(|existing| canonical_requirement(existing) == wanted)
    {
        return Ok(false);
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(name);
    updated.push('\n');

    std::fs::write(requirements, updated).map_err(|source| ManifestError::Io { path, source })?;
    Ok(true)
}

/// Installs and declares every missing module found in `transcript`.
pub async fn resolve(
    root: &Path,
    project: ProjectKind,
    transcript: &str,
    runner: &dyn CommandRunner,
) -> Vec<DependencyResolution> {
    let names = missing_modules(transcript, project);
    if names.is_empty() {
        return Vec::new();
    }
    info!(project = %project, modules = ?names, "Resolving missing modules");

    match project {
        ProjectKind::Nodejs => resolve_node(root, &names, runner).await,
        ProjectKind::Python => resolve_python(root, &names, runner).await,
        _ => Vec::new(),
    }
}

async fn resolve_node(
    root: &Path,
    names: &[String],
    runner: &dyn CommandRunner,
) -> Vec<DependencyResolution> {
    let mut args = vec!["install".to_string(), "--save".to_string()];
    args.extend(names.iter().cloned());

    let installed = match runner.run("npm", &args, root).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "npm install failed");
            false
        }
    };

    let manifest = root.join(PACKAGE_JSON);
    names
        .iter()
        .map(|name| DependencyResolution {
            name: name.clone(),
            installed,
            declared: declare(&manifest, name, declare_node_dependency),
        })
        .collect()
}

async fn resolve_python(
    root: &Path,
    names: &[String],
    runner: &dyn CommandRunner,
) -> Vec<DependencyResolution> {
    let requirements = root.join(REQUIREMENTS_TXT);
    let mut results = Vec::with_capacity(names.len());

    for name in names {
        let installed = match runner
            .run("pip", &["install".to_string(), name.clone()], root)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(module = %name, error = %e, "pip install failed");
                false
            }
        };

        results.push(DependencyResolution {
            name: name.clone(),
            installed,
            declared: declare(&requirements, name, declare_python_requirement),
        });
    }

    results
}

fn declare(
    manifest: &Path,
    name: &str,
    update: fn(&Path, &str) -> Result<bool, ManifestError>,
) -> bool {
    if !manifest.is_file() {
        debug!(manifest = %manifest.display(), "No manifest to update");
        return false;
    }
    match update(manifest, name) {
        Ok(changed) => changed,
        Err(e) => {
            warn!(module = %name, error = %e, "Failed to update manifest");
            false
        }
    }
}
