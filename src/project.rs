//! Project categories and the source-tree conventions attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Directories produced by package managers or builds; never normalized.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "bower_components",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    "venv",
    ".venv",
    "env",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".eggs",
    "site-packages",
    "vendor",
    ".gradle",
    ".m2",
    ".cargo",
];

/// Project category as reported by the project-detection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Nodejs,
    Python,
    Java,
    Go,
    Rust,
    #[default]
    Unknown,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Nodejs => "nodejs",
            ProjectKind::Python => "python",
            ProjectKind::Java => "java",
            ProjectKind::Go => "go",
            ProjectKind::Rust => "rust",
            ProjectKind::Unknown => "unknown",
        }
    }

    /// File extensions (without the dot) treated as source for this kind.
    ///
    /// `Unknown` covers the union of all supported languages.
    pub fn source_extensions(&self) -> &'static [&'static str] {
        match self {
            ProjectKind::Nodejs => &["js", "jsx", "ts", "tsx"],
            ProjectKind::Python => &["py"],
            ProjectKind::Java => &["java"],
            ProjectKind::Go => &["go"],
            ProjectKind::Rust => &["rs"],
            ProjectKind::Unknown => &["js", "py", "java", "go", "rs", "ts", "jsx", "tsx"],
        }
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.source_extensions().contains(&ext))
            .unwrap_or(false)
    }
}

/// Returns true if any component of `path` is an excluded directory.
pub fn is_excluded_path(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
    })
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nodejs" | "node" => Ok(ProjectKind::Nodejs),
            "python" => Ok(ProjectKind::Python),
            "java" | "maven" | "gradle" => Ok(ProjectKind::Java),
            "go" => Ok(ProjectKind::Go),
            "rust" => Ok(ProjectKind::Rust),
            "unknown" | "" => Ok(ProjectKind::Unknown),
            other => Err(format!(
                "Unknown project type '{}'. Valid options: nodejs, python, java, go, rust, unknown",
                other
            )),
        }
    }
}
