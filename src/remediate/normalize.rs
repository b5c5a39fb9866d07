//! Whitespace normalization of source files.

use crate::project::{is_excluded_path, ProjectKind};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Expands tabs to `tab_width` spaces, strips trailing whitespace from every
/// line and leaves exactly one final newline. Content that is empty after
/// stripping becomes the empty string.
///
/// `normalize_whitespace(normalize_whitespace(s)) == normalize_whitespace(s)`.
pub fn normalize_whitespace(content: &str, tab_width: usize) -> String {
    let indent = " ".repeat(tab_width);
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| line.replace('\t', &indent).trim_end().to_string())
        .collect();

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Source files of `project` under `root`, skipping dependency and build
/// output directories.
pub fn source_files(root: &Path, project: ProjectKind) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for result in WalkBuilder::new(root).hidden(false).git_ignore(true).build() {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();

        if !path.is_file() || !project.is_source_file(path) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if is_excluded_path(relative) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    files
}

/// Rewrites `path` in place. Returns whether the bytes changed.
pub fn normalize_file(path: &Path, tab_width: usize) -> std::io::Result<bool> {
    let original = std::fs::read_to_string(path)?;
    let normalized = normalize_whitespace(&original, tab_width);
    if normalized == original {
        return Ok(false);
    }
    std::fs::write(path, normalized)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tabs_and_trailing_spaces() {
        let out = normalize_whitespace("def f():\n\treturn 1   \n", 4);
        assert_eq!(out, "def f():\n    return 1\n");
    }

    #[test]
    fn test_custom_tab_width() {
        assert_eq!(normalize_whitespace("\tx", 2), "  x\n");
    }

    #[test]
    fn test_final_newline_added_and_collapsed() {
        assert_eq!(normalize_whitespace("a", 4), "a\n");
        assert_eq!(normalize_whitespace("a\n\n\n  \n", 4), "a\n");
    }

    #[test]
    fn test_crlf_becomes_lf() {
        assert_eq!(normalize_whitespace("a\r\nb\r\n", 4), "a\nb\n");
    }

    #[test]
    fn test_blank_files_become_empty() {
        assert_eq!(normalize_whitespace("", 4), "");
        assert_eq!(normalize_whitespace(" \n\t\n", 4), "");
    }

    #[test]
    fn test_idempotent() {
        for input in ["\tif x:  \n\t\tpass\t\n\n", "a\r\n\r\n", "", "no newline \t"] {
            let once = normalize_whitespace(input, 4);
            assert_eq!(normalize_whitespace(&once, 4), once);
        }
    }

    #[test]
    fn test_source_files_skip_excluded_dirs_and_other_kinds() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/lodash")).unwrap();
        std::fs::write(root.join("src/index.js"), "x").unwrap();
        std::fs::write(root.join("node_modules/lodash/index.js"), "x").unwrap();
        std::fs::write(root.join("main.py"), "x").unwrap();

        let files = source_files(root, ProjectKind::Nodejs);
        assert_eq!(files, vec![root.join("src/index.js")]);
    }

    #[test]
    fn test_normalize_file_reports_change() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "x = 1  \n").unwrap();

        assert!(normalize_file(&file, 4).unwrap());
        assert!(!normalize_file(&file, 4).unwrap());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x = 1\n");
    }
}
