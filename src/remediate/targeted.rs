//! Line-level replacements suggested by the remote analysis.

use crate::classify::FixSuggestion;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetedFixError {
    #[error("Refusing to edit {0}: path is outside the workspace")]
    OutsideRoot(PathBuf),

    #[error("File not found: {0}")]
    Missing(PathBuf),

    #[error("Line {line} is out of range for {path} ({count} lines)")]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        count: usize,
    },

    #[error("Empty replacement for {0}")]
    EmptyReplacement(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves `relative` against `root`, rejecting absolute paths and any
/// `..` that would climb above the root.
pub fn resolve_within(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1)?,
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(root.join(relative))
}

/// Replaces the 1-based line `line` of `content` with `replacement` plus a
/// line terminator: `\r\n` when the replaced line used one, otherwise `\n`.
/// Every other byte is preserved.
pub fn replace_line(content: &str, line: usize, replacement: &str) -> Option<String> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if line == 0 || line > lines.len() {
        return None;
    }

    let mut out = String::with_capacity(content.len() + replacement.len());
    for (idx, original) in lines.iter().enumerate() {
        if idx + 1 == line {
            out.push_str(replacement);
            out.push_str(if original.ends_with("\r\n") { "\r\n" } else { "\n" });
        } else {
            out.push_str(original);
        }
    }
    Some(out)
}

/// Applies one suggestion to the tree under `root`.
pub fn apply(root: &Path, suggestion: &FixSuggestion) -> Result<PathBuf, TargetedFixError> {
    let path = resolve_within(root, &suggestion.target_file)
        .ok_or_else(|| TargetedFixError::OutsideRoot(suggestion.target_file.clone()))?;

    if suggestion.replacement.trim().is_empty() {
        return Err(TargetedFixError::EmptyReplacement(path));
    }
    if !path.is_file() {
        return Err(TargetedFixError::Missing(path));
    }

    let content = std::fs::read_to_string(&path).map_err(|source| TargetedFixError::Io {
        path: path.clone(),
        source,
    })?;

    let updated = replace_line(&content, suggestion.target_line, &suggestion.replacement)
        .ok_or_else(|| TargetedFixError::LineOutOfRange {
            path: path.clone(),
            line: suggestion.target_line,
            count: content.split_inclusive('\n').count(),
        })?;

    std::fs::write(&path, updated).map_err(|source| TargetedFixError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
