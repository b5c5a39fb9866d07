use super::locations::ErrorLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Whether a build failure can be fixed automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Minor,
    #[default]
    Major,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Minor => "minor",
            ErrorKind::Major => "major",
        }
    }

    pub fn is_minor(&self) -> bool {
        matches!(self, ErrorKind::Minor)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Remote,
    #[default]
    Pattern,
    NoTranscript,
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationSource::Remote => f.write_str("remote"),
            ClassificationSource::Pattern => f.write_str("pattern"),
            ClassificationSource::NoTranscript => f.write_str("no_transcript"),
        }
    }
}

/// A proposed single-line replacement.
///
/// Field names on the wire (`file`, `line`, `fix`) match the artifact
/// consumed by later pipeline steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSuggestion {
    #[serde(rename = "file")]
    pub target_file: PathBuf,
    /// 1-based.
    #[serde(rename = "line")]
    pub target_line: usize,
    #[serde(rename = "fix")]
    pub replacement: String,
}

impl FixSuggestion {
    pub fn new(
        target_file: impl Into<PathBuf>,
        target_line: usize,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            target_file: target_file.into(),
            target_line,
            replacement: replacement.into(),
        }
    }
}

/// The decision for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub kind: ErrorKind,
    pub source: ClassificationSource,
    pub narrative: String,
    #[serde(default)]
    pub suggestions: Vec<FixSuggestion>,
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,
}

impl Classification {
    pub fn no_transcript() -> Self {
        Self {
            kind: ErrorKind::Major,
            source: ClassificationSource::NoTranscript,
            narrative: "No build transcript available".to_string(),
            suggestions: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub fn is_minor(&self) -> bool {
        self.kind.is_minor()
    }
}
