//! Durable record of a classification decision.
//!
//! Two artifacts are written, both overwritten on every run: a JSON record
//! with the full decision and a flag file holding only `minor` or `major`.

use super::locations::ErrorLocation;
use super::types::{Classification, ClassificationSource, ErrorKind, FixSuggestion};
use crate::project::ProjectKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed classification record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub error_type: ErrorKind,
    pub analysis: String,
    #[serde(default)]
    pub fixes: Vec<FixSuggestion>,
    #[serde(default)]
    pub source: ClassificationSource,
    #[serde(default)]
    pub project: ProjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_sha256: Option<String>,
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ClassificationRecord {
    pub fn new(
        classification: &Classification,
        project: ProjectKind,
        transcript_sha256: Option<String>,
    ) -> Self {
        Self {
            error_type: classification.kind,
            analysis: classification.narrative.clone(),
            fixes: classification.suggestions.clone(),
            source: classification.source,
            project,
            transcript_sha256,
            locations: classification.locations.clone(),
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn into_classification(self) -> Classification {
        Classification {
            kind: self.error_type,
            source: self.source,
            narrative: self.analysis,
            suggestions: self.fixes,
            locations: self.locations,
        }
    }
}

/// Locations of the two decision artifacts.
#[derive(Debug, Clone)]
pub struct DecisionStore {
    record_path: PathBuf,
    flag_path: PathBuf,
}

impl DecisionStore {
    pub fn new(record_path: impl Into<PathBuf>, flag_path: impl Into<PathBuf>) -> Self {
        Self {
            record_path: record_path.into(),
            flag_path: flag_path.into(),
        }
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    pub fn flag_path(&self) -> &Path {
        &self.flag_path
    }

    /// Writes the flag, then the record.
    ///
    /// The record is attempted even when the flag write fails. A flag that
    /// cannot be rewritten is removed, so a previous run's decision never
    /// survives next to a new one.
    pub fn persist(&self, record: &ClassificationRecord) -> Result<(), RecordError> {
        let flag = write_file(&self.flag_path, record.error_type.as_str().as_bytes());
        if flag.is_err() {
            let _ = std::fs::remove_file(&self.flag_path);
        }

        let written = serde_json::to_string_pretty(record)
            .map_err(|source| RecordError::Malformed {
                path: self.record_path.clone(),
                source,
            })
            .and_then(|json| write_file(&self.record_path, format!("{}\n", json).as_bytes()));

        flag.and(written)?;

        debug!(
            record = %self.record_path.display(),
            flag = %self.flag_path.display(),
            kind = %record.error_type,
            "Persisted classification"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<ClassificationRecord, RecordError> {
        let content =
            std::fs::read_to_string(&self.record_path).map_err(|source| RecordError::Read {
                path: self.record_path.clone(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| RecordError::Malformed {
            path: self.record_path.clone(),
            source,
        })
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), RecordError> {
    let to_err = |source: io::Error| RecordError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::write(path, contents).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn minor_classification() -> Classification {
        Classification {
            kind: ErrorKind::Minor,
            source: ClassificationSource::Remote,
            narrative: "MINOR\nFILE: a.js\nLINE: 1\nFIX: x".to_string(),
            suggestions: vec![FixSuggestion::new("a.js", 1, "x")],
            locations: Vec::new(),
        }
    }

    #[test]
    fn test_persist_writes_record_and_flag() {
        let dir = TempDir::new().unwrap();
        let store = DecisionStore::new(
            dir.path().join("ai_fixes.json"),
            dir.path().join("error_type.txt"),
        );

        let record = ClassificationRecord::new(
            &minor_classification(),
            ProjectKind::Nodejs,
            Some("abc".to_string()),
        );
        store.persist(&record).unwrap();

        let flag = std::fs::read_to_string(store.flag_path()).unwrap();
        assert_eq!(flag, "minor");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.record_path()).unwrap()).unwrap();
        assert_eq!(json["error_type"], "minor");
        assert_eq!(json["fixes"][0]["file"], "a.js");
        assert_eq!(json["fixes"][0]["line"], 1);
        assert_eq!(json["project"], "nodejs");
    }

    #[test]
    fn test_persist_overwrites_previous_run() {
        let dir = TempDir::new().unwrap();
        let store = DecisionStore::new(
            dir.path().join("ai_fixes.json"),
            dir.path().join("error_type.txt"),
        );

        store
            .persist(&ClassificationRecord::new(
                &minor_classification(),
                ProjectKind::Nodejs,
                None,
            ))
            .unwrap();
        store
            .persist(&ClassificationRecord::new(
                &Classification::no_transcript(),
                ProjectKind::Nodejs,
                None,
            ))
            .unwrap();

        assert_eq!(std::fs::read_to_string(store.flag_path()).unwrap(), "major");
        let loaded = store.load().unwrap();
        assert_eq!(loaded.error_type, ErrorKind::Major);
        assert!(loaded.fixes.is_empty());
    }

    #[test]
    fn test_failed_record_write_still_replaces_flag() {
        let dir = TempDir::new().unwrap();
        let record_path = dir.path().join("ai_fixes.json");
        let flag_path = dir.path().join("error_type.txt");
        std::fs::write(&flag_path, "minor").unwrap();
        std::fs::create_dir(&record_path).unwrap();

        let store = DecisionStore::new(&record_path, &flag_path);
        let result = store.persist(&ClassificationRecord::new(
            &Classification::no_transcript(),
            ProjectKind::Rust,
            None,
        ));

        assert!(matches!(result, Err(RecordError::Write { .. })));
        assert_eq!(std::fs::read_to_string(&flag_path).unwrap(), "major");
    }

    #[test]
    fn test_load_roundtrips_classification() {
        let dir = TempDir::new().unwrap();
        let store = DecisionStore::new(
            dir.path().join("out/ai_fixes.json"),
            dir.path().join("out/error_type.txt"),
        );
        let original = minor_classification();
        store
            .persist(&ClassificationRecord::new(&original, ProjectKind::Python, None))
            .unwrap();

        let restored = store.load().unwrap().into_classification();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_load_accepts_minimal_legacy_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_fixes.json");
        std::fs::write(
            &path,
            r#"{"error_type": "minor", "analysis": "MINOR", "fixes": [{"file": "x.py", "line": 2, "fix": "pass"}]}"#,
        )
        .unwrap();

        let store = DecisionStore::new(&path, dir.path().join("error_type.txt"));
        let record = store.load().unwrap();
        assert_eq!(record.error_type, ErrorKind::Minor);
        assert_eq!(record.fixes[0].target_line, 2);
        assert_eq!(record.project, ProjectKind::Unknown);
    }

    #[test]
    fn test_load_missing_record() {
        let dir = TempDir::new().unwrap();
        let store = DecisionStore::new(
            dir.path().join("ai_fixes.json"),
            dir.path().join("error_type.txt"),
        );
        assert!(matches!(store.load(), Err(RecordError::Read { .. })));
    }
}
