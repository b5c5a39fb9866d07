//! Build failure classification.
//!
//! [`Classifier`] tries the remote analysis service first and falls back to
//! the deterministic [`PatternClassifier`] whenever the remote path is not
//! configured or fails for any reason. The fallback is silent to the caller:
//! remote errors are logged, never returned.

pub mod extract;
pub mod locations;
pub mod patterns;
pub mod record;
pub mod remote;
mod types;

pub use extract::{ExtractError, FixToken};
pub use locations::ErrorLocation;
pub use patterns::{PatternClassifier, PatternMatch};
pub use record::{ClassificationRecord, DecisionStore, RecordError};
pub use remote::RemoteClassifier;
pub use types::{Classification, ClassificationSource, ErrorKind, FixSuggestion};

use crate::project::ProjectKind;
use crate::transcript::BuildTranscript;
use tracing::{error, info, warn};

pub struct Classifier {
    remote: Option<RemoteClassifier>,
    patterns: PatternClassifier,
    store: Option<DecisionStore>,
}

impl Classifier {
    pub fn new(remote: Option<RemoteClassifier>) -> Self {
        Self {
            remote,
            patterns: PatternClassifier::new(),
            store: None,
        }
    }

    /// Persist every decision to `store`.
    pub fn with_store(mut self, store: DecisionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn classify(
        &self,
        transcript: Option<&BuildTranscript>,
        project: ProjectKind,
    ) -> Classification {
        let classification = match transcript {
            None => {
                info!("No build transcript; treating failure as major");
                Classification::no_transcript()
            }
            Some(transcript) => {
                let mut classification = self.decide(transcript, project).await;
                classification.locations = locations::extract_locations(transcript.text());
                classification
            }
        };

        if let Some(store) = &self.store {
            let record = ClassificationRecord::new(
                &classification,
                project,
                transcript.map(BuildTranscript::sha256),
            );
            if let Err(e) = store.persist(&record) {
                error!(error = %e, "Failed to persist classification");
            }
        }

        classification
    }

    async fn decide(&self, transcript: &BuildTranscript, project: ProjectKind) -> Classification {
        if let Some(remote) = &self.remote {
            match remote.classify(transcript, project).await {
                Ok(classification) => return classification,
                Err(e) => warn!(
                    backend = remote.client_name(),
                    error = %e,
                    "Remote analysis unavailable, falling back to pattern matching"
                ),
            }
        }

        self.classify_with_patterns(transcript, project)
    }

    fn classify_with_patterns(
        &self,
        transcript: &BuildTranscript,
        project: ProjectKind,
    ) -> Classification {
        let found = self.patterns.evaluate(transcript.text(), project);
        let (kind, narrative) = match found {
            Some(m) => (
                ErrorKind::Minor,
                format!("Matched {} pattern \"{}\"", m.category, m.trigger),
            ),
            None => (
                ErrorKind::Major,
                "No known minor error signature found".to_string(),
            ),
        };

        info!(kind = %kind, project = %project, "Pattern analysis complete");

        Classification {
            kind,
            source: ClassificationSource::Pattern,
            narrative,
            suggestions: Vec::new(),
            locations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MockLLMClient, MockResponse};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn remote_with(responses: Vec<MockResponse>) -> (Arc<MockLLMClient>, RemoteClassifier) {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(responses);
        let remote = RemoteClassifier::new(client.clone(), 10_000);
        (client, remote)
    }

    #[tokio::test]
    async fn test_no_transcript_is_major() {
        let classifier = Classifier::new(None);
        let result = classifier.classify(None, ProjectKind::Nodejs).await;
        assert_eq!(result.kind, ErrorKind::Major);
        assert!(result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_pattern_path_without_remote() {
        let classifier = Classifier::new(None);
        let transcript = BuildTranscript::from_text("Error: Cannot find module 'lodash'");
        let result = classifier
            .classify(Some(&transcript), ProjectKind::Nodejs)
            .await;
        assert_eq!(result.kind, ErrorKind::Minor);
        assert_eq!(result.source, ClassificationSource::Pattern);
        assert!(result.narrative.contains("import"));
    }

    #[tokio::test]
    async fn test_remote_error_falls_back_to_patterns() {
        let (client, remote) = remote_with(vec![MockResponse::error(
            BackendError::AuthenticationError {
                message: "bad key".to_string(),
            },
        )]);
        let classifier = Classifier::new(Some(remote));
        let transcript = BuildTranscript::from_text("SyntaxError: Unexpected token");

        let result = classifier
            .classify(Some(&transcript), ProjectKind::Nodejs)
            .await;

        assert_eq!(result.kind, ErrorKind::Minor);
        assert_eq!(result.source, ClassificationSource::Pattern);
        assert_eq!(client.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_remote_verdict_is_trusted() {
        let (_client, remote) = remote_with(vec![MockResponse::text(
            "MAJOR: incompatible type signature in foo.ts",
        )]);
        let classifier = Classifier::new(Some(remote));
        // Would be MINOR on the pattern path.
        let transcript = BuildTranscript::from_text("SyntaxError: Unexpected token");

        let result = classifier
            .classify(Some(&transcript), ProjectKind::Nodejs)
            .await;

        assert_eq!(result.kind, ErrorKind::Major);
        assert_eq!(result.source, ClassificationSource::Remote);
        assert!(result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_classification_is_persisted() {
        let dir = TempDir::new().unwrap();
        let store = DecisionStore::new(
            dir.path().join("ai_fixes.json"),
            dir.path().join("error_type.txt"),
        );
        let classifier = Classifier::new(None).with_store(store.clone());
        let transcript = BuildTranscript::from_text("IndentationError: unexpected indent");

        let result = classifier
            .classify(Some(&transcript), ProjectKind::Python)
            .await;

        assert_eq!(result.kind, ErrorKind::Minor);
        assert_eq!(
            std::fs::read_to_string(store.flag_path()).unwrap(),
            "minor"
        );
        let record = store.load().unwrap();
        assert_eq!(record.project, ProjectKind::Python);
        assert_eq!(record.transcript_sha256, Some(transcript.sha256()));
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_change_result() {
        let dir = TempDir::new().unwrap();
        let flag_path = dir.path().join("error_type.txt");
        std::fs::write(&flag_path, "minor").unwrap();
        // The record path is an existing directory, so writing it fails.
        let record_path = dir.path().join("ai_fixes.json");
        std::fs::create_dir(&record_path).unwrap();

        let classifier =
            Classifier::new(None).with_store(DecisionStore::new(&record_path, &flag_path));
        let result = classifier
            .classify(
                Some(&BuildTranscript::from_text("error[E0308]: mismatched types")),
                ProjectKind::Rust,
            )
            .await;

        assert_eq!(result.kind, ErrorKind::Major);
        assert_eq!(std::fs::read_to_string(&flag_path).unwrap(), "major");
    }
}
