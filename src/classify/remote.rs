//! Remote analysis adapter.
//!
//! Sends the (truncated) transcript to an [`LLMClient`] and turns the free
//! text answer into a [`Classification`]. Every failure is returned as a
//! [`BackendError`]; deciding what to do about it is the orchestrator's job.

use super::extract;
use super::types::{Classification, ClassificationSource, ErrorKind};
use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use crate::project::ProjectKind;
use crate::transcript::BuildTranscript;
use std::sync::Arc;
use tracing::{debug, info};

const MINOR_TOKEN: &str = "minor";

const ANALYSIS_TEMPERATURE: f32 = 0.0;

const ANALYSIS_MAX_TOKENS: u32 = 2048;

pub fn system_prompt(project: ProjectKind) -> String {
    format!(
        "You are a {} build error expert. Analyze these errors and:\n\
         1. Categorize as MINOR (fixable) or MAJOR (needs human)\n\
         2. For MINOR: Provide specific fixes in format:\n\
         \x20  FILE: <path>\n\
         \x20  LINE: <number>\n\
         \x20  FIX: <correction>\n\
         3. For MAJOR: Explain the core issue",
        project
    )
}

/// Reads the category token from a narrative.
///
/// Case-insensitive substring test: any occurrence of "minor" counts.
pub fn kind_from_narrative(narrative: &str) -> ErrorKind {
    if narrative.to_lowercase().contains(MINOR_TOKEN) {
        ErrorKind::Minor
    } else {
        ErrorKind::Major
    }
}

pub struct RemoteClassifier {
    client: Arc<dyn LLMClient>,
    max_transcript_chars: usize,
}

impl RemoteClassifier {
    pub fn new(client: Arc<dyn LLMClient>, max_transcript_chars: usize) -> Self {
        Self {
            client,
            max_transcript_chars,
        }
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    pub async fn classify(
        &self,
        transcript: &BuildTranscript,
        project: ProjectKind,
    ) -> Result<Classification, BackendError> {
        let excerpt = transcript.for_analysis(self.max_transcript_chars);
        debug!(
            backend = self.client.name(),
            model = ?self.client.model_info(),
            chars = excerpt.chars().count(),
            "Requesting remote analysis"
        );

        let request = LLMRequest::new(vec![
            ChatMessage::system(system_prompt(project)),
            ChatMessage::user(excerpt),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_max_tokens(ANALYSIS_MAX_TOKENS);
        let response = self.client.chat(request).await?;

        let narrative = response.content.trim().to_string();
        if narrative.is_empty() {
            return Err(BackendError::InvalidResponse {
                message: "empty analysis".to_string(),
            });
        }

        let kind = kind_from_narrative(&narrative);
        let suggestions = if kind.is_minor() {
            extract::extract(&narrative)
        } else {
            Vec::new()
        };

        info!(
            kind = %kind,
            suggestions = suggestions.len(),
            elapsed_ms = response.response_time.as_millis() as u64,
            "Remote analysis complete"
        );

        Ok(Classification {
            kind,
            source: ClassificationSource::Remote,
            narrative,
            suggestions,
            locations: Vec::new(),
        })
    }
}
