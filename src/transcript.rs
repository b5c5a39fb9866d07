//! Read-only access to the captured build transcript.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Failed to read build transcript {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The raw text of one failed build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTranscript {
    path: Option<PathBuf>,
    text: String,
}

impl BuildTranscript {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    /// Loads the transcript at `path`.
    ///
    /// A missing file is not an error: it yields `Ok(None)` so the caller can
    /// classify the run as MAJOR. Any other I/O failure is fatal.
    pub fn load(path: &Path) -> Result<Option<Self>, TranscriptError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No build transcript found");
                return Ok(None);
            }
            Err(source) => {
                return Err(TranscriptError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        // Build tools occasionally emit invalid UTF-8; keep going lossily.
        let text = String::from_utf8_lossy(&bytes).into_owned();
        debug!(path = %path.display(), bytes = bytes.len(), "Loaded build transcript");

        Ok(Some(Self {
            path: Some(path.to_path_buf()),
            text,
        }))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The prefix sent to remote analysis: at most `max_chars` characters.
    pub fn for_analysis(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }

    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }
}
