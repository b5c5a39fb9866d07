//! buildmedic - automated triage and repair of failed CI builds
//!
//! Given the transcript of a failed build, buildmedic decides whether the
//! failure is MINOR (automatically fixable) or MAJOR (needs a human) and, for
//! MINOR failures, applies a fixed sequence of remediations to the source tree.
//!
//! # Core Concepts
//!
//! - **Classification**: a remote analysis service is consulted first; any
//!   failure there falls back to a deterministic pattern table
//! - **Fix suggestions**: `FILE:` / `LINE:` / `FIX:` blocks in the remote
//!   narrative, paired positionally and discarded when misaligned
//! - **Remediation**: targeted line fixes, whitespace normalization,
//!   dependency resolution and project scaffolding, in that order
//!
//! # Example Usage
//!
//! ```no_run
//! use buildmedic::{BuildTranscript, Classifier, ProjectKind, Remediator};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transcript = BuildTranscript::load(Path::new("build_log.txt"))?;
//! let classification = Classifier::new(None)
//!     .classify(transcript.as_ref(), ProjectKind::Python)
//!     .await;
//!
//! let outcome = Remediator::new(".", ProjectKind::Python)
//!     .remediate(&classification, transcript.as_ref())
//!     .await;
//! println!("fixed: {}", outcome.fixed());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod llm;
pub mod project;
pub mod remediate;
pub mod transcript;
pub mod util;

pub use classify::{
    Classification, ClassificationRecord, ClassificationSource, Classifier, DecisionStore,
    ErrorKind, FixSuggestion, PatternClassifier, RemoteClassifier,
};
pub use config::{ConfigError, MedicConfig};
pub use llm::{BackendError, LLMClient};
pub use project::ProjectKind;
pub use remediate::{AppliedFix, FixOutcome, FixStep, Remediator};
pub use transcript::{BuildTranscript, TranscriptError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
