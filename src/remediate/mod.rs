//! Fix pipeline for MINOR failures.
//!
//! Steps run in a fixed order: targeted line fixes, whitespace
//! normalization, dependency resolution, then scaffolding. A failure on one
//! file is logged and counted as an unsuccessful attempt; it never stops the
//! rest of the pipeline.

pub mod command;
pub mod dependencies;
pub mod normalize;
pub mod scaffold;
pub mod targeted;

pub use command::{CommandError, CommandRunner, RecordingCommandRunner, SystemCommandRunner};

use crate::classify::Classification;
use crate::project::ProjectKind;
use crate::transcript::BuildTranscript;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixStep {
    Targeted,
    Normalize,
    Dependency,
    Scaffold,
}

impl fmt::Display for FixStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FixStep::Targeted => "targeted",
            FixStep::Normalize => "normalize",
            FixStep::Dependency => "dependency",
            FixStep::Scaffold => "scaffold",
        };
        f.write_str(s)
    }
}

/// A fix that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub step: FixStep,
    pub target: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub applied: Vec<AppliedFix>,
}

impl FixOutcome {
    pub fn fixed(&self) -> bool {
        self.succeeded > 0
    }

    fn record_failure(&mut self) {
        self.attempted += 1;
    }

    fn record_success(
        &mut self,
        step: FixStep,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.attempted += 1;
        self.succeeded += 1;
        self.applied.push(AppliedFix {
            step,
            target: target.into(),
            detail: detail.into(),
        });
    }

    pub fn count(&self, step: FixStep) -> usize {
        self.applied.iter().filter(|f| f.step == step).count()
    }
}

pub struct Remediator {
    root: PathBuf,
    project: ProjectKind,
    tab_width: usize,
    runner: Arc<dyn CommandRunner>,
}

impl Remediator {
    pub fn new(root: impl Into<PathBuf>, project: ProjectKind) -> Self {
        Self {
            root: root.into(),
            project,
            tab_width: DEFAULT_TAB_WIDTH,
            runner: Arc::new(SystemCommandRunner),
        }
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub async fn remediate(
        &self,
        classification: &Classification,
        transcript: Option<&BuildTranscript>,
    ) -> FixOutcome {
        let mut outcome = FixOutcome::default();

        if !classification.is_minor() {
            debug!("Classification is major; nothing to remediate");
            return outcome;
        }

        self.apply_targeted(classification, &mut outcome);
        self.normalize_sources(&mut outcome);
        if let Some(transcript) = transcript {
            self.resolve_dependencies(transcript, &mut outcome).await;
        }
        self.scaffold(&mut outcome);

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            fixed = outcome.fixed(),
            "Remediation complete"
        );
        outcome
    }

    fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn apply_targeted(&self, classification: &Classification, outcome: &mut FixOutcome) {
        for suggestion in &classification.suggestions {
            match targeted::apply(&self.root, suggestion) {
                Ok(path) => outcome.record_success(
                    FixStep::Targeted,
                    self.relative_display(&path),
                    format!("replaced line {}", suggestion.target_line),
                ),
                Err(e) => {
                    warn!(error = %e, "Skipping targeted fix");
                    outcome.record_failure();
                }
            }
        }
    }

    fn normalize_sources(&self, outcome: &mut FixOutcome) {
        for path in normalize::source_files(&self.root, self.project) {
            match normalize::normalize_file(&path, self.tab_width) {
                Ok(true) => outcome.record_success(
                    FixStep::Normalize,
                    self.relative_display(&path),
                    "normalized whitespace",
                ),
                Ok(false) => outcome.attempted += 1,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to normalize file");
                    outcome.record_failure();
                }
            }
        }
    }

    async fn resolve_dependencies(&self, transcript: &BuildTranscript, outcome: &mut FixOutcome) {
        let results = dependencies::resolve(
            &self.root,
            self.project,
            transcript.text(),
            self.runner.as_ref(),
        )
        .await;

        for result in results {
            if result.succeeded() {
                let detail = match (result.installed, result.declared) {
                    (true, true) => "installed and declared",
                    (true, false) => "installed",
                    _ => "declared",
                };
                outcome.record_success(FixStep::Dependency, result.name, detail);
            } else {
                outcome.record_failure();
            }
        }
    }

    fn scaffold(&self, outcome: &mut FixOutcome) {
        match self.project {
            ProjectKind::Nodejs => match scaffold::ensure_build_script(&self.root) {
                Ok(Some(path)) => outcome.record_success(
                    FixStep::Scaffold,
                    self.relative_display(&path),
                    "added placeholder build script",
                ),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to add build script");
                    outcome.record_failure();
                }
            },
            ProjectKind::Python => match scaffold::ensure_test_package(&self.root) {
                Ok(Some(path)) => outcome.record_success(
                    FixStep::Scaffold,
                    self.relative_display(&path),
                    "created test package",
                ),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to create test package");
                    outcome.record_failure();
                }
            },
            _ => {}
        }
    }
}
