//! Command handlers. Each returns the process exit code.

use super::commands::{AnalyzeArgs, ConfigArgs, FixArgs, TreeArgs};
use super::output::{OutputFormat, OutputFormatter, RunReport};
use crate::classify::{Classifier, DecisionStore, RemoteClassifier};
use crate::config::MedicConfig;
use crate::project::ProjectKind;
use crate::remediate::Remediator;
use crate::transcript::BuildTranscript;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Classify, persist and, when `remediate` is set, fix.
pub async fn handle_analyze(
    args: &AnalyzeArgs,
    config: MedicConfig,
    remediate: bool,
    quiet: bool,
) -> i32 {
    match run_analyze(args, config, remediate).await {
        Ok(report) => emit(&report, &args.tree, quiet),
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

pub async fn handle_fix(args: &FixArgs, config: MedicConfig, quiet: bool) -> i32 {
    match run_fix(args, config).await {
        Ok(report) => emit(&report, &args.tree, quiet),
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs, config: &MedicConfig) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_config(config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to format configuration: {:#}", e);
            return 1;
        }
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return 1;
    }
    0
}

fn resolve_root(tree: &TreeArgs) -> Result<PathBuf> {
    let root = match &tree.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };

    if !root.is_dir() {
        anyhow::bail!("Project root is not a directory: {}", root.display());
    }
    root.canonicalize()
        .with_context(|| format!("Failed to canonicalize project root {}", root.display()))
}

fn with_tree_overrides(mut config: MedicConfig, tree: &TreeArgs) -> MedicConfig {
    if let Some(project) = tree.project {
        config.project = project;
    }
    config
}

fn decision_store(root: &Path, tree: &TreeArgs) -> DecisionStore {
    DecisionStore::new(root.join(&tree.record), root.join(&tree.flag))
}

fn load_transcript(path: &Path) -> Result<Option<BuildTranscript>> {
    let transcript = BuildTranscript::load(path)?;
    if transcript.is_none() {
        warn!(path = %path.display(), "Build transcript not found");
    }
    Ok(transcript)
}

/// Transcript location as reported, relative to `root` when inside it.
fn transcript_label(root: &Path, transcript: Option<&BuildTranscript>) -> Option<String> {
    let path = transcript?.path()?;
    let shown = path.strip_prefix(root).unwrap_or(path);
    Some(shown.display().to_string())
}

fn remote_classifier(config: &MedicConfig) -> Option<RemoteClassifier> {
    match config.create_client() {
        Ok(Some(client)) => {
            info!(
                provider = config.provider.as_str(),
                model = %config.model,
                "Remote analysis enabled"
            );
            Some(RemoteClassifier::new(client, config.max_transcript_chars))
        }
        Ok(None) => {
            info!("No API key configured; using pattern matching only");
            None
        }
        Err(e) => {
            warn!(error = %e, "Remote analysis unavailable; using pattern matching only");
            None
        }
    }
}

async fn run_analyze(
    args: &AnalyzeArgs,
    config: MedicConfig,
    remediate: bool,
) -> Result<RunReport> {
    let root = resolve_root(&args.tree)?;
    let mut config = with_tree_overrides(config, &args.tree);
    if let Some(max_chars) = args.max_chars {
        config.max_transcript_chars = max_chars;
    }
    if args.no_remote {
        config.api_key = None;
    }
    config.validate().context("Configuration error")?;
    debug!(config = ?config, root = %root.display(), "Effective configuration");

    let transcript_path = root.join(&args.transcript);
    let transcript = load_transcript(&transcript_path)?;

    let classifier = Classifier::new(remote_classifier(&config))
        .with_store(decision_store(&root, &args.tree));
    let classification = classifier.classify(transcript.as_ref(), config.project).await;

    let remediation = if remediate {
        let remediator = Remediator::new(&root, config.project).with_tab_width(config.tab_width);
        Some(remediator.remediate(&classification, transcript.as_ref()).await)
    } else {
        None
    };

    Ok(RunReport {
        project: config.project,
        transcript: transcript_label(&root, transcript.as_ref()),
        classification,
        remediation,
    })
}

async fn run_fix(args: &FixArgs, config: MedicConfig) -> Result<RunReport> {
    let root = resolve_root(&args.tree)?;
    let config = with_tree_overrides(config, &args.tree);
    config.validate().context("Configuration error")?;

    let store = decision_store(&root, &args.tree);
    let record = store.load().with_context(|| {
        format!(
            "Cannot load classification record {}; run `buildmedic classify` first",
            store.record_path().display()
        )
    })?;

    let project = match args.tree.project {
        Some(project) => project,
        None if record.project != ProjectKind::Unknown => record.project,
        None => config.project,
    };
    let classification = record.into_classification();

    let transcript_path = root.join(&args.transcript);
    let transcript = load_transcript(&transcript_path)?;

    let remediator = Remediator::new(&root, project).with_tab_width(config.tab_width);
    let outcome = remediator.remediate(&classification, transcript.as_ref()).await;

    Ok(RunReport {
        project,
        transcript: transcript_label(&root, transcript.as_ref()),
        classification,
        remediation: Some(outcome),
    })
}

fn emit(report: &RunReport, tree: &TreeArgs, quiet: bool) -> i32 {
    let format: OutputFormat = tree.format.into();
    let output = match OutputFormatter::new(format).format(report) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return 1;
        }
    };

    if let Some(output_file) = &tree.output {
        match std::fs::write(output_file, &output) {
            Ok(_) => {
                info!("Output written to: {}", output_file.display());
                if !quiet {
                    println!("Output written to: {}", output_file.display());
                }
            }
            Err(e) => {
                error!("Failed to write output to file: {}", e);
                return 1;
            }
        }
    } else if !quiet || format != OutputFormat::Human {
        println!("{}", output);
    }

    0
}
