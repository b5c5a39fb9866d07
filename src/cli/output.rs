//! Output formatting for multiple formats
//!
//! Reports are rendered as JSON, YAML or human-readable text. JSON and YAML
//! serialize the same [`RunReport`] structure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::classify::Classification;
use crate::config::MedicConfig;
use crate::project::ProjectKind;
use crate::remediate::FixOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

/// Everything one command invocation decided and did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub project: ProjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub classification: Classification,
    /// `None` when the command does not remediate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<FixOutcome>,
}

impl RunReport {
    pub fn fixed(&self) -> bool {
        self.remediation.as_ref().is_some_and(FixOutcome::fixed)
    }
}

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Yaml => self.format_yaml(report),
            OutputFormat::Human => Ok(self.format_human(report)),
        }
    }

    pub fn format_config(&self, config: &MedicConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_json(&self, report: &RunReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
    }

    fn format_yaml(&self, report: &RunReport) -> Result<String> {
        serde_yaml::to_string(report).context("Failed to serialize report to YAML")
    }

    fn format_human(&self, report: &RunReport) -> String {
        let classification = &report.classification;
        let mut output = String::new();

        if classification.is_minor() {
            output.push_str("\u{2713} Build Failure: MINOR (automatically fixable)\n");
        } else {
            output.push_str("\u{26A0} Build Failure: MAJOR (needs human attention)\n");
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Project:       {}\n", report.project));
        if let Some(ref transcript) = report.transcript {
            output.push_str(&format!("Transcript:    {}\n", transcript));
        }
        output.push_str(&format!("Decided by:    {}\n\n", classification.source));

        output.push_str("Analysis:\n");
        for line in classification.narrative.lines() {
            output.push_str(&format!("  {}\n", line));
        }
        output.push('\n');

        if !classification.suggestions.is_empty() {
            output.push_str("Suggested Fixes:\n");
            let last = classification.suggestions.len() - 1;
            for (i, s) in classification.suggestions.iter().enumerate() {
                let branch = if i == last { "\u{2514}\u{2500}" } else { "\u{251C}\u{2500}" };
                output.push_str(&format!(
                    "{} {}:{}  {}\n",
                    branch,
                    s.target_file.display(),
                    s.target_line,
                    s.replacement.lines().next().unwrap_or_default()
                ));
            }
            output.push('\n');
        }

        if !classification.locations.is_empty() {
            output.push_str("Error Locations:\n");
            for loc in &classification.locations {
                match loc.column {
                    Some(col) => output.push_str(&format!("  {}:{}:{}\n", loc.file, loc.line, col)),
                    None => output.push_str(&format!("  {}:{}\n", loc.file, loc.line)),
                }
            }
            output.push('\n');
        }

        if let Some(ref outcome) = report.remediation {
            output.push_str(&format!(
                "Remediation:   {} of {} fixes applied\n",
                outcome.succeeded, outcome.attempted
            ));
            for fix in &outcome.applied {
                output.push_str(&format!("  [{}] {}: {}\n", fix.step, fix.target, fix.detail));
            }
            if outcome.fixed() {
                output.push_str("\nFixes were applied; rebuild to verify.\n");
            } else if classification.is_minor() {
                output.push_str("\nNo fixes could be applied.\n");
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationSource, ErrorKind, ErrorLocation, FixSuggestion};
    use crate::remediate::{AppliedFix, FixStep};

    fn minor_report() -> RunReport {
        RunReport {
            project: ProjectKind::Nodejs,
            transcript: Some("build_log.txt".to_string()),
            classification: Classification {
                kind: ErrorKind::Minor,
                source: ClassificationSource::Remote,
                narrative: "MINOR: missing semicolon".to_string(),
                suggestions: vec![FixSuggestion::new("src/index.js", 3, "const a = 1;")],
                locations: vec![ErrorLocation {
                    file: "src/index.js".to_string(),
                    line: 3,
                    column: Some(14),
                    message: None,
                }],
            },
            remediation: Some(FixOutcome {
                attempted: 2,
                succeeded: 1,
                applied: vec![AppliedFix {
                    step: FixStep::Targeted,
                    target: "src/index.js".to_string(),
                    detail: "replaced line 3".to_string(),
                }],
            }),
        }
    }

    #[test]
    fn test_json_output() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format(&minor_report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["project"], "nodejs");
        assert_eq!(value["classification"]["kind"], "minor");
        assert_eq!(value["classification"]["source"], "remote");
        assert_eq!(value["classification"]["suggestions"][0]["file"], "src/index.js");
        assert_eq!(value["remediation"]["succeeded"], 1);
        assert_eq!(value["remediation"]["applied"][0]["step"], "targeted");
    }

    #[test]
    fn test_yaml_output() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format(&minor_report())
            .unwrap();
        assert!(output.contains("project: nodejs"));
        assert!(output.contains("kind: minor"));
    }

    #[test]
    fn test_human_output() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format(&minor_report())
            .unwrap();
        assert!(output.contains("MINOR"));
        assert!(output.contains("src/index.js:3  const a = 1;"));
        assert!(output.contains("src/index.js:3:14"));
        assert!(output.contains("1 of 2 fixes applied"));
        assert!(output.contains("[targeted] src/index.js: replaced line 3"));
    }

    #[test]
    fn test_major_without_remediation() {
        let report = RunReport {
            project: ProjectKind::Go,
            transcript: None,
            classification: Classification::no_transcript(),
            remediation: None,
        };
        assert!(!report.fixed());

        let human = OutputFormatter::new(OutputFormat::Human)
            .format(&report)
            .unwrap();
        assert!(human.contains("MAJOR"));
        assert!(!human.contains("Remediation"));

        let json = OutputFormatter::new(OutputFormat::Json)
            .format(&report)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("remediation").is_none());
        assert_eq!(value["classification"]["source"], "no_transcript");
    }

    #[test]
    fn test_config_output_masks_key() {
        let config = MedicConfig {
            api_key: Some("sk-secret-9876".to_string()),
            ..Default::default()
        };
        for format in [OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Human] {
            let output = OutputFormatter::new(format).format_config(&config).unwrap();
            assert!(output.contains("9876"));
            assert!(!output.contains("secret"));
        }
    }
}
