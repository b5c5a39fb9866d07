//! Deterministic, rule-based classification.
//!
//! The rule table is evaluated top to bottom and the first matching
//! category wins. Two project-specific overrides run afterwards. Matching is
//! plain case-insensitive substring search, so the result depends only on
//! the transcript text and the project kind.

use super::types::ErrorKind;
use crate::project::ProjectKind;
use serde::Serialize;

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub category: &'static str,
    pub triggers: &'static [&'static str],
}

pub const RULES: &[PatternRule] = &[
    PatternRule {
        category: "whitespace",
        triggers: &["indentation contains tabs", "trailing whitespace"],
    },
    PatternRule {
        category: "import",
        triggers: &["cannot find module", "ModuleNotFoundError"],
    },
    PatternRule {
        category: "syntax",
        triggers: &["SyntaxError", "Missing semicolon"],
    },
    PatternRule {
        category: "linting",
        triggers: &["ESLint", "pylint"],
    },
];

const NPM_MISSING_SCRIPT: &str = "npm ERR! missing script";
const PYTHON_INDENTATION: &str = "IndentationError";

/// What made the classifier decide MINOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub category: &'static str,
    pub trigger: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, transcript: &str, project: ProjectKind) -> ErrorKind {
        if self.evaluate(transcript, project).is_some() {
            ErrorKind::Minor
        } else {
            ErrorKind::Major
        }
    }

    /// Returns the first table rule that matches, else the first applicable
    /// project override, else `None` (MAJOR).
    pub fn evaluate(&self, transcript: &str, project: ProjectKind) -> Option<PatternMatch> {
        let haystack = transcript.to_lowercase();

        for rule in RULES {
            if let Some(trigger) = rule
                .triggers
                .iter()
                .find(|t| haystack.contains(&t.to_lowercase()))
                .copied()
            {
                return Some(PatternMatch {
                    category: rule.category,
                    trigger,
                });
            }
        }

        match project {
            ProjectKind::Nodejs if haystack.contains(&NPM_MISSING_SCRIPT.to_lowercase()) => {
                Some(PatternMatch {
                    category: "nodejs",
                    trigger: NPM_MISSING_SCRIPT,
                })
            }
            ProjectKind::Python if haystack.contains(&PYTHON_INDENTATION.to_lowercase()) => {
                Some(PatternMatch {
                    category: "python",
                    trigger: PYTHON_INDENTATION,
                })
            }
            _ => None,
        }
    }
}
