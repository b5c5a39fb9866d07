//! Source locations mentioned in a build transcript.
//!
//! Recognizes the three shapes compilers and runtimes commonly print:
//! `path:line[:col]: message`, Python's `File "path", line N`, and stack
//! frames of the form `at path:line`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_LOCATIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub file: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn compiler_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([\w/.-]+):(\d+)(?::(\d+))?: (.*)").expect("Invalid compiler location regex")
    })
}

fn python_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"File "([\w/.-]+)", line (\d+)"#).expect("Invalid python location regex")
    })
}

fn stack_frame_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"at ([\w/.-]+):(\d+)").expect("Invalid stack frame regex"))
}

/// Extracts distinct `(file, line)` locations in order of appearance,
/// capped at 50.
pub fn extract_locations(transcript: &str) -> Vec<ErrorLocation> {
    let mut found: Vec<(usize, ErrorLocation)> = Vec::new();

    for caps in compiler_regex().captures_iter(transcript) {
        let (Some(whole), Some(file), Some(line)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(line) = line.as_str().parse() else {
            continue;
        };
        found.push((
            whole.start(),
            ErrorLocation {
                file: file.as_str().to_string(),
                line,
                column: caps.get(3).and_then(|c| c.as_str().parse().ok()),
                message: caps
                    .get(4)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|m| !m.is_empty()),
            },
        ));
    }

    for re in [python_regex(), stack_frame_regex()] {
        for caps in re.captures_iter(transcript) {
            let (Some(whole), Some(file), Some(line)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let Ok(line) = line.as_str().parse() else {
                continue;
            };
            found.push((
                whole.start(),
                ErrorLocation {
                    file: file.as_str().to_string(),
                    line,
                    column: None,
                    message: None,
                },
            ));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, loc)| loc)
        .filter(|loc| seen.insert((loc.file.clone(), loc.line)))
        .take(MAX_LOCATIONS)
        .collect()
}
