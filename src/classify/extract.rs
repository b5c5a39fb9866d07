//! Fix suggestions embedded in a remote analysis narrative.
//!
//! The remote service is asked to answer with blocks such as
//!
//! ```text
//! FILE: src/index.js
//! LINE: 12
//! FIX: const total = items.length;
//! ```
//!
//! The narrative is tokenized line by line into tagged fields. The n-th
//! `FILE`, n-th `LINE` and n-th `FIX` are paired positionally, and only when
//! the three counts agree; otherwise nothing is returned.

use super::types::FixSuggestion;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixToken {
    File(String),
    Line(usize),
    Fix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Misaligned fix fields: {files} FILE, {lines} LINE, {fixes} FIX")]
    Misaligned {
        files: usize,
        lines: usize,
        fixes: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    File,
    Line,
    Fix,
}

/// Recognizes a tag at the start of a line, ignoring indentation and
/// markdown decoration such as `- `, `* `, `> `, `## ` or `**FILE:**`.
fn split_tag(line: &str) -> Option<(Tag, &str)> {
    let body = line.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '*' | '>' | '#' | '`')
    });

    let (tag, rest) = if let Some(rest) = body.strip_prefix("FILE:") {
        (Tag::File, rest)
    } else if let Some(rest) = body.strip_prefix("LINE:") {
        (Tag::Line, rest)
    } else if let Some(rest) = body.strip_prefix("FIX:") {
        (Tag::Fix, rest)
    } else {
        return None;
    };

    // Closing emphasis and quotes mirror the opening ones. A FIX value keeps
    // a trailing backtick unless it also opened with one.
    let value = rest.trim();
    let unquoted = value.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '`'));
    let value = match tag {
        Tag::Fix if unquoted.len() == value.len() => {
            unquoted.trim_end_matches(|c: char| c.is_whitespace() || c == '*')
        }
        _ => unquoted.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '`')),
    };
    Some((tag, value))
}

fn parse_line_number(value: &str) -> Option<usize> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Splits a narrative into its tagged fields, in order of appearance.
///
/// A `FIX` body runs from its tag to the next tagged line or the end of the
/// text and may span several lines. A `LINE` tag without a leading number is
/// not a token.
pub fn tokenize(narrative: &str) -> Vec<FixToken> {
    let mut tokens = Vec::new();
    let mut open_fix: Option<Vec<&str>> = None;

    for line in narrative.lines() {
        let Some((tag, value)) = split_tag(line) else {
            if let Some(body) = open_fix.as_mut() {
                body.push(line);
            }
            continue;
        };

        if let Some(body) = open_fix.take() {
            tokens.push(FixToken::Fix(body.join("\n").trim().to_string()));
        }

        match tag {
            Tag::File => tokens.push(FixToken::File(value.trim_matches('`').to_string())),
            Tag::Line => {
                if let Some(number) = parse_line_number(value) {
                    tokens.push(FixToken::Line(number));
                } else {
                    debug!(value, "Ignoring LINE tag without a number");
                }
            }
            Tag::Fix => open_fix = Some(vec![value]),
        }
    }

    if let Some(body) = open_fix {
        tokens.push(FixToken::Fix(body.join("\n").trim().to_string()));
    }

    tokens
}

/// Pairs tokens positionally, failing if the field counts differ.
pub fn try_extract(narrative: &str) -> Result<Vec<FixSuggestion>, ExtractError> {
    let mut files = Vec::new();
    let mut lines = Vec::new();
    let mut fixes = Vec::new();

    for token in tokenize(narrative) {
        match token {
            FixToken::File(f) => files.push(f),
            FixToken::Line(l) => lines.push(l),
            FixToken::Fix(f) => fixes.push(f),
        }
    }

    if files.len() != lines.len() || lines.len() != fixes.len() {
        return Err(ExtractError::Misaligned {
            files: files.len(),
            lines: lines.len(),
            fixes: fixes.len(),
        });
    }

    Ok(files
        .into_iter()
        .zip(lines)
        .zip(fixes)
        .map(|((file, line), fix)| FixSuggestion {
            target_file: PathBuf::from(file),
            target_line: line,
            replacement: fix,
        })
        .collect())
}

/// Like [`try_extract`], but a misaligned narrative yields no suggestions.
pub fn extract(narrative: &str) -> Vec<FixSuggestion> {
    match try_extract(narrative) {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!(error = %e, "Discarding fix suggestions");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        let narrative = "MINOR: missing semicolon\nFILE: src/index.js\nLINE: 3\nFIX: const a = 1;";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(
            suggestions,
            vec![FixSuggestion::new("src/index.js", 3, "const a = 1;")]
        );
    }

    #[test]
    fn test_multiple_blocks_pair_positionally() {
        let narrative = "\
MINOR
FILE: a.py
LINE: 1
FIX: import os
FILE: b.py
LINE: 20
FIX: return value
";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].target_file, PathBuf::from("b.py"));
        assert_eq!(suggestions[1].target_line, 20);
        assert_eq!(suggestions[1].replacement, "return value");
    }

    #[test]
    fn test_multiline_fix_body() {
        let narrative = "FILE: app.py\nLINE: 5\nFIX: def run():\n    return 1\nFILE: b.py\nLINE: 2\nFIX: pass";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(suggestions[0].replacement, "def run():\n    return 1");
        assert_eq!(suggestions[1].replacement, "pass");
    }

    #[test]
    fn test_misaligned_counts_yield_nothing() {
        let narrative = "FILE: a.js\nLINE: 1\nFIX: x\nFILE: b.js\nLINE: 2\n";
        assert_eq!(
            try_extract(narrative),
            Err(ExtractError::Misaligned {
                files: 2,
                lines: 2,
                fixes: 1
            })
        );
        assert!(extract(narrative).is_empty());
    }

    #[test]
    fn test_line_without_number_is_not_a_token() {
        let narrative = "FILE: a.js\nLINE: unknown\nFIX: x";
        assert!(extract(narrative).is_empty());
    }

    #[test]
    fn test_markdown_decoration_is_tolerated() {
        let narrative = "- **FILE:** `src/main.go`\n- **LINE:** 14\n- **FIX:** return nil";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(suggestions[0].target_file, PathBuf::from("src/main.go"));
        assert_eq!(suggestions[0].target_line, 14);
        assert_eq!(suggestions[0].replacement, "return nil");
    }

    #[test]
    fn test_bold_wrapped_tags_are_unwrapped() {
        let narrative = "**FILE: src/a.js**\n**LINE: 3**\n**FIX: let a = 1;**";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(suggestions[0].target_file, PathBuf::from("src/a.js"));
        assert_eq!(suggestions[0].target_line, 3);
        assert_eq!(suggestions[0].replacement, "let a = 1;");
    }

    #[test]
    fn test_fix_keeps_trailing_template_literal() {
        let narrative = "FILE: a.js\nLINE: 1\nFIX: const s = `hi`";
        let suggestions = try_extract(narrative).unwrap();
        assert_eq!(suggestions[0].replacement, "const s = `hi`");

        let quoted = "FILE: a.js\nLINE: 1\n**FIX:** `const n = 2;`";
        assert_eq!(try_extract(quoted).unwrap()[0].replacement, "const n = 2;");
    }

    #[test]
    fn test_no_tags() {
        assert!(try_extract("MAJOR: incompatible type signature in foo.ts")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_tokenize_order() {
        let tokens = tokenize("FIX: a\nFILE: f\nLINE: 7");
        assert_eq!(
            tokens,
            vec![
                FixToken::Fix("a".to_string()),
                FixToken::File("f".to_string()),
                FixToken::Line(7),
            ]
        );
    }
}
