//! Line diagnostics for LaTeX content.
//!
//! A single pass over the content, one line at a time:
//! - `{` / `}` counts must match on every line
//! - `$` count must be even on every line (inline math)
//!
//! Pure and restartable: the same content always yields the same list, and
//! malformed input only produces more diagnostics.

use std::fmt;
use std::ops::Range;

use owo_colors::OwoColorize;
use serde::Serialize;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Location of a diagnostic: 1-based line number plus its byte span in the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub line: usize,
    pub bytes: Range<usize>,
}

/// A lint finding attached to one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line_range: LineRange,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn error(line_range: LineRange, message: &str) -> Self {
        Self {
            line_range,
            severity: Severity::Error,
            message: message.to_string(),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => self.severity.label().red().bold().to_string(),
            Severity::Warning => self.severity.label().yellow().bold().to_string(),
        };
        write!(f, "line {}: {}: {}", self.line_range.line, label, self.message)
    }
}

const UNBALANCED_BRACES: &str = "unbalanced braces in this line";
const UNBALANCED_DOLLARS: &str = "unbalanced dollar signs in this line";

/// Lint LaTeX content, returning diagnostics ordered by line.
pub fn lint(content: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut offset = 0;

    for (index, raw) in content.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let range = LineRange {
            line: index + 1,
            bytes: offset..offset + line.len(),
        };
        offset += raw.len() + 1;

        let (mut open, mut close, mut dollars) = (0usize, 0usize, 0usize);
        for b in line.bytes() {
            match b {
                b'{' => open += 1,
                b'}' => close += 1,
                b'$' => dollars += 1,
                _ => {}
            }
        }

        if open != close {
            diagnostics.push(Diagnostic::error(range.clone(), UNBALANCED_BRACES));
        }
        if dollars % 2 != 0 {
            diagnostics.push(Diagnostic::error(range, UNBALANCED_DOLLARS));
        }
    }

    diagnostics
}

/// Count of error-level diagnostics.
pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_environment() {
        let diagnostics = lint("\\begin{equation");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].line_range.line, 1);
        assert_eq!(diagnostics[0].message, UNBALANCED_BRACES);
    }

    #[test]
    fn test_balanced_line_is_clean() {
        assert!(lint("\\section{Intro} and $x^2$").is_empty());
        assert!(lint("").is_empty());
    }

    #[test]
    fn test_odd_dollars() {
        let diagnostics = lint("where $x = 1");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, UNBALANCED_DOLLARS);
    }

    #[test]
    fn test_two_defects_same_line() {
        let diagnostics = lint("\\frac{a $b");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.line_range.line == 1));
        assert_eq!(diagnostics[0].message, UNBALANCED_BRACES);
        assert_eq!(diagnostics[1].message, UNBALANCED_DOLLARS);
    }

    #[test]
    fn test_per_line_not_per_document() {
        // Braces balance across the document but not per line
        let diagnostics = lint("\\begin{a\n}");
        let lines: Vec<_> = diagnostics.iter().map(|d| d.line_range.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_byte_ranges() {
        let content = "ok\r\n{\nfine";
        let diagnostics = lint(content);
        assert_eq!(diagnostics.len(), 1);
        let range = &diagnostics[0].line_range;
        assert_eq!(range.line, 2);
        assert_eq!(&content[range.bytes.clone()], "{");
    }

    #[test]
    fn test_deterministic() {
        let content = "$a$ {b}\n}{ $\n\\end{doc";
        let first = lint(content);
        let _ = lint("unrelated { content");
        assert_eq!(first, lint(content));
        assert_eq!(error_count(&first), 2);
    }

    #[test]
    fn test_display() {
        let display = lint("{")[0].to_string();
        assert!(display.starts_with("line 1: "));
        assert!(display.ends_with(UNBALANCED_BRACES));
    }
}
