//! Diagnostics produced while checking an extraction request.
//!
//! Grid problems keep the `GridIssue` they came from, so callers can tell a
//! bad column count from a bad row count without parsing codes.

use std::fmt;

use crate::error::TilexError;
use crate::types::GridIssue;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request still runs, but probably not as intended.
    Warning,
    /// The request must not be submitted.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One problem found with an extraction request.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Machine-readable code (e.g. "tilex::grid::non-integer-rows").
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
    /// The partition failure behind a grid diagnostic.
    pub grid_issue: Option<GridIssue>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            help: None,
            grid_issue: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            help: None,
            grid_issue: None,
        }
    }

    /// Add help text to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl From<GridIssue> for Diagnostic {
    fn from(issue: GridIssue) -> Self {
        let help = match issue {
            GridIssue::NonIntegerColumnCount { .. } => {
                "Choose a tile width that divides the image width"
            }
            GridIssue::NonIntegerRowCount { .. } => {
                "Choose a tile height that divides the image height"
            }
        };
        Self {
            grid_issue: Some(issue),
            ..Diagnostic::error(issue.code(), issue.to_string()).with_help(help)
        }
    }
}

/// Every diagnostic found for one request, in check order.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.diagnostics.push(diagnostic.into());
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Count errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Count warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are no diagnostics at all.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Iterate over diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Iterate over error diagnostics only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Partition failures, columns before rows.
    pub fn grid_issues(&self) -> impl Iterator<Item = GridIssue> + '_ {
        self.diagnostics.iter().filter_map(|d| d.grid_issue)
    }

    /// One-line count, e.g. "2 error(s), 1 warning(s)".
    pub fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }

    /// Fold the errors into a single `Validation` error, if there are any.
    ///
    /// Messages are joined with "; " and the first help text is kept.
    pub fn into_error(self) -> Option<TilexError> {
        if !self.has_errors() {
            return None;
        }
        let message = self
            .errors()
            .map(|d| d.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let help = self.errors().find_map(|d| d.help.clone());
        Some(TilexError::Validation { message, help })
    }
}
