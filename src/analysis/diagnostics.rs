// Recoverable problems recorded during a run

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    DuplicateModuleName,
    CycleEnumerationLimitExceeded,
    UnreadableFile,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => "parse_error",
            DiagnosticKind::DuplicateModuleName => "duplicate_module_name",
            DiagnosticKind::CycleEnumerationLimitExceeded => "cycle_enumeration_limit_exceeded",
            DiagnosticKind::UnreadableFile => "unreadable_file",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem that was logged and skipped instead of aborting the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Relative source path, when the problem concerns one file
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build a diagnostic from a recoverable error
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Parse { path, message } => {
                Self::new(DiagnosticKind::ParseError, Some(path), message.as_str())
            }
            Error::DuplicateModuleName {
                module,
                path,
                existing,
            } => Self::new(
                DiagnosticKind::DuplicateModuleName,
                Some(path),
                format!("module '{}' is already defined by {}", module, existing),
            ),
            Error::CycleEnumerationLimitExceeded { .. } => Self::new(
                DiagnosticKind::CycleEnumerationLimitExceeded,
                None,
                err.to_string(),
            ),
            Error::UnreadableFile { path, message } => {
                Self::new(DiagnosticKind::UnreadableFile, Some(path), message.as_str())
            }
            Error::Parser(message) => Self::new(DiagnosticKind::ParseError, None, message.as_str()),
            other => Self::new(DiagnosticKind::UnreadableFile, other.path(), other.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.kind, path, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parse_error() {
        let err = Error::parse("pkg/bad.py", "syntax error at line 3, column 1");
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.kind, DiagnosticKind::ParseError);
        assert_eq!(diag.path.as_deref(), Some("pkg/bad.py"));
        assert_eq!(
            diag.to_string(),
            "[parse_error] pkg/bad.py: syntax error at line 3, column 1"
        );
    }

    #[test]
    fn test_from_duplicate_module() {
        let err = Error::duplicate_module("pkg", "pkg/__init__.py", "pkg.py");
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.kind, DiagnosticKind::DuplicateModuleName);
        assert!(diag.message.contains("pkg.py"));
    }

    #[test]
    fn test_from_cycle_limit() {
        let err = Error::CycleEnumerationLimitExceeded {
            found: 3,
            reason: "search step limit 100 reached".to_string(),
        };
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.kind, DiagnosticKind::CycleEnumerationLimitExceeded);
        assert!(diag.path.is_none());
        assert!(diag.to_string().starts_with("[cycle_enumeration_limit_exceeded]"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosticKind::UnreadableFile).unwrap();
        assert_eq!(json, "\"unreadable_file\"");
    }
}
