//! Validation error types

use std::fmt;

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted field path, empty for the document root
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every violation found in a document, not just the first
///
/// Displays as `path: message` entries joined by `, `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    #[inline]
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Collected issues in discovery order
    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Whether any issue sits at or below `path`
    #[must_use]
    pub fn touches(&self, path: &str) -> bool {
        self.issues.iter().any(|i| {
            i.path == path
                || i
                    .path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Widget prop resolution errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropError {
    #[error("unknown widget type: {0}")]
    UnknownWidgetType(String),

    #[error("props.{key}: {message}")]
    InvalidProp { key: String, message: String },
}
