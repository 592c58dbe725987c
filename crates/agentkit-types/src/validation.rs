//! Structured manifest validation results.

use std::fmt;

use serde::Serialize;

/// A single schema violation.
///
/// `path` is a JSON pointer into the manifest (`/steps/0/skill`, or empty for
/// the document root); `keyword` names the schema rule that failed
/// (`required`, `type`, `enum`, `pattern`, `minItems`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub keyword: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, keyword: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            keyword: keyword.to_owned(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {} [{}]", self.message, self.keyword)
    }
}

/// Outcome of validating one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    /// Whether any issue is attached to exactly `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}
