use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationIssue;

/// A `type` value that names no known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type '{0}'")]
pub struct UnknownCategory(pub String);

/// Malformed manifest syntax (YAML or JSON), with the location when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Errors from reading, parsing or validating a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("manifest {} is invalid: {}", .path.display(), summarize(.issues))]
    Validation {
        path: PathBuf,
        issues: Vec<ValidationIssue>,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from resolving types and building dependency trees.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("type '{type_path}' not found in any source")]
    NotFound { type_path: String },

    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("invalid type path '{type_path}'")]
    InvalidTypePath { type_path: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to {operation} {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from materializing types and their registry state on disk.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to {operation} {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("type '{type_path}' is not installed")]
    NotInstalled { type_path: String },

    #[error("failed to serialize {}: {message}", .path.display())]
    Serialize { path: PathBuf, message: String },

    #[error("cannot install {} into {}: source and destination overlap", .source_dir.display(), .dest.display())]
    SourceOverlap { source_dir: PathBuf, dest: PathBuf },

    #[error("source contains a symlink at {}, which is not allowed", .path.display())]
    SymlinkInSource { path: PathBuf },

    #[error("symbolic links are not supported on this platform")]
    LinksUnsupported,

    #[error("{} exists and is not a link", .path.display())]
    LinkConflict { path: PathBuf },
}

impl InstallError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
