//! Manifest parsing and loading.
//!
//! Parsing and validation are separate steps: [`parse`] only rejects malformed
//! syntax, while an unknown or missing `type` surfaces later as a validation
//! issue from [`schema::validate`]. [`load_manifest`] runs the whole pipeline
//! and yields a typed [`Manifest`].

pub mod locate;
pub mod schema;

use std::path::{Path, PathBuf};

use agentkit_types::error::{ManifestError, ParseError};
use agentkit_types::manifest::Manifest;
use agentkit_types::validation::{ValidationIssue, ValidationResult};
use serde_yaml_ng::Value;

/// On-disk encoding of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// `.json` files are JSON; everything else is treated as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// A syntactically well-formed manifest that has not been validated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    value: Value,
}

impl ManifestDocument {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The raw `type` field, if it is a string.
    pub fn type_name(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    pub fn validate(&self) -> ValidationResult {
        schema::validate(&self.value)
    }

    /// Validate and convert into the typed manifest union.
    pub fn into_manifest(self) -> Result<Manifest, Vec<ValidationIssue>> {
        let result = self.validate();
        if !result.valid {
            return Err(result.issues);
        }

        serde_yaml_ng::from_value(self.value)
            .map_err(|e| vec![ValidationIssue::new("", "type", e.to_string())])
    }
}

/// Parse raw manifest bytes.
///
/// Only syntax errors fail here. A document that is not a mapping, or whose
/// `type` is missing or unknown, parses successfully and is reported by
/// validation instead.
pub fn parse(bytes: &[u8], format: ManifestFormat) -> Result<ManifestDocument, ParseError> {
    let value = match format {
        ManifestFormat::Yaml => serde_yaml_ng::from_slice::<Value>(bytes).map_err(|e| {
            let location = e.location();
            ParseError {
                message: e.to_string(),
                line: location.as_ref().map(|l| l.line()),
                column: location.as_ref().map(|l| l.column()),
            }
        })?,
        ManifestFormat::Json => serde_json::from_slice::<Value>(bytes).map_err(|e| ParseError {
            message: e.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
        })?,
    };

    Ok(ManifestDocument { value })
}

/// Read and parse a manifest file. I/O failures are distinct from parse
/// failures.
pub fn parse_file(path: &Path) -> Result<ManifestDocument, ManifestError> {
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&bytes, ManifestFormat::from_path(path)).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, parse and validate a manifest file, returning every issue found.
///
/// Only I/O and syntax problems are errors; schema violations are reported in
/// the returned [`ValidationResult`].
pub fn validate_file(path: &Path) -> Result<ValidationResult, ManifestError> {
    Ok(parse_file(path)?.validate())
}

/// Read, parse, validate and type a manifest file.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let document = parse_file(path)?;
    document
        .into_manifest()
        .map_err(|issues| validation_error(path.to_path_buf(), issues))
}

pub(crate) fn validation_error(path: PathBuf, issues: Vec<ValidationIssue>) -> ManifestError {
    ManifestError::Validation { path, issues }
}
