//! Resolution and planning types.
//!
//! Sources, resolved types, dependency trees and install plans. All of these
//! are transient: built per invocation and discarded once consumed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ResolveError;
use crate::manifest::{is_reference_to, Category, Manifest};

// ---------------------------------------------------------------------------
// Type paths
// ---------------------------------------------------------------------------

/// A validated `<plural>/<name-path>` identifier such as
/// `skills/test/basic-skill`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypePath {
    raw: String,
    category: Category,
}

impl TypePath {
    /// Parse and validate a type path.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidTypePath {
            type_path: raw.to_owned(),
        };

        let (plural, _) = raw.split_once('/').ok_or_else(invalid)?;
        let category = Category::from_plural(plural).ok_or_else(invalid)?;
        if !is_reference_to(category, raw) {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_owned(),
            category,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The path segments after the category directory.
    pub fn name_segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('/').skip(1)
    }

    /// Join this type path onto a root directory (`root/skills/test/x`).
    pub fn under(&self, root: &Path) -> PathBuf {
        self.raw.split('/').fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A named root directory searched for artifacts.
///
/// An ordered `Vec<Source>` defines resolution priority: the first source that
/// contains a type wins outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    pub base_path: PathBuf,
}

impl Source {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
        }
    }
}

/// A type located in a specific source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedType {
    pub type_path: String,
    pub category: Category,
    pub source_name: String,
    pub manifest_path: PathBuf,
    pub version: String,
    pub description: String,
    /// Already present under the installed root; skipped by the planner.
    pub installed: bool,
}

impl ResolvedType {
    /// The directory holding the manifest, i.e. the tree that gets installed.
    pub fn type_dir(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new("."))
    }
}

// ---------------------------------------------------------------------------
// Dependency tree
// ---------------------------------------------------------------------------

/// One node of the reference tree built for an install request.
///
/// Shared references appear once per referencing parent; deduplication
/// happens when the tree is flattened.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyNode {
    pub resolved: ResolvedType,
    #[serde(skip)]
    pub manifest: Manifest,
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Visit every node, children before their parent.
    pub fn walk_post_order<'a>(&'a self, visit: &mut impl FnMut(&'a DependencyNode)) {
        for child in &self.children {
            child.walk_post_order(visit);
        }
        visit(self);
    }
}

// ---------------------------------------------------------------------------
// Install plan
// ---------------------------------------------------------------------------

/// An external executable declared by a skill, with its `PATH` probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliDependency {
    pub name: String,
    pub available: bool,
}

/// Everything needed to confirm and then execute one install request.
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub root: ResolvedType,
    /// Deduplicated, dependency-first; already-installed types excluded.
    pub all_types: Vec<ResolvedType>,
    pub counts: BTreeMap<Category, usize>,
    /// Distinct referenced types skipped because they are already installed.
    pub skip_count: usize,
    pub cli_deps: Vec<CliDependency>,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.all_types.is_empty()
    }

    /// CLI dependencies that were not found on `PATH`.
    pub fn missing_cli_deps(&self) -> impl Iterator<Item = &CliDependency> {
        self.cli_deps.iter().filter(|dep| !dep.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_path_parses_category_and_segments() {
        let path = TypePath::parse("skills/test/basic-skill").unwrap();
        assert_eq!(path.category(), Category::Skill);
        assert_eq!(
            path.name_segments().collect::<Vec<_>>(),
            vec!["test", "basic-skill"]
        );
        assert_eq!(
            path.under(Path::new("/root")),
            PathBuf::from("/root/skills/test/basic-skill")
        );
    }

    #[test]
    fn type_path_rejects_unknown_category_and_bad_names() {
        for raw in ["agents/x", "skills", "skills/", "skills/Bad", "x", ""] {
            let err = TypePath::parse(raw).unwrap_err();
            assert!(
                matches!(err, ResolveError::InvalidTypePath { .. }),
                "expected invalid type path for {raw:?}"
            );
        }
    }
}
