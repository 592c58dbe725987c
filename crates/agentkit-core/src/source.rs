//! Source registry: ordered roots and first-match-wins type resolution.
//!
//! Sources override each other wholesale. When two sources define the same
//! type path, the earlier source's copy is used in full and nothing is merged
//! from the later one.

use std::collections::HashSet;
use std::path::Path;

use agentkit_types::config::{ExtensionDecl, SOURCE_CATALOG, SOURCE_EXTENSIONS, SOURCE_LOCAL};
use agentkit_types::error::{ManifestError, ResolveError};
use agentkit_types::manifest::{Category, Manifest};
use agentkit_types::resolve::{ResolvedType, Source, TypePath};
use agentkit_types::validation::ValidationIssue;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::manifest::locate::locate_manifest;
use crate::manifest::{load_manifest, validation_error};

/// Directory under the repository root holding extensions without an
/// explicit path.
pub const EXTENSIONS_DIR: &str = "extensions";

/// Build the ordered source list from resolution-order tokens.
///
/// - `local` resolves to the current working directory.
/// - `catalog` resolves to `<repo_root>/catalog`.
/// - `extensions` expands in place to one source per declared extension, in
///   declaration order.
/// - Any other token resolves to `<repo_root>/<token>`.
pub fn build_sources(
    resolution_order: &[String],
    extensions: &[ExtensionDecl],
    repo_root: &Path,
) -> Result<Vec<Source>, ResolveError> {
    let cwd = std::env::current_dir().map_err(|source| ResolveError::Io {
        operation: "read current directory",
        path: ".".into(),
        source,
    })?;
    Ok(build_sources_in(resolution_order, extensions, repo_root, &cwd))
}

/// [`build_sources`] with an explicit working directory for `local`.
pub fn build_sources_in(
    resolution_order: &[String],
    extensions: &[ExtensionDecl],
    repo_root: &Path,
    cwd: &Path,
) -> Vec<Source> {
    let mut sources = Vec::new();

    for token in resolution_order {
        match token.as_str() {
            SOURCE_LOCAL => sources.push(Source::new(SOURCE_LOCAL, cwd)),
            SOURCE_CATALOG => sources.push(Source::new(SOURCE_CATALOG, repo_root.join(SOURCE_CATALOG))),
            SOURCE_EXTENSIONS => {
                sources.extend(extensions.iter().map(|ext| {
                    let base = match &ext.path {
                        Some(path) => repo_root.join(path),
                        None => repo_root.join(EXTENSIONS_DIR).join(&ext.name),
                    };
                    Source::new(ext.name.clone(), base)
                }));
            }
            other => sources.push(Source::new(other, repo_root.join(other))),
        }
    }

    debug!(
        sources = ?sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "Built source list"
    );
    sources
}

/// Resolve a type path against the sources in priority order.
///
/// Returns `Ok(None)` when no source contains the type. A manifest that exists
/// but cannot be read or is invalid is an error: it does not fall through to
/// lower-priority sources.
pub fn resolve_type(type_path: &str, sources: &[Source]) -> Result<Option<ResolvedType>, ResolveError> {
    let type_path = TypePath::parse(type_path)?;
    Ok(resolve_with_manifest(&type_path, sources)?.map(|(resolved, _)| resolved))
}

/// Resolve a type path and keep the loaded manifest alongside it.
pub(crate) fn resolve_with_manifest(
    type_path: &TypePath,
    sources: &[Source],
) -> Result<Option<(ResolvedType, Manifest)>, ResolveError> {
    for source in sources {
        let dir = type_path.under(&source.base_path);
        let Some(manifest_path) = locate_manifest(&dir, type_path.category()) else {
            debug!(type_path = %type_path, source = %source.name, "Not in source");
            continue;
        };

        let manifest = load_typed(&manifest_path, type_path.category())?;
        debug!(
            type_path = %type_path,
            source = %source.name,
            version = %manifest.version(),
            "Resolved type"
        );
        let resolved = resolved_type(type_path.as_str(), source, &manifest_path, &manifest);
        return Ok(Some((resolved, manifest)));
    }

    Ok(None)
}

/// Walk every source's category directories and list every valid type.
///
/// Entries are deduplicated by type path, keeping the one from the earliest
/// source. Invalid manifests are skipped with a warning.
pub fn discover_all(sources: &[Source]) -> Vec<ResolvedType> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for source in sources {
        for (resolved, _) in discover_source(source) {
            if seen.insert(resolved.type_path.clone()) {
                found.push(resolved);
            } else {
                debug!(
                    type_path = %resolved.type_path,
                    source = %source.name,
                    "Shadowed by higher-priority source"
                );
            }
        }
    }

    debug!(count = found.len(), "Discovered types");
    found
}

/// List every type materialized under an installed root.
pub fn discover_installed(installed_root: &Path) -> Vec<ResolvedType> {
    let source = Source::new("installed", installed_root);
    discover_source(&source)
        .into_iter()
        .map(|(mut resolved, _)| {
            resolved.installed = true;
            resolved
        })
        .collect()
}

fn discover_source(source: &Source) -> Vec<(ResolvedType, Manifest)> {
    let mut found = Vec::new();

    for category in Category::ALL {
        let category_dir = source.base_path.join(category.plural());
        if !category_dir.is_dir() {
            continue;
        }

        let mut entries = WalkDir::new(&category_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                entries.skip_current_dir();
                continue;
            }
            let Some(manifest_path) = locate_manifest(entry.path(), category) else {
                continue;
            };
            // A type directory owns everything beneath it.
            entries.skip_current_dir();

            let Some(type_path) = relative_type_path(&source.base_path, entry.path()) else {
                continue;
            };
            if let Err(e) = TypePath::parse(&type_path) {
                warn!(source = %source.name, error = %e, "Skipping type with invalid path");
                continue;
            }

            match load_typed(&manifest_path, category) {
                Ok(manifest) => {
                    let resolved = resolved_type(&type_path, source, &manifest_path, &manifest);
                    found.push((resolved, manifest));
                }
                Err(e) => {
                    warn!(
                        source = %source.name,
                        type_path = %type_path,
                        error = %e,
                        "Skipping invalid manifest"
                    );
                }
            }
        }
    }

    found
}

/// Load a manifest and check that its `type` matches the directory it was
/// found under.
fn load_typed(manifest_path: &Path, expected: Category) -> Result<Manifest, ManifestError> {
    let manifest = load_manifest(manifest_path)?;
    if manifest.category() != expected {
        return Err(validation_error(
            manifest_path.to_path_buf(),
            vec![ValidationIssue::new(
                "/type",
                "const",
                format!(
                    "'{}' does not match its location under '{}'",
                    manifest.category(),
                    expected.plural()
                ),
            )],
        ));
    }
    Ok(manifest)
}

fn resolved_type(type_path: &str, source: &Source, manifest_path: &Path, manifest: &Manifest) -> ResolvedType {
    ResolvedType {
        type_path: type_path.to_owned(),
        category: manifest.category(),
        source_name: source.name.clone(),
        manifest_path: manifest_path.to_path_buf(),
        version: manifest.version().to_owned(),
        description: manifest.description().to_owned(),
        installed: false,
    }
}

fn relative_type_path(base: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(base).ok()?;
    let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(segments?.join("/"))
}
