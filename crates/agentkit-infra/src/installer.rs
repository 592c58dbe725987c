//! Filesystem installer.
//!
//! Installs resolved types under an installed root laid out like the sources:
//! ```text
//! {installed_root}/{category-plural}/{name-path}/
//!   skill.yaml | manifest.yaml | ...
//!   <everything else from the source directory>
//! ```
//! Installing is remove-then-copy. It is not atomic: a crash mid-copy can leave
//! a partial directory, which the next install replaces.

use std::path::{Path, PathBuf};

use agentkit_core::source::discover_installed;
use agentkit_types::error::InstallError;
use agentkit_types::manifest::Category;
use agentkit_types::resolve::{InstallPlan, ResolvedType, TypePath};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::registry::init_skill_registry;

/// Destination directory of a type under the installed root.
pub fn installed_path(installed_root: &Path, type_path: &str) -> PathBuf {
    type_path
        .split('/')
        .fold(installed_root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Install one resolved type, replacing any existing installed copy wholesale.
///
/// The source tree is checked before anything is removed: it must not overlap
/// the destination and must not contain symlinks. Returns the installed
/// directory.
pub fn install_type(resolved: &ResolvedType, installed_root: &Path) -> Result<PathBuf, InstallError> {
    let src = resolved.type_dir();
    let dest = installed_path(installed_root, &resolved.type_path);

    ensure_disjoint(src, &dest)?;
    let entries = collect_source_entries(src)?;

    if dest.exists() {
        debug!(path = %dest.display(), "Removing previous installation");
        std::fs::remove_dir_all(&dest).map_err(|e| InstallError::io("remove", &dest, e))?;
    }
    std::fs::create_dir_all(&dest).map_err(|e| InstallError::io("create directory", &dest, e))?;

    let mut files = 0usize;
    for entry in entries {
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| InstallError::io("copy", entry.path(), std::io::ErrorKind::InvalidInput.into()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| InstallError::io("create directory", &target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| InstallError::io("copy", entry.path(), e))?;
            debug!(from = %entry.path().display(), to = %target.display(), "Copied file");
            files += 1;
        }
    }

    info!(
        type_path = %resolved.type_path,
        source = %resolved.source_name,
        version = %resolved.version,
        files,
        "Installed type"
    );
    Ok(dest)
}

/// Reject a destination that is the source directory, or nested on either side
/// of it. Paths are compared after resolving symlinks.
fn ensure_disjoint(src: &Path, dest: &Path) -> Result<(), InstallError> {
    let src_real = src
        .canonicalize()
        .map_err(|e| InstallError::io("read", src, e))?;
    let dest_real = canonicalize_lenient(dest);

    if dest_real.starts_with(&src_real) || src_real.starts_with(&dest_real) {
        return Err(InstallError::SourceOverlap {
            source_dir: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the deepest existing ancestor and re-append the rest.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return rest.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_owned());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Walk the source tree without following links, failing on the first symlink.
fn collect_source_entries(src: &Path) -> Result<Vec<walkdir::DirEntry>, InstallError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            InstallError::io("read", path, e.into())
        })?;
        if entry.path_is_symlink() {
            return Err(InstallError::SymlinkInSource {
                path: entry.path().to_path_buf(),
            });
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Remove an installed type. The skill registry is never touched.
///
/// Empty parent directories left behind are pruned up to the installed root.
pub fn uninstall_type(type_path: &str, installed_root: &Path) -> Result<PathBuf, InstallError> {
    let not_installed = || InstallError::NotInstalled {
        type_path: type_path.to_owned(),
    };
    let parsed = TypePath::parse(type_path).map_err(|_| not_installed())?;
    let dir = parsed.under(installed_root);
    if !dir.is_dir() {
        return Err(not_installed());
    }

    std::fs::remove_dir_all(&dir).map_err(|e| InstallError::io("remove", &dir, e))?;

    let mut parent = dir.parent();
    while let Some(current) = parent {
        if current == installed_root || !current.starts_with(installed_root) {
            break;
        }
        // Stops at the first directory that still has content.
        if std::fs::remove_dir(current).is_err() {
            break;
        }
        parent = current.parent();
    }

    info!(type_path = %parsed, path = %dir.display(), "Uninstalled type");
    Ok(dir)
}

/// Every type installed under `installed_root`, sorted by type path.
pub fn list_installed(installed_root: &Path) -> Vec<ResolvedType> {
    let mut installed = discover_installed(installed_root);
    installed.sort_by(|a, b| a.type_path.cmp(&b.type_path));
    installed
}

/// What [`install_plan`] did.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub installed: Vec<PathBuf>,
    /// Registry warnings from every skill in the plan, in install order.
    pub warnings: Vec<String>,
}

/// Install every type in a plan, dependency-first, initializing the registry
/// of each skill right after it is installed.
///
/// The first error aborts; types installed before it stay installed.
pub fn install_plan(
    plan: &InstallPlan,
    installed_root: &Path,
    userdata_root: &Path,
) -> Result<InstallReport, InstallError> {
    let mut report = InstallReport::default();

    for resolved in &plan.all_types {
        report.installed.push(install_type(resolved, installed_root)?);
        if resolved.category == Category::Skill {
            report.warnings.extend(init_skill_registry(resolved, userdata_root)?);
        }
    }

    Ok(report)
}
