//! Linking installed types into an active-set directory.
//!
//! Operating-system specifics stay behind [`LinkPlatform`]; this module only
//! decides what to link where.

use std::io;
use std::path::{Path, PathBuf};

use agentkit_types::error::InstallError;
use agentkit_types::resolve::TypePath;
use tracing::{debug, info};

/// Platform symlink operations.
pub trait LinkPlatform {
    /// Create a link at `link` pointing to `target`.
    fn create_link(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// The target a link points to.
    fn read_link_target(&self, link: &Path) -> io::Result<PathBuf>;

    fn is_supported(&self) -> bool;
}

/// Outcome of [`link_installed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Created(PathBuf),
    Replaced(PathBuf),
    Unchanged(PathBuf),
}

impl LinkOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Replaced(p) | Self::Unchanged(p) => p,
        }
    }
}

/// Link `<installed_root>/<type_path>` to `<active_dir>/<type_path>`.
///
/// An existing link is retargeted; an existing regular file or directory at
/// the link location is left alone and reported as a conflict.
pub fn link_installed(
    platform: &dyn LinkPlatform,
    type_path: &str,
    installed_root: &Path,
    active_dir: &Path,
) -> Result<LinkOutcome, InstallError> {
    if !platform.is_supported() {
        return Err(InstallError::LinksUnsupported);
    }

    let parsed = TypePath::parse(type_path).map_err(|_| InstallError::NotInstalled {
        type_path: type_path.to_owned(),
    })?;
    let target = parsed.under(installed_root);
    if !target.is_dir() {
        return Err(InstallError::NotInstalled {
            type_path: type_path.to_owned(),
        });
    }

    let link = parsed.under(active_dir);
    let mut replaced = false;
    match platform.read_link_target(&link) {
        Ok(current) if current == target => {
            debug!(type_path = %parsed, link = %link.display(), "Link already current");
            return Ok(LinkOutcome::Unchanged(link));
        }
        Ok(_) => {
            std::fs::remove_file(&link).map_err(|e| InstallError::io("remove stale link", &link, e))?;
            replaced = true;
        }
        Err(_) if link.symlink_metadata().is_ok() => {
            return Err(InstallError::LinkConflict { path: link });
        }
        Err(_) => {}
    }

    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallError::io("create directory", parent, e))?;
    }
    platform
        .create_link(&target, &link)
        .map_err(|e| InstallError::io("create link", &link, e))?;

    info!(type_path = %parsed, link = %link.display(), "Linked type");
    Ok(if replaced {
        LinkOutcome::Replaced(link)
    } else {
        LinkOutcome::Created(link)
    })
}
