//! Native symbolic links.

use std::io;
use std::path::{Path, PathBuf};

use agentkit_core::link::LinkPlatform;

/// Symlinks on unix. Other platforms report themselves unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLinks;

impl LinkPlatform for NativeLinks {
    #[cfg(unix)]
    fn create_link(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(not(unix))]
    fn create_link(&self, _target: &Path, _link: &Path) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn read_link_target(&self, link: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(link)
    }

    fn is_supported(&self) -> bool {
        cfg!(unix)
    }
}
