//! Well-known locations.

use std::path::{Path, PathBuf};

/// Environment variable overriding the user-data root.
pub const DATA_DIR_ENV: &str = "AGENTKIT_DATA_DIR";

/// Resolve the user-data root holding skill registries.
///
/// Priority:
/// 1. `AGENTKIT_DATA_DIR`
/// 2. `~/.agentkit`
/// 3. `.agentkit` in the current directory
pub fn resolve_userdata_root() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".agentkit");
    }

    PathBuf::from(".agentkit")
}

/// Resolve a configured path against the repository root.
pub fn resolve_in_repo(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userdata_root_from_env() {
        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-agentkit");
        }
        let dir = resolve_userdata_root();
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
        assert_eq!(dir, PathBuf::from("/tmp/test-agentkit"));
    }

    #[test]
    fn relative_paths_join_repo_root() {
        let repo = Path::new("/work/repo");
        assert_eq!(
            resolve_in_repo(repo, Path::new(".agentkit/installed")),
            PathBuf::from("/work/repo/.agentkit/installed")
        );
        assert_eq!(
            resolve_in_repo(repo, Path::new("/opt/installed")),
            PathBuf::from("/opt/installed")
        );
    }
}
