//! Project configuration loader.
//!
//! Reads `agentkit.toml` from the repository root and deserializes it into
//! [`ProjectConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::{Path, PathBuf};

use agentkit_types::config::ProjectConfig;

use crate::paths::resolve_in_repo;

pub const PROJECT_CONFIG_FILE: &str = "agentkit.toml";

/// Load `{repo_root}/agentkit.toml`.
///
/// - Missing file: [`ProjectConfig::default()`].
/// - Unreadable or unparsable file: a warning, then the default.
pub async fn load_project_config(repo_root: &Path) -> ProjectConfig {
    let config_path = repo_root.join(PROJECT_CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {PROJECT_CONFIG_FILE} at {}, using defaults", config_path.display());
            return ProjectConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ProjectConfig::default();
        }
    };

    match toml::from_str::<ProjectConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            ProjectConfig::default()
        }
    }
}

/// The installed root for a project, absolute when `repo_root` is.
pub fn resolve_installed_root(repo_root: &Path, config: &ProjectConfig) -> PathBuf {
    resolve_in_repo(repo_root, &config.installed_root)
}
