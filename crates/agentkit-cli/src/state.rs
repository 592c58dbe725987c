//! Per-invocation context shared by every command.
//!
//! Resolves the repository root, project configuration, source list and the
//! two filesystem roots once, so command handlers receive explicit paths.

use std::path::{Path, PathBuf};

use agentkit_core::source::build_sources;
use agentkit_infra::config::{load_project_config, resolve_installed_root};
use agentkit_infra::paths::resolve_userdata_root;
use agentkit_types::resolve::Source;
use anyhow::{Context, Result};

pub struct AppContext {
    pub repo_root: PathBuf,
    pub sources: Vec<Source>,
    pub installed_root: PathBuf,
    pub userdata_root: PathBuf,
}

impl AppContext {
    /// Load configuration for `repo` (default: the current directory).
    pub async fn init(repo: Option<&Path>) -> Result<Self> {
        let repo_root = match repo {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };

        let config = load_project_config(&repo_root).await;
        let sources = build_sources(&config.resolution_order, &config.extensions, &repo_root)?;
        let installed_root = resolve_installed_root(&repo_root, &config);
        let userdata_root = resolve_userdata_root();

        tracing::debug!(
            repo = %repo_root.display(),
            installed_root = %installed_root.display(),
            userdata_root = %userdata_root.display(),
            sources = sources.len(),
            "Context ready"
        );

        Ok(Self {
            repo_root,
            sources,
            installed_root,
            userdata_root,
        })
    }
}
