//! Project configuration types.
//!
//! `ProjectConfig` mirrors `agentkit.toml` at the repository root. Every field
//! has a default so a missing or partial file still yields a usable config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolution-order token for the current working directory.
pub const SOURCE_LOCAL: &str = "local";
/// Resolution-order token for `<repo>/catalog`.
pub const SOURCE_CATALOG: &str = "catalog";
/// Resolution-order token expanded into one source per declared extension.
pub const SOURCE_EXTENSIONS: &str = "extensions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Source tokens in priority order.
    #[serde(default = "default_resolution_order")]
    pub resolution_order: Vec<String>,

    /// Destination for installed types, relative to the repository root
    /// unless absolute.
    #[serde(default = "default_installed_root")]
    pub installed_root: PathBuf,

    /// Extensions in declaration order. Declaration order is override order.
    #[serde(default)]
    pub extensions: Vec<ExtensionDecl>,
}

fn default_resolution_order() -> Vec<String> {
    vec![
        SOURCE_LOCAL.to_owned(),
        SOURCE_EXTENSIONS.to_owned(),
        SOURCE_CATALOG.to_owned(),
    ]
}

fn default_installed_root() -> PathBuf {
    PathBuf::from(".agentkit").join("installed")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            resolution_order: default_resolution_order(),
            installed_root: default_installed_root(),
            extensions: Vec::new(),
        }
    }
}

/// One extension source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDecl {
    pub name: String,
    /// Root of the extension, relative to the repository root. Defaults to
    /// `extensions/<name>`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
