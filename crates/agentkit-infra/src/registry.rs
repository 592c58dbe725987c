//! Skill registry initialization.
//!
//! Every installed skill gets a long-lived directory under the user-data root:
//! ```text
//! {userdata_root}/skills/{topic}/[{vendor}/]{name}/
//!   tokens.env     secrets, owner-only permissions
//!   config.yaml    defaults from the manifest's registry block
//!   state/         skill-private files
//!   output/        latest.json plus timestamped history
//!   templates/     outputs graduated to reusable templates
//! ```
//! Files here belong to the user once written. Initialization only ever adds
//! what is missing, and uninstalling a skill leaves the directory alone.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use agentkit_core::manifest::load_manifest;
use agentkit_types::error::InstallError;
use agentkit_types::manifest::{Manifest, SkillManifest, TokenSpec};
use agentkit_types::resolve::ResolvedType;
use serde_yaml_ng::Mapping;
use tracing::{debug, info, warn};

pub const TOKENS_FILE: &str = "tokens.env";
pub const CONFIG_FILE: &str = "config.yaml";
pub const REGISTRY_SUBDIRS: &[&str] = &["state", "output", "templates"];

/// Registry directory for a skill.
pub fn registry_dir(userdata_root: &Path, skill: &SkillManifest) -> PathBuf {
    let mut dir = userdata_root.join("skills").join(&skill.topic);
    if let Some(vendor) = &skill.vendor {
        dir = dir.join(vendor);
    }
    dir.join(&skill.base.name)
}

/// Ensure the registry for a resolved skill exists.
///
/// Returns one warning per required token that still has no value. Non-skill
/// types have no registry and yield no warnings.
pub fn init_skill_registry(resolved: &ResolvedType, userdata_root: &Path) -> Result<Vec<String>, InstallError> {
    let manifest = load_manifest(&resolved.manifest_path)?;
    let Manifest::Skill(skill) = manifest else {
        debug!(type_path = %resolved.type_path, "Not a skill, no registry");
        return Ok(Vec::new());
    };

    let dir = registry_dir(userdata_root, &skill);
    for sub in REGISTRY_SUBDIRS {
        let path = dir.join(sub);
        std::fs::create_dir_all(&path).map_err(|e| InstallError::io("create directory", &path, e))?;
    }

    let registry = skill.registry.clone().unwrap_or_default();
    let mut warnings = Vec::new();

    if !registry.tokens.is_empty() {
        let tokens_path = dir.join(TOKENS_FILE);
        let values = if tokens_path.exists() {
            debug!(path = %tokens_path.display(), "Keeping existing tokens file");
            read_env_file(&tokens_path)
        } else {
            write_tokens_file(&tokens_path, &resolved.type_path, &registry.tokens)?;
            info!(path = %tokens_path.display(), "Created tokens file");
            registry
                .tokens
                .iter()
                .map(|t| (t.name.clone(), t.default.clone().unwrap_or_default()))
                .collect()
        };

        for token in registry.tokens.iter().filter(|t| t.required) {
            let missing = values.get(&token.name).is_none_or(|v| v.trim().is_empty());
            if missing {
                warn!(type_path = %resolved.type_path, token = %token.name, "Required token has no value");
                warnings.push(format!(
                    "{}: required token {} is not set in {}",
                    resolved.type_path,
                    token.name,
                    tokens_path.display()
                ));
            }
        }
    }

    if let Some(config) = &registry.config {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            debug!(path = %config_path.display(), "Keeping existing config file");
        } else {
            write_config_file(&config_path, &resolved.type_path, config)?;
            info!(path = %config_path.display(), "Created config file");
        }
    }

    if !registry.state.is_empty() {
        debug!(type_path = %resolved.type_path, files = ?registry.state, "Skill expects state files");
    }

    info!(type_path = %resolved.type_path, path = %dir.display(), "Skill registry ready");
    Ok(warnings)
}

fn write_tokens_file(path: &Path, type_path: &str, tokens: &[TokenSpec]) -> Result<(), InstallError> {
    let mut content = format!(
        "# Tokens for {type_path}\n# Generated by agentkit on {}. Edits are preserved.\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    for token in tokens {
        content.push('\n');
        if let Some(description) = &token.description {
            content.push_str(&format!("# {description}\n"));
        }
        let marker = if token.required { "required" } else { "optional" };
        content.push_str(&format!("# ({marker})\n"));
        content.push_str(&format!(
            "{}={}\n",
            token.name,
            token.default.as_deref().unwrap_or_default()
        ));
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| InstallError::io("create", path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| InstallError::io("write", path, e))
}

fn write_config_file(path: &Path, type_path: &str, config: &Mapping) -> Result<(), InstallError> {
    let body = serde_yaml_ng::to_string(config).map_err(|e| InstallError::Serialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let content = format!("# Default configuration for {type_path}\n{body}");
    std::fs::write(path, content).map_err(|e| InstallError::io("write", path, e))
}

/// Parse `KEY=VALUE` lines, ignoring comments and blank lines.
///
/// The file belongs to the user: an unreadable file yields no values, so every
/// required token is reported as unset.
fn read_env_file(path: &Path) -> HashMap<String, String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read tokens file");
            return HashMap::new();
        }
    };
    String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_core::source::resolve_type;
    use agentkit_types::resolve::Source;

    const SKILL_WITH_REGISTRY: &str = r#"type: skill
name: fetcher
version: "1.0.0"
description: Fetches things
runtime: go
topic: web
vendor: acme
registry:
  tokens:
    - name: API_KEY
      description: Key for the acme API
      required: true
    - name: REGION
      required: true
      default: eu-west-1
    - name: DEBUG
      description: Verbose logging
  config:
    retries: 3
    endpoint: https://api.acme.test
  state: [cursor.json]
"#;

    fn resolved_skill(root: &Path, manifest: &str) -> ResolvedType {
        let dir = root.join("skills").join("web").join("fetcher");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("skill.yaml"), manifest).unwrap();
        resolve_type("skills/web/fetcher", &[Source::new("catalog", root)])
            .unwrap()
            .unwrap()
    }

    #[test]
    fn required_token_without_default_is_blank_and_warned() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");

        let warnings = init_skill_registry(&resolved, &userdata).unwrap();

        let dir = userdata.join("skills").join("web").join("acme").join("fetcher");
        let tokens = std::fs::read_to_string(dir.join(TOKENS_FILE)).unwrap();
        assert!(tokens.lines().any(|l| l == "API_KEY="));
        assert!(tokens.lines().any(|l| l == "REGION=eu-west-1"));
        assert!(tokens.contains("# Key for the acme API\n# (required)\nAPI_KEY="));
        assert!(tokens.contains("# (optional)\nDEBUG="));

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("API_KEY"));

        for sub in REGISTRY_SUBDIRS {
            assert!(dir.join(sub).is_dir(), "{sub} missing");
        }
        let config = std::fs::read_to_string(dir.join(CONFIG_FILE)).unwrap();
        assert!(config.starts_with("# Default configuration for skills/web/fetcher\n"));
        let parsed: Mapping = serde_yaml_ng::from_str(&config).unwrap();
        assert_eq!(parsed.get("retries").and_then(|v| v.as_u64()), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn tokens_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");
        init_skill_registry(&resolved, &userdata).unwrap();

        let path = userdata
            .join("skills")
            .join("web")
            .join("acme")
            .join("fetcher")
            .join(TOKENS_FILE);
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn init_is_idempotent_and_preserves_user_edits() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");
        init_skill_registry(&resolved, &userdata).unwrap();

        let dir = userdata.join("skills").join("web").join("acme").join("fetcher");
        let edited_tokens = "API_KEY=secret\nREGION=us-east-1\n";
        let edited_config = "retries: 10\n";
        std::fs::write(dir.join(TOKENS_FILE), edited_tokens).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), edited_config).unwrap();

        let warnings = init_skill_registry(&resolved, &userdata).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(std::fs::read_to_string(dir.join(TOKENS_FILE)).unwrap(), edited_tokens);
        assert_eq!(std::fs::read_to_string(dir.join(CONFIG_FILE)).unwrap(), edited_config);
    }

    #[test]
    fn non_utf8_tokens_file_is_kept_and_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");
        init_skill_registry(&resolved, &userdata).unwrap();

        let tokens_path = userdata
            .join("skills")
            .join("web")
            .join("acme")
            .join("fetcher")
            .join(TOKENS_FILE);
        let edited: &[u8] = b"API_KEY=caf\xe9\nREGION=\n";
        std::fs::write(&tokens_path, edited).unwrap();

        let warnings = init_skill_registry(&resolved, &userdata).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("REGION"));
        assert_eq!(std::fs::read(&tokens_path).unwrap(), edited);
    }

    #[test]
    fn unreadable_tokens_file_warns_for_every_required_token() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");
        let dir = userdata.join("skills").join("web").join("acme").join("fetcher");
        // A directory in place of the file cannot be read as one.
        std::fs::create_dir_all(dir.join(TOKENS_FILE)).unwrap();

        let warnings = init_skill_registry(&resolved, &userdata).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(dir.join(TOKENS_FILE).is_dir());
    }

    #[test]
    fn unedited_file_keeps_warning_on_repeat() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(&tmp.path().join("catalog"), SKILL_WITH_REGISTRY);
        let userdata = tmp.path().join("userdata");

        let first = init_skill_registry(&resolved, &userdata).unwrap();
        let second = init_skill_registry(&resolved, &userdata).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn skill_without_registry_block_gets_directories_only() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolved_skill(
            &tmp.path().join("catalog"),
            "type: skill\nname: fetcher\nversion: \"1.0.0\"\ndescription: d\nruntime: node\ntopic: web\n",
        );
        let userdata = tmp.path().join("userdata");

        let warnings = init_skill_registry(&resolved, &userdata).unwrap();
        assert!(warnings.is_empty());

        let dir = userdata.join("skills").join("web").join("fetcher");
        assert!(dir.join("state").is_dir());
        assert!(!dir.join(TOKENS_FILE).exists());
        assert!(!dir.join(CONFIG_FILE).exists());
    }

    #[test]
    fn non_skill_types_are_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = tmp.path().join("catalog");
        let dir = catalog.join("contexts").join("notes");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("context.yaml"),
            "type: context\nname: notes\nversion: \"1.0.0\"\ndescription: d\nformat: markdown\nsources: [notes.md]\n",
        )
        .unwrap();
        let resolved = resolve_type("contexts/notes", &[Source::new("catalog", &catalog)])
            .unwrap()
            .unwrap();

        let userdata = tmp.path().join("userdata");
        assert!(init_skill_registry(&resolved, &userdata).unwrap().is_empty());
        assert!(!userdata.exists());
    }
}
