//! `akit validate` and `akit schema`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use agentkit_core::manifest::validate_file;
use agentkit_types::manifest::Manifest;

use super::check_mark;

/// Validate every file, reporting all issues before failing.
pub fn handle_validate(files: &[PathBuf], json: bool, quiet: bool) -> Result<()> {
    let mut results = Vec::new();
    let mut failed = 0usize;

    for file in files {
        match validate_file(file) {
            Ok(result) => {
                if !result.valid {
                    failed += 1;
                }
                results.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": result.valid,
                    "issues": result.issues,
                }));
                if !json && (!quiet || !result.valid) {
                    println!("  {} {}", check_mark(result.valid), file.display());
                    for issue in &result.issues {
                        println!("      {}", style(issue).red());
                    }
                }
            }
            Err(e) => {
                failed += 1;
                results.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": false,
                    "error": e.to_string(),
                }));
                if !json {
                    println!("  {} {}", check_mark(false), style(e).red());
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failed > 0 {
        bail!("{failed} of {} manifest(s) failed validation", files.len());
    }
    Ok(())
}

pub fn handle_schema() -> Result<()> {
    let schema = schemars::schema_for!(Manifest);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
