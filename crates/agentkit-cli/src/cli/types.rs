//! `akit list`, `akit outdated`, `akit uninstall` and `akit link`.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use agentkit_core::link::{link_installed, LinkOutcome};
use agentkit_core::source::discover_all;
use agentkit_core::update::check_updates;
use agentkit_infra::installer::{list_installed, uninstall_type};
use agentkit_infra::link::NativeLinks;
use agentkit_types::manifest::Category;
use agentkit_types::resolve::ResolvedType;

use crate::state::AppContext;

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

pub fn handle_list(ctx: &AppContext, installed: bool, category: Option<Category>, json: bool) -> Result<()> {
    let mut types = if installed {
        list_installed(&ctx.installed_root)
    } else {
        discover_all(&ctx.sources)
    };
    if let Some(category) = category {
        types.retain(|t| t.category == category);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    if types.is_empty() {
        println!();
        if installed {
            println!("  Nothing installed. Use 'akit install <type-path>' to add types.");
        } else {
            println!("  No types found in any source for {}.", ctx.repo_root.display());
            for source in &ctx.sources {
                println!("    {} {}", style(&source.name).dim(), source.base_path.display());
            }
        }
        println!();
        return Ok(());
    }

    print_types(&types, !installed);
    Ok(())
}

fn print_types(types: &[ResolvedType], show_source: bool) {
    let mut header = vec![
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Version"),
        Cell::new("Description"),
    ];
    if show_source {
        header.push(Cell::new("Source"));
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for t in types {
        let mut row = vec![
            Cell::new(&t.type_path),
            Cell::new(&t.version),
            Cell::new(&t.description),
        ];
        if show_source {
            row.push(Cell::new(&t.source_name));
        }
        table.add_row(row);
    }

    println!();
    println!("{table}");
    println!("  {} type(s)", types.len());
    println!();
}

// ---------------------------------------------------------------------------
// Outdated
// ---------------------------------------------------------------------------

pub fn handle_outdated(ctx: &AppContext, json: bool) -> Result<()> {
    let installed = list_installed(&ctx.installed_root);
    let updates = check_updates(&installed, &ctx.sources).context("Failed to check for updates")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updates)?);
        return Ok(());
    }

    println!();
    if updates.is_empty() {
        println!("  {} All {} installed type(s) are up to date.", style("*").green(), installed.len());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Installed"),
            Cell::new("Available").fg(Color::Green),
            Cell::new("Source"),
        ]);
    for u in &updates {
        table.add_row(vec![
            Cell::new(&u.type_path),
            Cell::new(&u.installed_version),
            Cell::new(&u.available_version).fg(Color::Green),
            Cell::new(&u.source_name),
        ]);
    }
    println!("{table}");
    println!(
        "  {}",
        style("Run 'akit install <type-path> --no-deps' to update a type.").dim()
    );
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Uninstall
// ---------------------------------------------------------------------------

pub fn handle_uninstall(ctx: &AppContext, type_path: &str, json: bool) -> Result<()> {
    let removed = uninstall_type(type_path, &ctx.installed_root)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"removed": type_path, "path": removed.display().to_string()})
        );
    } else {
        println!();
        println!(
            "  {} Removed '{}'",
            style("*").green().bold(),
            style(type_path).cyan()
        );
        println!();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

pub fn handle_link(ctx: &AppContext, type_path: &str, dir: &Path, json: bool) -> Result<()> {
    let outcome = link_installed(&NativeLinks, type_path, &ctx.installed_root, dir)?;

    if json {
        let status = match outcome {
            LinkOutcome::Created(_) => "created",
            LinkOutcome::Replaced(_) => "replaced",
            LinkOutcome::Unchanged(_) => "unchanged",
        };
        println!(
            "{}",
            serde_json::json!({
                "type_path": type_path,
                "link": outcome.path().display().to_string(),
                "status": status,
            })
        );
    } else {
        let verb = match outcome {
            LinkOutcome::Created(_) => "Linked",
            LinkOutcome::Replaced(_) => "Relinked",
            LinkOutcome::Unchanged(_) => "Already linked",
        };
        println!(
            "  {} {} '{}' at {}",
            style("*").green().bold(),
            verb,
            style(type_path).cyan(),
            outcome.path().display()
        );
    }
    Ok(())
}
