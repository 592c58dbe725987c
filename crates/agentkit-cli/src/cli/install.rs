//! `akit plan` and `akit install`.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use agentkit_core::plan::build_install_plan;
use agentkit_infra::installer::install_plan;
use agentkit_infra::probe::PathProbe;
use agentkit_types::resolve::InstallPlan;

use super::check_mark;
use crate::state::AppContext;

pub fn handle_plan(ctx: &AppContext, type_path: &str, no_deps: bool, json: bool) -> Result<()> {
    let plan = build_install_plan(type_path, &ctx.sources, &ctx.installed_root, no_deps, &PathProbe)
        .with_context(|| format!("Failed to plan '{type_path}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub fn handle_install(
    ctx: &AppContext,
    type_path: &str,
    no_deps: bool,
    yes: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let plan = build_install_plan(type_path, &ctx.sources, &ctx.installed_root, no_deps, &PathProbe)
        .with_context(|| format!("Failed to plan '{type_path}'"))?;

    let styled = !json && !quiet;
    if styled {
        print_plan(&plan);
    }

    if !yes && !json {
        let proceed = Confirm::new()
            .with_prompt(format!("  Install {} type(s)?", plan.all_types.len()))
            .default(true)
            .interact()?;
        if !proceed {
            println!("  Installation cancelled.");
            return Ok(());
        }
    }

    let report = install_plan(&plan, &ctx.installed_root, &ctx.userdata_root)
        .with_context(|| format!("Failed to install '{type_path}'"))?;

    if json {
        let out = serde_json::json!({
            "installed": plan.all_types,
            "paths": report.installed,
            "skipped": plan.skip_count,
            "warnings": report.warnings,
            "missing_cli": plan.missing_cli_deps().map(|d| &d.name).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for warning in &report.warnings {
        eprintln!("  {} {}", style("!").yellow(), warning);
    }
    if !quiet {
        println!(
            "  {} Installed {} type(s) to {}",
            style("*").green().bold(),
            report.installed.len(),
            ctx.installed_root.display()
        );
        let missing: Vec<_> = plan.missing_cli_deps().map(|d| d.name.as_str()).collect();
        if !missing.is_empty() {
            println!(
                "  {} Missing CLI tools (install before running skills): {}",
                style("!").yellow(),
                style(missing.join(", ")).yellow()
            );
        }
        println!();
    }
    Ok(())
}

fn print_plan(plan: &InstallPlan) {
    println!();
    println!(
        "  {} Plan for '{}'",
        style("*").cyan(),
        style(&plan.root.type_path).cyan()
    );
    println!();

    if plan.is_empty() {
        println!("  Nothing to install.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("#"),
                Cell::new("Type").fg(Color::Cyan),
                Cell::new("Version"),
                Cell::new("Source"),
            ]);
        for (i, resolved) in plan.all_types.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&resolved.type_path),
                Cell::new(&resolved.version),
                Cell::new(&resolved.source_name),
            ]);
        }
        println!("{table}");
    }

    let counts: Vec<String> = plan
        .counts
        .iter()
        .map(|(category, n)| format!("{n} {}", category.plural()))
        .collect();
    if !counts.is_empty() {
        println!("  {}", style(counts.join(", ")).dim());
    }
    if plan.skip_count > 0 {
        println!(
            "  {}",
            style(format!("{} already installed, skipped", plan.skip_count)).dim()
        );
    }

    if !plan.cli_deps.is_empty() {
        println!();
        println!("  CLI dependencies:");
        for dep in &plan.cli_deps {
            println!("    {} {}", check_mark(dep.available), dep.name);
        }
    }
    println!();
}
