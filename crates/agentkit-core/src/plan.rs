//! Install planning: flatten a dependency tree into an ordered install list.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use agentkit_types::error::ResolveError;
use agentkit_types::resolve::{CliDependency, DependencyNode, InstallPlan, ResolvedType, Source};
use tracing::{debug, info};

use crate::graph::build_tree;
use crate::probe::CliProbe;

/// Flatten a tree into install order.
///
/// Post-order (every child before its parent), skipping nodes marked
/// installed, keeping only the first occurrence of each type path. A type
/// shared by several parents lands at its first encounter, which is still
/// ahead of every parent that needs it.
pub fn flatten(tree: &DependencyNode) -> Vec<ResolvedType> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    tree.walk_post_order(&mut |node| {
        if node.resolved.installed {
            return;
        }
        if seen.insert(node.resolved.type_path.as_str()) {
            ordered.push(node.resolved.clone());
        }
    });

    ordered
}

/// Resolve `type_path` into a full install plan.
pub fn build_install_plan(
    type_path: &str,
    sources: &[Source],
    installed_root: &Path,
    no_deps: bool,
    probe: &dyn CliProbe,
) -> Result<InstallPlan, ResolveError> {
    let tree = build_tree(type_path, sources, installed_root, no_deps)?;
    let plan = plan_from_tree(&tree, probe);
    info!(
        type_path = %type_path,
        to_install = plan.all_types.len(),
        skipped = plan.skip_count,
        missing_cli = plan.missing_cli_deps().count(),
        "Built install plan"
    );
    Ok(plan)
}

/// Derive the plan metadata from an already-built tree.
///
/// Each declared CLI dependency is probed once, however many skills name it.
pub fn plan_from_tree(tree: &DependencyNode, probe: &dyn CliProbe) -> InstallPlan {
    let all_types = flatten(tree);

    let mut counts = BTreeMap::new();
    for resolved in &all_types {
        *counts.entry(resolved.category).or_insert(0) += 1;
    }

    let mut installed = HashSet::new();
    let mut cli_names: Vec<&str> = Vec::new();
    let mut seen_cli = HashSet::new();
    tree.walk_post_order(&mut |node| {
        if node.resolved.installed {
            installed.insert(node.resolved.type_path.as_str());
        }
        if let Some(skill) = node.manifest.as_skill() {
            for name in &skill.cli_dependencies {
                if seen_cli.insert(name.as_str()) {
                    cli_names.push(name.as_str());
                }
            }
        }
    });

    let cli_deps = cli_names
        .into_iter()
        .map(|name| {
            let available = probe.is_available(name);
            debug!(command = %name, available, "Probed CLI dependency");
            CliDependency {
                name: name.to_owned(),
                available,
            }
        })
        .collect();

    InstallPlan {
        root: tree.resolved.clone(),
        all_types,
        counts,
        skip_count: installed.len(),
        cli_deps,
    }
}
