//! CLI command definitions for the `akit` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod install;
pub mod manifest;
pub mod types;

use std::path::PathBuf;

use agentkit_types::manifest::Category;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;

/// Install and manage agent contexts, personas, skills, workflows, prompts
/// and templates.
#[derive(Parser)]
#[command(name = "akit", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository root holding agentkit.toml and the catalog (default: current directory).
    #[arg(long, global = true, env = "AGENTKIT_REPO")]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a type and everything it references.
    #[command(alias = "i")]
    Install {
        /// Type path, e.g. prompts/code-review or skills/github/pr-list.
        type_path: String,

        /// Install only the named type, not its references.
        #[arg(long)]
        no_deps: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show what installing a type would do, without installing.
    Plan {
        /// Type path to plan.
        type_path: String,

        /// Plan only the named type, not its references.
        #[arg(long)]
        no_deps: bool,
    },

    /// Validate manifest files and report every issue.
    Validate {
        /// Manifest files (YAML or JSON).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List types available from the configured sources.
    #[command(alias = "ls")]
    List {
        /// List installed types instead.
        #[arg(long)]
        installed: bool,

        /// Only show one category (context, persona, skill, workflow, prompt, template).
        #[arg(long)]
        category: Option<Category>,
    },

    /// Show installed types with newer versions available.
    Outdated,

    /// Remove an installed type. Skill registry data is kept.
    #[command(alias = "rm")]
    Uninstall {
        /// Installed type path to remove.
        type_path: String,
    },

    /// Link an installed type into an active-set directory.
    Link {
        /// Installed type path to link.
        type_path: String,

        /// Directory receiving the link, mirroring the type path.
        dir: PathBuf,
    },

    /// Print the JSON Schema for manifests.
    Schema,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// A green check or red cross.
pub(crate) fn check_mark(ok: bool) -> String {
    if ok {
        format!("{}", style("✓").green())
    } else {
        format!("{}", style("✗").red())
    }
}
