//! agentkit CLI entry point.
//!
//! Binary name: `akit`
//!
//! Parses CLI arguments, loads the project context, then dispatches to the
//! appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use agentkit_observe::tracing_setup::{init_tracing, otel_requested, shutdown_tracing};
use cli::{Cli, Commands};
use state::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,agentkit=debug",
        _ => "trace",
    };
    if let Err(e) = init_tracing(filter, otel_requested()) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that don't need a project context
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "akit", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Schema => return cli::manifest::handle_schema(),
        Commands::Validate { files } => return cli::manifest::handle_validate(files, cli.json, cli.quiet),
        _ => {}
    }

    let ctx = AppContext::init(cli.repo.as_deref()).await?;

    match cli.command {
        Commands::Install {
            type_path,
            no_deps,
            yes,
        } => {
            cli::install::handle_install(&ctx, &type_path, no_deps, yes, cli.json, cli.quiet)?;
        }
        Commands::Plan { type_path, no_deps } => {
            cli::install::handle_plan(&ctx, &type_path, no_deps, cli.json)?;
        }
        Commands::List { installed, category } => {
            cli::types::handle_list(&ctx, installed, category, cli.json)?;
        }
        Commands::Outdated => {
            cli::types::handle_outdated(&ctx, cli.json)?;
        }
        Commands::Uninstall { type_path } => {
            cli::types::handle_uninstall(&ctx, &type_path, cli.json)?;
        }
        Commands::Link { type_path, dir } => {
            cli::types::handle_link(&ctx, &type_path, &dir, cli.json)?;
        }
        Commands::Completions { .. } | Commands::Schema | Commands::Validate { .. } => {
            unreachable!("handled above")
        }
    }

    Ok(())
}
