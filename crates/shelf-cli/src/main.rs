//! Datashelf CLI
//!
//! The command-line interface over the repository consistency manager.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::ShelfContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        verbose,
        config,
        shelf,
        debug,
        command,
    } = Cli::parse();

    init_tracing(verbose);

    let Some(command) = command else {
        println!("{} Datashelf CLI", "datashelf".green().bold());
        println!();
        println!("Run {} for available commands.", "datashelf --help".cyan());
        return Ok(());
    };

    let context = ShelfContext {
        config_file: config,
        shelf,
        debug,
    };
    execute_command(&context, command)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(context: &ShelfContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path, force } => {
            let path = context.init_target(path)?;
            commands::run_init(&path, force)
        }
        Commands::Status { json } => commands::run_status(context, json),
        Commands::Create {
            source,
            collected_by,
            date,
            source_url,
            license,
        } => {
            let meta = shelf_core::SourceMeta {
                collected_by,
                date,
                source_url,
                license,
            };
            commands::run_create(context, &source, meta)
        }
        Commands::Commit {
            source,
            paths,
            message,
        } => commands::run_commit(context, &source, &paths, &message),
        Commands::Remove {
            source,
            paths,
            message,
        } => commands::run_remove(context, &source, &paths, &message),
        Commands::Checkout { source, version } => {
            commands::run_checkout(context, &source, &version)
        }
        Commands::Refresh { source } => commands::run_refresh(context, &source),
        Commands::Updates { fetch, json } => commands::run_updates(context, fetch, json),
        Commands::Clone { source } => commands::run_clone(context, &source),
        Commands::Push { source, force } => commands::run_push(context, &source, force),
        Commands::Pull { source } => commands::run_pull(context, &source),
        Commands::Publish { source } => commands::run_publish(context, &source),
        Commands::CheckRemote { json } => commands::run_check_remote(context, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commit_collects_paths() {
        let cli = Cli::parse_from([
            "datashelf", "commit", "demo", "tables/a.csv", "docs/b.md", "-m", "add tables",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Commit {
                source: "demo".into(),
                paths: vec!["tables/a.csv".into(), "docs/b.md".into()],
                message: "add tables".into(),
            })
        );
    }

    #[test]
    fn test_checkout_defaults_to_latest() {
        let cli = Cli::parse_from(["datashelf", "checkout", "demo"]);
        assert_eq!(
            cli.command,
            Some(Commands::Checkout {
                source: "demo".into(),
                version: "latest".into(),
            })
        );
    }
}
