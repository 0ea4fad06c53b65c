//! Remote commands: updates, clone, push, pull, publish

use colored::Colorize;
use shelf_core::{Inventory, PushOutcome};

use crate::context::ShelfContext;
use crate::error::{CliError, Result};

/// Show sources that are new or newer on the remote.
pub fn run_updates(context: &ShelfContext, fetch: bool, json: bool) -> Result<()> {
    let mut manager = context.open()?;
    if fetch {
        manager.refresh_remote()?;
    }
    let updates = manager.available_remote_updates();

    if json {
        println!("{}", serde_json::to_string_pretty(&updates)?);
        manager.shutdown();
        return Ok(());
    }

    if updates.is_empty() {
        println!("{} Datashelf is up to date with the remote", "=>".blue().bold());
        manager.shutdown();
        return Ok(());
    }

    if !updates.new_sources.is_empty() {
        println!("{}:", "New sources".bold());
        for source in &updates.new_sources {
            println!(
                "  {} {} {} {}",
                "+".green(),
                source.source_id.cyan(),
                source.tag.as_deref().unwrap_or("untagged"),
                source.user.as_deref().unwrap_or("").dimmed()
            );
        }
    }
    if !updates.updated_sources.is_empty() {
        println!("{}:", "Updated sources".bold());
        for source in &updates.updated_sources {
            println!(
                "  {} {} {} -> {} {}",
                "~".yellow(),
                source.source_id.cyan(),
                source.local_tag,
                source.remote_tag.bold(),
                source.user.as_deref().unwrap_or("").dimmed()
            );
        }
    }

    manager.shutdown();
    Ok(())
}

/// Import a source from the remote and commit the ledger.
pub fn run_clone(context: &ShelfContext, source: &str) -> Result<()> {
    let mut manager = context.open()?;
    manager.clone_from_remote(source)?;
    manager.commit(&format!("added source: {source}"))?;

    let tag = manager
        .sources()
        .get(source)
        .and_then(|r| r.tag.clone())
        .unwrap_or_else(|| "untagged".to_string());
    println!("{} Cloned {} at {}", "+".green().bold(), source.cyan(), tag);
    manager.shutdown();
    Ok(())
}

/// Publish a source and its tags.
pub fn run_push(context: &ShelfContext, source: &str, force: bool) -> Result<()> {
    let mut manager = context.open()?;
    match manager.push_to_remote(source, force)? {
        PushOutcome::UpToDate => {
            println!("{} {} is up to date", "=>".blue().bold(), source.cyan());
        }
        PushOutcome::Pushed { tag } => {
            println!("{} Pushed {} as {}", "+".green().bold(), source.cyan(), tag.bold());
        }
    }
    manager.shutdown();
    Ok(())
}

/// Update a source and merge its rows into the datashelf inventory.
pub fn run_pull(context: &ShelfContext, source: &str) -> Result<()> {
    let mut manager = context.open()?;
    let inventory_path = manager.layout().inventory();
    let inventory = Inventory::load(&inventory_path)?;

    let merged = manager.pull_from_remote(source, &inventory)?;
    merged.save(&inventory_path)?;
    manager.add_files(shelf_fs::MAIN_REPO_ID, &[inventory_path])?;
    manager.commit(&format!("pulled source: {source}"))?;

    println!(
        "{} Pulled {} ({} inventory rows)",
        "+".green().bold(),
        source.cyan(),
        merged.rows_of(source).count()
    );
    manager.shutdown();
    Ok(())
}

/// Create the remote of a source and publish its branch.
pub fn run_publish(context: &ShelfContext, source: &str) -> Result<()> {
    let mut manager = context.open()?;
    manager.publish_source(source)?;

    println!("{} Published {}", "+".green().bold(), source.cyan());
    manager.shutdown();
    Ok(())
}

/// Report whether the remote ledger repository answers on each transport.
///
/// Fails when no configured transport could connect.
pub fn run_check_remote(context: &ShelfContext, json: bool) -> Result<()> {
    let manager = context.open()?;
    let results = manager.check_remote_connection()?;
    manager.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            match (&result.refs, &result.error) {
                (Some(refs), _) => println!(
                    "  {} {} {} ({refs} refs)",
                    "ok".green().bold(),
                    result.transport.cyan(),
                    result.url
                ),
                (None, error) => println!(
                    "  {} {} {} {}",
                    "failed".red().bold(),
                    result.transport.cyan(),
                    result.url,
                    error.as_deref().unwrap_or_default().dimmed()
                ),
            }
        }
    }

    if results.iter().any(|r| r.is_reachable()) {
        Ok(())
    } else {
        Err(CliError::user(
            "The remote is unreachable; check your connection, SSH agent and credentials",
        ))
    }
}
