//! Source commands: create, commit, remove, checkout, refresh

use std::path::PathBuf;

use colored::Colorize;
use shelf_core::{CommitReport, SourceMeta, VersionRef};

use crate::context::ShelfContext;
use crate::error::Result;

/// Create a source repository and record it in the ledger.
pub fn run_create(context: &ShelfContext, source: &str, meta: SourceMeta) -> Result<()> {
    let mut manager = context.open()?;
    let hash = manager.create_source(source, meta)?;

    println!(
        "{} Created source {} ({})",
        "+".green().bold(),
        source.cyan(),
        hash.dimmed()
    );
    manager.shutdown();
    Ok(())
}

/// Stage files of a source and run a commit cycle.
pub fn run_commit(
    context: &ShelfContext,
    source: &str,
    paths: &[PathBuf],
    message: &str,
) -> Result<()> {
    let mut manager = context.open()?;
    manager.add_files(source, paths)?;
    let report = manager.commit(message)?;

    print_commit_report(&report);
    manager.shutdown();
    Ok(())
}

/// Remove files from a source and commit the removal.
pub fn run_remove(
    context: &ShelfContext,
    source: &str,
    paths: &[PathBuf],
    message: &str,
) -> Result<()> {
    let mut manager = context.open()?;
    manager.remove_files(source, paths)?;
    let report = manager.commit(message)?;

    for path in paths {
        println!("  {} {}", "-".red(), path.display());
    }
    print_commit_report(&report);
    manager.shutdown();
    Ok(())
}

/// Check out a tag of a source, or the tip of its default branch.
///
/// The ledger is updated to the new head and committed.
pub fn run_checkout(context: &ShelfContext, source: &str, version: &str) -> Result<()> {
    let mut manager = context.open()?;
    let head = manager.checkout_version(source, &VersionRef::from(version))?;
    manager.refresh_hash_and_tag(source)?;
    manager.commit(&format!("Check out {version} of {source}"))?;

    println!(
        "{} {} is now at {} ({})",
        "=>".blue().bold(),
        source.cyan(),
        version.bold(),
        head.dimmed()
    );
    manager.shutdown();
    Ok(())
}

/// Re-read hash and tag of a source and commit the ledger.
pub fn run_refresh(context: &ShelfContext, source: &str) -> Result<()> {
    let mut manager = context.open()?;
    manager.refresh_hash_and_tag(source)?;
    manager.commit(&format!("Refresh hash and tag of {source}"))?;

    if let Some(record) = manager.sources().get(source) {
        println!(
            "{} {} {} {}",
            "=>".blue().bold(),
            source.cyan(),
            record.tag.as_deref().unwrap_or("untagged"),
            record.commit_hash.as_deref().unwrap_or("-").dimmed()
        );
    }
    manager.shutdown();
    Ok(())
}

fn print_commit_report(report: &CommitReport) {
    if report.sources.is_empty() {
        println!("{} No source changes", "=>".blue().bold());
    }
    for committed in &report.sources {
        println!(
            "{} {} {} ({})",
            "+".green().bold(),
            committed.source_id.cyan(),
            committed.tag.as_deref().unwrap_or("untagged"),
            committed.commit_hash.dimmed()
        );
    }
    println!("{}: {}", "main".dimmed(), report.main_commit.dimmed());
}
