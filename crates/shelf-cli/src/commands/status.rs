//! Status command implementation

use colored::Colorize;

use crate::context::ShelfContext;
use crate::error::Result;

const SHORT_HASH: usize = 8;

/// Run the status command
pub fn run_status(context: &ShelfContext, json: bool) -> Result<()> {
    let manager = context.open()?;

    if json {
        println!("{}", serde_json::to_string_pretty(manager.sources().records())?);
        manager.shutdown();
        return Ok(());
    }

    println!("{}", "Datashelf Status".bold());
    println!();
    println!("{}:   {}", "Path".dimmed(), manager.layout().root().display());
    println!("{}:   {}", "User".dimmed(), manager.config().user);
    if manager.config().read_only {
        println!("{}:   {}", "Mode".dimmed(), "read-only".yellow());
    }
    println!();

    println!("{}:", "Sources".bold());
    if manager.sources().is_empty() {
        println!(
            "  {} (use {} to add)",
            "None".dimmed(),
            "datashelf create".cyan()
        );
    } else {
        for record in manager.sources().records() {
            let tag = record.tag.as_deref().unwrap_or("untagged");
            let hash = record
                .commit_hash
                .as_deref()
                .map(|h| &h[..h.len().min(SHORT_HASH)])
                .unwrap_or("-");
            println!(
                "  {} {} {} {}",
                "+".green(),
                record.source_id.cyan(),
                tag,
                hash.dimmed()
            );
        }
    }

    manager.shutdown();
    Ok(())
}
