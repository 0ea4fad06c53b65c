//! Init command implementation

use std::path::Path;

use colored::Colorize;
use shelf_git::GitFactory;

use crate::error::Result;

/// Create an empty datashelf at `path`.
pub fn run_init(path: &Path, force: bool) -> Result<()> {
    let layout = shelf_core::create_empty_datashelf(&GitFactory, path, force)?;

    println!(
        "{} Created datashelf at {}",
        "=>".blue().bold(),
        layout.root().display().to_string().cyan()
    );
    println!();
    println!("Run {} to add a source.", "datashelf create <id>".cyan());
    Ok(())
}
