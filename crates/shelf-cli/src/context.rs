//! Datashelf context resolution
//!
//! Resolves which configuration and datashelf root a command acts on:
//! - `--config` (or `DATASHELF_CONFIG`) names a configuration file
//! - otherwise the per-user default configuration is used if it exists
//! - otherwise defaults apply, rooted at the current directory
//!
//! `--shelf` and `--debug` are applied on top of whichever was loaded.

use std::path::PathBuf;

use shelf_core::{RepositoryConsistencyManager, ShelfConfig};

use crate::error::{CliError, Result};

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct ShelfContext {
    pub config_file: Option<PathBuf>,
    pub shelf: Option<PathBuf>,
    pub debug: bool,
}

impl ShelfContext {
    /// Build the effective configuration.
    pub fn config(&self) -> Result<ShelfConfig> {
        let mut config = match &self.config_file {
            Some(path) => ShelfConfig::load(path)?,
            None => match ShelfConfig::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Using default configuration");
                    ShelfConfig::load(&path)?
                }
                None => ShelfConfig::new(std::env::current_dir()?),
            },
        };

        if let Some(shelf) = &self.shelf {
            config.datashelf_path = shelf.clone();
        }
        if self.debug {
            config.debug = true;
        }
        Ok(config)
    }

    /// Open the manager for the effective configuration.
    pub fn open(&self) -> Result<RepositoryConsistencyManager> {
        let config = self.config()?;
        if !config.sources_file().is_file() {
            return Err(CliError::user(format!(
                "No datashelf at {} (run `datashelf init` first)",
                config.datashelf_path.display()
            )));
        }
        Ok(RepositoryConsistencyManager::initialize(config)?)
    }

    /// Where `datashelf init` should create the datashelf.
    pub fn init_target(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit.or_else(|| self.shelf.clone()) {
            return Ok(path);
        }
        Ok(self.config()?.datashelf_path)
    }
}
