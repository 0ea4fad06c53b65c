//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Datashelf - keep source repositories and their ledgers consistent
#[derive(Parser, Debug)]
#[command(name = "datashelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (.toml, .json or .yaml)
    #[arg(short, long, global = true, env = "DATASHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Datashelf root, overriding the configured one
    #[arg(short = 'C', long, global = true, env = "DATASHELF_PATH")]
    pub shelf: Option<PathBuf>,

    /// Defer validation of sources until they are used
    #[arg(long, global = true)]
    pub debug: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create an empty datashelf
    ///
    /// Examples:
    ///   datashelf init ./shelf          # Scaffold and commit a new datashelf
    ///   datashelf init ./shelf --force  # Replace an existing one
    Init {
        /// Where to create the datashelf (defaults to --shelf or ".")
        path: Option<PathBuf>,

        /// Remove an existing datashelf at the path first
        #[arg(long)]
        force: bool,
    },

    /// List the sources recorded in the ledger
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Create a new source repository
    Create {
        /// Source id, used as directory and repository name
        source: String,

        /// Who collected the data
        #[arg(long)]
        collected_by: Option<String>,

        /// Collection date
        #[arg(long)]
        date: Option<String>,

        /// Where the data came from
        #[arg(long)]
        source_url: Option<String>,

        /// Licence of the data
        #[arg(long)]
        license: Option<String>,
    },

    /// Stage files of a source and commit them
    ///
    /// Paths are relative to the source directory or absolute.
    Commit {
        /// Source id, or "main" for the ledger repository
        source: String,

        /// Files to stage
        paths: Vec<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Remove files from a source and commit the removal
    Remove {
        /// Source id
        source: String,

        /// Files to remove
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Check out a version of a source
    Checkout {
        /// Source id
        source: String,

        /// Version tag such as v2.0, or "latest"
        #[arg(default_value = "latest")]
        version: String,
    },

    /// Re-read hash and tag of a source from its repository
    Refresh {
        /// Source id
        source: String,
    },

    /// Show sources that are new or newer on the remote
    Updates {
        /// Pull the remote ledger first
        #[arg(long)]
        fetch: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Import a source from the remote
    Clone {
        /// Source id
        source: String,
    },

    /// Push a source and its tags to the remote
    Push {
        /// Source id
        source: String,

        /// Push even if the remote ledger already records the local head
        #[arg(long)]
        force: bool,
    },

    /// Update a source from the remote and merge its inventory
    Pull {
        /// Source id
        source: String,
    },

    /// Create the remote of a source and publish its branch
    Publish {
        /// Source id
        source: String,
    },

    /// Check that the remote server answers over SSH and HTTPS
    CheckRemote {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
