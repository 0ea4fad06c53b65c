//! Datashelf configuration
//!
//! All behaviour switches live in an explicit [`ShelfConfig`] handed to the
//! manager at construction. There is no process-wide mutable state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shelf_fs::ShelfLayout;

use crate::{Error, Result};

/// Environment variables whose presence marks an automated test run.
/// Update checks against the remote are suppressed while any is set.
pub const TEST_MARKERS: [&str; 2] = ["DATASHELF_TEST", "NEXTEST"];

/// Name of the remote repository holding the remote ledger.
pub const REMOTE_LEDGER_REPO: &str = "remote_sources";

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// How update checks against the remote ledger are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// Dispatch a detached poll; failures are logged and swallowed
    #[default]
    Background,
    /// Block the caller; failures are returned
    Foreground,
    /// Never poll automatically
    Disabled,
}

/// URL prefixes of the remote server.
///
/// Repository URLs are built as `<base><name>.git`, so a base normally ends
/// in `:` or `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// e.g. `git@gitlab.example.org:datashelf/`
    #[serde(default)]
    pub ssh_base: Option<String>,

    /// e.g. `https://gitlab.example.org/datashelf/`
    #[serde(default)]
    pub https_base: Option<String>,
}

impl RemoteConfig {
    pub fn ssh_url(&self, repo: &str) -> Option<String> {
        self.ssh_base.as_ref().map(|base| format!("{base}{repo}.git"))
    }

    pub fn https_url(&self, repo: &str) -> Option<String> {
        self.https_base
            .as_ref()
            .map(|base| format!("{base}{repo}.git"))
    }

    /// URL of the remote ledger repository, preferring SSH.
    pub fn ledger_url(&self) -> Option<String> {
        self.ssh_url(REMOTE_LEDGER_REPO)
            .or_else(|| self.https_url(REMOTE_LEDGER_REPO))
    }

    pub fn is_configured(&self) -> bool {
        self.ssh_base.is_some() || self.https_base.is_some()
    }
}

/// Configuration of one datashelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShelfConfig {
    /// Root of the main ledger repository
    pub datashelf_path: PathBuf,

    /// Ledger file; defaults to `<datashelf_path>/sources.csv`
    #[serde(default)]
    pub sources_file: Option<PathBuf>,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Name credited in commit messages and in the remote ledger
    #[serde(default = "default_user")]
    pub user: String,

    /// Skip eager validation at start-up and log every staged file
    #[serde(default)]
    pub debug: bool,

    /// Refuse every mutating operation
    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub polling: PollMode,
}

impl ShelfConfig {
    /// Configuration with defaults for everything but the datashelf root.
    pub fn new(datashelf_path: impl Into<PathBuf>) -> Self {
        Self {
            datashelf_path: datashelf_path.into(),
            sources_file: None,
            remote: RemoteConfig::default(),
            user: default_user(),
            debug: false,
            read_only: false,
            polling: PollMode::default(),
        }
    }

    pub fn with_sources_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources_file = Some(path.into());
        self
    }

    pub fn with_remote(mut self, ssh_base: Option<String>, https_base: Option<String>) -> Self {
        self.remote = RemoteConfig {
            ssh_base,
            https_base,
        };
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_polling(mut self, polling: PollMode) -> Self {
        self.polling = polling;
        self
    }

    /// Load a configuration file.
    ///
    /// Format is detected from the file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = shelf_fs::io::read_text(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let parsed = match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            other => Err(format!("unsupported config format '{other}'")),
        };

        parsed.map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// `<config dir>/datashelf/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datashelf").join("config.toml"))
    }

    pub fn layout(&self) -> ShelfLayout {
        ShelfLayout::new(&self.datashelf_path)
    }

    /// Resolved ledger file path.
    pub fn sources_file(&self) -> PathBuf {
        match &self.sources_file {
            Some(path) => path.clone(),
            None => self.layout().sources_ledger(),
        }
    }
}

/// Whether the process runs under an automated test harness.
pub fn under_test_harness() -> bool {
    TEST_MARKERS
        .iter()
        .any(|marker| std::env::var_os(marker).is_some())
}
