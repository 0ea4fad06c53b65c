//! Throttled polling of the remote ledger.
//!
//! The scheduler exclusively owns the [`RemoteIndex`] and the last access
//! marker. A background poll works on its own repository handle and hands
//! back a fresh [`RemoteIndex`] through a [`BackgroundPoll`]; the result is
//! harvested on the next read, so no state is shared with the poll thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{Local, NaiveDateTime};
use shelf_fs::{ShelfLayout, ShelfPath};
use shelf_git::RepoFactory;

use super::marker;
use super::probe::CredentialProbe;
use crate::config::{PollMode, RemoteConfig};
use crate::ledger::{RemoteIndex, RemoteRecord};
use crate::{Error, Result};

/// What [`SyncScheduler::check_for_updates`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDispatch {
    /// Polling is disabled by configuration
    Disabled,
    /// An automated test run was detected
    Suppressed,
    /// No remote URL and no local ledger clone
    NotConfigured,
    /// The ledger was already polled today
    NotDue,
    /// No credentials for an unattended poll
    NoCredentials,
    /// A background poll is still running
    AlreadyRunning,
    /// The ledger was refreshed on the calling thread
    Completed,
    /// A background poll was started
    Dispatched,
}

/// Handle to a poll running on another thread.
#[derive(Debug)]
pub struct BackgroundPoll {
    handle: JoinHandle<Result<RemoteIndex>>,
}

impl BackgroundPoll {
    fn spawn(
        factory: Arc<dyn RepoFactory>,
        layout: ShelfLayout,
        url: Option<String>,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("datashelf-poll".into())
            .spawn(move || refresh_remote_ledger(factory.as_ref(), &layout, url.as_deref()))?;
        Ok(Self { handle })
    }

    /// Whether the result is available without blocking.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the poll ends.
    pub fn wait(self) -> Result<RemoteIndex> {
        self.handle
            .join()
            .map_err(|_| Error::BackgroundPoll("poll thread panicked".into()))?
    }
}

/// Pull (or clone) the remote ledger repository and reload its ledger.
pub fn refresh_remote_ledger(
    factory: &dyn RepoFactory,
    layout: &ShelfLayout,
    url: Option<&str>,
) -> Result<RemoteIndex> {
    let dir = layout.remote_sources_dir();
    if dir.join(".git").exists() {
        factory.open(&dir)?.pull("origin")?;
        tracing::debug!(path = %dir.display(), "Pulled remote ledger");
    } else {
        let url = url.ok_or_else(|| {
            Error::RemoteNotConfigured("no URL for the remote ledger repository".into())
        })?;
        factory.clone_repo(url, &dir)?;
        tracing::debug!(url = %url, "Cloned remote ledger");
    }

    marker::write_last_access(&layout.last_access_marker(), Local::now().naive_local())?;
    RemoteIndex::load_or_empty(&layout.remote_ledger())
}

/// Decides when to poll the remote ledger and runs the poll.
pub struct SyncScheduler {
    layout: ShelfLayout,
    remote: RemoteConfig,
    factory: Arc<dyn RepoFactory>,
    probe: Box<dyn CredentialProbe>,
    remote_index: RemoteIndex,
    in_flight: Option<BackgroundPoll>,
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("root", &self.layout.root())
            .field("remote", &self.remote)
            .field("polling", &self.in_flight.is_some())
            .finish()
    }
}

impl SyncScheduler {
    /// Create a scheduler, loading the cached remote ledger if present.
    pub fn new(
        layout: ShelfLayout,
        remote: RemoteConfig,
        factory: Arc<dyn RepoFactory>,
        probe: Box<dyn CredentialProbe>,
    ) -> Result<Self> {
        let remote_index = RemoteIndex::load_or_empty(&layout.remote_ledger())?;
        Ok(Self {
            layout,
            remote,
            factory,
            probe,
            remote_index,
            in_flight: None,
        })
    }

    /// Whether a local clone of the remote ledger exists.
    pub fn has_local_ledger(&self) -> bool {
        self.layout.remote_sources_dir().exists()
    }

    /// Whether a poll is due at `now`.
    pub fn should_poll(&self, force: bool, now: NaiveDateTime) -> Result<bool> {
        let last = marker::read_last_access(&self.layout.last_access_marker())?;
        Ok(marker::should_poll(force, last, now))
    }

    /// Current remote ledger, after collecting a finished background poll.
    pub fn remote_index(&mut self) -> &RemoteIndex {
        self.harvest();
        &self.remote_index
    }

    /// Cached remote ledger without collecting background results.
    pub fn cached_index(&self) -> &RemoteIndex {
        &self.remote_index
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Refresh the remote ledger on the calling thread.
    ///
    /// Any background poll is awaited first so both never touch the ledger
    /// clone at once.
    pub fn poll_now(&mut self) -> Result<&RemoteIndex> {
        self.settle();
        let url = self.remote.ledger_url();
        self.remote_index =
            refresh_remote_ledger(self.factory.as_ref(), &self.layout, url.as_deref())?;
        Ok(&self.remote_index)
    }

    /// Poll the remote ledger if due, in the requested mode.
    ///
    /// Foreground failures are returned. Background failures are logged
    /// when the result is harvested and never reach the caller.
    pub fn check_for_updates(&mut self, force: bool, mode: PollMode) -> Result<PollDispatch> {
        self.harvest();

        if mode == PollMode::Disabled {
            return Ok(PollDispatch::Disabled);
        }
        if !self.remote.is_configured() && !self.has_local_ledger() {
            tracing::info!("Remote not configured, skipping update check");
            return Ok(PollDispatch::NotConfigured);
        }
        if !self.should_poll(force, Local::now().naive_local())? {
            return Ok(PollDispatch::NotDue);
        }

        match mode {
            PollMode::Foreground => {
                tracing::info!("Looking for new online sources");
                self.poll_now()?;
                Ok(PollDispatch::Completed)
            }
            PollMode::Background => {
                if self.in_flight.is_some() {
                    return Ok(PollDispatch::AlreadyRunning);
                }
                if !self.probe.agent_available() {
                    tracing::warn!("SSH agent not running, not checking for remote data");
                    return Ok(PollDispatch::NoCredentials);
                }
                tracing::info!("Looking for new online sources in the background");
                self.in_flight = Some(BackgroundPoll::spawn(
                    Arc::clone(&self.factory),
                    self.layout.clone(),
                    self.remote.ledger_url(),
                )?);
                Ok(PollDispatch::Dispatched)
            }
            PollMode::Disabled => Ok(PollDispatch::Disabled),
        }
    }

    /// Collect a finished background poll without blocking.
    pub fn harvest(&mut self) {
        if self.in_flight.as_ref().is_some_and(BackgroundPoll::is_finished)
            && let Some(poll) = self.in_flight.take()
        {
            self.absorb(poll.wait());
        }
    }

    /// Block until any background poll ends and collect its result.
    pub fn settle(&mut self) {
        if let Some(poll) = self.in_flight.take() {
            self.absorb(poll.wait());
        }
    }

    fn absorb(&mut self, outcome: Result<RemoteIndex>) {
        match outcome {
            Ok(index) => {
                tracing::debug!(sources = index.records().len(), "Background poll finished");
                self.remote_index = index;
            }
            Err(e) => tracing::warn!(error = %e, "Could not check online data repository"),
        }
    }

    /// Write `record` into the remote ledger clone and commit it.
    pub fn record_remote_state(&mut self, record: RemoteRecord, message: &str) -> Result<()> {
        self.settle();
        let repo = self.factory.open(&self.layout.remote_sources_dir())?;
        let path = self.layout.remote_ledger();

        let mut index = RemoteIndex::load_or_empty(&path)?;
        tracing::debug!(source_id = %record.source_id, tag = ?record.tag, "Updating remote ledger");
        index.upsert(record);
        index.save(&path)?;

        repo.stage(&[PathBuf::from(ShelfPath::RemoteLedger.as_str())])?;
        repo.commit(message)?;
        self.remote_index = index;
        Ok(())
    }

    /// Push the current branch of the remote ledger clone to `origin`.
    pub fn push_ledger(&self) -> Result<()> {
        let dir = self.layout.remote_sources_dir();
        let repo = self.factory.open(&dir)?;
        let branch = repo
            .current_branch()?
            .ok_or(shelf_git::Error::DetachedHead { path: dir })?;
        repo.push("origin", &[branch], false)?;
        Ok(())
    }
}
