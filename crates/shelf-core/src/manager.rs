//! RepositoryConsistencyManager
//!
//! Orchestrates the main ledger repository, one repository per source and
//! the remote ledger. Every source handed out for use has passed
//! validation: its head equals the hash recorded in the [`SourceIndex`] and
//! its working tree is clean.
//!
//! Multi-repository operations are not atomic. A failure in the middle of
//! [`commit`](RepositoryConsistencyManager::commit) can leave source
//! repositories committed while the main repository still records their
//! previous hashes; [`refresh_hash_and_tag`](RepositoryConsistencyManager::refresh_hash_and_tag)
//! followed by a commit reconciles the ledger.
//!
//! The manager is not thread-safe. Callers serialize their own calls; the
//! only concurrency is the background poll owned by the [`SyncScheduler`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use shelf_fs::{MAIN_REPO_ID, SOURCE_SUB_FOLDERS, ShelfLayout, ShelfPath};
use shelf_git::{GitFactory, RepoFactory, VersionedRepo};

use crate::config::{PollMode, REMOTE_LEDGER_REPO, ShelfConfig, under_test_harness};
use crate::inventory::Inventory;
use crate::ledger::{
    RemoteIndex, RemoteRecord, SourceIndex, SourceMeta, SourceRecord, validate_source_id,
};
use crate::pending::PendingChangeTracker;
use crate::sync::{
    self, CredentialProbe, PollDispatch, RemoteDiff, RemoteUpdates, SshAgentProbe, SyncScheduler,
};
use crate::tagging::{TagPlan, plan_tag_advance};
use crate::validator::ConsistencyValidator;
use crate::{Error, Result};

/// Target of [`RepositoryConsistencyManager::checkout_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    /// Tip of the default branch
    Latest,
    /// A version tag such as `v2.0`
    Tag(String),
}

impl From<&str> for VersionRef {
    fn from(value: &str) -> Self {
        if value == "latest" {
            Self::Latest
        } else {
            Self::Tag(value.to_string())
        }
    }
}

/// Result of [`RepositoryConsistencyManager::push_to_remote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    /// The remote ledger already records the local head
    UpToDate,
    /// Commits and tags were pushed
    Pushed { tag: String },
}

/// Outcome of reaching the remote ledger over one transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteReachability {
    pub transport: String,
    pub url: String,
    /// Number of references advertised, when the remote answered
    pub refs: Option<usize>,
    pub error: Option<String>,
}

impl RemoteReachability {
    pub fn is_reachable(&self) -> bool {
        self.error.is_none()
    }
}

/// One source committed by a commit cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedSource {
    pub source_id: String,
    pub commit_hash: String,
    pub tag: Option<String>,
}

/// Result of [`RepositoryConsistencyManager::commit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub sources: Vec<CommittedSource>,
    pub main_commit: String,
}

/// Keeps the source index, the source repositories and the remote ledger
/// mutually consistent.
pub struct RepositoryConsistencyManager {
    config: ShelfConfig,
    layout: ShelfLayout,
    sources_file: PathBuf,
    factory: Arc<dyn RepoFactory>,
    sources: SourceIndex,
    repositories: BTreeMap<String, Box<dyn VersionedRepo>>,
    validator: ConsistencyValidator,
    pending: PendingChangeTracker,
    scheduler: SyncScheduler,
}

impl std::fmt::Debug for RepositoryConsistencyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryConsistencyManager")
            .field("root", &self.layout.root())
            .field("sources", &self.sources.len())
            .field("open", &self.repositories.keys().collect::<Vec<_>>())
            .field("pending", &self.pending)
            .finish()
    }
}

impl RepositoryConsistencyManager {
    /// Open the datashelf described by `config` with git repositories.
    ///
    /// See [`with_parts`](Self::with_parts).
    pub fn initialize(config: ShelfConfig) -> Result<Self> {
        Self::with_parts(config, Arc::new(GitFactory), Box::new(SshAgentProbe))
    }

    /// Open the datashelf with explicit collaborators.
    ///
    /// Loads the source index and, when a local clone of the remote ledger
    /// exists, reports how many remote updates are available. Unless
    /// `config.debug` is set, every source (in ledger order) and then the
    /// main repository is opened and validated; the first failure aborts.
    /// Finally an update check runs in the configured polling mode.
    pub fn with_parts(
        config: ShelfConfig,
        factory: Arc<dyn RepoFactory>,
        probe: Box<dyn CredentialProbe>,
    ) -> Result<Self> {
        let layout = config.layout();
        let sources_file = config.sources_file();
        let sources = SourceIndex::load(&sources_file)?;
        let scheduler = SyncScheduler::new(
            layout.clone(),
            config.remote.clone(),
            Arc::clone(&factory),
            probe,
        )?;

        let mut manager = Self {
            config,
            layout,
            sources_file,
            factory,
            sources,
            repositories: BTreeMap::new(),
            validator: ConsistencyValidator::new(),
            pending: PendingChangeTracker::new(),
            scheduler,
        };
        manager.report_remote_state();

        if manager.config.debug {
            tracing::info!("Repository manager initialized in debug mode");
        } else {
            let ids: Vec<String> = manager.sources.ids().map(str::to_string).collect();
            for id in ids.iter().map(String::as_str).chain([MAIN_REPO_ID]) {
                manager.open_handle(id)?;
                manager.validate(id)?;
            }
        }

        let mode = manager.config.polling;
        manager.check_for_updates(false, mode)?;
        Ok(manager)
    }

    fn report_remote_state(&self) {
        if !self.scheduler.has_local_ledger() {
            tracing::info!("Remote: not configured");
            return;
        }
        let summary = sync::diff(&self.sources, self.scheduler.cached_index());
        if !summary.is_empty() {
            tracing::info!(
                new = summary.new_items.len(),
                updated = summary.updated_items.len(),
                "Remote: {} new and {} updated sources are available online",
                summary.new_items.len(),
                summary.updated_items.len()
            );
        }
    }

    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    pub fn layout(&self) -> &ShelfLayout {
        &self.layout
    }

    pub fn sources(&self) -> &SourceIndex {
        &self.sources
    }

    pub fn pending(&self) -> &PendingChangeTracker {
        &self.pending
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn is_validated(&self, repo_id: &str) -> bool {
        self.validator.is_validated(repo_id)
    }

    /// Whether `source_id` is in the local source index.
    pub fn is_source(&self, source_id: &str) -> bool {
        self.sources.contains(source_id)
    }

    /// Whether `source_id` is listed in the remote ledger.
    pub fn remote_has_source(&mut self, source_id: &str) -> bool {
        self.scheduler.remote_index().contains(source_id)
    }

    /// Current remote ledger snapshot.
    pub fn remote_index(&mut self) -> &RemoteIndex {
        self.scheduler.remote_index()
    }

    // ---- handles ----

    fn repo_path(&self, repo_id: &str) -> PathBuf {
        if repo_id == MAIN_REPO_ID {
            self.layout.root().to_path_buf()
        } else {
            self.layout.source_dir(repo_id)
        }
    }

    fn open_handle(&mut self, repo_id: &str) -> Result<()> {
        if self.repositories.contains_key(repo_id) {
            return Ok(());
        }
        if repo_id != MAIN_REPO_ID && !self.sources.contains(repo_id) {
            return Err(Error::UnknownSource(repo_id.to_string()));
        }
        let repo = self.factory.open(&self.repo_path(repo_id))?;
        self.repositories.insert(repo_id.to_string(), repo);
        Ok(())
    }

    fn repo(&self, repo_id: &str) -> Result<&dyn VersionedRepo> {
        self.repositories
            .get(repo_id)
            .map(|repo| repo.as_ref())
            .ok_or_else(|| Error::UnknownSource(repo_id.to_string()))
    }

    fn validate(&mut self, repo_id: &str) -> Result<()> {
        let repo = self
            .repositories
            .get(repo_id)
            .ok_or_else(|| Error::UnknownSource(repo_id.to_string()))?;
        self.validator
            .validate(repo_id, repo.as_ref(), &self.sources)
    }

    /// Validated read access to a repository.
    ///
    /// The handle is opened on first use and validated unless a previous
    /// validation is still cached.
    pub fn handle(&mut self, repo_id: &str) -> Result<&dyn VersionedRepo> {
        self.open_handle(repo_id)?;
        if !self.validator.is_validated(repo_id) {
            self.validate(repo_id)?;
        }
        self.repo(repo_id)
    }

    // ---- local mutation ----

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.config.read_only {
            return Err(Error::ReadOnly {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn credited(&self, message: &str) -> String {
        format!("{message} by {}", self.config.user)
    }

    /// Write the source index and queue it for the next main commit.
    fn persist_index(&mut self) -> Result<()> {
        self.sources.save(&self.sources_file)?;
        self.pending.add(MAIN_REPO_ID, &self.sources_file);
        Ok(())
    }

    /// Register a new source and scaffold its repository.
    ///
    /// The source repository receives `raw_data/`, `tables/` and `docs/`
    /// (each holding a `.gitkeep`) plus a `meta.csv`. The scaffold and the
    /// ledger update are committed to the source and main repositories
    /// with the same message. The recorded tag stays empty until the first
    /// [`commit`](Self::commit) of the source.
    ///
    /// Returns the scaffold commit hash.
    pub fn create_source(&mut self, source_id: &str, meta: SourceMeta) -> Result<String> {
        self.ensure_writable("create source")?;
        validate_source_id(source_id)?;
        let dir = self.layout.source_dir(source_id);
        if self.sources.contains(source_id) || dir.exists() {
            return Err(Error::SourceExists(source_id.to_string()));
        }

        self.sources
            .insert(SourceRecord::from_meta(source_id, meta.clone()))?;
        self.persist_index()?;

        tracing::info!(source_id = %source_id, path = %dir.display(), "Creating source");
        let repo = self.factory.init(&dir)?;
        self.repositories.insert(source_id.to_string(), repo);

        for folder in SOURCE_SUB_FOLDERS {
            let folder_path = dir.join(folder);
            fs::create_dir_all(&folder_path).map_err(|e| shelf_fs::Error::io(&folder_path, e))?;
            let keep = Path::new(folder).join(ShelfPath::GitKeep.as_str());
            shelf_fs::io::touch(&dir.join(&keep))?;
            self.stage_file(source_id, keep);
        }
        meta.save(&self.layout.source_meta(source_id))?;
        self.stage_file(source_id, PathBuf::from(ShelfPath::SourceMeta.as_str()));

        let message = self.credited(&format!("added source: {source_id}"));
        let committed = self.commit_source(source_id, &message, false)?;
        self.commit_main(&message)?;
        Ok(committed.commit_hash)
    }

    fn stage_file(&mut self, repo_id: &str, path: PathBuf) {
        if self.config.debug {
            tracing::debug!(repo = %repo_id, file = %path.display(), "Added file");
        }
        self.pending.add(repo_id, path);
    }

    /// Queue files of a repository for the next commit cycle.
    pub fn add_files(&mut self, repo_id: &str, paths: &[PathBuf]) -> Result<()> {
        self.ensure_writable("add files")?;
        if repo_id != MAIN_REPO_ID && !self.sources.contains(repo_id) {
            return Err(Error::UnknownSource(repo_id.to_string()));
        }
        for path in paths {
            self.stage_file(repo_id, path.clone());
        }
        Ok(())
    }

    /// Remove files from the index and the working tree immediately.
    ///
    /// The repository is marked touched so the next commit records the
    /// removal.
    pub fn remove_files(&mut self, repo_id: &str, paths: &[PathBuf]) -> Result<()> {
        self.ensure_writable("remove files")?;
        self.handle(repo_id)?.remove(paths)?;
        if self.config.debug {
            for path in paths {
                tracing::debug!(repo = %repo_id, file = %path.display(), "Removed file");
            }
        }
        self.pending.mark_touched(repo_id);
        Ok(())
    }

    /// Commit every touched repository, then the main repository.
    ///
    /// Each touched source is staged and committed, its tag is advanced and
    /// its ledger row updated. The ledger is then written and committed to
    /// the main repository. The message is credited to the configured user.
    pub fn commit(&mut self, message: &str) -> Result<CommitReport> {
        self.ensure_writable("commit")?;
        let message = self.credited(message);

        let mut sources = Vec::new();
        for source_id in self.pending.touched_sources() {
            sources.push(self.commit_source(&source_id, &message, true)?);
        }
        let main_commit = self.commit_main(&message)?;
        self.pending.clear_touched();

        tracing::info!(
            sources = sources.len(),
            commit = %main_commit,
            "Committed datashelf"
        );
        Ok(CommitReport {
            sources,
            main_commit,
        })
    }

    fn commit_source(
        &mut self,
        source_id: &str,
        message: &str,
        advance: bool,
    ) -> Result<CommittedSource> {
        let paths = self.pending.pending(source_id).to_vec();
        self.open_handle(source_id)?;
        let repo = self.repo(source_id)?;

        repo.stage(&paths)?;
        let commit_hash = repo.commit(message)?;
        let tag = if advance {
            Some(advance_tag(repo, &commit_hash)?)
        } else {
            repo.tag_at_head()?
        };

        if self
            .sources
            .set_revision(source_id, Some(commit_hash.clone()), tag.clone())?
        {
            self.validator.invalidate(source_id);
        }
        self.pending.release(source_id);

        tracing::debug!(
            source_id = %source_id,
            commit = %commit_hash,
            tag = ?tag,
            "Committed source"
        );
        Ok(CommittedSource {
            source_id: source_id.to_string(),
            commit_hash,
            tag,
        })
    }

    fn commit_main(&mut self, message: &str) -> Result<String> {
        self.persist_index()?;
        let paths = self.pending.pending(MAIN_REPO_ID).to_vec();
        self.open_handle(MAIN_REPO_ID)?;

        let repo = self.repo(MAIN_REPO_ID)?;
        repo.stage(&paths)?;
        let hash = repo.commit(message)?;
        self.pending.release(MAIN_REPO_ID);
        Ok(hash)
    }

    /// Re-read head hash and head tag of a source into the index.
    ///
    /// The ledger is written and queued for the next main commit.
    pub fn refresh_hash_and_tag(&mut self, source_id: &str) -> Result<()> {
        self.open_handle(source_id)?;
        let repo = self.repo(source_id)?;
        let hash = repo.head_commit()?;
        let tag = repo.tag_at_head()?;

        if self.sources.set_revision(source_id, hash, tag)? {
            self.validator.invalidate(source_id);
        }
        self.persist_index()
    }

    /// Check out a tag, or the default branch for [`VersionRef::Latest`].
    ///
    /// Returns the new head hash. The index is not updated.
    pub fn checkout_version(&mut self, source_id: &str, version: &VersionRef) -> Result<String> {
        let repo = self.handle(source_id)?;
        let reference = match version {
            VersionRef::Latest => repo.default_branch()?,
            VersionRef::Tag(tag) => {
                if !repo.tags()?.iter().any(|t| &t.name == tag) {
                    return Err(Error::TagNotFound {
                        source_id: source_id.to_string(),
                        tag: tag.clone(),
                    });
                }
                tag.clone()
            }
        };

        repo.checkout(&reference)?;
        let head = repo.head_commit()?.ok_or_else(|| shelf_git::Error::BranchNotFound {
            name: reference.clone(),
        })?;
        tracing::info!(
            source_id = %source_id,
            reference = %reference,
            head = %head,
            "Checked out version"
        );
        Ok(head)
    }

    /// Path of a source's own inventory file.
    pub fn inventory_file(&mut self, source_id: &str) -> Result<PathBuf> {
        let repo = self.handle(source_id)?;
        Ok(repo.workdir().join(ShelfPath::SourceInventory.as_str()))
    }

    // ---- remote ----

    /// Run an update check against the remote ledger.
    ///
    /// Suppressed under an automated test harness.
    pub fn check_for_updates(&mut self, force: bool, mode: PollMode) -> Result<PollDispatch> {
        if under_test_harness() {
            tracing::debug!("Test harness detected, skipping update check");
            return Ok(PollDispatch::Suppressed);
        }
        self.scheduler.check_for_updates(force, mode)
    }

    /// Pull the remote ledger now, regardless of the polling schedule.
    pub fn refresh_remote(&mut self) -> Result<&RemoteIndex> {
        self.scheduler.poll_now()
    }

    /// Connect to the remote ledger repository over every configured
    /// transport, SSH first, and report which ones answer.
    ///
    /// Nothing is fetched and the cached remote ledger is left alone.
    pub fn check_remote_connection(&self) -> Result<Vec<RemoteReachability>> {
        let remote = &self.config.remote;
        if !remote.is_configured() {
            return Err(Error::RemoteNotConfigured(
                "no base URL to check the connection against".into(),
            ));
        }

        let candidates = [
            ("ssh", remote.ssh_url(REMOTE_LEDGER_REPO)),
            ("https", remote.https_url(REMOTE_LEDGER_REPO)),
        ];
        let results = candidates
            .into_iter()
            .filter_map(|(transport, url)| url.map(|url| (transport, url)))
            .map(|(transport, url)| {
                let outcome = self.factory.list_refs(&url);
                match &outcome {
                    Ok(refs) => tracing::info!(url = %url, refs = refs.len(), "Remote reachable"),
                    Err(e) => tracing::warn!(url = %url, error = %e, "Remote unreachable"),
                }
                RemoteReachability {
                    transport: transport.to_string(),
                    url,
                    refs: outcome.as_ref().ok().map(Vec::len),
                    error: outcome.err().map(|e| e.to_string()),
                }
            })
            .collect();
        Ok(results)
    }

    /// Source ids that are new or newer on the remote.
    pub fn remote_diff(&mut self) -> RemoteDiff {
        sync::diff(&self.sources, self.scheduler.remote_index())
    }

    /// Details of the sources that are new or newer on the remote.
    pub fn available_remote_updates(&mut self) -> RemoteUpdates {
        sync::describe(&self.sources, self.scheduler.remote_index())
    }

    /// Import a source listed on the remote.
    ///
    /// The remote ledger is pulled first. Cloning is tried over SSH and then
    /// over HTTPS. The source's `meta.csv` seeds its ledger row; hash and
    /// tag come from the clone. The ledger update is queued for the next
    /// main commit.
    pub fn clone_from_remote(&mut self, source_id: &str) -> Result<()> {
        self.ensure_writable("clone")?;
        validate_source_id(source_id)?;
        if self.sources.contains(source_id) {
            return Err(Error::SourceExists(source_id.to_string()));
        }

        self.scheduler.poll_now()?;
        if !self.scheduler.cached_index().contains(source_id) {
            tracing::warn!(source_id = %source_id, "Source is not listed in the remote ledger");
        }

        let dest = self.layout.source_dir(source_id);
        let repo = self.clone_with_fallback(source_id, &dest)?;

        let meta = SourceMeta::load(&self.layout.source_meta(source_id))?;
        let mut record = SourceRecord::from_meta(source_id, meta);
        record.commit_hash = repo.head_commit()?;
        record.tag = repo.tag_at_head()?;

        tracing::info!(source_id = %source_id, tag = ?record.tag, "Imported source");
        self.sources.insert(record)?;
        self.repositories.insert(source_id.to_string(), repo);
        self.persist_index()
    }

    fn clone_with_fallback(&self, source_id: &str, dest: &Path) -> Result<Box<dyn VersionedRepo>> {
        let remote = &self.config.remote;
        if !remote.is_configured() {
            return Err(Error::RemoteNotConfigured(format!(
                "cannot clone '{source_id}' without a remote base URL"
            )));
        }

        let attempt = |transport: &str, url: Option<String>| match url {
            Some(url) => {
                tracing::info!(
                    source_id = %source_id,
                    url = %url,
                    "Cloning source via {transport}"
                );
                self.factory.clone_repo(&url, dest).inspect_err(|e| {
                    tracing::warn!(
                        source_id = %source_id,
                        error = %e,
                        "Cloning via {transport} failed"
                    );
                })
            }
            None => Err(shelf_git::Error::RepositoryUnavailable {
                location: transport.to_string(),
                message: format!("no {transport} base URL configured"),
            }),
        };

        let ssh = match attempt("ssh", remote.ssh_url(source_id)) {
            Ok(repo) => return Ok(repo),
            Err(e) => e,
        };
        let https = match attempt("https", remote.https_url(source_id)) {
            Ok(repo) => return Ok(repo),
            Err(e) => e,
        };

        let location = remote
            .https_base
            .as_deref()
            .or(remote.ssh_base.as_deref())
            .unwrap_or_default();
        Err(Error::SourceImportFailed {
            source_id: source_id.to_string(),
            ssh: Box::new(ssh),
            https: Box::new(https),
            hint: format!(
                "Check your connection and credentials, \
                 and whether '{source_id}' exists in {location}"
            ),
        })
    }

    /// Publish a source and its tags to the remote.
    ///
    /// Skips the push when `force` is false and the remote ledger already
    /// records the local head. Otherwise the tag is advanced, the remote
    /// ledger row for this source is rewritten (unless it already carries
    /// the same tag), the local tag is committed to the main repository,
    /// and the remote ledger, the source commits and the source tags are
    /// pushed in that order.
    pub fn push_to_remote(&mut self, source_id: &str, force: bool) -> Result<PushOutcome> {
        self.ensure_writable("push")?;
        self.scheduler.poll_now()?;

        let head = self
            .handle(source_id)?
            .head_commit()?
            .ok_or_else(|| shelf_git::Error::BranchNotFound {
                name: format!("{source_id}: HEAD"),
            })?;
        let remote_record = self.scheduler.cached_index().get(source_id).cloned();

        let remote_hash = remote_record.as_ref().and_then(|r| r.hash.as_deref());
        if !force && remote_hash == Some(head.as_str()) {
            tracing::info!(source_id = %source_id, "Nothing to push");
            return Ok(PushOutcome::UpToDate);
        }

        let repo = self.repo(source_id)?;
        let plan = plan_tag_advance(&head, &repo.tags()?);
        let remote_tag = remote_record.as_ref().and_then(|r| r.tag.as_deref());
        let already_recorded = !plan.creates_tag() && remote_tag == Some(plan.name());
        if let TagPlan::Create(tag) = &plan {
            repo.create_tag(tag)?;
        }
        let tag = plan.into_name();

        if !already_recorded {
            let record = RemoteRecord {
                source_id: source_id.to_string(),
                hash: Some(head.clone()),
                tag: Some(tag.clone()),
                user: Some(self.config.user.clone()),
            };
            let message = self.credited("remote source update");
            self.scheduler.record_remote_state(record, &message)?;
        }

        self.sources.set_tag(source_id, Some(tag.clone()))?;
        self.persist_index()?;
        self.commit("Update tags of sources")?;

        self.scheduler.push_ledger()?;
        let repo = self.repo(source_id)?;
        let branch = repo
            .current_branch()?
            .ok_or_else(|| shelf_git::Error::DetachedHead {
                path: repo.workdir().to_path_buf(),
            })?;
        repo.push("origin", &[branch], false)?;
        repo.push("origin", &[], true)?;

        tracing::info!(source_id = %source_id, tag = %tag, "Pushed source");
        Ok(PushOutcome::Pushed { tag })
    }

    /// Update a source from the remote and merge its inventory.
    ///
    /// Pulls the remote ledger and the source, refreshes the source's hash
    /// and tag, and returns `old_inventory` with this source's rows replaced
    /// by the ones in its `source_inventory.csv`.
    pub fn pull_from_remote(
        &mut self,
        source_id: &str,
        old_inventory: &Inventory,
    ) -> Result<Inventory> {
        self.ensure_writable("pull")?;
        self.scheduler.poll_now()?;

        self.handle(source_id)?.pull("origin")?;
        self.refresh_hash_and_tag(source_id)?;

        let fresh = Inventory::load(&self.layout.source_inventory(source_id))?;
        tracing::info!(source_id = %source_id, rows = fresh.len(), "Pulled source");
        Ok(old_inventory.merge_source(source_id, &fresh))
    }

    /// Create `origin` on the remote if needed and publish the current branch.
    ///
    /// After the push the remote is fetched and the branch tracks it.
    pub fn publish_source(&mut self, source_id: &str) -> Result<()> {
        self.ensure_writable("publish")?;
        let url = self
            .config
            .remote
            .ssh_url(source_id)
            .or_else(|| self.config.remote.https_url(source_id));

        let repo = self.handle(source_id)?;
        if !repo.has_remote("origin")? {
            let url = url.ok_or_else(|| {
                Error::RemoteNotConfigured(format!("cannot publish '{source_id}'"))
            })?;
            repo.add_remote("origin", &url)?;
        }

        let branch = repo
            .current_branch()?
            .ok_or_else(|| shelf_git::Error::DetachedHead {
                path: repo.workdir().to_path_buf(),
            })?;
        repo.push("origin", &[branch], false)?;
        repo.fetch("origin")?;
        repo.set_upstream("origin")?;
        tracing::info!(source_id = %source_id, "Published source");
        Ok(())
    }

    /// Wait for an in-flight background poll and release the manager.
    pub fn shutdown(mut self) {
        self.scheduler.settle();
        if !self.pending.is_empty() {
            tracing::warn!(
                repos = ?self.pending.touched_sources(),
                "Shutting down with uncommitted tracked changes"
            );
        }
    }
}

fn advance_tag(repo: &dyn VersionedRepo, head: &str) -> Result<String> {
    let plan = plan_tag_advance(head, &repo.tags()?);
    if let TagPlan::Create(tag) = &plan {
        repo.create_tag(tag)?;
        tracing::info!(path = %repo.workdir().display(), tag = %tag, "Created tag");
    }
    Ok(plan.into_name())
}
