//! git2-backed [`VersionedRepo`].

use std::cmp::Ordering;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Repository, Status, StatusOptions};

use crate::handle::{TagInfo, VersionedRepo};
use crate::helpers::{self, fast_forward_to_fetch_head, relative_to, signature};
use crate::transport::{fetch_options, push_options};
use crate::version::parse_tag_version;
use crate::{Error, Result};

/// A non-bare git repository with a working tree.
pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo").field("root", &self.root).finish()
    }
}

impl GitRepo {
    /// Open the repository whose working tree is `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path).map_err(|e| Error::unavailable(path.display(), &e))?;
        Self::from_repository(repo, path)
    }

    /// Initialise a new repository at `path`.
    pub fn init(path: &Path) -> Result<Self> {
        fs::create_dir_all(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let repo = Repository::init(path).map_err(|e| Error::unavailable(path.display(), &e))?;
        Self::from_repository(repo, path)
    }

    /// Clone `url` into `path`.
    ///
    /// Transport failures become [`Error::Network`], anything else (bad
    /// URL, missing repository, occupied target) becomes
    /// [`Error::RepositoryUnavailable`].
    pub fn clone_from(url: &str, path: &Path) -> Result<Self> {
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_options());

        let repo = builder.clone(url, path).map_err(|e| {
            if is_transport_error(&e) {
                Error::network("clone", &e)
            } else {
                Error::unavailable(url, &e)
            }
        })?;
        tracing::debug!(url = %url, path = %path.display(), "Cloned repository");
        Self::from_repository(repo, path)
    }

    fn from_repository(repo: Repository, path: &Path) -> Result<Self> {
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::RepositoryUnavailable {
                location: path.display().to_string(),
                message: "bare repositories have no working tree".into(),
            })?;
        Ok(Self { repo, root })
    }

    /// Borrow the underlying git2 repository.
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    fn find_remote(&self, name: &str) -> Result<git2::Remote<'_>> {
        self.repo
            .find_remote(name)
            .map_err(|_| Error::RemoteNotFound {
                name: name.to_string(),
            })
    }

    fn require_branch(&self) -> Result<String> {
        self.current_branch()?.ok_or_else(|| Error::DetachedHead {
            path: self.root.clone(),
        })
    }
}

impl VersionedRepo for GitRepo {
    fn workdir(&self) -> &Path {
        &self.root
    }

    fn head_commit(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?.id().to_string())),
            Err(e) if helpers::is_unborn(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.iter().any(|entry| entry.status() != Status::CURRENT))
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::with_capacity(names.len());

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{name}"))?;
            let commit = reference.peel_to_commit()?;
            let commit_time: DateTime<Utc> = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_default();

            tags.push(TagInfo {
                name: name.to_string(),
                commit: commit.id().to_string(),
                commit_time,
            });
        }

        tags.sort_by(|a, b| {
            a.commit_time
                .cmp(&b.commit_time)
                .then_with(|| compare_versions(&a.name, &b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tags)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;

        if let Ok(existing) = self.repo.find_reference(&format!("refs/tags/{name}")) {
            let target = existing.peel_to_commit()?;
            if target.id() == head.id() {
                return Ok(());
            }
            return Err(Error::TagExists {
                tag: name.to_string(),
                commit: target.id().to_string(),
            });
        }

        self.repo.tag_lightweight(name, head.as_object(), false)?;
        tracing::debug!(tag = %name, commit = %head.id(), "Created tag");
        Ok(())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            let rel = relative_to(&self.root, path)?;
            index.add_path(&rel)?;
        }
        index.write()?;
        Ok(())
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            let rel = relative_to(&self.root, path)?;
            index.remove_path(&rel)?;

            let full = self.root.join(&rel);
            match fs::remove_file(&full) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Io {
                        path: full,
                        source: e,
                    });
                }
            }
        }
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let sig = signature(&self.repo)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if helpers::is_unborn(&e) => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        let (object, resolved) = self.repo.revparse_ext(reference)?;
        self.repo
            .checkout_tree(&object, Some(git2::build::CheckoutBuilder::new().safe()))?;

        match resolved {
            Some(r) if r.is_branch() => {
                let name = r.name().ok_or_else(|| Error::BranchNotFound {
                    name: reference.to_string(),
                })?;
                self.repo.set_head(name)?;
            }
            _ => {
                let commit = object.peel_to_commit()?;
                self.repo.set_head_detached(commit.id())?;
            }
        }
        Ok(())
    }

    fn default_branch(&self) -> Result<String> {
        if let Ok(origin_head) = self.repo.find_reference("refs/remotes/origin/HEAD")
            && let Some(target) = origin_head.symbolic_target()
            && let Some(name) = target.strip_prefix("refs/remotes/origin/")
        {
            return Ok(name.to_string());
        }

        for candidate in ["main", "master"] {
            if self.repo.find_branch(candidate, BranchType::Local).is_ok() {
                return Ok(candidate.to_string());
            }
        }

        self.current_branch()?.ok_or_else(|| Error::BranchNotFound {
            name: "default branch".into(),
        })
    }

    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if helpers::is_unborn(&e) => {
                // Unborn HEAD still names a branch
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn push(&self, remote: &str, branches: &[String], with_tags: bool) -> Result<()> {
        let mut refspecs: Vec<String> = branches
            .iter()
            .map(|b| format!("refs/heads/{b}:refs/heads/{b}"))
            .collect();
        if with_tags {
            let names = self.repo.tag_names(None)?;
            refspecs.extend(
                names
                    .iter()
                    .flatten()
                    .map(|t| format!("refs/tags/{t}:refs/tags/{t}")),
            );
        }
        if refspecs.is_empty() {
            return Ok(());
        }

        let mut handle = self.find_remote(remote)?;
        let (mut options, rejections) = push_options();
        handle
            .push(&refspecs, Some(&mut options))
            .map_err(|e| Error::network("push", &e))?;

        let rejected = rejections.borrow();
        if !rejected.is_empty() {
            return Err(Error::Network {
                operation: "push".into(),
                message: rejected.join("; "),
            });
        }
        tracing::debug!(remote = %remote, refs = refspecs.len(), "Pushed");
        Ok(())
    }

    fn pull(&self, remote: &str) -> Result<()> {
        let branch = self.require_branch()?;
        let mut handle = self.find_remote(remote)?;

        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        handle
            .fetch(&[refspec.as_str()], Some(&mut fetch_options()), None)
            .map_err(|e| Error::network("pull", &e))?;

        fast_forward_to_fetch_head(&self.repo, &branch)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        let mut handle = self.find_remote(remote)?;
        handle
            .fetch::<&str>(&[], Some(&mut fetch_options()), None)
            .map_err(|e| Error::network("fetch", &e))?;
        Ok(())
    }

    fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.repo.find_remote(name).is_ok())
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo.remote(name, url)?;
        Ok(())
    }

    fn set_upstream(&self, remote: &str) -> Result<()> {
        let branch_name = self.require_branch()?;
        let mut branch = self
            .repo
            .find_branch(&branch_name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound {
                name: branch_name.clone(),
            })?;
        branch.set_upstream(Some(&format!("{remote}/{branch_name}")))?;
        Ok(())
    }
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_tag_version(a), parse_tag_version(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn is_transport_error(err: &git2::Error) -> bool {
    use git2::ErrorClass;
    matches!(
        err.class(),
        ErrorClass::Net | ErrorClass::Ssh | ErrorClass::Http | ErrorClass::Ssl
    )
}
