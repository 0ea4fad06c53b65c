//! Shared git2 helper functions

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository, Signature};

use crate::{Error, Result};

/// Author used when the git configuration has no identity.
const FALLBACK_NAME: &str = "datashelf";
const FALLBACK_EMAIL: &str = "datashelf@localhost";

/// Signature from the git configuration, or a fixed fallback identity.
pub fn signature(repo: &Repository) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
    }
}

/// True for the errors git2 raises when HEAD does not point at a commit yet.
pub fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// Express `path` relative to `root`.
///
/// Relative inputs are returned unchanged. Absolute inputs are compared
/// both as given and canonicalized, since temp directories are often
/// reached through symlinks.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    if path.is_relative() {
        return Ok(path.to_path_buf());
    }
    if let Ok(rel) = path.strip_prefix(root) {
        return Ok(rel.to_path_buf());
    }

    let canonical_root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let canonical_path = match path.parent() {
        Some(parent) => dunce::canonicalize(parent)
            .map(|p| p.join(path.file_name().unwrap_or_default()))
            .unwrap_or_else(|_| path.to_path_buf()),
        None => path.to_path_buf(),
    };

    canonical_path
        .strip_prefix(&canonical_root)
        .map(Path::to_path_buf)
        .map_err(|_| Error::PathOutsideRepository {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

/// Fast-forward `branch_name` to `FETCH_HEAD` and update the working tree.
///
/// Fails with [`Error::CannotFastForward`] when histories have diverged.
pub fn fast_forward_to_fetch_head(repo: &Repository, branch_name: &str) -> Result<()> {
    let fetch_head = repo.find_reference("FETCH_HEAD").map_err(|e| Error::Network {
        operation: "pull".into(),
        message: format!("Could not find FETCH_HEAD: {}", e.message()),
    })?;
    let fetch_commit = fetch_head.peel_to_commit()?;
    let annotated = repo.find_annotated_commit(fetch_commit.id())?;

    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }

    if analysis.is_fast_forward() || analysis.is_unborn() {
        let refname = format!("refs/heads/{branch_name}");
        let log = format!("pull: fast-forward to {}", fetch_commit.id());
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(fetch_commit.id(), &log)?;
            }
            Err(_) => {
                repo.reference(&refname, fetch_commit.id(), true, &log)?;
            }
        }
        repo.set_head(&refname)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    let head_commit = repo.head()?.peel_to_commit()?;
    Err(Error::CannotFastForward {
        message: format!(
            "Cannot fast-forward {} from {} to {}. Manual merge required.",
            branch_name,
            head_commit.id(),
            fetch_commit.id()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn relative_path_passes_through() {
        let rel = relative_to(Path::new("/repo"), Path::new("tables/a.csv")).unwrap();
        assert_eq!(rel, PathBuf::from("tables/a.csv"));
    }

    #[test]
    fn absolute_path_inside_root_is_stripped() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("tables")).unwrap();
        let abs = temp.path().join("tables").join("a.csv");

        let rel = relative_to(temp.path(), &abs).unwrap();
        assert_eq!(rel, PathBuf::from("tables/a.csv"));
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();

        let err = relative_to(temp.path(), &other.path().join("x")).unwrap_err();
        assert!(matches!(err, Error::PathOutsideRepository { .. }));
    }
}
