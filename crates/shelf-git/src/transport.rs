//! Remote transport configuration: credentials and ref update reporting.

use std::cell::RefCell;
use std::rc::Rc;

use git2::{
    AutotagOption, Cred, CredentialType, Direction, FetchOptions, PushOptions, Remote,
    RemoteCallbacks,
};

use crate::{Error, Result};

/// libgit2 asks again after a rejected credential; give up after this many.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Callbacks that authenticate through the SSH agent, the git credential
/// helper, or default credentials, in that order of preference.
pub fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0usize;

    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }

        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Ok(config) = git2::Config::open_default()
        {
            return Cred::credential_helper(&config, url, username);
        }
        Cred::default()
    });

    callbacks.transfer_progress(|progress| {
        if progress.received_objects() == progress.total_objects() {
            tracing::trace!(
                objects = progress.total_objects(),
                bytes = progress.received_bytes(),
                "Transfer complete"
            );
        }
        true
    });

    callbacks
}

/// Fetch options that also download every tag.
pub fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks());
    options.download_tags(AutotagOption::All);
    options
}

/// Ref updates the server refused during a push.
pub type Rejections = Rc<RefCell<Vec<String>>>;

/// Push options that collect per-ref rejections into the returned list.
///
/// libgit2 reports a rejected ref through a callback rather than as an error
/// from `push`, so the caller must inspect the list afterwards.
pub fn push_options<'a>() -> (PushOptions<'a>, Rejections) {
    let rejections: Rejections = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&rejections);

    let mut callbacks = remote_callbacks();
    callbacks.push_update_reference(move |refname, status| {
        if let Some(message) = status {
            sink.borrow_mut().push(format!("{refname}: {message}"));
        }
        Ok(())
    });

    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);
    (options, rejections)
}

/// Connect to `url` without a local repository and list its references.
///
/// Nothing is downloaded. Fails when the server cannot be reached or the
/// credentials are refused.
pub fn list_remote_refs(url: &str) -> Result<Vec<String>> {
    let mut remote = Remote::create_detached(url)?;
    let connection = remote
        .connect_auth(Direction::Fetch, Some(remote_callbacks()), None)
        .map_err(|e| Error::unavailable(url, &e))?;
    let refs = connection
        .list()?
        .iter()
        .map(|head| head.name().to_string())
        .collect();
    Ok(refs)
}
