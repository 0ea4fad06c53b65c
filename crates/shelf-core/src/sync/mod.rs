//! Remote ledger polling and divergence reporting

mod diff;
mod marker;
mod probe;
mod scheduler;

pub use diff::{NewSource, RemoteDiff, RemoteUpdates, UpdatedSource, describe, diff};
pub use marker::{TIMESTAMP_FORMAT, read_last_access, should_poll, write_last_access};
pub use probe::{CredentialProbe, SshAgentProbe};
pub use scheduler::{BackgroundPoll, PollDispatch, SyncScheduler, refresh_remote_ledger};
