//! Consistency and synchronization manager for a datashelf
//!
//! A datashelf is a federation of versioned repositories: a main repository
//! holding the sources ledger, one repository per data source, and a clone
//! of the remote ledger that lists what has been published. This crate
//! keeps them mutually consistent:
//!
//! - **Ledgers**: [`SourceIndex`] (authoritative) and [`RemoteIndex`] (mirror)
//! - **Validation**: recorded hash equals repository head, working tree clean
//! - **Tagging**: monotonic `v<major>.0` tags, see [`tagging`]
//! - **Sync**: once-a-day polling of the remote ledger, foreground or in the
//!   background, and divergence reporting
//! - **Orchestration**: [`RepositoryConsistencyManager`] runs the
//!   multi-repository commit, push, pull and clone cycles
//!
//! # Architecture
//!
//! ```text
//!                  shelf-cli
//!                      |
//!                 shelf-core
//!                      |
//!            +---------+---------+
//!            |                   |
//!        shelf-fs            shelf-git
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shelf_core::{RepositoryConsistencyManager, ShelfConfig, SourceMeta};
//!
//! fn example() -> shelf_core::Result<()> {
//!     let config = ShelfConfig::new("/data/shelf");
//!     let mut manager = RepositoryConsistencyManager::initialize(config)?;
//!     manager.create_source("demo", SourceMeta::default())?;
//!     manager.add_files("demo", &["tables/demo.csv".into()])?;
//!     manager.commit("add demo table")?;
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod manager;
pub mod pending;
pub mod shelf;
pub mod sync;
pub mod tagging;
pub mod validator;

pub use config::{PollMode, RemoteConfig, ShelfConfig};
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use ledger::{RemoteIndex, RemoteRecord, SourceIndex, SourceMeta, SourceRecord};
pub use manager::{
    CommitReport, CommittedSource, PushOutcome, RemoteReachability, RepositoryConsistencyManager,
    VersionRef,
};
pub use pending::PendingChangeTracker;
pub use shelf::create_empty_datashelf;
pub use sync::{PollDispatch, RemoteDiff, RemoteUpdates, SyncScheduler};
pub use tagging::{TagPlan, parse_tag_version, plan_tag_advance};
pub use validator::ConsistencyValidator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_repository_displays_both_hashes() {
        let error = Error::InconsistentRepository {
            source_id: "demo".into(),
            recorded: Some("a".repeat(40)),
            actual: None,
        };

        let display = error.to_string();
        assert!(display.contains("demo"), "got: {display}");
        assert!(display.contains(&"a".repeat(40)), "got: {display}");
        assert!(display.contains("<none>"), "got: {display}");
    }
}
