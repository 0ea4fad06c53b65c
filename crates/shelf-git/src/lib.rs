//! Versioned repository capability for the datashelf
//!
//! The datashelf only drives an existing version-control engine. This crate
//! pins down the exact operations it relies on ([`VersionedRepo`]) and
//! provides the git2-backed implementation ([`GitRepo`]).

pub mod error;
pub mod factory;
pub mod handle;
pub mod helpers;
pub mod repo;
pub mod transport;
pub mod version;

pub use error::{Error, Result};
pub use factory::{GitFactory, RepoFactory};
pub use handle::{TagInfo, VersionedRepo};
pub use repo::GitRepo;
pub use version::parse_tag_version;
