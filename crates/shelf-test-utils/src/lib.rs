//! Shared test utilities for the datashelf workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git2 repository fixtures, including bare "remotes"
//! - [`shelf`]: [`shelf::TestShelf`] builder for a scaffolded datashelf

pub mod git;
pub mod shelf;
