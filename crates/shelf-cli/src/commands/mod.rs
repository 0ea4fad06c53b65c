//! Command implementations for shelf-cli

pub mod init;
pub mod remote;
pub mod source;
pub mod status;

pub use init::run_init;
pub use remote::{
    run_check_remote, run_clone, run_publish, run_pull, run_push, run_updates,
};
pub use source::{run_checkout, run_commit, run_create, run_refresh, run_remove};
pub use status::run_status;
