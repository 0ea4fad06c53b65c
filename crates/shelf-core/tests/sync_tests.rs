//! SyncScheduler polling against a fake server

use std::sync::Arc;

use chrono::{Duration, Local};
use pretty_assertions::assert_eq;
use shelf_core::sync::{CredentialProbe, read_last_access};
use shelf_core::{PollDispatch, PollMode, RemoteConfig, SyncScheduler};
use shelf_git::GitFactory;
use shelf_test_utils::shelf::TestShelf;

struct FixedProbe(bool);

impl CredentialProbe for FixedProbe {
    fn agent_available(&self) -> bool {
        self.0
    }
}

fn remote(shelf: &TestShelf) -> RemoteConfig {
    RemoteConfig {
        ssh_base: Some(shelf.remote_base()),
        https_base: None,
    }
}

fn scheduler(shelf: &TestShelf, remote: RemoteConfig, agent: bool) -> SyncScheduler {
    SyncScheduler::new(
        shelf.layout().clone(),
        remote,
        Arc::new(GitFactory),
        Box::new(FixedProbe(agent)),
    )
    .unwrap()
}

#[test]
fn test_poll_now_clones_then_pulls_ledger() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[("a", "", "v1.0", "alice")]);
    let mut scheduler = scheduler(&shelf, remote(&shelf), false);
    assert!(!scheduler.has_local_ledger());

    let ids: Vec<String> = scheduler.poll_now().unwrap().ids().map(str::to_string).collect();
    assert_eq!(ids, vec!["a"]);
    assert!(scheduler.has_local_ledger());

    shelf.publish_remote_ledger(&[("a", "", "v2.0", "alice"), ("b", "", "v1.0", "bob")]);
    let index = scheduler.poll_now().unwrap();
    assert_eq!(index.get("a").unwrap().tag.as_deref(), Some("v2.0"));
    assert!(index.contains("b"));
}

#[test]
fn test_poll_writes_marker_and_throttles_to_one_per_day() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    let mut scheduler = scheduler(&shelf, remote(&shelf), false);
    let now = Local::now().naive_local();
    assert!(scheduler.should_poll(false, now).unwrap());

    assert_eq!(
        scheduler.check_for_updates(false, PollMode::Foreground).unwrap(),
        PollDispatch::Completed
    );

    let last = read_last_access(&shelf.layout().last_access_marker())
        .unwrap()
        .unwrap();
    assert_eq!(last.date(), now.date());
    assert!(!scheduler.should_poll(false, now).unwrap());
    assert!(scheduler.should_poll(true, now).unwrap());
    assert!(scheduler.should_poll(false, now + Duration::days(1)).unwrap());
    assert_eq!(
        scheduler.check_for_updates(false, PollMode::Foreground).unwrap(),
        PollDispatch::NotDue
    );
}

#[test]
fn test_background_poll_is_harvested_on_settle() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[("a", "", "v1.0", "alice")]);
    let mut scheduler = scheduler(&shelf, remote(&shelf), true);

    let dispatch = scheduler.check_for_updates(true, PollMode::Background).unwrap();
    assert_eq!(dispatch, PollDispatch::Dispatched);

    scheduler.settle();
    assert!(!scheduler.is_polling());
    assert!(scheduler.remote_index().contains("a"));
}

#[test]
fn test_background_failure_is_swallowed() {
    let shelf = TestShelf::new();
    let broken = RemoteConfig {
        ssh_base: Some(format!("{}/", shelf.scratch("nowhere").display())),
        https_base: None,
    };
    let mut scheduler = scheduler(&shelf, broken, true);

    assert_eq!(
        scheduler.check_for_updates(true, PollMode::Background).unwrap(),
        PollDispatch::Dispatched
    );
    scheduler.settle();
    assert!(scheduler.remote_index().is_empty());
}

#[test]
fn test_foreground_failure_is_returned() {
    let shelf = TestShelf::new();
    let broken = RemoteConfig {
        ssh_base: Some(format!("{}/", shelf.scratch("nowhere").display())),
        https_base: None,
    };
    let mut scheduler = scheduler(&shelf, broken, true);

    assert!(scheduler.check_for_updates(true, PollMode::Foreground).is_err());
}

#[test]
fn test_background_needs_credentials() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    let mut scheduler = scheduler(&shelf, remote(&shelf), false);

    assert_eq!(
        scheduler.check_for_updates(true, PollMode::Background).unwrap(),
        PollDispatch::NoCredentials
    );
    assert!(!scheduler.is_polling());
}

#[test]
fn test_disabled_and_unconfigured_never_poll() {
    let shelf = TestShelf::new();
    let mut unconfigured = scheduler(&shelf, RemoteConfig::default(), true);
    assert_eq!(
        unconfigured.check_for_updates(true, PollMode::Foreground).unwrap(),
        PollDispatch::NotConfigured
    );

    let mut disabled = scheduler(&shelf, remote(&shelf), true);
    assert_eq!(
        disabled.check_for_updates(true, PollMode::Disabled).unwrap(),
        PollDispatch::Disabled
    );
    assert!(!shelf.layout().remote_sources_dir().exists());
}
