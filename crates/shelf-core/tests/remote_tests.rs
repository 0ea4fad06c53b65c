//! Clone, push and pull cycles against bare repositories on a fake server

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use git2::Repository;
use pretty_assertions::assert_eq;
use shelf_core::config::under_test_harness;
use shelf_core::sync::{CredentialProbe, refresh_remote_ledger};
use shelf_core::{
    Error, Inventory, PollMode, PushOutcome, RepositoryConsistencyManager, ShelfConfig, SourceMeta,
};
use shelf_git::GitFactory;
use shelf_test_utils::git::{bare_repo, commit_file, head_hash, push_all, tag_head};
use shelf_test_utils::shelf::TestShelf;

const META: &str = "collected_by,alice\ndate,2024-03-19\nsource_url,https://example.org/ext\nlicence,CC0\n";
const INVENTORY_HEADER: &str =
    ",variable,entity,category,pathway,scenario,model,source,source_name,source_year,unit\n";

fn inventory_row(index: &str, variable: &str, source: &str) -> String {
    format!("{index},{variable},DEU,,,,,{source},{source},2024,USD\n")
}

fn config(shelf: &TestShelf) -> ShelfConfig {
    ShelfConfig::new(shelf.root())
        .with_user("tester")
        .with_polling(PollMode::Disabled)
        .with_remote(Some(shelf.remote_base()), None)
}

fn open(_shelf: &TestShelf, config: ShelfConfig) -> RepositoryConsistencyManager {
    RepositoryConsistencyManager::initialize(config).unwrap()
}

/// Publish `ext` tagged `v1.0` and list it in the remote ledger.
fn publish_ext(shelf: &TestShelf) -> Repository {
    let inventory = format!("{INVENTORY_HEADER}{}", inventory_row("0", "GDP", "ext"));
    let author = shelf.publish_source(
        "ext",
        &[("meta.csv", META), ("source_inventory.csv", &inventory)],
    );
    tag_head(&author, "v1.0");
    push_all(&author, "origin");
    shelf.publish_remote_ledger(&[("ext", &head_hash(&author), "v1.0", "alice")]);
    author
}

/// Content of the remote ledger on the server.
fn server_ledger(shelf: &TestShelf) -> String {
    let bare = Repository::open(shelf.server_dir().join("remote_sources.git")).unwrap();
    let tree = bare.head().unwrap().peel_to_tree().unwrap();
    let entry = tree.get_name("source_states.csv").unwrap();
    let blob = bare.find_blob(entry.id()).unwrap();
    String::from_utf8(blob.content().to_vec()).unwrap()
}

#[test]
fn test_clone_from_remote_seeds_record_from_meta() {
    let shelf = TestShelf::new();
    let author = publish_ext(&shelf);
    let mut manager = open(&shelf, config(&shelf));

    manager.clone_from_remote("ext").unwrap();

    let record = manager.sources().get("ext").unwrap();
    assert_eq!(record.collected_by.as_deref(), Some("alice"));
    assert_eq!(record.license.as_deref(), Some("CC0"));
    assert_eq!(record.commit_hash, Some(head_hash(&author)));
    assert_eq!(record.tag.as_deref(), Some("v1.0"));
    assert!(manager.remote_has_source("ext"));
    assert!(shelf.layout().last_access_marker().is_file());
    assert!(manager.pending().is_touched("main"));

    manager.commit("import ext").unwrap();
    drop(manager);

    let reopened = open(&shelf, config(&shelf));
    assert!(reopened.is_validated("ext"));
}

#[test]
fn test_clone_falls_back_to_https() {
    let shelf = TestShelf::new();
    publish_ext(&shelf);
    // The ledger clone keeps its own origin, so only the source clone
    // goes through the broken SSH base
    refresh_remote_ledger(
        &GitFactory,
        shelf.layout(),
        Some(&format!("{}remote_sources.git", shelf.remote_base())),
    )
    .unwrap();

    let nowhere = format!("{}/", shelf.scratch("nowhere").join("missing").display());
    let config = config(&shelf).with_remote(Some(nowhere), Some(shelf.remote_base()));
    let mut manager = open(&shelf, config);

    manager.clone_from_remote("ext").unwrap();

    assert!(manager.is_source("ext"));
    assert!(shelf.layout().source_dir("ext").join("meta.csv").is_file());
}

#[test]
fn test_clone_reports_both_failures() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    let config = config(&shelf).with_remote(
        Some(shelf.remote_base()),
        Some(format!("{}/", shelf.scratch("nowhere").display())),
    );
    let mut manager = open(&shelf, config);

    let err = manager.clone_from_remote("missing").unwrap_err();
    match err {
        Error::SourceImportFailed { source_id, hint, .. } => {
            assert_eq!(source_id, "missing");
            assert!(hint.contains("missing"), "hint: {hint}");
        }
        other => panic!("expected SourceImportFailed, got {other}"),
    }
    assert!(!manager.is_source("missing"));
}

#[test]
fn test_clone_without_remote_is_not_configured() {
    let shelf = TestShelf::new();
    let config = ShelfConfig::new(shelf.root()).with_polling(PollMode::Disabled);
    let mut manager = open(&shelf, config);

    let err = manager.clone_from_remote("ext").unwrap_err();
    assert!(matches!(err, Error::RemoteNotConfigured(_)), "got {err}");
}

#[test]
fn test_check_remote_connection_reports_each_transport() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    let missing = format!("{}/", shelf.scratch("nowhere").display());
    let config = config(&shelf).with_remote(Some(shelf.remote_base()), Some(missing));
    let manager = open(&shelf, config);

    let results = manager.check_remote_connection().unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].transport, "ssh");
    assert!(results[0].is_reachable(), "{:?}", results[0]);
    assert!(results[0].refs.is_some_and(|n| n > 0));
    assert_eq!(results[1].transport, "https");
    assert!(!results[1].is_reachable());
    assert_eq!(results[1].refs, None);
    assert!(manager.pending().is_empty());
}

#[test]
fn test_check_remote_connection_without_remote_is_not_configured() {
    let shelf = TestShelf::new();
    let config = ShelfConfig::new(shelf.root()).with_polling(PollMode::Disabled);
    let manager = open(&shelf, config);

    let err = manager.check_remote_connection().unwrap_err();
    assert!(matches!(err, Error::RemoteNotConfigured(_)), "got {err}");
}

#[test]
fn test_publish_then_push_updates_remote_ledger() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    bare_repo(&shelf.server_dir().join("demo.git"));

    let mut manager = open(&shelf, config(&shelf));
    manager.create_source("demo", SourceMeta::default()).unwrap();
    let data = shelf.layout().source_dir("demo").join("tables/data.csv");
    fs::write(&data, "x\n").unwrap();
    manager
        .add_files("demo", &[PathBuf::from("tables/data.csv")])
        .unwrap();
    manager.commit("init").unwrap();
    manager.publish_source("demo").unwrap();

    let outcome = manager.push_to_remote("demo", false).unwrap();
    assert_eq!(outcome, PushOutcome::Pushed { tag: "v1.0".into() });

    let head = manager.sources().get("demo").unwrap().commit_hash.clone();
    let remote = manager.remote_index().get("demo").unwrap().clone();
    assert_eq!(remote.hash, head);
    assert_eq!(remote.tag.as_deref(), Some("v1.0"));
    assert_eq!(remote.user.as_deref(), Some("tester"));

    let ledger = server_ledger(&shelf);
    assert!(ledger.contains("demo"), "{ledger}");
    assert!(ledger.contains("tester"), "{ledger}");

    let bare = Repository::open(shelf.server_dir().join("demo.git")).unwrap();
    assert!(bare.find_reference("refs/tags/v1.0").is_ok());

    let again = manager.push_to_remote("demo", false).unwrap();
    assert_eq!(again, PushOutcome::UpToDate);
}

#[test]
fn test_push_after_new_commit_advances_tag() {
    let shelf = TestShelf::new();
    shelf.publish_remote_ledger(&[]);
    bare_repo(&shelf.server_dir().join("demo.git"));

    let mut manager = open(&shelf, config(&shelf));
    manager.create_source("demo", SourceMeta::default()).unwrap();
    manager.publish_source("demo").unwrap();

    // Scaffold commit is untagged, so pushing mints v1.0
    let outcome = manager.push_to_remote("demo", true).unwrap();
    assert_eq!(outcome, PushOutcome::Pushed { tag: "v1.0".into() });
    assert_eq!(
        manager.sources().get("demo").unwrap().tag.as_deref(),
        Some("v1.0")
    );

    let data = shelf.layout().source_dir("demo").join("tables/data.csv");
    fs::write(&data, "y\n").unwrap();
    manager
        .add_files("demo", &[PathBuf::from("tables/data.csv")])
        .unwrap();
    manager.commit("more data").unwrap();
    assert_eq!(
        manager.sources().get("demo").unwrap().tag.as_deref(),
        Some("v2.0")
    );

    let outcome = manager.push_to_remote("demo", false).unwrap();
    assert_eq!(outcome, PushOutcome::Pushed { tag: "v2.0".into() });
    assert!(server_ledger(&shelf).contains("v2.0"));
}

#[test]
fn test_pull_refreshes_revision_and_merges_inventory() {
    let shelf = TestShelf::new();
    let author = publish_ext(&shelf);
    let mut manager = open(&shelf, config(&shelf));
    manager.clone_from_remote("ext").unwrap();
    manager.commit("import ext").unwrap();

    let updated = format!(
        "{INVENTORY_HEADER}{}{}",
        inventory_row("0", "GDP", "ext"),
        inventory_row("1", "Population", "ext")
    );
    commit_file(&author, "source_inventory.csv", &updated, "more variables");
    tag_head(&author, "v2.0");
    push_all(&author, "origin");

    let old_path = shelf.scratch("inv").join("inventory.csv");
    fs::write(
        &old_path,
        format!(
            "{INVENTORY_HEADER}{}{}",
            inventory_row("a", "Emissions", "other"),
            inventory_row("0", "GDP", "ext")
        ),
    )
    .unwrap();
    let old = Inventory::load(&old_path).unwrap();

    let merged = manager.pull_from_remote("ext", &old).unwrap();

    let labels: Vec<&str> = merged.rows().iter().map(|r| r[0].as_str()).collect();
    assert_eq!(labels, vec!["a", "0", "1"]);
    assert_eq!(merged.rows_of("ext").count(), 2);

    let record = manager.sources().get("ext").unwrap();
    assert_eq!(record.commit_hash, Some(head_hash(&author)));
    assert_eq!(record.tag.as_deref(), Some("v2.0"));
    assert!(manager.handle("ext").is_ok());
}

#[test]
fn test_available_updates_after_remote_advances() {
    let shelf = TestShelf::new();
    let author = publish_ext(&shelf);
    let mut manager = open(&shelf, config(&shelf));
    manager.clone_from_remote("ext").unwrap();
    assert!(manager.available_remote_updates().is_empty());

    commit_file(&author, "meta.csv", META, "touch");
    tag_head(&author, "v2.0");
    push_all(&author, "origin");
    shelf.publish_remote_ledger(&[
        ("ext", &head_hash(&author), "v2.0", "alice"),
        ("fresh", "", "v1.0", "bob"),
    ]);
    manager.refresh_remote().unwrap();

    let updates = manager.available_remote_updates();
    let new: Vec<&str> = updates.new_sources.iter().map(|s| s.source_id.as_str()).collect();
    assert_eq!(new, vec!["fresh"]);
    assert_eq!(updates.updated_sources.len(), 1);
    assert_eq!(updates.updated_sources[0].local_tag, "v1.0");
    assert_eq!(updates.updated_sources[0].remote_tag, "v2.0");
}

struct AgentAvailable;

impl CredentialProbe for AgentAvailable {
    fn agent_available(&self) -> bool {
        true
    }
}

#[test]
fn test_shutdown_settles_background_poll() {
    let shelf = TestShelf::new();
    publish_ext(&shelf);
    let config = config(&shelf).with_polling(PollMode::Background);

    let manager = RepositoryConsistencyManager::with_parts(
        config,
        Arc::new(GitFactory),
        Box::new(AgentAvailable),
    )
    .unwrap();
    let dispatched = !under_test_harness();
    assert_eq!(manager.scheduler().is_polling(), dispatched);

    manager.shutdown();

    // The poll ran to completion before shutdown returned
    assert_eq!(shelf.layout().remote_ledger().is_file(), dispatched);
    assert_eq!(shelf.layout().last_access_marker().is_file(), dispatched);
}
