//! The remote ledger: which sources exist upstream and at which revision.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shelf_fs::{REMOTE_LEDGER_FIELDS, table};

use crate::Result;

/// One row of `source_states.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub source_id: String,
    /// Last pushed head of the source repository
    pub hash: Option<String>,
    pub tag: Option<String>,
    /// Who pushed the update
    pub user: Option<String>,
}

/// Read-only mirror of the remote ledger.
///
/// Replaced wholesale on every refresh, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteIndex {
    records: Vec<RemoteRecord>,
}

impl RemoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<RemoteRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let records = table::read_rows(path, &REMOTE_LEDGER_FIELDS)?;
        Ok(Self { records })
    }

    /// Load the ledger, treating a missing file as an empty ledger.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        table::write_rows(path, &REMOTE_LEDGER_FIELDS, &self.records)?;
        Ok(())
    }

    pub fn records(&self) -> &[RemoteRecord] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.source_id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.get(source_id).is_some()
    }

    pub fn get(&self, source_id: &str) -> Option<&RemoteRecord> {
        self.records.iter().find(|r| r.source_id == source_id)
    }

    /// Replace the row for `record.source_id`, or append it.
    pub fn upsert(&mut self, record: RemoteRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.source_id == record.source_id)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: &str, tag: &str) -> RemoteRecord {
        RemoteRecord {
            source_id: id.into(),
            hash: Some("0".repeat(40)),
            tag: Some(tag.into()),
            user: Some("bob".into()),
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut index = RemoteIndex::from_records(vec![row("a", "v1.0"), row("b", "v1.0")]);
        index.upsert(row("a", "v2.0"));
        index.upsert(row("c", "v1.0"));

        let ids: Vec<&str> = index.ids().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(index.get("a").unwrap().tag.as_deref(), Some("v2.0"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let index = RemoteIndex::load_or_empty(&dir.path().join("source_states.csv")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source_states.csv");
        let index = RemoteIndex::from_records(vec![row("a", "v3.0")]);

        index.save(&path).unwrap();
        assert_eq!(RemoteIndex::load(&path).unwrap(), index);
    }
}
