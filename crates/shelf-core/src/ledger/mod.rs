//! Ledgers: the authoritative local source index and the remote mirror
//!
//! The [`SourceIndex`] maps every source id to its provenance and the
//! revision its repository is expected to be at. It is persisted as the
//! sources ledger CSV, which is itself tracked by the main repository.
//! Row order is preserved; it is the order in which sources are validated.

mod record;
mod remote;

pub use record::{META_KEYS, SourceMeta, SourceRecord, validate_source_id};
pub use remote::{RemoteIndex, RemoteRecord};

use std::path::Path;

use shelf_fs::{SOURCE_META_FIELDS, table};

use crate::{Error, Result};

/// Ordered mapping `source_id -> SourceRecord`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIndex {
    records: Vec<SourceRecord>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, its columns differ from
    /// [`SOURCE_META_FIELDS`], or a source id appears twice.
    pub fn load(path: &Path) -> Result<Self> {
        let rows: Vec<SourceRecord> = table::read_rows(path, &SOURCE_META_FIELDS)?;
        let mut index = Self::new();
        for row in rows {
            if index.contains(&row.source_id) {
                return Err(Error::SourceExists(row.source_id));
            }
            index.records.push(row);
        }
        Ok(index)
    }

    /// Write the ledger file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        table::write_rows(path, &SOURCE_META_FIELDS, &self.records)?;
        Ok(())
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// Source ids in ledger order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.source_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.get(source_id).is_some()
    }

    pub fn get(&self, source_id: &str) -> Option<&SourceRecord> {
        self.records.iter().find(|r| r.source_id == source_id)
    }

    pub fn get_mut(&mut self, source_id: &str) -> Option<&mut SourceRecord> {
        self.records.iter_mut().find(|r| r.source_id == source_id)
    }

    /// Append a new source.
    ///
    /// # Errors
    ///
    /// Fails if the id is invalid, reserved, or already present.
    pub fn insert(&mut self, record: SourceRecord) -> Result<()> {
        validate_source_id(&record.source_id)?;
        if self.contains(&record.source_id) {
            return Err(Error::SourceExists(record.source_id));
        }
        self.records.push(record);
        Ok(())
    }

    /// Set the revision of a source.
    ///
    /// Returns `true` when the commit hash changed, which invalidates any
    /// earlier validation of that source.
    pub fn set_revision(
        &mut self,
        source_id: &str,
        commit_hash: Option<String>,
        tag: Option<String>,
    ) -> Result<bool> {
        let record = self
            .get_mut(source_id)
            .ok_or_else(|| Error::UnknownSource(source_id.to_string()))?;
        let hash_changed = record.commit_hash != commit_hash;
        record.commit_hash = commit_hash;
        record.tag = tag;
        Ok(hash_changed)
    }

    /// Set only the tag of a source.
    pub fn set_tag(&mut self, source_id: &str, tag: Option<String>) -> Result<()> {
        let record = self
            .get_mut(source_id)
            .ok_or_else(|| Error::UnknownSource(source_id.to_string()))?;
        record.tag = tag;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn record(id: &str) -> SourceRecord {
        SourceRecord::from_meta(id, SourceMeta::default())
    }

    #[test]
    fn index_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sources.csv");

        let mut index = SourceIndex::new();
        index.insert(record("b_source")).unwrap();
        index.insert(record("a_source")).unwrap();
        index
            .set_revision("b_source", Some("a".repeat(40)), Some("v1.0".into()))
            .unwrap();
        index.save(&path).unwrap();

        let loaded = SourceIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec!["b_source", "a_source"]);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with(
            "SOURCE_ID,collected_by,date,source_url,licence,git_commit_hash,tag\n"
        ));
    }

    #[test]
    fn insert_rejects_duplicates_and_main() {
        let mut index = SourceIndex::new();
        index.insert(record("demo")).unwrap();

        assert!(matches!(
            index.insert(record("demo")),
            Err(Error::SourceExists(_))
        ));
        assert!(matches!(
            index.insert(record("main")),
            Err(Error::ReservedSourceId(_))
        ));
    }

    #[test]
    fn set_revision_reports_hash_change() {
        let mut index = SourceIndex::new();
        index.insert(record("demo")).unwrap();

        let hash = Some("f".repeat(40));
        assert!(index.set_revision("demo", hash.clone(), None).unwrap());
        assert!(!index
            .set_revision("demo", hash, Some("v1.0".into()))
            .unwrap());
        assert!(matches!(
            index.set_revision("nope", None, None),
            Err(Error::UnknownSource(_))
        ));
    }

    #[test]
    fn load_rejects_duplicate_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sources.csv");
        std::fs::write(
            &path,
            concat!(
                "SOURCE_ID,collected_by,date,source_url,licence,git_commit_hash,tag\n",
                "demo,,,,,,\n",
                "demo,,,,,,\n",
            ),
        )
        .unwrap();

        assert!(matches!(
            SourceIndex::load(&path),
            Err(Error::SourceExists(_))
        ));
    }
}
