//! Ledger rows and per-source metadata.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shelf_fs::{MAIN_REPO_ID, table};

use crate::{Error, Result};

static SOURCE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("source id pattern is valid")
});

/// Metadata keys every `meta.csv` must carry, in file order.
pub const META_KEYS: [&str; 4] = ["collected_by", "date", "source_url", "licence"];

/// Keys tolerated in `meta.csv` but not part of the metadata itself.
const DERIVED_KEYS: [&str; 3] = ["SOURCE_ID", "git_commit_hash", "tag"];

/// Check that `id` can name a source directory and repository.
pub fn validate_source_id(id: &str) -> Result<()> {
    if id == MAIN_REPO_ID {
        return Err(Error::ReservedSourceId(id.to_string()));
    }
    if !SOURCE_ID_PATTERN.is_match(id) {
        return Err(Error::InvalidSourceId(id.to_string()));
    }
    Ok(())
}

/// One row of the sources ledger.
///
/// Field order is the column order of the ledger file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "SOURCE_ID")]
    pub source_id: String,
    pub collected_by: Option<String>,
    pub date: Option<String>,
    pub source_url: Option<String>,
    #[serde(rename = "licence")]
    pub license: Option<String>,
    /// Head commit of the source repository once it has been committed
    #[serde(rename = "git_commit_hash")]
    pub commit_hash: Option<String>,
    /// Version tag whose commit equals `commit_hash`
    pub tag: Option<String>,
}

impl SourceRecord {
    /// Record with the given provenance and no revision yet.
    pub fn from_meta(source_id: impl Into<String>, meta: SourceMeta) -> Self {
        Self {
            source_id: source_id.into(),
            collected_by: meta.collected_by,
            date: meta.date,
            source_url: meta.source_url,
            license: meta.license,
            commit_hash: None,
            tag: None,
        }
    }

    pub fn meta(&self) -> SourceMeta {
        SourceMeta {
            collected_by: self.collected_by.clone(),
            date: self.date.clone(),
            source_url: self.source_url.clone(),
            license: self.license.clone(),
        }
    }
}

/// Provenance of a source, as stored in its own `meta.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub collected_by: Option<String>,
    pub date: Option<String>,
    pub source_url: Option<String>,
    pub license: Option<String>,
}

impl SourceMeta {
    /// Parse a key/value `meta.csv`.
    ///
    /// Every key in [`META_KEYS`] must be present exactly once. The ledger
    /// columns `SOURCE_ID`, `git_commit_hash` and `tag` are tolerated and
    /// ignored; any other key is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let pairs = table::read_key_values(path)?;
        let schema_error = |message: String| Error::MetaSchema {
            path: path.to_path_buf(),
            message,
        };

        let mut seen = BTreeSet::new();
        let mut meta = SourceMeta::default();
        for (key, value) in pairs {
            if !seen.insert(key.clone()) {
                return Err(schema_error(format!("duplicate key '{key}'")));
            }
            let value = (!value.is_empty()).then_some(value);
            match key.as_str() {
                "collected_by" => meta.collected_by = value,
                "date" => meta.date = value,
                "source_url" => meta.source_url = value,
                "licence" => meta.license = value,
                k if DERIVED_KEYS.contains(&k) => {}
                other => return Err(schema_error(format!("unknown key '{other}'"))),
            }
        }

        let missing: Vec<&str> = META_KEYS
            .iter()
            .copied()
            .filter(|k| !seen.contains(*k))
            .collect();
        if !missing.is_empty() {
            return Err(schema_error(format!("missing keys: {}", missing.join(", "))));
        }
        Ok(meta)
    }

    /// Write every metadata key, empty values included.
    pub fn save(&self, path: &Path) -> Result<()> {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        let pairs = [
            (META_KEYS[0], value(&self.collected_by)),
            (META_KEYS[1], value(&self.date)),
            (META_KEYS[2], value(&self.source_url)),
            (META_KEYS[3], value(&self.license)),
        ];
        table::write_key_values(path, &pairs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("demo", true)]
    #[case("IEA_WEB_2023", true)]
    #[case("owid-co2.v2", true)]
    #[case("", false)]
    #[case("../escape", false)]
    #[case("with space", false)]
    #[case("-leading", false)]
    fn source_id_pattern(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(validate_source_id(id).is_ok(), valid, "id {id:?}");
    }

    #[test]
    fn main_is_reserved() {
        assert!(matches!(
            validate_source_id("main"),
            Err(Error::ReservedSourceId(_))
        ));
    }

    #[test]
    fn meta_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meta.csv");
        let meta = SourceMeta {
            collected_by: Some("alice".into()),
            date: Some("2024-03-19".into()),
            source_url: None,
            license: Some("CC-BY-4.0".into()),
        };

        meta.save(&path).unwrap();
        assert_eq!(SourceMeta::load(&path).unwrap(), meta);
    }

    #[test]
    fn meta_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meta.csv");
        std::fs::write(
            &path,
            "collected_by,a\ndate,\nsource_url,\nlicence,\ncolour,blue\n",
        )
        .unwrap();

        let err = SourceMeta::load(&path).unwrap_err();
        assert!(err.to_string().contains("colour"), "got {err}");
    }

    #[test]
    fn meta_rejects_missing_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meta.csv");
        std::fs::write(&path, "collected_by,a\ndate,\n").unwrap();

        let err = SourceMeta::load(&path).unwrap_err();
        assert!(err.to_string().contains("source_url"), "got {err}");
    }

    #[test]
    fn meta_tolerates_ledger_columns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meta.csv");
        std::fs::write(
            &path,
            "SOURCE_ID,demo\ncollected_by,a\ndate,\nsource_url,\nlicence,\ntag,v1.0\n",
        )
        .unwrap();

        let meta = SourceMeta::load(&path).unwrap();
        assert_eq!(meta.collected_by.as_deref(), Some("a"));
    }
}
