//! Divergence between the local source index and the remote ledger.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ledger::{RemoteIndex, SourceIndex};
use crate::tagging::parse_tag_version;

/// Source ids that differ between local and remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteDiff {
    /// Remote sources missing locally
    pub new_items: BTreeSet<String>,
    /// Sources whose remote tag is numerically ahead of the local one
    pub updated_items: BTreeSet<String>,
}

impl RemoteDiff {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty() && self.updated_items.is_empty()
    }
}

/// Compare local and remote ledgers.
///
/// Sources without a tag on either side are never reported as updated.
pub fn diff(local: &SourceIndex, remote: &RemoteIndex) -> RemoteDiff {
    let mut result = RemoteDiff::default();

    for record in remote.records() {
        let Some(local_record) = local.get(&record.source_id) else {
            result.new_items.insert(record.source_id.clone());
            continue;
        };

        let local_version = local_record.tag.as_deref().and_then(parse_tag_version);
        let remote_version = record.tag.as_deref().and_then(parse_tag_version);
        if let (Some(local_version), Some(remote_version)) = (local_version, remote_version)
            && local_version < remote_version
        {
            result.updated_items.insert(record.source_id.clone());
        }
    }
    result
}

/// A remote source not present locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSource {
    pub source_id: String,
    pub tag: Option<String>,
    /// Last user to push it
    pub user: Option<String>,
}

/// A local source with a newer remote version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedSource {
    pub source_id: String,
    pub local_tag: String,
    pub remote_tag: String,
    pub user: Option<String>,
}

/// Detailed form of [`RemoteDiff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteUpdates {
    pub new_sources: Vec<NewSource>,
    pub updated_sources: Vec<UpdatedSource>,
}

impl RemoteUpdates {
    pub fn is_empty(&self) -> bool {
        self.new_sources.is_empty() && self.updated_sources.is_empty()
    }
}

/// Resolve a [`RemoteDiff`] into per-source details.
pub fn describe(local: &SourceIndex, remote: &RemoteIndex) -> RemoteUpdates {
    let summary = diff(local, remote);

    let new_sources = summary
        .new_items
        .iter()
        .filter_map(|id| remote.get(id))
        .map(|r| NewSource {
            source_id: r.source_id.clone(),
            tag: r.tag.clone(),
            user: r.user.clone(),
        })
        .collect();

    let updated_sources = summary
        .updated_items
        .iter()
        .filter_map(|id| {
            let local_tag = local.get(id)?.tag.clone()?;
            let remote = remote.get(id)?;
            Some(UpdatedSource {
                source_id: id.clone(),
                local_tag,
                remote_tag: remote.tag.clone()?,
                user: remote.user.clone(),
            })
        })
        .collect();

    RemoteUpdates {
        new_sources,
        updated_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{RemoteRecord, SourceMeta, SourceRecord};
    use pretty_assertions::assert_eq;

    fn local(entries: &[(&str, Option<&str>)]) -> SourceIndex {
        let mut index = SourceIndex::new();
        for (id, tag) in entries {
            index
                .insert(SourceRecord::from_meta(*id, SourceMeta::default()))
                .unwrap();
            index.set_tag(id, tag.map(str::to_string)).unwrap();
        }
        index
    }

    fn remote(entries: &[(&str, Option<&str>)]) -> RemoteIndex {
        RemoteIndex::from_records(
            entries
                .iter()
                .map(|(id, tag)| RemoteRecord {
                    source_id: id.to_string(),
                    hash: None,
                    tag: tag.map(str::to_string),
                    user: Some("carol".into()),
                })
                .collect(),
        )
    }

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_and_updated_items() {
        let local = local(&[("A", Some("v1.0")), ("B", Some("v2.0"))]);
        let remote = remote(&[("A", Some("v1.0")), ("B", Some("v3.0")), ("C", Some("v1.0"))]);

        let result = diff(&local, &remote);
        assert_eq!(result.new_items, ids(&["C"]));
        assert_eq!(result.updated_items, ids(&["B"]));
    }

    #[test]
    fn missing_tags_are_never_updates() {
        let local = local(&[("A", None), ("B", Some("v1.0")), ("C", Some("v5.0"))]);
        let remote = remote(&[("A", Some("v3.0")), ("B", None), ("C", Some("v2.0"))]);

        let result = diff(&local, &remote);
        assert!(result.is_empty(), "{result:?}");
    }

    #[test]
    fn comparison_is_numeric() {
        let local = local(&[("A", Some("v2.0"))]);
        let remote = remote(&[("A", Some("v10.0"))]);
        assert_eq!(diff(&local, &remote).updated_items, ids(&["A"]));
    }

    #[test]
    fn describe_carries_tags_and_user() {
        let local = local(&[("B", Some("v2.0"))]);
        let remote = remote(&[("B", Some("v3.0")), ("C", Some("v1.0"))]);

        let updates = describe(&local, &remote);
        assert_eq!(
            updates.new_sources,
            vec![NewSource {
                source_id: "C".into(),
                tag: Some("v1.0".into()),
                user: Some("carol".into()),
            }]
        );
        assert_eq!(
            updates.updated_sources,
            vec![UpdatedSource {
                source_id: "B".into(),
                local_tag: "v2.0".into(),
                remote_tag: "v3.0".into(),
                user: Some("carol".into()),
            }]
        );
    }
}
