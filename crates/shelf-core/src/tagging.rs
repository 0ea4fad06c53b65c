//! Monotonic version tags
//!
//! Tags are `v<major>.<minor>` labels ordered by their numeric value. New
//! tags only ever advance the major number; minor versions are never minted.

use std::cmp::Ordering;

use shelf_git::TagInfo;
pub use shelf_git::parse_tag_version;

/// Tag assigned to the first tagged revision of a repository.
pub const FIRST_TAG: &str = "v1.0";

/// Outcome of [`plan_tag_advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPlan {
    /// Head already carries the latest tag; nothing to create
    Reuse(String),
    /// Head is untagged; this tag must be created at head
    Create(String),
}

impl TagPlan {
    pub fn name(&self) -> &str {
        match self {
            Self::Reuse(name) | Self::Create(name) => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            Self::Reuse(name) | Self::Create(name) => name,
        }
    }

    pub fn creates_tag(&self) -> bool {
        matches!(self, Self::Create(_))
    }
}

/// Decide which tag `head` should carry.
///
/// The latest tag is the one on the most recent commit; ties are broken by
/// the numeric version. If that tag already points at `head` it is reused,
/// otherwise the next major version is planned.
pub fn plan_tag_advance(head: &str, tags: &[TagInfo]) -> TagPlan {
    let latest = tags.iter().max_by(|a, b| {
        a.commit_time
            .cmp(&b.commit_time)
            .then_with(|| compare_tags(&a.name, &b.name))
    });

    match latest {
        None => TagPlan::Create(FIRST_TAG.to_string()),
        Some(tag) if tag.commit == head => TagPlan::Reuse(tag.name.clone()),
        Some(tag) => TagPlan::Create(next_major_tag(&tag.name)),
    }
}

/// `v<N+1>.0` where `N` is the integer part of `latest`'s version.
///
/// An unparsable tag counts as version 0.
pub fn next_major_tag(latest: &str) -> String {
    let major = parse_tag_version(latest).unwrap_or(0.0).trunc() as u64;
    format!("v{}.0", major + 1)
}

/// Numeric ordering of tag names; unparsable names sort first.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    match (parse_tag_version(a), parse_tag_version(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
