//! Tag reconciliation.
//!
//! A tag is *managed* when it starts with `<prefix>-`; every other tag is
//! *foreign* and passes through untouched. All functions here are pure and
//! total: they never fail and perform no I/O.

use std::collections::BTreeSet;
use std::fmt;


/// Delimiter between a configured prefix and a probe value.
pub const DELIMITER: char = '-';

/// Configured managed-tag prefix.
///
/// Holds the prefix together with its trailing delimiter so ownership checks
/// are a single `starts_with`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagPrefix {
    marker: String,
}

impl TagPrefix {
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        let mut marker = String::with_capacity(prefix.len() + 1);
        marker.push_str(prefix);
        marker.push(DELIMITER);
        Self { marker }
    }

    /// The bare prefix, without the delimiter.
    pub fn as_str(&self) -> &str {
        &self.marker[..self.marker.len() - DELIMITER.len_utf8()]
    }

    /// Whether `tag` belongs to this prefix. Purely textual.
    pub fn owns(&self, tag: &str) -> bool {
        tag.starts_with(&self.marker)
    }

    /// Builds the managed tag for a probe value.
    pub fn tag_for(&self, value: &str) -> String {
        let mut tag = String::with_capacity(self.marker.len() + value.len());
        tag.push_str(&self.marker);
        tag.push_str(value);
        tag
    }
}

impl fmt::Display for TagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing the registered tags with a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Managed tags already match the candidate set.
    Unchanged,
    /// The registration must be rewritten with these tags.
    Write(Vec<String>),
}

impl Update {
    pub fn should_write(&self) -> bool {
        matches!(self, Update::Write(_))
    }

    /// Tags to register, or `None` when no write is needed.
    pub fn tags(&self) -> Option<&[String]> {
        match self {
            Update::Unchanged => None,
            Update::Write(tags) => Some(tags),
        }
    }

    pub fn into_tags(self) -> Option<Vec<String>> {
        match self {
            Update::Unchanged => None,
            Update::Write(tags) => Some(tags),
        }
    }
}

/// Splits raw probe output on whitespace runs and maps every value to a
/// managed tag. Duplicate values collapse.
pub fn parse_probe_output(raw: &[u8], prefix: &TagPrefix) -> BTreeSet<String> {
    String::from_utf8_lossy(raw)
        .split_whitespace()
        .map(|value| prefix.tag_for(value))
        .collect()
}

/// Splits `tags` into the managed set and the foreign tags.
///
/// Foreign tags keep their original relative order.
pub fn partition(tags: &[String], prefix: &TagPrefix) -> (BTreeSet<String>, Vec<String>) {
    let mut managed = BTreeSet::new();
    let mut foreign = Vec::new();
    for tag in tags {
        if prefix.owns(tag) {
            managed.insert(tag.clone());
        } else {
            foreign.push(tag.clone());
        }
    }
    (managed, foreign)
}

/// Decides whether the registration needs a rewrite.
///
/// Only managed tags take part in the comparison. When they differ from
/// `candidate` the new tag list is the foreign tags (deduplicated, in their
/// registered order) followed by the candidate tags in sorted order.
pub fn needs_update(current: &[String], candidate: &BTreeSet<String>, prefix: &TagPrefix) -> Update {
    let (managed, foreign) = partition(current, prefix);

    if managed.symmetric_difference(candidate).next().is_none() {
        return Update::Unchanged;
    }

    let mut seen = BTreeSet::new();
    let mut tags = Vec::with_capacity(foreign.len() + candidate.len());
    for tag in foreign.into_iter().chain(candidate.iter().cloned()) {
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    Update::Write(tags)
}
