use serde::Serialize;
use std::collections::HashSet;

use super::ResolvedItem;

/// Titles already shown in a session, in the order they were first seen
///
/// Only ever grows. Membership is exact string equality, so a retitled or
/// translated variant of a shown title is not considered excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a title, returning false if it was already present or blank
    pub fn insert(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if title.trim().is_empty() || self.seen.contains(&title) {
            return false;
        }
        self.seen.insert(title.clone());
        self.ordered.push(title);
        true
    }

    pub fn contains(&self, title: &str) -> bool {
        self.seen.contains(title)
    }

    pub fn titles(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn is_superset_of(&self, other: &ExclusionSet) -> bool {
        other.ordered.iter().all(|t| self.seen.contains(t))
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ExclusionSet::new();
        for title in iter {
            set.insert(title);
        }
        set
    }
}

impl Serialize for ExclusionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ordered.serialize(serializer)
    }
}

/// How a new round is folded into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// First chat turn or quiz completion: the round becomes the whole result
    Replace,
    /// "Show more": the round extends what was already shown
    Append,
}

/// Accumulated state of one interactive recommendation flow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Unique by `catalog_id`, in the order first shown
    pub accumulated_items: Vec<ResolvedItem>,
    pub exclusion_set: ExclusionSet,
    pub rounds: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles to forward as exclusions on the next generator call
    pub fn exclusion_titles(&self) -> Vec<String> {
        self.exclusion_set.titles().to_vec()
    }
}
