use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::path;

/// Directory structure as served by the `filetree` endpoint: a mapping of
/// directory name to subtree. Leaves are empty mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirTree(pub BTreeMap<String, DirTree>);

impl DirTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Children sorted case-insensitively, ties broken by exact name.
    pub fn children(&self) -> Vec<(&String, &DirTree)> {
        let mut children: Vec<(&String, &DirTree)> = self.0.iter().collect();
        children.sort_by(|a, b| {
            a.0.to_lowercase()
                .cmp(&b.0.to_lowercase())
                .then_with(|| a.0.cmp(b.0))
        });
        children
    }

    /// Subtree at a server path; the root path yields `self`.
    pub fn get(&self, target: &str) -> Option<&DirTree> {
        let mut node = self;
        for segment in path::segments(target) {
            node = node.0.get(&segment)?;
        }
        Some(node)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.get(target).is_some()
    }

    /// Total number of directories below this node.
    pub fn count(&self) -> usize {
        self.0.values().map(|child| 1 + child.count()).sum()
    }

    /// Insert a directory (and any missing ancestors).
    #[cfg(test)]
    pub fn insert(&mut self, target: &str) {
        let mut node = self;
        for segment in path::segments(target) {
            node = node.0.entry(segment).or_default();
        }
    }
}
