use std::collections::HashSet;

use crate::model::path;
use crate::model::tree::DirTree;

/// One visible line of the sidebar tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Sidebar directory tree: the fetched structure, which nodes are open and
/// which row has the cursor. The root row is always visible and expanded.
#[derive(Debug, Clone)]
pub struct TreeState {
    tree: DirTree,
    expanded: HashSet<String>,
    rows: Vec<TreeRow>,
    cursor: usize,
    loaded: bool,
}

impl Default for TreeState {
    fn default() -> Self {
        let mut state = Self {
            tree: DirTree::new(),
            expanded: HashSet::new(),
            rows: Vec::new(),
            cursor: 0,
            loaded: false,
        };
        state.rebuild();
        state
    }
}

impl TreeState {
    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn tree(&self) -> &DirTree {
        &self.tree
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_path(&self) -> Option<&str> {
        self.rows.get(self.cursor).map(|r| r.path.as_str())
    }

    #[cfg(test)]
    pub fn is_expanded(&self, dir: &str) -> bool {
        path::is_root(dir) || self.expanded.contains(&path::normalize(dir))
    }

    /// Swap in a freshly fetched tree. Expanded paths that vanished are
    /// forgotten and the cursor stays on its path when it still exists.
    pub fn replace(&mut self, tree: DirTree) {
        let cursor_path = self.cursor_path().map(String::from);
        self.tree = tree;
        self.loaded = true;
        let tree = &self.tree;
        self.expanded.retain(|p| tree.contains(p));
        self.rebuild();
        match cursor_path.and_then(|p| self.position(&p)) {
            Some(idx) => self.cursor = idx,
            None => self.cursor = self.cursor.min(self.rows.len().saturating_sub(1)),
        }
    }

    pub fn toggle(&mut self, dir: &str) {
        let dir = path::normalize(dir);
        if path::is_root(&dir) {
            return;
        }
        if !self.expanded.remove(&dir) {
            self.expanded.insert(dir);
        }
        self.rebuild_keep_cursor();
    }

    pub fn expand(&mut self, dir: &str) {
        let dir = path::normalize(dir);
        if !path::is_root(&dir) && self.expanded.insert(dir) {
            self.rebuild_keep_cursor();
        }
    }

    pub fn collapse(&mut self, dir: &str) {
        if self.expanded.remove(&path::normalize(dir)) {
            self.rebuild_keep_cursor();
        }
    }

    /// Expand every ancestor of `dir` and put the cursor on it. Returns
    /// false when the tree doesn't know the directory.
    pub fn reveal(&mut self, dir: &str) -> bool {
        let dir = path::normalize(dir);
        if !self.tree.contains(&dir) {
            return false;
        }
        for ancestor in path::ancestors(&dir) {
            if !path::is_root(&ancestor) {
                self.expanded.insert(ancestor);
            }
        }
        self.rebuild();
        if let Some(idx) = self.position(&dir) {
            self.cursor = idx;
        }
        true
    }

    /// Collapse the cursor row when it is open, otherwise move to its parent.
    pub fn collapse_or_parent(&mut self) {
        let Some(row) = self.rows.get(self.cursor).cloned() else {
            return;
        };
        if row.expanded && row.depth > 0 {
            self.collapse(&row.path);
        } else if row.depth > 0 {
            if let Some(idx) = self.position(&path::parent(&row.path)) {
                self.cursor = idx;
            }
        }
    }

    /// Open the cursor row, or step into its first child when already open.
    pub fn expand_or_child(&mut self) {
        let Some(row) = self.rows.get(self.cursor).cloned() else {
            return;
        };
        if !row.has_children {
            return;
        }
        if row.expanded {
            self.cursor = (self.cursor + 1).min(self.rows.len().saturating_sub(1));
        } else {
            self.expand(&row.path);
        }
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if !self.rows.is_empty() {
            self.cursor = (self.cursor + 1).min(self.rows.len() - 1);
        }
    }

    pub fn top(&mut self) {
        self.cursor = 0;
    }

    pub fn bottom(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    pub fn set_cursor(&mut self, idx: usize) {
        self.cursor = idx.min(self.rows.len().saturating_sub(1));
    }

    pub fn position(&self, dir: &str) -> Option<usize> {
        let dir = path::normalize(dir);
        self.rows.iter().position(|r| r.path == dir)
    }

    fn rebuild_keep_cursor(&mut self) {
        let cursor_path = self.cursor_path().map(String::from);
        self.rebuild();
        if let Some(idx) = cursor_path.and_then(|p| self.position(&p)) {
            self.cursor = idx;
        } else {
            self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
        }
    }

    fn rebuild(&mut self) {
        let mut rows = vec![TreeRow {
            path: path::ROOT.to_string(),
            name: path::ROOT.to_string(),
            depth: 0,
            has_children: !self.tree.is_empty(),
            expanded: true,
        }];
        flatten(&self.tree, path::ROOT, 1, &self.expanded, &mut rows);
        self.rows = rows;
    }
}

fn flatten(
    node: &DirTree,
    dir: &str,
    depth: usize,
    expanded: &HashSet<String>,
    rows: &mut Vec<TreeRow>,
) {
    for (name, child) in node.children() {
        let child_path = path::join(dir, name);
        let is_open = expanded.contains(&child_path);
        rows.push(TreeRow {
            path: child_path.clone(),
            name: name.clone(),
            depth,
            has_children: !child.is_empty(),
            expanded: is_open,
        });
        if is_open {
            flatten(child, &child_path, depth + 1, expanded, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(json: &str) -> DirTree {
        serde_json::from_str(json).unwrap()
    }

    fn paths(state: &TreeState) -> Vec<&str> {
        state.rows().iter().map(|r| r.path.as_str()).collect()
    }

    fn loaded() -> TreeState {
        let mut state = TreeState::default();
        state.replace(tree(
            r#"{"docs": {"2024": {"q1": {}}, "archive": {}}, "music": {}}"#,
        ));
        state
    }

    #[test]
    fn empty_state_shows_root_only() {
        let state = TreeState::default();
        assert_eq!(paths(&state), vec!["/"]);
        assert!(!state.is_loaded());
    }

    #[test]
    fn only_expanded_nodes_show_children() {
        let mut state = loaded();
        assert_eq!(paths(&state), vec!["/", "/docs", "/music"]);
        state.toggle("/docs");
        assert_eq!(paths(&state), vec!["/", "/docs", "/docs/2024", "/docs/archive", "/music"]);
        assert_eq!(state.rows()[2].depth, 2);
        assert!(state.rows()[2].has_children);
        state.toggle("/docs");
        assert_eq!(paths(&state), vec!["/", "/docs", "/music"]);
    }

    #[test]
    fn reveal_expands_ancestors() {
        let mut state = loaded();
        assert!(state.reveal("/docs/2024/q1"));
        assert_eq!(state.cursor_path(), Some("/docs/2024/q1"));
        assert!(state.is_expanded("/docs"));
        assert!(state.is_expanded("/docs/2024"));
        assert!(!state.reveal("/nope"));
    }

    #[test]
    fn replace_prunes_vanished_paths_and_keeps_cursor() {
        let mut state = loaded();
        state.reveal("/docs/archive");
        state.expand("/docs/2024");
        state.replace(tree(r#"{"docs": {"archive": {}}, "music": {}, "a": {}}"#));
        assert!(!state.is_expanded("/docs/2024"));
        assert_eq!(state.cursor_path(), Some("/docs/archive"));
        assert_eq!(paths(&state), vec!["/", "/a", "/docs", "/docs/archive", "/music"]);
    }

    #[test]
    fn replace_clamps_cursor_when_path_vanishes() {
        let mut state = loaded();
        state.bottom();
        assert_eq!(state.cursor_path(), Some("/music"));
        state.replace(tree(r#"{"docs": {}}"#));
        assert_eq!(state.cursor_path(), Some("/docs"));
    }

    #[test]
    fn collapse_or_parent_walks_up() {
        let mut state = loaded();
        state.reveal("/docs/2024");
        state.expand("/docs/2024");
        state.collapse_or_parent();
        assert!(!state.is_expanded("/docs/2024"));
        assert_eq!(state.cursor_path(), Some("/docs/2024"));
        state.collapse_or_parent();
        assert_eq!(state.cursor_path(), Some("/docs"));
        state.top();
        state.collapse_or_parent();
        assert_eq!(state.cursor_path(), Some("/"));
    }

    #[test]
    fn expand_or_child_steps_in() {
        let mut state = loaded();
        state.set_cursor(1);
        state.expand_or_child();
        assert!(state.is_expanded("/docs"));
        state.expand_or_child();
        assert_eq!(state.cursor_path(), Some("/docs/2024"));
    }
}
