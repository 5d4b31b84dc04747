use crate::model::path;

/// Paths cut for a later paste. Pasting moves them; the server has no copy
/// operation.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    paths: Vec<String>,
}

impl Clipboard {
    pub fn cut(&mut self, paths: Vec<String>) {
        let mut paths: Vec<String> = paths.iter().map(|p| path::normalize(p)).collect();
        paths.dedup();
        self.paths = paths;
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.paths.iter().any(|p| p == target)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Forget paths that were deleted or moved away by other operations.
    pub fn forget(&mut self, removed: &[String]) {
        self.paths
            .retain(|p| !removed.iter().any(|r| path::is_same_or_ancestor(r, p)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_normalizes_and_forget_drops_descendants() {
        let mut clip = Clipboard::default();
        clip.cut(vec!["/docs/".into(), "/docs/a.txt".into(), "/music".into()]);
        assert!(clip.contains("/docs"));
        clip.forget(&["/docs".to_string()]);
        assert_eq!(clip.paths(), &["/music".to_string()]);
        clip.clear();
        assert!(clip.is_empty());
    }
}
