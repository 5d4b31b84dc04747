/// Back/forward stacks of visited directories.
#[derive(Debug, Clone, Default)]
pub struct NavHistory {
    back: Vec<String>,
    forward: Vec<String>,
}

impl NavHistory {
    /// Record leaving `from` for a newly chosen directory.
    pub fn visit(&mut self, from: &str) {
        if self.back.last().map(String::as_str) != Some(from) {
            self.back.push(from.to_string());
        }
        self.forward.clear();
    }

    /// Directory to return to; `current` becomes reachable via forward.
    pub fn back(&mut self, current: &str) -> Option<String> {
        let target = self.back.pop()?;
        self.forward.push(current.to_string());
        Some(target)
    }

    pub fn forward(&mut self, current: &str) -> Option<String> {
        let target = self.forward.pop()?;
        self.back.push(current.to_string());
        Some(target)
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_forward_round_trip() {
        let mut h = NavHistory::default();
        h.visit("/");
        h.visit("/docs");
        // current is /docs/2024
        assert_eq!(h.back("/docs/2024").as_deref(), Some("/docs"));
        assert_eq!(h.back("/docs").as_deref(), Some("/"));
        assert!(!h.can_go_back());
        assert_eq!(h.forward("/").as_deref(), Some("/docs"));
        assert!(h.can_go_forward());
    }

    #[test]
    fn visiting_clears_forward_and_collapses_duplicates() {
        let mut h = NavHistory::default();
        h.visit("/");
        h.visit("/");
        h.visit("/a");
        assert_eq!(h.back("/b").as_deref(), Some("/a"));
        h.visit("/a");
        assert!(!h.can_go_forward());
        assert_eq!(h.back("/c").as_deref(), Some("/a"));
        assert_eq!(h.back("/a").as_deref(), Some("/"));
        assert_eq!(h.back("/"), None);
    }
}
