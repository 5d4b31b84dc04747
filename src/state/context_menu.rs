use crate::model::file::FileRecord;

/// What the menu was opened on.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextTarget {
    /// Empty space in the listing of this directory.
    Background(String),
    Single(Box<FileRecord>),
    Multiple(Vec<FileRecord>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    Download,
    Rename,
    MoveTo,
    Cut,
    Paste,
    History,
    Properties,
    Delete,
    NewFolder,
    Upload,
    Refresh,
    SelectAll,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Open => "Open",
            MenuAction::Download => "Download",
            MenuAction::Rename => "Rename",
            MenuAction::MoveTo => "Move to...",
            MenuAction::Cut => "Cut",
            MenuAction::Paste => "Paste",
            MenuAction::History => "History",
            MenuAction::Properties => "Properties",
            MenuAction::Delete => "Delete",
            MenuAction::NewFolder => "New folder",
            MenuAction::Upload => "Upload...",
            MenuAction::Refresh => "Refresh",
            MenuAction::SelectAll => "Select all",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            MenuAction::Open => "Enter",
            MenuAction::Download => "D",
            MenuAction::Rename => "r",
            MenuAction::MoveTo => "M",
            MenuAction::Cut => "x",
            MenuAction::Paste => "p",
            MenuAction::History => "H",
            MenuAction::Properties => "i",
            MenuAction::Delete => "Del",
            MenuAction::NewFolder => "n",
            MenuAction::Upload => "u",
            MenuAction::Refresh => "R",
            MenuAction::SelectAll => "^A",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub target: ContextTarget,
    pub items: Vec<MenuAction>,
    pub index: usize,
    /// Screen cell the menu was opened at.
    pub anchor: (u16, u16),
}

impl ContextMenu {
    pub fn new(target: ContextTarget, clipboard_full: bool, anchor: (u16, u16)) -> Self {
        let items = items_for(&target, clipboard_full);
        Self {
            target,
            items,
            index: 0,
            anchor,
        }
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + self.items.len() - 1) % self.items.len();
        }
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.index = index;
        }
    }

    pub fn activate(&self) -> Option<MenuAction> {
        self.items.get(self.index).copied()
    }

    /// Records the menu acts on; empty for the background menu.
    pub fn records(&self) -> Vec<FileRecord> {
        match &self.target {
            ContextTarget::Background(_) => Vec::new(),
            ContextTarget::Single(rec) => vec![(**rec).clone()],
            ContextTarget::Multiple(recs) => recs.clone(),
        }
    }

    pub fn title(&self) -> String {
        match &self.target {
            ContextTarget::Background(dir) => dir.clone(),
            ContextTarget::Single(rec) => rec.name.clone(),
            ContextTarget::Multiple(recs) => format!("{} items", recs.len()),
        }
    }
}

/// Menu entries for a target. Paste only appears with something to paste.
pub fn items_for(target: &ContextTarget, clipboard_full: bool) -> Vec<MenuAction> {
    use MenuAction::*;
    let mut items = match target {
        ContextTarget::Background(_) => {
            let mut v = vec![NewFolder, Upload];
            if clipboard_full {
                v.push(Paste);
            }
            v.extend([Refresh, SelectAll]);
            return v;
        }
        ContextTarget::Single(rec) if rec.is_dir => {
            let mut v = vec![Open, Download, Rename, MoveTo, Cut];
            if clipboard_full {
                v.push(Paste);
            }
            v.push(History);
            v
        }
        ContextTarget::Single(_) => vec![Download, Rename, MoveTo, Cut, History, Properties],
        ContextTarget::Multiple(_) => vec![Download, MoveTo, Cut],
    };
    items.push(Delete);
    items
}
