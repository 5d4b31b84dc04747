use tui_textarea::{CursorMove, TextArea};

use crate::model::activity::LogEntry;
use crate::model::file::FileRecord;
use crate::model::path;
use crate::state::tree::TreeState;

/// Modal dialogs. At most one is open at a time.
pub enum Dialog {
    Rename {
        target: FileRecord,
        input: TextArea<'static>,
    },
    NewFolder {
        parent: String,
        input: TextArea<'static>,
    },
    /// Local file or directory to upload into `dest`.
    Upload {
        dest: String,
        input: TextArea<'static>,
    },
    /// Local directory to download `records` into.
    Download {
        records: Vec<FileRecord>,
        input: TextArea<'static>,
    },
    /// Destination picker over the sidebar tree.
    Move {
        sources: Vec<FileRecord>,
        picker: TreeState,
    },
    ConfirmDelete {
        targets: Vec<FileRecord>,
    },
    Search {
        dir: String,
        input: TextArea<'static>,
    },
    Properties(Box<FileRecord>),
    /// Activity log; `entries` is None while loading.
    History {
        target: String,
        entries: Option<Result<Vec<LogEntry>, String>>,
        scroll: usize,
    },
}

impl Dialog {
    pub fn title(&self) -> String {
        match self {
            Dialog::Rename { target, .. } => format!(" Rename {} ", target.name),
            Dialog::NewFolder { parent, .. } => format!(" New folder in {} ", parent),
            Dialog::Upload { dest, .. } => format!(" Upload to {} ", dest),
            Dialog::Download { records, .. } => match records.as_slice() {
                [one] => format!(" Download {} ", one.name),
                many => format!(" Download {} items ", many.len()),
            },
            Dialog::Move { sources, .. } => match sources.as_slice() {
                [one] => format!(" Move {} ", one.name),
                many => format!(" Move {} items ", many.len()),
            },
            Dialog::ConfirmDelete { .. } => " Confirm Delete ".to_string(),
            Dialog::Search { dir, .. } => format!(" Search in {} ", dir),
            Dialog::Properties(rec) => format!(" {} ", rec.name),
            Dialog::History { target, .. } => format!(" History: {} ", path::file_name(target)),
        }
    }

    /// Text input of the dialog, if it has one.
    pub fn input_mut(&mut self) -> Option<&mut TextArea<'static>> {
        match self {
            Dialog::Rename { input, .. }
            | Dialog::NewFolder { input, .. }
            | Dialog::Upload { input, .. }
            | Dialog::Download { input, .. }
            | Dialog::Search { input, .. } => Some(input),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn input(&self) -> Option<&TextArea<'static>> {
        match self {
            Dialog::Rename { input, .. }
            | Dialog::NewFolder { input, .. }
            | Dialog::Upload { input, .. }
            | Dialog::Download { input, .. }
            | Dialog::Search { input, .. } => Some(input),
            _ => None,
        }
    }
}

/// Single-line text input prefilled with `initial`, cursor at the end.
pub fn line_input(initial: &str) -> TextArea<'static> {
    let mut input = TextArea::default();
    input.insert_str(initial);
    input.move_cursor(CursorMove::End);
    input
}

/// Current text of a single-line input.
pub fn input_text(input: &TextArea<'_>) -> String {
    input.lines().first().cloned().unwrap_or_default()
}

/// Outcome of checking a proposed file or folder name.
#[derive(Debug, PartialEq)]
pub enum NameCheck {
    Valid(String),
    /// Renaming to the current name; nothing to do.
    Unchanged,
}

/// Check a new name against the other entries of the same directory.
/// `current` is the entry's present name when renaming.
pub fn validate_name(
    raw: &str,
    siblings: &[FileRecord],
    current: Option<&str>,
) -> Result<NameCheck, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("\"{}\" is not a valid name", name));
    }
    if name.contains('/') || name.contains('\\') {
        return Err("Name cannot contain slashes".to_string());
    }
    if name.chars().any(char::is_control) {
        return Err("Name cannot contain control characters".to_string());
    }
    if current == Some(name) {
        return Ok(NameCheck::Unchanged);
    }
    if siblings.iter().any(|s| s.name == name) {
        return Err(format!("\"{}\" already exists", name));
    }
    Ok(NameCheck::Valid(name.to_string()))
}

/// A move is rejected when the destination is one of the sources, lies
/// inside a source directory, or is where every source already lives.
pub fn validate_move(sources: &[FileRecord], destination: &str) -> Result<(), String> {
    if sources.is_empty() {
        return Err("Nothing to move".to_string());
    }
    let destination = path::normalize(destination);
    for src in sources {
        if src.path == destination {
            return Err(format!("Cannot move {} into itself", src.name));
        }
        if src.is_dir && path::is_same_or_ancestor(&src.path, &destination) {
            return Err(format!("Cannot move {} into its own subfolder", src.name));
        }
    }
    if sources
        .iter()
        .all(|s| path::parent(&s.path) == destination)
    {
        return Err("Items are already in that folder".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(p: &str, is_dir: bool) -> FileRecord {
        FileRecord {
            name: path::file_name(p),
            path: p.to_string(),
            size: 0,
            created: None,
            modified: None,
            is_dir,
            is_shortcut: false,
            color: None,
        }
    }

    #[test]
    fn name_rules() {
        let siblings = vec![rec("/docs/a.txt", false), rec("/docs/B", true)];
        assert_eq!(
            validate_name("  new.txt ", &siblings, None),
            Ok(NameCheck::Valid("new.txt".into()))
        );
        assert!(validate_name("   ", &siblings, None).is_err());
        assert!(validate_name("..", &siblings, None).is_err());
        assert!(validate_name("a/b", &siblings, None).is_err());
        assert!(validate_name("a.txt", &siblings, None).is_err());
        // exact-case clash only
        assert!(validate_name("b", &siblings, None).is_ok());
        assert_eq!(
            validate_name("a.txt", &siblings, Some("a.txt")),
            Ok(NameCheck::Unchanged)
        );
    }

    #[test]
    fn move_rules() {
        let docs = rec("/docs", true);
        let file = rec("/docs/a.txt", false);
        assert!(validate_move(&[docs.clone()], "/docs").is_err());
        assert!(validate_move(&[docs.clone()], "/docs/2024").is_err());
        assert!(validate_move(&[docs.clone()], "/docs2").is_ok());
        assert!(validate_move(&[file.clone()], "/docs").is_err());
        assert!(validate_move(&[file.clone(), rec("/b.txt", false)], "/docs").is_ok());
        assert!(validate_move(&[], "/").is_err());
    }

    #[test]
    fn line_input_round_trip() {
        let mut input = line_input("report.pdf");
        input.insert_str("x");
        assert_eq!(input_text(&input), "report.pdfx");
    }
}
