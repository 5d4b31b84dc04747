use chrono::{DateTime, Utc};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// A file or directory as reported by the server's `list` and `search`
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, alias = "createdAt")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, alias = "modifiedAt")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, alias = "isDir", alias = "is_directory")]
    pub is_dir: bool,
    #[serde(default, alias = "isShortcut")]
    pub is_shortcut: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl FileRecord {
    /// Record for a directory known only by its path, such as a tree node
    /// or a clipboard entry.
    pub fn directory(dir: &str) -> Self {
        let dir = crate::model::path::normalize(dir);
        Self {
            name: crate::model::path::file_name(&dir),
            path: dir,
            size: 0,
            created: None,
            modified: None,
            is_dir: true,
            is_shortcut: false,
            color: None,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        if self.is_dir {
            return None;
        }
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Color metadata as a terminal color. Only `#rrggbb` is understood.
    pub fn display_color(&self) -> Option<Color> {
        let hex = self.color.as_deref()?.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    }

    pub fn kind_label(&self) -> &'static str {
        match (self.is_dir, self.is_shortcut) {
            (true, true) => "Folder shortcut",
            (true, false) => "Folder",
            (false, true) => "Shortcut",
            (false, false) => "File",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            path: format!("/{}", name),
            size: 0,
            created: None,
            modified: None,
            is_dir: false,
            is_shortcut: false,
            color: None,
        }
    }

    #[test]
    fn deserializes_server_json_with_camel_case_fields() {
        let json = r##"{
            "name": "report.pdf",
            "path": "/docs/report.pdf",
            "size": 2048,
            "createdAt": "2024-03-01T10:00:00Z",
            "modifiedAt": "2024-03-02T11:30:00Z",
            "isDir": false,
            "color": "#ff8800"
        }"##;
        let rec: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.size, 2048);
        assert!(!rec.is_shortcut);
        assert_eq!(rec.modified.unwrap().to_rfc3339(), "2024-03-02T11:30:00+00:00");
        assert_eq!(rec.display_color(), Some(Color::Rgb(0xff, 0x88, 0x00)));
    }

    #[test]
    fn extension_ignores_dotfiles_and_directories() {
        assert_eq!(record("a.tar.gz").extension(), Some("gz"));
        assert_eq!(record(".bashrc").extension(), None);
        assert_eq!(record("Makefile").extension(), None);
        let mut dir = record("photos.old");
        dir.is_dir = true;
        assert_eq!(dir.extension(), None);
    }

    #[test]
    fn invalid_color_metadata_is_ignored() {
        let mut rec = record("x");
        rec.color = Some("red".into());
        assert_eq!(rec.display_color(), None);
        rec.color = Some("#12345g".into());
        assert_eq!(rec.display_color(), None);
    }
}
