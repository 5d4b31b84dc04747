use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One entry of a file's activity history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(alias = "user")]
    pub actor: String,
    #[serde(alias = "type", alias = "action")]
    pub event: String,
    #[serde(alias = "time", alias = "date")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl LogEntry {
    pub fn event_label(&self) -> String {
        let mut chars = self.event.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Newest entries first.
pub fn sort_newest_first(entries: &mut [LogEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
