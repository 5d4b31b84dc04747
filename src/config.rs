use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::state::sort::{SortKey, SortOrder};

/// Home directory from the environment.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// How often the tick event fires (ms).
pub const TICK_RATE_MS: u64 = 250;

/// Request timeout (s).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Disk usage refresh interval (s).
pub const DISK_POLL_SECS: u64 = 60;

/// Push channel reconnect backoff bounds (s).
pub const PUSH_BACKOFF_MIN_SECS: u64 = 1;
pub const PUSH_BACKOFF_MAX_SECS: u64 = 30;

/// Two clicks on the same row within this window open it (ms).
pub const DOUBLE_CLICK_MS: u64 = 400;

pub const ENV_CONFIG: &str = "FILEDECK_CONFIG";
pub const ENV_SERVER: &str = "FILEDECK_SERVER";
pub const ENV_LOG: &str = "FILEDECK_LOG";

// ---------------------------------------------------------------------------
// Config file (config.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub display: Option<DisplayConfig>,
    pub transfer: Option<TransferConfig>,
    /// Set from the CLI or environment; never read from the file.
    #[serde(skip)]
    pub server_override: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Listen on the server's push channel for tree updates.
    pub push: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    pub tick_rate: Option<u64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub show_hidden: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TransferConfig {
    pub download_dir: Option<String>,
}

impl Config {
    pub fn server_url(&self) -> &str {
        self.server_override
            .as_deref()
            .or_else(|| self.server.as_ref().and_then(|s| s.url.as_deref()))
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.server
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or(REQUEST_TIMEOUT_SECS)
    }

    pub fn push_enabled(&self) -> bool {
        self.server.as_ref().and_then(|s| s.push).unwrap_or(true)
    }

    pub fn tick_rate(&self) -> u64 {
        self.display
            .as_ref()
            .and_then(|d| d.tick_rate)
            .filter(|t| *t > 0)
            .unwrap_or(TICK_RATE_MS)
    }

    /// Unknown values fall back to name order.
    pub fn sort_key(&self) -> SortKey {
        self.display
            .as_ref()
            .and_then(|d| d.sort.as_deref())
            .and_then(SortKey::parse)
            .unwrap_or_default()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.display
            .as_ref()
            .and_then(|d| d.order.as_deref())
            .and_then(SortOrder::parse)
            .unwrap_or_default()
    }

    pub fn show_hidden(&self) -> bool {
        self.display
            .as_ref()
            .and_then(|d| d.show_hidden)
            .unwrap_or(false)
    }

    /// Where downloads land: configured directory, ~/Downloads, then cwd.
    pub fn download_dir(&self) -> PathBuf {
        if let Some(dir) = self
            .transfer
            .as_ref()
            .and_then(|t| t.download_dir.as_deref())
        {
            return crate::data::transfer::expand_home(dir);
        }
        home_dir()
            .map(|h| h.join("Downloads"))
            .filter(|p| p.is_dir())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Candidate config files, most specific first.
pub fn config_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
        return paths;
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        if !p.is_empty() {
            paths.push(PathBuf::from(p));
        }
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            paths.push(PathBuf::from(xdg).join("filedeck").join("config.toml"));
        }
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("filedeck").join("config.toml"));
        paths.push(home.join(".filedeck.toml"));
    }
    paths
}

/// Load the first config file that exists. Returns default config if none
/// exists or the file can't be parsed.
pub fn load_config(explicit: Option<&Path>) -> Config {
    for path in config_candidates(explicit) {
        if !path.exists() {
            continue;
        }
        return match parse_config_file(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring config {}: {}", path.display(), e);
                Config::default()
            }
        };
    }
    Config::default()
}

fn parse_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
