use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::{PUSH_BACKOFF_MAX_SECS, PUSH_BACKOFF_MIN_SECS};
use crate::event::{AppEvent, ServerChange};
use crate::model::path;
use crate::model::tree::DirTree;

/// Keeps the push connection alive. Dropping it stops reconnecting; a read
/// already blocked on the socket ends with the process.
pub struct PushWatcher {
    stop: Arc<AtomicBool>,
}

impl Drop for PushWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Start reading the server's event stream at `events_url`, sending
/// ServerChanged events to the given sender.
pub fn start_watcher(events_url: String, tx: mpsc::Sender<AppEvent>) -> Result<PushWatcher> {
    // The stream stays open indefinitely, so no overall request timeout.
    let http = reqwest::blocking::Client::builder()
        .timeout(None)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("filedeck/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build push client")?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    thread::Builder::new()
        .name("push-watcher".into())
        .spawn(move || {
            let mut backoff = PUSH_BACKOFF_MIN_SECS;
            while !stop_flag.load(Ordering::Relaxed) {
                match stream_events(&http, &events_url, &tx, &stop_flag) {
                    Ok(true) => backoff = PUSH_BACKOFF_MIN_SECS,
                    Ok(false) => {}
                    Err(e) => log::warn!("push channel error: {:#}", e),
                }
                if tx.send(AppEvent::PushStatus(false)).is_err() {
                    return;
                }
                if stop_flag.load(Ordering::Relaxed) {
                    return;
                }
                log::info!("push channel reconnecting in {}s", backoff);
                thread::sleep(Duration::from_secs(backoff));
                backoff = next_backoff(backoff);
            }
        })
        .context("failed to spawn push watcher")?;

    Ok(PushWatcher { stop })
}

/// Read one connection until it closes. Returns whether any event arrived,
/// which resets the reconnect backoff.
fn stream_events(
    http: &reqwest::blocking::Client,
    url: &str,
    tx: &mpsc::Sender<AppEvent>,
    stop: &AtomicBool,
) -> Result<bool> {
    let response = http
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()?
        .error_for_status()?;
    log::info!("push channel connected to {}", url);
    if tx.send(AppEvent::PushStatus(true)).is_err() {
        return Ok(false);
    }

    let mut received = false;
    for line in BufReader::new(response).lines() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let line = line?;
        received = true;
        if let Some(change) = classify_event(&line) {
            log::debug!("push event: {:?}", change);
            if tx.send(AppEvent::ServerChanged(change)).is_err() {
                break;
            }
        }
    }
    Ok(received)
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(PUSH_BACKOFF_MAX_SECS)
}

#[derive(Deserialize)]
struct PushMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    tree: Option<DirTree>,
    #[serde(default)]
    path: Option<String>,
}

/// Classify a single line of the event stream. Only `data:` lines carry
/// payloads; comments, `event:`/`id:` fields and unknown types are ignored.
fn classify_event(line: &str) -> Option<ServerChange> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    let msg: PushMessage = match serde_json::from_str(payload) {
        Ok(msg) => msg,
        Err(e) => {
            log::debug!("ignoring malformed push payload: {}", e);
            return None;
        }
    };

    match msg.kind.as_str() {
        "tree" => Some(match msg.tree {
            Some(tree) => ServerChange::Tree(tree),
            None => ServerChange::TreeStale,
        }),
        "tree_updated" => Some(ServerChange::TreeStale),
        "changed" => msg.path.map(|p| ServerChange::Changed(path::normalize(&p))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tree_messages() {
        assert_eq!(
            classify_event(r#"data: {"type":"tree"}"#),
            Some(ServerChange::TreeStale)
        );
        assert_eq!(
            classify_event(r#"data:{"type":"tree_updated"}"#),
            Some(ServerChange::TreeStale)
        );
        match classify_event(r#"data: {"type":"tree","tree":{"docs":{}}}"#) {
            Some(ServerChange::Tree(tree)) => assert!(tree.contains("/docs")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn classifies_changed_with_normalized_path() {
        assert_eq!(
            classify_event(r#"data: {"type":"changed","path":"docs/2024/"}"#),
            Some(ServerChange::Changed("/docs/2024".into()))
        );
        assert_eq!(classify_event(r#"data: {"type":"changed"}"#), None);
    }

    #[test]
    fn ignores_noise() {
        assert_eq!(classify_event(""), None);
        assert_eq!(classify_event(": keepalive"), None);
        assert_eq!(classify_event("event: message"), None);
        assert_eq!(classify_event("data: not json"), None);
        assert_eq!(classify_event(r#"data: {"type":"quota"}"#), None);
    }

    #[test]
    fn backoff_doubles_to_cap() {
        let mut b = PUSH_BACKOFF_MIN_SECS;
        let mut seen = vec![b];
        for _ in 0..7 {
            b = next_backoff(b);
            seen.push(b);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn delivers_events_from_stream() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/events")
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"type\":\"changed\",\"path\":\"/docs\"}\n\n")
            .create();
        let (tx, rx) = mpsc::channel();
        let _watcher = start_watcher(format!("{}/api/events", server.url()), tx).unwrap();

        let mut got_change = false;
        for _ in 0..3 {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::ServerChanged(change) => {
                    assert_eq!(change, ServerChange::Changed("/docs".into()));
                    got_change = true;
                    break;
                }
                AppEvent::PushStatus(_) => {}
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert!(got_change);
    }

    #[test]
    fn reconnects_after_stream_closes() {
        let mut server = mockito::Server::new();
        // each response ends after one event, forcing a reconnect
        let mock = server
            .mock("GET", "/api/events")
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"type\":\"tree_updated\"}\n\n")
            .expect_at_least(2)
            .create();
        let (tx, rx) = mpsc::channel();
        let _watcher = start_watcher(format!("{}/api/events", server.url()), tx).unwrap();

        let mut seen = Vec::new();
        while seen.iter().filter(|s| **s == "change").count() < 2 {
            let label = match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
                AppEvent::PushStatus(true) => "online",
                AppEvent::PushStatus(false) => "offline",
                AppEvent::ServerChanged(ServerChange::TreeStale) => "change",
                other => panic!("unexpected event {:?}", other),
            };
            seen.push(label);
        }
        assert_eq!(seen, vec!["online", "change", "offline", "online", "change"]);
        mock.assert();
    }
}
