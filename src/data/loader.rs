//! Background requests. Each function spawns a thread, runs one request
//! against the server and reports back through the app's event channel.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use crate::data::client::FileServerClient;
use crate::data::transfer;
use crate::event::{AppEvent, Operation};
use crate::model::file::FileRecord;
use crate::model::path;

fn spawn<F>(tx: &Sender<AppEvent>, job: F)
where
    F: FnOnce() -> AppEvent + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        // receiver gone means the app is shutting down
        let _ = tx.send(job());
    });
}

pub fn load_listing(client: &FileServerClient, tx: &Sender<AppEvent>, dir: String, generation: u64) {
    let client = client.clone();
    spawn(tx, move || AppEvent::ListingLoaded {
        generation,
        result: client.list(&dir).map_err(|e| e.to_string()),
        dir,
    });
}

pub fn load_search(
    client: &FileServerClient,
    tx: &Sender<AppEvent>,
    dir: String,
    query: String,
    generation: u64,
) {
    let client = client.clone();
    spawn(tx, move || AppEvent::SearchLoaded {
        generation,
        result: client.search(&dir, &query).map_err(|e| e.to_string()),
        dir,
        query,
    });
}

pub fn load_tree(client: &FileServerClient, tx: &Sender<AppEvent>) {
    let client = client.clone();
    spawn(tx, move || {
        AppEvent::TreeLoaded(client.file_tree().map_err(|e| e.to_string()))
    });
}

pub fn load_disk_space(client: &FileServerClient, tx: &Sender<AppEvent>) {
    let client = client.clone();
    spawn(tx, move || {
        AppEvent::DiskSpaceLoaded(client.disk_space().map_err(|e| e.to_string()))
    });
}

pub fn load_logs(client: &FileServerClient, tx: &Sender<AppEvent>, target: String) {
    let client = client.clone();
    spawn(tx, move || AppEvent::LogsLoaded {
        result: client.logs(&target).map_err(|e| e.to_string()),
        target,
    });
}

pub fn delete(client: &FileServerClient, tx: &Sender<AppEvent>, paths: Vec<String>) {
    let client = client.clone();
    spawn(tx, move || {
        let result = client
            .delete(&paths)
            .map(|_| format!("Deleted {}", describe(&paths)))
            .map_err(|e| e.to_string());
        AppEvent::OperationDone {
            op: Operation::Delete { paths },
            result,
        }
    });
}

pub fn rename(client: &FileServerClient, tx: &Sender<AppEvent>, from: String, new_name: String) {
    let client = client.clone();
    spawn(tx, move || {
        let to = path::join(&path::parent(&from), &new_name);
        let result = client
            .rename(&from, &new_name)
            .map(|_| format!("Renamed to {}", new_name))
            .map_err(|e| e.to_string());
        AppEvent::OperationDone {
            op: Operation::Rename { from, to },
            result,
        }
    });
}

pub fn move_to(
    client: &FileServerClient,
    tx: &Sender<AppEvent>,
    paths: Vec<String>,
    destination: String,
) {
    let client = client.clone();
    spawn(tx, move || {
        let result = client
            .move_to(&paths, &destination)
            .map(|_| format!("Moved {} to {}", describe(&paths), destination))
            .map_err(|e| e.to_string());
        AppEvent::OperationDone {
            op: Operation::Move { paths, destination },
            result,
        }
    });
}

pub fn mkdir(client: &FileServerClient, tx: &Sender<AppEvent>, dir: String) {
    let client = client.clone();
    spawn(tx, move || {
        let result = client
            .mkdir(&dir)
            .map(|_| format!("Created {}", path::file_name(&dir)))
            .map_err(|e| e.to_string());
        AppEvent::OperationDone {
            op: Operation::Mkdir { path: dir },
            result,
        }
    });
}

pub fn upload(client: &FileServerClient, tx: &Sender<AppEvent>, local: PathBuf, dest: String) {
    let client = client.clone();
    spawn(tx, move || {
        let result = transfer::collect_upload(&local, &dest)
            .and_then(|plan| transfer::run_upload(&client, &plan))
            .map(|n| format!("Uploaded {} file{}", n, plural(n)))
            .map_err(|e| format!("{:#}", e));
        AppEvent::OperationDone {
            op: Operation::Upload { dest },
            result,
        }
    });
}

pub fn download(
    client: &FileServerClient,
    tx: &Sender<AppEvent>,
    records: Vec<FileRecord>,
    local_dir: PathBuf,
) {
    let client = client.clone();
    spawn(tx, move || {
        let result = std::fs::create_dir_all(&local_dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| {
                records.iter().try_fold(0usize, |acc, rec| {
                    transfer::download(&client, &rec.path, rec.is_dir, &local_dir)
                        .map(|n| acc + n)
                })
            })
            .map(|n| {
                format!(
                    "Downloaded {} file{} to {}",
                    n,
                    plural(n),
                    local_dir.display()
                )
            })
            .map_err(|e| format!("{:#}", e));
        AppEvent::OperationDone {
            op: Operation::Download,
            result,
        }
    });
}

fn describe(paths: &[String]) -> String {
    match paths {
        [one] => path::file_name(one),
        many => format!("{} items", many.len()),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn client_for(server: &mockito::Server) -> FileServerClient {
        FileServerClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn listing_event_carries_generation_and_dir() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/list")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"[{"name":"a","path":"/a"}]"#)
            .create();
        let (tx, rx) = mpsc::channel();
        load_listing(&client_for(&server), &tx, "/".into(), 7);

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::ListingLoaded { generation, dir, result } => {
                assert_eq!(generation, 7);
                assert_eq!(dir, "/");
                assert_eq!(result.unwrap().len(), 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn failed_operation_reports_error_text() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/delete")
            .with_status(500)
            .with_body(r#"{"message":"disk on fire"}"#)
            .create();
        let (tx, rx) = mpsc::channel();
        delete(&client_for(&server), &tx, vec!["/a".into(), "/b".into()]);

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::OperationDone { op, result } => {
                assert_eq!(
                    op,
                    Operation::Delete {
                        paths: vec!["/a".into(), "/b".into()]
                    }
                );
                assert!(result.unwrap_err().contains("disk on fire"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn rename_reports_new_path() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/api/rename").create();
        let (tx, rx) = mpsc::channel();
        rename(&client_for(&server), &tx, "/docs/a.txt".into(), "b.txt".into());

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::OperationDone { op, result } => {
                assert_eq!(
                    op,
                    Operation::Rename {
                        from: "/docs/a.txt".into(),
                        to: "/docs/b.txt".into()
                    }
                );
                assert_eq!(result.unwrap(), "Renamed to b.txt");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
