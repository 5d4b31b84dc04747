use crate::model::activity::LogEntry;
use crate::model::disk::DiskSpace;
use crate::model::file::FileRecord;
use crate::model::tree::DirTree;

/// All events the app loop handles besides terminal input.
#[derive(Debug)]
pub enum AppEvent {
    /// Directory listing finished. `generation` identifies the request so
    /// stale responses can be dropped.
    ListingLoaded {
        generation: u64,
        dir: String,
        result: Result<Vec<FileRecord>, String>,
    },
    /// Search results for `query` under `dir`.
    SearchLoaded {
        generation: u64,
        dir: String,
        query: String,
        result: Result<Vec<FileRecord>, String>,
    },
    /// Sidebar tree fetched.
    TreeLoaded(Result<DirTree, String>),
    DiskSpaceLoaded(Result<DiskSpace, String>),
    /// Activity history for a path.
    LogsLoaded {
        target: String,
        result: Result<Vec<LogEntry>, String>,
    },
    /// A mutating operation or transfer finished.
    OperationDone {
        op: Operation,
        result: Result<String, String>,
    },
    /// Notification from the server's push channel.
    ServerChanged(ServerChange),
    /// Push channel connection state changed.
    PushStatus(bool),
}

/// Mutating operations, used to pick follow-up reloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Upload { dest: String },
    Download,
    Delete { paths: Vec<String> },
    Rename { from: String, to: String },
    Move { paths: Vec<String>, destination: String },
    Mkdir { path: String },
}

/// Categorized notification from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerChange {
    /// Tree changed; refetch it.
    TreeStale,
    /// Full replacement tree sent inline.
    Tree(DirTree),
    /// Contents of a directory changed.
    Changed(String),
}
