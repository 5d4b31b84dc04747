use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::ApiError;
use crate::model::activity::{self, LogEntry};
use crate::model::disk::DiskSpace;
use crate::model::file::FileRecord;
use crate::model::tree::DirTree;

/// Blocking client for the file server's REST API. Cloning is cheap; the
/// underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct FileServerClient {
    base: String,
    http: Client,
}

impl FileServerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("filedeck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{}", self.base, name)
    }

    pub fn list(&self, dir: &str) -> Result<Vec<FileRecord>, ApiError> {
        let req = self.http.get(self.endpoint("list")).query(&[("path", dir)]);
        self.fetch_json(req, dir)
    }

    /// Stream a file's contents into `out`, returning the byte count.
    pub fn retrieve_to<W: Write>(&self, file: &str, out: &mut W) -> Result<u64, ApiError> {
        let req = self.http.get(self.endpoint("retrieve")).query(&[("path", file)]);
        let mut res = self.send(req, file)?;
        Ok(res.copy_to(out)?)
    }

    /// Upload a local file into `dir`, stored under `name`.
    pub fn upload(&self, dir: &str, local: &Path, name: &str) -> Result<(), ApiError> {
        let part = multipart::Part::file(local)?.file_name(name.to_string());
        let form = multipart::Form::new().part("file", part);
        let req = self
            .http
            .post(self.endpoint("upload"))
            .query(&[("path", dir)])
            .multipart(form);
        self.send(req, dir).map(|_| ())
    }

    pub fn delete(&self, paths: &[String]) -> Result<(), ApiError> {
        let req = self
            .http
            .post(self.endpoint("delete"))
            .json(&json!({ "paths": paths }));
        self.send(req, &subject_of(paths)).map(|_| ())
    }

    pub fn rename(&self, target: &str, new_name: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .post(self.endpoint("rename"))
            .json(&json!({ "path": target, "new_name": new_name }));
        self.send(req, target).map(|_| ())
    }

    pub fn move_to(&self, paths: &[String], destination: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .post(self.endpoint("move"))
            .json(&json!({ "paths": paths, "destination": destination }));
        self.send(req, destination).map(|_| ())
    }

    pub fn mkdir(&self, dir: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .post(self.endpoint("mkdir"))
            .json(&json!({ "path": dir }));
        self.send(req, dir).map(|_| ())
    }

    pub fn search(&self, dir: &str, query: &str) -> Result<Vec<FileRecord>, ApiError> {
        let req = self
            .http
            .get(self.endpoint("search"))
            .query(&[("path", dir), ("query", query)]);
        self.fetch_json(req, dir)
    }

    pub fn file_tree(&self) -> Result<DirTree, ApiError> {
        let req = self.http.get(self.endpoint("filetree"));
        self.fetch_json(req, "/")
    }

    pub fn disk_space(&self) -> Result<DiskSpace, ApiError> {
        let req = self.http.get(self.endpoint("diskspace"));
        self.fetch_json(req, "/")
    }

    /// Activity history for a path, newest first.
    pub fn logs(&self, target: &str) -> Result<Vec<LogEntry>, ApiError> {
        let req = self.http.get(self.endpoint("logs")).query(&[("path", target)]);
        let mut entries: Vec<LogEntry> = self.fetch_json(req, target)?;
        activity::sort_newest_first(&mut entries);
        Ok(entries)
    }

    fn fetch_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        subject: &str,
    ) -> Result<T, ApiError> {
        let res = self.send(req, subject)?;
        let body = res.text()?;
        serde_json::from_str(&body).map_err(|e| {
            log::debug!("could not decode response for {} [{}] {}", subject, e, body);
            ApiError::Decode(e)
        })
    }

    fn send(&self, req: RequestBuilder, subject: &str) -> Result<Response, ApiError> {
        let req = req.build()?;
        log::debug!("{} {}", req.method(), req.url());
        let res = self.http.execute(req)?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        let err = ApiError::from_status(status, &body, subject);
        log::warn!("request for {} failed: {}", subject, err);
        Err(err)
    }
}

fn subject_of(paths: &[String]) -> String {
    match paths {
        [one] => one.clone(),
        _ => format!("{} items", paths.len()),
    }
}
