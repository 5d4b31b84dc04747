use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::client::FileServerClient;
use crate::model::path;

const MAX_DEPTH: usize = 32;

/// Everything needed to upload a local file or directory into a remote
/// directory.
#[derive(Debug, Default, PartialEq)]
pub struct UploadPlan {
    /// Remote directories to create, parents before children.
    pub dirs: Vec<String>,
    /// (remote directory, local file, remote name)
    pub files: Vec<(String, PathBuf, String)>,
}

/// Plan an upload of `local` into the remote directory `dest`. A directory
/// is walked recursively and recreated under `dest`.
pub fn collect_upload(local: &Path, dest: &str) -> Result<UploadPlan> {
    let metadata =
        std::fs::metadata(local).with_context(|| format!("cannot read {}", local.display()))?;
    let name = local
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", local.display()))?;

    let mut plan = UploadPlan::default();
    if metadata.is_dir() {
        let root = path::join(dest, &name);
        plan.dirs.push(root.clone());
        collect_dir(local, &root, 0, &mut plan)?;
    } else {
        plan.files.push((path::normalize(dest), local.to_path_buf(), name));
    }
    Ok(plan)
}

fn collect_dir(dir: &Path, remote: &str, depth: usize, plan: &mut UploadPlan) -> Result<()> {
    if depth >= MAX_DEPTH {
        anyhow::bail!("{} is nested too deeply", dir.display());
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            subdirs.push((entry.path(), name));
        } else if file_type.is_file() {
            plan.files.push((remote.to_string(), entry.path(), name));
        } else {
            log::debug!("skipping {} (not a regular file)", entry.path().display());
        }
    }
    for (local, name) in subdirs {
        let child = path::join(remote, &name);
        plan.dirs.push(child.clone());
        collect_dir(&local, &child, depth + 1, plan)?;
    }
    Ok(())
}

/// Execute an upload plan. Directories that already exist are fine.
pub fn run_upload(client: &FileServerClient, plan: &UploadPlan) -> Result<usize> {
    for dir in &plan.dirs {
        match client.mkdir(dir) {
            Ok(()) | Err(crate::error::ApiError::Conflict(_)) => {}
            Err(e) => return Err(e).with_context(|| format!("mkdir {}", dir)),
        }
    }
    for (dir, local, name) in &plan.files {
        client
            .upload(dir, local, name)
            .with_context(|| format!("upload {}", local.display()))?;
        log::info!("uploaded {} to {}", local.display(), path::join(dir, name));
    }
    Ok(plan.files.len())
}

/// A local path for `name` inside `dir` that does not exist yet:
/// `name`, then `name (1).ext`, `name (2).ext`, ...
pub fn download_target(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Download a remote file or directory into `local_dir`. Returns the number
/// of files written.
pub fn download(
    client: &FileServerClient,
    remote: &str,
    is_dir: bool,
    local_dir: &Path,
) -> Result<usize> {
    download_at(client, remote, is_dir, local_dir, 0)
}

fn download_at(
    client: &FileServerClient,
    remote: &str,
    is_dir: bool,
    local_dir: &Path,
    depth: usize,
) -> Result<usize> {
    if depth >= MAX_DEPTH {
        anyhow::bail!("{} is nested too deeply", remote);
    }
    let name = path::file_name(remote);
    let name = if name.is_empty() { "root".to_string() } else { name };
    let target = download_target(local_dir, &name);

    if !is_dir {
        let file =
            File::create(&target).with_context(|| format!("cannot create {}", target.display()))?;
        let mut out = BufWriter::new(file);
        let written = client.retrieve_to(remote, &mut out);
        if let Err(e) = written {
            drop(out);
            let _ = std::fs::remove_file(&target);
            return Err(e).with_context(|| format!("download {}", remote));
        }
        out.flush()?;
        log::info!("downloaded {} to {}", remote, target.display());
        return Ok(1);
    }

    std::fs::create_dir_all(&target)?;
    let mut count = 0;
    for child in client.list(remote)? {
        count += download_at(client, &child.path, child.is_dir, &target, depth + 1)?;
    }
    Ok(count)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed == "~" || trimmed.starts_with("~/") {
        if let Some(home) = crate::config::home_dir() {
            return home.join(trimmed.trim_start_matches('~').trim_start_matches('/'));
        }
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn single_file_plan() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let plan = collect_upload(&file, "/docs/").unwrap();
        assert!(plan.dirs.is_empty());
        assert_eq!(plan.files, vec![("/docs".to_string(), file, "notes.txt".to_string())]);
    }

    #[test]
    fn directory_plan_creates_parents_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("photos");
        std::fs::create_dir_all(root.join("2024/summer")).unwrap();
        std::fs::write(root.join("cover.jpg"), "c").unwrap();
        std::fs::write(root.join("2024/summer/beach.jpg"), "b").unwrap();

        let plan = collect_upload(&root, "/").unwrap();
        assert_eq!(plan.dirs, vec!["/photos", "/photos/2024", "/photos/2024/summer"]);
        let remote: Vec<String> = plan
            .files
            .iter()
            .map(|(d, _, n)| path::join(d, n))
            .collect();
        assert_eq!(remote, vec!["/photos/cover.jpg", "/photos/2024/summer/beach.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn directory_plan_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("share");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("real.txt"), "r").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path(), root.join("loop")).unwrap();

        let plan = collect_upload(&root, "/").unwrap();
        assert_eq!(plan.dirs, vec!["/share"]);
        let names: Vec<&str> = plan.files.iter().map(|(_, _, n)| n.as_str()).collect();
        assert_eq!(names, vec!["real.txt"]);
    }

    #[test]
    fn download_target_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(download_target(dir.path(), "a.txt"), dir.path().join("a.txt"));
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("a (1).txt"), "").unwrap();
        assert_eq!(download_target(dir.path(), "a.txt"), dir.path().join("a (2).txt"));
        std::fs::write(dir.path().join("README"), "").unwrap();
        assert_eq!(download_target(dir.path(), "README"), dir.path().join("README (1)"));
    }

    #[test]
    fn downloads_directory_recursively() {
        let mut server = mockito::Server::new();
        let _root = server
            .mock("GET", "/api/list")
            .match_query(mockito::Matcher::UrlEncoded("path".into(), "/docs".into()))
            .with_body(
                r#"[{"name":"a.txt","path":"/docs/a.txt"},
                    {"name":"sub","path":"/docs/sub","is_dir":true}]"#,
            )
            .create();
        let _sub = server
            .mock("GET", "/api/list")
            .match_query(mockito::Matcher::UrlEncoded("path".into(), "/docs/sub".into()))
            .with_body(r#"[{"name":"b.txt","path":"/docs/sub/b.txt"}]"#)
            .create();
        let _a = server
            .mock("GET", "/api/retrieve")
            .match_query(mockito::Matcher::UrlEncoded("path".into(), "/docs/a.txt".into()))
            .with_body("A")
            .create();
        let _b = server
            .mock("GET", "/api/retrieve")
            .match_query(mockito::Matcher::UrlEncoded("path".into(), "/docs/sub/b.txt".into()))
            .with_body("B")
            .create();

        let client = FileServerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let count = download(&client, "/docs", true, dir.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("docs/a.txt")).unwrap(), "A");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/sub/b.txt")).unwrap(),
            "B"
        );
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/retrieve")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create();
        let client = FileServerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        assert!(download(&client, "/x.bin", false, dir.path()).is_err());
        assert!(!dir.path().join("x.bin").exists());
    }
}
