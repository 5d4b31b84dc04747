//! Helpers for server-side paths. Server paths are always absolute and
//! `/`-separated; the root directory is `/`.

pub const ROOT: &str = "/";

/// Collapse repeated separators, resolve `.` and `..`, drop any trailing
/// separator and make the path absolute. `..` never climbs above the root.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{}/{}", dir, name))
}

/// Parent directory. The root is its own parent.
pub fn parent(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(0) | None => ROOT.to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Last path segment, empty for the root.
pub fn file_name(path: &str) -> String {
    let path = normalize(path);
    path.rsplit('/').next().unwrap_or_default().to_string()
}

pub fn is_root(path: &str) -> bool {
    normalize(path) == ROOT
}

/// True when `ancestor` is `path` itself or one of its ancestors.
pub fn is_same_or_ancestor(ancestor: &str, path: &str) -> bool {
    let ancestor = normalize(ancestor);
    let path = normalize(path);
    if ancestor == ROOT || ancestor == path {
        return true;
    }
    path.starts_with(&ancestor) && path[ancestor.len()..].starts_with('/')
}

/// All ancestors of `path`, root first, excluding `path` itself.
pub fn ancestors(path: &str) -> Vec<String> {
    let path = normalize(path);
    let mut result = Vec::new();
    let mut current = ROOT.to_string();
    if path == ROOT {
        return result;
    }
    result.push(current.clone());
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    for segment in &segments[..segments.len() - 1] {
        current = join(&current, segment);
        result.push(current.clone());
    }
    result
}

/// Path segments below the root, in order.
pub fn segments(path: &str) -> Vec<String> {
    normalize(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Re-root `path` after `from` was renamed or moved to `to`. Paths outside
/// `from` come back unchanged.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    let path = normalize(path);
    let from = normalize(from);
    if !is_same_or_ancestor(&from, &path) {
        return path;
    }
    if from == ROOT {
        return join(to, &path);
    }
    join(to, &path[from.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cleans_separators_and_dots() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("docs//2024/"), "/docs/2024");
        assert_eq!(normalize("/docs/./a/../b"), "/docs/b");
        assert_eq!(normalize("/../../etc"), "/etc");
    }

    #[test]
    fn parent_and_file_name() {
        assert_eq!(parent("/docs/report.pdf"), "/docs");
        assert_eq!(parent("/docs"), "/");
        assert_eq!(parent("/"), "/");
        assert_eq!(file_name("/docs/report.pdf"), "report.pdf");
        assert_eq!(file_name("/"), "");
    }

    #[test]
    fn ancestor_checks_respect_segment_boundaries() {
        assert!(is_same_or_ancestor("/docs", "/docs"));
        assert!(is_same_or_ancestor("/docs", "/docs/a/b"));
        assert!(is_same_or_ancestor("/", "/anything"));
        assert!(!is_same_or_ancestor("/doc", "/docs"));
        assert!(!is_same_or_ancestor("/docs/a", "/docs"));
    }

    #[test]
    fn ancestors_are_listed_root_first() {
        assert_eq!(ancestors("/a/b/c"), vec!["/", "/a", "/a/b"]);
        assert!(ancestors("/").is_empty());
        assert_eq!(segments("/a/b"), vec!["a", "b"]);
    }

    #[test]
    fn rebase_follows_renamed_ancestor() {
        assert_eq!(rebase("/docs/2024/a", "/docs", "/papers"), "/papers/2024/a");
        assert_eq!(rebase("/docs", "/docs", "/archive/docs"), "/archive/docs");
        assert_eq!(rebase("/music", "/docs", "/papers"), "/music");
        assert_eq!(rebase("/docs2", "/docs", "/papers"), "/docs2");
    }
}
