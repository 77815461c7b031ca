//! Path normalization and comparison helpers
//!
//! Compilation databases are frequently produced on Windows, so comparisons work on
//! the textual form: both separators are accepted, `.` and `..` segments are folded
//! lexically and case is ignored.

use std::path::{Component, Path, PathBuf};

/// Canonical comparison form of a path: `/` separators, folded dot segments, lowercase,
/// no trailing separator.
pub fn comparison_key(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let (prefix, rest) = split_root(&unified);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                // `..` above a relative start is kept so distinct paths stay distinct
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if prefix.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    format!("{prefix}{}", segments.join("/")).to_lowercase()
}

/// Splits `C:/`, `//server/` style UNC roots and `/` off the front of a unified path.
fn split_root(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let end = if bytes.get(2) == Some(&b'/') { 3 } else { 2 };
        return (&path[..end], &path[end..]);
    }
    if path.starts_with("//") {
        return ("//", &path[2..]);
    }
    if path.starts_with('/') {
        return ("/", &path[1..]);
    }
    ("", path)
}

/// Case-insensitive, separator-agnostic path equality
pub fn paths_equal(a: &str, b: &str) -> bool {
    comparison_key(a) == comparison_key(b)
}

/// Lowercased last segment of `path`, accepting either separator
pub fn file_name_key(path: &str) -> String {
    let key = comparison_key(path);
    match key.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => key,
    }
}

/// Whether `path` lies strictly below `dir`
pub fn is_under_dir(path: &str, dir: &str) -> bool {
    let dir_key = comparison_key(dir);
    if dir_key.is_empty() {
        return false;
    }
    let path_key = comparison_key(path);
    let prefix = if dir_key.ends_with('/') {
        dir_key
    } else {
        format!("{dir_key}/")
    };
    path_key.len() > prefix.len() && path_key.starts_with(&prefix)
}

/// Whether `path` is absolute on either Unix or Windows
pub fn is_absolute_any(path: &str) -> bool {
    let unified = path.replace('\\', "/");
    let (prefix, _) = split_root(&unified);
    prefix.ends_with('/')
}

/// Rewrites backslash separators on platforms where they are not separators.
///
/// Build-root templates written on Windows use backslashes throughout.
pub fn native_separators(path: &str) -> String {
    if cfg!(windows) {
        path.to_string()
    } else {
        path.replace('\\', "/")
    }
}

/// Absolute, lexically normalized form of `path`, resolving relative paths against `base`.
///
/// The target does not have to exist, so this never touches the file system.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
