use std::ffi::OsStr;
use std::path::{Path, PathBuf};

// Lightweight path display wrapper that renders with forward slashes.
// Avoids allocating strings until actually formatted for logs.
pub(crate) struct DisplayPath<'a>(pub(crate) &'a Path);

impl<'a> std::fmt::Display for DisplayPath<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.to_string_lossy();
        let out = normalize_path(&s, true);
        f.write_str(&out)
    }
}

pub(crate) fn display_path(p: &Path) -> DisplayPath<'_> {
    DisplayPath(p)
}

/// Normalize a path-like string for remote use:
/// - converts backslashes to forward slashes
/// - collapses repeated slashes
/// - optionally preserves a trailing slash
///
/// Dot segments are kept as-is; the server resolves them.
pub fn normalize_path(p: &str, preserve_trailing_slash: bool) -> String {
    if p.is_empty() {
        return String::new();
    }
    let mut s = p.replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    if !preserve_trailing_slash {
        // keep root "/"
        while s.len() > 1 && s.ends_with('/') {
            s.pop();
        }
    }
    s
}

/// Join a child name onto a remote directory path. Remote paths are always
/// '/'-separated regardless of the local platform.
pub fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() && !name.is_empty() {
        // parent was "/" (or empty): stay absolute
        return format!("/{}", name);
    }
    format!("{}/{}", dir, name)
}

/// Join a raw directory entry name onto a remote directory without
/// re-encoding it, so names that are not valid UTF-8 reach the server intact.
pub fn join_remote_path(dir: &Path, name: &OsStr) -> PathBuf {
    let mut s = dir.as_os_str().to_owned();
    if !s.as_encoded_bytes().ends_with(b"/") {
        s.push("/");
    }
    s.push(name);
    PathBuf::from(s)
}

/// Lexically clean a '/'-separated remote path: repeated slashes and "."
/// segments are dropped and ".." removes the segment before it. A rooted
/// path never climbs above "/"; an empty result is ".".
pub fn clean_remote(p: &str) -> String {
    let p = p.replace('\\', "/");
    let rooted = p.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for seg in p.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    let body = parts.join("/");
    if rooted {
        format!("/{}", body)
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

/// Resolve the configured remote path against the session's working
/// directory. The path is always joined onto `cwd`, absolute or not, and
/// the result is cleaned; "" and "." name `cwd` itself.
pub fn resolve_remote_root(cwd: &str, configured: &str) -> String {
    clean_remote(&join_remote(cwd, configured.trim()))
}
