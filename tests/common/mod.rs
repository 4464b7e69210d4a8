#![allow(dead_code)]
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sftp_mirror::transfer::{EntryKind, RemoteEntry, RemoteMetadata, SftpLike};

enum Node {
    File(Vec<u8>),
    Other(Vec<u8>),
    Dir(Vec<OsString>),
}

/// In-memory remote tree implementing `SftpLike`, with failure injection.
/// Children are listed in insertion order, which is deliberately not sorted
/// in most tests. Nodes are keyed by path so names need not be UTF-8.
#[derive(Default)]
pub struct FakeSftp {
    nodes: HashMap<PathBuf, Node>,
    fail_stat: HashSet<String>,
    fail_list: HashSet<String>,
    fail_open: HashSet<String>,
    // path -> number of successful reads before the stream errors
    fail_read_after: HashMap<String, usize>,
    aliases: HashMap<PathBuf, PathBuf>,
    opened: Mutex<Vec<String>>,
    listed: Mutex<Vec<String>>,
    resolved: Mutex<Vec<String>>,
}

impl FakeSftp {
    pub fn new() -> Self {
        let mut f = Self::default();
        f.nodes.insert(PathBuf::from("/"), Node::Dir(Vec::new()));
        f
    }

    fn attach(&mut self, path: &Path) {
        let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
            return;
        };
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("/"),
        };
        if !self.nodes.contains_key(&parent) {
            self.dir_mut(&parent);
        }
        if let Some(Node::Dir(children)) = self.nodes.get_mut(&parent)
            && !children.contains(&name)
        {
            children.push(name);
        }
    }

    fn dir_mut(&mut self, path: &Path) {
        if path != Path::new("/") {
            self.attach(path);
        }
        self.nodes.entry(path.to_path_buf()).or_insert_with(|| Node::Dir(Vec::new()));
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.dir_mut(Path::new(path));
        self
    }

    pub fn file(self, path: &str, content: &[u8]) -> Self {
        self.file_at(Path::new(path), content)
    }

    /// Like `file`, for paths that cannot be written as `&str`.
    pub fn file_at(mut self, path: &Path, content: &[u8]) -> Self {
        self.attach(path);
        self.nodes.insert(path.to_path_buf(), Node::File(content.to_vec()));
        self
    }

    pub fn other(mut self, path: &str, content: &[u8]) -> Self {
        let path = Path::new(path);
        self.attach(path);
        self.nodes.insert(path.to_path_buf(), Node::Other(content.to_vec()));
        self
    }

    pub fn fail_stat(mut self, path: &str) -> Self {
        self.fail_stat.insert(path.to_string());
        self
    }

    pub fn fail_list(mut self, path: &str) -> Self {
        self.fail_list.insert(path.to_string());
        self
    }

    pub fn fail_open(mut self, path: &str) -> Self {
        self.fail_open.insert(path.to_string());
        self
    }

    pub fn fail_read_after(mut self, path: &str, reads: usize) -> Self {
        self.fail_read_after.insert(path.to_string(), reads);
        self
    }

    /// Make `realpath(path)` report `target`, e.g. a symlinked directory
    /// pointing back at an ancestor.
    pub fn alias(mut self, path: &str, target: &str) -> Self {
        self.aliases.insert(PathBuf::from(path), PathBuf::from(target));
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }

    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        self.nodes.get(path).map(|n| match n {
            Node::File(_) => EntryKind::File,
            Node::Other(_) => EntryKind::Other,
            Node::Dir(_) => EntryKind::Dir,
        })
    }
}

fn key(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn not_found(p: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", p))
}

fn denied(p: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("permission denied: {}", p))
}

impl SftpLike for FakeSftp {
    fn stat(&self, p: &Path) -> io::Result<RemoteMetadata> {
        let k = key(p);
        if self.fail_stat.contains(&k) {
            return Err(denied(&k));
        }
        let size = match self.nodes.get(p) {
            Some(Node::File(d)) | Some(Node::Other(d)) => Some(d.len() as u64),
            Some(Node::Dir(_)) => None,
            None => return Err(not_found(&k)),
        };
        let kind = self.kind_of(p).ok_or_else(|| not_found(&k))?;
        Ok(RemoteMetadata { kind, size, perm: Some(0o644), mtime: Some(0) })
    }

    fn read_dir(&self, p: &Path) -> io::Result<Vec<RemoteEntry>> {
        let k = key(p);
        self.listed.lock().unwrap().push(k.clone());
        if self.fail_list.contains(&k) {
            return Err(denied(&k));
        }
        let Some(Node::Dir(children)) = self.nodes.get(p) else {
            return Err(not_found(&k));
        };
        Ok(children
            .iter()
            .map(|name| {
                let full = p.join(name);
                let size = match self.nodes.get(&full) {
                    Some(Node::File(d)) | Some(Node::Other(d)) => Some(d.len() as u64),
                    _ => None,
                };
                RemoteEntry {
                    name: name.clone(),
                    kind: self.kind_of(&full).unwrap_or(EntryKind::Other),
                    size,
                }
            })
            .collect())
    }

    fn open_read(&self, p: &Path) -> io::Result<Box<dyn Read + Send>> {
        let k = key(p);
        self.opened.lock().unwrap().push(k.clone());
        if self.fail_open.contains(&k) {
            return Err(denied(&k));
        }
        let data = match self.nodes.get(p) {
            Some(Node::File(d)) | Some(Node::Other(d)) => d.clone(),
            Some(Node::Dir(_)) => {
                return Err(io::Error::other(format!("is a directory: {}", k)));
            }
            None => return Err(not_found(&k)),
        };
        match self.fail_read_after.get(&k) {
            Some(n) => Ok(Box::new(BrokenReader { data, pos: 0, reads_left: *n })),
            None => Ok(Box::new(io::Cursor::new(data))),
        }
    }

    fn realpath(&self, p: &Path) -> io::Result<PathBuf> {
        self.resolved.lock().unwrap().push(key(p));
        Ok(self.aliases.get(p).cloned().unwrap_or_else(|| p.to_path_buf()))
    }
}

// Hands out 3-byte chunks, then fails once `reads_left` runs out
struct BrokenReader {
    data: Vec<u8>,
    pos: usize,
    reads_left: usize,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reads_left == 0 {
            return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "channel closed"));
        }
        self.reads_left -= 1;
        let n = buf.len().min(3).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub fn make_tmp_dir(tag: &str) -> PathBuf {
    let mut base = std::env::temp_dir();
    let uniq = format!(
        "sftp_mirror_{}_{}_{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos()
    );
    base.push(uniq);
    std::fs::create_dir(&base).expect("create tmp dir");
    base
}

/// Relative path -> Some(content) for files, None for directories, sorted.
pub fn snapshot(root: &Path) -> Vec<(String, Option<Vec<u8>>)> {
    let mut out: Vec<(String, Option<Vec<u8>>)> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.expect("walk"))
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = if e.file_type().is_file() {
                Some(std::fs::read(e.path()).expect("read"))
            } else {
                None
            };
            (rel, content)
        })
        .collect();
    out.sort();
    out
}

pub fn file(rel: &str, content: &[u8]) -> (String, Option<Vec<u8>>) {
    (rel.to_string(), Some(content.to_vec()))
}

pub fn dir(rel: &str) -> (String, Option<Vec<u8>>) {
    (rel.to_string(), None)
}
