use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Type tag of a remote object as reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlink, device, socket, fifo. Transferred as a plain file.
    Other,
}

impl EntryKind {
    fn from_stat(st: &ssh2::FileStat) -> Self {
        if st.is_dir() {
            EntryKind::Dir
        } else if st.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Result of a remote stat: type plus the standard attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub perm: Option<u32>,
    pub mtime: Option<u64>,
}

impl RemoteMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// One child of a remote directory listing. `name` holds the bytes the
/// server sent, which need not be UTF-8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: OsString,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

/// Trait abstracting the SFTP operations the mirror needs. Readers are boxed
/// so tests can inject fake file-like objects. Implementors must be Send so a
/// session can be moved to another thread by the caller.
pub trait SftpLike: Send {
    fn stat(&self, p: &Path) -> io::Result<RemoteMetadata>;
    fn read_dir(&self, p: &Path) -> io::Result<Vec<RemoteEntry>>;
    fn open_read(&self, p: &Path) -> io::Result<Box<dyn io::Read + Send>>;

    /// Canonical form of a remote path, used to spot directory cycles.
    fn realpath(&self, p: &Path) -> io::Result<PathBuf> {
        Ok(p.to_path_buf())
    }
}

/// Adapter that owns an `ssh2::Sftp` and implements `SftpLike`.
pub struct Ssh2Adapter(pub ssh2::Sftp);

impl SftpLike for Ssh2Adapter {
    fn stat(&self, p: &Path) -> io::Result<RemoteMetadata> {
        let st = self.0.stat(p)?;
        Ok(RemoteMetadata {
            kind: EntryKind::from_stat(&st),
            size: st.size,
            perm: st.perm,
            mtime: st.mtime,
        })
    }

    fn read_dir(&self, p: &Path) -> io::Result<Vec<RemoteEntry>> {
        // readdir attributes are lstat-style: symlinks come back as Other
        let entries = self.0.readdir(p)?;
        Ok(entries
            .into_iter()
            .filter_map(|(pathbuf, st)| {
                let name = pathbuf.file_name()?.to_os_string();
                Some(RemoteEntry { name, kind: EntryKind::from_stat(&st), size: st.size })
            })
            .collect())
    }

    fn open_read(&self, p: &Path) -> io::Result<Box<dyn io::Read + Send>> {
        let f = self.0.open(p)?;
        Ok(Box::new(f))
    }

    fn realpath(&self, p: &Path) -> io::Result<PathBuf> {
        Ok(self.0.realpath(p)?)
    }
}
