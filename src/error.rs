use std::io;
use std::path::{Path, PathBuf};

/// The stage of a run an error belongs to. Used for the exit message so the
/// user can tell at a glance whether config, connection or the transfer broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigLoad,
    Connect,
    SessionCreate,
    WorkingDir,
    RemoteStat,
    Transfer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::ConfigLoad => "config load",
            Stage::Connect => "connect",
            Stage::SessionCreate => "session create",
            Stage::WorkingDir => "working-directory query",
            Stage::RemoteStat => "remote stat",
            Stage::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// Every fatal condition of a mirror run. Each variant keeps the path or
/// address involved plus the underlying cause; nothing is recovered locally,
/// the first error unwinds to `main`.
#[derive(Debug)]
pub enum MirrorError {
    // configuration
    ConfigUnreadable(PathBuf, io::Error),
    ConfigMissingKey(&'static str),
    ConfigInvalidPort(String),
    ConfigMalformed(PathBuf, usize, String),
    // SSH / connection related
    Connection(String, io::Error),
    SessionCreate(String, String),
    Authentication(String, String),
    SftpCreate(String, String),
    WorkingDir(io::Error),
    // remote side
    RemoteLookup { path: String, source: io::Error },
    RemoteList { path: String, source: io::Error },
    RemoteOpen { path: String, source: io::Error },
    // local side
    LocalMkdir { path: PathBuf, source: io::Error },
    LocalCreate { path: PathBuf, source: io::Error },
    TransferIo { remote: String, local: PathBuf, source: io::Error },
    CycleDetected { path: String, ancestor: String },
}

impl std::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use MirrorError::*;
        match self {
            ConfigUnreadable(p, e) => {
                write!(f, "cannot read config file {}: {}", display_path(p), e)
            }
            ConfigMissingKey(k) => write!(f, "config value {} is missing or empty", k),
            ConfigInvalidPort(p) => write!(f, "invalid port: {:?}", p),
            ConfigMalformed(p, line, text) => {
                write!(f, "malformed line {} in {}: {}", line, display_path(p), text)
            }
            Connection(addr, e) => write!(f, "failed to connect to {}: {}", addr, e),
            SessionCreate(addr, msg) => {
                write!(f, "failed to create SSH session for {}: {}", addr, msg)
            }
            Authentication(who, msg) => write!(f, "authentication failed for {}: {}", who, msg),
            SftpCreate(addr, msg) => write!(f, "failed to start SFTP on {}: {}", addr, msg),
            WorkingDir(e) => write!(f, "failed to query remote working directory: {}", e),
            RemoteLookup { path, source } => {
                write!(f, "failed to get file info for {}: {}", path, source)
            }
            RemoteList { path, source } => {
                write!(f, "failed to list remote directory {}: {}", path, source)
            }
            RemoteOpen { path, source } => {
                write!(f, "failed to open remote file {}: {}", path, source)
            }
            LocalMkdir { path, source } => {
                write!(f, "failed to create local directory {}: {}", display_path(path), source)
            }
            LocalCreate { path, source } => {
                write!(f, "failed to create local file {}: {}", display_path(path), source)
            }
            TransferIo { remote, local, source } => {
                write!(f, "copy {} -> {} failed: {}", remote, display_path(local), source)
            }
            CycleDetected { path, ancestor } => {
                write!(f, "directory cycle: {} resolves to ancestor {}", path, ancestor)
            }
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use MirrorError::*;
        match self {
            ConfigUnreadable(_, e) | Connection(_, e) | WorkingDir(e) => Some(e),
            RemoteLookup { source, .. }
            | RemoteList { source, .. }
            | RemoteOpen { source, .. }
            | LocalMkdir { source, .. }
            | LocalCreate { source, .. }
            | TransferIo { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl MirrorError {
    pub fn stage(&self) -> Stage {
        use MirrorError::*;
        match self {
            ConfigUnreadable(..) | ConfigMissingKey(_) | ConfigInvalidPort(_)
            | ConfigMalformed(..) => Stage::ConfigLoad,
            Connection(..) | Authentication(..) => Stage::Connect,
            SessionCreate(..) | SftpCreate(..) => Stage::SessionCreate,
            WorkingDir(_) => Stage::WorkingDir,
            RemoteLookup { .. } => Stage::RemoteStat,
            RemoteList { .. }
            | RemoteOpen { .. }
            | LocalMkdir { .. }
            | LocalCreate { .. }
            | TransferIo { .. }
            | CycleDetected { .. } => Stage::Transfer,
        }
    }

    /// Short machine-readable name of the variant.
    pub fn variant(&self) -> &'static str {
        use MirrorError::*;
        match self {
            ConfigUnreadable(..) => "ConfigUnreadable",
            ConfigMissingKey(_) => "ConfigMissingKey",
            ConfigInvalidPort(_) => "ConfigInvalidPort",
            ConfigMalformed(..) => "ConfigMalformed",
            Connection(..) => "Connection",
            SessionCreate(..) => "SessionCreate",
            Authentication(..) => "Authentication",
            SftpCreate(..) => "SftpCreate",
            WorkingDir(_) => "WorkingDir",
            RemoteLookup { .. } => "RemoteLookup",
            RemoteList { .. } => "RemoteList",
            RemoteOpen { .. } => "RemoteOpen",
            LocalMkdir { .. } => "LocalMkdir",
            LocalCreate { .. } => "LocalCreate",
            TransferIo { .. } => "TransferIo",
            CycleDetected { .. } => "CycleDetected",
        }
    }

    /// Structured form used by `--json` output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "variant": self.variant(),
            "stage": self.stage().to_string(),
            "message": self.to_string(),
        });
        use MirrorError::*;
        let path = match self {
            RemoteLookup { path, .. } | RemoteList { path, .. } | RemoteOpen { path, .. } => {
                Some(path.clone())
            }
            CycleDetected { path, .. } => Some(path.clone()),
            LocalMkdir { path, .. } | LocalCreate { path, .. } => {
                Some(display_path(path).to_string())
            }
            TransferIo { local, .. } => Some(display_path(local).to_string()),
            _ => None,
        };
        if let Some(p) = path {
            obj["path"] = serde_json::Value::String(p);
        }
        obj
    }
}

fn display_path(p: &Path) -> std::borrow::Cow<'_, str> {
    let s = p.to_string_lossy();
    if s.contains('\\') { s.replace('\\', "/").into() } else { s }
}
