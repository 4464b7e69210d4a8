use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::MirrorError;

pub const DEFAULT_CONFIG_FILE: &str = "sftp_config.txt";

pub const KEY_HOST: &str = "HOST_URL";
pub const KEY_USERNAME: &str = "USERNAME";
pub const KEY_PASSWORD: &str = "PASSWORD";
pub const KEY_PORT: &str = "PORT";
pub const KEY_LOCAL_DIR: &str = "LOCAL_DIRECTORY_TO_SAVE";
pub const KEY_REMOTE_PATH: &str = "FILE_OR_DIR_TO_DOWNLOAD";

/// Connection parameters for the SFTP server.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    /// Local destination: a directory root when the remote path is a
    /// directory, the exact output file otherwise.
    pub local_dir: PathBuf,
    /// Remote file or directory, relative to the remote working directory
    /// unless absolute.
    pub remote_path: String,
}

// JSON form of the config file; keys are the lowercase variable names.
#[derive(Deserialize)]
struct JsonConfig {
    host_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    port: Option<JsonPort>,
    local_directory_to_save: Option<String>,
    file_or_dir_to_download: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPort {
    Number(u64),
    Text(String),
}

impl Config {
    /// Load the config file at `path`. Process environment variables with the
    /// same names win over values from the file.
    pub fn load(path: &Path) -> Result<Self, MirrorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MirrorError::ConfigUnreadable(path.to_path_buf(), e))?;
        let values = if path.extension().is_some_and(|ext| ext == "json") {
            parse_json(path, &content)?
        } else {
            parse_dotenv(path, &content)?
        };
        Self::from_values(&values, |k| std::env::var(k).ok())
    }

    /// Build a config from parsed file values, consulting `env` first for
    /// every key.
    pub fn from_values<F>(values: &HashMap<String, String>, env: F) -> Result<Self, MirrorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| -> Result<String, MirrorError> {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| values.get(key).cloned())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(MirrorError::ConfigMissingKey(key))
        };
        let host = get(KEY_HOST)?;
        let username = get(KEY_USERNAME)?;
        let password = get(KEY_PASSWORD)?;
        let port = parse_port(&get(KEY_PORT)?)?;
        let local_dir = PathBuf::from(get(KEY_LOCAL_DIR)?);
        let remote_path = get(KEY_REMOTE_PATH)?;
        Ok(Config {
            server: ServerConfig { host, port, username, password },
            local_dir,
            remote_path,
        })
    }
}

/// Default config location: `./sftp_config.txt`, falling back to
/// `~/.sftp-mirror/sftp_config.txt` when the former does not exist.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    match dirs::home_dir() {
        Some(home) => {
            let candidate = crate::util::app_dir(&home).join(DEFAULT_CONFIG_FILE);
            if candidate.exists() { candidate } else { local }
        }
        None => local,
    }
}

fn parse_port(s: &str) -> Result<u16, MirrorError> {
    // accept ":22" as written by people used to "host:port"
    let digits = s.trim().trim_start_matches(':');
    match digits.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(MirrorError::ConfigInvalidPort(s.to_string())),
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// optional `export ` prefix is accepted, and values may be wrapped in
/// matching single or double quotes. A ` #` comment after the value is
/// dropped, whether or not the value is quoted.
pub fn parse_dotenv(path: &Path, content: &str) -> Result<HashMap<String, String>, MirrorError> {
    let mut out = HashMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(MirrorError::ConfigMalformed(path.to_path_buf(), idx + 1, raw.to_string()));
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(MirrorError::ConfigMalformed(path.to_path_buf(), idx + 1, raw.to_string()));
        }
        out.insert(key.to_string(), unquote(value.trim()));
    }
    Ok(out)
}

fn unquote(v: &str) -> String {
    for q in ['"', '\''] {
        if let Some(rest) = v.strip_prefix(q)
            && let Some(end) = rest.find(q)
        {
            let tail = rest[end + 1..].trim_start();
            if tail.is_empty() || tail.starts_with('#') {
                return rest[..end].to_string();
            }
        }
    }
    match v.find(" #") {
        Some(pos) => v[..pos].trim_end().to_string(),
        None => v.to_string(),
    }
}

fn parse_json(path: &Path, content: &str) -> Result<HashMap<String, String>, MirrorError> {
    let raw: JsonConfig = serde_json::from_str(content).map_err(|e| {
        MirrorError::ConfigMalformed(path.to_path_buf(), e.line(), e.to_string())
    })?;
    let mut out = HashMap::new();
    let mut put = |k: &str, v: Option<String>| {
        if let Some(v) = v {
            out.insert(k.to_string(), v);
        }
    };
    put(KEY_HOST, raw.host_url);
    put(KEY_USERNAME, raw.username);
    put(KEY_PASSWORD, raw.password);
    put(
        KEY_PORT,
        raw.port.map(|p| match p {
            JsonPort::Number(n) => n.to_string(),
            JsonPort::Text(s) => s,
        }),
    );
    put(KEY_LOCAL_DIR, raw.local_directory_to_save);
    put(KEY_REMOTE_PATH, raw.file_or_dir_to_download);
    Ok(out)
}
