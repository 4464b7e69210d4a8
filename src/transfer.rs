// transfer module: remote tree classification, mirroring and the top-level run
mod copy;
mod helpers;
#[cfg(test)]
mod mock_io;
mod session;
mod sftp_like;
mod walk;

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;

use crate::MirrorError;
use crate::config::Config;

pub use copy::copy_file;
pub use helpers::{clean_remote, join_remote, join_remote_path, normalize_path, resolve_remote_root};
pub use session::{connect_session, open_sftp, remote_working_dir};
pub use sftp_like::{EntryKind, RemoteEntry, RemoteMetadata, SftpLike, Ssh2Adapter};
pub use walk::mirror_directory;

/// Default copy buffer, overridable with `--buf-mib`.
pub const DEFAULT_BUF_SIZE: usize = 1024 * 1024;

/// Counters accumulated over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MirrorStats {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

/// Mutable state threaded through every transfer call: the reusable copy
/// buffer, the running counters and the progress display.
pub struct TransferCtx {
    buf: Vec<u8>,
    stats: MirrorStats,
    progress: ProgressBar,
}

impl TransferCtx {
    pub fn new(buf_size: usize) -> Self {
        Self::with_progress(buf_size, ProgressBar::hidden())
    }

    pub fn with_progress(buf_size: usize, progress: ProgressBar) -> Self {
        Self { buf: vec![0u8; buf_size.max(1)], stats: MirrorStats::default(), progress }
    }

    pub fn stats(&self) -> MirrorStats {
        self.stats
    }
}

/// What the remote root turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    File,
    Dir,
}

/// Stat `remote_root` once and dispatch: directories are mirrored into
/// `local_root`, anything else is copied to exactly `local_root` as a file.
/// A failed stat aborts before anything is written.
pub fn resolve(
    sftp: &dyn SftpLike,
    remote_root: &str,
    local_root: &Path,
    ctx: &mut TransferCtx,
) -> Result<RootKind, MirrorError> {
    let meta = sftp
        .stat(Path::new(remote_root))
        .map_err(|source| MirrorError::RemoteLookup { path: remote_root.to_string(), source })?;

    if meta.is_dir() {
        tracing::debug!("[mirror] {} is a directory", remote_root);
        mirror_directory(sftp, remote_root, local_root, ctx)?;
        Ok(RootKind::Dir)
    } else {
        tracing::debug!("[mirror] {} is a {:?}, copying as one file", remote_root, meta.kind);
        if let Some(size) = meta.size {
            ctx.progress.set_length(size);
        }
        copy_file(sftp, Path::new(remote_root), local_root, ctx)?;
        Ok(RootKind::File)
    }
}

/// Options for `run_mirror` grouped to avoid too-many-arguments lint.
#[derive(Clone, Debug)]
pub struct MirrorArgs {
    pub json: bool,
    pub quiet: bool,
    pub buf_size: usize,
}

/// Result of a completed run, printed by `finalize_transfer`.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub remote_root: String,
    pub local_root: PathBuf,
    pub kind: RootKind,
    #[serde(flatten)]
    pub stats: MirrorStats,
    pub elapsed_secs: f64,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// Full run: connect, find the remote working directory, resolve the remote
/// root against it, then dispatch. The SSH session lives for the whole call.
pub fn run_mirror(config: &Config, args: &MirrorArgs) -> Result<RunSummary, MirrorError> {
    let addr = config.server.addr();
    tracing::info!("[run] connecting to {} as {}", addr, config.server.username);
    let sess = connect_session(&config.server)?;
    let sftp = open_sftp(&sess, &addr)?;

    let cwd = remote_working_dir(&sftp)?;
    let chatty = !args.quiet && !args.json;
    if chatty {
        println!("Working Directory: {}", cwd);
    }
    let remote_root = resolve_remote_root(&cwd, &config.remote_path);
    tracing::info!(
        "[run] mirroring {} -> {}",
        remote_root,
        helpers::display_path(&config.local_dir)
    );

    let pb = crate::util::init_progress(chatty);
    let mut ctx = TransferCtx::with_progress(args.buf_size, pb.clone());
    let start = Instant::now();
    let outcome = resolve(&sftp, &remote_root, &config.local_dir, &mut ctx);
    pb.finish_and_clear();
    let kind = outcome?;

    Ok(RunSummary {
        remote_root,
        local_root: config.local_dir.clone(),
        kind,
        stats: ctx.stats(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        finished_at: chrono::Utc::now(),
    })
}

/// Print the human summary (unless quiet) and, in JSON mode, one JSON line.
pub fn finalize_transfer(summary: &RunSummary, args: &MirrorArgs) {
    if args.json {
        let obj = serde_json::json!({ "ok": true, "summary": summary });
        if let Ok(line) = serde_json::to_string(&obj) {
            println!("{}", line);
        }
    } else if !args.quiet {
        crate::util::print_summary(&summary.stats, summary.elapsed_secs);
    }
}
