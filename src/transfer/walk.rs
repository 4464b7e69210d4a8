use std::path::{Path, PathBuf};

use super::TransferCtx;
use super::copy::copy_file;
use super::helpers::{display_path, join_remote_path};
use super::sftp_like::{EntryKind, RemoteEntry, SftpLike};
use crate::MirrorError;

// One directory on the walk stack. `entries` holds the children not visited yet.
struct Frame {
    remote: PathBuf,
    local: PathBuf,
    canonical: PathBuf,
    entries: std::vec::IntoIter<RemoteEntry>,
}

/// Replicate the remote directory `remote_dir` into `local_dir`.
///
/// Depth-first, strictly sequential, in the order the server lists entries;
/// a subdirectory is finished before its next sibling starts. The walk keeps
/// an explicit stack instead of recursing. The first error aborts the whole
/// walk; files and directories written before it stay on disk.
///
/// Entry names are carried as raw bytes into both the remote and the local
/// path. The cycle guard costs one extra `realpath` call per directory.
pub fn mirror_directory(
    sftp: &dyn SftpLike,
    remote_dir: &str,
    local_dir: &Path,
    ctx: &mut TransferCtx,
) -> Result<(), MirrorError> {
    let root = enter_dir(sftp, PathBuf::from(remote_dir), local_dir.to_path_buf(), &[], ctx)?;
    let mut stack = vec![root];

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.entries.next() else {
            stack.pop();
            continue;
        };
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        let child_remote = join_remote_path(&frame.remote, &entry.name);
        let child_local = frame.local.join(&entry.name);

        match entry.kind {
            EntryKind::Dir => {
                let child = enter_dir(sftp, child_remote, child_local, &stack, ctx)?;
                stack.push(child);
            }
            EntryKind::File => {
                copy_file(sftp, &child_remote, &child_local, ctx)?;
            }
            EntryKind::Other => {
                tracing::debug!(
                    "[mirror] {} is not a regular file, attempting plain transfer",
                    child_remote.display()
                );
                copy_file(sftp, &child_remote, &child_local, ctx)?;
            }
        }
    }
    Ok(())
}

fn lossy(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

// list -> mkdir, in that order: an unreadable directory leaves no local trace
fn enter_dir(
    sftp: &dyn SftpLike,
    remote: PathBuf,
    local: PathBuf,
    ancestors: &[Frame],
    ctx: &mut TransferCtx,
) -> Result<Frame, MirrorError> {
    let canonical = sftp
        .realpath(&remote)
        .map_err(|source| MirrorError::RemoteList { path: lossy(&remote), source })?;
    if let Some(anc) = ancestors.iter().find(|a| a.canonical == canonical) {
        return Err(MirrorError::CycleDetected {
            path: lossy(&remote),
            ancestor: lossy(&anc.remote),
        });
    }

    let entries = sftp
        .read_dir(&remote)
        .map_err(|source| MirrorError::RemoteList { path: lossy(&remote), source })?;

    std::fs::create_dir_all(&local)
        .map_err(|source| MirrorError::LocalMkdir { path: local.clone(), source })?;
    ctx.stats.dirs += 1;
    tracing::debug!(
        "[mirror] dir {} -> {} ({} entries)",
        remote.display(),
        display_path(&local),
        entries.len()
    );

    Ok(Frame { remote, local, canonical, entries: entries.into_iter() })
}
