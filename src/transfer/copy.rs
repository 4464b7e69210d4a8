use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use indicatif::ProgressBar;

use super::TransferCtx;
use super::helpers::display_path;
use super::sftp_like::SftpLike;
use crate::MirrorError;

/// Copy one remote file to `local_file`, creating or truncating it.
///
/// The remote handle is opened before the local file is touched, so a failed
/// open leaves the destination alone. Both handles are dropped before this
/// returns, on success and on every error path. A failure mid-stream leaves
/// whatever was already written in place.
pub fn copy_file(
    sftp: &dyn SftpLike,
    remote_file: &Path,
    local_file: &Path,
    ctx: &mut TransferCtx,
) -> Result<u64, MirrorError> {
    let remote_name = remote_file.to_string_lossy();
    let mut remote_f = sftp
        .open_read(remote_file)
        .map_err(|source| MirrorError::RemoteOpen { path: remote_name.to_string(), source })?;
    let mut local_f = File::create(local_file)
        .map_err(|source| MirrorError::LocalCreate { path: local_file.to_path_buf(), source })?;

    let copied = stream_copy(&mut remote_f, &mut local_f, &mut ctx.buf, &ctx.progress).map_err(
        |source| {
            tracing::debug!(
                "[mirror] copy {} -> {} failed: {:?}",
                remote_name,
                display_path(local_file),
                source
            );
            MirrorError::TransferIo {
                remote: remote_name.to_string(),
                local: local_file.to_path_buf(),
                source,
            }
        },
    )?;

    ctx.stats.files += 1;
    ctx.stats.bytes += copied;
    tracing::debug!("[mirror] file {} -> {} ({} bytes)", remote_name, display_path(local_file), copied);
    Ok(copied)
}

/// Pump `reader` into `writer` through `buf` until EOF, then flush.
/// Interrupted reads are retried; any other error ends the copy.
pub(crate) fn stream_copy<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    pb: &ProgressBar,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
        pb.inc(n as u64);
    }
    writer.flush()?;
    Ok(total)
}
