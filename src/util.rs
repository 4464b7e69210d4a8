use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::transfer::MirrorStats;

/// Try to enable ANSI escape sequence support on Windows consoles.
#[cfg(windows)]
pub fn try_enable_ansi_on_windows() -> bool {
    enable_ansi_support::enable_ansi_support().is_ok()
}

// Terminals elsewhere handle ANSI already.
#[cfg(not(windows))]
pub fn try_enable_ansi_on_windows() -> bool {
    true
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && try_enable_ansi_on_windows()
}

/// Per-user state directory: `~/.sftp-mirror`.
pub fn app_dir(home: &Path) -> PathBuf {
    home.join(".".to_owned() + env!("CARGO_PKG_NAME"))
}

/// Convert a byte count into a human readable string using IEC units (KiB/MiB/GiB).
pub fn human_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GiB", b / GB)
    } else if b >= MB {
        format!("{:.2} MiB", b / MB)
    } else if b >= KB {
        format!("{:.2} KiB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Byte counter shown while the mirror runs. Hidden when `visible` is false
/// (quiet or JSON mode) so nothing but the result reaches stdout.
pub fn init_progress(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {wide_msg}",
    ) {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a concise summary line for a completed run.
pub fn print_summary(stats: &MirrorStats, elapsed_secs: f64) {
    let rate = if elapsed_secs > 0.0 {
        stats.bytes as f64 / 1024.0 / 1024.0 / elapsed_secs
    } else {
        0.0
    };
    let line = format!(
        "Done: {} files, {} directories, {} in {:.2}s ({:.2} MB/s)",
        stats.files,
        stats.dirs,
        human_bytes(stats.bytes),
        elapsed_secs,
        rate
    );
    if use_color() {
        println!("{}", line.green());
    } else {
        println!("{}", line);
    }
}

/// Print a fatal error naming the failing stage to stderr.
pub fn print_failure(stage: &str, err: &dyn std::fmt::Display) {
    let line = format!("{} failed: {}", stage, err);
    if std::io::stderr().is_terminal() && try_enable_ansi_on_windows() {
        eprintln!("{}", line.red());
    } else {
        eprintln!("{}", line);
    }
}

/// Install file logging under `~/.sftp-mirror/logs` for `--verbose` runs.
/// The returned guard must be kept alive until exit to flush the writer.
/// `RUST_LOG` overrides the default `debug` filter.
pub fn init_file_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, "sftp-mirror.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {}", e))?;
    Ok(guard)
}
