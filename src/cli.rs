use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(
        short = 'c',
        long = "config",
        help = "Config file (KEY=VALUE lines or .json); default ./sftp_config.txt"
    )]
    pub config: Option<PathBuf>,
    #[clap(long = "remote", help = "Override FILE_OR_DIR_TO_DOWNLOAD")]
    pub remote: Option<String>,
    #[clap(long = "local", help = "Override LOCAL_DIRECTORY_TO_SAVE")]
    pub local: Option<PathBuf>,
    #[clap(long = "buf-mib", default_value_t = 1, help = "Copy buffer size in MiB")]
    pub buf_mib: usize,
    #[clap(short, long, help = "Write debug logs to ~/.sftp-mirror/logs")]
    pub verbose: bool,
    #[clap(long, help = "Print a single JSON line with the result")]
    pub json: bool,
    #[clap(short, long, help = "Print nothing on success")]
    pub quiet: bool,
}

impl Cli {
    pub fn buf_size(&self) -> usize {
        self.buf_mib.clamp(1, 64) * 1024 * 1024
    }
}
