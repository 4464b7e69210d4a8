use std::process::ExitCode;

use clap::Parser;

use sftp_mirror::MirrorError;
use sftp_mirror::cli::Cli;
use sftp_mirror::config::{Config, default_config_path};
use sftp_mirror::transfer::{MirrorArgs, finalize_transfer, run_mirror};
use sftp_mirror::util;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = if cli.verbose {
        match dirs::home_dir() {
            Some(home) => {
                match util::init_file_logging(&util::app_dir(&home).join("logs")) {
                    Ok(g) => Some(g),
                    Err(e) => {
                        eprintln!("warning: verbose logging disabled: {:#}", e);
                        None
                    }
                }
            }
            None => {
                eprintln!("warning: cannot find home directory, verbose logging disabled");
                None
            }
        }
    } else {
        None
    };

    let args = MirrorArgs { json: cli.json, quiet: cli.quiet, buf_size: cli.buf_size() };
    match run(&cli, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, &args);
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli, args: &MirrorArgs) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    tracing::info!("[run] loading config from {}", config_path.display());
    let mut config = Config::load(&config_path)?;
    if let Some(remote) = &cli.remote {
        config.remote_path = remote.clone();
    }
    if let Some(local) = &cli.local {
        config.local_dir = local.clone();
    }

    let summary = run_mirror(&config, args)?;
    tracing::info!(
        "[run] done: files={} dirs={} bytes={}",
        summary.stats.files,
        summary.stats.dirs,
        summary.stats.bytes
    );
    finalize_transfer(&summary, args);
    Ok(())
}

fn report_failure(err: &anyhow::Error, args: &MirrorArgs) {
    tracing::error!("[run] {:#}", err);
    let stage = match err.downcast_ref::<MirrorError>() {
        Some(me) => me.stage().to_string(),
        None => "setup".to_string(),
    };
    util::print_failure(&stage, &format!("{:#}", err));
    if args.json {
        let detail = match err.downcast_ref::<MirrorError>() {
            Some(me) => me.to_json(),
            None => serde_json::json!({ "stage": stage, "message": format!("{:#}", err) }),
        };
        let obj = serde_json::json!({ "ok": false, "error": detail });
        if let Ok(line) = serde_json::to_string(&obj) {
            println!("{}", line);
        }
    }
}
