//! CLI definition and run orchestration
//!
//! bkt has no subcommands: every invocation bootstraps configuration and
//! logging, starts the config watcher, then drives the fixed step sequence.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use bkt_core::{
    ConfigManager, ConfigStore, ConfigWatcher, DEFAULT_CONFIG_PATH, LogSwitch, Logger,
};
use bkt_s3::S3Client;
use clap::Parser;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod copy;
mod download;
mod ls;
mod purge;
pub mod sequence;
mod upload;

#[cfg(test)]
mod memory;

pub use upload::DEFAULT_UPLOAD_FILE;

/// bkt - S3 operation runner
///
/// Uploads a file, lists buckets and objects, downloads the file back,
/// copies it to a second bucket and finally empties both buckets.
/// The JSON configuration file is reloaded whenever it is written.
#[derive(Parser, Debug)]
#[command(name = "bkt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, env = "BKT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub conf: PathBuf,

    /// Local file uploaded by the first step
    #[arg(long, default_value = DEFAULT_UPLOAD_FILE)]
    pub upload_file: PathBuf,

    /// Exit after the sequence instead of waiting for Ctrl+C
    #[arg(long, default_value = "false")]
    pub once: bool,

    /// Output format: human-readable or JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Rewrite single-dash `-conf` spellings into `--conf`
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-conf") => OsString::from("--conf"),
            Some(s) if s.starts_with("-conf=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

/// Execute the run and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };
    let formatter = Formatter::new(output_config);

    let manager = ConfigManager::with_path(&cli.conf);
    let config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    let logger = match Logger::new(config.logs.common.as_ref()) {
        Ok(l) => Arc::new(l),
        Err(e) => {
            formatter.error(&format!("Could not create logger: {e}"));
            return ExitCode::GeneralError;
        }
    };
    let switch = match LogSwitch::install(&logger) {
        Ok(s) => s,
        Err(e) => {
            formatter.error(&format!("Could not install logger: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let store = Arc::new(ConfigStore::new(manager, config, logger, switch));

    let reload_store = Arc::clone(&store);
    let watcher = match ConfigWatcher::start(&cli.conf, move |path| {
        match reload_store.reload() {
            Ok(outcome) => tracing::debug!(
                path = %path.display(),
                logger_rebuilt = outcome.logger_rebuilt,
                "Config reloaded"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Config reload failed"),
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    let config = store.config();
    let client = match S3Client::new(&config.storage()).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Unable to create S3 client: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let plan = sequence::RunPlan {
        upload_file: cli.upload_file,
        download_dir: PathBuf::from("."),
    };

    tokio::select! {
        result = sequence::run(&client, &config, &plan, &formatter) => {
            if let Err(failure) = result {
                tracing::error!(step = failure.step, error = %failure.error, "Run failed");
                formatter.error(&failure.to_string());
                return ExitCode::GeneralError;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted before the run completed");
            formatter.warning("Interrupted, remaining operations skipped");
            return ExitCode::Interrupted;
        }
    }

    formatter.success("All operations completed");

    if !cli.once {
        tracing::info!(config = %watcher.path().display(), "Watching config, press Ctrl+C to exit");
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl+C");
        }
    }

    watcher.close();
    ExitCode::Success
}
