//! bkt - S3 operation runner
//!
//! Runs a fixed sequence of operations against an S3-compatible service,
//! driven by a hot-reloaded JSON configuration file.

use bkt_cli::commands::{self, Cli, normalize_args};
use clap::Parser;

#[tokio::main]
async fn main() {
    // Logging is installed from the configuration file inside execute.
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
