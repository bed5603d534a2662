//! weft CLI binary.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use weft::cli::{args::*, commands::*};

#[tokio::main]
async fn main() {
    let args = WeftArgs::parse();

    // RUST_LOG overrides the level derived from -v/-q.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = execute_command(args).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
