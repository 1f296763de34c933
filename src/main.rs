//! adb-verify - ADB platform-tools download verifier
//!
//! Entry point for file verification and ledger maintenance.

mod cli;

use adb_verify::config;
use clap::Parser;
use cli::{Args, Commands, FetchOptions};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Handle subcommands first
    if let Some(Commands::Config { action }) = args.command.take() {
        return cli::handle_config(action, args.config.as_deref());
    }

    let config = config::load(args.config.as_deref())?;

    if args.fetch_missing_sha256 {
        tracing::info!("Checking ledger for missing SHA-256 values");
        return cli::fetch_missing(&FetchOptions::from_args(&args), &config).await;
    }

    match &args.file_path {
        Some(path) => cli::verify_file(path, args.algorithm, args.expected_hash.as_deref(), &config),
        None => anyhow::bail!("No file specified"),
    }
}
