/// Main entry point for the Zenith habit tracker server
///
/// This file sets up logging, parses command line arguments, and starts the
/// JSON-RPC server. Requests arrive on stdin and responses leave on stdout,
/// one JSON message per line; logs go to stderr.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use zenith_habits::{Config, DayBoundary, ZenithServer};

/// Command line arguments for the Zenith habit tracker server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Offset from UTC at which calendar days roll over (e.g. +02:00)
    #[arg(long, default_value = "utc", allow_hyphen_values = true)]
    utc_offset: DayBoundary,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Config::resolve(args.database, args.utc_offset, args.debug, args.verbose)?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter())
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Zenith habit tracker");
    info!("Using database at: {}", config.database.display());

    let server = ZenithServer::new(&config)?;
    server.run().await?;

    info!("Zenith habit tracker shutdown complete");
    Ok(())
}
