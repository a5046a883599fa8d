//! placesync: place-of-business sync CLI.
//!
//! # Usage
//!
//! ```text
//! placesync sync [--from <lang>] [--to <lang>] [--dry-run]
//! placesync import [--dry-run]
//! placesync records [--lang <lang>] [--json]
//! placesync --store <path> <command>
//! ```
//!
//! Remote access is configured through `TAMPERE_API_URL` and
//! `TAMPERE_API_AUTH`; see `placesync_core::config` for the rest.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{import::ImportArgs, records::RecordsArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "placesync",
    version,
    about = "Sync place-of-business records from the remote JSON export",
    long_about = None,
)]
struct Cli {
    /// Record store file (overrides PLACESYNC_STORE and ~/.placesync/records.json).
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile one language pair.
    Sync(SyncArgs),

    /// Reconcile every configured language.
    Import(ImportArgs),

    /// List records in the local store.
    Records(RecordsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(cli.store),
        Commands::Import(args) => args.run(cli.store),
        Commands::Records(args) => args.run(cli.store),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
