//! # pagefeed CLI
//!
//! Drives the paginated loader against a configured JSON list API.
//!
//! ## Usage
//!
//! ```bash
//! pagefeed --config ./config/pagefeed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pagefeed list` | Load pages and print items |
//! | `pagefeed artifacts` | Load pages and resolve every item's artifact |
//!
//! ## Examples
//!
//! ```bash
//! # First three pages, as a table
//! pagefeed list --pages 3
//!
//! # Every page, raw records as JSON
//! pagefeed list --json > items.json
//!
//! # Download all flags, one JSON progress event per page on stderr
//! pagefeed artifacts --out ./flags --progress json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use pagefeed::config;
use pagefeed::observer::ObserverMode;
use pagefeed::session::Session;
use pagefeed::{artifacts_cmd, list_cmd};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pagefeed: cursor-paginated list loading with artifact caching.
#[derive(Parser)]
#[command(
    name = "pagefeed",
    about = "pagefeed: cursor-paginated list loading with artifact caching",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pagefeed.toml")]
    config: PathBuf,

    /// Load progress on stderr. Defaults to `human` on a TTY, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ObserverMode>,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load pages and print the items.
    ///
    /// Refreshes, then keeps loading the next page while the last item
    /// asks for more, exactly like a list scrolled to the bottom.
    List {
        /// Stop after this many pages (including the first).
        #[arg(long)]
        pages: Option<usize>,

        /// Print raw item records as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Load pages, then resolve every item's artifact.
    ///
    /// Failed downloads show up as placeholders and are not cached.
    Artifacts {
        /// Stop after this many pages (including the first).
        #[arg(long)]
        pages: Option<usize>,

        /// Write each artifact to this directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pagefeed=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;
    let mode = cli.progress.unwrap_or_else(ObserverMode::default_for_tty);
    let session = Session::from_config(&cfg, mode.observer())?;

    match cli.command {
        Commands::List { pages, json } => {
            list_cmd::run_list(&session.collection, pages, json).await?;
        }
        Commands::Artifacts { pages, out } => {
            artifacts_cmd::run_artifacts(&session, pages, out.as_deref()).await?;
        }
    }

    Ok(())
}
