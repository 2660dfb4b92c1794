//! # Cashbox Back Office
//!
//! Command-line presentation layer over the session services.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Parse command line (clap)                                          │
//! │  2. Load ShiftConfig  ── --config, platform config dir, CASHBOX_* env  │
//! │  3. Initialize tracing ── RUST_LOG, else [logging].filter, to stderr   │
//! │  4. Open Database      ── WAL, migrations                              │
//! │  5. Run one command                                                    │
//! │        Ok  ──► JSON on stdout, exit 0                                  │
//! │        Err ──► ApiError JSON on stderr, exit 1                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//! ```bash
//! cashbox open term-1-1 cashier-1-1 200.00
//! cashbox sale <SESSION_ID> CASH 50.00
//! cashbox movement <SESSION_ID> WITHDRAWAL 20.00 --description "bank run"
//! cashbox close <SESSION_ID> 230.00
//! cashbox history --status OPEN --limit 10
//! ```

mod commands;
mod error;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cashbox_db::Database;
use cashbox_shift::ShiftConfig;

use commands::{Command, Services};

/// Filter used when neither RUST_LOG nor the config file sets one.
const DEFAULT_LOG_FILTER: &str = "info,cashbox=debug,sqlx=warn";

#[derive(Parser, Debug)]
#[command(name = "cashbox", version, about = "Cash-register session lifecycle and reconciliation")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ShiftConfig::load(cli.config).context("Failed to load configuration")?;
    init_tracing(config.logging.filter.as_deref());

    let db_config = config.db_config().context("Failed to resolve database path")?;
    debug!(path = ?db_config.database_path, "Opening session store");
    let db = Database::new(db_config)
        .await
        .context("Failed to open the session store")?;

    let services = Services::new(db.clone(), &config);
    let result = cli.command.run(&services).await;
    db.close().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(1);
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cashbox_shift=trace` - Trace the lifecycle manager only
/// - `[logging] filter` / `CASHBOX_LOG` - Used when RUST_LOG is unset
fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
