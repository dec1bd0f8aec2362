//! # Pharmacy CLI
//!
//! Terminal front-end for the pharmacy backend.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CLI Startup                                      │
//! │                                                                         │
//! │  1. Initialize tracing (RUST_LOG, default "warn,pharmacy=info")        │
//! │  2. Load ClientConfig (file → env → --api-url override)                │
//! │  3. Build PharmacyStore (restores session.json)                        │
//! │  4. Run one command                                                    │
//! │  5. Drain store events (forced logout → "please log in again")         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commands
//! ```text
//! pharmacy-cli login <username> [--password <pw> | PHARMACY_PASSWORD]
//! pharmacy-cli logout | whoami
//! pharmacy-cli medicines | sales | users
//! pharmacy-cli health
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pharmacy_client::{
    Action, ActionOutput, ChannelEmitter, ClientConfig, PharmacyStore, StoreEvent, View,
};
use pharmacy_core::AuthState;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pharmacy-cli", version, about = "Pharmacy management client")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding config and environment.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and remember the session.
    Login {
        username: String,

        #[arg(long, env = "PHARMACY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// List medicines.
    Medicines,

    /// List sales records.
    Sales,

    /// List staff accounts.
    Users,

    /// Check backend and database health.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.clone()).context("loading client config")?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
        config.validate().context("invalid --api-url")?;
    }
    debug!(base_url = %config.api.base_url, backend = %config.storage.backend, "Configuration loaded");

    let (emitter, mut events) = ChannelEmitter::new();
    let store = PharmacyStore::from_config(&config, Arc::new(emitter))
        .context("building client store")?;

    let result = run(&store, cli.command).await;
    report_events(&mut events);
    result
}

async fn run(store: &PharmacyStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            store
                .dispatch(Action::Login { username, password })
                .await?;
            print_identity(store);
        }
        Command::Logout => {
            store.dispatch(Action::Logout).await?;
            println!("Logged out.");
        }
        Command::Whoami => print_identity(store),
        Command::Medicines => {
            fetched(store.dispatch(Action::FetchMedicines).await?, "medicines");
            for m in store.medicines().items() {
                let flag = if m.is_out_of_stock() { "  (out of stock)" } else { "" };
                println!(
                    "{:>5}  {:<24} {:>10.2}  stock {:>5}  {}{}",
                    m.id, m.name, m.price, m.stock, m.manufacturer, flag
                );
            }
        }
        Command::Sales => {
            fetched(store.dispatch(Action::FetchSales).await?, "sales records");
            for s in store.sales().items() {
                println!(
                    "{:>5}  {:<24} x{:<4} {:>10.2}  {}",
                    s.id,
                    s.medicine_name,
                    s.quantity,
                    s.total_price,
                    s.salesperson.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Users => {
            fetched(store.dispatch(Action::FetchUsers).await?, "users");
            for u in store.users().items() {
                println!("{:>5}  {:<20} {}", u.id, u.username, u.role);
            }
        }
        Command::Health => {
            let report = store.health().await?;
            println!("status:   {}", report.status);
            if let Some(db) = &report.database {
                println!("database: {}", db);
            }
            if let Some(err) = &report.error {
                println!("error:    {}", err);
            }
            if !report.is_healthy() {
                anyhow::bail!("backend is unhealthy");
            }
        }
    }
    Ok(())
}

fn fetched(output: ActionOutput, what: &str) {
    if let ActionOutput::Fetched(count) = output {
        println!("{} {}", count, what);
    }
}

fn print_identity(store: &PharmacyStore) {
    match store.auth().state() {
        AuthState::Anonymous => println!("Not logged in."),
        AuthState::Authenticated => {
            let name = store
                .auth()
                .user()
                .and_then(|u| u.display_name().map(str::to_string))
                .unwrap_or_else(|| "unknown user".to_string());
            println!("Logged in as {}.", name);
        }
    }
}

fn report_events(events: &mut UnboundedReceiver<StoreEvent>) {
    while let Ok(event) = events.try_recv() {
        debug!(?event, "Store event");
        if event == StoreEvent::Navigate(View::Login) {
            eprintln!("Your session has expired. Please log in again: pharmacy-cli login <username>");
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show every request
/// - `RUST_LOG=pharmacy_client=trace` - Trace the store only
/// - Default: warnings, plus info from the pharmacy crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pharmacy=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
