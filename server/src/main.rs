//! Pane Licensing Server
//!
//! Backend trust component for the Pane desktop utility: issues license
//! keys, exchanges them for hardware-bound bearer tokens on activation,
//! and answers the client's periodic validation polls.
//!
//! Usage:
//!   pane-server --port 8000 --db pane.db
//!
//! The admin scope stays disabled until a shared secret is configured via
//! `--admin-secret` or `ADMIN_SECRET`.

use anyhow::{Context, Result};
use clap::Parser;
use pane_db::Db;
use pane_license::{
    ActivationBinder, DEFAULT_TTL_DAYS, KeyRegistry, SharedClock, SystemClock, TierResolver,
    TokenStore,
};
use pane_server::{AppState, build_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pane-server")]
#[command(about = "Pane licensing and activation server")]
struct Args {
    /// Port for the HTTP API
    #[arg(short, long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Path to the SQLite database
    #[arg(long, default_value = "pane.db", env = "PANE_DB")]
    db: PathBuf,

    /// Shared admin secret; admin endpoints stay disabled when unset
    #[arg(long, env = "ADMIN_SECRET")]
    admin_secret: Option<String>,

    /// Token validity window in days
    #[arg(long, default_value_t = DEFAULT_TTL_DAYS, env = "TOKEN_TTL_DAYS")]
    ttl_days: u32,

    /// Download URL returned with successful activations and validations
    #[arg(
        long,
        default_value = "https://www.paneapp.io/downloads/pro",
        env = "PANE_DOWNLOAD_URL"
    )]
    download_url: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Pane licensing server starting...");
    let db = Arc::new(Db::open(&args.db).context("failed to open database")?);
    info!("database ready at {}", args.db.display());

    let clock: SharedClock = Arc::new(SystemClock);
    let registry = Arc::new(KeyRegistry::new(db.clone(), clock.clone()));
    let tokens = Arc::new(TokenStore::new(db.clone(), clock.clone(), args.ttl_days));
    let binder = Arc::new(ActivationBinder::new(
        db.clone(),
        tokens.clone(),
        clock.clone(),
    ));
    let resolver = Arc::new(TierResolver::new(db, clock));

    if args.admin_secret.is_none() {
        warn!("no admin secret configured; admin endpoints are disabled");
    }

    let state = AppState {
        registry,
        binder,
        tokens,
        resolver,
        admin_secret: args.admin_secret,
        download_url: args.download_url,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .context("failed to bind HTTP port")?;
    info!("HTTP API listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
