use anyhow::Context;
use apipulse_core::AppConfig;
use apipulse_ingest::geoip::GeoIpResolver;
use apipulse_ingest::handler::AppState;
use apipulse_ingest::ratelimit::RateLimiter;
use apipulse_ingest::server;
use apipulse_storage::PgEventStore;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "apipulse", version, about = "apipulse — API-usage telemetry ingestion server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/apipulse/apipulse.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "apipulse starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        AppConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        AppConfig::default()
    };

    // ── Storage ──
    let store = PgEventStore::connect(&config.database)
        .await
        .context("connecting to Postgres")?;

    // ── GeoIP ──
    let resolver = GeoIpResolver::open(Path::new(&config.geoip.database_path));

    // ── Rate limiter + stale-key sweep ──
    let limiter = Arc::new(RateLimiter::new(
        config.ratelimit.count,
        Duration::from_secs(config.ratelimit.window_secs),
    ));
    let sweeper = Arc::clone(&limiter);
    let sweep_period = Duration::from_secs(config.ratelimit.window_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_period);
        loop {
            ticker.tick().await;
            sweeper.sweep();
        }
    });

    let state = Arc::new(AppState {
        limiter,
        resolver: Arc::new(resolver),
        store: Arc::new(store),
        max_rows_per_batch: config.ingest.max_rows_per_batch,
    });

    server::serve(&config.server.listen_addr, state).await
}
