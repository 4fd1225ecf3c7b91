//! firewatch-sentinel - Fire Detection Sentinel
//!
//! Polls satellite hotspot feeds over the monitored area, fuses detections
//! into persistent fire events, and escalates alerts for new fires.
//!
//! One invocation runs exactly one polling cycle; repetition is the
//! scheduler's job (cron, systemd timer, CI workflow).

use anyhow::Result;
use clap::Parser;
use firewatch_sentinel::config::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use firewatch_sentinel::services::{
    AlertGate, FirmsAdapter, FirmsFeed, GroundTruthVerifier, LogNotifier, Notifier,
    OverpassClient, TelegramNotifier,
};
use firewatch_sentinel::{FeedBinding, Sentinel, SentinelConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// FIRMS polar products polled each cycle: (source tag, product path name)
const FIRMS_PRODUCTS: [(&str, &str); 3] = [
    ("VIIRS_SNPP", "VIIRS_SNPP_NRT"),
    ("VIIRS_NOAA20", "VIIRS_NOAA20_NRT"),
    ("MODIS", "MODIS_NRT"),
];

#[derive(Parser, Debug)]
#[command(name = "firewatch-sentinel", about = "Satellite fire detection sentinel")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the store database path
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting firewatch-sentinel");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = firewatch_common::config::resolve_config_path(
        args.config.as_deref(),
        ENV_CONFIG_PATH,
        DEFAULT_CONFIG_PATH,
    );
    let mut config: SentinelConfig = firewatch_common::config::load_toml(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config = config.apply_env_overrides();

    if let Some(database) = args.database {
        config.database_path = database;
    }
    info!("Store: {}", config.database_path.display());

    let db = firewatch_sentinel::db::init_pool(&config.database_path).await?;
    info!("Store connection established");

    let mut feeds = Vec::new();
    if config.firms_api_key.is_empty() {
        warn!("No FIRMS API key configured, polar feeds disabled");
    } else {
        for (tag, product) in FIRMS_PRODUCTS {
            let feed = FirmsFeed::new(
                tag,
                product,
                &config.firms_api_key,
                &config.area_bbox,
                config.feed_timeout(),
            )
            .map_err(|e| anyhow::anyhow!("Failed to build {} feed: {}", tag, e))?;

            feeds.push(FeedBinding {
                feed: Box::new(feed),
                adapter: Box::new(FirmsAdapter::new(tag)),
            });
        }
    }
    info!("Feeds configured: {}", feeds.len());

    let oracle = OverpassClient::new(config.oracle_timeout())
        .map_err(|e| anyhow::anyhow!("Failed to build oracle client: {}", e))?;
    let verifier = GroundTruthVerifier::new(
        Box::new(oracle),
        config.verify_min_frp_mw,
        config.artifact_ceiling_mw,
        config.oracle_timeout(),
    );

    let gate = AlertGate::new(config.alert_global_frp_mw, config.alert_secondary_frp_mw);

    let notifier: Box<dyn Notifier> = if config.telegram_bot_token.is_empty() {
        warn!("No Telegram bot token configured, alerts will be logged only");
        Box::new(LogNotifier)
    } else {
        Box::new(
            TelegramNotifier::new(
                &config.telegram_bot_token,
                config.telegram_chat_ids.clone(),
                config.notify_timeout(),
            )
            .map_err(|e| anyhow::anyhow!("Failed to build notifier: {}", e))?,
        )
    };

    let sentinel = Sentinel::new(db, feeds, verifier, gate, notifier, &config);
    let summary = sentinel.run_cycle().await;

    info!(
        "Cycle summary: {} detections, {} clusters, {} inserted, {} merged, {} alerts",
        summary.detections, summary.clusters, summary.inserted, summary.merged, summary.alerts_sent
    );

    Ok(())
}
