use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use wg_exporter::{Args, PeerMetrics, Scraper, WgCommandSource, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    wg_exporter::logging::init_dual_logging();

    let args = Args::parse();

    let mut config = wg_exporter::load_config_with_fallback(&args.config)?;
    args.apply_to(&mut config)?;
    config.validate()?;

    let metrics = PeerMetrics::new().context("failed to build metrics registry")?;

    let scraper = Scraper::new(
        Arc::new(WgCommandSource::new()),
        metrics.clone(),
        config.scrape.clone(),
    );
    tokio::spawn(scraper.run());

    if config.auth.is_enabled() {
        info!("basic authentication enabled for /metrics");
    } else {
        info!("basic authentication disabled");
    }

    let app = build_router(metrics, config.auth.clone());

    let listen_addr = config.exporter.listen_addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    info!("starting WireGuard exporter on {}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
