use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use fpl_axiom::app::AppContext;
use fpl_axiom::config::{self, Config};
use fpl_axiom::health::spawn_health_ticker;
use fpl_axiom::{logging, server};

/// Resilient FPL stats service: cached acquisition, health alerts, and classified data over HTTP.
#[derive(Debug, Parser)]
#[command(name = "fpl_axiom", version)]
struct Args {
    /// Listen address, overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Seconds between health probes, overrides HEALTH_POLL_SECS.
    #[arg(long)]
    health_interval: Option<u64>,

    /// Skip the background health ticker.
    #[arg(long)]
    no_ticker: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();

    let mut cfg = Config::from_env()?;
    if let Some(bind) = args.bind {
        cfg.bind_addr = bind;
    }
    if let Some(secs) = args.health_interval {
        cfg.health_interval = std::time::Duration::from_secs(secs.max(10));
    }
    logging::init(&cfg);

    // Blocking http clients must be built outside the async runtime.
    let ctx = Arc::new(AppContext::from_config(cfg)?);
    info!(
        upstream = %ctx.config.dataset_url(),
        proxy = ctx.config.proxy_host().as_deref().unwrap_or("none"),
        cache_ttl_secs = ctx.config.cache_ttl.as_secs(),
        notifications = ctx.dispatcher.is_enabled(),
        "starting fpl_axiom"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let ticker = if args.no_ticker {
        None
    } else {
        Some(spawn_health_ticker(
            ctx.monitor.clone(),
            ctx.config.health_interval,
            shutdown.clone(),
        ))
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let served = runtime.block_on(server::serve(
        ctx.clone(),
        ctx.config.bind_addr,
        shutdown_signal(),
    ));
    drop(runtime);

    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = ticker {
        if handle.join().is_err() {
            warn!("health ticker panicked");
        }
    }
    info!("shutdown complete");
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received, shutting down");
}
