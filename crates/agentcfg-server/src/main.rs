//! agentcfg server - main entry point

use agentcfg::{ElasticsearchStore, RefreshSettings, ServiceMatcher};
use agentcfg_common::init_logging;
use agentcfg_config::ConfigLoader;
use agentcfg_server::router;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Address to listen on, overrides the configuration file
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(listen) = args.listen {
        config.server.listen_address = listen;
    }

    init_logging((&config.logging).into()).map_err(|e| anyhow!(e))?;
    info!("Starting agentcfg server");

    let store = ElasticsearchStore::new(&config.elasticsearch)?;
    let settings = RefreshSettings::from(&config.cache);
    info!(
        url = %config.elasticsearch.url,
        index = %config.elasticsearch.index,
        interval = ?settings.interval,
        "Configured agent configuration source"
    );

    let (scheduler, dispatcher) = agentcfg::build(store, &settings, ServiceMatcher);
    let cancel = CancellationToken::new();

    let refresher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match scheduler.run(cancel).await {
                Ok(()) => warn!("Agent configuration refresher stopped after a permanent upstream failure"),
                Err(err) => info!(reason = %err, "Agent configuration refresher stopped"),
            }
        }
    });

    let listener = TcpListener::bind(&config.server.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
    info!(address = %listener.local_addr()?, "Listening for agent configuration requests");

    axum::serve(listener, router(Arc::new(dispatcher)))
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("HTTP server failed")?;

    cancel.cancel();
    if let Err(err) = refresher.await {
        error!(error = %err, "Refresher task panicked");
    }

    info!("agentcfg server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels the refresh loop.
async fn shutdown_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(err) => {
            error!(error = %err, "Failed to listen for Ctrl-C");
            cancel.cancelled().await;
        }
    }
    cancel.cancel();
}
