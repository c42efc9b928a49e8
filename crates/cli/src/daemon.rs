//! Service lifecycle
//!
//! Startup order matters: pre-existing files are reconciled before the
//! watch is registered, and the dispatcher drains its timers before exit.

use crate::Config;
use anyhow::{Context, Result};
use client::PaperlessClient;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use watcher::{Dispatcher, DispatcherConfig, Processor, Reconciler, WatchSource};

/// Run until SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Run until `shutdown` resolves or the watch streams close
///
/// Errors only for fatal startup conditions: the watch directory cannot be
/// listed or the watch cannot be registered.
pub async fn run_until(config: Config, shutdown: impl Future<Output = ()>) -> Result<()> {
    info!(
        watchdir = %config.watch_dir.display(),
        paperless_host = %config.paperless_host,
        "starting paperproxy"
    );

    let client = Arc::new(PaperlessClient::new(&config.paperless_host, config.api_key.clone()));
    let processor = Arc::new(Processor::new(client, config.tag));

    Reconciler::new(processor.clone())
        .reconcile(&config.watch_dir)
        .await
        .context("failed to list directory for startup reconcile")?;

    let dispatcher = Dispatcher::new(
        processor,
        DispatcherConfig {
            evict_after: config.evict_after(),
        },
    );

    let (source, streams) =
        WatchSource::new(&config.watch_dir).context("failed to add watchdir")?;

    tokio::select! {
        _ = dispatcher.run(streams) => warn!("watch streams closed"),
        _ = shutdown => info!("shutdown requested"),
    }

    drop(source);
    dispatcher.shutdown().await;

    info!("paperproxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
