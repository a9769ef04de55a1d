use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sdci_api::{BearerToken, HttpApi, ServiceApiAdapter};
use sdci_core::{TaskResolver, TaskService};
use sdci_exec::{ProcConfig, ScriptRunner};
use sdci_observe::logger_init;
use sdci_prometheus::PrometheusMetrics;

mod config;
mod metrics;

use config::ServerConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config
    let cfg = ServerConfig::parse();
    if let Err(e) = cfg.validate() {
        eprintln!("SDCI - v{VERSION} - {e}");
        std::process::exit(1);
    }
    let token = BearerToken::new(cfg.token.as_deref().unwrap_or_default());

    // 2) Logger
    logger_init(&cfg.logger())?;
    info!("*******************************");
    info!("SDCI - SERVER - v{VERSION}");
    info!("*******************************");

    // 3) Engine
    let runner = ScriptRunner::new(ProcConfig::new(cfg.interpreter.clone()));
    let metrics = PrometheusMetrics::new()?;
    let service = TaskService::new(TaskResolver::new(&cfg.tasks_dir), Arc::new(runner))
        .with_timeout(cfg.timeout())
        .with_output_capacity(cfg.output_buffer)
        .with_metrics(Arc::new(metrics.clone()));
    info!(
        tasks_dir = %cfg.tasks_dir.display(),
        interpreter = %cfg.interpreter,
        timeout_ms = cfg.timeout_ms,
        output_buffer = cfg.output_buffer,
        "engine ready"
    );

    // 4) HTTP
    let adapter = Arc::new(ServiceApiAdapter::new(Arc::new(service)));
    let mut app = HttpApi::new(adapter, token).router();
    if !cfg.disable_metrics {
        app = app.merge(metrics::router(metrics));
    }

    let addr = cfg.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "Ready to rock! /o/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SDCI - Shutting down system");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
