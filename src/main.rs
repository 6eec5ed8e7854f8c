// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use routeflare::{
    config::{load_dotenv, Config, DotenvStatus},
    constants::{DOTENV_FILE, ENV_LOG_FORMAT, TOKIO_THREAD_NAME, TOKIO_WORKER_THREADS},
    context::Context,
    scheduler,
};
use std::path::Path;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Apply .env before any thread exists; RUST_LOG and friends may come from it
    let dotenv = load_dotenv(Path::new(DOTENV_FILE));

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(TOKIO_THREAD_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(dotenv))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(dotenv: DotenvStatus) -> Result<()> {
    init_logging();

    info!("Starting routeflare");
    debug!("Logging initialized with file and line number tracking");

    match dotenv {
        DotenvStatus::Loaded(path) => info!(path = %path.display(), "Loaded settings from .env file"),
        DotenvStatus::NotFound => debug!("No .env file found, using process environment only"),
        DotenvStatus::Failed(reason) => warn!("Ignoring unreadable .env file: {}", reason),
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    info!(
        cluster_domain = %config.cluster_domain,
        controller_url = %config.controller_url,
        cloudflare_api_url = %config.cloudflare_api_url,
        interval_secs = config.reconcile_interval.as_secs(),
        "Configuration loaded"
    );
    if config.controller_tls_insecure {
        warn!("TLS certificate verification is disabled for the controller");
    }

    debug!("Creating controller and Cloudflare clients");
    let ctx = Context::new(config)?;

    let passes = scheduler::run(&ctx, shutdown_signal()).await;

    info!(passes = passes, "Graceful shutdown completed successfully");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires; the other one
/// still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
