//! fairprice-server - crowdsourced commodity price reporting service
//!
//! Startup order: tracing, build identification, configuration, database,
//! collaborators, then the HTTP listener with graceful shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use fairprice_common::config::{load_toml_config, ServiceConfig, DEFAULT_LOG_LEVEL};
use fairprice_common::db::init_database;
use fairprice_server::cli::Args;
use fairprice_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The file is read before tracing starts so its log level can apply;
    // a read failure is reported once logging is up.
    let file_config = load_toml_config(args.config.as_deref());

    // RUST_LOG wins over --log-level, which wins over [logging] level
    let level = args
        .log_level
        .clone()
        .or_else(|| file_config.as_ref().ok().and_then(|c| c.logging.level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", level))),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting FairPrice server (fairprice-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let file_config = file_config.context("Failed to load config file")?;
    let config = ServiceConfig::resolve(args.overrides(), file_config).context("Invalid configuration")?;
    info!("Deployment variant: {}", config.variant.as_str());
    info!("Database path: {}", config.database_path.display());
    if let Some(url) = &config.ml_url {
        info!("Price oracle: {} (timeout {:?})", url, config.ml_timeout);
    }

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let state = AppState::from_config(pool, &config).context("Failed to create price oracle client")?;
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("fairprice-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
