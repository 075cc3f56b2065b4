use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use livraria_api::routes;
use livraria_api::state::AppState;
use livraria_common::config::Settings;
use livraria_common::db::MySqlConnector;
use livraria_common::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Settings::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    telemetry::init_logging(
        &config.observability.log_level,
        config.observability.json_logs,
    )?;
    tracing::info!("Starting API server");
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        db_host = %config.database.host,
        db_port = config.database.port,
        db_name = %config.database.name,
        "Configuration loaded"
    );

    // Initialize Prometheus metrics exporter
    let metrics_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    telemetry::describe_metrics();
    tracing::info!("Metrics recorder installed");

    // No pool: every request opens and releases its own connection
    let connector = Arc::new(MySqlConnector::new(&config.database));

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::new(connector, config, Some(metrics_handle));
    let app = routes::create_router(state);

    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
