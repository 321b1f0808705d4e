use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use windowed_csv::{config::Config, routes::create_router, staging, utils, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let _log_guard = utils::init_logger(config.logging.log_dir.as_deref());
    info!("Configuration loaded: {:?}", config);

    tokio::fs::create_dir_all(&config.staging.upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create uploads directory: {}", e))?;

    // Create shared state
    let state = AppState::new(config.clone());

    // Create router
    let app = create_router(state.clone());

    // Start server
    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid HOST {}: {}", config.server.host, e))?;
    let addr = SocketAddr::from((host, config.server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on http://{}", addr);
    info!(
        "Reset time is set to {} seconds.",
        state.store.reset_after().as_secs_f64()
    );

    // Load previously staged files in the background
    let store = state.store.clone();
    let upload_dir = config.staging.upload_dir.clone();
    tokio::spawn(async move {
        let loaded = staging::ingest_staged(&store, &upload_dir).await;
        info!(loaded, "staged files ingested");
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Clear timers when the server is closed
    state.store.shutdown().await;

    served.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
