mod app;
mod config;
mod routes;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let topology_path = config::topology_path();
    let layer = config::topology_layer();
    tracing::info!(path = %topology_path.display(), layer = ?layer, "Loading boundary topology...");

    let topology = match tokio::fs::read_to_string(&topology_path).await {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!(error = %e, path = %topology_path.display(), "failed to read topology");
            return;
        }
    };
    let state = match AppState::from_topology_str(&topology, layer.as_deref()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to build dataset");
            return;
        }
    };
    drop(topology);

    let static_dir = config::static_dir();
    if !static_dir.is_dir() {
        tracing::warn!(dir = %static_dir.display(), "static directory does not exist");
    }
    let app = app::build_app(state, &static_dir);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Kartquiz server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
