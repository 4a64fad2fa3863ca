use anyhow::{Context, Result};
use axum::{http::Method, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::registry::Registry;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Registry HTTP server instance
pub struct RegistryServer {
    config: ServerConfig,
}

impl RegistryServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Pairing registry listening on {}", addr);
        tracing::info!(
            heartbeat_mode = ?self.config.heartbeat_mode,
            pairing_codes = ?self.config.pairing_codes,
            "Registry policies"
        );

        let state = AppState::new(self.config.build_registry());
        serve(listener, state, shutdown_signal()).await
    }
}

/// Serve the registry on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("Pairing registry stopped");
    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    use super::{handlers, routes};

    Router::new()
        .merge(routes::api_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
