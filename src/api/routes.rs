use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::server::AppState;

/// Create the router for every registry endpoint
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register_server", post(handlers::register_server))
        .route("/get_server_details", post(handlers::get_server_details))
        .route("/server_status", post(handlers::server_status))
        .route("/health", get(handlers::health))
}
