use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use super::models::*;
use super::server::AppState;
use crate::error::Result;

/// Register a server and hand back its pairing code
pub async fn register_server(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterServerRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = decode(payload)?.validate()?;

    let pairing_code = state.registry.register(
        &req.pubkey,
        &req.username,
        req.ssh_tunnel,
        req.listen_pubkey_tunnel,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterServerResponse { pairing_code }),
    ))
}

/// Resolve a pairing code to the server's tunnel details
pub async fn get_server_details(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ServerDetailsRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let pairing_code = decode(payload)?.validate()?;
    let details = state.registry.find_by_pairing_code(pairing_code)?;
    Ok(Json(details))
}

/// Heartbeat or status query, selected by `action`
pub async fn server_status(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ServerStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let (pubkey, action) = decode(payload)?.validate()?;

    let status = match action {
        StatusAction::Heartbeat => state.registry.heartbeat(&pubkey)?,
        StatusAction::GetServerStatus => state.registry.status(&pubkey)?,
    };

    Ok(Json(status))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        service: "pairing-registry".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        servers: state.registry.len()?,
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not found",
            "code": "NOT_FOUND"
        })),
    )
}
