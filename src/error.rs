use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Missing key: {0}")]
    MissingField(&'static str),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Pairing code not found: {0}")]
    PairingCodeNotFound(String),

    #[error("Server not registered: {0}")]
    NotRegistered(String),

    #[error("Server is offline, heartbeat not updated: {0}")]
    OfflineRejected(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl RegistryError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            RegistryError::MissingField(_) => "MISSING_FIELD",
            RegistryError::InvalidPayload(_) => "INVALID_PAYLOAD",
            RegistryError::PairingCodeNotFound(_) => "PAIRING_CODE_NOT_FOUND",
            RegistryError::NotRegistered(_) => "NOT_REGISTERED",
            RegistryError::OfflineRejected(_) => "SERVER_OFFLINE",
            RegistryError::InvalidAction(_) => "INVALID_ACTION",
            RegistryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::MissingField(_)
            | RegistryError::InvalidPayload(_)
            | RegistryError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            RegistryError::PairingCodeNotFound(_)
            | RegistryError::NotRegistered(_)
            | RegistryError::OfflineRejected(_) => StatusCode::NOT_FOUND,
            RegistryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Keys and codes the caller sent are
    /// not echoed back; internal details are only logged.
    pub fn public_message(&self) -> String {
        match self {
            RegistryError::MissingField(field) => format!("Missing key: {}", field),
            RegistryError::InvalidPayload(reason) => format!("Invalid payload: {}", reason),
            RegistryError::PairingCodeNotFound(_) => "Pairing code not found".to_string(),
            RegistryError::NotRegistered(_) => "Server not registered".to_string(),
            RegistryError::OfflineRejected(_) => {
                "Server is offline. Heartbeat not updated.".to_string()
            },
            RegistryError::InvalidAction(_) => "Invalid action".to_string(),
            RegistryError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.public_message(),
            code: self.to_error_code().to_string(),
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        match &self {
            RegistryError::Internal(detail) => {
                tracing::error!(code = self.to_error_code(), detail = %detail, "Request failed");
            },
            _ => {
                tracing::warn!(code = self.to_error_code(), error = %self, "Request rejected");
            },
        }

        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            RegistryError::MissingField("ssh_pubkey").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RegistryError::InvalidAction("reboot".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RegistryError::PairingCodeNotFound("9999".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RegistryError::NotRegistered("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RegistryError::OfflineRejected("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RegistryError::Internal("lock poisoned".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_field_message_names_field() {
        let response = RegistryError::MissingField("ssh_user").to_error_response();
        assert_eq!(response.error, "Missing key: ssh_user");
        assert_eq!(response.code, "MISSING_FIELD");
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = RegistryError::Internal("registry lock poisoned".into());
        let json = serde_json::to_string(&err.to_error_response()).unwrap();
        assert!(json.contains("Internal server error"));
        assert!(!json.contains("poisoned"));
    }

    #[test]
    fn test_offline_message_matches_wire_format() {
        let response = RegistryError::OfflineRejected("abc".into()).to_error_response();
        assert_eq!(response.error, "Server is offline. Heartbeat not updated.");
        assert_eq!(response.code, "SERVER_OFFLINE");
    }
}
