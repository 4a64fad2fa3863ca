use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::str::FromStr;

use crate::error::{RegistryError, Result};
use crate::registry::{PairingCode, PAIRING_CODE_MAX, PAIRING_CODE_MIN};

/// Unwrap a JSON body, turning extractor rejections into `InvalidPayload`
pub fn decode<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| RegistryError::InvalidPayload(rejection.body_text()))
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(RegistryError::MissingField(field))
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String> {
    let value = required(value, field)?;
    if value.is_empty() {
        return Err(RegistryError::InvalidPayload(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(value)
}

/// Register server request
///
/// Every field is optional at the schema level so that an absent field is
/// reported by name rather than as a generic parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterServerRequest {
    pub ssh_pubkey: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_tunnel: Option<u16>,
    pub listen_pubkey_tunnel: Option<u16>,
}

/// Validated registration arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub pubkey: String,
    pub username: String,
    pub ssh_tunnel: u16,
    pub listen_pubkey_tunnel: u16,
}

impl RegisterServerRequest {
    pub fn validate(self) -> Result<Registration> {
        Ok(Registration {
            pubkey: required_text(self.ssh_pubkey, "ssh_pubkey")?,
            username: required_text(self.ssh_user, "ssh_user")?,
            ssh_tunnel: required(self.ssh_tunnel, "ssh_tunnel")?,
            listen_pubkey_tunnel: required(self.listen_pubkey_tunnel, "listen_pubkey_tunnel")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterServerResponse {
    pub pairing_code: PairingCode,
}

/// Server details lookup request
///
/// The code is kept as a raw JSON number so that any numeric value, however
/// large, reaches `validate` instead of failing to parse.
#[derive(Debug, Default, Deserialize)]
pub struct ServerDetailsRequest {
    pub pairing_code: Option<Number>,
}

/// Integral value of a JSON number if it fits a pairing code.
/// `1234.0` counts as `1234`.
fn integral_code(number: &Number) -> Option<PairingCode> {
    if let Some(n) = number.as_u64() {
        return PairingCode::try_from(n).ok();
    }
    let f = number.as_f64()?;
    (f.fract() == 0.0 && (0.0..=f64::from(PairingCode::MAX)).contains(&f))
        .then(|| f as PairingCode)
}

impl ServerDetailsRequest {
    /// The requested code; numbers outside the 4-digit range, or with a
    /// fractional part, can never have been issued and are not found.
    pub fn validate(self) -> Result<PairingCode> {
        let raw = required(self.pairing_code, "pairing_code")?;
        integral_code(&raw)
            .filter(|code| (PAIRING_CODE_MIN..=PAIRING_CODE_MAX).contains(code))
            .ok_or_else(|| RegistryError::PairingCodeNotFound(raw.to_string()))
    }
}

/// Action carried by a server status request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Heartbeat,
    GetServerStatus,
}

impl FromStr for StatusAction {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heartbeat" => Ok(StatusAction::Heartbeat),
            "get_server_status" => Ok(StatusAction::GetServerStatus),
            other => Err(RegistryError::InvalidAction(other.to_string())),
        }
    }
}

/// Heartbeat / status request
#[derive(Debug, Default, Deserialize)]
pub struct ServerStatusRequest {
    pub ssh_pubkey: Option<String>,
    pub action: Option<String>,
}

impl ServerStatusRequest {
    pub fn validate(self) -> Result<(String, StatusAction)> {
        let pubkey = required_text(self.ssh_pubkey, "ssh_pubkey")?;
        let action = required(self.action, "action")?.parse()?;
        Ok((pubkey, action))
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub servers: usize,
}
