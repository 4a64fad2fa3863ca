use anyhow::{Context, Result};
use std::net::SocketAddr;

use crate::registry::{HeartbeatMode, PairingCodePolicy, Registry};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3555;

/// Runtime settings for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub heartbeat_mode: HeartbeatMode,
    pub pairing_codes: PairingCodePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            heartbeat_mode: HeartbeatMode::default(),
            pairing_codes: PairingCodePolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Resolve host and port into a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address '{}'", addr))
    }

    /// Build an empty registry with the configured policies
    pub fn build_registry(&self) -> Registry {
        Registry::with_policies(self.heartbeat_mode, self.pairing_codes)
    }
}
