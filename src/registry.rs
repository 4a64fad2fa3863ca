//! In-memory pairing and liveness registry
//!
//! Servers are keyed by their SSH public key. Registration hands out a
//! 4-digit pairing code that a second party later trades for the server's
//! tunnel details. Records live for the life of the process.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{RegistryError, Result};
use crate::time_utils::serialize_unix_seconds;
use crate::{log_registry_operation, log_registry_rejection};

pub const PAIRING_CODE_MIN: PairingCode = 1000;
pub const PAIRING_CODE_MAX: PairingCode = 9999;

/// Draws before a unique pairing code is given up on
const MAX_UNIQUE_CODE_ATTEMPTS: usize = 64;

pub type PairingCode = u16;

type CodeSource = Box<dyn Fn() -> PairingCode + Send + Sync>;

/// How heartbeats treat the `online` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HeartbeatMode {
    /// Online servers are rejected as offline and their timestamp is left
    /// alone; non-online servers get their current status back.
    #[default]
    Legacy,
    /// Online servers have their timestamp refreshed; non-online servers
    /// are rejected.
    Liveness,
}

/// Whether pairing codes may be shared between registered servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PairingCodePolicy {
    /// No collision check; lookups return the first match in insertion order
    #[default]
    Shared,
    /// Redraw until no other server holds the code
    Unique,
}

/// A registered server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRecord {
    pub pubkey: String,
    pub username: String,
    pub ssh_tunnel: u16,
    pub listen_pubkey_tunnel: u16,
    pub pairing_code: PairingCode,
    pub last_heartbeat: DateTime<Utc>,
    pub online: bool,
}

/// Connection details resolved from a pairing code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerDetails {
    pub ssh_pubkey: String,
    pub ssh_user: String,
    pub ssh_tunnel: u16,
    pub listen_pubkey_tunnel: u16,
}

/// Liveness view of a server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub online: bool,
    #[serde(serialize_with = "serialize_unix_seconds")]
    pub last_heartbeat: DateTime<Utc>,
}

impl ServerRecord {
    fn details(&self) -> ServerDetails {
        ServerDetails {
            ssh_pubkey: self.pubkey.clone(),
            ssh_user: self.username.clone(),
            ssh_tunnel: self.ssh_tunnel,
            listen_pubkey_tunnel: self.listen_pubkey_tunnel,
        }
    }

    fn status(&self) -> ServerStatus {
        ServerStatus {
            online: self.online,
            last_heartbeat: self.last_heartbeat,
        }
    }
}

/// Records in registration order, indexed by public key.
/// Nothing is ever removed, so slots stay valid.
#[derive(Default)]
struct Records {
    servers: Vec<ServerRecord>,
    slots: HashMap<String, usize>,
}

impl Records {
    fn get(&self, pubkey: &str) -> Option<&ServerRecord> {
        let slot = *self.slots.get(pubkey)?;
        Some(&self.servers[slot])
    }

    fn get_mut(&mut self, pubkey: &str) -> Option<&mut ServerRecord> {
        let slot = *self.slots.get(pubkey)?;
        Some(&mut self.servers[slot])
    }

    /// Insert or replace in place, keeping the key's original position
    fn upsert(&mut self, record: ServerRecord) -> bool {
        match self.slots.get(&record.pubkey) {
            Some(&slot) => {
                self.servers[slot] = record;
                true
            },
            None => {
                self.slots.insert(record.pubkey.clone(), self.servers.len());
                self.servers.push(record);
                false
            },
        }
    }

    fn code_taken_by_other(&self, code: PairingCode, pubkey: &str) -> bool {
        self.servers
            .iter()
            .any(|s| s.pairing_code == code && s.pubkey != pubkey)
    }
}

/// Shared registry of tunnel servers
pub struct Registry {
    records: RwLock<Records>,
    heartbeat_mode: HeartbeatMode,
    pairing_codes: PairingCodePolicy,
    code_source: CodeSource,
}

/// Uniformly random code in `PAIRING_CODE_MIN..=PAIRING_CODE_MAX`
pub fn generate_pairing_code() -> PairingCode {
    rand::rng().random_range(PAIRING_CODE_MIN..=PAIRING_CODE_MAX)
}

impl Registry {
    /// Registry with the legacy heartbeat and shared pairing-code policies
    pub fn new() -> Self {
        Self::with_policies(HeartbeatMode::default(), PairingCodePolicy::default())
    }

    pub fn with_policies(heartbeat_mode: HeartbeatMode, pairing_codes: PairingCodePolicy) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            heartbeat_mode,
            pairing_codes,
            code_source: Box::new(generate_pairing_code),
        }
    }

    #[cfg(test)]
    fn with_code_source(mut self, source: impl Fn() -> PairingCode + Send + Sync + 'static) -> Self {
        self.code_source = Box::new(source);
        self
    }

    pub fn heartbeat_mode(&self) -> HeartbeatMode {
        self.heartbeat_mode
    }

    pub fn pairing_code_policy(&self) -> PairingCodePolicy {
        self.pairing_codes
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|_| RegistryError::Internal("registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|_| RegistryError::Internal("registry lock poisoned".to_string()))
    }

    /// Number of registered servers
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.servers.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Register a server, replacing any record under the same public key
    ///
    /// The new record starts online with a fresh heartbeat, whatever state
    /// the replaced record was in.
    pub fn register(
        &self,
        pubkey: &str,
        username: &str,
        ssh_tunnel: u16,
        listen_pubkey_tunnel: u16,
    ) -> Result<PairingCode> {
        let mut records = self.write()?;

        let pairing_code = match self.pairing_codes {
            PairingCodePolicy::Shared => (self.code_source)(),
            PairingCodePolicy::Unique => self.draw_unique_code(&records, pubkey)?,
        };

        let replaced = records.upsert(ServerRecord {
            pubkey: pubkey.to_string(),
            username: username.to_string(),
            ssh_tunnel,
            listen_pubkey_tunnel,
            pairing_code,
            last_heartbeat: Utc::now(),
            online: true,
        });

        log_registry_operation!(
            if replaced { "re-register" } else { "register" },
            pubkey
        );
        Ok(pairing_code)
    }

    fn draw_unique_code(&self, records: &Records, pubkey: &str) -> Result<PairingCode> {
        for _ in 0..MAX_UNIQUE_CODE_ATTEMPTS {
            let code = (self.code_source)();
            if !records.code_taken_by_other(code, pubkey) {
                return Ok(code);
            }
            tracing::debug!(pairing_code = code, "Pairing code collision, redrawing");
        }

        Err(RegistryError::Internal(format!(
            "no free pairing code after {} attempts",
            MAX_UNIQUE_CODE_ATTEMPTS
        )))
    }

    /// Resolve a pairing code to connection details
    ///
    /// Under a collision the earliest-registered match wins.
    pub fn find_by_pairing_code(&self, pairing_code: PairingCode) -> Result<ServerDetails> {
        let records = self.read()?;

        match records
            .servers
            .iter()
            .find(|s| s.pairing_code == pairing_code)
        {
            Some(server) => {
                tracing::info!(
                    operation = "find",
                    pairing_code,
                    pubkey = %server.pubkey,
                    "Found server with pairing code"
                );
                Ok(server.details())
            },
            None => {
                log_registry_rejection!("find", pairing_code = pairing_code, "unknown pairing code");
                Err(RegistryError::PairingCodeNotFound(pairing_code.to_string()))
            },
        }
    }

    /// Record a heartbeat according to the configured `HeartbeatMode`
    pub fn heartbeat(&self, pubkey: &str) -> Result<ServerStatus> {
        let mut records = self.write()?;

        let Some(server) = records.get_mut(pubkey) else {
            log_registry_rejection!("heartbeat", pubkey = pubkey, "not registered");
            return Err(RegistryError::NotRegistered(pubkey.to_string()));
        };

        match (self.heartbeat_mode, server.online) {
            (HeartbeatMode::Legacy, true) | (HeartbeatMode::Liveness, false) => {
                log_registry_rejection!("heartbeat", pubkey = pubkey, "offline");
                Err(RegistryError::OfflineRejected(pubkey.to_string()))
            },
            (HeartbeatMode::Legacy, false) => {
                log_registry_rejection!("heartbeat", pubkey = pubkey, "not online, heartbeat ignored");
                Ok(server.status())
            },
            (HeartbeatMode::Liveness, true) => {
                server.last_heartbeat = Utc::now();
                log_registry_operation!("heartbeat", pubkey);
                Ok(server.status())
            },
        }
    }

    /// Current liveness of a server, without touching it
    pub fn status(&self, pubkey: &str) -> Result<ServerStatus> {
        let records = self.read()?;

        match records.get(pubkey) {
            Some(server) => {
                log_registry_operation!("status", pubkey);
                Ok(server.status())
            },
            None => {
                log_registry_rejection!("status", pubkey = pubkey, "not registered");
                Err(RegistryError::NotRegistered(pubkey.to_string()))
            },
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
