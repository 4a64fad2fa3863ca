use clap::Parser;
use std::path::PathBuf;

use crate::config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::registry::{HeartbeatMode, PairingCodePolicy};

const LONG_ABOUT: &str = r#"
Pairing Registry - pairing and liveness service for SSH-tunnelled servers

A server registers once and receives a 4-digit pairing code. Whoever holds
the code (typed into a companion app, for example) can resolve it to the
server's tunnel details. Registered servers report heartbeats; anyone with
the server's public key can query its status.

Endpoints (JSON over HTTP POST):
  /register_server      ssh_pubkey, ssh_user, ssh_tunnel, listen_pubkey_tunnel
  /get_server_details   pairing_code
  /server_status        ssh_pubkey, action (heartbeat | get_server_status)

State is kept in memory only and is lost on restart.
"#;

#[derive(Parser, Clone, Debug)]
#[command(name = "pairing-registry")]
#[command(about = "Pairing and liveness registry for servers reachable through SSH tunnels")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "PAIRING_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PAIRING_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// How heartbeats treat a server's online flag
    ///
    /// `legacy` keeps the historical behavior (heartbeats from online
    /// servers are rejected as offline); `liveness` refreshes the
    /// heartbeat of online servers.
    #[arg(long, env = "PAIRING_HEARTBEAT_MODE", value_enum, default_value_t = HeartbeatMode::Legacy)]
    pub heartbeat_mode: HeartbeatMode,

    /// Whether two servers may hold the same pairing code
    #[arg(long, env = "PAIRING_CODE_POLICY", value_enum, default_value_t = PairingCodePolicy::Shared)]
    pub pairing_codes: PairingCodePolicy,

    /// Write logs to this file (rotated daily) instead of stdout
    #[arg(long, env = "PAIRING_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Days to keep rotated log files
    #[arg(long, env = "PAIRING_LOG_RETENTION_DAYS", default_value_t = 7)]
    pub log_retention_days: u32,

    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            heartbeat_mode: self.heartbeat_mode,
            pairing_codes: self.pairing_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pairing-registry"]).unwrap();
        let config = cli.server_config();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.heartbeat_mode, HeartbeatMode::Legacy);
        assert_eq!(config.pairing_codes, PairingCodePolicy::Shared);
        assert_eq!(cli.log_retention_days, 7);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_policy_flags() {
        let cli = Cli::try_parse_from([
            "pairing-registry",
            "--heartbeat-mode",
            "liveness",
            "--pairing-codes",
            "unique",
            "--port",
            "8080",
        ])
        .unwrap();
        assert_eq!(cli.heartbeat_mode, HeartbeatMode::Liveness);
        assert_eq!(cli.pairing_codes, PairingCodePolicy::Unique);
        assert_eq!(cli.port, 8080);
    }

    #[test]
    fn test_rejects_unknown_heartbeat_mode() {
        assert!(Cli::try_parse_from(["pairing-registry", "--heartbeat-mode", "strict"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pairing-registry", "-q", "-v"]).is_err());
    }
}
