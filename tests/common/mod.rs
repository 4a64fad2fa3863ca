//! Common utilities for integration tests
//!
//! Spins up a registry server on an ephemeral port inside the test's own
//! runtime, plus helpers for locating the `pairing-registry` binary.

#![allow(dead_code)]

use assert_cmd::Command;
use pairing_registry::api::{serve, AppState};
use pairing_registry::Registry;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Path to the `pairing-registry` binary
#[allow(deprecated)] // cargo_bin() is deprecated but needed for fallback
pub fn registry_binary() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_pairing-registry")
        .map(PathBuf::from)
        .unwrap_or_else(|_| assert_cmd::cargo::cargo_bin("pairing-registry"))
}

/// A `pairing-registry` command with registry env vars cleared
pub fn registry_command() -> Command {
    let mut cmd = Command::new(registry_binary());
    for var in [
        "PAIRING_HOST",
        "PAIRING_PORT",
        "PAIRING_HEARTBEAT_MODE",
        "PAIRING_CODE_POLICY",
        "PAIRING_LOG_FILE",
        "PAIRING_LOG_RETENTION_DAYS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// In-process registry server for HTTP tests
pub struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    /// Start a server on 127.0.0.1 with an OS-assigned port
    pub async fn start(registry: Registry) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve(listener, AppState::new(registry), async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON body; returns status code and decoded body
    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    /// Register a server and return its pairing code
    pub async fn register(&self, pubkey: &str, user: &str, ssh_tunnel: u16, listen: u16) -> i64 {
        let (status, body) = self
            .post(
                "/register_server",
                serde_json::json!({
                    "ssh_pubkey": pubkey,
                    "ssh_user": user,
                    "ssh_tunnel": ssh_tunnel,
                    "listen_pubkey_tunnel": listen
                }),
            )
            .await;
        assert_eq!(status, 201, "registration failed: {}", body);
        body["pairing_code"].as_i64().unwrap()
    }

    /// Stop the server and wait for it to finish
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
