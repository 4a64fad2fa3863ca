pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod time_utils;

pub use error::{RegistryError, Result};
pub use registry::{HeartbeatMode, PairingCodePolicy, Registry};
