//! HTTP adapter over the registry
//!
//! Each handler decodes its request, calls exactly one registry operation
//! and encodes the outcome.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{create_router, serve, AppState, RegistryServer};
