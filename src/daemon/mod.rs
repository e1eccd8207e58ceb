//! Daemon mode: the host-runtime edge. Marshals NDJSON calls from the host
//! onto the engine and the permission broker.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial module structure

pub mod protocol;
pub mod server;
pub mod service;
