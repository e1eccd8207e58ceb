//! wolfies-sms library
//!
//! Filter parsing, parameterized query building, cursor serialization and the
//! READ_SMS permission round-trip. Used by the CLI, daemon and client binaries.
//!
//! CHANGELOG:
//! - 02/07/2026 - Daemon, config and output modules
//! - 02/03/2026 - Initial library structure

// Core pipeline
pub mod engine;
pub mod error;
pub mod filter;
pub mod query;
pub mod serializer;
pub mod store;

// Platform edge
pub mod config;
pub mod daemon;
pub mod db;
pub mod output;
pub mod permission;

pub use db::provider::SqliteStore;
pub use engine::{ListPayload, SmsEngine};
pub use error::EngineError;
pub use filter::{FilterDescriptor, MessageBox};
pub use permission::{
    Permission, PermissionBroker, PermissionGate, PermissionStatus, PermissionSystem,
};
pub use serializer::SmsMessage;
pub use store::{ContentStore, Cursor};
