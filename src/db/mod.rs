//! SQLite access to the SMS store.
//!
//! CHANGELOG:
//! - 02/04/2026 - Added provider (ContentStore over SQLite)
//! - 02/03/2026 - Initial module structure

pub mod connection;
pub mod provider;
pub mod queries;
