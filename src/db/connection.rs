//! SQLite connection management for the SMS store.
//!
//! CHANGELOG:
//! - 02/03/2026 - Initial implementation

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

/// Default SMS database path.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wolfies-sms")
        .join("sms.db")
}

/// Open a read-only connection to the SMS database.
pub fn open_db(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        EngineError::StoreUnavailable(format!(
            "Failed to open SMS database at {:?}: {}",
            path, e
        ))
    })
}

/// Open (creating if needed) a writable connection. Used for fixtures and
/// local demo databases.
pub fn open_db_writable(path: &Path) -> Result<Connection> {
    Connection::open(path).map_err(|e| {
        EngineError::StoreUnavailable(format!(
            "Failed to open SMS database at {:?} for writing: {}",
            path, e
        ))
    })
}

/// Check if we can read the SMS database.
pub fn check_access(path: &Path) -> bool {
    open_db(path)
        .and_then(|conn| {
            conn.query_row("SELECT COUNT(*) FROM sms", [], |row| row.get::<_, i64>(0))
                .map_err(EngineError::from)
        })
        .is_ok()
}
