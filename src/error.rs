//! Error kinds surfaced by the SMS query engine.
//!
//! Every variant carries a human-readable diagnostic; that string is what the
//! host receives through the failure continuation.
//!
//! CHANGELOG:
//! - 02/03/2026 - Initial error enum for filter/store/schema failures

use thiserror::Error;

/// Errors raised inside a `list` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Filter text is not a JSON object, or a known key has the wrong shape.
    #[error("{0}")]
    InvalidFilter(String),

    /// The provider query failed: permission denied, store missing, I/O fault.
    #[error("{0}")]
    StoreUnavailable(String),

    /// The cursor lacks a column the serializer expects.
    #[error("{0}")]
    SchemaMismatch(String),
}

impl EngineError {
    /// Stable code used in daemon error payloads.
    pub fn kind_code(&self) -> &'static str {
        match self {
            EngineError::InvalidFilter(_) => "INVALID_FILTER",
            EngineError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            EngineError::SchemaMismatch(_) => "SCHEMA_MISMATCH",
        }
    }

    /// Diagnostic string handed to the failure continuation.
    pub fn diagnostic(&self) -> &str {
        match self {
            EngineError::InvalidFilter(msg)
            | EngineError::StoreUnavailable(msg)
            | EngineError::SchemaMismatch(msg) => msg,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
