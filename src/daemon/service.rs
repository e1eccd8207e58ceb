//! Daemon service - dispatches host calls to the engine and permission broker.
//!
//! Holds a hot SQLite connection behind the permission gate.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial implementation

use anyhow::Context;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::db::provider::SqliteStore;
use crate::engine::{ListPayload, SmsEngine};
use crate::error::EngineError;
use crate::filter;
use crate::permission::{
    Permission, PermissionBroker, PermissionGate, PermissionSystem, StaticPermissionSystem,
};

/// Upper bound on waiting for a platform permission answer.
const PERMISSION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Timed out waiting for permission result")]
    PermissionTimeout,
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::UnknownMethod(_) => "UNKNOWN_METHOD",
            ServiceError::InvalidParams(_) => "INVALID_PARAMS",
            ServiceError::Engine(e) => e.kind_code(),
            ServiceError::PermissionTimeout => "PERMISSION_TIMEOUT",
        }
    }
}

/// Daemon service with hot resources.
pub struct DaemonService {
    engine: SmsEngine<PermissionGate<SqliteStore>>,
    broker: PermissionBroker,
    started_at: String,
}

impl DaemonService {
    /// Open the store from config and answer permission prompts per config policy.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open_hot(&config.db_path)
            .with_context(|| format!("Failed to open SMS store at {:?}", config.db_path))?;
        let system = Arc::new(StaticPermissionSystem {
            foreground_activity: config.foreground_activity,
            grant: config.grant_permissions,
        });
        Ok(Self::with_parts(store, system))
    }

    pub fn with_parts(store: SqliteStore, system: Arc<dyn PermissionSystem>) -> Self {
        let broker = PermissionBroker::new(system);
        let engine = SmsEngine::new(PermissionGate::new(store, broker.ledger()));
        Self {
            engine,
            broker,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Dispatch request to appropriate handler.
    pub fn dispatch(
        &self,
        method: &str,
        params: HashMap<String, Value>,
    ) -> Result<Value, ServiceError> {
        match method {
            "health" => Ok(self.health()),
            "list" => self.list(params),
            "requestReadSmsPermission" => self.request_permission(),
            _ => Err(ServiceError::UnknownMethod(method.to_string())),
        }
    }

    fn health(&self) -> Value {
        let ledger = self.broker.ledger();
        json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": "v1",
            "permissions": {
                "read_sms": ledger.is_granted(Permission::ReadSms),
                "receive_sms": ledger.is_granted(Permission::ReceiveSms),
            },
            "pending_permission_requests": self.broker.pending_requests(),
        })
    }

    /// Params: filter (JSON text, inline object, or absent)
    fn list(&self, params: HashMap<String, Value>) -> Result<Value, ServiceError> {
        let payload = match params.get("filter") {
            None | Some(Value::Null) => self.engine.execute(None)?,
            Some(Value::String(text)) => self.engine.execute(Some(text))?,
            Some(Value::Object(_)) => {
                let desc = filter::from_value(&params["filter"])?;
                self.engine.execute_descriptor(&desc)?
            }
            Some(other) => {
                return Err(ServiceError::InvalidParams(format!(
                    "filter must be a string or an object, got {}",
                    other
                )))
            }
        };
        let ListPayload { count, messages } = payload;
        Ok(json!([count, messages]))
    }

    fn request_permission(&self) -> Result<Value, ServiceError> {
        let (tx, rx) = mpsc::channel();
        self.broker.request_read_sms_permission(move |status| {
            // Receiver may have timed out already.
            let _ = tx.send(status);
        });
        let status = rx
            .recv_timeout(PERMISSION_TIMEOUT)
            .map_err(|_| ServiceError::PermissionTimeout)?;
        Ok(json!([status.message()]))
    }
}
