//! NDJSON protocol types for the daemon socket.
//!
//! Request:  `{"id": "...", "v": 1, "method": "list", "params": {"filter": "..."}}`
//! Response: `{"id": "...", "ok": true, "result": [count, "[...]"], "error": null, "meta": {...}}`
//!
//! Successful results carry the host continuation's positional arguments as
//! a JSON array.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PROTOCOL_VERSION: u8 = 1;

/// NDJSON request from host to daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Request ID, echoed back
    pub id: String,
    /// Protocol version
    #[serde(default = "default_version")]
    pub v: u8,
    /// Method name ("health", "list", "requestReadSmsPermission")
    pub method: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

fn default_version() -> u8 {
    PROTOCOL_VERSION
}

/// NDJSON response from daemon to host.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub ok: bool,
    /// Positional continuation arguments (if successful)
    pub result: Option<serde_json::Value>,
    pub error: Option<ErrorInfo>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// e.g. "INVALID_FILTER", "STORE_UNAVAILABLE", "UNKNOWN_METHOD"
    pub code: String,
    /// Diagnostic handed to the failure continuation
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    pub protocol_v: u8,
}

impl Request {
    pub fn new(method: impl Into<String>, params: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.into(),
            params,
        }
    }

    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim_end()).context("Failed to parse request JSON")
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

impl Response {
    pub fn success(id: String, result: serde_json::Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim_end()).context("Failed to parse response JSON")
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req = Request::from_ndjson_line(r#"{"id":"abc","method":"health"}"#).unwrap();
        assert_eq!(req.v, 1);
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_request_line_round_trip() {
        let mut params = HashMap::new();
        params.insert("filter".to_string(), json!(r#"{"box":"inbox"}"#));
        let req = Request::new("list", params);
        let line = req.to_ndjson_line().unwrap();
        assert!(line.ends_with('\n'));
        let back = Request::from_ndjson_line(&line).unwrap();
        assert_eq!(back.id, req.id);
        assert_eq!(back.params["filter"], json!(r#"{"box":"inbox"}"#));
    }

    #[test]
    fn test_error_response_shape() {
        let resp = Response::error("1".into(), "INVALID_FILTER", "bad".into(), 0.5);
        let value: serde_json::Value =
            serde_json::from_str(&resp.to_ndjson_line().unwrap()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["result"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], "INVALID_FILTER");
        assert_eq!(value["meta"]["protocol_v"], 1);
    }
}
