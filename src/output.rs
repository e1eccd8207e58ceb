//! Output formatting for the CLI.
//!
//! CHANGELOG:
//! - 02/06/2026 - Rewritten around message records and list payloads

use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::serializer::SmsMessage;

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Render a JSON value, pretty unless `compact`.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(Value::Null);
        let value = match self.max_text_chars {
            Some(max) => truncate_bodies(value, max as usize),
            None => value,
        };
        if self.compact {
            serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string())
        } else {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "null".to_string())
        }
    }

    /// Render a `list` result: `{count, messages}` as JSON, or one line per
    /// message in text mode.
    pub fn render_messages(&self, messages: &[SmsMessage]) -> String {
        if self.json {
            return self.emit(&json!({
                "count": messages.len(),
                "messages": messages,
            }));
        }

        if messages.is_empty() {
            return "No messages found.".to_string();
        }

        let mut out = format!("Messages ({}):\n{}", messages.len(), "-".repeat(60));
        for msg in messages {
            let body = msg.body.as_deref().unwrap_or("");
            let body = match self.max_text_chars {
                Some(max) => truncate(body, max as usize),
                None => body.to_string(),
            };
            let direction = if msg.kind == 2 { "->" } else { "<-" };
            out.push_str(&format!(
                "\n[{}] {} {}: {}",
                ms_to_rfc3339(msg.date),
                direction,
                msg.address.as_deref().unwrap_or("unknown"),
                body
            ));
        }
        out
    }
}

/// Milliseconds since epoch as RFC 3339; out-of-range values print raw.
pub fn ms_to_rfc3339(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Truncate `body` fields anywhere in the value.
fn truncate_bodies(value: Value, max_chars: usize) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| truncate_bodies(v, max_chars))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) if k == "body" => (k, Value::String(truncate(&s, max_chars))),
                    other => (k, truncate_bodies(other, max_chars)),
                })
                .collect(),
        ),
        other => other,
    }
}

/// Format error as JSON.
pub fn format_error(code: &str, error: &str) -> String {
    serde_json::to_string(&json!({
        "error": error,
        "code": code,
        "success": false
    }))
    .unwrap_or_else(|_| format!(r#"{{"error":{:?}}}"#, error))
}
