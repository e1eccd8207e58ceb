//! Row serialization: cursor rows -> JSON array of message records.
//!
//! CHANGELOG:
//! - 02/04/2026 - Initial implementation

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::store::Cursor;

/// One message as emitted to the host. Field names are the wire names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub address: Option<String>,
    pub body: Option<String>,
    /// Milliseconds since epoch.
    pub date: i64,
    /// 1 = inbox, 2 = sent, other provider codes pass through.
    #[serde(rename = "type")]
    pub kind: i32,
}

impl SmsMessage {
    /// Read the row the cursor is positioned on.
    pub fn from_cursor(cursor: &dyn Cursor) -> Result<Self> {
        Ok(Self {
            id: cursor.get_string("_id")?,
            address: cursor.get_string("address")?,
            body: cursor.get_string("body")?,
            date: cursor.get_long("date")?,
            kind: cursor.get_int("type")?,
        })
    }
}

/// Read at most `cap` rows. An absent cursor is an empty result.
pub fn collect(cursor: Option<&mut (dyn Cursor + '_)>, cap: u32) -> Result<Vec<SmsMessage>> {
    let cursor = match cursor {
        Some(cursor) => cursor,
        None => return Ok(Vec::new()),
    };

    let mut messages = Vec::new();
    if !cursor.move_to_first() {
        return Ok(messages);
    }

    loop {
        // Cap is checked before the row is read.
        if messages.len() >= cap as usize {
            break;
        }
        messages.push(SmsMessage::from_cursor(cursor)?);
        if !cursor.move_to_next() {
            break;
        }
    }

    Ok(messages)
}

/// Encode records as the JSON array payload.
pub fn to_payload(messages: &[SmsMessage]) -> Result<String> {
    serde_json::to_string(messages)
        .map_err(|e| EngineError::StoreUnavailable(format!("failed to encode messages: {}", e)))
}

/// `(count, payload)` for at most `cap` rows.
pub fn serialize(cursor: Option<&mut (dyn Cursor + '_)>, cap: u32) -> Result<(u32, String)> {
    let messages = collect(cursor, cap)?;
    let payload = to_payload(&messages)?;
    // messages.len() <= cap, so it fits.
    Ok((messages.len() as u32, payload))
}
