//! Filter parsing: untrusted filter text in, immutable `FilterDescriptor` out.
//!
//! Wire keys are `box`, `minDate`, `maxDate`, `maxCount`. Unknown keys are
//! ignored. Unknown `box` values are ignored as well (logged at warn), which
//! keeps older hosts that send e.g. `"box": "all"` working.
//!
//! CHANGELOG:
//! - 02/05/2026 - Canonical re-emission and builder methods
//! - 02/03/2026 - Initial parser

use serde::Serialize;
use serde_json::{Map, Value};
use std::num::NonZeroU32;

use crate::error::{EngineError, Result};

/// Row cap applied when the filter has no `maxCount`.
pub const DEFAULT_MAX_COUNT: u32 = 100;

/// Which side of the conversation to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBox {
    Inbox,
    Sent,
}

impl MessageBox {
    /// Value of the store's `type` column for this box.
    pub fn type_code(self) -> i32 {
        match self {
            MessageBox::Inbox => 1,
            MessageBox::Sent => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inbox" => Some(MessageBox::Inbox),
            "sent" => Some(MessageBox::Sent),
            _ => None,
        }
    }
}

/// Validated filter. Built by [`parse`] or by the `with_*` builders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    message_box: Option<MessageBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_count: Option<NonZeroU32>,
}

impl FilterDescriptor {
    pub fn with_box(mut self, message_box: MessageBox) -> Self {
        self.message_box = Some(message_box);
        self
    }

    pub fn with_min_date(mut self, min_date: i64) -> Self {
        self.min_date = Some(min_date);
        self
    }

    pub fn with_max_date(mut self, max_date: i64) -> Self {
        self.max_date = Some(max_date);
        self
    }

    pub fn with_max_count(mut self, max_count: NonZeroU32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn message_box(&self) -> Option<MessageBox> {
        self.message_box
    }

    pub fn min_date(&self) -> Option<i64> {
        self.min_date
    }

    pub fn max_date(&self) -> Option<i64> {
        self.max_date
    }

    pub fn max_count(&self) -> Option<NonZeroU32> {
        self.max_count
    }

    /// Row cap to enforce: `maxCount`, or 100 when absent.
    pub fn effective_max_count(&self) -> u32 {
        self.max_count.map_or(DEFAULT_MAX_COUNT, NonZeroU32::get)
    }

    /// True when the date window cannot match anything.
    pub fn is_empty_window(&self) -> bool {
        matches!((self.min_date, self.max_date), (Some(min), Some(max)) if min > max)
    }

    /// Canonical wire form. Absent fields are omitted, so the default
    /// descriptor renders as `{}`.
    pub fn to_filter_json(&self) -> String {
        // Only enums, integers and fixed keys: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Parse raw filter text. `None`, empty and whitespace-only input yield the
/// default descriptor.
pub fn parse(raw: Option<&str>) -> Result<FilterDescriptor> {
    let text = match raw.map(str::trim) {
        None | Some("") => return Ok(FilterDescriptor::default()),
        Some(text) => text,
    };

    let value: Value =
        serde_json::from_str(text).map_err(|e| EngineError::InvalidFilter(e.to_string()))?;
    from_value(&value)
}

/// Build a descriptor from an already-decoded JSON value (the daemon accepts
/// the filter either as text or as an inline object).
pub fn from_value(value: &Value) -> Result<FilterDescriptor> {
    match value {
        Value::Object(obj) => from_object(obj),
        Value::Null => Ok(FilterDescriptor::default()),
        other => Err(EngineError::InvalidFilter(format!(
            "filter must be a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn from_object(obj: &Map<String, Value>) -> Result<FilterDescriptor> {
    let message_box = match obj.get("box") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => {
            let parsed = MessageBox::from_name(name);
            if parsed.is_none() {
                tracing::warn!(box_value = %name, "ignoring unrecognized box value");
            }
            parsed
        }
        Some(other) => {
            tracing::warn!(box_value = %other, "ignoring non-string box value");
            None
        }
    };

    let min_date = obj.get("minDate").map(|v| as_i64("minDate", v)).transpose()?;
    let max_date = obj.get("maxDate").map(|v| as_i64("maxDate", v)).transpose()?;

    let max_count = match obj.get("maxCount") {
        None => None,
        Some(v) => {
            let n = as_i64("maxCount", v)?;
            let count = u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| {
                    EngineError::InvalidFilter(format!(
                        "maxCount must be a positive integer, got {}",
                        n
                    ))
                })?;
            Some(count)
        }
    };

    Ok(FilterDescriptor {
        message_box,
        min_date,
        max_date,
        max_count,
    })
}

/// Coerce a JSON value to a 64-bit integer: integers, integral floats and
/// decimal-integer strings are accepted.
fn as_i64(key: &str, value: &Value) -> Result<i64> {
    let coerced = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    coerced.ok_or_else(|| {
        EngineError::InvalidFilter(format!(
            "{} is not a 64-bit integer: {}",
            key, value
        ))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
