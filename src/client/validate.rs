//! Response Validation Module
//!
//! Typed decoding at the network boundary. List endpoints declare themselves
//! as arrays and get per-item partitioning: items that fail to decode are
//! dropped and counted, never fatal. Single-object endpoints fail on any
//! other shape instead of being silently wrapped.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{ApiError, Result};

/// Outcome of decoding an array payload.
#[derive(Debug)]
pub struct Decoded<T> {
    /// Items that matched the expected shape
    pub items: Vec<T>,
    /// The raw values of those items, for caching
    pub raw: Vec<Value>,
    /// How many items were dropped
    pub dropped: usize,
}

/// Decodes an array payload, partitioning valid from invalid items.
///
/// Discrepancies are logged with counts and a sample of the first offending
/// item; the call succeeds with the valid subset.
pub fn decode_array<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<Decoded<T>> {
    let values = match payload {
        Value::Array(values) => values,
        other => {
            return Err(ApiError::InvalidPayload(format!(
                "{} expected an array, got {}",
                endpoint,
                type_name(&other)
            )))
        }
    };

    let total = values.len();
    let mut items = Vec::with_capacity(total);
    let mut raw = Vec::with_capacity(total);
    let mut sample: Option<String> = None;

    for value in values {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(item) => {
                items.push(item);
                raw.push(value);
            }
            Err(err) => {
                if sample.is_none() {
                    sample = Some(format!("{} ({})", truncate(&value.to_string(), 200), err));
                }
            }
        }
    }

    let dropped = total - items.len();
    if dropped > 0 {
        warn!(
            endpoint,
            valid = items.len(),
            dropped,
            sample = sample.as_deref().unwrap_or(""),
            "dropped items that failed shape validation"
        );
    }

    Ok(Decoded {
        items,
        raw,
        dropped,
    })
}

/// Decodes a single-object payload.
pub fn decode_single<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T> {
    if !payload.is_object() {
        return Err(ApiError::InvalidPayload(format!(
            "{} expected a single object, got {}",
            endpoint,
            type_name(&payload)
        )));
    }
    serde_json::from_value(payload)
        .map_err(|e| ApiError::InvalidPayload(format!("{}: {}", endpoint, e)))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        // Back off to a char boundary
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}
