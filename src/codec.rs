//! Wire codec: encodes outbound commands and decodes inbound frames.
//!
//! Inbound service payloads are positionally keyed JSON objects (`"0"`,
//! `"1"`, … map to named fields); rather than generate one struct per
//! numeric tag, each payload type in [`crate::payloads`] walks a small
//! fixed accessor table over the decoded [`serde_json::Map`]. This module
//! supplies that table's primitive accessors plus the envelope-level
//! encode/decode entry points.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, StreamError};
use crate::model::StreamEnvelope;

/// Parse one inbound text frame into a [`StreamEnvelope`].
///
/// A frame is decoded wholly or rejected wholly — there is no partial
/// acceptance of a malformed envelope.
pub fn decode_envelope(text: &str) -> Result<StreamEnvelope> {
    serde_json::from_str(text).map_err(StreamError::Json)
}

/// Build the comma-joined `keys` parameter from a symbol list, rejecting
/// any empty entry with its index (mirrors the broker's own validation).
pub fn join_symbols(symbols: &[String]) -> Result<String> {
    for (idx, symbol) in symbols.iter().enumerate() {
        if symbol.is_empty() {
            return Err(StreamError::Precondition(format!(
                "empty symbol at index {idx}"
            )));
        }
    }
    Ok(symbols.join(","))
}

/// Build the comma-joined `fields` parameter from a list of numeric field
/// tags.
pub fn join_fields(fields: &[u8]) -> String {
    fields
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Look up a positional field by its numeric string key.
fn field<'a>(obj: &'a Map<String, Value>, idx: u8) -> Option<&'a Value> {
    obj.get(&idx.to_string())
}

fn missing(idx: u8) -> StreamError {
    StreamError::Codec(format!("missing field \"{idx}\""))
}

pub fn get_str(obj: &Map<String, Value>, idx: u8) -> Result<String> {
    field(obj, idx)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(idx))
}

pub fn get_str_opt(obj: &Map<String, Value>, idx: u8) -> Option<String> {
    field(obj, idx).and_then(Value::as_str).map(str::to_string)
}

pub fn get_f64(obj: &Map<String, Value>, idx: u8) -> Result<f64> {
    field(obj, idx).and_then(Value::as_f64).ok_or_else(|| missing(idx))
}

pub fn get_f64_opt(obj: &Map<String, Value>, idx: u8) -> Option<f64> {
    field(obj, idx).and_then(Value::as_f64)
}

pub fn get_i64(obj: &Map<String, Value>, idx: u8) -> Result<i64> {
    field(obj, idx).and_then(Value::as_i64).ok_or_else(|| missing(idx))
}

pub fn get_i64_opt(obj: &Map<String, Value>, idx: u8) -> Option<i64> {
    field(obj, idx).and_then(Value::as_i64)
}

pub fn get_char(obj: &Map<String, Value>, idx: u8) -> Result<char> {
    field(obj, idx)
        .and_then(Value::as_str)
        .and_then(|s| s.chars().next())
        .ok_or_else(|| missing(idx))
}

/// Decode a millisecond-epoch field into a UTC timestamp.
pub fn get_millis(obj: &Map<String, Value>, idx: u8) -> Result<DateTime<Utc>> {
    let millis = get_i64(obj, idx)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StreamError::Codec(format!("field \"{idx}\" is not a valid epoch-millis value"))
    })
}

pub fn get_millis_opt(obj: &Map<String, Value>, idx: u8) -> Option<DateTime<Utc>> {
    get_i64_opt(obj, idx).and_then(DateTime::from_timestamp_millis)
}

/// Extract the symbol from the `"key"` field every positional record
/// carries alongside its numeric-tagged fields.
pub fn get_key(obj: &Map<String, Value>) -> Result<String> {
    obj.get("key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StreamError::Codec("missing \"key\" field".to_string()))
}

/// Coerce a decoded payload [`Value`] into its backing object map.
pub fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| StreamError::Codec("payload is not a JSON object".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_symbols_rejects_empty_entry() {
        let symbols = vec!["AAPL".to_string(), String::new()];
        let err = join_symbols(&symbols).unwrap_err();
        assert!(matches!(err, StreamError::Precondition(msg) if msg.contains("index 1")));
    }

    #[test]
    fn join_fields_formats_comma_list() {
        assert_eq!(join_fields(&[0, 1, 2]), "0,1,2");
    }

    #[test]
    fn get_millis_converts_epoch() {
        let obj = json!({"7": 1_700_000_000_000i64});
        let obj = obj.as_object().unwrap();
        let ts = get_millis(obj, 7).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn decode_envelope_accepts_partial_frame() {
        let frame = r#"{"notify":[{"heartbeat":"1700000000000"}]}"#;
        let envelope = decode_envelope(frame).unwrap();
        assert_eq!(envelope.notify.len(), 1);
        assert!(envelope.data.is_empty());
        assert!(envelope.api_responses.is_empty());
    }

    #[test]
    fn decode_envelope_rejects_malformed_json() {
        assert!(decode_envelope("{not json}").is_err());
    }
}
