//! Utility functions and helpers
//!
//! The game server is PHP-backed and not strict about JSON types: ids arrive as
//! numbers or strings, flags as `true` or `1`, empty maps as `[]`. The
//! deserializers here absorb those variations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse a timestamp as sent by the game server.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), a bare date (midnight UTC)
/// and unix epochs in seconds or milliseconds.
pub fn parse_api_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        let epoch: i64 = raw.parse().ok()?;
        // Anything past 1e12 is milliseconds
        return if epoch > 1_000_000_000_000 {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
    }

    None
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// String field that may be sent as a JSON number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value).ok_or_else(|| D::Error::custom("expected string or number, got null"))
}

/// Optional variant of [`string_or_number`]; `null` maps to `None`.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

/// Boolean flag that may be sent as `0`/`1`, `"0"`/`"1"` or `null`.
pub fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Some(Value::String(s)) => Ok(matches!(s.trim(), "1" | "true" | "yes")),
        Some(other) => Err(D::Error::custom(format!("expected boolean, got {}", other))),
    }
}

/// Counter that may be sent as a number, a numeric string or `null`.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| D::Error::custom(format!("expected unsigned count, got {}", n))),
        Some(Value::String(s)) => s.trim().parse().map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected count, got {}", other))),
    }
}

/// Keyed collection that the server sends as an object, or as an array when empty.
/// Array items are keyed by their index.
pub fn map_or_seq<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| serde_json::from_value(v).map(|t| (k, t)).map_err(D::Error::custom))
            .collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| serde_json::from_value(v).map(|t| (i.to_string(), t)).map_err(D::Error::custom))
            .collect(),
        Some(other) => Err(D::Error::custom(format!("expected object or array, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_api_timestamp_formats() {
        let rfc = parse_api_timestamp("2025-07-21T04:00:00Z").unwrap();
        assert_eq!((rfc.day(), rfc.hour()), (21, 4));

        let offset = parse_api_timestamp("2025-07-21T00:00:00-04:00").unwrap();
        assert_eq!(offset, rfc);

        let spaced = parse_api_timestamp("2025-07-21 04:00:00").unwrap();
        assert_eq!(spaced, rfc);

        let date_only = parse_api_timestamp("2025-07-21").unwrap();
        assert_eq!(date_only.hour(), 0);

        let epoch = parse_api_timestamp("1753070400").unwrap();
        assert_eq!(epoch, rfc);
        assert_eq!(parse_api_timestamp("1753070400000"), Some(rfc));

        assert!(parse_api_timestamp("").is_none());
        assert!(parse_api_timestamp("tomorrow").is_none());
    }

    #[derive(Deserialize)]
    struct Lenient {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "bool_or_int")]
        flag: bool,
        #[serde(default, deserialize_with = "map_or_seq")]
        bonus: BTreeMap<String, i64>,
    }

    #[test]
    fn test_lenient_deserializers() {
        let parsed: Lenient = serde_json::from_str(r#"{"id": 42, "flag": 1, "bonus": []}"#).unwrap();
        assert_eq!(parsed.id, "42");
        assert!(parsed.flag);
        assert!(parsed.bonus.is_empty());

        let parsed: Lenient =
            serde_json::from_str(r#"{"id": "abc", "flag": false, "bonus": {"day1": 5}}"#).unwrap();
        assert_eq!(parsed.id, "abc");
        assert!(!parsed.flag);
        assert_eq!(parsed.bonus.get("day1"), Some(&5));

        let parsed: Lenient = serde_json::from_str(r#"{"id": "x", "bonus": [7, 8]}"#).unwrap();
        assert!(!parsed.flag);
        assert_eq!(parsed.bonus.get("1"), Some(&8));
    }
}
