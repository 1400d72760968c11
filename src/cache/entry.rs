//! Cache Entry Module
//!
//! Defines the persisted entry structure and its JSON wire format.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Payload ==
/// Opaque application value stored in an entry.
///
/// Either raw text or a structured result; the engine is codec-transparent
/// to its contents. Serialized untagged, so text round-trips as a JSON
/// string and structured values as their natural JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Extracted or generated text
    Text(String),
    /// Structured analysis result
    Structured(serde_json::Value),
}

impl Payload {
    /// Returns the text content if this payload is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Structured(_) => None,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Structured(value)
    }
}

// == Cache Entry ==
/// A single persisted cache entry.
///
/// Serializes to one JSON object per stored key:
///
/// ```json
/// { "data": <payload>, "timestamp": <epoch-ms>,
///   "comprimido": true, "tamañoOriginal": 150000, "version": "1" }
/// ```
///
/// `comprimido`/`tamañoOriginal` are present only for payloads that went
/// through the lossy compaction transform. Legacy entries that stored the
/// payload under `texto` still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored payload
    #[serde(rename = "data", alias = "texto")]
    pub payload: Payload,

    /// Creation timestamp (Unix milliseconds); immutable, never refreshed
    /// on read - TTL is absolute, not sliding
    #[serde(rename = "timestamp")]
    pub created_at: i64,

    /// Whether the payload went through the lossy compaction transform
    #[serde(rename = "comprimido", default, skip_serializing_if = "is_false")]
    pub compressed: bool,

    /// Character count of the payload before compaction
    #[serde(rename = "tamañoOriginal", default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,

    /// Format version stamped at encode time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            created_at: current_timestamp_ms(),
            compressed: false,
            original_size: None,
            version: None,
        }
    }

    // == Age ==
    /// Returns the entry's age in milliseconds at `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.created_at
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `ttl_ms` at `now_ms`.
    ///
    /// Boundary condition: an entry is expired when its age strictly exceeds
    /// the TTL, so an entry created exactly TTL milliseconds ago is still a
    /// hit and one created TTL + 1 milliseconds ago is a miss.
    pub fn is_expired(&self, ttl_ms: i64, now_ms: i64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_creation() {
        let before = current_timestamp_ms();
        let entry = CacheEntry::new(Payload::from("analysis result"));
        let after = current_timestamp_ms();

        assert_eq!(entry.payload.as_text(), Some("analysis result"));
        assert!(entry.created_at >= before && entry.created_at <= after);
        assert!(!entry.compressed);
        assert!(entry.original_size.is_none());
    }

    #[test]
    fn test_expiration_boundary() {
        let now = current_timestamp_ms();
        let ttl = 60_000;

        let mut entry = CacheEntry::new(Payload::from("x"));

        // Exactly at TTL: still a hit
        entry.created_at = now - ttl;
        assert!(!entry.is_expired(ttl, now));

        // One past TTL: expired
        entry.created_at = now - ttl - 1;
        assert!(entry.is_expired(ttl, now));

        // One inside TTL: a hit
        entry.created_at = now - ttl + 1;
        assert!(!entry.is_expired(ttl, now));
    }

    #[test]
    fn test_wire_format_text_payload() {
        let mut entry = CacheEntry::new(Payload::from("hello"));
        entry.created_at = 1234;
        entry.version = Some("1".to_string());

        let raw = serde_json::to_string(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["data"], json!("hello"));
        assert_eq!(value["timestamp"], json!(1234));
        assert_eq!(value["version"], json!("1"));
        // Uncompressed entries omit the compression fields entirely
        assert!(value.get("comprimido").is_none());
        assert!(value.get("tamañoOriginal").is_none());
    }

    #[test]
    fn test_wire_format_compressed_fields() {
        let mut entry = CacheEntry::new(Payload::from("compacted"));
        entry.compressed = true;
        entry.original_size = Some(150_000);

        let raw = serde_json::to_string(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["comprimido"], json!(true));
        assert_eq!(value["tamañoOriginal"], json!(150_000));
    }

    #[test]
    fn test_wire_format_legacy_texto_alias() {
        let raw = r#"{"texto":"stored under the legacy field","timestamp":99}"#;
        let entry: CacheEntry = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.payload.as_text(), Some("stored under the legacy field"));
        assert_eq!(entry.created_at, 99);
        assert!(!entry.compressed);
    }

    #[test]
    fn test_structured_payload_roundtrip() {
        let payload = Payload::from(json!({"summary": "ok", "score": 7}));
        let mut entry = CacheEntry::new(payload.clone());
        entry.created_at = 1;

        let raw = serde_json::to_string(&entry).unwrap();
        let decoded: CacheEntry = serde_json::from_str(&raw).unwrap();

        assert_eq!(decoded.payload, payload);
    }
}
