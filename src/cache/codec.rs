//! Entry Codec Module
//!
//! Serializes cache entries to the storage medium's string format and back,
//! applying the compression transform to oversized textual payloads.
//!
//! The compression is a one-way, lossy normalization (runs of whitespace and
//! blank lines are collapsed), not a reversible encoding: callers must treat
//! the compacted form as the authoritative retrievable value. The
//! `compressed`/`original_size` fields exist precisely so this is observable
//! rather than silent.

use tracing::debug;

use crate::cache::entry::{current_timestamp_ms, CacheEntry, Payload};
use crate::error::{CacheError, Result};

// == Encoded Entry ==
/// An entry serialized for storage, with its decoded form alongside.
#[derive(Debug, Clone)]
pub struct EncodedEntry {
    /// The serialized JSON string written to the medium
    pub raw: String,
    /// The entry the raw form decodes back to
    pub entry: CacheEntry,
}

impl EncodedEntry {
    /// Byte-length estimate of the serialized entry, used for aggregate
    /// bound checks.
    pub fn size_estimate(&self) -> usize {
        self.raw.len()
    }
}

// == Entry Codec ==
/// Encodes and decodes entries, compacting oversized text payloads.
#[derive(Debug, Clone)]
pub struct EntryCodec {
    /// Character count above which textual payloads are compacted
    compression_threshold: usize,
    /// Version string stamped on encoded entries
    version: Option<String>,
}

impl EntryCodec {
    // == Constructor ==
    pub fn new(compression_threshold: usize, version: Option<String>) -> Self {
        Self {
            compression_threshold,
            version,
        }
    }

    // == Encode ==
    /// Serializes a payload into a storable entry, stamping `created_at` with
    /// the current time.
    ///
    /// Textual payloads longer than the compression threshold are compacted
    /// before storage; the entry records `compressed = true` and the original
    /// character count.
    pub fn encode(&self, payload: Payload) -> Result<EncodedEntry> {
        let (payload, compressed, original_size) = self.compress_if_oversized(payload);

        let entry = CacheEntry {
            payload,
            created_at: current_timestamp_ms(),
            compressed,
            original_size,
            version: self.version.clone(),
        };

        let raw = serde_json::to_string(&entry)
            .map_err(|_| CacheError::Corrupted("encode".to_string()))?;
        Ok(EncodedEntry { raw, entry })
    }

    /// Serializes a payload in degraded form: compacted core payload and
    /// timestamp only, dropping optional metadata. Used as the last-resort
    /// write under persistent quota pressure.
    pub fn encode_degraded(&self, payload: Payload) -> Result<EncodedEntry> {
        let (payload, compressed, original_size) = match payload {
            Payload::Text(text) => {
                let original = text.chars().count() as u64;
                (Payload::Text(compact_text(&text)), true, Some(original))
            }
            other => (other, false, None),
        };

        let entry = CacheEntry {
            payload,
            created_at: current_timestamp_ms(),
            compressed,
            original_size,
            version: None,
        };

        let raw = serde_json::to_string(&entry)
            .map_err(|_| CacheError::Corrupted("encode".to_string()))?;
        Ok(EncodedEntry { raw, entry })
    }

    // == Decode ==
    /// Parses a serialized entry. Any parse failure yields
    /// [`CacheError::Corrupted`], which the store treats as "not found, and
    /// should be purged".
    pub fn decode(&self, key: &str, raw: &str) -> Result<CacheEntry> {
        serde_json::from_str(raw).map_err(|_| CacheError::Corrupted(key.to_string()))
    }

    fn compress_if_oversized(&self, payload: Payload) -> (Payload, bool, Option<u64>) {
        match payload {
            Payload::Text(text) => {
                let chars = text.chars().count();
                if chars > self.compression_threshold {
                    debug!(chars, threshold = self.compression_threshold, "compacting oversized payload");
                    (
                        Payload::Text(compact_text(&text)),
                        true,
                        Some(chars as u64),
                    )
                } else {
                    (Payload::Text(text), false, None)
                }
            }
            other => (other, false, None),
        }
    }
}

// == Eviction Support ==
/// Extracts the creation timestamp from a raw entry, or 0 when the entry
/// does not decode. Corrupted entries thereby sort oldest and are evicted
/// first.
pub fn timestamp_or_zero(raw: &str) -> i64 {
    serde_json::from_str::<CacheEntry>(raw)
        .map(|entry| entry.created_at)
        .unwrap_or(0)
}

// == Compression Transform ==
/// Collapses runs of spaces and tabs within lines and runs of blank lines
/// between them. Lossy by contract.
fn compact_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() / 2);
    let mut pending_blank = false;
    let mut wrote_line = false;

    for line in text.lines() {
        let mut words = line.split_whitespace();
        match words.next() {
            None => {
                pending_blank = wrote_line;
            }
            Some(first) => {
                if wrote_line {
                    out.push('\n');
                    if pending_blank {
                        out.push('\n');
                    }
                }
                out.push_str(first);
                for word in words {
                    out.push(' ');
                    out.push_str(word);
                }
                wrote_line = true;
                pending_blank = false;
            }
        }
    }

    out
}
