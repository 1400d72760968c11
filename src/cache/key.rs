//! Key Derivation Module
//!
//! Turns a logical cache subject into a deterministic, namespaced string key.
//!
//! Text subjects are hashed from a bounded sample (fixed windows from the
//! start, middle, and end) combined with the exact byte length and a coarse
//! word count, so keys stay cheap to compute for megabyte-scale documents.
//! Two texts differing only outside the sampled windows are a known,
//! accepted collision risk; the length and word count components shrink that
//! surface without full-content cost. The hash is heuristic, not
//! cryptographic.

// == Constants ==
/// Size in bytes of each sampled window (start, middle, end).
const SAMPLE_WINDOW: usize = 512;

/// FNV-1a offset basis (32-bit).
const HASH_SEED: u32 = 0x811c_9dc5;

/// FNV-1a prime (32-bit).
const HASH_PRIME: u32 = 0x0100_0193;

/// Hash segment of the reserved key for empty subjects.
const EMPTY_SENTINEL: &str = "empty";

// == Subject ==
/// The logical identity of a cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject<'a> {
    /// A text to be (or already) analyzed, with an optional qualifier such
    /// as the analysis provider id
    Text {
        content: &'a str,
        qualifier: Option<&'a str>,
    },
    /// A file, identified by its metadata tuple rather than content sampling
    File {
        name: &'a str,
        size: u64,
        mime: &'a str,
        modified_ms: i64,
    },
}

impl<'a> Subject<'a> {
    /// Subject for a bare text.
    pub fn text(content: &'a str) -> Self {
        Subject::Text {
            content,
            qualifier: None,
        }
    }

    /// Subject for a text analyzed by a specific provider.
    pub fn analysis(content: &'a str, provider: &'a str) -> Self {
        Subject::Text {
            content,
            qualifier: Some(provider),
        }
    }

    /// Subject for a file identity.
    pub fn file(name: &'a str, size: u64, mime: &'a str, modified_ms: i64) -> Self {
        Subject::File {
            name,
            size,
            mime,
            modified_ms,
        }
    }
}

// == Key Deriver ==
/// Derives namespaced storage keys from subjects.
///
/// `derive` is a pure function of the subject: identical subjects always
/// produce identical keys. Output format is
/// `{namespacePrefix}{hashHex}_{length}_{wordCount}`.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    /// Namespace prefix scoping this deriver's keys
    prefix: String,
}

impl KeyDeriver {
    // == Constructor ==
    /// Creates a deriver for the given namespace prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // == Derive ==
    /// Derives the storage key for a subject. Pure and deterministic, no I/O.
    pub fn derive(&self, subject: &Subject<'_>) -> String {
        match subject {
            Subject::Text { content, qualifier } => self.derive_text(content, *qualifier),
            Subject::File {
                name,
                size,
                mime,
                modified_ms,
            } => self.derive_file(name, *size, mime, *modified_ms),
        }
    }

    fn derive_text(&self, content: &str, qualifier: Option<&str>) -> String {
        // Reserved sentinel: never collides with real content, which always
        // hashes to a hex segment
        if content.is_empty() {
            return format!("{}{}_0_0", self.prefix, EMPTY_SENTINEL);
        }

        let length = content.len();
        let word_count = content.split_whitespace().count();

        let mut hash = HASH_SEED;
        if let Some(qualifier) = qualifier {
            hash = fold_bytes(hash, qualifier.as_bytes());
            hash = fold_bytes(hash, b"|");
        }
        hash = fold_bytes(hash, sample_window(content, 0).as_bytes());
        hash = fold_bytes(hash, sample_window(content, length / 2).as_bytes());
        hash = fold_bytes(hash, sample_window(content, length.saturating_sub(SAMPLE_WINDOW)).as_bytes());
        hash = fold_u64(hash, length as u64);
        hash = fold_u64(hash, word_count as u64);

        format!("{}{:08x}_{}_{}", self.prefix, hash, length, word_count)
    }

    fn derive_file(&self, name: &str, size: u64, mime: &str, modified_ms: i64) -> String {
        let mut hash = HASH_SEED;
        hash = fold_bytes(hash, name.as_bytes());
        hash = fold_bytes(hash, b"|");
        hash = fold_bytes(hash, mime.as_bytes());
        hash = fold_u64(hash, size);
        hash = fold_u64(hash, modified_ms as u64);

        format!("{}{:08x}_{}_0", self.prefix, hash, size)
    }
}

// == Hash Primitives ==
/// 32-bit multiply-and-xor accumulation (FNV-1a).
fn fold_bytes(mut hash: u32, bytes: &[u8]) -> u32 {
    for &byte in bytes {
        hash = (hash ^ u32::from(byte)).wrapping_mul(HASH_PRIME);
    }
    hash
}

fn fold_u64(hash: u32, value: u64) -> u32 {
    fold_bytes(hash, &value.to_le_bytes())
}

/// Returns a window of up to [`SAMPLE_WINDOW`] bytes starting near `start`,
/// clamped to char boundaries.
fn sample_window(content: &str, start: usize) -> &str {
    let mut begin = start.min(content.len());
    while !content.is_char_boundary(begin) {
        begin -= 1;
    }
    let mut end = (begin + SAMPLE_WINDOW).min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[begin..end]
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let deriver = KeyDeriver::new("analysis:");
        let subject = Subject::text("some document body");

        assert_eq!(deriver.derive(&subject), deriver.derive(&subject));
    }

    #[test]
    fn test_derive_distinct_texts_differ() {
        let deriver = KeyDeriver::new("analysis:");

        let a = deriver.derive(&Subject::text("first document"));
        let b = deriver.derive(&Subject::text("second document"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_qualifier_changes_key() {
        let deriver = KeyDeriver::new("analysis:");
        let content = "same text, different provider";

        let a = deriver.derive(&Subject::analysis(content, "provider-a"));
        let b = deriver.derive(&Subject::analysis(content, "provider-b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_empty_text_sentinel() {
        let deriver = KeyDeriver::new("analysis:");

        let key = deriver.derive(&Subject::text(""));
        assert_eq!(key, "analysis:empty_0_0");
    }

    #[test]
    fn test_derive_key_format() {
        let deriver = KeyDeriver::new("analysis:");

        let key = deriver.derive(&Subject::text("four words right here"));
        // {prefix}{hashHex}_{length}_{wordCount}
        let rest = key.strip_prefix("analysis:").unwrap();
        let parts: Vec<&str> = rest.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert!(u32::from_str_radix(parts[0], 16).is_ok());
        assert_eq!(parts[1], "21");
        assert_eq!(parts[2], "4");
    }

    #[test]
    fn test_derive_large_text_samples_bounded() {
        let deriver = KeyDeriver::new("analysis:");

        // Megabyte-scale input still derives quickly and deterministically
        let big = "lorem ipsum dolor sit amet ".repeat(50_000);
        let key1 = deriver.derive(&Subject::text(&big));
        let key2 = deriver.derive(&Subject::text(&big));
        assert_eq!(key1, key2);

        // Length component reflects the full content, not just the sample
        assert!(key1.contains(&format!("_{}_", big.len())));
    }

    #[test]
    fn test_derive_length_differs_outside_windows() {
        let deriver = KeyDeriver::new("analysis:");

        // Same sampled windows, different middle length: the folded length
        // and word count still separate the keys
        let base = "a".repeat(4096);
        let longer = "a".repeat(4097);
        assert_ne!(
            deriver.derive(&Subject::text(&base)),
            deriver.derive(&Subject::text(&longer))
        );
    }

    #[test]
    fn test_derive_file_identity_tuple() {
        let deriver = KeyDeriver::new("files:");

        let a = deriver.derive(&Subject::file("report.pdf", 1024, "application/pdf", 111));
        let same = deriver.derive(&Subject::file("report.pdf", 1024, "application/pdf", 111));
        assert_eq!(a, same);

        // Any component of the tuple changing changes the key
        let renamed = deriver.derive(&Subject::file("other.pdf", 1024, "application/pdf", 111));
        let resized = deriver.derive(&Subject::file("report.pdf", 2048, "application/pdf", 111));
        let retyped = deriver.derive(&Subject::file("report.pdf", 1024, "text/plain", 111));
        let touched = deriver.derive(&Subject::file("report.pdf", 1024, "application/pdf", 222));
        assert_ne!(a, renamed);
        assert_ne!(a, resized);
        assert_ne!(a, retyped);
        assert_ne!(a, touched);
    }

    #[test]
    fn test_sample_window_respects_char_boundaries() {
        // Multi-byte characters around the window edges must not panic
        let text = "é".repeat(2000);
        let deriver = KeyDeriver::new("analysis:");
        let _ = deriver.derive(&Subject::text(&text));
    }
}
